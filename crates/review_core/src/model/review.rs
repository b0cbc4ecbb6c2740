//! Review value object.
//!
//! # Responsibility
//! - Hold one employee performance review and its persisted identifier.
//! - Enforce field contracts on construction and on every assignment.
//!
//! # Invariants
//! - `year >= MIN_REVIEW_YEAR`.
//! - `summary` is never empty.
//! - `employee_id` referenced an existing employee when it was assigned.
//! - Only the review repository sets or clears `id`.

use crate::repo::employee_repo::EmployeeLookup;
use crate::repo::review_repo::RepoResult;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-generated review identifier.
pub type ReviewId = i64;

/// Identifier of a row in the sibling `employees` table.
pub type EmployeeId = i64;

/// Earliest accepted review year.
pub const MIN_REVIEW_YEAR: i64 = 2000;

/// Field contract violations raised at assignment time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewValidationError {
    /// Raw input could not be read as an integer year.
    YearNotInteger(String),
    /// Year is earlier than `MIN_REVIEW_YEAR`.
    YearTooEarly(i64),
    EmptySummary,
    /// No employee row exists for the id.
    UnknownEmployee(EmployeeId),
}

impl Display for ReviewValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::YearNotInteger(raw) => write!(f, "year must be an integer, got `{raw}`"),
            Self::YearTooEarly(year) => {
                write!(f, "year must be >= {MIN_REVIEW_YEAR}, got {year}")
            }
            Self::EmptySummary => write!(f, "summary must be a non-empty string"),
            Self::UnknownEmployee(id) => write!(
                f,
                "employee_id {id} must reference an employee in the database"
            ),
        }
    }
}

impl Error for ReviewValidationError {}

/// Parses a textual year and applies the year contract.
///
/// Used by callers that receive untyped input (CLI arguments, imports).
pub fn parse_year(raw: &str) -> Result<i64, ReviewValidationError> {
    let year = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| ReviewValidationError::YearNotInteger(raw.to_string()))?;
    validate_year(year)?;
    Ok(year)
}

/// Checks the year contract.
pub fn validate_year(year: i64) -> Result<(), ReviewValidationError> {
    if year < MIN_REVIEW_YEAR {
        return Err(ReviewValidationError::YearTooEarly(year));
    }
    Ok(())
}

/// Checks the summary contract.
pub fn validate_summary(summary: &str) -> Result<(), ReviewValidationError> {
    if summary.is_empty() {
        return Err(ReviewValidationError::EmptySummary);
    }
    Ok(())
}

fn validate_employee_id<L>(employee_id: EmployeeId, employees: &L) -> RepoResult<()>
where
    L: EmployeeLookup + ?Sized,
{
    if !employees.employee_exists(employee_id)? {
        return Err(ReviewValidationError::UnknownEmployee(employee_id).into());
    }
    Ok(())
}

/// One performance review for one employee and year.
///
/// Fields are private so every mutation goes through a validating setter.
/// Clones come out unpersisted: only the repository-mapped instance may
/// carry a row id.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Review {
    id: Option<ReviewId>,
    year: i64,
    summary: String,
    employee_id: EmployeeId,
}

impl Review {
    /// Builds an unpersisted review, validating every field eagerly.
    ///
    /// # Errors
    /// - `RepoError::Validation` for any field contract violation.
    /// - `RepoError::Db` when the employee lookup itself fails.
    pub fn new<L>(
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
        employees: &L,
    ) -> RepoResult<Self>
    where
        L: EmployeeLookup + ?Sized,
    {
        let summary = summary.into();
        validate_year(year)?;
        validate_summary(&summary)?;
        validate_employee_id(employee_id, employees)?;

        Ok(Self {
            id: None,
            year,
            summary,
            employee_id,
        })
    }

    /// Rebuilds a review from a stored row. Employee existence is not
    /// re-checked; the foreign key already vouches for it.
    pub(crate) fn from_storage(
        id: ReviewId,
        year: i64,
        summary: String,
        employee_id: EmployeeId,
    ) -> Result<Self, ReviewValidationError> {
        validate_year(year)?;
        validate_summary(&summary)?;
        Ok(Self {
            id: Some(id),
            year,
            summary,
            employee_id,
        })
    }

    pub fn id(&self) -> Option<ReviewId> {
        self.id
    }

    pub fn year(&self) -> i64 {
        self.year
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn employee_id(&self) -> EmployeeId {
        self.employee_id
    }

    /// Returns whether the repository has assigned a row id.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Assigns `year`; the old value is kept on failure.
    pub fn set_year(&mut self, year: i64) -> Result<(), ReviewValidationError> {
        validate_year(year)?;
        self.year = year;
        Ok(())
    }

    /// Assigns `summary`; the old value is kept on failure.
    pub fn set_summary(&mut self, summary: impl Into<String>) -> Result<(), ReviewValidationError> {
        let summary = summary.into();
        validate_summary(&summary)?;
        self.summary = summary;
        Ok(())
    }

    /// Assigns `employee_id` after a synchronous existence check.
    pub fn set_employee_id<L>(&mut self, employee_id: EmployeeId, employees: &L) -> RepoResult<()>
    where
        L: EmployeeLookup + ?Sized,
    {
        validate_employee_id(employee_id, employees)?;
        self.employee_id = employee_id;
        Ok(())
    }

    pub(crate) fn assign_id(&mut self, id: Option<ReviewId>) {
        self.id = id;
    }

    /// Overwrites fields with values read back from storage.
    pub(crate) fn sync_from(&mut self, stored: Review) {
        self.year = stored.year;
        self.summary = stored.summary;
        self.employee_id = stored.employee_id;
    }
}

impl Clone for Review {
    fn clone(&self) -> Self {
        Self {
            id: None,
            year: self.year,
            summary: self.summary.clone(),
            employee_id: self.employee_id,
        }
    }
}

impl Display for Review {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(f, "<Review {id}: ")?,
            None => write!(f, "<Review None: ")?,
        }
        write!(
            f,
            "{}, {}, Employee: {}>",
            self.year, self.summary, self.employee_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_year, validate_summary, Review, ReviewValidationError};

    #[test]
    fn clone_drops_the_row_id() {
        let stored = Review::from_storage(9, 2022, "Kept fields".to_string(), 3).unwrap();
        let copy = stored.clone();

        assert_eq!(copy.id(), None);
        assert_eq!(copy.year(), 2022);
        assert_eq!(copy.summary(), "Kept fields");
        assert_eq!(copy.employee_id(), 3);
    }

    #[test]
    fn parse_year_rejects_non_integer_text() {
        let err = parse_year("twenty").unwrap_err();
        assert_eq!(err, ReviewValidationError::YearNotInteger("twenty".to_string()));
        assert_eq!(
            parse_year("2023.5").unwrap_err(),
            ReviewValidationError::YearNotInteger("2023.5".to_string())
        );
    }

    #[test]
    fn parse_year_applies_lower_bound() {
        assert_eq!(parse_year(" 2000 ").unwrap(), 2000);
        assert_eq!(
            parse_year("1999").unwrap_err(),
            ReviewValidationError::YearTooEarly(1999)
        );
    }

    #[test]
    fn whitespace_summary_is_not_empty() {
        assert!(validate_summary(" ").is_ok());
        assert_eq!(
            validate_summary("").unwrap_err(),
            ReviewValidationError::EmptySummary
        );
    }

    #[test]
    fn display_renders_unset_id_as_none() {
        let review = Review::new(2023, "Solid year", 7, &|_: i64| true).unwrap();
        assert_eq!(review.to_string(), "<Review None: 2023, Solid year, Employee: 7>");
    }
}
