//! Identity-mapped persistence for employee performance reviews.
//!
//! `SqliteReviewRepository` keeps at most one live `Review` object per stored
//! row and validates every field assignment before anything reaches SQLite.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::review::{
    parse_year, EmployeeId, Review, ReviewId, ReviewValidationError, MIN_REVIEW_YEAR,
};
pub use repo::employee_repo::{EmployeeLookup, SqliteEmployeeDirectory};
pub use repo::identity_map::{IdentityMap, ReviewHandle};
pub use repo::review_repo::{
    RepoError, RepoResult, ReviewRepository, ReviewRow, SqliteReviewRepository,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
