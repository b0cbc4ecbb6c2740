//! Review repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over the `reviews` table.
//! - Keep in-memory review objects and stored rows in sync through the
//!   repository-owned identity map.
//!
//! # Invariants
//! - Every live review with an id is mapped under that id, and no two
//!   distinct objects are ever mapped under the same id.
//! - `save` only accepts unpersisted reviews; `update` is the re-persist path.
//! - Storage errors propagate unmodified inside `RepoError::Db`.

use crate::db::DbError;
use crate::model::review::{EmployeeId, Review, ReviewId, ReviewValidationError};
use crate::repo::employee_repo::{EmployeeLookup, SqliteEmployeeDirectory};
use crate::repo::identity_map::{IdentityMap, ReviewHandle};
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

const REVIEW_SELECT_SQL: &str = "SELECT
    id,
    year,
    summary,
    employee_id
FROM reviews";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for review persistence and validation.
#[derive(Debug)]
pub enum RepoError {
    Validation(ReviewValidationError),
    Db(DbError),
    NotFound(ReviewId),
    /// `save` was called on a review that already has a row.
    AlreadyPersisted(ReviewId),
    /// The operation needs a row id, but the review was never saved.
    NotPersisted,
    /// The review handle is mutably borrowed by the caller.
    InstanceBusy,
    /// The handle carries an id, but it is not the live instance mapped
    /// under that id in this repository.
    NotMapped(ReviewId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "review not found: {id}"),
            Self::AlreadyPersisted(id) => {
                write!(f, "review {id} is already persisted; use update instead")
            }
            Self::NotPersisted => write!(f, "review has not been saved yet"),
            Self::InstanceBusy => write!(f, "review instance is borrowed elsewhere"),
            Self::NotMapped(id) => {
                write!(f, "review {id} is not the live instance held by this repository")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted review data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ReviewValidationError> for RepoError {
    fn from(value: ReviewValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Raw `reviews` row, before reconciliation with the identity map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRow {
    pub id: ReviewId,
    pub year: i64,
    pub summary: String,
    pub employee_id: EmployeeId,
}

impl ReviewRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            year: row.get("year")?,
            summary: row.get("summary")?,
            employee_id: row.get("employee_id")?,
        })
    }
}

/// Repository interface for identity-mapped review persistence.
pub trait ReviewRepository {
    /// Creates `reviews` if missing.
    fn create_table(&self) -> RepoResult<()>;
    /// Drops `reviews` and detaches every mapped instance.
    fn drop_table(&mut self) -> RepoResult<()>;
    /// Inserts an unpersisted review and maps it under its new id.
    fn save(&mut self, review: &ReviewHandle) -> RepoResult<ReviewId>;
    /// Validates, constructs and saves a review.
    fn create(
        &mut self,
        year: i64,
        summary: &str,
        employee_id: EmployeeId,
    ) -> RepoResult<ReviewHandle>;
    /// Reconciles one stored row with the identity map.
    fn instance_from_db(&mut self, row: Option<ReviewRow>) -> RepoResult<Option<ReviewHandle>>;
    fn find_by_id(&mut self, id: ReviewId) -> RepoResult<Option<ReviewHandle>>;
    /// Writes in-memory fields to the existing row.
    fn update(&self, review: &ReviewHandle) -> RepoResult<()>;
    /// Removes the row, unmaps the instance and clears its id.
    fn delete(&mut self, review: &ReviewHandle) -> RepoResult<()>;
    /// Every stored review in id order, reconciled.
    fn get_all(&mut self) -> RepoResult<Vec<ReviewHandle>>;
}

/// SQLite-backed review repository owning one identity map.
pub struct SqliteReviewRepository<'conn, L = SqliteEmployeeDirectory<'conn>> {
    conn: &'conn Connection,
    employees: L,
    identity_map: IdentityMap,
}

impl<'conn> SqliteReviewRepository<'conn> {
    /// Constructs a repository validating employees against the same database.
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_lookup(conn, SqliteEmployeeDirectory::new(conn))
    }
}

impl<'conn, L: EmployeeLookup> SqliteReviewRepository<'conn, L> {
    /// Constructs a repository with an explicit employee lookup.
    pub fn with_lookup(conn: &'conn Connection, employees: L) -> Self {
        Self {
            conn,
            employees,
            identity_map: IdentityMap::new(),
        }
    }

    /// Employee lookup to pass to `Review::set_employee_id`.
    pub fn employees(&self) -> &L {
        &self.employees
    }

    /// Returns the mapped instance for `id` without touching storage.
    pub fn cached(&self, id: ReviewId) -> Option<ReviewHandle> {
        self.identity_map.get(id)
    }

    pub fn identity_map_len(&self) -> usize {
        self.identity_map.len()
    }

    /// Fails unless `handle` is the instance mapped under `id`.
    fn ensure_mapped(&self, id: ReviewId, handle: &ReviewHandle) -> RepoResult<()> {
        match self.identity_map.get(id) {
            Some(mapped) if Rc::ptr_eq(&mapped, handle) => Ok(()),
            _ => Err(RepoError::NotMapped(id)),
        }
    }

    fn register(&mut self, id: ReviewId, handle: &ReviewHandle) {
        if let Some(stale) = self.identity_map.register(id, Rc::clone(handle)) {
            // Row id was reused after an out-of-band delete.
            warn!("event=identity_map_replace module=repo status=ok review_id={id}");
            detach(&stale);
        }
    }
}

impl<L: EmployeeLookup> ReviewRepository for SqliteReviewRepository<'_, L> {
    fn create_table(&self) -> RepoResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY,
                year INTEGER,
                summary TEXT,
                employee_id INTEGER,
                FOREIGN KEY (employee_id) REFERENCES employees(id)
            );",
        )?;
        info!("event=reviews_create_table module=repo status=ok");
        Ok(())
    }

    fn drop_table(&mut self) -> RepoResult<()> {
        // Every mapped instance must be detachable before the rows go away.
        if self
            .identity_map
            .handles()
            .any(|handle| handle.try_borrow_mut().is_err())
        {
            return Err(RepoError::InstanceBusy);
        }

        self.conn.execute_batch("DROP TABLE IF EXISTS reviews;")?;

        let evicted = self.identity_map.clear();
        for handle in &evicted {
            detach(handle);
        }
        info!(
            "event=reviews_drop_table module=repo status=ok evicted={}",
            evicted.len()
        );
        Ok(())
    }

    fn save(&mut self, review: &ReviewHandle) -> RepoResult<ReviewId> {
        let id = {
            let mut review = review.try_borrow_mut().map_err(|_| RepoError::InstanceBusy)?;
            if let Some(id) = review.id() {
                return Err(RepoError::AlreadyPersisted(id));
            }

            self.conn.execute(
                "INSERT INTO reviews (year, summary, employee_id) VALUES (?1, ?2, ?3);",
                params![review.year(), review.summary(), review.employee_id()],
            )?;
            let id = self.conn.last_insert_rowid();
            review.assign_id(Some(id));
            id
        };

        self.register(id, review);
        debug!("event=review_save module=repo status=ok review_id={id}");
        Ok(id)
    }

    fn create(
        &mut self,
        year: i64,
        summary: &str,
        employee_id: EmployeeId,
    ) -> RepoResult<ReviewHandle> {
        let review = Review::new(year, summary, employee_id, &self.employees)?;
        let handle = Rc::new(RefCell::new(review));
        self.save(&handle)?;
        Ok(handle)
    }

    fn instance_from_db(&mut self, row: Option<ReviewRow>) -> RepoResult<Option<ReviewHandle>> {
        let Some(row) = row else {
            return Ok(None);
        };

        let id = row.id;
        let stored = Review::from_storage(id, row.year, row.summary, row.employee_id)
            .map_err(|err| RepoError::InvalidData(format!("review {id}: {err}")))?;

        if let Some(existing) = self.identity_map.get(id) {
            existing
                .try_borrow_mut()
                .map_err(|_| RepoError::InstanceBusy)?
                .sync_from(stored);
            return Ok(Some(existing));
        }

        let handle = Rc::new(RefCell::new(stored));
        self.register(id, &handle);
        Ok(Some(handle))
    }

    fn find_by_id(&mut self, id: ReviewId) -> RepoResult<Option<ReviewHandle>> {
        let row = self
            .conn
            .query_row(
                &format!("{REVIEW_SELECT_SQL} WHERE id = ?1;"),
                [id],
                ReviewRow::from_row,
            )
            .optional()?;
        self.instance_from_db(row)
    }

    fn update(&self, handle: &ReviewHandle) -> RepoResult<()> {
        let review = handle.try_borrow().map_err(|_| RepoError::InstanceBusy)?;
        let id = review.id().ok_or(RepoError::NotPersisted)?;
        self.ensure_mapped(id, handle)?;

        let changed = self.conn.execute(
            "UPDATE reviews
             SET
                year = ?1,
                summary = ?2,
                employee_id = ?3
             WHERE id = ?4;",
            params![review.year(), review.summary(), review.employee_id(), id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        debug!("event=review_update module=repo status=ok review_id={id}");
        Ok(())
    }

    fn delete(&mut self, handle: &ReviewHandle) -> RepoResult<()> {
        let mut review = handle.try_borrow_mut().map_err(|_| RepoError::InstanceBusy)?;
        let id = review.id().ok_or(RepoError::NotPersisted)?;
        self.ensure_mapped(id, handle)?;

        let changed = self
            .conn
            .execute("DELETE FROM reviews WHERE id = ?1;", [id])?;
        if changed == 0 {
            warn!("event=review_delete module=repo status=ok review_id={id} row_missing=true");
        }

        self.identity_map.remove(id);
        review.assign_id(None);
        debug!("event=review_delete module=repo status=ok review_id={id}");
        Ok(())
    }

    fn get_all(&mut self) -> RepoResult<Vec<ReviewHandle>> {
        let rows = {
            let mut stmt = self
                .conn
                .prepare(&format!("{REVIEW_SELECT_SQL} ORDER BY id ASC;"))?;
            let mut rows = stmt.query([])?;
            let mut collected = Vec::new();
            while let Some(row) = rows.next()? {
                collected.push(ReviewRow::from_row(row)?);
            }
            collected
        };

        let mut reviews = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(handle) = self.instance_from_db(Some(row))? {
                reviews.push(handle);
            }
        }
        Ok(reviews)
    }
}

fn detach(handle: &ReviewHandle) {
    match handle.try_borrow_mut() {
        Ok(mut review) => review.assign_id(None),
        Err(_) => warn!("event=review_detach module=repo status=error error_code=instance_busy"),
    }
}
