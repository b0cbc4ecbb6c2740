//! Employee existence checks backing `Review::employee_id` validation.
//!
//! # Responsibility
//! - Define the `EmployeeLookup` capability injected into review validation.
//! - Provide the SQLite implementation over the sibling `employees` table.
//!
//! # Invariants
//! - Lookup failures are storage errors, never a silent `false`.

use crate::model::review::EmployeeId;
use crate::repo::review_repo::RepoResult;
use log::debug;
use rusqlite::{params, Connection};

/// Answers whether an employee record exists.
pub trait EmployeeLookup {
    fn employee_exists(&self, employee_id: EmployeeId) -> RepoResult<bool>;
}

/// Storage-free lookups, mostly for tests and pre-validated imports.
impl<F> EmployeeLookup for F
where
    F: Fn(EmployeeId) -> bool,
{
    fn employee_exists(&self, employee_id: EmployeeId) -> RepoResult<bool> {
        Ok(self(employee_id))
    }
}

/// SQLite-backed employee directory.
#[derive(Debug, Clone, Copy)]
pub struct SqliteEmployeeDirectory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmployeeDirectory<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Inserts one employee and returns its generated id.
    pub fn add_employee(&self, name: &str, job_title: &str) -> RepoResult<EmployeeId> {
        self.conn.execute(
            "INSERT INTO employees (name, job_title) VALUES (?1, ?2);",
            params![name, job_title],
        )?;
        let employee_id = self.conn.last_insert_rowid();
        debug!("event=employee_add module=repo status=ok employee_id={employee_id}");
        Ok(employee_id)
    }
}

impl EmployeeLookup for SqliteEmployeeDirectory<'_> {
    fn employee_exists(&self, employee_id: EmployeeId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ?1);",
            [employee_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::{EmployeeLookup, SqliteEmployeeDirectory};
    use crate::db::open_db_in_memory;

    #[test]
    fn added_employee_is_found_and_others_are_not() {
        let conn = open_db_in_memory().unwrap();
        let employees = SqliteEmployeeDirectory::new(&conn);

        let id = employees.add_employee("Ada", "Engineer").unwrap();

        assert!(employees.employee_exists(id).unwrap());
        assert!(!employees.employee_exists(id + 1).unwrap());
    }

    #[test]
    fn closures_act_as_lookups() {
        let only_seven = |id: i64| id == 7;
        assert!(only_seven.employee_exists(7).unwrap());
        assert!(!only_seven.employee_exists(8).unwrap());
    }
}
