//! Repository layer: identity-mapped review persistence and the employee
//! lookup capability it validates against.
//!
//! # Invariants
//! - Review writes only happen for instances whose fields passed validation.
//! - At most one live `Review` object exists per persisted id and repository.
//! - Lookups report absence as `None`, never as an error.

pub mod employee_repo;
pub mod identity_map;
pub mod review_repo;
