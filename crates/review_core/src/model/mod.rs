//! Domain model for performance reviews.
//!
//! # Responsibility
//! - Define the `Review` value object and its field contracts.
//!
//! # Invariants
//! - A `Review` never holds a field value that violates its contract.
//! - `id` is `None` until the review repository persists the instance.

pub mod review;
