//! Grading table state
//!
//! - `validator`: score range checks
//! - `rows`: grade rows, row derivation and field mutators

pub mod rows;
pub mod validator;

pub use rows::{build_rows, GradeRow, GradeTable, StudentRef};
pub use validator::{is_valid_score, max_points};
