//! Juice reviews. Rows are immutable once written.

pub mod entity;
pub mod error;

pub use error::*;
