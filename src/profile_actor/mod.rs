//! Customer profiles: contact details, saved address and points balance.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
