//! System orchestration, startup, and shutdown logic.

pub mod error;
pub mod logging;
pub mod order_system;

pub use error::*;
pub use logging::*;
pub use order_system::*;
