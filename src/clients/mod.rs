//! Typed handles over the resource actors.
//!
//! Each client implements the matching store trait from [`crate::stores`].

#[macro_use]
mod macros;
mod order_client;
mod profile_client;
mod review_client;

pub use order_client::OrderClient;
pub use profile_client::ProfileClient;
pub use review_client::ReviewClient;
