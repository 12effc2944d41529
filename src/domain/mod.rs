pub mod order;
pub mod profile;
pub mod review;

pub use order::*;
pub use profile::*;
pub use review::*;
