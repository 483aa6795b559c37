//! Business services orchestrating the storage and mailer seams.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;

pub use auth::*;
pub use cart::*;
pub use catalog::*;
pub use orders::*;
