//! Storage seams and their implementations.
//!
//! Services depend on the traits defined here. Postgres-backed
//! implementations live alongside an in-memory one used by tests.

pub mod memory;
pub mod orders;
pub mod products;
pub mod users;

pub use memory::*;
pub use orders::*;
pub use products::*;
pub use users::*;
