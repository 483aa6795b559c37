pub mod id;

pub use id::{OrderId, ProductId, UserId};
