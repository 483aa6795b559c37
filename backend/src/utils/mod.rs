pub mod email;
pub mod security;

pub use security::*;
