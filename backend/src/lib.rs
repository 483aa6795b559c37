//! Storage-backed core of a server-rendered shop: per-user carts, order
//! creation, a paginated product catalog, and account recovery via
//! single-use reset tokens.
//!
//! The HTTP layer, sessions, file uploads, and PDF rendering live outside
//! this crate. Everything here is reachable through the services in
//! [`services`], which talk to storage only through the seams in
//! [`repositories`] and send mail only through [`utils::email::Mailer`].

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;
pub mod types;
pub mod utils;
pub mod validation;
