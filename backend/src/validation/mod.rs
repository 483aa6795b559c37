//! Unified validation framework for input payloads.
//!
//! This module provides reusable validation rules to ensure consistent
//! input validation across all service entry points.

pub mod rules;

pub use validator::Validate;
