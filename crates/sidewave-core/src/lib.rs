//! Sidewave Core Library
//!
//! This crate provides shared types, errors, and configuration for the
//! Sidewave sidebar.

pub mod config;
pub mod error;
pub mod types;

pub use config::{DetachPolicy, SidebarConfig};
pub use error::{SidewaveError, SidewaveResult};
