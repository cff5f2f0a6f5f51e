//! Backend services.
//!
//! # Services
//!
//! - [`api`] - Typed endpoint wrappers over a [`crate::Transport`]
//! - [`export`] - Report sinks that persist exported reports

pub mod api;
pub mod export;

pub use api::*;
pub use export::*;
