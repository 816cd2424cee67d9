//! # kaiwa-core
//!
//! Core types, traits, and abstractions for the kaiwa chat service.
//!
//! This crate provides the foundational data structures, the error taxonomy,
//! the realtime wire-event schema, and the repository trait definitions that
//! the other kaiwa crates depend on.

pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{ClientEvent, ServerEvent};
pub use models::*;
pub use traits::*;
