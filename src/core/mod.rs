// src/core/mod.rs

//! Core data structures and types

pub mod error;
pub mod state;

// Re-export public types for convenient access via `qecsim::core::TypeName`
pub use error::{QecError, QecResult, QubitId};
pub use state::StateVector;
