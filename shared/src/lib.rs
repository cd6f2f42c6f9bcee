//! Shared types and decision logic for the Land Survey Platform
//!
//! This crate contains the survey lifecycle rules, the plant matching engine
//! and the soil aggregation used by the backend, the WASM bindings and any
//! other component that needs to reason about survey data offline.

pub mod aggregate;
pub mod lifecycle;
pub mod matching;
pub mod models;
pub mod types;
pub mod validation;

pub use aggregate::*;
pub use lifecycle::*;
pub use matching::*;
pub use models::*;
pub use types::*;
pub use validation::*;
