//! Core data structures for the murmur simulation.

pub mod effect;
pub mod entity;
pub mod force;
pub mod transform;
pub mod vector;

use thiserror::Error;

/// Returned when a name does not match any variant of a fixed enumeration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} name: {name:?}")]
pub struct ParseKindError {
    /// Enumeration the lookup ran against.
    pub kind: &'static str,
    /// The rejected input.
    pub name: String,
}

impl ParseKindError {
    pub fn new(kind: &'static str, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
        }
    }
}
