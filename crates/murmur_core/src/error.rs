//! Error types for murmur_core.
//!
//! None of these are fatal to a tick: each one is local to a single entity
//! update or a single effect acquisition.

use murmur_data::{EntityId, ExternalId, ForceKind, ParseKindError};
use thiserror::Error;

/// Failures reported by an [`EffectHost`](crate::host::EffectHost).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The host refused to create the object
    #[error("Host rejected spawn: {0}")]
    SpawnRejected(String),

    /// The id does not refer to a live host object
    #[error("Unknown host handle: {0}")]
    UnknownHandle(ExternalId),
}

/// Failures from [`EffectPool::acquire`](crate::pool::EffectPool::acquire).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Every slot is live and there is no idle handle to evict
    #[error("Effect pool saturated (capacity {capacity})")]
    Saturated { capacity: usize },

    /// The host no longer recognises a handle the pool was tracking
    #[error("Stale effect handle: {0}")]
    StaleHandle(ExternalId),

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

/// Main error type for murmur_core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Name lookup against a fixed enumeration failed
    #[error(transparent)]
    UnknownName(#[from] ParseKindError),

    /// The swarm has no force of this kind
    #[error("Force not registered: {0}")]
    ForceNotRegistered(ForceKind),

    /// The id's slot was released or reused
    #[error("Stale entity id: {0}")]
    StaleEntity(EntityId),

    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),
}

/// Result type alias for murmur_core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
