//! # Murmur Core
//!
//! Amortized spatial-simulation and resource-pooling engine.
//!
//! This crate contains the tick-driven runtime pieces a host composes:
//! - Uniform spatial hash over 3D points for approximate neighbor queries
//! - Weighted flocking forces (separation, alignment, cohesion, attractor)
//! - Structure-of-arrays swarm arena with a clamped Euler integrator
//! - Batched round-robin scheduler that bounds per-tick work
//! - Hard-capacity effect pool with free-list reuse and timed expiry
//!
//! ## Architecture
//!
//! Everything runs synchronously inside [`Simulation::tick`]: the scheduler
//! drains its budget of entity updaters, each updater queries the grid, folds
//! forces into velocity and stages a transform, a bounded apply pass turns
//! staged transforms into pooled effects, and the pool is swept for expired
//! handles. There is no global state; a [`Simulation`] owns every component.
//!
//! ## Example
//!
//! ```
//! use murmur_core::config::SimConfig;
//! use murmur_core::host::RecordingHost;
//! use murmur_core::Simulation;
//! use murmur_data::Vec3;
//!
//! let mut config = SimConfig::default();
//! config.swarm.initial_entities = 0;
//! let mut sim = Simulation::new(config, RecordingHost::default()).unwrap();
//!
//! let id = sim.spawn_entity(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.1, 0.0, 0.0));
//! sim.tick();
//! assert!(sim.state().swarm.is_alive(id));
//! ```

/// Tick counter, rate limiting and tick-rate monitoring
pub mod clock;
/// Configuration management for simulation parameters
pub mod config;
/// Error types for the runtime
pub mod error;
/// Tick subscriptions with token-based deregistration
pub mod events;
/// Weighted force strategies
pub mod forces;
/// Uniform spatial hashing for neighbor queries
pub mod grid;
/// Host-side effect handle abstraction
pub mod host;
/// Named metrics and structured logging
pub mod metrics;
/// Swarm arena and integrator
pub mod physics;
/// Bounded-capacity effect pool
pub mod pool;
/// Batched round-robin updater
pub mod scheduler;
/// Simulation context tying every component together
pub mod simulation;
/// Pending transform staging and the bounded apply pass
pub mod transforms;

pub use error::{CoreError, HostError, PoolError, Result};
pub use metrics::{init_logging, Metrics};
pub use simulation::{Simulation, SwarmState, TaskKey, Telemetry, TickReport};
