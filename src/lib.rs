//! Headless host for the murmur runtime.
//!
//! The library half of the `murmur` binary: loads `murmur.toml`, drives a
//! [`Simulation`](murmur_core::Simulation) against the in-memory
//! [`RecordingHost`](murmur_core::host::RecordingHost) and summarizes the run.

pub mod app;
