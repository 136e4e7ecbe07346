//! Configuration management for simulation parameters.
//!
//! Every tunable of the runtime maps to a section of `murmur.toml`. Missing
//! sections and fields fall back to the values in the `Default` impls, which
//! carry the reference tuning of the swarm.
//!
//! ## Example `murmur.toml`
//!
//! ```toml
//! [swarm]
//! initial_entities = 200
//! max_speed = 0.5
//! seed = 7
//!
//! [forces]
//! separation_weight = 4.0
//! attractor_target = [-204.0, 220.0, 135.0]
//!
//! [pool]
//! capacity = 1000
//! grace_ms = 5000
//! ```

use serde::{Deserialize, Serialize};

/// Swarm size, layout and motion limits.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SwarmConfig {
    /// Entities spawned by [`Simulation::new`](crate::Simulation::new).
    pub initial_entities: usize,
    /// Initial entities are laid out in rows of this many.
    pub row_length: usize,
    /// Distance between neighboring entities in the initial layout.
    pub spacing: f32,
    pub origin: [f32; 3],
    /// Each initial velocity component is drawn from `±initial_speed_spread / 2`.
    pub initial_speed_spread: f32,
    pub max_speed: f32,
    pub max_force: f32,
    pub perception_radius: f32,
    /// Edge length of a spatial grid cell. Must be at least twice the perception radius.
    pub cell_size: f32,
    pub seed: Option<u64>,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            initial_entities: 100,
            row_length: 10,
            spacing: 2.0,
            origin: [-220.0, 200.0, 120.0],
            initial_speed_spread: 0.1,
            max_speed: 0.5,
            max_force: 0.01,
            perception_radius: 20.0,
            cell_size: 40.0,
            seed: None,
        }
    }
}

/// Initial weights and parameters of the force set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ForceConfig {
    pub separation_weight: f32,
    /// Neighbors closer than this push the entity away.
    pub separation_distance: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub attractor_weight: f32,
    pub attractor_target: [f32; 3],
    /// Beyond this distance the attractor pulls with `attractor_pull` strength.
    pub attractor_radius: f32,
    pub attractor_pull: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            separation_weight: 4.0,
            separation_distance: 3.0,
            alignment_weight: 0.0,
            cohesion_weight: 0.0,
            attractor_weight: 0.6,
            attractor_target: [-204.0, 220.0, 135.0],
            attractor_radius: 25.0,
            attractor_pull: 2.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum entity updaters run per tick.
    pub entity_budget: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { entity_budget: 100 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PoolConfig {
    /// Hard cap on live plus free effect handles.
    pub capacity: usize,
    /// How long a hidden handle stays reserved before it is recycled or released.
    pub grace_ms: u64,
    /// When false, expired handles are always destroyed instead of kept for reuse.
    pub recycle_expired: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            grace_ms: 5000,
            recycle_expired: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TransformConfig {
    /// Maximum staged transforms applied per tick.
    pub budget: usize,
    /// Minimum ticks between two applies for the same entity.
    pub min_interval_ticks: u64,
    /// Visible lifetime of a trail effect.
    pub effect_ttl_ms: u64,
    /// Random extra lifetime in `[0, effect_ttl_jitter_ms)`.
    pub effect_ttl_jitter_ms: u64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            budget: 20,
            min_interval_ticks: 3,
            effect_ttl_ms: 3000,
            effect_ttl_jitter_ms: 1000,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Nominal host tick rate, used for simulated time and the rate monitor.
    pub tick_rate: u32,
    /// Metrics are reported (and periodic metrics reset) every this many ticks.
    pub report_interval_ticks: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30,
            report_interval_ticks: 300,
        }
    }
}

/// Top-level simulation configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct SimConfig {
    pub swarm: SwarmConfig,
    pub forces: ForceConfig,
    pub scheduler: SchedulerConfig,
    pub pool: PoolConfig,
    pub transforms: TransformConfig,
    pub telemetry: TelemetryConfig,
}

impl SimConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` with a description
    /// of the first validation failure.
    ///
    /// # Validation Rules
    /// - Motion limits, weights and radii must be non-negative
    /// - The grid cell must cover twice the perception radius
    /// - Every per-tick budget and the pool capacity must be positive
    pub fn validate(&self) -> anyhow::Result<()> {
        let swarm = &self.swarm;
        anyhow::ensure!(swarm.row_length > 0, "Row length must be positive");
        anyhow::ensure!(
            swarm.spacing.is_finite() && swarm.spacing >= 0.0,
            "Spacing must be non-negative"
        );
        anyhow::ensure!(
            swarm.origin.iter().all(|c| c.is_finite()),
            "Origin must be finite"
        );
        anyhow::ensure!(
            swarm.initial_speed_spread >= 0.0,
            "Initial speed spread must be non-negative"
        );
        anyhow::ensure!(swarm.max_speed >= 0.0, "Max speed must be non-negative");
        anyhow::ensure!(swarm.max_force >= 0.0, "Max force must be non-negative");
        anyhow::ensure!(
            swarm.perception_radius > 0.0 && swarm.perception_radius.is_finite(),
            "Perception radius must be positive"
        );
        anyhow::ensure!(
            swarm.cell_size.is_finite() && swarm.cell_size >= 2.0 * swarm.perception_radius,
            "Cell size ({}) must be at least twice the perception radius ({})",
            swarm.cell_size,
            swarm.perception_radius
        );

        let forces = &self.forces;
        anyhow::ensure!(
            forces.separation_weight >= 0.0
                && forces.alignment_weight >= 0.0
                && forces.cohesion_weight >= 0.0
                && forces.attractor_weight >= 0.0,
            "Force weights must be non-negative"
        );
        anyhow::ensure!(
            forces.separation_distance >= 0.0,
            "Separation distance must be non-negative"
        );
        anyhow::ensure!(
            forces.separation_distance <= swarm.perception_radius,
            "Separation distance must not exceed the perception radius"
        );
        anyhow::ensure!(
            forces.attractor_radius >= 0.0,
            "Attractor radius must be non-negative"
        );
        anyhow::ensure!(
            forces.attractor_pull >= 0.0,
            "Attractor pull must be non-negative"
        );
        anyhow::ensure!(
            forces.attractor_target.iter().all(|c| c.is_finite()),
            "Attractor target must be finite"
        );

        anyhow::ensure!(
            self.scheduler.entity_budget > 0,
            "Scheduler entity budget must be positive"
        );
        anyhow::ensure!(self.pool.capacity > 0, "Pool capacity must be positive");
        anyhow::ensure!(
            self.transforms.budget > 0,
            "Transform budget must be positive"
        );
        anyhow::ensure!(
            self.telemetry.tick_rate > 0,
            "Tick rate must be positive"
        );
        anyhow::ensure!(
            self.telemetry.tick_rate <= 1000,
            "Tick rate too high (max 1000)"
        );
        anyhow::ensure!(
            self.telemetry.report_interval_ticks > 0,
            "Report interval must be positive"
        );

        Ok(())
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Stable digest of every section, logged at startup so runs can be matched to their tuning.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.swarm).as_bytes());
        hasher.update(format!("{:?}", self.forces).as_bytes());
        hasher.update(format!("{:?}", self.scheduler).as_bytes());
        hasher.update(format!("{:?}", self.pool).as_bytes());
        hasher.update(format!("{:?}", self.transforms).as_bytes());
        hasher.update(format!("{:?}", self.telemetry).as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cell_size_must_cover_perception() {
        let config = SimConfig {
            swarm: SwarmConfig {
                perception_radius: 20.0,
                cell_size: 39.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("twice the perception radius"));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let config = SimConfig {
            forces: ForceConfig {
                cohesion_weight: -1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = SimConfig {
            pool: PoolConfig {
                capacity: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_budget_rejected() {
        let config = SimConfig {
            scheduler: SchedulerConfig { entity_budget: 0 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SimConfig::from_toml(
            r#"
            [swarm]
            initial_entities = 12
            seed = 9

            [pool]
            capacity = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.swarm.initial_entities, 12);
        assert_eq!(config.swarm.seed, Some(9));
        assert_eq!(config.swarm.max_speed, 0.5);
        assert_eq!(config.pool.capacity, 8);
        assert_eq!(config.pool.grace_ms, 5000);
        assert_eq!(config.transforms.budget, 20);
    }

    #[test]
    fn test_from_toml_rejects_invalid() {
        assert!(SimConfig::from_toml("[telemetry]\ntick_rate = 0\n").is_err());
        assert!(SimConfig::from_toml("[swarm\n").is_err());
    }

    #[test]
    fn test_fingerprint_tracks_changes() {
        let a = SimConfig::default();
        let mut b = SimConfig::default();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.forces.attractor_weight = 0.7;
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
