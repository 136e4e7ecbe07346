//! Weighted force strategies.
//!
//! Each [`Force`] turns an entity's state and its pre-filtered neighbors into
//! a directional adjustment. [`ForceSet`] owns the active forces and folds
//! their outputs into one weighted sum per entity.

mod attractor;
mod neighbor;

pub use attractor::Attractor;
pub use neighbor::{Alignment, Cohesion, NeighborForce, NeighborRule, Separation};

use crate::config::ForceConfig;
use crate::error::{CoreError, Result};
use murmur_data::{ForceKind, Vec3};

/// A neighbor within perception range of the entity being updated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborData {
    pub index: usize,
    pub position: Vec3,
    pub velocity: Vec3,
    pub distance: f32,
    pub distance_sq: f32,
}

/// Runtime-tunable parameters shared by every force.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceSettings {
    pub weight: f32,
    pub enabled: bool,
    pub perception_radius: f32,
}

impl ForceSettings {
    pub fn new(weight: f32, perception_radius: f32) -> Self {
        Self {
            weight: weight.max(0.0),
            enabled: true,
            perception_radius,
        }
    }

    /// Whether this force can contribute anything at all.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.enabled && self.weight > 0.0
    }
}

pub trait Force {
    fn kind(&self) -> ForceKind;
    fn settings(&self) -> &ForceSettings;
    fn settings_mut(&mut self) -> &mut ForceSettings;

    /// Unweighted adjustment for entity `index`.
    ///
    /// `neighbors` is already filtered to the largest perception radius in
    /// the set and excludes `index` itself.
    fn calculate(
        &self,
        index: usize,
        position: Vec3,
        velocity: Vec3,
        neighbors: &[NeighborData],
    ) -> Vec3;

    fn weight(&self) -> f32 {
        self.settings().weight
    }

    fn perception_radius(&self) -> f32 {
        self.settings().perception_radius
    }

    /// Moves the force's target point. Forces without one ignore it.
    fn set_target(&mut self, _target: Vec3) {}
}

/// The ordered set of forces acting on one swarm.
pub struct ForceSet {
    forces: Vec<Box<dyn Force>>,
}

impl Default for ForceSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ForceSet {
    pub fn new() -> Self {
        Self { forces: Vec::new() }
    }

    /// Builds the standard four-force set from configuration.
    pub fn from_config(config: &ForceConfig, perception_radius: f32) -> Self {
        let mut set = Self::new();
        set.push(Box::new(NeighborForce::new(
            Separation {
                distance: config.separation_distance,
            },
            config.separation_weight,
            perception_radius,
        )));
        set.push(Box::new(NeighborForce::new(
            Alignment,
            config.alignment_weight,
            perception_radius,
        )));
        set.push(Box::new(NeighborForce::new(
            Cohesion,
            config.cohesion_weight,
            perception_radius,
        )));
        set.push(Box::new(Attractor::new(
            Vec3::from(config.attractor_target),
            config.attractor_weight,
            config.attractor_radius,
            config.attractor_pull,
        )));
        set
    }

    /// Adds a force, replacing any existing force of the same kind.
    pub fn push(&mut self, force: Box<dyn Force>) {
        let kind = force.kind();
        match self.forces.iter().position(|f| f.kind() == kind) {
            Some(pos) => self.forces[pos] = force,
            None => self.forces.push(force),
        }
    }

    pub fn len(&self) -> usize {
        self.forces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    pub fn get(&self, kind: ForceKind) -> Option<&dyn Force> {
        self.forces
            .iter()
            .find(|f| f.kind() == kind)
            .map(|f| f.as_ref())
    }

    fn get_mut(&mut self, kind: ForceKind) -> Result<&mut Box<dyn Force>> {
        self.forces
            .iter_mut()
            .find(|f| f.kind() == kind)
            .ok_or(CoreError::ForceNotRegistered(kind))
    }

    /// `Σ calculate * weight` over active forces.
    pub fn weighted_sum(
        &self,
        index: usize,
        position: Vec3,
        velocity: Vec3,
        neighbors: &[NeighborData],
    ) -> Vec3 {
        let mut total = Vec3::ZERO;
        for force in &self.forces {
            let settings = force.settings();
            if !settings.is_active() {
                continue;
            }
            total += force.calculate(index, position, velocity, neighbors) * settings.weight;
        }
        total
    }

    /// Adds `delta` to a force's weight, clamping at zero. Returns the new weight.
    pub fn adjust_weight(&mut self, kind: ForceKind, delta: f32) -> Result<f32> {
        let settings = self.get_mut(kind)?.settings_mut();
        settings.weight = (settings.weight + delta).max(0.0);
        Ok(settings.weight)
    }

    pub fn set_weight(&mut self, kind: ForceKind, weight: f32) -> Result<()> {
        self.get_mut(kind)?.settings_mut().weight = weight.max(0.0);
        Ok(())
    }

    pub fn set_enabled(&mut self, kind: ForceKind, enabled: bool) -> Result<()> {
        self.get_mut(kind)?.settings_mut().enabled = enabled;
        Ok(())
    }

    pub fn set_attractor_target(&mut self, target: Vec3) -> Result<()> {
        self.get_mut(ForceKind::Attractor)?.set_target(target);
        Ok(())
    }

    /// Largest perception radius among forces that read neighbors.
    pub fn max_perception_radius(&self) -> f32 {
        self.forces
            .iter()
            .map(|f| f.perception_radius())
            .fold(0.0, f32::max)
    }

    /// One-line summary of every weight, e.g. for tuning logs.
    pub fn describe(&self) -> String {
        self.forces
            .iter()
            .map(|f| {
                let s = f.settings();
                if s.enabled {
                    format!("{}: {:.2}", f.kind(), s.weight)
                } else {
                    format!("{}: {:.2} (off)", f.kind(), s.weight)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
