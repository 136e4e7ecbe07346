use super::{Force, ForceSettings, NeighborData};
use murmur_data::{ForceKind, Vec3};

/// Pulls every entity toward a movable target point.
///
/// The vertical offset counts double so the swarm levels out at the target's
/// height before closing in horizontally. Outside `radius` the pull is scaled
/// by `pull`.
#[derive(Debug, Clone)]
pub struct Attractor {
    pub target: Vec3,
    pub radius: f32,
    pub pull: f32,
    settings: ForceSettings,
}

impl Attractor {
    pub fn new(target: Vec3, weight: f32, radius: f32, pull: f32) -> Self {
        Self {
            target,
            radius,
            pull,
            settings: ForceSettings::new(weight, 0.0),
        }
    }
}

impl Force for Attractor {
    fn kind(&self) -> ForceKind {
        ForceKind::Attractor
    }

    fn settings(&self) -> &ForceSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut ForceSettings {
        &mut self.settings
    }

    fn calculate(
        &self,
        _index: usize,
        position: Vec3,
        _velocity: Vec3,
        _neighbors: &[NeighborData],
    ) -> Vec3 {
        let mut offset = self.target - position;
        offset.y *= 2.0;
        if offset.magnitude() > self.radius {
            offset.normalized() * self.pull
        } else {
            offset.normalized()
        }
    }

    fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }
}
