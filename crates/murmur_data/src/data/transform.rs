use super::vector::Vec3;
use serde::{Deserialize, Serialize};

/// Position plus Euler rotation `(pitch, yaw, roll)` handed to the host.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Transform {
    pub fn new(position: Vec3, rotation: Vec3) -> Self {
        Self { position, rotation }
    }

    /// Transform at `position` facing along `velocity`.
    pub fn from_motion(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position,
            rotation: velocity.direction_to_euler(),
        }
    }
}
