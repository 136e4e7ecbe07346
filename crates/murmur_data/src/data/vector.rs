use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// A 3D float triple used for positions, velocities and forces.
///
/// Entity state lives in flat `[x, y, z, x, y, z, ...]` arrays; `Vec3` is the
/// value type loaded from and written back to those arrays.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn magnitude_sq(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[inline]
    pub fn magnitude(self) -> f32 {
        self.magnitude_sq().sqrt()
    }

    #[inline]
    pub fn distance_sq(self, other: Vec3) -> f32 {
        (self - other).magnitude_sq()
    }

    #[inline]
    pub fn distance(self, other: Vec3) -> f32 {
        self.distance_sq(other).sqrt()
    }

    /// Divides by `scalar`, leaving the vector untouched when `scalar` is zero.
    #[inline]
    pub fn div_or_keep(self, scalar: f32) -> Vec3 {
        if scalar != 0.0 {
            Vec3::new(self.x / scalar, self.y / scalar, self.z / scalar)
        } else {
            self
        }
    }

    /// Unit vector in the same direction; the zero vector stays zero.
    #[inline]
    pub fn normalized(self) -> Vec3 {
        let mag = self.magnitude();
        if mag > 0.0 {
            self.div_or_keep(mag)
        } else {
            Vec3::ZERO
        }
    }

    /// Scales the vector down so its magnitude does not exceed `max`.
    #[inline]
    pub fn limit(self, max: f32) -> Vec3 {
        let mag = self.magnitude();
        if mag > max {
            self * (max / mag)
        } else {
            self
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Reads the triple starting at `offset` in a flat component array.
    #[inline]
    pub fn from_slice(components: &[f32], offset: usize) -> Vec3 {
        Vec3::new(
            components[offset],
            components[offset + 1],
            components[offset + 2],
        )
    }

    #[inline]
    pub fn write_to(self, components: &mut [f32], offset: usize) {
        components[offset] = self.x;
        components[offset + 1] = self.y;
        components[offset + 2] = self.z;
    }

    /// Euler angles `(pitch, yaw, roll)` facing along this direction.
    pub fn direction_to_euler(self) -> Vec3 {
        let distance_xz = (self.x * self.x + self.z * self.z).sqrt();
        let pitch = self.y.atan2(distance_xz);
        let yaw = self.x.atan2(self.z);
        Vec3::new(pitch, yaw, 0.0)
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Vec3) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, scalar: f32) -> Vec3 {
        Vec3::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl MulAssign<f32> for Vec3 {
    fn mul_assign(&mut self, scalar: f32) {
        self.x *= scalar;
        self.y *= scalar;
        self.z *= scalar;
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(v: [f32; 3]) -> Self {
        Vec3::new(v[0], v[1], v[2])
    }
}

impl From<Vec3> for [f32; 3] {
    fn from(v: Vec3) -> Self {
        [v.x, v.y, v.z]
    }
}

impl From<(f32, f32, f32)> for Vec3 {
    fn from((x, y, z): (f32, f32, f32)) -> Self {
        Vec3::new(x, y, z)
    }
}

impl From<Vec3> for (f32, f32, f32) {
    fn from(v: Vec3) -> Self {
        (v.x, v.y, v.z)
    }
}
