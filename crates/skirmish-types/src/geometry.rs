//! World-space positions.
//!
//! The simulation plays out on the XZ ground plane; `y` is carried along so
//! navigation backends with terrain can keep their height.

use core::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A point (or offset) in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// East-west axis.
    #[serde(default)]
    pub x: f32,
    /// Height.
    #[serde(default)]
    pub y: f32,
    /// North-south axis.
    #[serde(default)]
    pub z: f32,
}

impl Position {
    /// The world origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Construct a position from its components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Squared length of this vector.
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Length of this vector.
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Squared distance between two points. Proximity queries compare
    /// squared distances so no square root is taken.
    pub fn distance_squared(self, other: Self) -> f32 {
        (self - other).length_squared()
    }

    /// Unit vector in the same direction, or [`Self::ZERO`] for a
    /// degenerate (zero or non-finite) vector.
    pub fn normalized(self) -> Self {
        let length = self.length();
        if length.is_finite() && length > f32::EPSILON {
            self * length.recip()
        } else {
            Self::ZERO
        }
    }

    /// The point at `radius` from `self` along `angle` (radians) on the
    /// ground plane. Angle zero points along +z.
    pub fn offset_polar(self, angle: f32, radius: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x + sin * radius, self.y, self.z + cos * radius)
    }

    /// Component-wise mean of a set of points, `None` when empty.
    pub fn centroid<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        let mut sum = Self::ZERO;
        let mut count = 0.0_f32;
        for point in points {
            sum += point;
            count += 1.0;
        }
        (count > 0.0).then(|| sum * count.recip())
    }
}

impl Add for Position {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Position {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Position {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Position {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn distance_squared_skips_the_root() {
        let a = Position::new(1.0, 0.0, 1.0);
        let b = Position::new(4.0, 0.0, 5.0);
        assert!(close(a.distance_squared(b), 25.0));
    }

    #[test]
    fn normalized_zero_vector_stays_zero() {
        assert_eq!(Position::ZERO.normalized(), Position::ZERO);
        let unit = Position::new(3.0, 0.0, 4.0).normalized();
        assert!(close(unit.length(), 1.0));
    }

    #[test]
    fn offset_polar_moves_on_ground_plane() {
        let origin = Position::new(2.0, 1.0, 2.0);
        let moved = origin.offset_polar(0.0, 5.0);
        assert!(close(moved.x, 2.0));
        assert!(close(moved.y, 1.0));
        assert!(close(moved.z, 7.0));
    }

    #[test]
    fn centroid_of_nothing_is_none() {
        assert!(Position::centroid(Vec::new()).is_none());
        let mid = Position::centroid([Position::new(0.0, 0.0, 0.0), Position::new(4.0, 0.0, 2.0)]);
        assert!(mid.is_some_and(|p| close(p.x, 2.0) && close(p.z, 1.0)));
    }
}
