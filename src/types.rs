//! Common types and traits for 3D geometry.
//!
//! Dimensions are expressed in inches and weights in pounds throughout the crate.
//! The `x` axis runs along a box's length, `y` along its width and `z` along its height.

use std::ops::Add;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Global numerical tolerance for floating-point comparisons.
///
/// Used for dimension, volume and weight comparisons.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Represents a 3D vector or point in space.
///
/// Used for positions, dimensions, and calculations in 3D space.
///
/// # Examples
/// ```
/// use cartonizer::types::Vec3;
///
/// let position = Vec3::new(1.0, 2.0, 3.0);
/// let dimensions = Vec3::new(10.0, 20.0, 30.0);
/// let far_corner = position + dimensions;
/// assert_eq!(far_corner, Vec3::new(11.0, 22.0, 33.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new 3D vector.
    ///
    /// # Parameters
    /// * `x` - X component (length)
    /// * `y` - Y component (width)
    /// * `z` - Z component (height)
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (origin).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Calculates the volume (product of all components).
    #[inline]
    pub fn volume(&self) -> f64 {
        self.x * self.y * self.z
    }

    /// Returns the components sorted from largest to smallest.
    ///
    /// Two extents compared this way tell whether one can fit inside the other
    /// in *some* axis-aligned orientation.
    pub fn sorted_desc(&self) -> [f64; 3] {
        let mut dims = [self.x, self.y, self.z];
        dims.sort_by(|a, b| b.total_cmp(a));
        dims
    }

    /// Returns the largest component.
    #[inline]
    pub fn longest(&self) -> f64 {
        self.x.max(self.y).max(self.z)
    }

    /// Checks if the vector fits within another vector (component-wise <=).
    ///
    /// # Parameters
    /// * `container` - The outer vector (e.g., free space extents)
    /// * `tolerance` - Numerical tolerance for the comparison
    #[inline]
    pub fn fits_within(&self, container: &Self, tolerance: f64) -> bool {
        self.x <= container.x + tolerance
            && self.y <= container.y + tolerance
            && self.z <= container.z + tolerance
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

/// Trait for objects with 3D dimensions.
///
/// Provides a common interface for items, boxes and free spaces.
pub trait Dimensional {
    /// Returns the dimensions of the object as (length, width, height).
    fn dimensions(&self) -> Vec3;

    /// Calculates the volume.
    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }

    /// Checks whether the object fits into `container_dims` in at least one orientation.
    fn fits_in_any_orientation(&self, container_dims: &Vec3, tolerance: f64) -> bool {
        let own = self.dimensions().sorted_desc();
        let outer = container_dims.sorted_desc();
        own.iter()
            .zip(outer.iter())
            .all(|(inner, outer)| *inner <= *outer + tolerance)
    }
}

/// Represents an Axis-Aligned Bounding Box (AABB).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner (position)
    pub min: Vec3,
    /// Maximum corner (position + dimensions)
    pub max: Vec3,
}

impl BoundingBox {
    /// Creates a bounding box from position and dimensions.
    #[inline]
    pub fn from_position_and_dims(position: Vec3, dims: Vec3) -> Self {
        Self {
            min: position,
            max: position + dims,
        }
    }

    /// Checks if two bounding boxes intersect.
    ///
    /// Touching faces do not count as an intersection.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        !(self.max.x <= other.min.x + EPSILON_GENERAL
            || other.max.x <= self.min.x + EPSILON_GENERAL
            || self.max.y <= other.min.y + EPSILON_GENERAL
            || other.max.y <= self.min.y + EPSILON_GENERAL
            || self.max.z <= other.min.z + EPSILON_GENERAL
            || other.max.z <= self.min.z + EPSILON_GENERAL)
    }

    /// Checks whether this box lies completely inside `outer`.
    #[inline]
    pub fn is_within(&self, outer: &Self) -> bool {
        self.min.x + EPSILON_GENERAL >= outer.min.x
            && self.min.y + EPSILON_GENERAL >= outer.min.y
            && self.min.z + EPSILON_GENERAL >= outer.min.z
            && self.max.x <= outer.max.x + EPSILON_GENERAL
            && self.max.y <= outer.max.y + EPSILON_GENERAL
            && self.max.z <= outer.max.z + EPSILON_GENERAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Brick(Vec3);

    impl Dimensional for Brick {
        fn dimensions(&self) -> Vec3 {
            self.0
        }
    }

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(Vec3::zero() + a, a);
    }

    #[test]
    fn test_sorted_desc_and_longest() {
        let dims = Vec3::new(6.0, 10.0, 8.0);
        assert_eq!(dims.sorted_desc(), [10.0, 8.0, 6.0]);
        assert!((dims.longest() - 10.0).abs() < EPSILON_GENERAL);
        assert!((dims.volume() - 480.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_fits_in_any_orientation() {
        let brick = Brick(Vec3::new(2.0, 12.0, 5.0));
        assert!(brick.fits_in_any_orientation(&Vec3::new(12.0, 6.0, 3.0), EPSILON_GENERAL));
        assert!(!brick.fits_in_any_orientation(&Vec3::new(11.0, 6.0, 6.0), EPSILON_GENERAL));
    }

    #[test]
    fn test_bounding_box_intersects() {
        let a = BoundingBox::from_position_and_dims(Vec3::zero(), Vec3::new(10.0, 10.0, 10.0));
        let b = BoundingBox::from_position_and_dims(
            Vec3::new(5.0, 5.0, 5.0),
            Vec3::new(10.0, 10.0, 10.0),
        );
        let touching = BoundingBox::from_position_and_dims(
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 10.0, 10.0),
        );

        assert!(a.intersects(&b));
        assert!(!a.intersects(&touching));
    }

    #[test]
    fn test_bounding_box_within() {
        let outer = BoundingBox::from_position_and_dims(Vec3::zero(), Vec3::new(10.0, 10.0, 10.0));
        let inner = BoundingBox::from_position_and_dims(
            Vec3::new(2.5, 2.5, 2.5),
            Vec3::new(7.0, 7.0, 7.0),
        );
        let sticking_out = BoundingBox::from_position_and_dims(
            Vec3::new(5.5, 0.5, 0.5),
            Vec3::new(8.0, 1.0, 1.0),
        );
        assert!(inner.is_within(&outer));
        assert!(!sticking_out.is_within(&outer));
    }
}
