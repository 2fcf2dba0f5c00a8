//! Math utilities and types
//!
//! Provides the small set of 2D math types the scene core needs: entity
//! transforms and axis-aligned bounds for broad-phase registration.

pub use nalgebra::Vector2;

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// Transform representing position, rotation, and scale of an entity
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in world space
    pub position: Vec2,

    /// Rotation in radians
    pub rotation: f32,

    /// Scale factors
    pub scale: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::zeros(),
            rotation: 0.0,
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Apply scale and translation to a local-space point
    pub fn transform_point(&self, point: Vec2) -> Vec2 {
        let (sin, cos) = self.rotation.sin_cos();
        let scaled = point.component_mul(&self.scale);
        let rotated = Vec2::new(
            scaled.x * cos - scaled.y * sin,
            scaled.x * sin + scaled.y * cos,
        );
        rotated + self.position
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Aabb {
    /// Create a box from its corners
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Create a box centered on `center` with the given full size
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Center of the box
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Full extent of the box
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Check if two boxes overlap (touching edges count)
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Check if a point lies inside the box
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x
            && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Smallest box containing every given point
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::new(*first, *first);
        for point in rest {
            bounds.min = bounds.min.inf(point);
            bounds.max = bounds.max.sup(point);
        }
        Some(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_point_translates_and_scales() {
        let transform = Transform {
            position: Vec2::new(10.0, 5.0),
            rotation: 0.0,
            scale: Vec2::new(2.0, 2.0),
        };

        let point = transform.transform_point(Vec2::new(1.0, 1.0));
        assert_relative_eq!(point.x, 12.0);
        assert_relative_eq!(point.y, 7.0);
    }

    #[test]
    fn test_transform_point_rotates() {
        let transform = Transform {
            rotation: std::f32::consts::FRAC_PI_2,
            ..Transform::identity()
        };

        let point = transform.transform_point(Vec2::new(1.0, 0.0));
        assert_relative_eq!(point.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(point.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_aabb_intersection() {
        let a = Aabb::from_center_size(Vec2::zeros(), Vec2::new(2.0, 2.0));
        let b = Aabb::from_center_size(Vec2::new(1.5, 0.0), Vec2::new(2.0, 2.0));
        let c = Aabb::from_center_size(Vec2::new(5.0, 0.0), Vec2::new(2.0, 2.0));

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains_point(Vec2::new(0.5, -0.5)));
        assert_relative_eq!(b.center().x, 1.5);
    }

    #[test]
    fn test_aabb_from_points() {
        let bounds = Aabb::from_points(&[
            Vec2::new(1.0, 4.0),
            Vec2::new(-2.0, 0.5),
            Vec2::new(3.0, -1.0),
        ])
        .unwrap();

        assert_eq!(bounds.min, Vec2::new(-2.0, -1.0));
        assert_eq!(bounds.max, Vec2::new(3.0, 4.0));
        assert!(Aabb::from_points(&[]).is_none());
    }
}
