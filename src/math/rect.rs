//! Axis-aligned rectangle on the terrain's XZ plane

use crate::core::types::Vec2;

/// Rectangle defined by min (left, bottom) and max (right, top) corners.
///
/// Used for node footprints in the terrain's local space, where x grows to
/// the right and z grows toward the viewer (a node's top edge has the larger
/// z value).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Create a rect from min and max corners
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Extent along x
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Extent along the second axis
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Center point
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Check if a point lies inside (borders included)
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extents_and_center() {
        let rc = Rect::new(Vec2::new(-2.0, -4.0), Vec2::new(2.0, 0.0));
        assert_eq!(rc.width(), 4.0);
        assert_eq!(rc.height(), 4.0);
        assert_eq!(rc.center(), Vec2::new(0.0, -2.0));
    }

    #[test]
    fn test_contains() {
        let rc = Rect::new(Vec2::ZERO, Vec2::ONE);
        assert!(rc.contains(Vec2::splat(0.5)));
        assert!(rc.contains(Vec2::ONE));
        assert!(!rc.contains(Vec2::splat(1.5)));
    }
}
