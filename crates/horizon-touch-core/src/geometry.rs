//! Geometry primitives for touch locations.

use std::ops::{Add, Sub};

/// A 2D point in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// The origin point (0, 0).
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance_to(self, other: Point) -> f32 {
        (other - self).length()
    }

    /// Length of the vector from the origin to this point.
    #[inline]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Angle of the vector from the origin to this point, in radians.
    #[inline]
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Scale both components.
    #[inline]
    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Average of a set of points, or `None` if the set is empty.
    pub fn centroid<I>(points: I) -> Option<Point>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut sum = Point::ZERO;
        let mut count = 0usize;
        for p in points {
            sum = sum + p;
            count += 1;
        }
        (count > 0).then(|| sum.scale(1.0 / count as f32))
    }
}

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl From<[f32; 2]> for Point {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_to(b) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_centroid() {
        let c = Point::centroid([Point::new(0.0, 0.0), Point::new(10.0, 20.0)]).unwrap();
        assert_eq!(c, Point::new(5.0, 10.0));
        assert!(Point::centroid(std::iter::empty()).is_none());
    }

    #[test]
    fn test_angle() {
        assert!((Point::new(0.0, 1.0).angle() - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }
}
