//! Plane geometry used by pointer tracking and recognizers.
//!
//! Coordinates are `f32` in the host's logical units. Velocities are expressed
//! in units per second.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A point in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
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

    /// Distance to another point.
    #[inline]
    pub fn distance_to(self, other: Point) -> f32 {
        (other - self).length()
    }

    #[inline]
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    /// Vector from the origin to this point.
    #[inline]
    pub fn to_vector(self) -> Vector {
        Vector::new(self.x, self.y)
    }

    /// Whether both coordinates are finite numbers.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// The arithmetic mean of a set of points, or `None` for an empty set.
    pub fn centroid<I: IntoIterator<Item = Point>>(points: I) -> Option<Point> {
        let mut sum = Vector::ZERO;
        let mut count = 0usize;
        for p in points {
            sum += p.to_vector();
            count += 1;
        }
        (count > 0).then(|| Point::new(sum.dx / count as f32, sum.dy / count as f32))
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl Sub for Point {
    type Output = Vector;

    #[inline]
    fn sub(self, rhs: Point) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<Vector> for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Vector) -> Point {
        Point::new(self.x + rhs.dx, self.y + rhs.dy)
    }
}

/// A displacement or velocity in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub dx: f32,
    pub dy: f32,
}

impl Vector {
    /// Create a new vector.
    #[inline]
    pub const fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    /// The zero vector.
    pub const ZERO: Self = Self { dx: 0.0, dy: 0.0 };

    /// Euclidean length.
    #[inline]
    pub fn length(self) -> f32 {
        self.dx.hypot(self.dy)
    }

    /// Squared length, avoiding the square root.
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dx * self.dx + self.dy * self.dy
    }

    /// Dot product.
    #[inline]
    pub fn dot(self, other: Vector) -> f32 {
        self.dx * other.dx + self.dy * other.dy
    }

    /// Unit vector in the same direction, or zero for a zero-length vector.
    pub fn normalized(self) -> Vector {
        let len = self.length();
        if len > f32::EPSILON {
            Vector::new(self.dx / len, self.dy / len)
        } else {
            Vector::ZERO
        }
    }
}

impl Add for Vector {
    type Output = Vector;

    #[inline]
    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.dx + rhs.dx, self.dy + rhs.dy)
    }
}

impl AddAssign for Vector {
    #[inline]
    fn add_assign(&mut self, rhs: Vector) {
        self.dx += rhs.dx;
        self.dy += rhs.dy;
    }
}

impl Sub for Vector {
    type Output = Vector;

    #[inline]
    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.dx - rhs.dx, self.dy - rhs.dy)
    }
}

impl Neg for Vector {
    type Output = Vector;

    #[inline]
    fn neg(self) -> Vector {
        Vector::new(-self.dx, -self.dy)
    }
}

impl Mul<f32> for Vector {
    type Output = Vector;

    #[inline]
    fn mul(self, rhs: f32) -> Vector {
        Vector::new(self.dx * rhs, self.dy * rhs)
    }
}

impl Div<f32> for Vector {
    type Output = Vector;

    #[inline]
    fn div(self, rhs: f32) -> Vector {
        Vector::new(self.dx / rhs, self.dy / rhs)
    }
}

/// An axis-aligned rectangle defined by its origin and size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Check if the rectangle contains a point. The right and bottom edges are
    /// exclusive.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }

    /// Grow (positive) or shrink (negative) each edge independently.
    pub fn outset(&self, left: f32, top: f32, right: f32, bottom: f32) -> Rect {
        Rect::new(
            self.x - left,
            self.y - top,
            self.width + left + right,
            self.height + top + bottom,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
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
    fn test_vector_normalized() {
        let v = Vector::new(0.0, -2.0).normalized();
        assert_eq!(v, Vector::new(0.0, -1.0));
        assert_eq!(Vector::ZERO.normalized(), Vector::ZERO);
    }

    #[test]
    fn test_rect_contains_edges() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(9.9, 9.9)));
        assert!(!r.contains(Point::new(10.0, 5.0)));
    }

    #[test]
    fn test_rect_outset() {
        let r = Rect::new(10.0, 10.0, 10.0, 10.0).outset(5.0, 0.0, -2.0, 1.0);
        assert_eq!(r, Rect::new(5.0, 10.0, 13.0, 11.0));
    }
}
