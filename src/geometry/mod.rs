//! 2D geometry primitives shared by the layout engine.
//!
//! Everything here works in board units (whatever unit the design was drawn
//! in, typically mil) with a y-up coordinate system. Angles are radians;
//! instance properties store degrees and are converted with [`deg_to_rad`].

use std::f64::consts::PI;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Number of linear segments used to approximate an arc.
///
/// This is fixed regardless of sweep; callers needing finer output must
/// resample.
pub const ARC_STEPS: usize = 10;

/// Tolerance used for "effectively zero" comparisons on board coordinates.
pub const EPSILON: f64 = 1e-9;

/// A 2D point. Also used as a direction vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector at `angle` radians from +x.
    #[must_use]
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    /// Euclidean length when treated as a vector.
    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Dot product.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x.mul_add(other.x, self.y * other.y)
    }

    /// Returns the unit vector in the same direction.
    ///
    /// A zero-length (or non-finite) vector yields [`Point::ZERO`].
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len > EPSILON && len.is_finite() {
            Self::new(self.x / len, self.y / len)
        } else {
            Self::ZERO
        }
    }

    /// Rotates the vector counter-clockwise by `angle` radians.
    #[must_use]
    pub fn rotate(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(
            self.x.mul_add(cos, -self.y * sin),
            self.x.mul_add(sin, self.y * cos),
        )
    }

    /// The vector rotated by +90°.
    #[must_use]
    pub fn perp(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Rounds both coordinates to the nearest multiple of `spacing`.
    ///
    /// A non-positive or non-finite spacing leaves the point unchanged.
    #[must_use]
    pub fn snap_to_grid(self, spacing: f64) -> Self {
        if spacing > 0.0 && spacing.is_finite() {
            Self::new((self.x / spacing).round() * spacing, (self.y / spacing).round() * spacing)
        } else {
            self
        }
    }

    /// Returns true if both coordinates are within `tolerance` of `other`.
    #[must_use]
    pub fn approx_eq(self, other: Self, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// A straight line segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start point.
    pub start: Point,
    /// End point.
    pub end: Point,
}

impl Segment {
    /// Creates a new segment.
    #[must_use]
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Squared distance from `p` to the closest point on this segment.
    #[must_use]
    pub fn distance_squared_to(&self, p: Point) -> f64 {
        point_to_segment_distance_squared(p, self.start, self.end)
    }
}

/// Distance between two points.
#[must_use]
pub fn distance(p: Point, q: Point) -> f64 {
    p.distance(q)
}

/// Squared distance from `p` to segment `a`–`b`.
///
/// The projection parameter is clamped to `[0, 1]`; a degenerate segment
/// falls back to the point distance.
#[must_use]
pub fn point_to_segment_distance_squared(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    let closest = if len_sq <= EPSILON * EPSILON {
        a
    } else {
        let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
        a + ab * t
    };
    let d = p - closest;
    d.dot(d)
}

/// Samples a circular arc into `steps` linear segments.
///
/// Returns `steps + 1` points starting at `start_angle` and ending at
/// `start_angle + sweep`. A positive sweep runs counter-clockwise.
#[must_use]
pub fn sample_arc(center: Point, radius: f64, start_angle: f64, sweep: f64, steps: usize) -> Vec<Point> {
    let steps = steps.max(1);
    #[allow(clippy::cast_precision_loss)] // step counts are tiny
    let step_count = steps as f64;
    (0..=steps)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let angle = sweep.mul_add(i as f64 / step_count, start_angle);
            center + Point::from_angle(angle) * radius
        })
        .collect()
}

/// Converts degrees to radians.
#[must_use]
pub fn deg_to_rad(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

/// Returns `value` if it is finite, otherwise `fallback`.
#[must_use]
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}
