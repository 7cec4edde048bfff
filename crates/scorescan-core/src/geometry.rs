//! Geometric primitives for pixel-space measurements.
//!
//! This module provides the geometric value types shared by the staff-line
//! retrieval and the interpretation graph.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in image space
//! - [`Bounds`] - A rectangular bounding box defined by minimum and maximum coordinates
//! - [`Segment`] - A straight segment between two points (stem axis, beam median)
//! - [`HorizontalSide`] - Left or right side of an entity
//!
//! # Coordinate System
//!
//! Scorescan uses the usual raster coordinate system:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! - **Origin**: Top-left pixel at `(0, 0)`
//! - **X-axis**: Increases rightward (columns)
//! - **Y-axis**: Increases downward (rows)
//!
//! A pixel at column `x` and row `y` covers the half-open square
//! `[x, x+1) × [y, y+1)`, so the bounds of a single pixel have width and
//! height 1.

use serde::{Deserialize, Serialize};

/// A 2D point in image coordinate space.
///
/// # Examples
///
/// ```
/// # use scorescan_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let mid = p1.midpoint(p2);
/// assert_eq!(mid.x(), 7.5);
/// assert_eq!(mid.y(), 12.5);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f64 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f64 {
        self.y
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f64) -> Self {
        self.y = y;
        self
    }

    /// Adds another point to this point, returning a new point
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Slope `dy/dx` of the line going from this point to `other`.
    ///
    /// Returns `None` when both points share the same abscissa.
    pub fn slope_to(self, other: Point) -> Option<f64> {
        let dx = other.x - self.x;
        if dx == 0.0 {
            None
        } else {
            Some((other.y - self.y) / dx)
        }
    }
}

/// A rectangular bounding box with minimum and maximum coordinates.
///
/// `max_x` and `max_y` are exclusive, matching pixel coverage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Bounds {
    /// Creates bounds from explicit extrema, reordering them if needed.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: max_x.max(min_x),
            max_y: max_y.max(min_y),
        }
    }

    /// Creates bounds from a top-left corner and a width/height
    ///
    /// # Examples
    ///
    /// ```
    /// # use scorescan_core::geometry::Bounds;
    /// let b = Bounds::from_rect(10.0, 20.0, 30.0, 4.0);
    /// assert_eq!(b.max_x(), 40.0);
    /// assert_eq!(b.max_y(), 24.0);
    /// ```
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Bounds covering exactly one pixel
    pub fn from_pixel(x: i32, y: i32) -> Self {
        Self::from_rect(x as f64, y as f64, 1.0, 1.0)
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f64 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f64 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f64 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f64 {
        self.max_y
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f64 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f64 {
        self.max_y - self.min_y
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Merges two bounds into the smallest bounds containing both.
    ///
    /// # Examples
    ///
    /// ```
    /// # use scorescan_core::geometry::Bounds;
    /// let a = Bounds::from_rect(0.0, 0.0, 10.0, 2.0);
    /// let b = Bounds::from_rect(5.0, 4.0, 10.0, 2.0);
    /// let merged = a.merge(&b);
    /// assert_eq!(merged.width(), 15.0);
    /// assert_eq!(merged.height(), 6.0);
    /// ```
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Grows the bounds by `dx` on left and right sides and `dy` on top and bottom.
    pub fn grow(&self, dx: f64, dy: f64) -> Self {
        Self {
            min_x: self.min_x - dx,
            min_y: self.min_y - dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }

    /// Checks whether both bounds share a region of positive area.
    pub fn intersects(&self, other: &Self) -> bool {
        self.x_overlap(other) > 0.0 && self.y_overlap(other) > 0.0
    }

    /// Length of the abscissa overlap between both bounds (negative for a gap).
    pub fn x_overlap(&self, other: &Self) -> f64 {
        self.max_x.min(other.max_x) - self.min_x.max(other.min_x)
    }

    /// Length of the ordinate overlap between both bounds (negative for a gap).
    pub fn y_overlap(&self, other: &Self) -> f64 {
        self.max_y.min(other.max_y) - self.min_y.max(other.min_y)
    }

    /// Area of the intersection, zero when the bounds do not intersect.
    pub fn intersection_area(&self, other: &Self) -> f64 {
        if self.intersects(other) {
            self.x_overlap(other) * self.y_overlap(other)
        } else {
            0.0
        }
    }

    /// Checks whether the abscissa lies within `[min_x, max_x]`.
    pub fn contains_x(&self, x: f64) -> bool {
        x >= self.min_x && x <= self.max_x
    }

    /// Checks whether the point lies inside the bounds (max sides excluded).
    pub fn contains(&self, point: Point) -> bool {
        point.x() >= self.min_x
            && point.x() < self.max_x
            && point.y() >= self.min_y
            && point.y() < self.max_y
    }
}

/// A straight segment between two points.
///
/// Segments describe the axis of a stem (top to bottom) or the median line of
/// a beam (left to right).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    p1: Point,
    p2: Point,
}

impl Segment {
    /// Creates a segment from its two end points
    pub fn new(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }

    /// First end point
    pub fn p1(self) -> Point {
        self.p1
    }

    /// Second end point
    pub fn p2(self) -> Point {
        self.p2
    }

    /// The end point with the smallest ordinate
    pub fn top(self) -> Point {
        if self.p1.y() <= self.p2.y() {
            self.p1
        } else {
            self.p2
        }
    }

    /// The end point with the largest ordinate
    pub fn bottom(self) -> Point {
        if self.p1.y() <= self.p2.y() {
            self.p2
        } else {
            self.p1
        }
    }

    /// Ordinate of the supporting line at abscissa `x`.
    ///
    /// For a vertical segment the mean ordinate is returned.
    pub fn y_at(self, x: f64) -> f64 {
        match self.p1.slope_to(self.p2) {
            Some(slope) => self.p1.y() + (x - self.p1.x()) * slope,
            None => (self.p1.y() + self.p2.y()) / 2.0,
        }
    }

    /// Abscissa of the supporting line at ordinate `y`.
    ///
    /// For a horizontal segment the mean abscissa is returned.
    pub fn x_at(self, y: f64) -> f64 {
        let dy = self.p2.y() - self.p1.y();
        if dy == 0.0 {
            (self.p1.x() + self.p2.x()) / 2.0
        } else {
            self.p1.x() + (y - self.p1.y()) * (self.p2.x() - self.p1.x()) / dy
        }
    }

    /// Length of the segment
    pub fn length(self) -> f64 {
        self.p1.distance(self.p2)
    }
}

/// Horizontal side of an entity relative to another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalSide {
    Left,
    Right,
}

impl HorizontalSide {
    /// The other side
    pub fn opposite(self) -> Self {
        match self {
            HorizontalSide::Left => HorizontalSide::Right,
            HorizontalSide::Right => HorizontalSide::Left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_side_opposite() {
        assert_eq!(HorizontalSide::Left.opposite(), HorizontalSide::Right);
        assert_eq!(HorizontalSide::Right.opposite().opposite(), HorizontalSide::Right);
    }

    #[test]
    fn test_point_slope_to() {
        let p1 = Point::new(0.0, 0.0);
        assert_eq!(p1.slope_to(Point::new(10.0, 1.0)), Some(0.1));
        assert_eq!(p1.slope_to(Point::new(0.0, 5.0)), None);
    }

    #[test]
    fn test_point_distance() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(3.0, 4.0);
        assert_eq!(p1.distance(p2), 5.0);
    }

    #[test]
    fn test_bounds_new_reorders() {
        let bounds = Bounds::new(10.0, 8.0, 2.0, 4.0);
        assert_eq!(bounds.min_x(), 2.0);
        assert_eq!(bounds.min_y(), 4.0);
        assert_eq!(bounds.max_x(), 10.0);
        assert_eq!(bounds.max_y(), 8.0);
    }

    #[test]
    fn test_bounds_from_pixel() {
        let bounds = Bounds::from_pixel(3, 7);
        assert_eq!(bounds.width(), 1.0);
        assert_eq!(bounds.height(), 1.0);
        assert_eq!(bounds.center(), Point::new(3.5, 7.5));
    }

    #[test]
    fn test_bounds_intersects_needs_positive_area() {
        let a = Bounds::from_rect(0.0, 0.0, 10.0, 10.0);
        let touching = Bounds::from_rect(10.0, 0.0, 5.0, 5.0);
        let overlapping = Bounds::from_rect(9.0, 9.0, 5.0, 5.0);

        assert!(!a.intersects(&touching));
        assert!(a.intersects(&overlapping));
        assert_eq!(a.intersection_area(&overlapping), 1.0);
        assert_eq!(a.intersection_area(&touching), 0.0);
    }

    #[test]
    fn test_bounds_x_overlap() {
        let a = Bounds::from_rect(0.0, 0.0, 10.0, 1.0);
        let b = Bounds::from_rect(6.0, 50.0, 10.0, 1.0);
        let c = Bounds::from_rect(14.0, 0.0, 2.0, 1.0);

        assert_eq!(a.x_overlap(&b), 4.0);
        assert_eq!(a.x_overlap(&c), -4.0);
    }

    #[test]
    fn test_bounds_grow() {
        let bounds = Bounds::from_rect(10.0, 10.0, 4.0, 2.0).grow(0.0, 3.0);
        assert_eq!(bounds.min_x(), 10.0);
        assert_eq!(bounds.min_y(), 7.0);
        assert_eq!(bounds.max_y(), 15.0);
    }

    #[test]
    fn test_bounds_contains() {
        let bounds = Bounds::from_rect(0.0, 0.0, 4.0, 4.0);
        assert!(bounds.contains(Point::new(0.0, 0.0)));
        assert!(bounds.contains(Point::new(3.5, 3.5)));
        assert!(!bounds.contains(Point::new(4.0, 1.0)));
        assert!(bounds.contains_x(4.0));
    }

    #[test]
    fn test_segment_top_bottom() {
        let seg = Segment::new(Point::new(5.0, 40.0), Point::new(5.0, 10.0));
        assert_eq!(seg.top().y(), 10.0);
        assert_eq!(seg.bottom().y(), 40.0);
        assert_eq!(seg.length(), 30.0);
    }

    #[test]
    fn test_segment_y_at() {
        let seg = Segment::new(Point::new(0.0, 10.0), Point::new(100.0, 20.0));
        assert_eq!(seg.y_at(50.0), 15.0);
        assert_eq!(seg.x_at(15.0), 50.0);

        let vertical = Segment::new(Point::new(3.0, 0.0), Point::new(3.0, 10.0));
        assert_eq!(vertical.y_at(100.0), 5.0);
    }
}

#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn bounds_strategy() -> impl Strategy<Value = Bounds> {
        (
            -1000.0f64..1000.0,
            -1000.0f64..1000.0,
            1.0f64..500.0,
            1.0f64..500.0,
        )
            .prop_map(|(x, y, w, h)| Bounds::from_rect(x, y, w, h))
    }

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-1000.0f64..1000.0, -1000.0f64..1000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    /// Intersection must be symmetric.
    fn check_intersects_is_symmetric(b1: Bounds, b2: Bounds) -> Result<(), TestCaseError> {
        prop_assert_eq!(b1.intersects(&b2), b2.intersects(&b1));
        prop_assert!(approx_eq!(
            f64,
            b1.intersection_area(&b2),
            b2.intersection_area(&b1),
            epsilon = 1e-9
        ));
        Ok(())
    }

    /// Merged bounds should contain both original bounds.
    fn check_merge_contains_both(b1: Bounds, b2: Bounds) -> Result<(), TestCaseError> {
        let merged = b1.merge(&b2);
        for b in [b1, b2] {
            prop_assert!(merged.min_x() <= b.min_x());
            prop_assert!(merged.min_y() <= b.min_y());
            prop_assert!(merged.max_x() >= b.max_x());
            prop_assert!(merged.max_y() >= b.max_y());
        }
        Ok(())
    }

    /// Any point of a segment's supporting line maps back through `x_at`.
    fn check_segment_y_at_x_at(p1: Point, p2: Point, t: f64) -> Result<(), TestCaseError> {
        prop_assume!((p2.x() - p1.x()).abs() > 1.0 && (p2.y() - p1.y()).abs() > 1.0);
        let seg = Segment::new(p1, p2);
        let x = p1.x() + t * (p2.x() - p1.x());
        let y = seg.y_at(x);
        prop_assert!(approx_eq!(f64, seg.x_at(y), x, epsilon = 1e-6));
        Ok(())
    }

    proptest! {
        #[test]
        fn intersects_is_symmetric(b1 in bounds_strategy(), b2 in bounds_strategy()) {
            check_intersects_is_symmetric(b1, b2)?;
        }

        #[test]
        fn merge_contains_both(b1 in bounds_strategy(), b2 in bounds_strategy()) {
            check_merge_contains_both(b1, b2)?;
        }

        #[test]
        fn segment_y_at_x_at(p1 in point_strategy(), p2 in point_strategy(), t in 0.0f64..1.0) {
            check_segment_y_at_x_at(p1, p2, t)?;
        }
    }
}
