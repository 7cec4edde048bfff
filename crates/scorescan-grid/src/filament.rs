//! Filaments: chains of horizontal sections approximating a thin curve.
//!
//! # Overview
//!
//! - [`LineGeometry`] - A polyline sorted by abscissa, with interpolation,
//!   ending points, hole filling and curvature polishing
//! - [`Filament`] - A set of sections of a horizontal [`Lag`] together with
//!   the geometry fitted through them
//!
//! Filament geometry is sampled every *probe width* along the abscissa: at
//! each probe column the ordinate is the thickness-weighted mean of the
//! middles of the member sections covering that column.

use serde::{Deserialize, Serialize};

use scorescan_core::{
    geometry::{Bounds, Point},
    identifier::{FilamentId, SectionId},
    lag::Lag,
};

/// A polyline sorted by increasing abscissa.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineGeometry {
    points: Vec<Point>,
}

impl LineGeometry {
    /// Creates a geometry from unordered points
    pub fn from_points(mut points: Vec<Point>) -> Self {
        points.sort_by(|a, b| a.x().total_cmp(&b.x()));
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Leftmost point
    pub fn start_point(&self) -> Option<Point> {
        self.points.first().copied()
    }

    /// Rightmost point
    pub fn stop_point(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Checks whether `x` lies between the ending points
    pub fn covers(&self, x: f64) -> bool {
        match (self.start_point(), self.stop_point()) {
            (Some(start), Some(stop)) => x >= start.x() && x <= stop.x(),
            _ => false,
        }
    }

    /// Segment used to interpolate at `x`, extended at both ends
    fn segment_at(&self, x: f64) -> Option<(Point, Point)> {
        match self.points.len() {
            0 => None,
            1 => Some((self.points[0], self.points[0])),
            len => {
                let i = self.points.partition_point(|p| p.x() <= x).clamp(1, len - 1);
                Some((self.points[i - 1], self.points[i]))
            }
        }
    }

    /// Ordinate at abscissa `x`, linearly extrapolated beyond the ends.
    ///
    /// An empty geometry reports 0.
    ///
    /// # Examples
    ///
    /// ```
    /// # use scorescan_core::geometry::Point;
    /// # use scorescan_grid::filament::LineGeometry;
    /// let line = LineGeometry::from_points(vec![
    ///     Point::new(0.0, 10.0),
    ///     Point::new(100.0, 20.0),
    /// ]);
    /// assert_eq!(line.position_at(50.0), 15.0);
    /// assert_eq!(line.position_at(200.0), 30.0);
    /// ```
    pub fn position_at(&self, x: f64) -> f64 {
        match self.segment_at(x) {
            None => 0.0,
            Some((p1, p2)) => match p1.slope_to(p2) {
                Some(slope) => p1.y() + (x - p1.x()) * slope,
                None => p1.y(),
            },
        }
    }

    /// Local slope at abscissa `x`
    pub fn slope_at(&self, x: f64) -> f64 {
        self.segment_at(x)
            .and_then(|(p1, p2)| p1.slope_to(p2))
            .unwrap_or(0.0)
    }

    /// Imposes the ending points, dropping the points beyond them
    pub fn set_ending_points(&mut self, start: Point, stop: Point) {
        self.points.retain(|p| p.x() > start.x() && p.x() < stop.x());
        self.points.insert(0, start);
        self.points.push(stop);
    }

    /// Inserts intermediate points wherever two consecutive points are more
    /// than `max_hole` apart.
    ///
    /// New points are spaced by `step` and follow the sibling line which
    /// best covers the hole, keeping the offset measured at both hole sides.
    /// Holes no sibling covers are left to plain interpolation.
    ///
    /// Returns the number of inserted points.
    pub fn fill_holes(&mut self, max_hole: f64, step: f64, siblings: &[&LineGeometry]) -> usize {
        if step <= 0.0 {
            return 0;
        }

        let mut filled = Vec::with_capacity(self.points.len());
        let mut inserted = 0;

        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            filled.push(a);
            if b.x() - a.x() <= max_hole {
                continue;
            }

            let sibling = siblings
                .iter()
                .filter(|s| s.covers(a.x()) && s.covers(b.x()))
                .max_by_key(|s| {
                    s.points
                        .iter()
                        .filter(|p| p.x() > a.x() && p.x() < b.x())
                        .count()
                });
            let Some(sibling) = sibling else {
                continue;
            };

            let offset_a = a.y() - sibling.position_at(a.x());
            let offset_b = b.y() - sibling.position_at(b.x());
            let mut x = a.x() + step;
            while x < b.x() - step / 2.0 {
                let t = (x - a.x()) / (b.x() - a.x());
                let offset = offset_a + t * (offset_b - offset_a);
                filled.push(Point::new(x, sibling.position_at(x) + offset));
                inserted += 1;
                x += step;
            }
        }
        if let Some(last) = self.points.last() {
            filled.push(*last);
        }

        self.points = filled;
        inserted
    }

    /// Flattens interior points deviating from their neighbors by more
    /// than `max_dy`.
    ///
    /// Returns the number of moved points.
    pub fn polish_curvature(&mut self, max_dy: f64) -> usize {
        let mut moved = 0;
        for i in 1..self.points.len().saturating_sub(1) {
            let (prev, cur, next) = (self.points[i - 1], self.points[i], self.points[i + 1]);
            let expected = match prev.slope_to(next) {
                Some(slope) => prev.y() + (cur.x() - prev.x()) * slope,
                None => continue,
            };
            if (cur.y() - expected).abs() > max_dy {
                self.points[i] = cur.with_y(expected);
                moved += 1;
            }
        }
        moved
    }
}

/// A chain of sections forming a thin curve, typically a staff line.
#[derive(Debug, Clone)]
pub struct Filament {
    id: FilamentId,
    sections: Vec<SectionId>,
    geometry: LineGeometry,
    bounds: Bounds,
    weight: i32,
    centroid: Point,
    probe_width: f64,
    part_of: Option<FilamentId>,
    vip: bool,
}

impl Filament {
    /// Creates an empty filament sampling its geometry every `probe_width`
    pub fn new(id: FilamentId, probe_width: f64) -> Self {
        Self {
            id,
            sections: Vec::new(),
            geometry: LineGeometry::default(),
            bounds: Bounds::default(),
            weight: 0,
            centroid: Point::default(),
            probe_width: probe_width.max(1.0),
            part_of: None,
            vip: false,
        }
    }

    pub fn id(&self) -> FilamentId {
        self.id
    }

    /// Member sections
    pub fn sections(&self) -> &[SectionId] {
        &self.sections
    }

    pub fn geometry(&self) -> &LineGeometry {
        &self.geometry
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Number of pixels of the member sections
    pub fn weight(&self) -> i32 {
        self.weight
    }

    pub fn centroid(&self) -> Point {
        self.centroid
    }

    /// Filament which absorbed this one, if any
    pub fn part_of(&self) -> Option<FilamentId> {
        self.part_of
    }

    pub fn is_vip(&self) -> bool {
        self.vip
    }

    /// Leftmost point of the fitted line
    pub fn start_point(&self) -> Point {
        self.geometry.start_point().unwrap_or(self.centroid)
    }

    /// Rightmost point of the fitted line
    pub fn stop_point(&self) -> Point {
        self.geometry.stop_point().unwrap_or(self.centroid)
    }

    /// Abscissa distance between ending points
    pub fn length(&self) -> f64 {
        self.stop_point().x() - self.start_point().x()
    }

    pub fn position_at(&self, x: f64) -> f64 {
        self.geometry.position_at(x)
    }

    pub fn slope_at(&self, x: f64) -> f64 {
        self.geometry.slope_at(x)
    }

    /// Number of foreground pixels of the member sections in column `x`
    pub fn thickness_at(&self, x: f64, lag: &Lag) -> i32 {
        let column = x.floor() as i32;
        self.sections
            .iter()
            .filter_map(|id| lag.section(*id))
            .map(|s| s.thickness_at(column))
            .sum()
    }

    /// Vertical extent in column `x` of this filament merged with `others`.
    ///
    /// Where the filament itself has no pixel in the column, its fitted
    /// position stands for it.
    pub fn combined_thickness_at(&self, x: f64, others: &[SectionId], lag: &Lag) -> f64 {
        let column = x.floor() as i32;
        let extent_of = |ids: &[SectionId]| {
            ids.iter()
                .filter_map(|id| lag.section(*id))
                .filter_map(|s| s.extent_at(column))
                .reduce(|(a0, a1), (b0, b1)| (a0.min(b0), a1.max(b1)))
        };

        let own = extent_of(&self.sections).unwrap_or_else(|| {
            let y = self.position_at(x);
            (y - 0.5, y + 0.5)
        });
        let (min, max) = match extent_of(others) {
            Some((o0, o1)) => (own.0.min(o0), own.1.max(o1)),
            None => own,
        };
        max - min
    }

    /// Adds a section and refits the geometry
    pub fn add_section(&mut self, id: SectionId, lag: &mut Lag) {
        self.include(id, lag);
        self.refit(lag);
    }

    /// Moves every section of `other` into this filament.
    ///
    /// `other` is left empty and marked as part of this filament.
    pub fn steal_sections(&mut self, other: &mut Filament, lag: &mut Lag) {
        for id in std::mem::take(&mut other.sections) {
            self.include(id, lag);
        }
        other.part_of = Some(self.id);
        other.vip = false;
        self.refit(lag);
    }

    fn include(&mut self, id: SectionId, lag: &mut Lag) {
        if let Some(section) = lag.section_mut(id) {
            section.set_owner(Some(self.id));
            self.vip |= section.is_vip();
            self.sections.push(id);
        }
    }

    /// Imposes the ending points of the fitted line
    pub fn set_ending_points(&mut self, start: Point, stop: Point) {
        self.geometry.set_ending_points(start, stop);
    }

    /// Fills holes wider than one and a half probes using sibling lines
    pub fn fill_holes(&mut self, siblings: &[&LineGeometry]) -> usize {
        self.geometry
            .fill_holes(1.5 * self.probe_width, self.probe_width, siblings)
    }

    /// Flattens local bumps larger than `max_dy`
    pub fn polish_curvature(&mut self, max_dy: f64) -> usize {
        self.geometry.polish_curvature(max_dy)
    }

    /// Recomputes bounds, weight, centroid and fitted line from the sections
    pub(crate) fn refit(&mut self, lag: &Lag) {
        let sections: Vec<_> = self
            .sections
            .iter()
            .filter_map(|id| lag.section(*id))
            .collect();
        let Some(first) = sections.first() else {
            return;
        };

        self.bounds = sections
            .iter()
            .fold(first.bounds(), |acc, s| acc.merge(&s.bounds()));
        self.weight = sections.iter().map(|s| s.weight()).sum();
        let weight = self.weight.max(1) as f64;
        let (sx, sy) = sections.iter().fold((0.0, 0.0), |(sx, sy), s| {
            let w = s.weight() as f64;
            (sx + w * s.centroid().x(), sy + w * s.centroid().y())
        });
        self.centroid = Point::new(sx / weight, sy / weight);

        let min_col = sections.iter().map(|s| s.start_coord()).min().unwrap_or(0);
        let max_col = sections.iter().map(|s| s.stop_coord()).max().unwrap_or(0);
        let step = (self.probe_width.round() as i32).max(1);

        let mut columns: Vec<i32> = (min_col..=max_col).step_by(step as usize).collect();
        if columns.last() != Some(&max_col) {
            columns.push(max_col);
        }

        let points = columns
            .into_iter()
            .filter_map(|col| {
                let (sum, count) = sections
                    .iter()
                    .filter_map(|s| {
                        let mid = s.mid_pos_at(col)?;
                        Some((mid, s.thickness_at(col) as f64))
                    })
                    .fold((0.0, 0.0), |(sum, count), (mid, t)| (sum + mid * t, count + t));
                (count > 0.0).then(|| Point::new(col as f64 + 0.5, sum / count))
            })
            .collect();
        self.geometry = LineGeometry::from_points(points);
    }
}
