//! Staves and their lines.
//!
//! # Overview
//!
//! - [`FilamentLine`] - One staff line: the filament it comes from and a
//!   snapshot of its fitted geometry
//! - [`StaffInfo`] - A staff: ordered lines, scale, abscissa limits and the
//!   ledgers registered around it
//! - [`StaffManager`] - The ordered collection of staves of a sheet
//!
//! # Pitch positions
//!
//! Pitch positions count half-interlines from the middle line, increasing
//! downward. On a five-line staff the lines sit on positions -4, -2, 0, 2
//! and 4. Ledgers are indexed from the staff outward: index 1 is the first
//! ledger below the staff (position 6), index -1 the first one above it
//! (position -6).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use scorescan_core::{
    geometry::{Bounds, HorizontalSide, Point},
    identifier::{FilamentId, InterId},
    scale::Scale,
};

use crate::filament::{Filament, LineGeometry};

/// A staff line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilamentLine {
    filament: Option<FilamentId>,
    geometry: LineGeometry,
}

impl FilamentLine {
    /// Creates a line from a filament, copying its current geometry
    pub fn from_filament(filament: &Filament) -> Self {
        Self {
            filament: Some(filament.id()),
            geometry: filament.geometry().clone(),
        }
    }

    /// Creates a line from a bare geometry, with no underlying filament
    pub fn from_geometry(geometry: LineGeometry) -> Self {
        Self {
            filament: None,
            geometry,
        }
    }

    /// Filament this line was built from, if any
    pub fn filament(&self) -> Option<FilamentId> {
        self.filament
    }

    pub fn geometry(&self) -> &LineGeometry {
        &self.geometry
    }

    /// Replaces the geometry snapshot
    pub fn refresh(&mut self, filament: &Filament) {
        self.geometry = filament.geometry().clone();
    }

    /// Ending point on the given side
    pub fn end_point(&self, side: HorizontalSide) -> Point {
        let point = match side {
            HorizontalSide::Left => self.geometry.start_point(),
            HorizontalSide::Right => self.geometry.stop_point(),
        };
        point.unwrap_or_default()
    }

    pub fn position_at(&self, x: f64) -> f64 {
        self.geometry.position_at(x)
    }

    pub fn slope_at(&self, x: f64) -> f64 {
        self.geometry.slope_at(x)
    }
}

/// A staff of the sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffInfo {
    id: usize,
    lines: Vec<FilamentLine>,
    scale: Scale,
    left: f64,
    right: f64,
    #[serde(default)]
    short: bool,
    #[serde(default)]
    ledgers: BTreeMap<i32, Vec<InterId>>,
}

impl StaffInfo {
    /// Creates a staff from its lines, ordered top down
    pub fn new(id: usize, left: f64, right: f64, scale: Scale, lines: Vec<FilamentLine>) -> Self {
        Self {
            id,
            lines,
            scale,
            left,
            right,
            short: false,
            ledgers: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn lines(&self) -> &[FilamentLine] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut [FilamentLine] {
        &mut self.lines
    }

    pub fn first_line(&self) -> Option<&FilamentLine> {
        self.lines.first()
    }

    pub fn last_line(&self) -> Option<&FilamentLine> {
        self.lines.last()
    }

    /// Scale of this staff, whose interline may differ from the sheet one
    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    pub fn interline(&self) -> i32 {
        self.scale.interline()
    }

    /// Abscissa limit on the given side
    pub fn abscissa(&self, side: HorizontalSide) -> f64 {
        match side {
            HorizontalSide::Left => self.left,
            HorizontalSide::Right => self.right,
        }
    }

    /// Width between abscissa limits
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Whether the staff shares its vertical range with another staff
    pub fn is_short(&self) -> bool {
        self.short
    }

    pub fn set_short(&mut self, short: bool) {
        self.short = short;
    }

    /// Mean slope of the lines at their ending on the given side
    pub fn ending_slope(&self, side: HorizontalSide) -> f64 {
        if self.lines.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .lines
            .iter()
            .map(|line| line.slope_at(line.end_point(side).x()))
            .sum();
        sum / self.lines.len() as f64
    }

    /// Box between abscissa limits, from the top to the bottom line
    pub fn area(&self) -> Bounds {
        let (Some(first), Some(last)) = (self.first_line(), self.last_line()) else {
            return Bounds::new(self.left, 0.0, self.right, 0.0);
        };
        let top = first
            .position_at(self.left)
            .min(first.position_at(self.right));
        let bottom = last
            .position_at(self.left)
            .max(last.position_at(self.right));
        Bounds::new(self.left, top, self.right, bottom)
    }

    /// Ordinate of the middle of the staff at abscissa `x`
    fn mid_position_at(&self, x: f64) -> f64 {
        match (self.first_line(), self.last_line()) {
            (Some(first), Some(last)) => (first.position_at(x) + last.position_at(x)) / 2.0,
            _ => 0.0,
        }
    }

    /// Pitch position of a point, in half-interlines below the middle line.
    ///
    /// # Examples
    ///
    /// ```
    /// # use scorescan_core::{geometry::Point, scale::Scale};
    /// # use scorescan_grid::{filament::LineGeometry, staff::{FilamentLine, StaffInfo}};
    /// let lines = (0..5)
    ///     .map(|i| {
    ///         let y = 100.0 + 20.0 * i as f64;
    ///         FilamentLine::from_geometry(LineGeometry::from_points(vec![
    ///             Point::new(0.0, y),
    ///             Point::new(500.0, y),
    ///         ]))
    ///     })
    ///     .collect();
    /// let staff = StaffInfo::new(1, 0.0, 500.0, Scale::new(20, 3, 3).unwrap(), lines);
    ///
    /// assert_eq!(staff.pitch_position(Point::new(50.0, 140.0)), 0.0);
    /// assert_eq!(staff.pitch_position(Point::new(50.0, 80.0)), -6.0);
    /// ```
    pub fn pitch_position(&self, point: Point) -> f64 {
        let interline = self.scale.interline() as f64;
        2.0 * (point.y() - self.mid_position_at(point.x())) / interline
    }

    /// Pitch position of the ledger at `index` (outward from the staff)
    pub fn ledger_pitch_position(index: i32) -> i32 {
        if index > 0 {
            4 + 2 * index
        } else if index < 0 {
            -4 + 2 * index
        } else {
            0
        }
    }

    /// Registers a ledger at the given index
    pub fn add_ledger(&mut self, index: i32, ledger: InterId) {
        let ledgers = self.ledgers.entry(index).or_default();
        if !ledgers.contains(&ledger) {
            ledgers.push(ledger);
        }
    }

    /// Unregisters a ledger, wherever it is. Returns whether it was found.
    pub fn remove_ledger(&mut self, ledger: InterId) -> bool {
        let mut found = false;
        for ledgers in self.ledgers.values_mut() {
            let before = ledgers.len();
            ledgers.retain(|id| *id != ledger);
            found |= ledgers.len() != before;
        }
        self.ledgers.retain(|_, ledgers| !ledgers.is_empty());
        found
    }

    /// Ledgers registered at the given index
    pub fn ledgers(&self, index: i32) -> &[InterId] {
        self.ledgers.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All ledgers, by index
    pub fn ledger_map(&self) -> &BTreeMap<i32, Vec<InterId>> {
        &self.ledgers
    }

    /// Unregisters every ledger
    pub fn clear_ledgers(&mut self) {
        self.ledgers.clear();
    }
}

/// Ordered collection of the staves of a sheet.
#[derive(Debug, Clone, Default)]
pub struct StaffManager {
    staves: Vec<StaffInfo>,
}

impl StaffManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.staves.clear();
    }

    pub fn add_staff(&mut self, staff: StaffInfo) {
        self.staves.push(staff);
    }

    pub fn staves(&self) -> &[StaffInfo] {
        &self.staves
    }

    pub fn staves_mut(&mut self) -> &mut [StaffInfo] {
        &mut self.staves
    }

    pub fn staff_count(&self) -> usize {
        self.staves.len()
    }

    /// Staff with the given id
    pub fn staff(&self, id: usize) -> Option<&StaffInfo> {
        self.staves.iter().find(|s| s.id() == id)
    }

    /// Staff whose middle is vertically closest to the point
    pub fn closest_staff(&self, point: Point) -> Option<&StaffInfo> {
        self.staves.iter().min_by(|a, b| {
            let da = (a.mid_position_at(point.x()) - point.y()).abs();
            let db = (b.mid_position_at(point.x()) - point.y()).abs();
            da.total_cmp(&db)
        })
    }

    /// Flags staves lying side by side with another staff.
    ///
    /// Returns the number of flagged staves.
    pub fn detect_short_staves(&mut self) -> usize {
        let areas: Vec<Bounds> = self.staves.iter().map(StaffInfo::area).collect();
        let mut count = 0;
        for (i, staff) in self.staves.iter_mut().enumerate() {
            let short = areas.iter().enumerate().any(|(j, other)| {
                j != i && areas[i].y_overlap(other) > 0.0 && areas[i].x_overlap(other) <= 0.0
            });
            staff.set_short(short);
            count += usize::from(short);
        }
        count
    }

    pub fn into_staves(self) -> Vec<StaffInfo> {
        self.staves
    }
}
