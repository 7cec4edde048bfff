//! Sections and the lag (line adjacency graph) that stores them.
//!
//! # Overview
//!
//! A [`Section`] is a chain of runs found on consecutive positions (rows for a
//! horizontal lag, columns for a vertical one), each run overlapping the
//! previous one. The [`SectionsBuilder`] grows sections while the junction
//! between the last run and the next one is a simple one-to-one junction
//! accepted by the [`JunctionPolicy`]; any fork, merge or inconsistent run
//! starts a new section.
//!
//! Sections are immutable once built, except for their membership tag
//! ([`Section::owner`]) and their `vip` debug flag.

use log::debug;
use serde::Serialize;

use crate::{
    geometry::{Bounds, Point},
    identifier::{FilamentId, SectionId},
    run::{Orientation, Run, RunsTable},
};

/// A chain of runs merged across consecutive positions.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    id: SectionId,
    orientation: Orientation,
    first_pos: i32,
    runs: Vec<Run>,
    weight: i32,
    bounds: Bounds,
    centroid: Point,
    #[serde(skip)]
    coord_sum: f64,
    #[serde(skip)]
    pos_sum: f64,
    vip: bool,
    owner: Option<FilamentId>,
}

impl Section {
    /// Creates a section from its runs, the first one lying at `first_pos`.
    ///
    /// `runs` must not be empty.
    pub fn new(id: SectionId, orientation: Orientation, first_pos: i32, runs: Vec<Run>) -> Self {
        let mut section = Self {
            id,
            orientation,
            first_pos,
            runs: Vec::with_capacity(runs.len()),
            weight: 0,
            bounds: Bounds::default(),
            centroid: Point::default(),
            coord_sum: 0.0,
            pos_sum: 0.0,
            vip: false,
            owner: None,
        };
        for run in runs {
            section.append(run);
        }
        section
    }

    /// Appends a run on the position following the last one
    fn append(&mut self, run: Run) {
        let pos = self.first_pos + self.runs.len() as i32;
        let length = run.length() as f64;

        self.coord_sum += length * (run.start() as f64 + length / 2.0);
        self.pos_sum += length * (pos as f64 + 0.5);
        self.weight += run.length();

        let run_bounds = self.oriented_bounds(pos, &run);
        self.bounds = if self.runs.is_empty() {
            run_bounds
        } else {
            self.bounds.merge(&run_bounds)
        };
        self.runs.push(run);

        let weight = self.weight as f64;
        self.centroid = self.to_point(self.coord_sum / weight, self.pos_sum / weight);
    }

    fn oriented_bounds(&self, pos: i32, run: &Run) -> Bounds {
        match self.orientation {
            Orientation::Horizontal => {
                Bounds::from_rect(run.start() as f64, pos as f64, run.length() as f64, 1.0)
            }
            Orientation::Vertical => {
                Bounds::from_rect(pos as f64, run.start() as f64, 1.0, run.length() as f64)
            }
        }
    }

    fn to_point(&self, coord: f64, pos: f64) -> Point {
        match self.orientation {
            Orientation::Horizontal => Point::new(coord, pos),
            Orientation::Vertical => Point::new(pos, coord),
        }
    }

    pub fn id(&self) -> SectionId {
        self.id
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Position of the first run
    pub fn first_pos(&self) -> i32 {
        self.first_pos
    }

    /// Position of the last run
    pub fn last_pos(&self) -> i32 {
        self.first_pos + self.runs.len() as i32 - 1
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Number of foreground pixels
    pub fn weight(&self) -> i32 {
        self.weight
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Center of mass of the section pixels
    pub fn centroid(&self) -> Point {
        self.centroid
    }

    pub fn is_vip(&self) -> bool {
        self.vip
    }

    pub fn set_vip(&mut self, vip: bool) {
        self.vip = vip;
    }

    /// Filament this section has been assigned to, if any
    pub fn owner(&self) -> Option<FilamentId> {
        self.owner
    }

    pub fn set_owner(&mut self, owner: Option<FilamentId>) {
        self.owner = owner;
    }

    /// Smallest coordinate covered along the run direction
    pub fn start_coord(&self) -> i32 {
        self.runs.iter().map(Run::start).min().unwrap_or_default()
    }

    /// Largest coordinate covered along the run direction
    pub fn stop_coord(&self) -> i32 {
        self.runs.iter().map(Run::stop).max().unwrap_or_default()
    }

    /// Extension along the run direction
    pub fn length(&self) -> i32 {
        if self.runs.is_empty() {
            0
        } else {
            self.stop_coord() - self.start_coord() + 1
        }
    }

    /// Mean thickness across the run direction
    pub fn mean_thickness(&self) -> f64 {
        match self.length() {
            0 => 0.0,
            length => self.weight as f64 / length as f64,
        }
    }

    /// Number of pixels covered across the run direction at `coord`
    pub fn thickness_at(&self, coord: i32) -> i32 {
        self.runs.iter().filter(|run| run.contains(coord)).count() as i32
    }

    /// Extent `[min, max)` across the run direction at `coord`.
    ///
    /// For a horizontal section this is the vertical extent at abscissa
    /// `coord`. Returns `None` when no run covers the coordinate.
    pub fn extent_at(&self, coord: i32) -> Option<(f64, f64)> {
        let mut covered = self
            .runs
            .iter()
            .enumerate()
            .filter(|(_, run)| run.contains(coord))
            .map(|(i, _)| self.first_pos + i as i32);
        let first = covered.next()?;
        let last = covered.last().unwrap_or(first);
        Some((first as f64, last as f64 + 1.0))
    }

    /// Middle of [`extent_at`](Self::extent_at), if any
    pub fn mid_pos_at(&self, coord: i32) -> Option<f64> {
        self.extent_at(coord).map(|(min, max)| (min + max) / 2.0)
    }
}

/// Policy deciding whether a run may extend the section ending just before it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JunctionPolicy {
    /// The run length must stay within the given ratio of the section mean
    /// run length, in both directions.
    Ratio(f64),
    /// Any one-to-one junction is accepted.
    All,
}

impl JunctionPolicy {
    /// Checks whether `run` is consistent with `section`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use scorescan_core::identifier::SectionId;
    /// # use scorescan_core::lag::{JunctionPolicy, Section};
    /// # use scorescan_core::run::{Orientation, Run};
    /// let section = Section::new(SectionId::new(0), Orientation::Horizontal, 0, vec![Run::new(0, 10)]);
    /// let policy = JunctionPolicy::Ratio(1.5);
    /// assert!(policy.consistent(&Run::new(0, 14), &section));
    /// assert!(!policy.consistent(&Run::new(0, 16), &section));
    /// assert!(JunctionPolicy::All.consistent(&Run::new(0, 40), &section));
    /// ```
    pub fn consistent(&self, run: &Run, section: &Section) -> bool {
        match self {
            JunctionPolicy::All => true,
            JunctionPolicy::Ratio(max_ratio) => {
                let count = section.runs().len();
                if count == 0 {
                    return true;
                }
                let mean = section.weight() as f64 / count as f64;
                let ratio = run.length() as f64 / mean;
                ratio <= *max_ratio && ratio >= 1.0 / max_ratio
            }
        }
    }
}

/// Container of sections sharing one orientation.
#[derive(Debug, Clone)]
pub struct Lag {
    orientation: Orientation,
    sections: Vec<Section>,
}

impl Lag {
    /// Creates an empty lag
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            sections: Vec::new(),
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(id.index())
    }

    pub fn section_mut(&mut self, id: SectionId) -> Option<&mut Section> {
        self.sections.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Id of the most recently created section
    pub fn last_id(&self) -> Option<SectionId> {
        self.sections.len().checked_sub(1).map(SectionId::new)
    }

    /// Adds a section made of `runs`, the first one at `first_pos`
    pub fn add_section(&mut self, first_pos: i32, runs: Vec<Run>) -> SectionId {
        let id = SectionId::new(self.sections.len());
        self.sections
            .push(Section::new(id, self.orientation, first_pos, runs));
        id
    }

    /// Marks the given sections as VIP, ignoring unknown ids
    pub fn set_vip_sections(&mut self, ids: &[SectionId]) {
        for id in ids {
            if let Some(section) = self.section_mut(*id) {
                section.set_vip(true);
            }
        }
    }
}

/// Builds sections from a runs table into a lag.
pub struct SectionsBuilder<'a> {
    lag: &'a mut Lag,
    policy: JunctionPolicy,
}

impl<'a> SectionsBuilder<'a> {
    pub fn new(lag: &'a mut Lag, policy: JunctionPolicy) -> Self {
        Self { lag, policy }
    }

    /// Creates the sections for every run of `table`.
    ///
    /// Returns the ids of the created sections, in creation order.
    pub fn create_sections(&mut self, table: &RunsTable) -> Vec<SectionId> {
        debug_assert_eq!(table.orientation(), self.lag.orientation());

        let mut created = Vec::new();
        let mut previous: Vec<(Run, SectionId)> = Vec::new();

        for pos in 0..table.size() {
            let current = table.sequence(pos);

            // Overlap counts of every previous run with current runs
            let prev_counts: Vec<usize> = previous
                .iter()
                .map(|(prev, _)| current.iter().filter(|run| run.overlaps(prev)).count())
                .collect();

            let mut next = Vec::with_capacity(current.len());
            for run in current {
                let mut overlapping = previous
                    .iter()
                    .enumerate()
                    .filter(|(_, (prev, _))| prev.overlaps(run));
                let single = match (overlapping.next(), overlapping.next()) {
                    (Some((j, (_, sid))), None) if prev_counts[j] == 1 => Some(*sid),
                    _ => None,
                };

                let extended = single.and_then(|sid| {
                    let section = self.lag.section_mut(sid)?;
                    if self.policy.consistent(run, section) {
                        section.append(*run);
                        Some(sid)
                    } else {
                        None
                    }
                });

                let sid = match extended {
                    Some(sid) => sid,
                    None => {
                        let sid = self.lag.add_section(pos as i32, vec![*run]);
                        created.push(sid);
                        sid
                    }
                };
                next.push((*run, sid));
            }
            previous = next;
        }

        debug!(
            orientation:% = self.lag.orientation(),
            policy:? = self.policy,
            created = created.len();
            "Sections built"
        );
        created
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::{image::BinaryImage, run::RunsTableFactory};

    fn horizontal_table(image: &BinaryImage) -> RunsTable {
        RunsTableFactory::new(Orientation::Horizontal).create_table(image)
    }

    #[test]
    fn test_section_metrics() {
        let section = Section::new(
            SectionId::new(0),
            Orientation::Horizontal,
            10,
            vec![Run::new(0, 10), Run::new(0, 10)],
        );

        assert_eq!(section.weight(), 20);
        assert_eq!(section.length(), 10);
        assert_eq!(section.last_pos(), 11);
        assert_approx_eq!(f64, section.mean_thickness(), 2.0);
        assert_approx_eq!(f64, section.centroid().x(), 5.0);
        assert_approx_eq!(f64, section.centroid().y(), 11.0);
        assert_eq!(section.bounds(), Bounds::from_rect(0.0, 10.0, 10.0, 2.0));
    }

    #[test]
    fn test_section_extent_at() {
        let section = Section::new(
            SectionId::new(0),
            Orientation::Horizontal,
            4,
            vec![Run::new(0, 5), Run::new(2, 8), Run::new(3, 2)],
        );

        assert_eq!(section.extent_at(0), Some((4.0, 5.0)));
        assert_eq!(section.extent_at(3), Some((4.0, 7.0)));
        assert_eq!(section.extent_at(8), Some((5.0, 6.0)));
        assert_eq!(section.extent_at(12), None);
        assert_eq!(section.thickness_at(3), 3);
        assert_eq!(section.mid_pos_at(8), Some(5.5));
    }

    #[test]
    fn test_builder_merges_straight_line() {
        let mut image = BinaryImage::new(50, 10);
        image.fill_rect(5, 3, 40, 3);

        let mut lag = Lag::new(Orientation::Horizontal);
        let created =
            SectionsBuilder::new(&mut lag, JunctionPolicy::Ratio(1.5)).create_sections(&horizontal_table(&image));

        assert_eq!(created.len(), 1);
        let section = &lag.sections()[0];
        assert_eq!(section.first_pos(), 3);
        assert_eq!(section.runs().len(), 3);
        assert_eq!(section.weight(), 120);
    }

    #[test]
    fn test_builder_splits_on_fork() {
        // One long run above two shorter runs: the junction is not one-to-one
        let mut image = BinaryImage::new(30, 4);
        image.fill_rect(0, 0, 30, 1);
        image.fill_rect(0, 1, 10, 1);
        image.fill_rect(20, 1, 10, 1);

        let mut lag = Lag::new(Orientation::Horizontal);
        let created =
            SectionsBuilder::new(&mut lag, JunctionPolicy::All).create_sections(&horizontal_table(&image));

        assert_eq!(created.len(), 3);
    }

    #[test]
    fn test_ratio_policy_splits_on_length_jump() {
        let mut image = BinaryImage::new(40, 3);
        image.fill_rect(0, 0, 10, 1);
        image.fill_rect(0, 1, 30, 1);

        let mut ratio_lag = Lag::new(Orientation::Horizontal);
        let ratio_created = SectionsBuilder::new(&mut ratio_lag, JunctionPolicy::Ratio(1.5))
            .create_sections(&horizontal_table(&image));
        assert_eq!(ratio_created.len(), 2);

        let mut all_lag = Lag::new(Orientation::Horizontal);
        let all_created = SectionsBuilder::new(&mut all_lag, JunctionPolicy::All)
            .create_sections(&horizontal_table(&image));
        assert_eq!(all_created.len(), 1);
    }

    #[test]
    fn test_builder_appends_to_existing_lag() {
        let mut image = BinaryImage::new(20, 6);
        image.fill_rect(0, 0, 20, 1);
        image.fill_rect(0, 4, 20, 1);

        let mut lag = Lag::new(Orientation::Horizontal);
        lag.add_section(100, vec![Run::new(0, 3)]);
        let created = SectionsBuilder::new(&mut lag, JunctionPolicy::All)
            .create_sections(&horizontal_table(&image));

        assert_eq!(created, vec![SectionId::new(1), SectionId::new(2)]);
        assert_eq!(lag.last_id(), Some(SectionId::new(2)));
    }
}
