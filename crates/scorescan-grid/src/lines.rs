//! Retrieval of staff lines and staves.
//!
//! # Overview
//!
//! [`LinesRetriever`] drives the whole staff line retrieval of a sheet:
//!
//! 1. [`build_horizontal_lag`](LinesRetriever::build_horizontal_lag) sets
//!    aside vertical runs too long for a staff line, renders the remaining
//!    ones and scans them horizontally; long horizontal runs become sections.
//! 2. [`retrieve_lines`](LinesRetriever::retrieve_lines) merges sections into
//!    filaments, computes the global slope, clusters the filaments (with the
//!    main interline then the second one, if any) and builds the staves.
//! 3. [`create_short_sections`](LinesRetriever::create_short_sections)
//!    builds sections out of the short horizontal runs.
//! 4. [`complete_lines`](LinesRetriever::complete_lines) includes discarded
//!    filaments and short sections ("stickers") into the staff lines, aligns
//!    line endings, fills holes and polishes the lines.
//!
//! [`LinesRetriever::retrieve`] runs all steps and returns a [`StaffLayout`].

use std::{cmp::Ordering, time::Instant};

use log::{debug, info, trace};
use serde::Serialize;

use scorescan_core::{
    geometry::{Bounds, HorizontalSide, Point},
    identifier::{FilamentId, SectionId},
    image::BinaryImage,
    lag::{JunctionPolicy, Lag, Section, SectionsBuilder},
    run::{Orientation, RunsTable, RunsTableFactory},
    scale::Scale,
};

use crate::{
    cluster::{ClustersRetriever, LineCluster},
    config::{GridConfig, Parameters},
    error::GridError,
    factory::{FactoryParams, FilamentsFactory},
    filament::{Filament, LineGeometry},
    staff::{FilamentLine, StaffInfo, StaffManager},
};

/// Result of the staff line retrieval of a sheet.
#[derive(Debug, Clone, Serialize)]
pub struct StaffLayout {
    scale: Scale,
    staves: Vec<StaffInfo>,
    global_slope: f64,
    skew_angle: f64,
    discarded_filaments: usize,
    long_vertical_runs: usize,
}

impl StaffLayout {
    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    pub fn staves(&self) -> &[StaffInfo] {
        &self.staves
    }

    pub fn into_staves(self) -> Vec<StaffInfo> {
        self.staves
    }

    /// Mean slope of the longest filaments
    pub fn global_slope(&self) -> f64 {
        self.global_slope
    }

    /// Skew angle in radians, derived from the global slope
    pub fn skew_angle(&self) -> f64 {
        self.skew_angle
    }

    /// Number of filaments which found no staff
    pub fn discarded_filaments(&self) -> usize {
        self.discarded_filaments
    }

    /// Number of vertical runs set aside as barline or stem candidates
    pub fn long_vertical_runs(&self) -> usize {
        self.long_vertical_runs
    }
}

/// Mean slope of the longest filaments.
///
/// Filaments are given by their ending points. The `top_ratio` longest ones
/// (at least one) are averaged. Zero-width filaments carry no slope and are
/// left out; without any usable filament the slope is 0.
///
/// # Examples
///
/// ```
/// # use scorescan_core::geometry::Point;
/// # use scorescan_grid::lines::retrieve_global_slope;
/// let endings = [
///     (Point::new(0.0, 0.0), Point::new(100.0, 1.0)),
///     (Point::new(0.0, 0.0), Point::new(10.0, 5.0)),
/// ];
/// assert_eq!(retrieve_global_slope(&endings, 0.1), 0.01);
/// ```
pub fn retrieve_global_slope(endings: &[(Point, Point)], top_ratio: f64) -> f64 {
    let mut usable: Vec<&(Point, Point)> = endings
        .iter()
        .filter(|(start, stop)| stop.x() != start.x())
        .collect();
    if usable.is_empty() {
        return 0.0;
    }
    usable.sort_by(|a, b| {
        let la = a.1.x() - a.0.x();
        let lb = b.1.x() - b.0.x();
        lb.total_cmp(&la)
    });

    let top_count = ((usable.len() as f64 * top_ratio).round() as usize).clamp(1, usable.len());
    let sum: f64 = usable[..top_count]
        .iter()
        .filter_map(|(start, stop)| start.slope_to(*stop))
        .sum();
    sum / top_count as f64
}

/// An entity (section or filament) considered for inclusion into a line.
#[derive(Debug, Clone)]
pub struct StickerCandidate {
    label: String,
    vip: bool,
    bounds: Bounds,
    center: Point,
    sections: Vec<SectionId>,
}

impl StickerCandidate {
    pub fn from_section(section: &Section) -> Self {
        Self {
            label: section.id().to_string(),
            vip: section.is_vip(),
            bounds: section.bounds(),
            center: section.centroid(),
            sections: vec![section.id()],
        }
    }

    pub fn from_filament(filament: &Filament) -> Self {
        Self {
            label: filament.id().to_string(),
            vip: filament.is_vip(),
            bounds: filament.bounds(),
            center: filament.centroid(),
            sections: filament.sections().to_vec(),
        }
    }
}

/// Checks whether a staff line filament can include the candidate.
///
/// The candidate is rejected when it is too thick, when its center lies too
/// far from the line border, when it extends too far from the line, or when
/// the line and the candidate together would be too thick at the candidate
/// center.
pub fn can_include(
    params: &Parameters,
    scale: &Scale,
    filament: &Filament,
    candidate: &StickerCandidate,
    lag: &Lag,
) -> bool {
    let log_check = |check: &str, value: f64, limit: f64| {
        if candidate.vip {
            info!(candidate:% = candidate.label, check, value, limit; "VIP sticker rejected");
        } else {
            trace!(candidate:% = candidate.label, check, value, limit; "Sticker rejected");
        }
    };

    let height = candidate.bounds.height();
    let max_thickness = params.max_sticker_thickness() as f64;
    if height > max_thickness {
        log_check("height", height, max_thickness);
        return false;
    }

    let center = candidate.center;
    let y_line = filament.position_at(center.x());
    let gap = (y_line - center.y()).abs() - scale.main_fore() as f64 / 2.0;
    if gap > params.max_sticker_gap() {
        log_check("gap", gap, params.max_sticker_gap());
        return false;
    }

    let extension = (y_line - candidate.bounds.min_y())
        .abs()
        .max((candidate.bounds.max_y() - y_line).abs());
    let max_extension = params.max_sticker_extension() as f64;
    if extension > max_extension {
        log_check("extension", extension, max_extension);
        return false;
    }

    let thickness = filament.combined_thickness_at(center.x(), &candidate.sections, lag);
    if thickness > max_thickness {
        log_check("thickness", thickness, max_thickness);
        return false;
    }

    if candidate.vip {
        info!(candidate:% = candidate.label, filament:% = filament.id(); "VIP sticker accepted");
    }
    true
}

/// Staff line retrieval of one sheet.
#[derive(Debug)]
pub struct LinesRetriever {
    scale: Scale,
    params: Parameters,
    lag: Lag,
    factory: FilamentsFactory,
    short_hori_table: Option<RunsTable>,
    long_section_count: Option<usize>,
    filaments: Vec<FilamentId>,
    discarded: Vec<FilamentId>,
    global_slope: f64,
    staff_manager: StaffManager,
}

impl LinesRetriever {
    pub fn new(scale: Scale, config: &GridConfig) -> Self {
        let params = Parameters::new(config, &scale);
        let factory =
            FilamentsFactory::new(FactoryParams::from_parameters(&params, scale.interline()));
        debug!(params:?; "Lines retriever parameters");
        Self {
            scale,
            params,
            lag: Lag::new(Orientation::Horizontal),
            factory,
            short_hori_table: None,
            long_section_count: None,
            filaments: Vec::new(),
            discarded: Vec::new(),
            global_slope: 0.0,
            staff_manager: StaffManager::new(),
        }
    }

    /// Runs the whole retrieval on a binary image.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::EmptyImage`] if the image has no pixel.
    pub fn retrieve(
        image: &BinaryImage,
        scale: Scale,
        config: &GridConfig,
    ) -> Result<StaffLayout, GridError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(GridError::EmptyImage {
                width: image.width(),
                height: image.height(),
            });
        }

        let start = Instant::now();
        let whole_vert = RunsTableFactory::new(Orientation::Vertical).create_table(image);

        let mut retriever = Self::new(scale, config);
        let long_vert = retriever.build_horizontal_lag(&whole_vert);
        retriever.retrieve_lines();
        retriever.create_short_sections();
        retriever.complete_lines();

        let layout = retriever.into_layout(long_vert.run_count());
        info!(
            staves = layout.staves().len(),
            elapsed_ms = start.elapsed().as_millis() as u64;
            "Staff lines retrieved"
        );
        Ok(layout)
    }

    pub fn lag(&self) -> &Lag {
        &self.lag
    }

    pub fn factory(&self) -> &FilamentsFactory {
        &self.factory
    }

    pub fn global_slope(&self) -> f64 {
        self.global_slope
    }

    pub fn staff_manager(&self) -> &StaffManager {
        &self.staff_manager
    }

    /// Filaments that found no staff
    pub fn discarded_filaments(&self) -> &[FilamentId] {
        &self.discarded
    }

    /// Builds the horizontal lag, populated with long sections only.
    ///
    /// Returns the vertical runs too long to be part of any staff line.
    pub fn build_horizontal_lag(&mut self, whole_vert_table: &RunsTable) -> RunsTable {
        let start = Instant::now();
        let max_vertical = self.params.max_vertical_run_length();
        let mut short_vert_table = whole_vert_table.clone();
        let long_vert_table = short_vert_table.purge(|_, run| run.length() > max_vertical);

        let mut long_hori_table = RunsTableFactory::new(Orientation::Horizontal)
            .create_table(&short_vert_table.to_image());
        let min_length = self.params.min_run_length();
        let short_hori_table = long_hori_table.purge(|_, run| run.length() < min_length);

        let created = SectionsBuilder::new(
            &mut self.lag,
            JunctionPolicy::Ratio(self.params.max_length_ratio()),
        )
        .create_sections(&long_hori_table);
        self.short_hori_table = Some(short_hori_table);
        self.set_vip_sections();

        debug!(
            long_vert = long_vert_table.run_count(),
            long_sections = created.len(),
            elapsed_ms = start.elapsed().as_millis() as u64;
            "Horizontal lag built"
        );
        long_vert_table
    }

    /// Builds filaments, global slope, clusters and staves.
    pub fn retrieve_lines(&mut self) {
        let start = Instant::now();
        let sections: Vec<SectionId> = self.lag.sections().iter().map(Section::id).collect();
        self.filaments = self.factory.retrieve_filaments(&sections, &mut self.lag);

        let endings: Vec<(Point, Point)> = self
            .filaments
            .iter()
            .filter_map(|id| self.factory.filament(*id))
            .map(|f| (f.start_point(), f.stop_point()))
            .collect();
        self.global_slope = retrieve_global_slope(&endings, self.params.top_ratio_for_slope());
        info!(global_slope = self.global_slope; "Global slope");

        let mut retriever = ClustersRetriever::new(
            self.filaments.clone(),
            self.scale.interline(),
            &self.params,
            self.global_slope,
        );
        self.discarded = retriever.build_info(&mut self.factory, &mut self.lag);
        let mut clusters = retriever.into_clusters();

        if let Some(second_interline) = self
            .scale
            .second_interline()
            .filter(|_| !self.discarded.is_empty())
        {
            info!(second_interline; "Searching clusters with second interline");
            let mut candidates = std::mem::take(&mut self.discarded);
            candidates.sort();
            let mut second = ClustersRetriever::new(
                candidates,
                second_interline,
                &self.params,
                self.global_slope,
            );
            self.discarded = second.build_info(&mut self.factory, &mut self.lag);
            clusters.extend(second.into_clusters());
        }

        debug!(discarded:? = self.discarded; "Discarded filaments");
        self.build_staves(clusters);
        debug!(elapsed_ms = start.elapsed().as_millis() as u64; "Lines retrieved");
    }

    /// Registers line clusters as staves, numbered from 1 in layout order
    fn build_staves(&mut self, mut clusters: Vec<LineCluster>) {
        sort_by_layout(&mut clusters);
        self.staff_manager.reset();

        for (index, cluster) in clusters.iter().enumerate() {
            let lines: Vec<FilamentLine> = cluster
                .lines()
                .iter()
                .filter_map(|id| self.factory.filament(*id))
                .map(FilamentLine::from_filament)
                .collect();
            let left = lines
                .iter()
                .map(|l| l.end_point(HorizontalSide::Left).x())
                .fold(f64::INFINITY, f64::min);
            let right = lines
                .iter()
                .map(|l| l.end_point(HorizontalSide::Right).x())
                .fold(f64::NEG_INFINITY, f64::max);
            let scale = Scale::new(
                cluster.interline().round() as i32,
                self.scale.main_fore(),
                self.scale.max_fore(),
            )
            .unwrap_or(self.scale);

            let staff = StaffInfo::new(index + 1, left, right, scale, lines);
            debug!(
                staff = staff.id(),
                interline = staff.interline(),
                left,
                right;
                "Staff built"
            );
            self.staff_manager.add_staff(staff);
        }

        let short = self.staff_manager.detect_short_staves();
        info!(staves = self.staff_manager.staff_count(), short; "Staves built");
    }

    /// Builds sections out of the short horizontal runs.
    ///
    /// Returns the created sections.
    pub fn create_short_sections(&mut self) -> Vec<SectionId> {
        self.long_section_count = Some(self.lag.len());
        let Some(table) = self.short_hori_table.take() else {
            return Vec::new();
        };
        let created = SectionsBuilder::new(
            &mut self.lag,
            JunctionPolicy::Ratio(self.params.max_length_ratio_short()),
        )
        .create_sections(&table);
        self.set_vip_sections();
        debug!(short_sections = created.len(); "Short sections built");
        created
    }

    /// Completes the staff lines with discarded filaments and stickers.
    pub fn complete_lines(&mut self) {
        let start = Instant::now();
        self.include_discarded_filaments();

        let long_count = self.long_section_count.unwrap_or(self.lag.len());
        let (thick, thin): (Vec<(SectionId, i32)>, Vec<(SectionId, i32)>) = self
            .lag
            .sections()
            .iter()
            .filter(|s| s.id().index() >= long_count)
            .map(|s| (s.id(), s.weight()))
            .partition(|(_, weight)| *weight > self.params.max_thin_sticker_weight());
        let thick: Vec<SectionId> = thick.into_iter().map(|(id, _)| id).collect();
        let thin: Vec<SectionId> = thin.into_iter().map(|(id, _)| id).collect();

        debug!(thick = thick.len(), thin = thin.len(); "Including stickers");
        self.include_sections(thick, true);
        self.include_sections(thin, false);

        let max_dy = self.params.max_curvature_dy();
        for line_id in self.line_filaments() {
            if let Some(filament) = self.factory.filament_mut(line_id) {
                filament.polish_curvature(max_dy);
            }
        }
        self.refresh_staff_lines();
        debug!(elapsed_ms = start.elapsed().as_millis() as u64; "Lines completed");
    }

    /// Staff line filaments, staff by staff, top down
    fn line_filaments(&self) -> Vec<FilamentId> {
        self.staff_manager
            .staves()
            .iter()
            .flat_map(|s| s.lines().iter().filter_map(FilamentLine::filament))
            .collect()
    }

    fn refresh_staff_lines(&mut self) {
        let factory = &self.factory;
        for staff in self.staff_manager.staves_mut() {
            for line in staff.lines_mut() {
                if let Some(filament) = line.filament().and_then(|id| factory.filament(id)) {
                    line.refresh(filament);
                }
            }
        }
    }

    /// Vertical search window of a line: its box grown by the line thickness
    fn line_window(&self, filament: &Filament) -> (f64, f64, f64, f64) {
        let line_box = filament
            .bounds()
            .grow(0.0, self.scale.main_fore() as f64);
        (
            filament.start_point().x(),
            filament.stop_point().x(),
            line_box.min_y(),
            line_box.max_y(),
        )
    }

    fn include_discarded_filaments(&mut self) {
        let mut discarded = self.discarded.clone();
        discarded.sort_by(|a, b| {
            let ya = self.factory.filament(*a).map_or(0.0, |f| f.bounds().min_y());
            let yb = self.factory.filament(*b).map_or(0.0, |f| f.bounds().min_y());
            ya.total_cmp(&yb)
        });

        let staves: Vec<Vec<FilamentId>> = self
            .staff_manager
            .staves()
            .iter()
            .map(|s| s.lines().iter().filter_map(FilamentLine::filament).collect())
            .collect();

        let mut included = 0;
        for (staff_index, lines) in staves.iter().enumerate() {
            // Staves may lie side by side, so restart from top
            let mut i_min = 0;
            for line_id in lines {
                let Some(line) = self.factory.filament(*line_id) else {
                    continue;
                };
                let (min_x, max_x, min_y, max_y) = self.line_window(line);

                for i in i_min..discarded.len() {
                    let Some(fil) = self.factory.filament(discarded[i]) else {
                        continue;
                    };
                    if fil.part_of().is_some() {
                        continue;
                    }
                    let first_pos = fil.bounds().min_y();
                    if first_pos < min_y {
                        i_min = i;
                        continue;
                    }
                    if first_pos > max_y {
                        break;
                    }
                    let center = fil.centroid();
                    if center.x() < min_x || center.x() > max_x {
                        continue;
                    }
                    let Some(line) = self.factory.filament(*line_id) else {
                        break;
                    };
                    let candidate = StickerCandidate::from_filament(fil);
                    if can_include(&self.params, &self.scale, line, &candidate, &self.lag) {
                        self.factory.merge(*line_id, discarded[i], &mut self.lag);
                        included += 1;
                    }
                }
            }
            self.adjust_staff_lines(staff_index);
        }

        self.discarded
            .retain(|id| self.factory.filament(*id).is_some_and(|f| f.part_of().is_none()));
        debug!(included; "Discarded filaments included");
    }

    /// Aligns line endings on the staff limits and fills line holes
    fn adjust_staff_lines(&mut self, staff_index: usize) {
        self.refresh_staff_lines();
        let Some(staff) = self.staff_manager.staves().get(staff_index) else {
            return;
        };

        let endings: Vec<(FilamentId, Point, Point)> = staff
            .lines()
            .iter()
            .filter_map(|line| {
                let id = line.filament()?;
                Some((
                    id,
                    line_ending(staff, line, HorizontalSide::Left),
                    line_ending(staff, line, HorizontalSide::Right),
                ))
            })
            .collect();

        for (id, left, right) in &endings {
            if let Some(filament) = self.factory.filament_mut(*id) {
                filament.set_ending_points(*left, *right);
            }
        }

        let siblings: Vec<LineGeometry> = endings
            .iter()
            .filter_map(|(id, _, _)| self.factory.filament(*id))
            .map(|f| f.geometry().clone())
            .collect();
        for (index, (id, _, _)) in endings.iter().enumerate() {
            let others: Vec<&LineGeometry> = siblings
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != index)
                .map(|(_, g)| g)
                .collect();
            if let Some(filament) = self.factory.filament_mut(*id) {
                let filled = filament.fill_holes(&others);
                if filled > 0 {
                    trace!(filament:% = id, filled; "Line holes filled");
                }
            }
        }
        self.refresh_staff_lines();
    }

    /// Includes sticker sections into the staff lines.
    ///
    /// With `update_geometry`, sections become filament members and the line
    /// is refitted, its ending points being re-imposed. Otherwise sections
    /// are only tagged as belonging to the line.
    fn include_sections(&mut self, mut sections: Vec<SectionId>, update_geometry: bool) {
        sections.sort_by_key(|id| {
            self.lag
                .section(*id)
                .map_or((i32::MAX, i32::MAX), |s| (s.first_pos(), s.start_coord()))
        });

        let staves: Vec<Vec<FilamentId>> = self
            .staff_manager
            .staves()
            .iter()
            .map(|s| s.lines().iter().filter_map(FilamentLine::filament).collect())
            .collect();

        let mut included = 0;
        for lines in &staves {
            let mut i_min = 0;
            for line_id in lines {
                let Some(line) = self.factory.filament(*line_id) else {
                    continue;
                };
                let (min_x, max_x, min_y, max_y) = self.line_window(line);
                let (start_point, stop_point) = (line.start_point(), line.stop_point());

                // Stickers are gathered first, then included all at once
                let mut stickers = Vec::new();
                for (i, id) in sections.iter().enumerate().skip(i_min) {
                    let Some(section) = self.lag.section(*id) else {
                        continue;
                    };
                    if section.owner().is_some() {
                        continue;
                    }
                    let first_pos = section.first_pos() as f64;
                    if first_pos < min_y {
                        i_min = i;
                        continue;
                    }
                    if first_pos > max_y {
                        break;
                    }
                    let center = section.centroid();
                    if center.x() < min_x || center.x() > max_x {
                        continue;
                    }
                    let candidate = StickerCandidate::from_section(section);
                    if can_include(&self.params, &self.scale, line, &candidate, &self.lag) {
                        stickers.push(*id);
                    }
                }

                included += stickers.len();
                if update_geometry {
                    if let Some(filament) = self.factory.filament_mut(*line_id) {
                        for id in &stickers {
                            filament.add_section(*id, &mut self.lag);
                        }
                        if !stickers.is_empty() {
                            filament.set_ending_points(start_point, stop_point);
                        }
                    }
                } else {
                    for id in &stickers {
                        if let Some(section) = self.lag.section_mut(*id) {
                            section.set_owner(Some(*line_id));
                        }
                    }
                }
            }
        }
        debug!(update_geometry, included; "Stickers included");
    }

    fn set_vip_sections(&mut self) {
        let vips = self.params.vip_sections().to_vec();
        self.lag.set_vip_sections(&vips);
        for id in vips {
            if let Some(section) = self.lag.section(id) {
                info!(section:% = id, bounds:? = section.bounds(); "Horizontal VIP section");
            }
        }
    }

    /// Finishes the retrieval, handing over the staves.
    pub fn into_layout(self, long_vertical_runs: usize) -> StaffLayout {
        StaffLayout {
            scale: self.scale,
            staves: self.staff_manager.into_staves(),
            global_slope: self.global_slope,
            skew_angle: self.global_slope.atan(),
            discarded_filaments: self.discarded.len(),
            long_vertical_runs,
        }
    }
}

/// Point where a line should end, on the staff limit of the given side
fn line_ending(staff: &StaffInfo, line: &FilamentLine, side: HorizontalSide) -> Point {
    let slope = staff.ending_slope(side);
    let line_point = line.end_point(side);
    let staff_x = staff.abscissa(side);
    let y = line_point.y() - (line_point.x() - staff_x) * slope;
    Point::new(staff_x, y)
}

/// Sorts clusters top down, clusters sharing a vertical range left to right
fn sort_by_layout(clusters: &mut Vec<LineCluster>) {
    clusters.sort_by(|a, b| a.bounds().min_y().total_cmp(&b.bounds().min_y()));

    let mut rows: Vec<(Bounds, Vec<LineCluster>)> = Vec::new();
    for cluster in clusters.drain(..) {
        match rows.last_mut() {
            Some((row_box, members)) if row_box.y_overlap(&cluster.bounds()) > 0.0 => {
                *row_box = row_box.merge(&cluster.bounds());
                members.push(cluster);
            }
            _ => rows.push((cluster.bounds(), vec![cluster])),
        }
    }

    for (_, mut members) in rows {
        members.sort_by(|a, b| {
            a.bounds()
                .min_x()
                .partial_cmp(&b.bounds().min_x())
                .unwrap_or(Ordering::Equal)
        });
        clusters.extend(members);
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use scorescan_core::run::Run;

    use super::*;

    #[test]
    fn test_global_slope_uses_longest_only() {
        // Nine filaments at slope 0.01, the first one the longest
        let mut endings = vec![(Point::new(0.0, 100.0), Point::new(1000.0, 110.0))];
        for i in 0..8 {
            let y = 200.0 + 20.0 * i as f64;
            endings.push((Point::new(0.0, y), Point::new(500.0, y + 5.0)));
        }
        // A shorter steep outlier
        endings.push((Point::new(0.0, 400.0), Point::new(300.0, 550.0)));

        let slope = retrieve_global_slope(&endings, 0.1);

        assert_approx_eq!(f64, slope, 0.01);
        assert!((slope - 0.5).abs() > 0.1);
    }

    #[test]
    fn test_global_slope_averages_top_ratio() {
        let endings = vec![
            (Point::new(0.0, 0.0), Point::new(1000.0, 10.0)),
            (Point::new(0.0, 0.0), Point::new(900.0, 27.0)),
            (Point::new(0.0, 0.0), Point::new(100.0, 50.0)),
            (Point::new(0.0, 0.0), Point::new(100.0, 50.0)),
        ];
        // round(4 * 0.5) = 2 longest filaments
        assert_approx_eq!(f64, retrieve_global_slope(&endings, 0.5), 0.02);
    }

    #[test]
    fn test_global_slope_skips_zero_width() {
        let endings = vec![
            (Point::new(10.0, 0.0), Point::new(10.0, 50.0)),
            (Point::new(0.0, 0.0), Point::new(100.0, 2.0)),
        ];
        assert_approx_eq!(f64, retrieve_global_slope(&endings, 0.1), 0.02);

        let degenerate = vec![(Point::new(10.0, 0.0), Point::new(10.0, 50.0))];
        assert_approx_eq!(f64, retrieve_global_slope(&degenerate, 0.1), 0.0);
        assert_approx_eq!(f64, retrieve_global_slope(&[], 0.1), 0.0);
    }

    struct StickerFixture {
        scale: Scale,
        params: Parameters,
        lag: Lag,
        filament: Filament,
    }

    impl StickerFixture {
        /// A 3 pixel thick line on rows 40 to 42, from x=0 to x=199
        fn new() -> Self {
            let scale = Scale::new(20, 3, 4).unwrap();
            let params = Parameters::new(&GridConfig::default(), &scale);
            let mut lag = Lag::new(Orientation::Horizontal);
            let line = lag.add_section(40, vec![Run::new(0, 200); 3]);
            let mut filament = Filament::new(FilamentId::new(0), params.probe_width());
            filament.add_section(line, &mut lag);
            Self {
                scale,
                params,
                lag,
                filament,
            }
        }

        fn check(&mut self, y: i32, x: i32, length: i32, height: usize) -> bool {
            let id = self.lag.add_section(y, vec![Run::new(x, length); height]);
            let section = self.lag.section(id).unwrap();
            let candidate = StickerCandidate::from_section(section);
            can_include(&self.params, &self.scale, &self.filament, &candidate, &self.lag)
        }
    }

    #[test]
    fn test_sticker_touching_line_is_included() {
        let mut fx = StickerFixture::new();
        // Row 43, right below the line
        assert!(fx.check(43, 50, 6, 1));
    }

    #[test]
    fn test_sticker_gap_rejection() {
        let mut fx = StickerFixture::new();
        let max_gap = fx.params.max_sticker_gap();
        assert_approx_eq!(f64, max_gap, 1.5);

        // Center at 41.5 + 1.5 + 3 * max_gap = 47.5, i.e. row 47
        let y = (41.5 + 1.5 + 3.0 * max_gap - 0.5) as i32;
        assert_eq!(y, 47);
        assert!(!fx.check(y, 50, 6, 1));
    }

    #[test]
    fn test_sticker_too_thick_is_rejected() {
        let mut fx = StickerFixture::new();
        assert!(!fx.check(43, 50, 6, 5));
    }

    #[test]
    fn test_sticker_making_line_too_thick_is_rejected() {
        let mut fx = StickerFixture::new();
        // Two rows below the line: 5 pixels in total at its center
        assert!(!fx.check(43, 50, 6, 2));
    }

    #[test]
    fn test_line_ending_follows_staff_slope() {
        let line = FilamentLine::from_geometry(LineGeometry::from_points(vec![
            Point::new(10.0, 100.0),
            Point::new(110.0, 110.0),
        ]));
        let staff = StaffInfo::new(1, 0.0, 120.0, Scale::new(20, 3, 3).unwrap(), vec![line.clone()]);

        let left = line_ending(&staff, &line, HorizontalSide::Left);
        assert_approx_eq!(f64, left.x(), 0.0);
        assert_approx_eq!(f64, left.y(), 99.0);

        let right = line_ending(&staff, &line, HorizontalSide::Right);
        assert_approx_eq!(f64, right.x(), 120.0);
        assert_approx_eq!(f64, right.y(), 111.0);
    }
}
