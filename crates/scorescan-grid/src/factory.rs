//! Building filaments out of long horizontal sections.
//!
//! Every candidate section seeds its own filament. Filaments are then merged
//! pairwise, left to right, as long as their shapes are compatible:
//!
//! - both are thin enough to be part of a staff line
//! - the abscissa gap between them is small
//! - their ordinates agree at the junction
//! - their slopes agree, when both are long enough to have a reliable one

use log::{debug, info};

use scorescan_core::{
    identifier::{FilamentId, SectionId},
    lag::Lag,
};

use crate::{config::Parameters, filament::Filament};

/// Pixel constraints used by the [`FilamentsFactory`].
#[derive(Debug, Clone)]
pub struct FactoryParams {
    probe_width: f64,
    max_thickness: f64,
    max_gap_dx: f64,
    max_gap_dy: f64,
    max_slope_delta: f64,
    min_slope_length: f64,
}

impl FactoryParams {
    /// Derives the factory constraints from the retrieval parameters
    pub fn from_parameters(params: &Parameters, interline: i32) -> Self {
        Self {
            probe_width: params.probe_width(),
            max_thickness: params.max_vertical_run_length() as f64,
            max_gap_dx: params.max_filament_gap_dx(),
            max_gap_dy: params.max_filament_gap_dy(),
            max_slope_delta: params.max_filament_slope_delta(),
            min_slope_length: interline as f64,
        }
    }
}

/// Owner of every filament built for a sheet.
///
/// Filaments are stored in an arena and never removed: a filament merged
/// into another one stays in place, empty, with its `part_of` link set.
#[derive(Debug)]
pub struct FilamentsFactory {
    params: FactoryParams,
    filaments: Vec<Filament>,
}

impl FilamentsFactory {
    pub fn new(params: FactoryParams) -> Self {
        Self {
            params,
            filaments: Vec::new(),
        }
    }

    pub fn filament(&self, id: FilamentId) -> Option<&Filament> {
        self.filaments.get(id.index())
    }

    pub fn filament_mut(&mut self, id: FilamentId) -> Option<&mut Filament> {
        self.filaments.get_mut(id.index())
    }

    /// Every filament ever built, merged ones included
    pub fn filaments(&self) -> &[Filament] {
        &self.filaments
    }

    /// Creates a new filament out of the given sections
    pub fn create_filament(&mut self, sections: &[SectionId], lag: &mut Lag) -> FilamentId {
        let id = FilamentId::new(self.filaments.len());
        let mut filament = Filament::new(id, self.params.probe_width);
        for section in sections {
            filament.add_section(*section, lag);
        }
        self.filaments.push(filament);
        id
    }

    /// Moves the sections of `from` into `into`, marking `from` as part of it.
    ///
    /// Returns `false` if either id is unknown or both are the same.
    pub fn merge(&mut self, into: FilamentId, from: FilamentId, lag: &mut Lag) -> bool {
        let (i, j) = (into.index(), from.index());
        if i == j || i >= self.filaments.len() || j >= self.filaments.len() {
            return false;
        }
        let (target, source) = if i < j {
            let (left, right) = self.filaments.split_at_mut(j);
            (&mut left[i], &mut right[0])
        } else {
            let (left, right) = self.filaments.split_at_mut(i);
            (&mut right[0], &mut left[j])
        };
        target.steal_sections(source, lag);
        true
    }

    /// Merges the given sections into filaments.
    ///
    /// Sections already owned by a filament or too thick to be part of a
    /// line are ignored. Returns the ids of the resulting filaments.
    pub fn retrieve_filaments(&mut self, sections: &[SectionId], lag: &mut Lag) -> Vec<FilamentId> {
        let mut alive: Vec<FilamentId> = sections
            .iter()
            .copied()
            .filter(|id| {
                lag.section(*id).is_some_and(|s| {
                    s.owner().is_none() && s.mean_thickness() <= self.params.max_thickness
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|id| self.create_filament(&[id], lag))
            .collect();
        let seeds = alive.len();

        self.sort_by_start(&mut alive);

        let mut i = 0;
        while i < alive.len() {
            let mut merged_any = false;
            let mut j = i + 1;
            while j < alive.len() {
                let (a, b) = (alive[i], alive[j]);
                let (Some(fa), Some(fb)) = (self.filament(a), self.filament(b)) else {
                    j += 1;
                    continue;
                };
                // Sorted by start: no later candidate can be closer
                if fb.start_point().x() - fa.stop_point().x() > self.params.max_gap_dx {
                    break;
                }
                if self.can_merge(fa, fb) {
                    if fa.is_vip() || fb.is_vip() {
                        info!(into:% = a, from:% = b; "VIP merging filaments");
                    }
                    self.merge(a, b, lag);
                    alive.remove(j);
                    merged_any = true;
                } else {
                    j += 1;
                }
            }
            if !merged_any {
                i += 1;
            }
        }

        info!(seeds, filaments = alive.len(); "Filaments retrieved");
        alive
    }

    fn sort_by_start(&self, ids: &mut [FilamentId]) {
        ids.sort_by(|a, b| {
            let xa = self.filament(*a).map_or(0.0, |f| f.start_point().x());
            let xb = self.filament(*b).map_or(0.0, |f| f.start_point().x());
            xa.total_cmp(&xb).then(a.cmp(b))
        });
    }

    /// Checks shape compatibility of `left`, starting first, with `right`
    fn can_merge(&self, left: &Filament, right: &Filament) -> bool {
        let p = &self.params;
        let (left_stop, right_start) = (left.stop_point(), right.start_point());

        let gap_dx = right_start.x() - left_stop.x();
        if gap_dx > p.max_gap_dx {
            return false;
        }

        // Ordinates compared at the junction, or in the middle of the overlap
        let junction_x = if gap_dx >= 0.0 {
            (left_stop.x() + right_start.x()) / 2.0
        } else {
            (right_start.x() + left_stop.x().min(right.stop_point().x())) / 2.0
        };
        let dy = (left.position_at(junction_x) - right.position_at(junction_x)).abs();
        if dy > p.max_gap_dy {
            debug!(left:% = left.id(), right:% = right.id(), dy; "Filament junction too far");
            return false;
        }

        if left.length() >= p.min_slope_length && right.length() >= p.min_slope_length {
            let slope_delta = (left.slope_at(left_stop.x()) - right.slope_at(right_start.x())).abs();
            if slope_delta > p.max_slope_delta {
                debug!(left:% = left.id(), right:% = right.id(), slope_delta; "Filament slopes differ");
                return false;
            }
        }

        true
    }
}
