//! Reduction of the interpretation graph of a system.
//!
//! # Overview
//!
//! [`SigReducer::reduce`] converges the graph of a system towards a
//! consistent set of interpretations. It first inserts exclusions between
//! overlapping inters and between heads of different kinds sharing a good
//! stem. It then loops:
//!
//! 1. inters whose contextual grade is too low are deleted;
//! 2. structural checks are run until none modifies the graph, each one
//!    followed by a new purge of weak inters;
//! 3. the remaining exclusions are resolved.
//!
//! The loop ends once a whole round neither deleted an inter nor resolved
//! an exclusion. The graph only shrinks, except for exclusions inserted in
//! place of cut head-stem relations, so the loop always ends.
//!
//! Each check returns its count of modifications, 0 meaning the graph
//! already satisfies it.

use std::time::Instant;

use indexmap::IndexMap;
use log::{Level, debug, info, log};

use scorescan_core::{
    geometry::HorizontalSide,
    identifier::{InterId, RelationId},
    shape::{Shape, ShapeCategory, compatible},
};
use scorescan_grid::staff::StaffInfo;

use crate::{
    config::ReducerConfig,
    sig::{BeamPortion, ExclusionCause, Inter, ReductionMode, Relation, SIGraph, StemPortion},
    system::SystemInfo,
};

/// Reducer constants converted for the system interline.
#[derive(Debug, Clone)]
struct Parameters {
    min_contextual_grade: f64,
    good_grade: f64,
    stem_end_margin: f64,
    relaxed_margin: f64,
    interline: f64,
}

/// Reducer of the interpretation graph of one system.
pub struct SigReducer<'a> {
    system_id: usize,
    staves: &'a mut [StaffInfo],
    sig: &'a mut SIGraph,
    params: Parameters,
}

impl<'a> SigReducer<'a> {
    /// Creates a reducer working on the given system.
    ///
    /// Inters listed in the configuration VIP list are flagged as VIP.
    pub fn new(system: &'a mut SystemInfo, config: &ReducerConfig) -> Self {
        let system_id = system.id();
        let interline = system.interline() as f64;
        let (staves, sig) = system.parts_mut();

        let vips: Vec<InterId> = sig
            .live_inters()
            .filter(|id| {
                let doc_id = sig
                    .inter(*id)
                    .and_then(Inter::doc_id)
                    .unwrap_or(id.index());
                config.vip_inters().contains(&doc_id)
            })
            .collect();
        for id in vips {
            if let Some(inter) = sig.inter_mut(id) {
                inter.set_vip(true);
                info!(inter:% = id, shape:% = inter.shape(); "VIP inter");
            }
        }

        Self {
            system_id,
            staves,
            sig,
            params: Parameters {
                min_contextual_grade: config.min_contextual_grade(),
                good_grade: config.good_grade(),
                stem_end_margin: config.stem_end_margin().value() * interline,
                relaxed_margin: config.relaxed_margin(),
                interline,
            },
        }
    }

    /// Reduces the graph until it is stable.
    pub fn reduce(&mut self, mode: ReductionMode) {
        let start = Instant::now();
        info!(
            system = self.system_id,
            inters = self.sig.live_count(),
            mode:?;
            "Reducing interpretation graph"
        );

        self.detect_overlaps();
        self.detect_head_inconsistency();

        let mut rounds = 0;
        loop {
            rounds += 1;
            let mut deletions = self.purge_weak_inters();

            loop {
                let mut modifs = 0;

                modifs += self.check_heads();
                deletions += self.purge_weak_inters();

                modifs += self.check_flags();
                deletions += self.purge_weak_inters();

                modifs += self.check_beams();
                deletions += self.purge_weak_inters();

                modifs += self.check_hooks();
                deletions += self.purge_weak_inters();

                modifs += self.check_ledgers();
                deletions += self.purge_weak_inters();

                modifs += self.check_stems();
                deletions += self.purge_weak_inters();

                modifs += self.check_repeat_dots();
                modifs += self.check_augmentation_dots();
                modifs += self.check_augmented();
                deletions += self.purge_weak_inters();

                debug!(system = self.system_id, rounds, modifs; "Checks done");
                if modifs == 0 {
                    break;
                }
            }

            let reductions = self
                .sig
                .reduce_exclusions(mode, self.params.relaxed_margin);
            self.forget_ledgers(&reductions);
            debug!(
                system = self.system_id,
                rounds,
                reductions = reductions.len(),
                deletions;
                "Reduction round"
            );

            if reductions.is_empty() && deletions == 0 {
                break;
            }
        }

        info!(
            system = self.system_id,
            rounds,
            inters = self.sig.live_count(),
            elapsed_ms = start.elapsed().as_millis() as u64;
            "Interpretation graph reduced"
        );
    }

    /// Refreshes the contextual grade of every live inter.
    pub fn contextualize(&mut self) {
        self.sig.contextualize();
    }

    fn purge_weak_inters(&mut self) -> usize {
        self.contextualize();
        let deleted = self.sig.delete_weak_inters(self.params.min_contextual_grade);
        self.forget_ledgers(&deleted);
        self.sig.compact();
        deleted.len()
    }

    /// Unregisters deleted ledgers from their staff
    fn forget_ledgers(&mut self, deleted: &[InterId]) {
        for id in deleted {
            if self.sig.inter(*id).map(Inter::shape) == Some(Shape::Ledger) {
                for staff in self.staves.iter_mut() {
                    staff.remove_ledger(*id);
                }
            }
        }
    }

    fn level(&self, id: InterId) -> Level {
        if self.sig.inter(id).is_some_and(Inter::is_vip) {
            Level::Info
        } else {
            Level::Debug
        }
    }

    fn remove(&mut self, id: InterId, reason: &str) {
        log!(self.level(id), inter:% = id, shape:% = self.shape(id); "Deleting inter: {reason}");
        self.sig.remove_inter(id);
    }

    fn shape(&self, id: InterId) -> String {
        self.sig
            .inter(id)
            .map_or_else(String::new, |inter| inter.shape().to_string())
    }

    fn relations<F>(&self, id: InterId, predicate: F) -> Vec<RelationId>
    where
        F: Fn(&Relation) -> bool,
    {
        self.sig.relations_of(id, predicate)
    }

    // =========================================================================
    // One-shot detections
    // =========================================================================

    /// Inserts exclusions between overlapping inters not yet related.
    ///
    /// Ledgers, slurs and wedges are not considered, nor are pairs of shapes
    /// allowed to overlap.
    pub fn detect_overlaps(&mut self) {
        let mut inters = self
            .sig
            .inters_where(|inter| !inter.shape().skips_overlap_detection());
        inters.sort_by(|a, b| {
            let xa = self.sig.inter(*a).map_or(0.0, |i| i.bounds().min_x());
            let xb = self.sig.inter(*b).map_or(0.0, |i| i.bounds().min_x());
            xa.total_cmp(&xb).then(a.cmp(b))
        });

        let mut inserted = 0;
        for (i, left) in inters.iter().enumerate() {
            let Some(left_inter) = self.sig.inter(*left) else {
                continue;
            };
            let (left_shape, left_box) = (left_inter.shape(), left_inter.bounds());

            for right in &inters[i + 1..] {
                let Some(right_inter) = self.sig.inter(*right) else {
                    continue;
                };
                if compatible(left_shape, right_inter.shape()) {
                    continue;
                }
                let right_box = right_inter.bounds();

                if left_box.intersects(&right_box) {
                    if !self.sig.has_relation_between(*left, *right)
                        && self
                            .sig
                            .insert_exclusion(*left, *right, ExclusionCause::Overlap)
                            .is_ok()
                    {
                        inserted += 1;
                    }
                } else if right_box.min_x() > left_box.max_x() {
                    break;
                }
            }
        }
        debug!(system = self.system_id, inserted; "Overlaps detected");
    }

    /// Excludes heads of different shapes attached to the same good stem.
    pub fn detect_head_inconsistency(&mut self) {
        let good_grade = self.params.good_grade;
        let stems = self
            .sig
            .inters_where(|inter| inter.shape() == Shape::Stem && inter.is_good(good_grade));

        for stem in stems {
            let mut heads: IndexMap<Shape, Vec<InterId>> = IndexMap::new();
            for rel in self.relations(stem, |r| matches!(r, Relation::HeadStem { .. })) {
                if let Some(head) = self.sig.source(rel) {
                    let shape = self.sig.inter(head).map(Inter::shape);
                    if let Some(shape) = shape {
                        heads.entry(shape).or_default().push(head);
                    }
                }
            }

            let groups: Vec<&Vec<InterId>> = heads.values().collect();
            for (i, first) in groups.iter().enumerate() {
                for second in &groups[i + 1..] {
                    for a in first.iter() {
                        for b in second.iter() {
                            if let Err(err) =
                                self.sig.insert_exclusion(*a, *b, ExclusionCause::Incompatible)
                            {
                                debug!(err:%; "Head exclusion skipped");
                            }
                        }
                    }
                }
            }
        }
    }

    // =========================================================================
    // Checks
    // =========================================================================

    /// Deletes heads without stem and cuts heads lying on the wrong stem side.
    pub fn check_heads(&mut self) -> usize {
        let mut modifs = 0;
        for head in self.sig.inters_where(|inter| inter.shape().is_head()) {
            if !self.sig.is_live(head) {
                continue;
            }
            if !self.head_has_stem(head) {
                self.remove(head, "no stem");
                modifs += 1;
                continue;
            }
            modifs += self.check_head_side(head);
        }
        self.sig.compact();
        modifs
    }

    fn head_has_stem(&self, head: InterId) -> bool {
        !self
            .relations(head, |r| matches!(r, Relation::HeadStem { .. }))
            .is_empty()
    }

    /// Cuts the head stem relations where the head lies on the wrong side.
    ///
    /// A head is on the wrong side when it is on the right of a stem going
    /// up or on the left of a stem going down. This is accepted only when
    /// the stem holds, on the other side, a head one step or less away.
    /// Otherwise the relation is replaced by an exclusion.
    fn check_head_side(&mut self, head: InterId) -> usize {
        let Some(pitch) = self.sig.inter(head).and_then(Inter::pitch) else {
            return 0;
        };

        let mut modifs = 0;
        for rel in self.sig.outgoing_relations(head) {
            let Some(Relation::HeadStem { head_side, .. }) = self.sig.relation(rel).copied() else {
                continue;
            };
            let Some(stem) = self.sig.target(rel) else {
                continue;
            };

            let dir = self.stem_direction(stem);
            if dir == 0 {
                continue;
            }
            if (head_side == HorizontalSide::Left && dir > 0)
                || (head_side == HorizontalSide::Right && dir < 0)
            {
                continue;
            }

            let other_side = head_side.opposite();
            if (pitch - 1..=pitch + 1).any(|p| self.sig.lookup_head(stem, other_side, p).is_some())
            {
                continue;
            }

            log!(self.level(head), head:% = head, stem:% = stem, side:? = head_side; "Head on wrong stem side");
            self.sig.remove_relation(rel);
            if let Err(err) = self
                .sig
                .insert_exclusion(head, stem, ExclusionCause::Incompatible)
            {
                debug!(err:%; "Head stem exclusion skipped");
            }
            modifs += 1;
        }
        modifs
    }

    /// Deletes flags without stem.
    pub fn check_flags(&mut self) -> usize {
        let mut modifs = 0;
        for flag in self.sig.inters_where(|inter| inter.shape().is_flag()) {
            if self
                .relations(flag, |r| matches!(r, Relation::FlagStem { .. }))
                .is_empty()
            {
                self.remove(flag, "no stem");
                modifs += 1;
            }
        }
        self.sig.compact();
        modifs
    }

    /// Deletes beam hooks without stem on their left or right end.
    pub fn check_hooks(&mut self) -> usize {
        let mut modifs = 0;
        for hook in self.sig.inters_of(ShapeCategory::BeamHook) {
            if !self.hook_has_stem(hook) {
                self.remove(hook, "no stem");
                modifs += 1;
            }
        }
        self.sig.compact();
        modifs
    }

    fn beam_portions(&self, beam: InterId) -> Vec<BeamPortion> {
        self.relations(beam, |r| matches!(r, Relation::BeamStem { .. }))
            .into_iter()
            .filter_map(|rel| match self.sig.relation(rel) {
                Some(Relation::BeamStem { beam_portion, .. }) => Some(*beam_portion),
                _ => None,
            })
            .collect()
    }

    fn hook_has_stem(&self, hook: InterId) -> bool {
        self.beam_portions(hook)
            .iter()
            .any(|p| matches!(p, BeamPortion::Left | BeamPortion::Right))
    }

    /// Deletes full beams lacking a stem on either end.
    pub fn check_beams(&mut self) -> usize {
        let mut modifs = 0;
        for beam in self.sig.inters_of(ShapeCategory::FullBeam) {
            if !self.beam_has_both_stems(beam) {
                self.remove(beam, "lacking stem");
                modifs += 1;
            }
        }
        self.sig.compact();
        modifs
    }

    fn beam_has_both_stems(&self, beam: InterId) -> bool {
        let portions = self.beam_portions(beam);
        portions.contains(&BeamPortion::Left) && portions.contains(&BeamPortion::Right)
    }

    /// Deletes ledgers supported neither by a note nor by a further ledger.
    ///
    /// A deletion may orphan the next ledger outward, so the check loops
    /// until no ledger is deleted.
    pub fn check_ledgers(&mut self) -> usize {
        let mut notes = self.sig.inters_where(|inter| inter.shape().is_note());
        notes.sort_by(|a, b| {
            let xa = self.sig.inter(*a).map_or(0.0, |i| i.bounds().min_x());
            let xb = self.sig.inter(*b).map_or(0.0, |i| i.bounds().min_x());
            xa.total_cmp(&xb).then(a.cmp(b))
        });

        let mut modifs = 0;
        loop {
            let mut modified = false;

            for staff_index in 0..self.staves.len() {
                let entries: Vec<(i32, Vec<InterId>)> = self.staves[staff_index]
                    .ledger_map()
                    .iter()
                    .map(|(index, ledgers)| (*index, ledgers.clone()))
                    .collect();

                for (index, ledgers) in entries {
                    for ledger in ledgers {
                        if !self.sig.is_live(ledger) {
                            self.staves[staff_index].remove_ledger(ledger);
                            continue;
                        }
                        if !self.ledger_has_note_or_ledger(staff_index, index, ledger, &notes) {
                            self.remove(ledger, "orphan ledger");
                            self.staves[staff_index].remove_ledger(ledger);
                            modified = true;
                            modifs += 1;
                        }
                    }
                }
            }

            if !modified {
                break;
            }
        }
        self.sig.compact();
        modifs
    }

    fn ledger_has_note_or_ledger(
        &self,
        staff_index: usize,
        index: i32,
        ledger: InterId,
        notes: &[InterId],
    ) -> bool {
        let Some(ledger_inter) = self.sig.inter(ledger) else {
            return false;
        };
        let staff = &self.staves[staff_index];
        let ledger_box = ledger_inter.bounds().grow(0.0, self.params.interline);

        let next_index = index + index.signum();
        let chained = staff.ledgers(next_index).iter().any(|next| {
            self.sig
                .inter(*next)
                .filter(|i| !i.is_deleted())
                .is_some_and(|i| ledger_box.x_overlap(&i.bounds()) > 0.0)
        });
        if chained {
            return true;
        }

        let ledger_pitch = StaffInfo::ledger_pitch_position(index);
        let next_pitch = ledger_pitch + index.signum();
        notes
            .iter()
            .filter_map(|id| self.sig.inter(*id).filter(|i| !i.is_deleted()))
            .filter(|note| note.staff().is_none_or(|s| s == staff.id()))
            .filter(|note| note.bounds().intersects(&ledger_box))
            .any(|note| matches!(note.pitch(), Some(p) if p == ledger_pitch || p == next_pitch))
    }

    /// Deletes stems without head at one end and cuts heads on the tail end.
    pub fn check_stems(&mut self) -> usize {
        let mut modifs = 0;
        for stem in self.sig.inters_where(|inter| inter.shape() == Shape::Stem) {
            if !self.stem_has_head_at_end(stem) {
                self.remove(stem, "no head at end");
                modifs += 1;
                continue;
            }
            if !self.stem_has_single_head_end(stem) {
                modifs += 1;
            }
        }
        self.sig.compact();
        modifs
    }

    fn head_links(&self, stem: InterId) -> Vec<RelationId> {
        self.sig
            .incoming_relations(stem)
            .into_iter()
            .filter(|rel| matches!(self.sig.relation(*rel), Some(Relation::HeadStem { .. })))
            .collect()
    }

    /// Whether a head is attached to the top or bottom portion of the stem
    fn stem_has_head_at_end(&self, stem: InterId) -> bool {
        self.head_links(stem).into_iter().any(|rel| {
            self.sig
                .stem_portion(rel, self.params.stem_end_margin)
                .is_some_and(|p| p != StemPortion::Middle)
        })
    }

    /// Cuts the heads found on the tail end of the stem.
    ///
    /// Returns `true` if nothing had to be cut.
    fn stem_has_single_head_end(&mut self, stem: InterId) -> bool {
        let dir = self.stem_direction(stem);
        if dir == 0 {
            return true;
        }
        let forbidden = if dir > 0 {
            StemPortion::Bottom
        } else {
            StemPortion::Top
        };

        let to_cut: Vec<RelationId> = self
            .head_links(stem)
            .into_iter()
            .filter(|rel| self.sig.stem_portion(*rel, self.params.stem_end_margin) == Some(forbidden))
            .collect();

        for rel in &to_cut {
            if let Some(head) = self.sig.source(*rel) {
                log!(self.level(stem), stem:% = stem, head:% = head, portion:? = forbidden; "Cutting head on stem tail");
            }
            self.sig.remove_relation(*rel);
        }
        to_cut.is_empty()
    }

    /// Deletes repeat dots without sibling dot.
    pub fn check_repeat_dots(&mut self) -> usize {
        let mut modifs = 0;
        for dot in self.sig.inters_of(ShapeCategory::RepeatDot) {
            if self
                .relations(dot, |r| matches!(r, Relation::RepeatDotDot { .. }))
                .is_empty()
            {
                self.remove(dot, "no sibling");
                modifs += 1;
            }
        }
        self.sig.compact();
        modifs
    }

    /// Deletes augmentation dots with nothing to augment.
    pub fn check_augmentation_dots(&mut self) -> usize {
        let mut modifs = 0;
        for dot in self.sig.inters_of(ShapeCategory::AugmentationDot) {
            let has_target = !self
                .relations(dot, |r| {
                    matches!(r, Relation::Augmentation { .. } | Relation::DoubleDot { .. })
                })
                .is_empty();
            if !has_target {
                self.remove(dot, "no target");
                modifs += 1;
            }
        }
        self.sig.compact();
        modifs
    }

    /// Keeps at most one augmentation per note or rest.
    pub fn check_augmented(&mut self) -> usize {
        let mut modifs = 0;
        let entities = self
            .sig
            .inters_where(|inter| inter.shape().is_note() || inter.shape().is_rest());
        for entity in entities {
            let rels = self.relations(entity, |r| matches!(r, Relation::Augmentation { .. }));
            if rels.len() > 1 {
                modifs += self.reduce_augmentations(&rels);
                log!(self.level(entity), inter:% = entity; "Augmentations reduced");
            }
        }
        self.sig.compact();
        modifs
    }

    /// Keeps the augmentation of best grade and removes the others.
    ///
    /// Returns the number of removed relations.
    fn reduce_augmentations(&mut self, rels: &[RelationId]) -> usize {
        let best = rels.iter().copied().reduce(|best, rel| {
            let grade = |id| self.sig.relation(id).and_then(Relation::grade).unwrap_or(0.0);
            if grade(rel) > grade(best) { rel } else { best }
        });

        let mut removed = 0;
        for rel in rels {
            if Some(*rel) != best && self.sig.remove_relation(*rel) {
                removed += 1;
            }
        }
        removed
    }

    // =========================================================================
    // Stem direction
    // =========================================================================

    /// Direction of a stem, from head to tail.
    ///
    /// Returns -1 for a stem going up, 1 for a stem going down and 0 when
    /// undecidable. Links are considered by decreasing contextual grade of
    /// their source and the first conclusive one decides:
    ///
    /// - a head at the bottom on the right side or at the top on the left side
    /// - a beam at the top (up) or anywhere else (down)
    /// - a flag at the top (up) or at the bottom (down)
    pub fn stem_direction(&self, stem: InterId) -> i32 {
        let mut links: Vec<(RelationId, f64)> = self
            .sig
            .incoming_relations(stem)
            .into_iter()
            .filter(|rel| self.sig.relation(*rel).is_some_and(Relation::is_stem_connection))
            .map(|rel| {
                let grade = self
                    .sig
                    .source(rel)
                    .and_then(|s| self.sig.inter(s))
                    .map_or(0.0, Inter::contextual_grade);
                (rel, grade)
            })
            .collect();
        links.sort_by(|a, b| b.1.total_cmp(&a.1));

        for (rel, _) in links {
            let Some(portion) = self.sig.stem_portion(rel, self.params.stem_end_margin) else {
                continue;
            };
            match self.sig.relation(rel) {
                Some(Relation::HeadStem { head_side, .. }) => match (portion, *head_side) {
                    (StemPortion::Bottom, HorizontalSide::Right) => return -1,
                    (StemPortion::Top, HorizontalSide::Left) => return 1,
                    _ => {}
                },
                Some(Relation::BeamStem { .. }) => {
                    return if portion == StemPortion::Top { -1 } else { 1 };
                }
                Some(Relation::FlagStem { .. }) => match portion {
                    StemPortion::Top => return -1,
                    StemPortion::Bottom => return 1,
                    StemPortion::Middle => {}
                },
                _ => {}
            }
        }
        0
    }
}

#[cfg(test)]
mod tests {
    use scorescan_core::{
        geometry::{Bounds, Point, Segment},
        scale::Scale,
    };
    use scorescan_grid::{filament::LineGeometry, staff::FilamentLine};

    use super::*;

    fn staff(id: usize) -> StaffInfo {
        let lines = (0..5)
            .map(|i| {
                let y = 100.0 + 20.0 * i as f64;
                FilamentLine::from_geometry(LineGeometry::from_points(vec![
                    Point::new(0.0, y),
                    Point::new(500.0, y),
                ]))
            })
            .collect();
        StaffInfo::new(id, 0.0, 500.0, Scale::new(20, 3, 3).unwrap(), lines)
    }

    fn system() -> SystemInfo {
        SystemInfo::new(1, 20, vec![staff(1)])
    }

    fn inter(shape: Shape, grade: f64, x: f64, y: f64, w: f64, h: f64) -> Inter {
        Inter::new(shape, grade, Bounds::from_rect(x, y, w, h))
    }

    /// Stem from y=40 to y=100 at x=100
    fn stem(system: &mut SystemInfo, grade: f64) -> InterId {
        system.add_inter(inter(Shape::Stem, grade, 99.0, 40.0, 2.0, 60.0))
    }

    fn head_stem(side: HorizontalSide) -> Relation {
        Relation::HeadStem {
            head_side: side,
            grade: 0.8,
        }
    }

    fn beam_stem(portion: BeamPortion) -> Relation {
        Relation::BeamStem {
            beam_portion: portion,
            grade: 0.8,
        }
    }

    #[test]
    fn test_stem_direction_from_bottom_head() {
        let mut system = system();
        let stem = stem(&mut system, 0.8);
        let head = system.add_inter(
            inter(Shape::NoteheadBlack, 0.8, 88.0, 95.0, 11.0, 10.0).with_pitch(0),
        );
        system
            .sig_mut()
            .add_relation(head, stem, head_stem(HorizontalSide::Right))
            .unwrap();

        let config = ReducerConfig::default();
        let reducer = SigReducer::new(&mut system, &config);
        assert_eq!(reducer.stem_direction(stem), -1);
    }

    #[test]
    fn test_stem_direction_from_beam() {
        let mut system = system();
        let stem = stem(&mut system, 0.8);
        let beam = system.add_inter(
            inter(Shape::Beam, 0.8, 60.0, 38.0, 41.0, 6.0)
                .with_median(Segment::new(Point::new(60.0, 41.0), Point::new(101.0, 41.0))),
        );
        system
            .sig_mut()
            .add_relation(beam, stem, beam_stem(BeamPortion::Right))
            .unwrap();

        let config = ReducerConfig::default();
        let reducer = SigReducer::new(&mut system, &config);
        assert_eq!(reducer.stem_direction(stem), -1);
    }

    #[test]
    fn test_stem_direction_undecided() {
        let mut system = system();
        let stem = stem(&mut system, 0.8);
        // Head on the left of the stem bottom: no conclusion
        let head = system.add_inter(
            inter(Shape::NoteheadBlack, 0.8, 101.0, 95.0, 11.0, 10.0).with_pitch(0),
        );
        system
            .sig_mut()
            .add_relation(head, stem, head_stem(HorizontalSide::Left))
            .unwrap();

        let config = ReducerConfig::default();
        let reducer = SigReducer::new(&mut system, &config);
        assert_eq!(reducer.stem_direction(stem), 0);
    }

    #[test]
    fn test_head_on_wrong_side_is_cut() {
        let mut system = system();
        let stem = stem(&mut system, 0.8);
        let bottom = system.add_inter(
            inter(Shape::NoteheadBlack, 0.9, 88.0, 95.0, 11.0, 10.0).with_pitch(0),
        );
        let top = system.add_inter(
            inter(Shape::NoteheadBlack, 0.6, 101.0, 35.0, 11.0, 10.0).with_pitch(-6),
        );
        let sig = system.sig_mut();
        sig.add_relation(bottom, stem, head_stem(HorizontalSide::Right))
            .unwrap();
        sig.add_relation(top, stem, head_stem(HorizontalSide::Left))
            .unwrap();

        let config = ReducerConfig::default();
        let mut reducer = SigReducer::new(&mut system, &config);
        assert_eq!(reducer.check_heads(), 1);
        assert!(reducer.sig.exclusion_between(top, stem).is_some());

        // Left without stem, the head goes on the next run
        assert_eq!(reducer.check_heads(), 1);
        assert!(!system.sig().is_live(top));
        assert!(system.sig().is_live(bottom));
    }

    #[test]
    fn test_head_on_wrong_side_next_to_sibling_is_kept() {
        let mut system = system();
        let stem = stem(&mut system, 0.8);
        let bottom = system.add_inter(
            inter(Shape::NoteheadBlack, 0.9, 88.0, 95.0, 11.0, 10.0).with_pitch(0),
        );
        let second = system.add_inter(
            inter(Shape::NoteheadBlack, 0.6, 101.0, 85.0, 11.0, 10.0).with_pitch(-1),
        );
        let sig = system.sig_mut();
        sig.add_relation(bottom, stem, head_stem(HorizontalSide::Right))
            .unwrap();
        sig.add_relation(second, stem, head_stem(HorizontalSide::Left))
            .unwrap();

        let config = ReducerConfig::default();
        let mut reducer = SigReducer::new(&mut system, &config);
        assert_eq!(reducer.check_heads(), 0);
        assert!(system.sig().exclusion_between(second, stem).is_none());
    }

    #[test]
    fn test_stem_without_end_head_is_deleted() {
        let mut system = system();
        let stem = stem(&mut system, 0.8);
        let head = system.add_inter(
            inter(Shape::NoteheadBlack, 0.8, 88.0, 65.0, 11.0, 10.0).with_pitch(-4),
        );
        system
            .sig_mut()
            .add_relation(head, stem, head_stem(HorizontalSide::Right))
            .unwrap();

        let config = ReducerConfig::default();
        let mut reducer = SigReducer::new(&mut system, &config);
        assert_eq!(reducer.check_stems(), 1);
        assert!(!system.sig().is_live(stem));
        assert!(system.sig().is_live(head));
    }

    #[test]
    fn test_head_on_stem_tail_is_cut() {
        let mut system = system();
        let stem = stem(&mut system, 0.8);
        let bottom = system.add_inter(
            inter(Shape::NoteheadBlack, 0.9, 88.0, 95.0, 11.0, 10.0).with_pitch(0),
        );
        let tail = system.add_inter(
            inter(Shape::NoteheadBlack, 0.6, 88.0, 35.0, 11.0, 10.0).with_pitch(-6),
        );
        let sig = system.sig_mut();
        sig.add_relation(bottom, stem, head_stem(HorizontalSide::Right))
            .unwrap();
        let cut = sig
            .add_relation(tail, stem, head_stem(HorizontalSide::Right))
            .unwrap();

        let config = ReducerConfig::default();
        let mut reducer = SigReducer::new(&mut system, &config);
        assert_eq!(reducer.check_stems(), 1);
        assert_eq!(reducer.check_stems(), 0);
        assert!(system.sig().relation(cut).is_none());
        assert!(system.sig().is_live(stem));
    }

    #[test]
    fn test_beam_needs_both_stems() {
        let mut system = system();
        let left = stem(&mut system, 0.8);
        let beam = system.add_inter(inter(Shape::Beam, 0.8, 99.0, 38.0, 60.0, 6.0));
        let hook = system.add_inter(inter(Shape::BeamHook, 0.8, 99.0, 48.0, 15.0, 6.0));
        let sig = system.sig_mut();
        sig.add_relation(beam, left, beam_stem(BeamPortion::Left))
            .unwrap();
        sig.add_relation(hook, left, beam_stem(BeamPortion::Left))
            .unwrap();

        let config = ReducerConfig::default();
        let mut reducer = SigReducer::new(&mut system, &config);
        assert_eq!(reducer.check_beams(), 1);
        assert_eq!(reducer.check_hooks(), 0);
        assert!(!system.sig().is_live(beam));
        assert!(system.sig().is_live(hook));
    }

    #[test]
    fn test_hook_on_center_is_deleted() {
        let mut system = system();
        let stem = stem(&mut system, 0.8);
        let hook = system.add_inter(inter(Shape::BeamHook, 0.8, 92.0, 48.0, 15.0, 6.0));
        system
            .sig_mut()
            .add_relation(hook, stem, beam_stem(BeamPortion::Center))
            .unwrap();

        let config = ReducerConfig::default();
        let mut reducer = SigReducer::new(&mut system, &config);
        assert_eq!(reducer.check_hooks(), 1);
    }

    #[test]
    fn test_orphan_flag_and_dots() {
        let mut system = system();
        let flag = system.add_inter(inter(Shape::FlagUp1, 0.8, 200.0, 40.0, 10.0, 30.0));
        let dot = system.add_inter(inter(Shape::AugmentationDot, 0.8, 250.0, 110.0, 4.0, 4.0));
        let repeat = system.add_inter(inter(Shape::RepeatDot, 0.8, 300.0, 125.0, 4.0, 4.0));

        let config = ReducerConfig::default();
        let mut reducer = SigReducer::new(&mut system, &config);
        assert_eq!(reducer.check_flags(), 1);
        assert_eq!(reducer.check_augmentation_dots(), 1);
        assert_eq!(reducer.check_repeat_dots(), 1);
        assert_eq!(system.sig().live_count(), 0);
        assert!(!system.sig().is_live(flag));
        assert!(!system.sig().is_live(dot));
        assert!(!system.sig().is_live(repeat));
    }

    #[test]
    fn test_best_augmentation_is_kept() {
        let mut system = system();
        let note = system.add_inter(
            inter(Shape::WholeNote, 0.8, 100.0, 135.0, 16.0, 10.0).with_pitch(0),
        );
        let mut links = Vec::new();
        for (i, grade) in [0.4, 0.9, 0.6].into_iter().enumerate() {
            let dot = system.add_inter(inter(
                Shape::AugmentationDot,
                0.8,
                120.0 + 8.0 * i as f64,
                138.0,
                4.0,
                4.0,
            ));
            let rel = system
                .sig_mut()
                .add_relation(dot, note, Relation::Augmentation { grade })
                .unwrap();
            links.push(rel);
        }

        let config = ReducerConfig::default();
        let mut reducer = SigReducer::new(&mut system, &config);
        assert_eq!(reducer.check_augmented(), 2);
        assert_eq!(reducer.check_augmented(), 0);

        let sig = system.sig();
        assert!(sig.relation(links[0]).is_none());
        assert!(sig.relation(links[1]).is_some());
        assert!(sig.relation(links[2]).is_none());
    }

    fn ledger(system: &mut SystemInfo, index: i32, y: f64) -> InterId {
        system.add_inter(
            inter(Shape::Ledger, 0.8, 90.0, y, 30.0, 3.0)
                .with_staff(1)
                .with_ledger_index(index),
        )
    }

    #[test]
    fn test_ledgers_chain_to_note() {
        let mut system = system();
        let first = ledger(&mut system, -1, 79.0);
        let second = ledger(&mut system, -2, 59.0);
        system.add_inter(
            inter(Shape::NoteheadBlack, 0.8, 95.0, 55.0, 14.0, 10.0)
                .with_pitch(-8)
                .with_staff(1),
        );

        let config = ReducerConfig::default();
        let mut reducer = SigReducer::new(&mut system, &config);
        assert_eq!(reducer.check_ledgers(), 0);
        assert!(system.sig().is_live(first));
        assert!(system.sig().is_live(second));
    }

    #[test]
    fn test_orphan_ledgers_cascade() {
        let mut system = system();
        let first = ledger(&mut system, -1, 79.0);
        let second = ledger(&mut system, -2, 59.0);
        // Note of another staff
        system.add_inter(
            inter(Shape::NoteheadBlack, 0.8, 95.0, 55.0, 14.0, 10.0)
                .with_pitch(-8)
                .with_staff(2),
        );

        let config = ReducerConfig::default();
        let mut reducer = SigReducer::new(&mut system, &config);
        assert_eq!(reducer.check_ledgers(), 2);
        assert!(!system.sig().is_live(first));
        assert!(!system.sig().is_live(second));
        assert!(system.staff(1).unwrap().ledger_map().is_empty());
    }

    #[test]
    fn test_orphan_ledgers_below_staff_cascade_inward() {
        let mut system = system();
        let first = ledger(&mut system, 1, 199.0);
        let second = ledger(&mut system, 2, 219.0);

        let config = ReducerConfig::default();
        let mut reducer = SigReducer::new(&mut system, &config);
        // The outer ledger falls first, then the one it was holding
        assert_eq!(reducer.check_ledgers(), 2);
        assert_eq!(reducer.check_ledgers(), 0);
        assert!(!system.sig().is_live(first));
        assert!(!system.sig().is_live(second));
        assert!(system.staff(1).unwrap().ledger_map().is_empty());
    }

    #[test]
    fn test_overlaps_are_excluded() {
        let mut system = system();
        let sharp = system.add_inter(inter(Shape::Sharp, 0.7, 0.0, 0.0, 8.0, 20.0));
        let flat = system.add_inter(inter(Shape::Flat, 0.6, 4.0, 5.0, 8.0, 20.0));
        let beam = system.add_inter(inter(Shape::Beam, 0.7, 100.0, 0.0, 50.0, 6.0));
        let hook = system.add_inter(inter(Shape::BeamHook, 0.7, 110.0, 2.0, 10.0, 6.0));
        let far = system.add_inter(inter(Shape::Natural, 0.7, 300.0, 0.0, 8.0, 20.0));

        let config = ReducerConfig::default();
        let mut reducer = SigReducer::new(&mut system, &config);
        reducer.detect_overlaps();

        let sig = system.sig();
        assert!(sig.exclusion_between(sharp, flat).is_some());
        assert!(sig.exclusion_between(beam, hook).is_none());
        assert!(sig.edges_of(far).is_empty());
        assert_eq!(sig.live_relations().count(), 1);
    }

    #[test]
    fn test_head_kinds_on_good_stem_are_excluded() {
        let mut system = system();
        let stem = stem(&mut system, 0.8);
        let black = system.add_inter(
            inter(Shape::NoteheadBlack, 0.8, 88.0, 95.0, 11.0, 10.0).with_pitch(0),
        );
        let void = system.add_inter(
            inter(Shape::NoteheadVoid, 0.7, 101.0, 85.0, 11.0, 10.0).with_pitch(-1),
        );
        let sig = system.sig_mut();
        sig.add_relation(black, stem, head_stem(HorizontalSide::Right))
            .unwrap();
        sig.add_relation(void, stem, head_stem(HorizontalSide::Left))
            .unwrap();

        let config = ReducerConfig::default();
        let mut reducer = SigReducer::new(&mut system, &config);
        reducer.detect_head_inconsistency();
        assert!(system.sig().exclusion_between(black, void).is_some());
    }

    #[test]
    fn test_reduce_keeps_supported_note() {
        let mut system = system();
        let stem = stem(&mut system, 0.7);
        let head = system.add_inter(
            inter(Shape::NoteheadBlack, 0.6, 88.0, 95.0, 11.0, 10.0).with_pitch(0),
        );
        let flag = system.add_inter(inter(Shape::FlagDown1, 0.45, 200.0, 40.0, 10.0, 30.0));
        system
            .sig_mut()
            .add_relation(head, stem, head_stem(HorizontalSide::Right))
            .unwrap();

        let config = ReducerConfig::default();
        let mut reducer = SigReducer::new(&mut system, &config);
        reducer.reduce(ReductionMode::Strict);

        let sig = system.sig();
        assert!(sig.is_live(stem));
        assert!(sig.is_live(head));
        assert!(!sig.is_live(flag));
        assert!(sig.inter(head).unwrap().contextual_grade() > 0.6);
    }

    #[test]
    fn test_vip_inters_are_flagged() {
        let mut system = system();
        let first = system.add_inter(inter(Shape::Sharp, 0.7, 0.0, 0.0, 8.0, 20.0));
        let second = system.add_inter(inter(Shape::Flat, 0.7, 40.0, 0.0, 8.0, 20.0).with_doc_id(7));

        let config = ReducerConfig::default().with_vip_inters(vec![0, 7]);
        SigReducer::new(&mut system, &config);

        assert!(system.sig().inter(first).unwrap().is_vip());
        assert!(system.sig().inter(second).unwrap().is_vip());
    }
}
