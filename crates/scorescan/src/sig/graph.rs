//! The symbol interpretation graph of a system.
//!
//! # Architecture
//!
//! Inters and relations live in two arenas indexed by [`InterId`] and
//! [`RelationId`]. Ids are never reused: removing an inter or a relation
//! only sets a tombstone, so ids collected before a removal stay valid and
//! simply report a dead entry afterwards.
//!
//! Each inter keeps the ids of its outgoing and incoming relations. Dead
//! relation ids are filtered out on every query and physically dropped by
//! [`SIGraph::compact`].

use std::collections::HashSet;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use scorescan_core::{
    geometry::{HorizontalSide, Point, Segment},
    identifier::{InterId, RelationId},
    shape::ShapeCategory,
};

use super::{
    inter::Inter,
    relation::{ExclusionCause, Relation, StemPortion},
};
use crate::error::SigError;

/// Strategy used to resolve the remaining exclusions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionMode {
    /// Every exclusion partner of a winner is removed
    #[default]
    Strict,
    /// Partners graded close to the winner are kept, only the exclusion is cut
    Relaxed,
}

// =============================================================================
// Internal storage
// =============================================================================

#[derive(Debug, Clone)]
struct Edge {
    source: InterId,
    target: InterId,
    relation: Relation,
    removed: bool,
}

/// Directed multigraph of inters and relations for one system.
#[derive(Debug, Clone, Default)]
pub struct SIGraph {
    inters: Vec<Inter>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<RelationId>>,
    incoming: Vec<Vec<RelationId>>,
}

impl SIGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Vertices
    // =========================================================================

    /// Inserts an inter and returns its id.
    pub fn add_inter(&mut self, inter: Inter) -> InterId {
        let id = InterId::new(self.inters.len());
        self.inters.push(inter);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    /// Inter with the given id, deleted ones included
    pub fn inter(&self, id: InterId) -> Option<&Inter> {
        self.inters.get(id.index())
    }

    pub fn inter_mut(&mut self, id: InterId) -> Option<&mut Inter> {
        self.inters.get_mut(id.index())
    }

    pub fn is_live(&self, id: InterId) -> bool {
        self.inter(id).is_some_and(|inter| !inter.is_deleted())
    }

    /// Number of inters ever inserted
    pub fn inter_count(&self) -> usize {
        self.inters.len()
    }

    pub fn live_count(&self) -> usize {
        self.inters.iter().filter(|i| !i.is_deleted()).count()
    }

    /// Ids of the live inters, in insertion order
    pub fn live_inters(&self) -> impl Iterator<Item = InterId> + '_ {
        self.inters
            .iter()
            .enumerate()
            .filter(|(_, inter)| !inter.is_deleted())
            .map(|(i, _)| InterId::new(i))
    }

    /// Ids of the live inters matching the predicate
    pub fn inters_where<F>(&self, predicate: F) -> Vec<InterId>
    where
        F: Fn(&Inter) -> bool,
    {
        self.live_inters()
            .filter(|id| self.inter(*id).is_some_and(&predicate))
            .collect()
    }

    /// Ids of the live inters of the given category
    pub fn inters_of(&self, category: ShapeCategory) -> Vec<InterId> {
        self.inters_where(|inter| inter.shape().category() == category)
    }

    /// Deletes an inter and all its relations.
    ///
    /// Returns `false` if the inter was already deleted or does not exist.
    pub fn remove_inter(&mut self, id: InterId) -> bool {
        if !self.is_live(id) {
            return false;
        }
        let related: Vec<RelationId> = self.outgoing[id.index()]
            .iter()
            .chain(&self.incoming[id.index()])
            .copied()
            .collect();
        for rel in related {
            self.remove_relation(rel);
        }
        if let Some(inter) = self.inter_mut(id) {
            inter.mark_deleted();
        }
        true
    }

    // =========================================================================
    // Edges
    // =========================================================================

    /// Inserts a relation from `source` to `target`.
    ///
    /// Exclusions are routed through [`insert_exclusion`](Self::insert_exclusion).
    ///
    /// # Errors
    ///
    /// Returns [`SigError::DeadInter`] if an end is not live and
    /// [`SigError::SelfRelation`] if both ends are the same inter.
    pub fn add_relation(
        &mut self,
        source: InterId,
        target: InterId,
        relation: Relation,
    ) -> Result<RelationId, SigError> {
        if let Relation::Exclusion { cause } = relation {
            return self.insert_exclusion(source, target, cause);
        }
        self.check_ends(source, target)?;
        Ok(self.push_edge(source, target, relation))
    }

    /// Inserts an exclusion between two inters, unless one already exists.
    ///
    /// Returns the id of the new or existing exclusion.
    ///
    /// # Errors
    ///
    /// Same as [`add_relation`](Self::add_relation).
    pub fn insert_exclusion(
        &mut self,
        a: InterId,
        b: InterId,
        cause: ExclusionCause,
    ) -> Result<RelationId, SigError> {
        self.check_ends(a, b)?;
        if let Some(existing) = self.exclusion_between(a, b) {
            return Ok(existing);
        }
        let (source, target) = if a < b { (a, b) } else { (b, a) };
        let id = self.push_edge(source, target, Relation::Exclusion { cause });
        if self.is_vip(a) || self.is_vip(b) {
            info!(relation:% = id, a:% = a, b:% = b, cause:?; "VIP exclusion inserted");
        }
        Ok(id)
    }

    fn check_ends(&self, a: InterId, b: InterId) -> Result<(), SigError> {
        for id in [a, b] {
            if !self.is_live(id) {
                return Err(SigError::DeadInter(id));
            }
        }
        if a == b {
            return Err(SigError::SelfRelation(a));
        }
        Ok(())
    }

    fn push_edge(&mut self, source: InterId, target: InterId, relation: Relation) -> RelationId {
        let id = RelationId::new(self.edges.len());
        self.edges.push(Edge {
            source,
            target,
            relation,
            removed: false,
        });
        self.outgoing[source.index()].push(id);
        self.incoming[target.index()].push(id);
        id
    }

    fn live_edge(&self, id: RelationId) -> Option<&Edge> {
        self.edges.get(id.index()).filter(|e| !e.removed)
    }

    /// Live relation with the given id
    pub fn relation(&self, id: RelationId) -> Option<&Relation> {
        self.live_edge(id).map(|e| &e.relation)
    }

    pub fn source(&self, id: RelationId) -> Option<InterId> {
        self.live_edge(id).map(|e| e.source)
    }

    pub fn target(&self, id: RelationId) -> Option<InterId> {
        self.live_edge(id).map(|e| e.target)
    }

    /// The other end of a relation
    pub fn opposite(&self, id: RelationId, inter: InterId) -> Option<InterId> {
        let edge = self.live_edge(id)?;
        if edge.source == inter {
            Some(edge.target)
        } else if edge.target == inter {
            Some(edge.source)
        } else {
            None
        }
    }

    /// Ids of every live relation
    pub fn live_relations(&self) -> impl Iterator<Item = RelationId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| !edge.removed)
            .map(|(i, _)| RelationId::new(i))
    }

    pub fn outgoing_relations(&self, inter: InterId) -> Vec<RelationId> {
        self.alive(self.outgoing.get(inter.index()))
    }

    pub fn incoming_relations(&self, inter: InterId) -> Vec<RelationId> {
        self.alive(self.incoming.get(inter.index()))
    }

    fn alive(&self, ids: Option<&Vec<RelationId>>) -> Vec<RelationId> {
        ids.into_iter()
            .flatten()
            .copied()
            .filter(|id| self.live_edge(*id).is_some())
            .collect()
    }

    /// Live relations of an inter, outgoing first
    pub fn edges_of(&self, inter: InterId) -> Vec<RelationId> {
        let mut ids = self.outgoing_relations(inter);
        ids.extend(self.incoming_relations(inter));
        ids
    }

    /// Live relations of an inter matching the predicate
    pub fn relations_of<F>(&self, inter: InterId, predicate: F) -> Vec<RelationId>
    where
        F: Fn(&Relation) -> bool,
    {
        self.edges_of(inter)
            .into_iter()
            .filter(|id| self.relation(*id).is_some_and(&predicate))
            .collect()
    }

    /// Live relations going from `source` to `target`
    pub fn edges_between(&self, source: InterId, target: InterId) -> Vec<RelationId> {
        self.outgoing_relations(source)
            .into_iter()
            .filter(|id| self.target(*id) == Some(target))
            .collect()
    }

    /// Whether any live relation links the two inters, in either direction
    pub fn has_relation_between(&self, a: InterId, b: InterId) -> bool {
        !self.edges_between(a, b).is_empty() || !self.edges_between(b, a).is_empty()
    }

    /// Live exclusion between two inters, in either direction
    pub fn exclusion_between(&self, a: InterId, b: InterId) -> Option<RelationId> {
        self.edges_between(a, b)
            .into_iter()
            .chain(self.edges_between(b, a))
            .find(|id| self.relation(*id).is_some_and(Relation::is_exclusion))
    }

    /// Removes a relation.
    ///
    /// Returns `false` if it was already removed or does not exist.
    pub fn remove_relation(&mut self, id: RelationId) -> bool {
        match self.edges.get_mut(id.index()) {
            Some(edge) if !edge.removed => {
                edge.removed = true;
                true
            }
            _ => false,
        }
    }

    /// Drops dead relation ids from the adjacency lists.
    pub fn compact(&mut self) {
        let edges = &self.edges;
        for list in self.outgoing.iter_mut().chain(self.incoming.iter_mut()) {
            list.retain(|id| edges.get(id.index()).is_some_and(|e| !e.removed));
        }
    }

    // =========================================================================
    // Grades
    // =========================================================================

    /// Computes the contextual grade of an inter from its supporting partners.
    ///
    /// With `g` the intrinsic grade, every support relation brings
    /// `partner_grade * coeff * link_grade` to the total support `c`, using
    /// the coefficient of the side the inter stands on. The contextual grade
    /// is `g * (1 + c) / (1 + g * c)`.
    ///
    /// # Errors
    ///
    /// Returns [`SigError::DeadInter`] for a deleted inter and
    /// [`SigError::NonFiniteGrade`] when the computation degenerates.
    pub fn contextual_grade_of(&self, id: InterId) -> Result<f64, SigError> {
        let inter = self
            .inter(id)
            .filter(|i| !i.is_deleted())
            .ok_or(SigError::DeadInter(id))?;
        let grade = inter.grade();

        let mut support = 0.0;
        for rel in self.edges_of(id) {
            let Some(edge) = self.live_edge(rel) else {
                continue;
            };
            let Some(link_grade) = edge.relation.grade() else {
                continue;
            };
            let (partner, coeff) = if edge.source == id {
                (edge.target, edge.relation.source_coeff())
            } else {
                (edge.source, edge.relation.target_coeff())
            };
            let partner_grade = self.inter(partner).map_or(0.0, Inter::grade);
            let ratio = 1.0 + coeff * link_grade;
            support += partner_grade * (ratio - 1.0);
        }

        let value = grade * (1.0 + support) / (1.0 + grade * support);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(SigError::NonFiniteGrade { inter: id, value })
        }
    }

    /// Refreshes the contextual grade of every live inter.
    ///
    /// An inter whose grade cannot be computed keeps its intrinsic grade.
    pub fn contextualize(&mut self) {
        let grades: Vec<(InterId, f64)> = self
            .live_inters()
            .map(|id| {
                let grade = self.contextual_grade_of(id).unwrap_or_else(|err| {
                    warn!(inter:% = id, err:%; "Contextual grade failed");
                    self.inter(id).map_or(0.0, Inter::grade)
                });
                (id, grade)
            })
            .collect();

        for (id, grade) in grades {
            if let Some(inter) = self.inter_mut(id) {
                inter.set_contextual_grade(grade);
            }
        }
    }

    /// Deletes the live inters whose contextual grade is below `min_grade`.
    ///
    /// Returns the deleted inters.
    pub fn delete_weak_inters(&mut self, min_grade: f64) -> Vec<InterId> {
        let weak = self.inters_where(|inter| inter.contextual_grade() < min_grade);
        for id in &weak {
            if let Some(inter) = self.inter(*id) {
                if inter.is_vip() {
                    info!(inter:% = id, grade:% = inter; "VIP deleting weak inter");
                } else {
                    debug!(inter:% = id, grade:% = inter; "Deleting weak inter");
                }
            }
            self.remove_inter(*id);
        }
        weak
    }

    /// Resolves the remaining exclusions.
    ///
    /// The live inter of highest contextual grade involved in an exclusion
    /// wins over its exclusion partners, until no exclusion remains. In
    /// [`ReductionMode::Relaxed`], a partner whose contextual grade is within
    /// `relaxed_margin` of the winner survives and only the exclusion is cut.
    ///
    /// Returns the removed inters.
    pub fn reduce_exclusions(&mut self, mode: ReductionMode, relaxed_margin: f64) -> Vec<InterId> {
        let mut removed = Vec::new();

        while let Some(winner) = self.best_excluding_inter() {
            let winner_grade = self.inter(winner).map_or(0.0, Inter::contextual_grade);
            let vip = self.is_vip(winner);

            for rel in self.relations_of(winner, Relation::is_exclusion) {
                let Some(partner) = self.opposite(rel, winner) else {
                    continue;
                };
                let partner_grade = self.inter(partner).map_or(0.0, Inter::contextual_grade);
                let spared =
                    mode == ReductionMode::Relaxed && winner_grade - partner_grade <= relaxed_margin;

                if vip || self.is_vip(partner) {
                    info!(
                        winner:% = winner,
                        partner:% = partner,
                        winner_grade,
                        partner_grade,
                        spared;
                        "VIP exclusion resolved"
                    );
                }
                if spared {
                    self.remove_relation(rel);
                } else if self.remove_inter(partner) {
                    removed.push(partner);
                }
            }
        }

        self.compact();
        debug!(mode:?, removed = removed.len(); "Exclusions reduced");
        removed
    }

    /// Live inter of highest contextual grade having a live exclusion
    fn best_excluding_inter(&self) -> Option<InterId> {
        let mut involved: Vec<InterId> = self
            .live_relations()
            .filter(|id| self.relation(*id).is_some_and(Relation::is_exclusion))
            .filter_map(|id| self.live_edge(id).map(|e| [e.source, e.target]))
            .flatten()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        involved.sort();
        involved.into_iter().max_by(|a, b| {
            let ga = self.inter(*a).map_or(0.0, Inter::contextual_grade);
            let gb = self.inter(*b).map_or(0.0, Inter::contextual_grade);
            ga.total_cmp(&gb).then(b.cmp(a))
        })
    }

    fn is_vip(&self, id: InterId) -> bool {
        self.inter(id).is_some_and(Inter::is_vip)
    }

    // =========================================================================
    // Stems
    // =========================================================================

    /// Axis of a stem, from its median or else from the middle of its box
    pub fn stem_line(&self, stem: InterId) -> Option<Segment> {
        let inter = self.inter(stem)?;
        let line = inter.median().unwrap_or_else(|| {
            let bounds = inter.bounds();
            let x = bounds.center().x();
            Segment::new(Point::new(x, bounds.min_y()), Point::new(x, bounds.max_y()))
        });
        Some(line)
    }

    /// Portion of the stem a stem connection is attached to.
    ///
    /// The connection ordinate is compared with the stem ends: within
    /// `margin` pixels of the top it is [`StemPortion::Top`], within `margin`
    /// of the bottom it is [`StemPortion::Bottom`].
    pub fn stem_portion(&self, rel: RelationId, margin: f64) -> Option<StemPortion> {
        let edge = self.live_edge(rel)?;
        if !edge.relation.is_stem_connection() {
            return None;
        }
        let line = self.stem_line(edge.target)?;
        let (top, bottom) = (line.top().y(), line.bottom().y());
        let source = self.inter(edge.source)?;
        let bounds = source.bounds();

        let y = match edge.relation {
            Relation::BeamStem { .. } => {
                let x = line.p1().midpoint(line.p2()).x();
                source
                    .median()
                    .map_or(bounds.center().y(), |median| median.y_at(x))
            }
            Relation::FlagStem { .. } => {
                // The flag end lying on the stem
                if bounds.center().y() < (top + bottom) / 2.0 {
                    bounds.min_y()
                } else {
                    bounds.max_y()
                }
            }
            _ => bounds.center().y(),
        };

        let near_top = y <= top + margin;
        let near_bottom = y >= bottom - margin;
        let portion = match (near_top, near_bottom) {
            (true, true) if y - top <= bottom - y => StemPortion::Top,
            (true, true) => StemPortion::Bottom,
            (true, false) => StemPortion::Top,
            (false, true) => StemPortion::Bottom,
            (false, false) => StemPortion::Middle,
        };
        Some(portion)
    }

    /// Head attached to the stem on the given side, at the given pitch
    pub fn lookup_head(&self, stem: InterId, side: HorizontalSide, pitch: i32) -> Option<InterId> {
        self.incoming_relations(stem).into_iter().find_map(|rel| {
            let Some(Relation::HeadStem { head_side, .. }) = self.relation(rel) else {
                return None;
            };
            let head = self.source(rel)?;
            (*head_side == side && self.inter(head)?.pitch() == Some(pitch)).then_some(head)
        })
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use scorescan_core::{geometry::Bounds, shape::Shape};

    use super::*;
    use crate::sig::relation::BeamPortion;

    fn inter(shape: Shape, grade: f64, x: f64, y: f64, w: f64, h: f64) -> Inter {
        Inter::new(shape, grade, Bounds::from_rect(x, y, w, h))
    }

    #[test]
    fn test_exclusion_is_unique_and_symmetric() {
        let mut sig = SIGraph::new();
        let a = sig.add_inter(inter(Shape::NoteheadBlack, 0.6, 0.0, 0.0, 10.0, 10.0));
        let b = sig.add_inter(inter(Shape::Sharp, 0.6, 5.0, 0.0, 10.0, 10.0));

        let first = sig.insert_exclusion(b, a, ExclusionCause::Overlap).unwrap();
        let second = sig.insert_exclusion(a, b, ExclusionCause::Incompatible).unwrap();

        assert_eq!(first, second);
        assert!(sig.has_relation_between(a, b));
        assert!(sig.has_relation_between(b, a));
        assert_eq!(sig.live_relations().count(), 1);
    }

    #[test]
    fn test_relation_ends_must_be_live() {
        let mut sig = SIGraph::new();
        let a = sig.add_inter(inter(Shape::NoteheadBlack, 0.6, 0.0, 0.0, 10.0, 10.0));
        let b = sig.add_inter(inter(Shape::Stem, 0.6, 10.0, -30.0, 2.0, 40.0));
        sig.remove_inter(b);

        let link = Relation::HeadStem {
            head_side: HorizontalSide::Left,
            grade: 0.5,
        };
        assert!(matches!(
            sig.add_relation(a, b, link),
            Err(SigError::DeadInter(id)) if id == b
        ));
        assert!(matches!(
            sig.add_relation(a, a, link),
            Err(SigError::SelfRelation(_))
        ));
    }

    #[test]
    fn test_remove_inter_removes_its_relations() {
        let mut sig = SIGraph::new();
        let head = sig.add_inter(inter(Shape::NoteheadBlack, 0.6, 0.0, 0.0, 10.0, 10.0));
        let stem = sig.add_inter(inter(Shape::Stem, 0.6, 10.0, -30.0, 2.0, 40.0));
        let rel = sig
            .add_relation(
                head,
                stem,
                Relation::HeadStem {
                    head_side: HorizontalSide::Left,
                    grade: 0.5,
                },
            )
            .unwrap();

        assert!(sig.remove_inter(stem));
        assert!(!sig.remove_inter(stem));
        assert!(sig.relation(rel).is_none());
        assert!(sig.edges_of(head).is_empty());
        assert_eq!(sig.live_count(), 1);

        // Ids stay valid after compaction
        sig.compact();
        assert!(sig.inter(stem).is_some_and(Inter::is_deleted));
    }

    #[test]
    fn test_contextual_grade_formula() {
        let mut sig = SIGraph::new();
        let head = sig.add_inter(inter(Shape::NoteheadBlack, 0.5, 0.0, 0.0, 10.0, 10.0));
        let stem = sig.add_inter(inter(Shape::Stem, 0.8, 10.0, -30.0, 2.0, 40.0));
        sig.add_relation(
            head,
            stem,
            Relation::HeadStem {
                head_side: HorizontalSide::Left,
                grade: 0.5,
            },
        )
        .unwrap();

        // Head: c = 0.8 * 2.0 * 0.5 = 0.8, cg = 0.5 * 1.8 / 1.4
        assert_approx_eq!(f64, sig.contextual_grade_of(head).unwrap(), 0.9 / 1.4);
        // Stem: c = 0.5 * 2.0 * 0.5 = 0.5, cg = 0.8 * 1.5 / 1.4
        assert_approx_eq!(f64, sig.contextual_grade_of(stem).unwrap(), 1.2 / 1.4);

        sig.contextualize();
        assert_approx_eq!(
            f64,
            sig.inter(head).unwrap().contextual_grade(),
            0.9 / 1.4
        );
    }

    #[test]
    fn test_unsupported_grade_is_unchanged() {
        let mut sig = SIGraph::new();
        let clef = sig.add_inter(inter(Shape::GClef, 0.42, 0.0, 0.0, 20.0, 60.0));
        assert_approx_eq!(f64, sig.contextual_grade_of(clef).unwrap(), 0.42);
    }

    #[test]
    fn test_delete_weak_inters() {
        let mut sig = SIGraph::new();
        let weak = sig.add_inter(inter(Shape::Sharp, 0.3, 0.0, 0.0, 10.0, 10.0));
        let strong = sig.add_inter(inter(Shape::Flat, 0.7, 20.0, 0.0, 10.0, 10.0));
        sig.contextualize();

        assert_eq!(sig.delete_weak_inters(0.5), vec![weak]);
        assert!(!sig.is_live(weak));
        assert!(sig.is_live(strong));
    }

    #[test]
    fn test_reduce_exclusions_strict() {
        let mut sig = SIGraph::new();
        let a = sig.add_inter(inter(Shape::Sharp, 0.9, 0.0, 0.0, 10.0, 10.0));
        let b = sig.add_inter(inter(Shape::Flat, 0.85, 5.0, 0.0, 10.0, 10.0));
        let c = sig.add_inter(inter(Shape::Natural, 0.6, 10.0, 0.0, 10.0, 10.0));
        sig.insert_exclusion(a, b, ExclusionCause::Overlap).unwrap();
        sig.insert_exclusion(b, c, ExclusionCause::Overlap).unwrap();

        let removed = sig.reduce_exclusions(ReductionMode::Strict, 0.1);

        // a beats b, then c has no exclusion left
        assert_eq!(removed, vec![b]);
        assert!(sig.is_live(a));
        assert!(sig.is_live(c));
    }

    #[test]
    fn test_reduce_exclusions_relaxed_spares_close_partner() {
        let mut sig = SIGraph::new();
        let a = sig.add_inter(inter(Shape::Sharp, 0.9, 0.0, 0.0, 10.0, 10.0));
        let b = sig.add_inter(inter(Shape::Flat, 0.85, 5.0, 0.0, 10.0, 10.0));
        let c = sig.add_inter(inter(Shape::Natural, 0.6, 5.0, 5.0, 10.0, 10.0));
        sig.insert_exclusion(a, b, ExclusionCause::Overlap).unwrap();
        sig.insert_exclusion(a, c, ExclusionCause::Overlap).unwrap();

        let removed = sig.reduce_exclusions(ReductionMode::Relaxed, 0.1);

        assert_eq!(removed, vec![c]);
        assert!(sig.is_live(b));
        assert!(sig.exclusion_between(a, b).is_none());
    }

    #[test]
    fn test_stem_portions() {
        let mut sig = SIGraph::new();
        // Stem from y=0 to y=70
        let stem = sig.add_inter(
            inter(Shape::Stem, 0.8, 20.0, 0.0, 2.0, 70.0).with_median(Segment::new(
                Point::new(21.0, 0.0),
                Point::new(21.0, 70.0),
            )),
        );
        let low_head = sig.add_inter(inter(Shape::NoteheadBlack, 0.8, 10.0, 60.0, 11.0, 10.0));
        let mid_head = sig.add_inter(inter(Shape::NoteheadBlack, 0.8, 10.0, 30.0, 11.0, 10.0));
        let beam = sig.add_inter(
            inter(Shape::Beam, 0.8, 20.0, 0.0, 60.0, 8.0)
                .with_median(Segment::new(Point::new(20.0, 4.0), Point::new(80.0, 4.0))),
        );

        let head_link = Relation::HeadStem {
            head_side: HorizontalSide::Left,
            grade: 0.6,
        };
        let low = sig.add_relation(low_head, stem, head_link).unwrap();
        let mid = sig.add_relation(mid_head, stem, head_link).unwrap();
        let top = sig
            .add_relation(
                beam,
                stem,
                Relation::BeamStem {
                    beam_portion: BeamPortion::Left,
                    grade: 0.6,
                },
            )
            .unwrap();

        assert_eq!(sig.stem_portion(low, 20.0), Some(StemPortion::Bottom));
        assert_eq!(sig.stem_portion(mid, 20.0), Some(StemPortion::Middle));
        assert_eq!(sig.stem_portion(top, 20.0), Some(StemPortion::Top));
    }

    #[test]
    fn test_lookup_head() {
        let mut sig = SIGraph::new();
        let stem = sig.add_inter(inter(Shape::Stem, 0.8, 20.0, 0.0, 2.0, 70.0));
        let head = sig.add_inter(inter(Shape::NoteheadBlack, 0.8, 22.0, 60.0, 11.0, 10.0).with_pitch(3));
        sig.add_relation(
            head,
            stem,
            Relation::HeadStem {
                head_side: HorizontalSide::Right,
                grade: 0.6,
            },
        )
        .unwrap();

        assert_eq!(sig.lookup_head(stem, HorizontalSide::Right, 3), Some(head));
        assert_eq!(sig.lookup_head(stem, HorizontalSide::Left, 3), None);
        assert_eq!(sig.lookup_head(stem, HorizontalSide::Right, 2), None);
    }
}
