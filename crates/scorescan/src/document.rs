//! JSON interchange of systems and their interpretations.
//!
//! Shape detectors are out of scope of this crate: candidate inters and
//! their relations reach the reducer through a [`SheetDocument`], which is
//! written back once reduced.
//!
//! Inters are referred to by their document `id`, which survives the round
//! trip. Ledgers are registered on their staff from their `staff` and
//! `ledger_index` fields, so the ledger maps of the staves are neither read
//! nor written.
//!
//! # Example
//!
//! ```
//! # use scorescan::document::SystemDocument;
//! let json = r#"{
//!     "id": 1,
//!     "interline": 20,
//!     "inters": [
//!         { "id": 10, "shape": "sharp", "grade": 0.7,
//!           "bounds": { "min_x": 0.0, "min_y": 0.0, "max_x": 8.0, "max_y": 20.0 } },
//!         { "id": 11, "shape": "flat", "grade": 0.6,
//!           "bounds": { "min_x": 4.0, "min_y": 0.0, "max_x": 12.0, "max_y": 20.0 } }
//!     ],
//!     "relations": [
//!         { "source": 10, "target": 11, "kind": "exclusion", "cause": "overlap" }
//!     ]
//! }"#;
//!
//! let document: SystemDocument = serde_json::from_str(json).unwrap();
//! let system = document.to_system().unwrap();
//! assert_eq!(system.sig().live_count(), 2);
//! assert_eq!(system.sig().live_relations().count(), 1);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use scorescan_core::{
    geometry::{Bounds, Segment},
    identifier::InterId,
    shape::Shape,
};
use scorescan_grid::staff::StaffInfo;

use crate::{
    error::SigError,
    sig::{Inter, Relation},
    system::SystemInfo,
};

/// All the systems of a sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetDocument {
    #[serde(default)]
    systems: Vec<SystemDocument>,
}

impl SheetDocument {
    pub fn new(systems: Vec<SystemDocument>) -> Self {
        Self { systems }
    }

    pub fn systems(&self) -> &[SystemDocument] {
        &self.systems
    }

    /// Builds every system of the document.
    ///
    /// # Errors
    ///
    /// Returns the first [`SigError`] met, see [`SystemDocument::to_system`].
    pub fn to_systems(&self) -> Result<Vec<SystemInfo>, SigError> {
        self.systems.iter().map(SystemDocument::to_system).collect()
    }

    /// Describes the live content of the given systems.
    pub fn from_systems(systems: &[SystemInfo]) -> Self {
        Self::new(systems.iter().map(SystemDocument::from_system).collect())
    }
}

/// One system: its staves, candidate inters and relations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemDocument {
    id: usize,
    interline: i32,
    #[serde(default)]
    staves: Vec<StaffInfo>,
    #[serde(default)]
    inters: Vec<InterRecord>,
    #[serde(default)]
    relations: Vec<RelationRecord>,
}

/// An inter as written in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterRecord {
    pub id: usize,
    pub shape: Shape,
    pub grade: f64,
    pub bounds: Bounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median: Option<Segment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_index: Option<i32>,
    #[serde(default)]
    pub vip: bool,
    /// Output only
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub contextual_grade: Option<f64>,
}

/// A relation between two inters, referred to by their document ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub source: usize,
    pub target: usize,
    #[serde(flatten)]
    pub relation: Relation,
}

impl SystemDocument {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn interline(&self) -> i32 {
        self.interline
    }

    pub fn staves(&self) -> &[StaffInfo] {
        &self.staves
    }

    pub fn inters(&self) -> &[InterRecord] {
        &self.inters
    }

    pub fn relations(&self) -> &[RelationRecord] {
        &self.relations
    }

    /// Builds the system described by this document.
    ///
    /// # Errors
    ///
    /// Returns an error if a grade is out of `[0, 1]`, if an inter id is
    /// duplicated or unknown, if a staff is unknown, or if a relation links
    /// an inter to itself.
    pub fn to_system(&self) -> Result<SystemInfo, SigError> {
        let mut staves = self.staves.clone();
        for staff in &mut staves {
            staff.clear_ledgers();
        }
        let mut system = SystemInfo::new(self.id, self.interline, staves);
        let mut ids: HashMap<usize, InterId> = HashMap::with_capacity(self.inters.len());

        for record in &self.inters {
            if !(0.0..=1.0).contains(&record.grade) {
                return Err(SigError::InvalidGrade {
                    inter: record.id,
                    grade: record.grade,
                });
            }
            if ids.contains_key(&record.id) {
                return Err(SigError::DuplicateInter(record.id));
            }
            if let Some(staff) = record.staff.filter(|s| system.staff(*s).is_none()) {
                return Err(SigError::UnknownStaff {
                    inter: record.id,
                    staff,
                });
            }

            let id = system.add_inter(record.to_inter());
            ids.insert(record.id, id);
        }

        for record in &self.relations {
            let lookup = |doc_id: usize| ids.get(&doc_id).copied().ok_or(SigError::UnknownInter(doc_id));
            let (source, target) = (lookup(record.source)?, lookup(record.target)?);
            system.sig_mut().add_relation(source, target, record.relation)?;
        }

        Ok(system)
    }

    /// Describes the live inters and relations of a system.
    ///
    /// Inters not coming from a document are given their graph index as id.
    pub fn from_system(system: &SystemInfo) -> Self {
        let sig = system.sig();
        let doc_id = |id: InterId| sig.inter(id).and_then(Inter::doc_id).unwrap_or(id.index());

        let inters = sig
            .live_inters()
            .filter_map(|id| sig.inter(id).map(|inter| InterRecord::from_inter(doc_id(id), inter)))
            .collect();

        let relations = sig
            .live_relations()
            .filter_map(|rel| {
                Some(RelationRecord {
                    source: doc_id(sig.source(rel)?),
                    target: doc_id(sig.target(rel)?),
                    relation: *sig.relation(rel)?,
                })
            })
            .collect();

        let mut staves = system.staves().to_vec();
        for staff in &mut staves {
            staff.clear_ledgers();
        }

        Self {
            id: system.id(),
            interline: system.interline(),
            staves,
            inters,
            relations,
        }
    }
}

impl InterRecord {
    fn to_inter(&self) -> Inter {
        let mut inter = Inter::new(self.shape, self.grade, self.bounds)
            .with_doc_id(self.id)
            .with_vip(self.vip);
        if let Some(median) = self.median {
            inter = inter.with_median(median);
        }
        if let Some(pitch) = self.pitch {
            inter = inter.with_pitch(pitch);
        }
        if let Some(staff) = self.staff {
            inter = inter.with_staff(staff);
        }
        if let Some(index) = self.ledger_index {
            inter = inter.with_ledger_index(index);
        }
        inter
    }

    fn from_inter(id: usize, inter: &Inter) -> Self {
        Self {
            id,
            shape: inter.shape(),
            grade: inter.grade(),
            bounds: inter.bounds(),
            median: inter.median(),
            pitch: inter.pitch(),
            staff: inter.staff(),
            ledger_index: inter.ledger_index(),
            vip: inter.is_vip(),
            contextual_grade: Some(inter.contextual_grade()),
        }
    }
}

#[cfg(test)]
mod tests {
    use scorescan_core::geometry::HorizontalSide;

    use super::*;

    fn record(id: usize, shape: Shape, grade: f64) -> InterRecord {
        InterRecord {
            id,
            shape,
            grade,
            bounds: Bounds::from_rect(10.0 * id as f64, 0.0, 8.0, 8.0),
            median: None,
            pitch: None,
            staff: None,
            ledger_index: None,
            vip: false,
            contextual_grade: None,
        }
    }

    fn document(inters: Vec<InterRecord>, relations: Vec<RelationRecord>) -> SystemDocument {
        SystemDocument {
            id: 3,
            interline: 20,
            staves: Vec::new(),
            inters,
            relations,
        }
    }

    #[test]
    fn test_relation_record_is_flat() {
        let record = RelationRecord {
            source: 4,
            target: 2,
            relation: Relation::HeadStem {
                head_side: HorizontalSide::Right,
                grade: 0.5,
            },
        };
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["source"], 4);
        assert_eq!(value["kind"], "head_stem");
        assert_eq!(value["head_side"], "right");

        let back: RelationRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_document_ids_are_kept() {
        let doc = document(
            vec![record(40, Shape::Stem, 0.8), record(7, Shape::NoteheadBlack, 0.7)],
            vec![RelationRecord {
                source: 7,
                target: 40,
                relation: Relation::HeadStem {
                    head_side: HorizontalSide::Right,
                    grade: 0.6,
                },
            }],
        );
        let system = doc.to_system().unwrap();
        let back = SystemDocument::from_system(&system);

        let ids: Vec<usize> = back.inters().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![40, 7]);
        assert_eq!(back.relations()[0].source, 7);
        assert_eq!(back.relations()[0].target, 40);
        assert!(back.inters()[0].contextual_grade.is_some());
    }

    #[test]
    fn test_invalid_grade_is_rejected() {
        let doc = document(vec![record(1, Shape::Sharp, 1.2)], Vec::new());
        assert!(matches!(
            doc.to_system(),
            Err(SigError::InvalidGrade { inter: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_and_unknown_ids() {
        let doc = document(
            vec![record(1, Shape::Sharp, 0.5), record(1, Shape::Flat, 0.5)],
            Vec::new(),
        );
        assert!(matches!(doc.to_system(), Err(SigError::DuplicateInter(1))));

        let doc = document(
            vec![record(1, Shape::Sharp, 0.5)],
            vec![RelationRecord {
                source: 1,
                target: 9,
                relation: Relation::Augmentation { grade: 0.5 },
            }],
        );
        assert!(matches!(doc.to_system(), Err(SigError::UnknownInter(9))));
    }

    #[test]
    fn test_unknown_staff_is_rejected() {
        let mut ledger = record(1, Shape::Ledger, 0.5);
        ledger.staff = Some(2);
        ledger.ledger_index = Some(1);
        let doc = document(vec![ledger], Vec::new());

        assert!(matches!(
            doc.to_system(),
            Err(SigError::UnknownStaff { inter: 1, staff: 2 })
        ));
    }

    #[test]
    fn test_deleted_inters_are_not_written() {
        let doc = document(
            vec![record(1, Shape::Sharp, 0.5), record(2, Shape::Flat, 0.5)],
            Vec::new(),
        );
        let mut system = doc.to_system().unwrap();
        let first = system.sig().live_inters().next().unwrap();
        system.sig_mut().remove_inter(first);

        let back = SystemDocument::from_system(&system);
        assert_eq!(back.inters().len(), 1);
        assert_eq!(back.inters()[0].id, 2);
    }
}
