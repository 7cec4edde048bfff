//! Interpretation vertices.

use std::fmt;

use serde::Serialize;

use scorescan_core::{
    geometry::{Bounds, Point, Segment},
    shape::Shape,
};

/// A candidate interpretation of a sheet region as a musical shape.
///
/// Inters are created by shape detectors and handed over to a
/// [`SIGraph`](super::SIGraph), which assigns their contextual grade and
/// flags them as deleted when the reduction discards them. A deleted inter
/// never comes back.
///
/// # Examples
///
/// ```
/// # use scorescan::sig::Inter;
/// # use scorescan_core::{geometry::Bounds, shape::Shape};
/// let head = Inter::new(Shape::NoteheadBlack, 0.8, Bounds::from_rect(10.0, 20.0, 12.0, 10.0))
///     .with_pitch(-2)
///     .with_staff(1);
///
/// assert!(head.shape().is_head());
/// assert_eq!(head.pitch(), Some(-2));
/// assert_eq!(head.contextual_grade(), 0.8);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Inter {
    shape: Shape,
    grade: f64,
    contextual_grade: f64,
    bounds: Bounds,
    #[serde(skip_serializing_if = "Option::is_none")]
    median: Option<Segment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pitch: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    staff: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ledger_index: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    doc_id: Option<usize>,
    vip: bool,
    deleted: bool,
}

impl Inter {
    /// Creates a live inter, its contextual grade starting at `grade`.
    pub fn new(shape: Shape, grade: f64, bounds: Bounds) -> Self {
        Self {
            shape,
            grade,
            contextual_grade: grade,
            bounds,
            median: None,
            pitch: None,
            staff: None,
            ledger_index: None,
            doc_id: None,
            vip: false,
            deleted: false,
        }
    }

    /// Sets the median line (stem axis, beam median)
    pub fn with_median(mut self, median: Segment) -> Self {
        self.median = Some(median);
        self
    }

    /// Sets the pitch position, 0 being the staff middle line.
    pub fn with_pitch(mut self, pitch: i32) -> Self {
        self.pitch = Some(pitch);
        self
    }

    /// Sets the id of the related staff.
    pub fn with_staff(mut self, staff: usize) -> Self {
        self.staff = Some(staff);
        self
    }

    /// Sets the ledger line index, positive below the staff.
    pub fn with_ledger_index(mut self, index: i32) -> Self {
        self.ledger_index = Some(index);
        self
    }

    /// Sets the id used in interchange documents.
    pub fn with_doc_id(mut self, doc_id: usize) -> Self {
        self.doc_id = Some(doc_id);
        self
    }

    pub fn with_vip(mut self, vip: bool) -> Self {
        self.vip = vip;
        self
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Intrinsic grade, in [0, 1]
    pub fn grade(&self) -> f64 {
        self.grade
    }

    /// Grade adjusted by the supporting partners
    pub fn contextual_grade(&self) -> f64 {
        self.contextual_grade
    }

    pub(crate) fn set_contextual_grade(&mut self, grade: f64) {
        self.contextual_grade = grade;
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn center(&self) -> Point {
        self.bounds.center()
    }

    pub fn median(&self) -> Option<Segment> {
        self.median
    }

    pub fn pitch(&self) -> Option<i32> {
        self.pitch
    }

    pub fn staff(&self) -> Option<usize> {
        self.staff
    }

    pub fn ledger_index(&self) -> Option<i32> {
        self.ledger_index
    }

    pub fn doc_id(&self) -> Option<usize> {
        self.doc_id
    }

    pub fn is_vip(&self) -> bool {
        self.vip
    }

    pub fn set_vip(&mut self, vip: bool) {
        self.vip = vip;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    /// Whether the inter reaches the given grade threshold
    pub fn is_good(&self, good_grade: f64) -> bool {
        self.grade >= good_grade
    }
}

impl fmt::Display for Inter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:.3}/{:.3})", self.shape, self.grade, self.contextual_grade)
    }
}
