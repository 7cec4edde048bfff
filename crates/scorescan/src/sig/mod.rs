//! Symbol interpretation graph.
//!
//! Candidate interpretations ([`Inter`]) of the symbols of a system are
//! linked by support and exclusion [`Relation`]s in a [`SIGraph`]. The
//! [`SigReducer`](crate::reducer::SigReducer) prunes this graph down to a
//! consistent set of interpretations.
//!
//! # Example
//!
//! ```
//! # use scorescan::sig::{ExclusionCause, Inter, SIGraph};
//! # use scorescan_core::{geometry::Bounds, shape::Shape};
//! let mut sig = SIGraph::new();
//! let sharp = sig.add_inter(Inter::new(Shape::Sharp, 0.7, Bounds::from_rect(0.0, 0.0, 8.0, 20.0)));
//! let flat = sig.add_inter(Inter::new(Shape::Flat, 0.6, Bounds::from_rect(2.0, 0.0, 8.0, 20.0)));
//!
//! sig.insert_exclusion(sharp, flat, ExclusionCause::Overlap).unwrap();
//! assert!(sig.exclusion_between(flat, sharp).is_some());
//! ```

mod graph;
mod inter;
mod relation;

pub use graph::{ReductionMode, SIGraph};
pub use inter::Inter;
pub use relation::{BeamPortion, ExclusionCause, Relation, StemPortion};
