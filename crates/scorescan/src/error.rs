//! Error types for Scorescan operations.
//!
//! [`ScorescanError`] is the main error type of the facade. [`SigError`]
//! reports misuse of an interpretation graph, mostly caused by malformed
//! interchange documents.

use std::io;

use thiserror::Error;

use scorescan_core::identifier::InterId;
use scorescan_grid::GridError;

/// Errors raised while building or grading an interpretation graph.
#[derive(Debug, Error)]
pub enum SigError {
    #[error("grade {grade} of inter {inter} is out of [0, 1]")]
    InvalidGrade { inter: usize, grade: f64 },

    #[error("unknown inter {0}")]
    UnknownInter(usize),

    #[error("duplicate inter {0}")]
    DuplicateInter(usize),

    #[error("unknown staff {staff} referenced by inter {inter}")]
    UnknownStaff { inter: usize, staff: usize },

    #[error("inter {0} is deleted or missing")]
    DeadInter(InterId),

    #[error("inter {0} cannot be related to itself")]
    SelfRelation(InterId),

    #[error("contextual grade of inter {inter} is not finite ({value})")]
    NonFiniteGrade { inter: InterId, value: f64 },
}

/// The main error type for Scorescan operations.
#[derive(Debug, Error)]
pub enum ScorescanError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Graph error: {0}")]
    Sig(#[from] SigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
