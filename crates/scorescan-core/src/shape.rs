//! Musical shapes and their categories.
//!
//! [`Shape`] enumerates the symbols an inter may stand for. Reduction rules
//! never test individual shapes directly; they dispatch on the closed
//! [`ShapeCategory`] returned by [`Shape::category`], so adding a shape only
//! requires classifying it once here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A musical shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    // Heads needing a stem
    NoteheadBlack,
    NoteheadVoid,
    NoteheadBlackSmall,
    NoteheadVoidSmall,
    // Stemless notes
    WholeNote,
    WholeNoteSmall,
    BreveNote,

    Stem,

    // Beams
    Beam,
    BeamSmall,
    BeamHook,
    BeamHookSmall,

    // Flags
    FlagUp1,
    FlagUp2,
    FlagUp3,
    FlagDown1,
    FlagDown2,
    FlagDown3,

    Ledger,

    AugmentationDot,
    RepeatDot,

    // Rests
    WholeRest,
    HalfRest,
    QuarterRest,
    EighthRest,
    SixteenthRest,

    // Curves and wedges
    Slur,
    Crescendo,
    Decrescendo,

    // Vertical lines
    ThinBarline,
    ThickBarline,
    ThinConnection,
    ThickConnection,

    // Staff-level symbols
    GClef,
    FClef,
    CClef,
    Sharp,
    Flat,
    Natural,
}

/// Closed set of shape families the reduction rules dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeCategory {
    /// Note head which must hang on a stem
    Head,
    /// Note without stem (whole, breve)
    StemlessNote,
    Stem,
    /// Beam spanning at least two stems
    FullBeam,
    /// Beam of a cue or grace group
    SmallBeam,
    /// Beam fragment attached to a single stem
    BeamHook,
    Flag,
    Ledger,
    AugmentationDot,
    RepeatDot,
    Rest,
    Slur,
    Wedge,
    Barline,
    Connection,
    Clef,
    Accidental,
}

impl Shape {
    /// Category this shape belongs to
    pub fn category(self) -> ShapeCategory {
        use Shape::*;
        match self {
            NoteheadBlack | NoteheadVoid | NoteheadBlackSmall | NoteheadVoidSmall => {
                ShapeCategory::Head
            }
            WholeNote | WholeNoteSmall | BreveNote => ShapeCategory::StemlessNote,
            Stem => ShapeCategory::Stem,
            Beam => ShapeCategory::FullBeam,
            BeamSmall => ShapeCategory::SmallBeam,
            BeamHook | BeamHookSmall => ShapeCategory::BeamHook,
            FlagUp1 | FlagUp2 | FlagUp3 | FlagDown1 | FlagDown2 | FlagDown3 => {
                ShapeCategory::Flag
            }
            Ledger => ShapeCategory::Ledger,
            AugmentationDot => ShapeCategory::AugmentationDot,
            RepeatDot => ShapeCategory::RepeatDot,
            WholeRest | HalfRest | QuarterRest | EighthRest | SixteenthRest => {
                ShapeCategory::Rest
            }
            Slur => ShapeCategory::Slur,
            Crescendo | Decrescendo => ShapeCategory::Wedge,
            ThinBarline | ThickBarline => ShapeCategory::Barline,
            ThinConnection | ThickConnection => ShapeCategory::Connection,
            GClef | FClef | CClef => ShapeCategory::Clef,
            Sharp | Flat | Natural => ShapeCategory::Accidental,
        }
    }

    /// Stem-attached note head
    pub fn is_head(self) -> bool {
        self.category() == ShapeCategory::Head
    }

    /// Any note: stem-attached head or stemless note
    pub fn is_note(self) -> bool {
        matches!(
            self.category(),
            ShapeCategory::Head | ShapeCategory::StemlessNote
        )
    }

    pub fn is_rest(self) -> bool {
        self.category() == ShapeCategory::Rest
    }

    pub fn is_flag(self) -> bool {
        self.category() == ShapeCategory::Flag
    }

    /// Any beam-like shape: full beam, small beam or hook
    pub fn is_beam(self) -> bool {
        matches!(
            self.category(),
            ShapeCategory::FullBeam | ShapeCategory::SmallBeam | ShapeCategory::BeamHook
        )
    }

    /// Shape whose median line may carry a stem connection
    pub fn is_stem_tail(self) -> bool {
        self.is_beam() || self.is_flag()
    }

    /// Entity that may receive an augmentation dot
    pub fn is_augmentable(self) -> bool {
        self.is_note() || self.is_rest()
    }

    /// Shapes excluded from overlap detection
    pub fn skips_overlap_detection(self) -> bool {
        matches!(
            self.category(),
            ShapeCategory::Ledger | ShapeCategory::Slur | ShapeCategory::Wedge
        )
    }

    /// Shapes a beam may overlap without conflict
    pub fn overlaps_beam_freely(self) -> bool {
        matches!(
            self.category(),
            ShapeCategory::Barline | ShapeCategory::Connection
        )
    }

    /// Shapes a stem may overlap without conflict
    pub fn overlaps_stem_freely(self) -> bool {
        matches!(self.category(), ShapeCategory::Slur | ShapeCategory::Wedge)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Checks whether two shapes may overlap without being exclusive.
///
/// A beam accepts another beam and barline/connection shapes; a stem accepts
/// slurs and wedges.
///
/// # Examples
///
/// ```
/// # use scorescan_core::shape::{Shape, compatible};
/// assert!(compatible(Shape::Beam, Shape::BeamHook));
/// assert!(compatible(Shape::ThinConnection, Shape::Beam));
/// assert!(compatible(Shape::Stem, Shape::Slur));
/// assert!(!compatible(Shape::Stem, Shape::NoteheadBlack));
/// ```
pub fn compatible(a: Shape, b: Shape) -> bool {
    [(a, b), (b, a)].into_iter().any(|(one, other)| {
        (one.is_beam() && (other.is_beam() || other.overlaps_beam_freely()))
            || (one == Shape::Stem && other.overlaps_stem_freely())
    })
}
