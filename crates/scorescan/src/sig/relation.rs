//! Relations between inters.
//!
//! # Overview
//!
//! A [`Relation`] is either a support or an exclusion:
//!
//! - Support relations are directed from the dependent inter to its anchor:
//!   head to stem, beam to stem, flag to stem, dot to augmented note, second
//!   dot to first dot, and repeat dot to its sibling. They carry the grade of
//!   the geometric link and increase the contextual grade of both ends.
//! - Exclusions state that two inters cannot both be kept. They are
//!   symmetric, and a graph holds at most one exclusion per pair of inters.

use std::fmt;

use serde::{Deserialize, Serialize};

use scorescan_core::geometry::HorizontalSide;

/// Part of a stem a link is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StemPortion {
    Top,
    Middle,
    Bottom,
}

/// Part of a beam a stem is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeamPortion {
    Left,
    Center,
    Right,
}

/// Why two inters exclude each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionCause {
    /// Boxes overlap
    Overlap,
    /// Inters cannot coexist structurally
    Incompatible,
}

/// A typed edge between two inters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Relation {
    HeadStem { head_side: HorizontalSide, grade: f64 },
    BeamStem { beam_portion: BeamPortion, grade: f64 },
    FlagStem { grade: f64 },
    Augmentation { grade: f64 },
    DoubleDot { grade: f64 },
    RepeatDotDot { grade: f64 },
    Exclusion { cause: ExclusionCause },
}

impl Relation {
    pub fn is_exclusion(&self) -> bool {
        matches!(self, Self::Exclusion { .. })
    }

    pub fn is_support(&self) -> bool {
        !self.is_exclusion()
    }

    /// Whether the relation links a head, a beam or a flag to a stem
    pub fn is_stem_connection(&self) -> bool {
        matches!(
            self,
            Self::HeadStem { .. } | Self::BeamStem { .. } | Self::FlagStem { .. }
        )
    }

    /// Grade of the geometric link, none for exclusions.
    pub fn grade(&self) -> Option<f64> {
        match *self {
            Self::HeadStem { grade, .. }
            | Self::BeamStem { grade, .. }
            | Self::FlagStem { grade }
            | Self::Augmentation { grade }
            | Self::DoubleDot { grade }
            | Self::RepeatDotDot { grade } => Some(grade),
            Self::Exclusion { .. } => None,
        }
    }

    /// Support coefficient applied to the source of the relation.
    pub fn source_coeff(&self) -> f64 {
        match self {
            Self::HeadStem { .. } => 2.0,
            Self::BeamStem { .. } => 1.0,
            Self::FlagStem { .. } => 1.5,
            Self::Augmentation { .. } => 3.0,
            Self::DoubleDot { .. } => 2.0,
            Self::RepeatDotDot { .. } => 2.0,
            Self::Exclusion { .. } => 0.0,
        }
    }

    /// Support coefficient applied to the target of the relation.
    pub fn target_coeff(&self) -> f64 {
        match self {
            Self::HeadStem { .. } => 2.0,
            Self::BeamStem { .. } => 2.0,
            Self::FlagStem { .. } => 1.0,
            Self::Augmentation { .. } => 0.5,
            Self::DoubleDot { .. } => 0.5,
            Self::RepeatDotDot { .. } => 2.0,
            Self::Exclusion { .. } => 0.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::HeadStem { .. } => "head_stem",
            Self::BeamStem { .. } => "beam_stem",
            Self::FlagStem { .. } => "flag_stem",
            Self::Augmentation { .. } => "augmentation",
            Self::DoubleDot { .. } => "double_dot",
            Self::RepeatDotDot { .. } => "repeat_dot_dot",
            Self::Exclusion { .. } => "exclusion",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exclusion { cause } => write!(f, "exclusion({cause:?})"),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_support_and_exclusion() {
        let link = Relation::FlagStem { grade: 0.7 };
        assert!(link.is_support());
        assert!(link.is_stem_connection());
        assert_eq!(link.grade(), Some(0.7));

        let exclusion = Relation::Exclusion {
            cause: ExclusionCause::Overlap,
        };
        assert!(exclusion.is_exclusion());
        assert!(!exclusion.is_stem_connection());
        assert_eq!(exclusion.grade(), None);
        assert_eq!(exclusion.source_coeff(), 0.0);
    }

    #[test]
    fn test_dot_relations_are_not_stem_connections() {
        assert!(!Relation::Augmentation { grade: 0.5 }.is_stem_connection());
        assert!(!Relation::RepeatDotDot { grade: 0.5 }.is_stem_connection());
    }

    #[test]
    fn test_json_tagging() {
        let relation = Relation::HeadStem {
            head_side: HorizontalSide::Left,
            grade: 0.5,
        };
        let json = serde_json::to_string(&relation).unwrap();
        assert_eq!(json, r#"{"kind":"head_stem","head_side":"left","grade":0.5}"#);

        let parsed: Relation =
            serde_json::from_str(r#"{"kind":"exclusion","cause":"incompatible"}"#).unwrap();
        assert_eq!(
            parsed,
            Relation::Exclusion {
                cause: ExclusionCause::Incompatible
            }
        );
    }
}
