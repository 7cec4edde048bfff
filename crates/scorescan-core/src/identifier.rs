//! Typed indices for arena-stored entities.
//!
//! Sections, filaments and inters are stored in `Vec` arenas owned by their
//! container (lag, factory, graph). They are referred to everywhere else by
//! plain indices wrapped in the newtypes below, so a section id can never be
//! mistaken for an inter id.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Creates an id from its arena index
            pub fn new(index: usize) -> Self {
                Self(index as u32)
            }

            /// Returns the arena index this id refers to
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a [`Section`](crate::lag::Section) within its lag.
    SectionId,
    "S"
);

define_id!(
    /// Identifier of a filament within the factory that built it.
    FilamentId,
    "F"
);

define_id!(
    /// Identifier of an inter within its interpretation graph.
    InterId,
    "I"
);

define_id!(
    /// Identifier of a relation within its interpretation graph.
    RelationId,
    "R"
);
