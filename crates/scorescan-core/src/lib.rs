//! Scorescan Core Types and Definitions
//!
//! This crate provides the foundational pixel-level and geometric types shared
//! by the staff-line retrieval and the interpretation graph. It includes:
//!
//! - **Identifiers**: Typed indices for sections, filaments and inters ([`identifier`] module)
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Scale**: Sheet scale and scale-relative fractions ([`scale`] module)
//! - **Image**: Binary (foreground/background) images ([`image`] module)
//! - **Runs**: Oriented runs of foreground pixels ([`run`] module)
//! - **Lag**: Sections built from runs ([`lag`] module)
//! - **Shape**: Musical shapes and their categories ([`shape`] module)

pub mod error;
pub mod geometry;
pub mod identifier;
pub mod image;
pub mod lag;
pub mod run;
pub mod scale;
pub mod shape;

pub use error::CoreError;
