//! Scorescan Staff Line Retrieval
//!
//! This crate turns a binary sheet image into staves made of staff lines.
//! It includes:
//!
//! - **Scale**: Measuring line thickness and interline ([`scale_builder`] module)
//! - **Configuration**: Retrieval constants and their pixel values ([`config`] module)
//! - **Filaments**: Long thin curves and their geometry ([`filament`] module)
//! - **Factory**: Merging sections into filaments ([`factory`] module)
//! - **Clusters**: Grouping filaments into staves ([`cluster`] module)
//! - **Staves**: Staff descriptions and their manager ([`staff`] module)
//! - **Lines**: The whole retrieval sequence ([`lines`] module)
//!
//! # Example
//!
//! ```
//! # use scorescan_core::image::BinaryImage;
//! # use scorescan_grid::{LinesRetriever, config::GridConfig, scale_builder::ScaleBuilder};
//! let mut image = BinaryImage::new(400, 200);
//! for line in 0..5 {
//!     image.fill_rect(10, 50 + line * 20, 380, 3);
//! }
//!
//! let scale = ScaleBuilder::default().build(&image).unwrap();
//! let layout = LinesRetriever::retrieve(&image, scale, &GridConfig::default()).unwrap();
//! assert_eq!(layout.staves().len(), 1);
//! ```

pub mod cluster;
pub mod config;
pub mod error;
pub mod factory;
pub mod filament;
pub mod lines;
pub mod scale_builder;
pub mod staff;

pub use error::GridError;
pub use lines::{LinesRetriever, StaffLayout};
