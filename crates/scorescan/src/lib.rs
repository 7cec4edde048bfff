//! Scorescan - Staff geometry and symbol interpretation for optical music recognition.
//!
//! Two processing cores are exposed through [`SheetProcessor`]:
//!
//! - the staff line retrieval of `scorescan_grid`, turning a binary sheet
//!   image into staves made of filament lines;
//! - the [`SigReducer`](reducer::SigReducer), pruning the interpretation
//!   graph of a system down to a consistent set of symbols.
//!
//! Systems and their candidate interpretations are exchanged as JSON
//! through the [`document`] module.

pub mod config;
pub mod document;
pub mod reducer;
pub mod sig;
pub mod system;

mod error;

pub use scorescan_core::{geometry, identifier, image, scale, shape};
pub use scorescan_grid::{StaffLayout, staff};

pub use error::{ScorescanError, SigError};

use std::time::Instant;

use log::{debug, info};

use scorescan_core::{image::BinaryImage, scale::Scale};
use scorescan_grid::{LinesRetriever, scale_builder::ScaleBuilder};

use config::AppConfig;
use document::SheetDocument;
use reducer::SigReducer;
use system::SystemInfo;

/// Entry point running the processing cores with one configuration.
///
/// # Examples
///
/// ```
/// use scorescan::{SheetProcessor, config::AppConfig, image::BinaryImage};
///
/// let mut image = BinaryImage::new(400, 200);
/// for line in 0..5 {
///     image.fill_rect(10, 50 + line * 20, 380, 3);
/// }
///
/// let processor = SheetProcessor::new(AppConfig::default());
/// let layout = processor
///     .retrieve_staves(&image, None)
///     .expect("Failed to retrieve staves");
/// assert_eq!(layout.staves().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct SheetProcessor {
    config: AppConfig,
}

impl SheetProcessor {
    /// Creates a processor with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Retrieval and reduction constants
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Retrieves the staves of a binary sheet image.
    ///
    /// The scale is measured on the image when none is given.
    ///
    /// # Errors
    ///
    /// Returns [`ScorescanError::Grid`] for an empty image or when no scale
    /// can be measured.
    pub fn retrieve_staves(
        &self,
        image: &BinaryImage,
        scale: Option<Scale>,
    ) -> Result<StaffLayout, ScorescanError> {
        let scale = match scale {
            Some(scale) => scale,
            None => {
                let scale = ScaleBuilder::default().build(image)?;
                debug!(interline = scale.interline(), line = scale.main_fore(); "Scale measured");
                scale
            }
        };

        info!(width = image.width(), height = image.height(); "Retrieving staff lines");
        let layout = LinesRetriever::retrieve(image, scale, self.config.grid())?;
        info!(staves = layout.staves().len(); "Staff lines retrieved");

        Ok(layout)
    }

    /// Reduces the interpretation graph of a system, in place.
    pub fn reduce_system(&self, system: &mut SystemInfo) {
        let mode = self.config.reducer().mode();
        SigReducer::new(system, self.config.reducer()).reduce(mode);
    }

    /// Reduces every system of a document and describes the result.
    ///
    /// # Errors
    ///
    /// Returns [`ScorescanError::Sig`] when the document is malformed.
    pub fn reduce_document(&self, document: &SheetDocument) -> Result<SheetDocument, ScorescanError> {
        let start = Instant::now();
        let mut systems = document.to_systems()?;

        for system in &mut systems {
            self.reduce_system(system);
        }

        info!(
            systems = systems.len(),
            elapsed_ms = start.elapsed().as_millis() as u64;
            "Document reduced"
        );
        Ok(SheetDocument::from_systems(&systems))
    }
}
