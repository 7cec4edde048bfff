//! Configuration types for Scorescan processing.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file. Every field has a default, so a partial file only overrides
//! what it names.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining both cores.
//! - [`GridConfig`] - Constants of the staff line retrieval.
//! - [`ReducerConfig`] - Constants of the interpretation graph reduction.
//!
//! # Example
//!
//! ```
//! # use scorescan::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.grid().line_count(), 5);
//! assert_eq!(config.reducer().min_contextual_grade(), 0.5);
//! ```

use serde::Deserialize;

use scorescan_core::scale::InterlineFraction;

pub use scorescan_grid::config::GridConfig;

use crate::{ScorescanError, sig::ReductionMode};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Staff line retrieval section.
    #[serde(default)]
    grid: GridConfig,

    /// Graph reduction section.
    #[serde(default)]
    reducer: ReducerConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    ///
    /// # Arguments
    ///
    /// * `grid` - Staff line retrieval constants.
    /// * `reducer` - Graph reduction constants.
    pub fn new(grid: GridConfig, reducer: ReducerConfig) -> Self {
        Self { grid, reducer }
    }

    /// Returns the staff line retrieval configuration.
    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    /// Returns the graph reduction configuration.
    pub fn reducer(&self) -> &ReducerConfig {
        &self.reducer
    }

    /// Replaces the graph reduction section.
    pub fn with_reducer(mut self, reducer: ReducerConfig) -> Self {
        self.reducer = reducer;
        self
    }

    /// Checks the values no processing can work with.
    ///
    /// # Errors
    ///
    /// Returns [`ScorescanError::Config`] naming the first invalid value.
    pub fn validate(&self) -> Result<(), ScorescanError> {
        if self.grid.line_count() < 2 {
            return Err(ScorescanError::Config(format!(
                "grid.line_count must be at least 2, got {}",
                self.grid.line_count()
            )));
        }
        let grades = [
            ("reducer.min_contextual_grade", self.reducer.min_contextual_grade),
            ("reducer.good_grade", self.reducer.good_grade),
        ];
        for (name, value) in grades {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScorescanError::Config(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        if self.reducer.relaxed_margin < 0.0 {
            return Err(ScorescanError::Config(format!(
                "reducer.relaxed_margin must not be negative, got {}",
                self.reducer.relaxed_margin
            )));
        }
        Ok(())
    }
}

/// Constants of the interpretation graph reduction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    /// Minimum contextual grade for an inter to be kept.
    min_contextual_grade: f64,

    /// Minimum intrinsic grade of a reliable inter.
    good_grade: f64,

    /// Distance from a stem end within which a link is attached to that end.
    stem_end_margin: InterlineFraction,

    /// Relaxed reduction spares partners graded this close to the winner.
    relaxed_margin: f64,

    /// Strategy used to resolve the remaining exclusions.
    mode: ReductionMode,

    /// Document ids of the inters to trace.
    vip_inters: Vec<usize>,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            min_contextual_grade: 0.5,
            good_grade: 0.6,
            stem_end_margin: InterlineFraction::new(1.0),
            relaxed_margin: 0.1,
            mode: ReductionMode::Strict,
            vip_inters: Vec::new(),
        }
    }
}

impl ReducerConfig {
    pub fn min_contextual_grade(&self) -> f64 {
        self.min_contextual_grade
    }

    pub fn good_grade(&self) -> f64 {
        self.good_grade
    }

    pub fn stem_end_margin(&self) -> InterlineFraction {
        self.stem_end_margin
    }

    pub fn relaxed_margin(&self) -> f64 {
        self.relaxed_margin
    }

    pub fn mode(&self) -> ReductionMode {
        self.mode
    }

    /// Overrides the reduction mode.
    pub fn with_mode(mut self, mode: ReductionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn vip_inters(&self) -> &[usize] {
        &self.vip_inters
    }

    /// Sets the document ids of the inters to trace.
    pub fn with_vip_inters(mut self, vip_inters: Vec<usize>) -> Self {
        self.vip_inters = vip_inters;
        self
    }
}
