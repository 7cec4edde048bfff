//! Configuration of the staff line retrieval.
//!
//! [`GridConfig`] holds scale-relative constants, loaded from the `[grid]`
//! section of the application configuration. Once the sheet [`Scale`] is
//! known, they are converted once into pixel values held by the immutable
//! [`Parameters`] passed to every retrieval stage.
//!
//! # Example
//!
//! ```
//! # use scorescan_core::scale::Scale;
//! # use scorescan_grid::config::{GridConfig, Parameters};
//! let config = GridConfig::default();
//! let params = Parameters::new(&config, &Scale::new(20, 3, 4).unwrap());
//! assert_eq!(params.min_run_length(), 20);
//! assert_eq!(params.max_vertical_run_length(), 5);
//! ```

use serde::Deserialize;

use scorescan_core::{
    identifier::SectionId,
    scale::{AreaFraction, InterlineFraction, LineFraction, Scale},
};

/// Scale-relative constants of the staff line retrieval.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Gray level below which a pixel is foreground, when binarizing a scan.
    binarization_threshold: u8,

    /// Number of lines in a staff.
    line_count: usize,

    /// Ratio of longest filaments used to compute the global slope.
    top_ratio_for_slope: f64,

    /// Junction ratio for long horizontal sections.
    max_length_ratio: f64,

    /// Junction ratio for short horizontal sections.
    max_length_ratio_short: f64,

    /// Maximum vertical run length, relative to the maximum line thickness.
    ledger_thickness: f64,

    /// Maximum sticker thickness, relative to the maximum line thickness.
    sticker_thickness: f64,

    max_sticker_gap: LineFraction,
    max_sticker_extension: LineFraction,
    max_thin_sticker_weight: AreaFraction,

    /// Minimum length of a horizontal run to be part of a long section.
    min_run_length: InterlineFraction,

    /// Abscissa step between filament geometry probes.
    probe_width: InterlineFraction,

    /// Maximum horizontal gap between two merged filaments.
    max_filament_gap_dx: InterlineFraction,

    /// Maximum vertical gap at the junction of two merged filaments.
    max_filament_gap_dy: InterlineFraction,

    /// Maximum slope difference between two merged filaments.
    max_filament_slope_delta: f64,

    /// Abscissa step between cluster samples.
    sampling_dx: InterlineFraction,

    /// Maximum relative deviation of line spacing from the interline.
    max_interline_deviation: f64,

    /// Maximum ordinate deviation of a line point from its neighbors.
    max_curvature_dy: LineFraction,

    /// Horizontal sections to trace in logs.
    vip_sections: Vec<usize>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            binarization_threshold: 140,
            line_count: 5,
            top_ratio_for_slope: 0.1,
            max_length_ratio: 1.5,
            max_length_ratio_short: 3.0,
            ledger_thickness: 1.2,
            sticker_thickness: 1.0,
            max_sticker_gap: LineFraction::new(0.5),
            max_sticker_extension: LineFraction::new(1.2),
            max_thin_sticker_weight: AreaFraction::new(0.06),
            min_run_length: InterlineFraction::new(1.0),
            probe_width: InterlineFraction::new(0.5),
            max_filament_gap_dx: InterlineFraction::new(1.0),
            max_filament_gap_dy: InterlineFraction::new(0.2),
            max_filament_slope_delta: 0.05,
            sampling_dx: InterlineFraction::new(1.0),
            max_interline_deviation: 0.2,
            max_curvature_dy: LineFraction::new(1.0),
            vip_sections: Vec::new(),
        }
    }
}

impl GridConfig {
    /// Gray level below which a pixel is foreground
    pub fn binarization_threshold(&self) -> u8 {
        self.binarization_threshold
    }

    /// Number of lines expected in a staff
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Sets the number of lines expected in a staff
    pub fn with_line_count(mut self, line_count: usize) -> Self {
        self.line_count = line_count;
        self
    }

    /// Sets the horizontal sections to trace
    pub fn with_vip_sections(mut self, vip_sections: Vec<usize>) -> Self {
        self.vip_sections = vip_sections;
        self
    }

    pub fn top_ratio_for_slope(&self) -> f64 {
        self.top_ratio_for_slope
    }

    pub fn max_length_ratio(&self) -> f64 {
        self.max_length_ratio
    }
}

/// Pixel values derived from a [`GridConfig`] and a [`Scale`].
#[derive(Debug, Clone)]
pub struct Parameters {
    line_count: usize,
    max_vertical_run_length: i32,
    min_run_length: i32,
    max_length_ratio: f64,
    max_length_ratio_short: f64,
    top_ratio_for_slope: f64,
    max_sticker_thickness: i32,
    max_sticker_extension: i32,
    max_sticker_gap: f64,
    max_thin_sticker_weight: i32,
    probe_width: f64,
    max_filament_gap_dx: f64,
    max_filament_gap_dy: f64,
    max_filament_slope_delta: f64,
    sampling_dx: f64,
    max_interline_deviation: f64,
    max_curvature_dy: f64,
    vip_sections: Vec<SectionId>,
}

impl Parameters {
    /// Converts the configuration constants for the given scale.
    pub fn new(config: &GridConfig, scale: &Scale) -> Self {
        let max_fore = scale.max_fore() as f64;
        Self {
            line_count: config.line_count,
            max_vertical_run_length: (max_fore * config.ledger_thickness).round() as i32,
            min_run_length: scale.to_pixels(config.min_run_length),
            max_length_ratio: config.max_length_ratio,
            max_length_ratio_short: config.max_length_ratio_short,
            top_ratio_for_slope: config.top_ratio_for_slope,
            max_sticker_thickness: (max_fore * config.sticker_thickness).round() as i32,
            max_sticker_extension: scale
                .line_to_pixels_f64(config.max_sticker_extension)
                .ceil() as i32,
            max_sticker_gap: scale.line_to_pixels_f64(config.max_sticker_gap),
            max_thin_sticker_weight: scale.area_to_pixels(config.max_thin_sticker_weight),
            probe_width: scale.to_pixels_f64(config.probe_width).max(1.0),
            max_filament_gap_dx: scale.to_pixels_f64(config.max_filament_gap_dx),
            max_filament_gap_dy: scale.to_pixels_f64(config.max_filament_gap_dy).max(1.0),
            max_filament_slope_delta: config.max_filament_slope_delta,
            sampling_dx: scale.to_pixels_f64(config.sampling_dx).max(1.0),
            max_interline_deviation: config.max_interline_deviation,
            max_curvature_dy: scale.line_to_pixels_f64(config.max_curvature_dy),
            vip_sections: config
                .vip_sections
                .iter()
                .copied()
                .map(SectionId::new)
                .collect(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Vertical runs longer than this cannot belong to a staff line
    pub fn max_vertical_run_length(&self) -> i32 {
        self.max_vertical_run_length
    }

    /// Horizontal runs shorter than this go to the short table
    pub fn min_run_length(&self) -> i32 {
        self.min_run_length
    }

    pub fn max_length_ratio(&self) -> f64 {
        self.max_length_ratio
    }

    pub fn max_length_ratio_short(&self) -> f64 {
        self.max_length_ratio_short
    }

    pub fn top_ratio_for_slope(&self) -> f64 {
        self.top_ratio_for_slope
    }

    pub fn max_sticker_thickness(&self) -> i32 {
        self.max_sticker_thickness
    }

    pub fn max_sticker_extension(&self) -> i32 {
        self.max_sticker_extension
    }

    pub fn max_sticker_gap(&self) -> f64 {
        self.max_sticker_gap
    }

    pub fn max_thin_sticker_weight(&self) -> i32 {
        self.max_thin_sticker_weight
    }

    pub fn probe_width(&self) -> f64 {
        self.probe_width
    }

    pub fn max_filament_gap_dx(&self) -> f64 {
        self.max_filament_gap_dx
    }

    pub fn max_filament_gap_dy(&self) -> f64 {
        self.max_filament_gap_dy
    }

    pub fn max_filament_slope_delta(&self) -> f64 {
        self.max_filament_slope_delta
    }

    pub fn sampling_dx(&self) -> f64 {
        self.sampling_dx
    }

    pub fn max_interline_deviation(&self) -> f64 {
        self.max_interline_deviation
    }

    pub fn max_curvature_dy(&self) -> f64 {
        self.max_curvature_dy
    }

    pub fn vip_sections(&self) -> &[SectionId] {
        &self.vip_sections
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_parameters_from_default_config() {
        let scale = Scale::new(20, 3, 4).unwrap();
        let params = Parameters::new(&GridConfig::default(), &scale);

        assert_eq!(params.max_vertical_run_length(), 5);
        assert_eq!(params.max_sticker_thickness(), 4);
        assert_eq!(params.max_sticker_extension(), 4);
        assert_approx_eq!(f64, params.max_sticker_gap(), 1.5);
        assert_eq!(params.max_thin_sticker_weight(), 24);
        assert_eq!(params.min_run_length(), 20);
        assert_approx_eq!(f64, params.probe_width(), 10.0);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: GridConfig = serde_json::from_str(r#"{ "line_count": 4 }"#).unwrap();
        assert_eq!(config.line_count(), 4);
        assert_approx_eq!(f64, config.top_ratio_for_slope(), 0.1);
    }
}
