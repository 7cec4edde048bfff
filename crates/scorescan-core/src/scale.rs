//! Sheet scale and scale-relative fractions.
//!
//! Every geometric threshold used by the recognition is expressed relative to
//! the sheet scale so that it stays valid across scan resolutions:
//!
//! - [`InterlineFraction`] - a fraction of the interline (distance between two
//!   staff lines, measured center to center)
//! - [`LineFraction`] - a fraction of the main staff line thickness
//! - [`AreaFraction`] - a fraction of the squared interline
//!
//! A [`Scale`] converts those fractions into pixel values.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Scale descriptor of a sheet.
///
/// # Examples
///
/// ```
/// # use scorescan_core::scale::{InterlineFraction, Scale};
/// let scale = Scale::new(20, 3, 4).unwrap();
/// assert_eq!(scale.to_pixels(InterlineFraction::new(1.5)), 30);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    interline: i32,
    main_fore: i32,
    max_fore: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    second_interline: Option<i32>,
}

impl Scale {
    /// Creates a scale from its interline and line thickness measurements.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidScale`] when a measurement is not positive
    /// or when the maximum line thickness is below the main one.
    pub fn new(interline: i32, main_fore: i32, max_fore: i32) -> Result<Self, CoreError> {
        if interline <= 0 || main_fore <= 0 {
            return Err(CoreError::InvalidScale(format!(
                "interline {interline} and line thickness {main_fore} must be positive"
            )));
        }
        if max_fore < main_fore {
            return Err(CoreError::InvalidScale(format!(
                "max line thickness {max_fore} is below main thickness {main_fore}"
            )));
        }
        Ok(Self {
            interline,
            main_fore,
            max_fore,
            second_interline: None,
        })
    }

    /// Declares a second interline, for sheets mixing staff sizes
    pub fn with_second_interline(mut self, second_interline: Option<i32>) -> Self {
        self.second_interline = second_interline.filter(|&s| s > 0);
        self
    }

    /// Main interline in pixels
    pub fn interline(&self) -> i32 {
        self.interline
    }

    /// Most frequent staff line thickness in pixels
    pub fn main_fore(&self) -> i32 {
        self.main_fore
    }

    /// Maximum staff line thickness in pixels
    pub fn max_fore(&self) -> i32 {
        self.max_fore
    }

    /// Interline of a second population of staves, if any
    pub fn second_interline(&self) -> Option<i32> {
        self.second_interline
    }

    /// Converts an interline fraction into a rounded pixel count
    pub fn to_pixels(&self, fraction: InterlineFraction) -> i32 {
        self.to_pixels_f64(fraction).round() as i32
    }

    /// Converts an interline fraction into a real pixel length
    pub fn to_pixels_f64(&self, fraction: InterlineFraction) -> f64 {
        self.interline as f64 * fraction.value()
    }

    /// Converts a line fraction into a real pixel length
    pub fn line_to_pixels_f64(&self, fraction: LineFraction) -> f64 {
        self.main_fore as f64 * fraction.value()
    }

    /// Converts an area fraction into a pixel count
    pub fn area_to_pixels(&self, fraction: AreaFraction) -> i32 {
        let interline = self.interline as f64;
        (interline * interline * fraction.value()).round() as i32
    }
}

macro_rules! define_fraction {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(f64);

        impl $name {
            /// Creates a fraction with the given value
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Returns the raw fraction value
            pub fn value(self) -> f64 {
                self.0
            }
        }
    };
}

define_fraction!(
    /// A length expressed as a fraction of the interline.
    InterlineFraction
);

define_fraction!(
    /// A length expressed as a fraction of the main staff line thickness.
    LineFraction
);

define_fraction!(
    /// An area expressed as a fraction of the squared interline.
    AreaFraction
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_new_rejects_invalid() {
        assert!(Scale::new(0, 3, 3).is_err());
        assert!(Scale::new(20, 0, 3).is_err());
        assert!(Scale::new(20, 4, 3).is_err());
        assert!(Scale::new(20, 3, 3).is_ok());
    }

    #[test]
    fn test_fraction_conversions() {
        let scale = Scale::new(20, 4, 5).unwrap();

        assert_eq!(scale.to_pixels(InterlineFraction::new(1.0)), 20);
        assert_eq!(scale.to_pixels(InterlineFraction::new(0.33)), 7);
        assert_eq!(scale.line_to_pixels_f64(LineFraction::new(0.5)), 2.0);
        assert_eq!(scale.area_to_pixels(AreaFraction::new(0.06)), 24);
    }

    #[test]
    fn test_second_interline_ignores_non_positive() {
        let scale = Scale::new(20, 3, 3)
            .unwrap()
            .with_second_interline(Some(0));
        assert_eq!(scale.second_interline(), None);

        let scale = scale.with_second_interline(Some(14));
        assert_eq!(scale.second_interline(), Some(14));
    }
}
