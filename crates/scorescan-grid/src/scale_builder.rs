//! Estimation of the sheet scale from vertical run lengths.
//!
//! The most frequent vertical foreground run length gives the staff line
//! thickness, and the most frequent vertical background run length found
//! between two foreground runs gives the white gap between two lines. Their
//! sum is the interline.

use log::{debug, info};

use scorescan_core::{
    image::BinaryImage,
    run::{Orientation, RunsTableFactory},
    scale::Scale,
};

use crate::error::GridError;

/// Histogram of run lengths, indexed by length.
#[derive(Debug, Default)]
struct Histogram {
    counts: Vec<usize>,
}

impl Histogram {
    fn add(&mut self, length: usize) {
        if length >= self.counts.len() {
            self.counts.resize(length + 1, 0);
        }
        self.counts[length] += 1;
    }

    /// Most frequent length and its count, smaller lengths winning ties
    fn peak(&self) -> Option<(usize, usize)> {
        self.counts
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, count)| count > 0)
            .fold(None, |best, (length, count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((length, count)),
            })
    }

    fn count(&self, length: usize) -> usize {
        self.counts.get(length).copied().unwrap_or(0)
    }
}

/// Builds a [`Scale`] out of a binary image.
#[derive(Debug, Clone)]
pub struct ScaleBuilder {
    quorum_ratio: f64,
    second_peak_ratio: f64,
}

impl Default for ScaleBuilder {
    fn default() -> Self {
        Self {
            quorum_ratio: 0.1,
            second_peak_ratio: 0.3,
        }
    }
}

impl ScaleBuilder {
    /// Estimates the scale of the image.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::EmptyImage`] for an image without pixels and
    /// [`GridError::NoScale`] when no foreground or no background run
    /// between two foreground runs can be measured.
    pub fn build(&self, image: &BinaryImage) -> Result<Scale, GridError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(GridError::EmptyImage {
                width: image.width(),
                height: image.height(),
            });
        }

        let table = RunsTableFactory::new(Orientation::Vertical).create_table(image);
        let mut fore = Histogram::default();
        let mut back = Histogram::default();

        for pos in 0..table.size() {
            let runs = table.sequence(pos);
            for run in runs {
                fore.add(run.length() as usize);
            }
            for pair in runs.windows(2) {
                back.add((pair[1].start() - pair[0].stop() - 1) as usize);
            }
        }

        let (main_fore, fore_count) = fore
            .peak()
            .ok_or_else(|| GridError::NoScale("no foreground pixels".to_string()))?;
        let (main_back, back_count) = back.peak().ok_or_else(|| {
            GridError::NoScale("no background gap between foreground runs".to_string())
        })?;

        let quorum = ((fore_count as f64 * self.quorum_ratio).ceil() as usize).max(1);
        let mut max_fore = main_fore;
        while fore.count(max_fore + 1) >= quorum {
            max_fore += 1;
        }

        let second_back = self.second_peak(&back, main_back, back_count);
        let interline = (main_back + main_fore) as i32;
        debug!(main_back, back_count, second_back:?; "Background peaks");

        let scale = Scale::new(interline, main_fore as i32, max_fore as i32)?
            .with_second_interline(second_back.map(|b| (b + main_fore) as i32));
        info!(
            interline = scale.interline(),
            main_fore = scale.main_fore(),
            max_fore = scale.max_fore(),
            second_interline:? = scale.second_interline();
            "Scale estimated"
        );
        Ok(scale)
    }

    /// Looks for a second background peak, clearly apart from the main one
    fn second_peak(&self, back: &Histogram, main_back: usize, main_count: usize) -> Option<usize> {
        let min_count = (main_count as f64 * self.second_peak_ratio).ceil() as usize;
        let min_distance = (main_back / 4).max(2);

        (1..back.counts.len())
            .filter(|&l| l.abs_diff(main_back) > min_distance)
            .filter(|&l| {
                let count = back.count(l);
                count >= min_count.max(1)
                    && count >= back.count(l - 1)
                    && count >= back.count(l + 1)
            })
            .max_by_key(|&l| (back.count(l), std::cmp::Reverse(l)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff_image(top: usize, interline: usize, thickness: usize, width: usize) -> BinaryImage {
        let mut image = BinaryImage::new(width, top + 6 * interline);
        for i in 0..5 {
            image.fill_rect(0, top + i * interline, width, thickness);
        }
        image
    }

    #[test]
    fn test_build_on_regular_staff() {
        let image = staff_image(10, 20, 3, 100);
        let scale = ScaleBuilder::default().build(&image).unwrap();

        assert_eq!(scale.interline(), 20);
        assert_eq!(scale.main_fore(), 3);
        assert_eq!(scale.max_fore(), 3);
        assert_eq!(scale.second_interline(), None);
    }

    #[test]
    fn test_build_detects_second_interline() {
        let mut image = BinaryImage::new(200, 200);
        for i in 0..5 {
            image.fill_rect(0, 10 + i * 20, 120, 3);
            image.fill_rect(120, 10 + i * 12, 80, 3);
        }
        let scale = ScaleBuilder::default().build(&image).unwrap();

        assert_eq!(scale.interline(), 20);
        assert_eq!(scale.second_interline(), Some(12));
    }

    #[test]
    fn test_build_rejects_blank_image() {
        let image = BinaryImage::new(10, 10);
        assert!(matches!(
            ScaleBuilder::default().build(&image),
            Err(GridError::NoScale(_))
        ));
        assert!(matches!(
            ScaleBuilder::default().build(&BinaryImage::new(0, 4)),
            Err(GridError::EmptyImage { .. })
        ));
    }
}
