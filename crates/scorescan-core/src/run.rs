//! Oriented runs of foreground pixels.
//!
//! A [`Run`] is a maximal sequence of contiguous foreground pixels along one
//! row (horizontal orientation) or one column (vertical orientation). A
//! [`RunsTable`] stores all runs of an image for one orientation, indexed by
//! their *position* (the row for horizontal runs, the column for vertical
//! ones). Along a sequence, a run is located by its *coordinate* range.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::image::BinaryImage;

/// Orientation of runs and sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// The other orientation
    pub fn opposite(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Horizontal => write!(f, "horizontal"),
            Orientation::Vertical => write!(f, "vertical"),
        }
    }
}

/// A run of foreground pixels, located by its first coordinate and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    start: i32,
    length: i32,
}

impl Run {
    /// Creates a run starting at `start` and covering `length` pixels
    pub fn new(start: i32, length: i32) -> Self {
        Self { start, length }
    }

    /// First coordinate covered
    pub fn start(&self) -> i32 {
        self.start
    }

    /// Last coordinate covered (inclusive)
    pub fn stop(&self) -> i32 {
        self.start + self.length - 1
    }

    /// Number of pixels in the run
    pub fn length(&self) -> i32 {
        self.length
    }

    /// Checks whether the run covers the given coordinate
    pub fn contains(&self, coord: i32) -> bool {
        coord >= self.start && coord <= self.stop()
    }

    /// Checks whether both runs share at least one coordinate
    pub fn overlaps(&self, other: &Run) -> bool {
        self.start <= other.stop() && self.stop() >= other.start
    }
}

/// All runs of an image for one orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunsTable {
    orientation: Orientation,
    width: usize,
    height: usize,
    sequences: Vec<Vec<Run>>,
}

impl RunsTable {
    /// Creates an empty table for an image of the given dimensions
    pub fn new(orientation: Orientation, width: usize, height: usize) -> Self {
        let size = match orientation {
            Orientation::Horizontal => height,
            Orientation::Vertical => width,
        };
        Self {
            orientation,
            width,
            height,
            sequences: vec![Vec::new(); size],
        }
    }

    /// Orientation of every run in the table
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Width of the underlying image
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the underlying image
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of sequences (rows or columns)
    pub fn size(&self) -> usize {
        self.sequences.len()
    }

    /// Runs of the sequence at `pos`, sorted by start coordinate
    pub fn sequence(&self, pos: usize) -> &[Run] {
        self.sequences.get(pos).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Inserts a run in the sequence at `pos`, keeping the sequence sorted
    pub fn add_run(&mut self, pos: usize, run: Run) {
        if let Some(seq) = self.sequences.get_mut(pos) {
            let index = seq.partition_point(|r| r.start() < run.start());
            seq.insert(index, run);
        }
    }

    /// Iterates over all runs with their position
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Run)> {
        self.sequences
            .iter()
            .enumerate()
            .flat_map(|(pos, seq)| seq.iter().map(move |run| (pos, run)))
    }

    /// Total number of runs
    pub fn run_count(&self) -> usize {
        self.sequences.iter().map(Vec::len).sum()
    }

    /// Total number of foreground pixels
    pub fn weight(&self) -> usize {
        self.iter().map(|(_, run)| run.length() as usize).sum()
    }

    /// Checks whether the table holds no run at all
    pub fn is_empty(&self) -> bool {
        self.sequences.iter().all(Vec::is_empty)
    }

    /// Removes every run matching `predicate` and returns them as a new table.
    ///
    /// # Examples
    ///
    /// ```
    /// # use scorescan_core::run::{Orientation, Run, RunsTable};
    /// let mut table = RunsTable::new(Orientation::Vertical, 2, 20);
    /// table.add_run(0, Run::new(0, 3));
    /// table.add_run(1, Run::new(0, 15));
    ///
    /// let long = table.purge(|_, run| run.length() > 10);
    /// assert_eq!(table.run_count(), 1);
    /// assert_eq!(long.run_count(), 1);
    /// ```
    pub fn purge<F>(&mut self, mut predicate: F) -> RunsTable
    where
        F: FnMut(usize, &Run) -> bool,
    {
        let mut removed = RunsTable::new(self.orientation, self.width, self.height);
        for (pos, seq) in self.sequences.iter_mut().enumerate() {
            seq.retain(|run| {
                if predicate(pos, run) {
                    removed.sequences[pos].push(*run);
                    false
                } else {
                    true
                }
            });
        }
        removed
    }

    /// Paints every run of the table as foreground into `image`
    pub fn render(&self, image: &mut BinaryImage) {
        for (pos, run) in self.iter() {
            for coord in run.start()..=run.stop() {
                match self.orientation {
                    Orientation::Horizontal => image.set(coord as usize, pos, true),
                    Orientation::Vertical => image.set(pos, coord as usize, true),
                }
            }
        }
    }

    /// Renders the table into a fresh image of the table dimensions
    pub fn to_image(&self) -> BinaryImage {
        let mut image = BinaryImage::new(self.width, self.height);
        self.render(&mut image);
        image
    }
}

/// Builds a [`RunsTable`] by scanning a [`BinaryImage`].
#[derive(Debug, Clone)]
pub struct RunsTableFactory {
    orientation: Orientation,
    min_length: i32,
}

impl RunsTableFactory {
    /// Creates a factory for the given orientation, keeping every run
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            min_length: 1,
        }
    }

    /// Discards runs shorter than `min_length`
    pub fn with_min_length(mut self, min_length: i32) -> Self {
        self.min_length = min_length.max(1);
        self
    }

    /// Scans the image and collects its runs.
    pub fn create_table(&self, image: &BinaryImage) -> RunsTable {
        let (width, height) = (image.width(), image.height());
        let mut table = RunsTable::new(self.orientation, width, height);
        let (size, length) = match self.orientation {
            Orientation::Horizontal => (height, width),
            Orientation::Vertical => (width, height),
        };

        for pos in 0..size {
            let is_fore = |coord: usize| match self.orientation {
                Orientation::Horizontal => image.is_foreground(coord, pos),
                Orientation::Vertical => image.is_foreground(pos, coord),
            };

            let mut start: Option<usize> = None;
            for coord in 0..=length {
                let fore = coord < length && is_fore(coord);
                match (fore, start) {
                    (true, None) => start = Some(coord),
                    (false, Some(s)) => {
                        let run_length = (coord - s) as i32;
                        if run_length >= self.min_length {
                            table.sequences[pos].push(Run::new(s as i32, run_length));
                        }
                        start = None;
                    }
                    _ => {}
                }
            }
        }

        table
    }
}
