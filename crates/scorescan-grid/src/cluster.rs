//! Grouping filaments into clusters of regularly spaced lines.
//!
//! The retriever samples the sheet at regular abscissae. At each sample, the
//! filaments crossing the vertical are sorted by ordinate and chained while
//! consecutive gaps match the interline: a chain of at least `line_count`
//! filaments is a *comb*, whose best window of `line_count` teeth is linked
//! into one group. Groups are then split into lines by projected ordinate.
//! A group with more than `line_count` lines is trimmed to the consecutive
//! lines of greatest total length, and the remaining lines are discarded.
//! A group with exactly `line_count` lines becomes a [`LineCluster`], its
//! line fragments being merged into one filament per line.

use indexmap::IndexMap;
use log::{debug, info};
use petgraph::unionfind::UnionFind;

use scorescan_core::{geometry::Bounds, identifier::FilamentId, lag::Lag};

use crate::{config::Parameters, factory::FilamentsFactory};

/// A set of filaments forming the lines of one staff candidate.
#[derive(Debug, Clone)]
pub struct LineCluster {
    interline: f64,
    lines: Vec<FilamentId>,
    bounds: Bounds,
}

impl LineCluster {
    /// Mean spacing between consecutive lines
    pub fn interline(&self) -> f64 {
        self.interline
    }

    /// One filament per line, top down
    pub fn lines(&self) -> &[FilamentId] {
        &self.lines
    }

    /// Box spanning the ending points of all lines
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

/// Retrieves line clusters among filaments for one interline value.
#[derive(Debug)]
pub struct ClustersRetriever {
    candidates: Vec<FilamentId>,
    interline: i32,
    line_count: usize,
    sampling_dx: f64,
    max_deviation: f64,
    global_slope: f64,
    clusters: Vec<LineCluster>,
}

impl ClustersRetriever {
    pub fn new(
        candidates: Vec<FilamentId>,
        interline: i32,
        params: &Parameters,
        global_slope: f64,
    ) -> Self {
        Self {
            candidates,
            interline,
            line_count: params.line_count(),
            sampling_dx: params.sampling_dx(),
            max_deviation: params.max_interline_deviation(),
            global_slope,
            clusters: Vec::new(),
        }
    }

    pub fn clusters(&self) -> &[LineCluster] {
        &self.clusters
    }

    pub fn into_clusters(self) -> Vec<LineCluster> {
        self.clusters
    }

    /// Builds the clusters and returns the candidates left out of any.
    pub fn build_info(&mut self, factory: &mut FilamentsFactory, lag: &mut Lag) -> Vec<FilamentId> {
        self.clusters.clear();
        let count = self.candidates.len();
        if count == 0 || self.line_count == 0 {
            return self.candidates.clone();
        }

        let mut union = UnionFind::<usize>::new(count);
        let mut in_comb = vec![false; count];
        // First tooth of each comb window, with the sum and count of its gaps
        let mut comb_gaps: Vec<(usize, f64, usize)> = Vec::new();

        let (x_min, x_max) = self.abscissa_range(factory);
        let min_gap = self.interline as f64 * (1.0 - self.max_deviation);
        let max_gap = self.interline as f64 * (1.0 + self.max_deviation);

        let mut x = x_min + self.sampling_dx / 2.0;
        while x <= x_max {
            let mut teeth: Vec<(f64, usize)> = self
                .candidates
                .iter()
                .enumerate()
                .filter_map(|(i, id)| {
                    let filament = factory.filament(*id)?;
                    filament
                        .geometry()
                        .covers(x)
                        .then(|| (filament.position_at(x), i))
                })
                .collect();
            teeth.sort_by(|a, b| a.0.total_cmp(&b.0));

            for chain in split_chains(&teeth, min_gap, max_gap) {
                if chain.len() < self.line_count {
                    continue;
                }
                let window = self.best_window(chain, factory);
                for pair in window.windows(2) {
                    union.union(pair[0].1, pair[1].1);
                }
                for (_, i) in window {
                    in_comb[*i] = true;
                }
                let (first, last) = (window[0], window[window.len() - 1]);
                comb_gaps.push((first.1, last.0 - first.0, window.len() - 1));
            }
            x += self.sampling_dx;
        }

        // Members of each group, in candidate order
        let mut groups: IndexMap<usize, Vec<usize>> = IndexMap::new();
        for i in (0..count).filter(|&i| in_comb[i]) {
            groups.entry(union.find(i)).or_default().push(i);
        }

        let mut kept = vec![false; count];
        for (root, members) in groups {
            let (gap_sum, gap_count) = comb_gaps
                .iter()
                .filter(|(first, _, _)| union.find(*first) == root)
                .fold((0.0, 0), |(s, c), (_, sum, n)| (s + sum, c + n));
            let interline = if gap_count > 0 {
                gap_sum / gap_count as f64
            } else {
                self.interline as f64
            };

            match self.build_cluster(&members, interline, factory, lag) {
                Some((cluster, used)) => {
                    for i in used {
                        kept[i] = true;
                    }
                    self.clusters.push(cluster);
                }
                None => {
                    debug!(members = members.len(); "Group does not match a staff");
                }
            }
        }

        let discarded: Vec<FilamentId> = self
            .candidates
            .iter()
            .zip(&kept)
            .filter(|(_, kept)| !**kept)
            .map(|(id, _)| *id)
            .collect();

        info!(
            interline = self.interline,
            clusters = self.clusters.len(),
            discarded = discarded.len();
            "Clusters retrieved"
        );
        discarded
    }

    fn abscissa_range(&self, factory: &FilamentsFactory) -> (f64, f64) {
        self.candidates
            .iter()
            .filter_map(|id| factory.filament(*id))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), f| {
                (lo.min(f.start_point().x()), hi.max(f.stop_point().x()))
            })
    }

    /// Window of `line_count` consecutive teeth with the longest filaments
    fn best_window<'t>(
        &self,
        chain: &'t [(f64, usize)],
        factory: &FilamentsFactory,
    ) -> &'t [(f64, usize)] {
        let length = |i: usize| {
            factory
                .filament(self.candidates[i])
                .map_or(0.0, |f| f.length())
        };
        let best = (0..=chain.len() - self.line_count)
            .map(|start| {
                let total: f64 = chain[start..start + self.line_count]
                    .iter()
                    .map(|(_, i)| length(*i))
                    .sum();
                (start, total)
            })
            .fold((0, f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });
        &chain[best.0..best.0 + self.line_count]
    }

    /// Splits a group into lines and merges the fragments of each line.
    ///
    /// Returns the cluster with the group members it uses.
    fn build_cluster(
        &self,
        members: &[usize],
        interline: f64,
        factory: &mut FilamentsFactory,
        lag: &mut Lag,
    ) -> Option<(LineCluster, Vec<usize>)> {
        let ref_x = members
            .iter()
            .filter_map(|i| factory.filament(self.candidates[*i]))
            .map(|f| f.start_point().x())
            .fold(f64::INFINITY, f64::min);

        // Ordinate of each member brought back to the reference abscissa
        let mut projected: Vec<(f64, usize)> = members
            .iter()
            .filter_map(|i| {
                let f = factory.filament(self.candidates[*i])?;
                let center_x = (f.start_point().x() + f.stop_point().x()) / 2.0;
                let y = f.position_at(center_x) - self.global_slope * (center_x - ref_x);
                Some((y, *i))
            })
            .collect();
        projected.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut lines: Vec<Vec<usize>> = Vec::new();
        let mut last_y = f64::NEG_INFINITY;
        for (y, i) in projected {
            match lines.last_mut() {
                Some(line) if y - last_y <= interline / 2.0 => line.push(i),
                _ => lines.push(vec![i]),
            }
            last_y = y;
        }

        if lines.len() < self.line_count {
            return None;
        }
        if lines.len() > self.line_count {
            let start = self.longest_lines(&lines, factory);
            debug!(lines = lines.len(), kept_from = start; "Group trimmed to staff lines");
            lines = lines.drain(start..start + self.line_count).collect();
        }
        let used: Vec<usize> = lines.iter().flatten().copied().collect();
        let lines: Vec<Vec<FilamentId>> = lines
            .into_iter()
            .map(|line| line.into_iter().map(|i| self.candidates[i]).collect())
            .collect();

        let mut mains = Vec::with_capacity(lines.len());
        for line in lines {
            let main = line
                .iter()
                .copied()
                .max_by(|a, b| {
                    let la = factory.filament(*a).map_or(0.0, |f| f.length());
                    let lb = factory.filament(*b).map_or(0.0, |f| f.length());
                    la.total_cmp(&lb).then(b.cmp(a))
                })?;
            for other in line.into_iter().filter(|id| *id != main) {
                factory.merge(main, other, lag);
            }
            mains.push(main);
        }

        let bounds = mains
            .iter()
            .filter_map(|id| factory.filament(*id))
            .map(|f| {
                let (start, stop) = (f.start_point(), f.stop_point());
                Bounds::new(start.x(), start.y(), stop.x(), stop.y())
            })
            .reduce(|a, b| a.merge(&b))?;

        let cluster = LineCluster {
            interline,
            lines: mains,
            bounds,
        };
        Some((cluster, used))
    }

    /// First index of the `line_count` consecutive lines of greatest length
    fn longest_lines(&self, lines: &[Vec<usize>], factory: &FilamentsFactory) -> usize {
        let line_length = |line: &Vec<usize>| -> f64 {
            line.iter()
                .filter_map(|i| factory.filament(self.candidates[*i]))
                .map(|f| f.length())
                .sum()
        };
        let lengths: Vec<f64> = lines.iter().map(line_length).collect();
        lengths
            .windows(self.line_count)
            .map(|window| window.iter().sum::<f64>())
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (start, total)| {
                if total > best.1 { (start, total) } else { best }
            })
            .0
    }
}

/// Splits teeth sorted by ordinate into chains of regularly spaced teeth
fn split_chains(teeth: &[(f64, usize)], min_gap: f64, max_gap: f64) -> Vec<&[(f64, usize)]> {
    let mut chains = Vec::new();
    let mut start = 0;
    for i in 1..=teeth.len() {
        let breaks = i == teeth.len() || {
            let gap = teeth[i].0 - teeth[i - 1].0;
            gap < min_gap || gap > max_gap
        };
        if breaks {
            chains.push(&teeth[start..i]);
            start = i;
        }
    }
    chains
}
