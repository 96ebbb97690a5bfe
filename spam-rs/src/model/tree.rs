//! CART regression trees over sparse rows
//!
//! Splits minimise the weighted sum of squared errors of the children. For
//! 0/1 targets this is the binary Gini criterion, so the same builder grows
//! the random forest's classification trees and the boosting rounds'
//! residual trees. Leaf values are supplied by the caller.
//!
//! Zero is the implicit value of every absent feature, so a feature is only a
//! split candidate at a node if at least one sample there has it non-zero.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::sparse::FeatureVector;

const EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Non-constant features inspected per split (`None` = all of them)
    pub max_features: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: u32,
        threshold: f64,
        left: u32,
        right: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Stats {
    weight: f64,
    sum: f64,
    sum_sq: f64,
}

impl Stats {
    fn of(weight: f64, y: f64) -> Self {
        Self {
            weight,
            sum: weight * y,
            sum_sq: weight * y * y,
        }
    }

    fn add(&mut self, other: &Stats) {
        self.weight += other.weight;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
    }

    fn minus(&self, other: &Stats) -> Stats {
        Stats {
            weight: self.weight - other.weight,
            sum: self.sum - other.sum,
            sum_sq: self.sum_sq - other.sum_sq,
        }
    }

    fn sse(&self) -> f64 {
        if self.weight <= EPS {
            0.0
        } else {
            (self.sum_sq - self.sum * self.sum / self.weight).max(0.0)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: u32,
    threshold: f64,
    sse: f64,
}

impl RegressionTree {
    /// Grow a tree on the samples with non-zero `weights`.
    ///
    /// `leaf_value` maps the sample indices reaching a leaf to its output.
    pub(crate) fn fit<F>(
        rows: &[FeatureVector],
        targets: &[f64],
        weights: &[f64],
        params: &TreeParams,
        rng: &mut StdRng,
        leaf_value: F,
    ) -> Self
    where
        F: Fn(&[u32]) -> f64,
    {
        let samples: Vec<u32> = (0..rows.len())
            .filter(|&i| weights[i] > 0.0)
            .map(|i| i as u32)
            .collect();

        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut stack = vec![(0usize, samples, 0usize)];

        while let Some((node, samples, depth)) = stack.pop() {
            let total = samples.iter().fold(Stats::default(), |mut acc, &s| {
                acc.add(&Stats::of(weights[s as usize], targets[s as usize]));
                acc
            });

            let splittable = samples.len() >= params.min_samples_split
                && params.max_depth.map_or(true, |max| depth < max)
                && total.sse() > EPS;

            let split = if splittable {
                best_split(rows, targets, weights, &samples, &total, params, rng)
            } else {
                None
            };

            match split {
                Some(best) => {
                    let (left, right): (Vec<u32>, Vec<u32>) = samples
                        .iter()
                        .partition(|&&s| rows[s as usize].get(best.feature) <= best.threshold);

                    let left_idx = nodes.len();
                    nodes.push(Node::Leaf { value: 0.0 });
                    let right_idx = nodes.len();
                    nodes.push(Node::Leaf { value: 0.0 });

                    nodes[node] = Node::Split {
                        feature: best.feature,
                        threshold: best.threshold,
                        left: left_idx as u32,
                        right: right_idx as u32,
                    };
                    stack.push((right_idx, right, depth + 1));
                    stack.push((left_idx, left, depth + 1));
                }
                None => {
                    nodes[node] = Node::Leaf {
                        value: leaf_value(&samples),
                    };
                }
            }
        }

        Self { nodes }
    }

    pub fn predict(&self, x: &FeatureVector) -> f64 {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x.get(*feature) <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Structural check used after deserialisation: children point forward
    /// (so traversal terminates) and features fit in `n_features`.
    pub fn is_well_formed(&self, n_features: usize) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(idx, node)| match node {
                Node::Leaf { value } => value.is_finite(),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    (*feature as usize) < n_features
                        && threshold.is_finite()
                        && (*left as usize) > idx
                        && (*right as usize) > idx
                        && (*left as usize) < self.nodes.len()
                        && (*right as usize) < self.nodes.len()
                }
            })
    }
}

fn best_split(
    rows: &[FeatureVector],
    targets: &[f64],
    weights: &[f64],
    samples: &[u32],
    total: &Stats,
    params: &TreeParams,
    rng: &mut StdRng,
) -> Option<SplitCandidate> {
    // (feature, value, sample), grouped by feature and ascending by value
    let mut entries: Vec<(u32, f64, u32)> = samples
        .iter()
        .flat_map(|&s| rows[s as usize].iter().map(move |(f, v)| (f, v, s)))
        .collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let mut groups: Vec<(usize, usize)> = Vec::new();
    let mut start = 0;
    for i in 1..=entries.len() {
        if i == entries.len() || entries[i].0 != entries[start].0 {
            groups.push((start, i));
            start = i;
        }
    }

    if params.max_features.is_some() {
        groups.shuffle(rng);
    }
    let budget = params.max_features.unwrap_or(usize::MAX);
    let parent_sse = total.sse();

    let mut best: Option<SplitCandidate> = None;
    let mut inspected = 0usize;
    for (start, end) in groups {
        // keep looking past the budget until some split is found
        if inspected >= budget && best.is_some() {
            break;
        }
        inspected += 1;

        let feature = entries[start].0;
        if let Some(candidate) =
            best_split_for_feature(feature, &entries[start..end], targets, weights, total)
        {
            if candidate.sse < parent_sse - EPS
                && best.map_or(true, |b| candidate.sse < b.sse)
            {
                best = Some(candidate);
            }
        }
    }

    best
}

/// Scan sorted non-zero `entries` of one feature, with the node's remaining
/// samples forming an implicit group at value zero.
fn best_split_for_feature(
    feature: u32,
    entries: &[(u32, f64, u32)],
    targets: &[f64],
    weights: &[f64],
    total: &Stats,
) -> Option<SplitCandidate> {
    let mut nonzero = Stats::default();
    for &(_, _, s) in entries {
        nonzero.add(&Stats::of(weights[s as usize], targets[s as usize]));
    }
    let zero = total.minus(&nonzero);

    let mut points: Vec<(f64, Stats)> = Vec::with_capacity(entries.len() + 1);
    let mut zero_placed = zero.weight <= EPS;
    for &(_, value, s) in entries {
        if !zero_placed && value > 0.0 {
            points.push((0.0, zero));
            zero_placed = true;
        }
        points.push((value, Stats::of(weights[s as usize], targets[s as usize])));
    }
    if !zero_placed {
        points.push((0.0, zero));
    }

    let mut best: Option<SplitCandidate> = None;
    let mut left = Stats::default();
    for pair in points.windows(2) {
        let (lo, stats) = pair[0];
        let hi = pair[1].0;
        left.add(&stats);
        if hi <= lo {
            continue;
        }

        let right = total.minus(&left);
        if left.weight <= EPS || right.weight <= EPS {
            continue;
        }

        let sse = left.sse() + right.sse();
        if best.map_or(true, |b| sse < b.sse) {
            let mid = lo + (hi - lo) / 2.0;
            let threshold = if mid < hi { mid } else { lo };
            best = Some(SplitCandidate {
                feature,
                threshold,
                sse,
            });
        }
    }

    best
}
