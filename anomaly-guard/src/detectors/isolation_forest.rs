//! Isolation forest over a single numeric feature.
//!
//! Points are isolated by random recursive partitioning. Outliers need fewer
//! splits to isolate, so their average path length is shorter.
//!
//! # Algorithm
//!
//! 1. Build `n_estimators` trees, each on a subsample of `ψ = min(max_samples, n)`
//!    values drawn without replacement
//! 2. Each tree splits at a uniform random point in `[min, max)` of its node,
//!    down to a depth limit of `ceil(log2(ψ))`
//! 3. A leaf holding `m` values adds `c(m) = 2H(m-1) - 2(m-1)/m` to the path
//! 4. The anomaly score is `s = 2^(-E[h]/c(ψ))`, and the decision score is
//!    `0.5 - s` (lower means more anomalous)
//!
//! The forest is driven by a seeded [`StdRng`], so the same input and
//! parameters always produce the same scores.

use rand::distr::Uniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::DetectorError;

/// Default subsample cap per tree.
pub const DEFAULT_MAX_SAMPLES: usize = 256;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Parameters for fitting an [`IsolationForest`].
#[derive(Debug, Clone, PartialEq)]
pub struct ForestParams {
    /// Number of trees. Default: 100.
    pub n_estimators: usize,
    /// Subsample size per tree. `None` means `min(256, n)`.
    pub max_samples: Option<usize>,
    /// Seed for the tree builder. Default: 42.
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: None,
            seed: 42,
        }
    }
}

impl ForestParams {
    /// Sets the number of trees.
    pub fn n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Sets the subsample size per tree.
    pub fn max_samples(mut self, m: usize) -> Self {
        self.max_samples = Some(m);
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

enum Node {
    Split {
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

/// A fitted ensemble of isolation trees.
pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
}

impl std::fmt::Debug for IsolationForest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IsolationForest")
            .field("trees", &self.trees.len())
            .field("sample_size", &self.sample_size)
            .finish()
    }
}

impl IsolationForest {
    /// Fits a forest to `values`.
    ///
    /// Fails on fewer than two values, on NaN or infinite values, on a value
    /// range too wide to sample (`max - min` overflows), and on zero trees or
    /// a zero subsample size.
    pub fn fit(values: &[f64], params: &ForestParams) -> Result<Self, DetectorError> {
        let n = values.len();
        if n < 2 {
            return Err(DetectorError::degenerate(format!(
                "isolation forest needs at least 2 values, got {n}"
            )));
        }
        if let Some((row, value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(DetectorError::degenerate(format!(
                "non-finite value {value} at sample {row}"
            )));
        }
        if params.n_estimators == 0 {
            return Err(DetectorError::invalid_parameter(
                "n_estimators",
                "must be at least 1",
            ));
        }
        if params.max_samples == Some(0) {
            return Err(DetectorError::invalid_parameter(
                "max_samples",
                "must be at least 1",
            ));
        }

        let sample_size = params.max_samples.unwrap_or(DEFAULT_MAX_SAMPLES).min(n);
        let max_depth = (sample_size.max(2) as f64).log2().ceil() as usize;

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_estimators);
        for _ in 0..params.n_estimators {
            let subsample: Vec<f64> = if sample_size < n {
                rand::seq::index::sample(&mut rng, n, sample_size)
                    .into_iter()
                    .map(|i| values[i])
                    .collect()
            } else {
                values.to_vec()
            };
            trees.push(build_tree(&subsample, max_depth, &mut rng)?);
        }

        Ok(Self { trees, sample_size })
    }

    /// Number of trees in the ensemble.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Subsample size each tree was built on.
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Mean path length of `value` across all trees.
    pub fn path_length(&self, value: f64) -> f64 {
        let total: f64 = self
            .trees
            .iter()
            .map(|tree| tree_path_length(tree, value, 0))
            .sum();
        total / self.trees.len() as f64
    }

    /// Anomaly score in `(0, 1]`. Values near 1 are easy to isolate.
    pub fn anomaly_score(&self, value: f64) -> f64 {
        let cn = average_path_length(self.sample_size);
        if cn > 0.0 {
            2.0f64.powf(-self.path_length(value) / cn)
        } else {
            0.5
        }
    }

    /// Decision score per value: `0.5 - anomaly_score`. Lower is more anomalous.
    pub fn decision_function(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .map(|&value| 0.5 - self.anomaly_score(value))
            .collect()
    }
}

fn build_tree(
    values: &[f64],
    depth_left: usize,
    rng: &mut StdRng,
) -> Result<Node, DetectorError> {
    let n = values.len();
    if n <= 1 || depth_left == 0 {
        return Ok(Node::Leaf { size: n });
    }

    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if min >= max {
        return Ok(Node::Leaf { size: n });
    }

    // threshold < max keeps both sides non-empty
    let split = Uniform::new(min, max).map_err(|e| {
        DetectorError::degenerate(format!("cannot split range [{min}, {max}): {e}"))
    })?;
    let threshold = rng.sample(split);
    let (left, right): (Vec<f64>, Vec<f64>) = values.iter().partition(|&&v| v <= threshold);

    Ok(Node::Split {
        threshold,
        left: Box::new(build_tree(&left, depth_left - 1, rng)?),
        right: Box::new(build_tree(&right, depth_left - 1, rng)?),
    })
}

fn tree_path_length(node: &Node, value: f64, depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split {
            threshold,
            left,
            right,
        } => {
            if value <= *threshold {
                tree_path_length(left, value, depth + 1)
            } else {
                tree_path_length(right, value, depth + 1)
            }
        }
    }
}

/// Average path length of an unsuccessful search in a binary search tree of `n` nodes.
///
/// `c(n) = 2H(n-1) - 2(n-1)/n` with `H(i) ≈ ln(i) + γ`.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Percentile `q` (in `[0, 100]`) with linear interpolation between order statistics.
///
/// Returns `None` for an empty slice or `q` out of range.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let fraction = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_with_outlier() -> Vec<f64> {
        let mut values: Vec<f64> = (0..50).map(|i| 10.0 + (i % 7) as f64 * 0.1).collect();
        values.push(500.0);
        values
    }

    #[test]
    fn test_outlier_has_highest_score() {
        let values = cluster_with_outlier();
        let forest = IsolationForest::fit(&values, &ForestParams::default()).unwrap();
        let scores: Vec<f64> = values.iter().map(|&v| forest.anomaly_score(v)).collect();
        let max_idx = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap()
            .0;
        assert_eq!(max_idx, 50);
        assert!(scores[50] > 0.5);
    }

    #[test]
    fn test_decision_is_lowest_for_outlier() {
        let values = cluster_with_outlier();
        let forest = IsolationForest::fit(&values, &ForestParams::default()).unwrap();
        let decision = forest.decision_function(&values);
        let min_idx = decision
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .unwrap()
            .0;
        assert_eq!(min_idx, 50);
        assert!(decision[50] < 0.0);
    }

    #[test]
    fn test_same_seed_same_scores() {
        let values = cluster_with_outlier();
        let params = ForestParams::default().seed(7);
        let a = IsolationForest::fit(&values, &params).unwrap();
        let b = IsolationForest::fit(&values, &params).unwrap();
        assert_eq!(a.decision_function(&values), b.decision_function(&values));
    }

    #[test]
    fn test_sample_size_is_capped() {
        let values: Vec<f64> = (0..1000).map(f64::from).collect();
        let forest = IsolationForest::fit(&values, &ForestParams::default().n_estimators(5)).unwrap();
        assert_eq!(forest.sample_size(), 256);
        assert_eq!(forest.n_trees(), 5);

        let small = IsolationForest::fit(&[1.0, 2.0, 3.0], &ForestParams::default()).unwrap();
        assert_eq!(small.sample_size(), 3);
    }

    #[test]
    fn test_rejects_range_too_wide_to_split() {
        let err = IsolationForest::fit(&[-1e308, 1e308, 0.0, 1.0], &ForestParams::default())
            .unwrap_err();
        assert!(matches!(err, DetectorError::DegenerateInput(_)));
        assert!(err.to_string().contains("cannot split range"));
    }

    #[test]
    fn test_rejects_bad_input() {
        let params = ForestParams::default();
        assert!(matches!(
            IsolationForest::fit(&[1.0], &params),
            Err(DetectorError::DegenerateInput(_))
        ));
        assert!(matches!(
            IsolationForest::fit(&[1.0, f64::NAN, 3.0], &params),
            Err(DetectorError::DegenerateInput(_))
        ));
        assert!(matches!(
            IsolationForest::fit(&[1.0, f64::INFINITY], &params),
            Err(DetectorError::DegenerateInput(_))
        ));
        assert!(matches!(
            IsolationForest::fit(&[1.0, 2.0], &params.clone().n_estimators(0)),
            Err(DetectorError::InvalidParameter { .. })
        ));
        assert!(matches!(
            IsolationForest::fit(&[1.0, 2.0], &ForestParams::default().max_samples(0)),
            Err(DetectorError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        // 2 * (ln 255 + γ) - 2 * 255 / 256
        let c256 = average_path_length(256);
        assert!((c256 - 10.244_770_920_119_917).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 50.0), Some(3.0));
        assert_eq!(percentile(&values, 100.0), Some(5.0));
        let p = percentile(&values, 5.0).unwrap();
        assert!((p - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_ties_and_bounds() {
        assert_eq!(percentile(&[2.0, 2.0, 9.0], 5.0), Some(2.0));
        assert_eq!(percentile(&[], 5.0), None);
        assert_eq!(percentile(&[1.0], 101.0), None);
        assert_eq!(percentile(&[4.0, 1.0, 3.0], 50.0), Some(3.0));
    }
}
