//! Gradient boosted trees with binary log-loss

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::ensemble::ProbabilisticClassifier;
use super::sparse::FeatureVector;
use super::tree::{RegressionTree, TreeParams};
use super::types::{ClassProbabilities, Label};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_rounds: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    n_features: usize,
    /// Log-odds of the training spam rate
    init: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoosting {
    /// Each round fits a depth-limited tree to the log-loss residuals
    /// `y - p` and sets leaf values with one Newton step,
    /// `sum(residual) / sum(p * (1 - p))`.
    pub(crate) fn fit(
        rows: &[FeatureVector],
        labels: &[Label],
        n_features: usize,
        params: &BoostingParams,
    ) -> Self {
        let n = rows.len();
        let targets: Vec<f64> = labels.iter().map(|l| l.target()).collect();
        let weights = vec![1.0f64; n];
        let tree_params = TreeParams {
            max_depth: Some(params.max_depth),
            min_samples_split: params.min_samples_split,
            max_features: None,
        };

        let prior = (targets.iter().sum::<f64>() / n as f64).clamp(1e-15, 1.0 - 1e-15);
        let init = (prior / (1.0 - prior)).ln();
        let mut raw = vec![init; n];
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_rounds);

        for round in 0..params.n_rounds {
            let probs: Vec<f64> = raw.iter().map(|f| sigmoid(*f)).collect();
            let residuals: Vec<f64> = targets.iter().zip(&probs).map(|(y, p)| y - p).collect();

            let leaf_value = |samples: &[u32]| {
                let (num, den) = samples.iter().fold((0.0, 0.0), |(num, den), &s| {
                    let p = probs[s as usize];
                    (num + residuals[s as usize], den + p * (1.0 - p))
                });
                if den.abs() < 1e-150 {
                    0.0
                } else {
                    num / den
                }
            };

            let tree = RegressionTree::fit(rows, &residuals, &weights, &tree_params, &mut rng, leaf_value);
            for (f, row) in raw.iter_mut().zip(rows) {
                *f += params.learning_rate * tree.predict(row);
            }
            trees.push(tree);

            if (round + 1) % 25 == 0 {
                let loss = log_loss(&targets, &raw);
                tracing::debug!(
                    "Gradient boosting: round {}/{} training log-loss {:.5}",
                    round + 1,
                    params.n_rounds,
                    loss
                );
            }
        }

        Self {
            n_features,
            init,
            learning_rate: params.learning_rate,
            trees,
        }
    }

    /// Raw log-odds score before the sigmoid
    pub fn decision_function(&self, x: &FeatureVector) -> f64 {
        self.init + self.learning_rate * self.trees.iter().map(|t| t.predict(x)).sum::<f64>()
    }

    pub fn n_rounds(&self) -> usize {
        self.trees.len()
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        self.init.is_finite()
            && self.learning_rate.is_finite()
            && !self.trees.is_empty()
            && self.trees.iter().all(|t| t.is_well_formed(self.n_features))
    }
}

impl ProbabilisticClassifier for GradientBoosting {
    fn name(&self) -> &'static str {
        "gradient_boosting"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: &FeatureVector) -> ClassProbabilities {
        ClassProbabilities::from_spam(sigmoid(self.decision_function(x)))
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn log_loss(targets: &[f64], raw: &[f64]) -> f64 {
    let total: f64 = targets
        .iter()
        .zip(raw)
        .map(|(y, f)| {
            let p = sigmoid(*f).clamp(1e-15, 1.0 - 1e-15);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    total / targets.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> (Vec<FeatureVector>, Vec<Label>) {
        let rows = vec![
            FeatureVector::from_pairs(3, vec![(0, 0.9)]),
            FeatureVector::from_pairs(3, vec![(0, 0.6), (2, 0.4)]),
            FeatureVector::from_pairs(3, vec![(0, 0.7)]),
            FeatureVector::from_pairs(3, vec![(1, 0.8)]),
            FeatureVector::from_pairs(3, vec![(1, 0.5), (2, 0.5)]),
            FeatureVector::from_pairs(3, vec![(2, 1.0)]),
        ];
        let labels = vec![
            Label::Spam,
            Label::Spam,
            Label::Spam,
            Label::Ham,
            Label::Ham,
            Label::Ham,
        ];
        (rows, labels)
    }

    #[test]
    fn test_init_is_prior_log_odds() {
        let (rows, labels) = dataset();
        let model = GradientBoosting::fit(&rows, &labels, 3, &BoostingParams {
            n_rounds: 1,
            ..BoostingParams::default()
        });
        assert!(model.init.abs() < 1e-12);
        assert_eq!(model.n_rounds(), 1);
    }

    #[test]
    fn test_boosting_fits_training_data() {
        let (rows, labels) = dataset();
        let model = GradientBoosting::fit(&rows, &labels, 3, &BoostingParams::default());
        assert!(model.is_well_formed());

        for (row, label) in rows.iter().zip(&labels) {
            let probs = model.predict_proba(row);
            assert_eq!(probs.label(), *label);
            assert!((probs.ham + probs.spam - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_more_rounds_lower_loss() {
        let (rows, labels) = dataset();
        let targets: Vec<f64> = labels.iter().map(|l| l.target()).collect();
        let loss_for = |rounds| {
            let model = GradientBoosting::fit(&rows, &labels, 3, &BoostingParams {
                n_rounds: rounds,
                ..BoostingParams::default()
            });
            let raw: Vec<f64> = rows.iter().map(|r| model.decision_function(r)).collect();
            log_loss(&targets, &raw)
        };
        assert!(loss_for(50) < loss_for(5));
    }
}
