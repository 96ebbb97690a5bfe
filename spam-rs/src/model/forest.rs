//! Random forest: bagged classification trees

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::ensemble::ProbabilisticClassifier;
use super::sparse::FeatureVector;
use super::tree::{RegressionTree, TreeParams};
use super::types::{ClassProbabilities, Label};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Each tree sees a bootstrap resample of the rows and considers
    /// `sqrt(n_features)` candidate features per split. Leaves hold the
    /// bootstrap-weighted spam fraction.
    pub(crate) fn fit(
        rows: &[FeatureVector],
        labels: &[Label],
        n_features: usize,
        params: &ForestParams,
    ) -> Self {
        let n = rows.len();
        let targets: Vec<f64> = labels.iter().map(|l| l.target()).collect();
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            max_features: Some(((n_features as f64).sqrt() as usize).max(1)),
        };

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_trees);

        for t in 0..params.n_trees {
            let mut weights = vec![0.0f64; n];
            for _ in 0..n {
                weights[rng.gen_range(0..n)] += 1.0;
            }

            let leaf_value = |samples: &[u32]| {
                let (num, den) = samples.iter().fold((0.0, 0.0), |(num, den), &s| {
                    let w = weights[s as usize];
                    (num + w * targets[s as usize], den + w)
                });
                if den > 0.0 {
                    num / den
                } else {
                    0.5
                }
            };

            let tree = RegressionTree::fit(rows, &targets, &weights, &tree_params, &mut rng, leaf_value);
            trees.push(tree);

            if (t + 1) % 25 == 0 {
                tracing::debug!("Random forest: {}/{} trees grown", t + 1, params.n_trees);
            }
        }

        Self { n_features, trees }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        !self.trees.is_empty() && self.trees.iter().all(|t| t.is_well_formed(self.n_features))
    }
}

impl ProbabilisticClassifier for RandomForest {
    fn name(&self) -> &'static str {
        "random_forest"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: &FeatureVector) -> ClassProbabilities {
        let p_spam = self.trees.iter().map(|t| t.predict(x)).sum::<f64>() / self.trees.len() as f64;
        ClassProbabilities::from_spam(p_spam)
    }
}
