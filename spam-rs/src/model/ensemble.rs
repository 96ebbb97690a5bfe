//! Soft-voting ensemble
//!
//! Naive Bayes, a random forest and gradient boosting are trained on the same
//! rows; the ensemble output is the weighted average of their class
//! probabilities.

use serde::{Deserialize, Serialize};

use super::boosting::{BoostingParams, GradientBoosting};
use super::forest::{ForestParams, RandomForest};
use super::naive_bayes::{MultinomialNb, NaiveBayesParams};
use super::sparse::FeatureVector;
use super::types::{ClassProbabilities, Label};
use crate::config::TrainingConfig;
use crate::error::{Result, SpamError};

/// A trained model producing per-class probabilities
pub trait ProbabilisticClassifier {
    /// Stable member name used in logs and metadata
    fn name(&self) -> &'static str;

    /// Feature-space width fixed at fit time
    fn n_features(&self) -> usize;

    /// Probabilities for one row of width `n_features()`
    fn predict_proba(&self, x: &FeatureVector) -> ClassProbabilities;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnsembleMember {
    NaiveBayes(MultinomialNb),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
}

impl EnsembleMember {
    fn classifier(&self) -> &dyn ProbabilisticClassifier {
        match self {
            EnsembleMember::NaiveBayes(m) => m,
            EnsembleMember::RandomForest(m) => m,
            EnsembleMember::GradientBoosting(m) => m,
        }
    }

    fn is_well_formed(&self) -> bool {
        match self {
            EnsembleMember::NaiveBayes(m) => m.is_well_formed(),
            EnsembleMember::RandomForest(m) => m.is_well_formed(),
            EnsembleMember::GradientBoosting(m) => m.is_well_formed(),
        }
    }
}

impl ProbabilisticClassifier for EnsembleMember {
    fn name(&self) -> &'static str {
        self.classifier().name()
    }

    fn n_features(&self) -> usize {
        self.classifier().n_features()
    }

    fn predict_proba(&self, x: &FeatureVector) -> ClassProbabilities {
        self.classifier().predict_proba(x)
    }
}

/// Hyper-parameters for all three members plus their vote weights
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnsembleParams {
    pub naive_bayes: NaiveBayesParams,
    pub forest: ForestParams,
    pub boosting: BoostingParams,
    /// Weights for naive Bayes, random forest, gradient boosting
    pub weights: [f64; 3],
}

impl Default for EnsembleParams {
    fn default() -> Self {
        Self {
            naive_bayes: NaiveBayesParams::default(),
            forest: ForestParams::default(),
            boosting: BoostingParams::default(),
            weights: [1.0, 1.0, 1.0],
        }
    }
}

impl From<&TrainingConfig> for EnsembleParams {
    fn from(config: &TrainingConfig) -> Self {
        Self {
            naive_bayes: NaiveBayesParams {
                alpha: config.nb_alpha,
            },
            forest: ForestParams {
                n_trees: config.n_forest_trees,
                max_depth: config.forest_max_depth,
                min_samples_split: config.min_samples_split,
                seed: config.seed,
            },
            boosting: BoostingParams {
                n_rounds: config.n_boosting_rounds,
                learning_rate: config.learning_rate,
                max_depth: config.boosting_max_depth,
                min_samples_split: config.min_samples_split,
                seed: config.seed,
            },
            weights: config.member_weights,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftVotingEnsemble {
    n_features: usize,
    members: Vec<(EnsembleMember, f64)>,
}

impl SoftVotingEnsemble {
    pub fn fit(rows: &[FeatureVector], labels: &[Label], params: &EnsembleParams) -> Result<Self> {
        if rows.len() != labels.len() {
            return Err(SpamError::Corpus(format!(
                "{} feature rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        let first = rows.first().ok_or(SpamError::EmptyCorpus)?;
        let n_features = first.dim();
        if let Some(row) = rows.iter().find(|r| r.dim() != n_features) {
            return Err(SpamError::DimensionMismatch {
                expected: n_features,
                actual: row.dim(),
            });
        }
        if !labels.contains(&Label::Spam) || !labels.contains(&Label::Ham) {
            return Err(SpamError::Corpus(
                "training data must contain both spam and ham examples".to_string(),
            ));
        }
        let weight_sum: f64 = params.weights.iter().sum();
        if params.weights.iter().any(|w| *w < 0.0) || weight_sum <= 0.0 {
            return Err(SpamError::Config(
                "ensemble weights must be non-negative with a positive sum".to_string(),
            ));
        }

        tracing::info!(
            "Training ensemble on {} rows x {} features",
            rows.len(),
            n_features
        );

        let started = std::time::Instant::now();
        let nb = MultinomialNb::fit(rows, labels, n_features, &params.naive_bayes);
        tracing::info!("naive_bayes trained in {:?}", started.elapsed());

        let started = std::time::Instant::now();
        let forest = RandomForest::fit(rows, labels, n_features, &params.forest);
        tracing::info!(
            "random_forest trained in {:?} ({} trees)",
            started.elapsed(),
            forest.n_trees()
        );

        let started = std::time::Instant::now();
        let boosting = GradientBoosting::fit(rows, labels, n_features, &params.boosting);
        tracing::info!(
            "gradient_boosting trained in {:?} ({} rounds)",
            started.elapsed(),
            boosting.n_rounds()
        );

        Ok(Self {
            n_features,
            members: vec![
                (EnsembleMember::NaiveBayes(nb), params.weights[0]),
                (EnsembleMember::RandomForest(forest), params.weights[1]),
                (EnsembleMember::GradientBoosting(boosting), params.weights[2]),
            ],
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn members(&self) -> impl Iterator<Item = (&EnsembleMember, f64)> {
        self.members.iter().map(|(m, w)| (m, *w))
    }

    pub fn predict_proba(&self, x: &FeatureVector) -> Result<ClassProbabilities> {
        if x.dim() != self.n_features {
            return Err(SpamError::DimensionMismatch {
                expected: self.n_features,
                actual: x.dim(),
            });
        }

        let mut ham = 0.0;
        let mut spam = 0.0;
        let mut total_weight = 0.0;
        for (member, weight) in &self.members {
            let probs = member.predict_proba(x);
            ham += weight * probs.ham;
            spam += weight * probs.spam;
            total_weight += weight;
        }

        Ok(ClassProbabilities {
            ham: ham / total_weight,
            spam: spam / total_weight,
        }
        .normalized())
    }

    /// Per-member probabilities, for diagnostics
    pub fn member_probabilities(&self, x: &FeatureVector) -> Result<Vec<(&'static str, ClassProbabilities)>> {
        if x.dim() != self.n_features {
            return Err(SpamError::DimensionMismatch {
                expected: self.n_features,
                actual: x.dim(),
            });
        }
        Ok(self
            .members
            .iter()
            .map(|(m, _)| (m.name(), m.predict_proba(x)))
            .collect())
    }

    /// Every member agrees on the feature width and is structurally sound
    pub(crate) fn is_consistent(&self) -> bool {
        let weight_sum: f64 = self.members.iter().map(|(_, w)| *w).sum();
        !self.members.is_empty()
            && weight_sum > 0.0
            && self.members.iter().all(|(m, w)| {
                *w >= 0.0 && m.n_features() == self.n_features && m.is_well_formed()
            })
    }
}
