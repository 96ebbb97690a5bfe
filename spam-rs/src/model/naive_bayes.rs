//! Multinomial naive Bayes over TF-IDF features

use serde::{Deserialize, Serialize};

use super::ensemble::ProbabilisticClassifier;
use super::sparse::FeatureVector;
use super::types::{ClassProbabilities, Label};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NaiveBayesParams {
    /// Additive (Laplace) smoothing
    pub alpha: f64,
}

impl Default for NaiveBayesParams {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialNb {
    n_features: usize,
    /// Log class priors, indexed ham = 0, spam = 1
    class_log_prior: [f64; 2],
    /// Smoothed log P(feature | class), one row per class
    feature_log_prob: [Vec<f64>; 2],
}

impl MultinomialNb {
    /// Caller guarantees both classes are present and rows share `n_features`.
    pub(crate) fn fit(
        rows: &[FeatureVector],
        labels: &[Label],
        n_features: usize,
        params: &NaiveBayesParams,
    ) -> Self {
        let mut feature_count = [vec![0.0f64; n_features], vec![0.0f64; n_features]];
        let mut class_count = [0.0f64; 2];

        for (row, label) in rows.iter().zip(labels) {
            let class = class_index(*label);
            class_count[class] += 1.0;
            for (idx, value) in row.iter() {
                feature_count[class][idx as usize] += value;
            }
        }

        let total = class_count[0] + class_count[1];
        let class_log_prior = [
            (class_count[0] / total).ln(),
            (class_count[1] / total).ln(),
        ];

        let feature_log_prob = feature_count.map(|counts| {
            let denom = (counts.iter().sum::<f64>() + params.alpha * n_features as f64).ln();
            counts
                .iter()
                .map(|count| (count + params.alpha).ln() - denom)
                .collect::<Vec<f64>>()
        });

        Self {
            n_features,
            class_log_prior,
            feature_log_prob,
        }
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        self.class_log_prior.iter().all(|p| p.is_finite())
            && self
                .feature_log_prob
                .iter()
                .all(|row| row.len() == self.n_features && row.iter().all(|p| p.is_finite()))
    }

    fn joint_log_likelihood(&self, x: &FeatureVector) -> [f64; 2] {
        let mut jll = self.class_log_prior;
        for (idx, value) in x.iter() {
            jll[0] += value * self.feature_log_prob[0][idx as usize];
            jll[1] += value * self.feature_log_prob[1][idx as usize];
        }
        jll
    }
}

impl ProbabilisticClassifier for MultinomialNb {
    fn name(&self) -> &'static str {
        "naive_bayes"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: &FeatureVector) -> ClassProbabilities {
        let [ham, spam] = self.joint_log_likelihood(x);
        // log-sum-exp around the larger term
        let max = ham.max(spam);
        let ham = (ham - max).exp();
        let spam = (spam - max).exp();
        ClassProbabilities { ham, spam }.normalized()
    }
}

fn class_index(label: Label) -> usize {
    match label {
        Label::Ham => 0,
        Label::Spam => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> (Vec<FeatureVector>, Vec<Label>) {
        // feature 0 = "prize", feature 1 = "lunch", feature 2 = "notes"
        let rows = vec![
            FeatureVector::from_pairs(3, vec![(0, 1.0)]),
            FeatureVector::from_pairs(3, vec![(0, 0.8), (2, 0.2)]),
            FeatureVector::from_pairs(3, vec![(1, 1.0)]),
            FeatureVector::from_pairs(3, vec![(1, 0.5), (2, 0.5)]),
        ];
        let labels = vec![Label::Spam, Label::Spam, Label::Ham, Label::Ham];
        (rows, labels)
    }

    #[test]
    fn test_predicts_dominant_features() {
        let (rows, labels) = dataset();
        let nb = MultinomialNb::fit(&rows, &labels, 3, &NaiveBayesParams::default());

        let spammy = nb.predict_proba(&FeatureVector::from_pairs(3, vec![(0, 1.0)]));
        assert!(spammy.spam > 0.5);
        let hammy = nb.predict_proba(&FeatureVector::from_pairs(3, vec![(1, 1.0)]));
        assert!(hammy.ham > 0.5);
    }

    #[test]
    fn test_empty_vector_returns_prior() {
        let (mut rows, mut labels) = dataset();
        rows.push(FeatureVector::from_pairs(3, vec![(2, 1.0)]));
        labels.push(Label::Ham);
        let nb = MultinomialNb::fit(&rows, &labels, 3, &NaiveBayesParams::default());

        let probs = nb.predict_proba(&FeatureVector::zeros(3));
        assert!((probs.ham - 0.6).abs() < 1e-12);
        assert!((probs.spam - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (rows, labels) = dataset();
        let nb = MultinomialNb::fit(&rows, &labels, 3, &NaiveBayesParams { alpha: 0.5 });
        for row in &rows {
            let p = nb.predict_proba(row);
            assert!((p.ham + p.spam - 1.0).abs() < 1e-9);
        }
    }
}
