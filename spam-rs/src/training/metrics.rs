//! Hold-out evaluation metrics

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::types::Label;

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of test examples whose true label is this class
    pub support: usize,
}

impl ClassMetrics {
    fn compute(class: Label, actual: &[Label], predicted: &[Label]) -> Self {
        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut fn_ = 0usize;
        for (a, p) in actual.iter().zip(predicted) {
            match (*a == class, *p == class) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_ += 1,
                (false, false) => {}
            }
        }

        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            precision,
            recall,
            f1,
            support: tp + fn_,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub ham: ClassMetrics,
    pub spam: ClassMetrics,
    pub n_test: usize,
}

impl EvaluationReport {
    /// Compare predictions against ground truth, pairwise.
    pub fn from_predictions(actual: &[Label], predicted: &[Label]) -> Self {
        let n = actual.len().min(predicted.len());
        let (actual, predicted) = (&actual[..n], &predicted[..n]);
        let correct = actual.iter().zip(predicted).filter(|(a, p)| a == p).count();

        Self {
            accuracy: ratio(correct, n),
            ham: ClassMetrics::compute(Label::Ham, actual, predicted),
            spam: ClassMetrics::compute(Label::Spam, actual, predicted),
            n_test: n,
        }
    }

    pub fn class(&self, label: Label) -> &ClassMetrics {
        match label {
            Label::Ham => &self.ham,
            Label::Spam => &self.spam,
        }
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accuracy: {:.4}", self.accuracy)?;
        writeln!(
            f,
            "{:>8} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for label in [Label::Ham, Label::Spam] {
            let m = self.class(label);
            writeln!(
                f,
                "{:>8} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                label.as_str(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            )?;
        }
        Ok(())
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
