//! Labels, class probabilities and classification results

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SpamError;

/// A message is spam if its soft-voted spam probability is strictly above this.
pub const SPAM_THRESHOLD: f64 = 0.5;

/// Email class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Ham,
    Spam,
}

impl Label {
    /// Numeric target used by the classifiers (ham = 0, spam = 1)
    pub fn target(self) -> f64 {
        match self {
            Label::Ham => 0.0,
            Label::Spam => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Ham => "ham",
            Label::Spam => "spam",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = SpamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spam" => Ok(Label::Spam),
            "ham" => Ok(Label::Ham),
            other => Err(SpamError::InvalidLabel(other.to_string())),
        }
    }
}

/// Per-class probability estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub ham: f64,
    pub spam: f64,
}

impl ClassProbabilities {
    /// Build from a spam probability, clamped to [0, 1]
    pub fn from_spam(p_spam: f64) -> Self {
        let spam = p_spam.clamp(0.0, 1.0);
        Self {
            ham: 1.0 - spam,
            spam,
        }
    }

    /// Rescale so the two probabilities sum to exactly 1
    pub fn normalized(self) -> Self {
        let total = self.ham + self.spam;
        if total > 0.0 {
            Self {
                ham: self.ham / total,
                spam: self.spam / total,
            }
        } else {
            Self { ham: 0.5, spam: 0.5 }
        }
    }

    pub fn label(&self) -> Label {
        if self.spam > SPAM_THRESHOLD {
            Label::Spam
        } else {
            Label::Ham
        }
    }
}

/// Outcome of classifying one text
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub label: Label,
    /// Probability of the winning class as a percentage, rounded to two decimals
    pub probability: f64,
    /// Raw soft-voted spam probability in [0, 1]
    pub spam_probability: f64,
}

impl InferenceResult {
    pub fn from_probabilities(probs: ClassProbabilities) -> Self {
        let label = probs.label();
        let winning = match label {
            Label::Spam => probs.spam,
            Label::Ham => probs.ham,
        };

        Self {
            label,
            probability: (winning * 100.0 * 100.0).round() / 100.0,
            spam_probability: probs.spam,
        }
    }

    /// Two-decimal percentage, e.g. `"97.31"`
    pub fn probability_display(&self) -> String {
        format!("{:.2}", self.probability)
    }
}
