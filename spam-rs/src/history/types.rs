//! Classification history types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::types::{InferenceResult, Label};

/// A stored classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique ID
    pub id: String,
    /// Identity that requested the check (None = anonymous)
    pub owner: Option<String>,
    /// Raw text that was classified
    pub email_content: String,
    /// Predicted label
    pub result: Label,
    /// Winning-class probability as a percentage
    pub probability: f64,
    /// When the check was recorded
    pub created_at: DateTime<Utc>,
}

/// A classification to be recorded
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEntry {
    pub owner: Option<String>,
    pub email_content: String,
    pub result: Label,
    pub probability: f64,
}

impl NewHistoryEntry {
    pub fn from_result(owner: Option<String>, text: impl Into<String>, result: &InferenceResult) -> Self {
        Self {
            owner,
            email_content: text.into(),
            result: result.label,
            probability: result.probability,
        }
    }
}

/// One page of history, newest first
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub entries: Vec<HistoryEntry>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}
