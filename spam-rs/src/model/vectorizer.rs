//! TF-IDF vectorizer
//!
//! `fit` learns a frozen vocabulary and smoothed inverse document frequencies
//! from a corpus; `transform` turns any text into a [`FeatureVector`] over that
//! vocabulary. Tokens unseen at fit time are dropped.
//!
//! IDF is `ln((1 + n) / (1 + df)) + 1` where `n` is the number of documents and
//! `df` the number containing the token. A present token weighs
//! `tf × idf`, and the row is scaled to unit L2 norm when `l2_normalize` is set.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::sparse::FeatureVector;
use super::tokenizer::Tokenizer;
use crate::error::{Result, SpamError};

/// Token to feature index mapping plus per-index IDF weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    index: BTreeMap<String, u32>,
    idf: Vec<f64>,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.idf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    pub fn index_of(&self, token: &str) -> Option<u32> {
        self.index.get(token).copied()
    }

    pub fn idf(&self, index: u32) -> Option<f64> {
        self.idf.get(index as usize).copied()
    }

    /// Tokens in feature-index order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Check that the index assignment is a bijection onto `0..len`
    pub fn is_consistent(&self) -> bool {
        if self.index.len() != self.idf.len() {
            return false;
        }
        let indices: BTreeSet<u32> = self.index.values().copied().collect();
        indices.len() == self.idf.len()
            && indices
                .iter()
                .enumerate()
                .all(|(expected, idx)| *idx as usize == expected)
            && self.idf.iter().all(|w| w.is_finite() && *w > 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    tokenizer: Tokenizer,
    l2_normalize: bool,
    vocabulary: Option<Vocabulary>,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new(Tokenizer::default(), true)
    }
}

impl TfidfVectorizer {
    pub fn new(tokenizer: Tokenizer, l2_normalize: bool) -> Self {
        Self {
            tokenizer,
            l2_normalize,
            vocabulary: None,
        }
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Frozen vocabulary, if fitted
    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        self.vocabulary.as_ref()
    }

    /// Feature-space width, if fitted
    pub fn dim(&self) -> Option<usize> {
        self.vocabulary.as_ref().map(Vocabulary::len)
    }

    /// Learn vocabulary and IDF weights from `corpus`, replacing any earlier fit
    pub fn fit<S: AsRef<str>>(&mut self, corpus: &[S]) -> Result<&Vocabulary> {
        let mut doc_freq: BTreeMap<String, u64> = BTreeMap::new();
        let mut non_empty = 0usize;

        for doc in corpus {
            let unique: BTreeSet<String> = self.tokenizer.tokenize(doc.as_ref()).into_iter().collect();
            if unique.is_empty() {
                continue;
            }
            non_empty += 1;
            for token in unique {
                *doc_freq.entry(token).or_insert(0) += 1;
            }
        }

        if non_empty == 0 {
            self.vocabulary = None;
            return Err(SpamError::EmptyCorpus);
        }

        let n_docs = corpus.len() as f64;
        let mut index = BTreeMap::new();
        let mut idf = Vec::with_capacity(doc_freq.len());
        for (position, (token, df)) in doc_freq.into_iter().enumerate() {
            idf.push(((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0);
            index.insert(token, position as u32);
        }

        tracing::debug!(
            "Fitted vocabulary: {} tokens from {} documents ({} non-empty)",
            idf.len(),
            corpus.len(),
            non_empty
        );

        Ok(self.vocabulary.insert(Vocabulary { index, idf }))
    }

    pub fn transform(&self, text: &str) -> Result<FeatureVector> {
        let vocabulary = self.vocabulary.as_ref().ok_or(SpamError::NotFitted)?;

        let mut counts: BTreeMap<u32, f64> = BTreeMap::new();
        for token in self.tokenizer.tokenize(text) {
            if let Some(idx) = vocabulary.index_of(&token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut vector = FeatureVector::from_pairs(
            vocabulary.len(),
            counts
                .into_iter()
                .map(|(idx, tf)| (idx, tf * vocabulary.idf[idx as usize])),
        );
        if self.l2_normalize {
            vector.l2_normalize();
        }
        Ok(vector)
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, corpus: &[S]) -> Result<Vec<FeatureVector>> {
        self.fit(corpus)?;
        corpus.iter().map(|doc| self.transform(doc.as_ref())).collect()
    }
}
