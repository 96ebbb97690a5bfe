//! Offline training run: corpus in, artifact out

use std::path::Path;
use std::time::Instant;
use tracing::info;

use super::corpus::{Corpus, TrainingExample};
use super::metrics::EvaluationReport;
use super::split::train_test_split;
use crate::config::TrainingConfig;
use crate::error::{Result, SpamError};
use crate::model::artifact;
use crate::model::ensemble::EnsembleParams;
use crate::model::pipeline::SpamPipeline;
use crate::model::types::Label;

pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit a pipeline on the training part of `corpus` and, unless
    /// `test_size` is zero, attach an evaluation on the held-out part.
    pub fn train(&self, corpus: &Corpus) -> Result<SpamPipeline> {
        self.config.validate()?;
        if corpus.is_empty() {
            return Err(SpamError::EmptyCorpus);
        }

        let params = EnsembleParams::from(&self.config);
        let (train, test) =
            train_test_split(corpus.examples(), self.config.test_size, self.config.seed)?;
        info!(
            "Training on {} examples, holding out {} for evaluation",
            train.len(),
            test.len()
        );

        let started = Instant::now();
        let pipeline = SpamPipeline::fit(&train, &params)?;
        info!(
            "Pipeline trained in {:?}: {} features",
            started.elapsed(),
            pipeline.metadata().vocabulary_size
        );

        if test.is_empty() {
            return Ok(pipeline);
        }

        let report = evaluate(&pipeline, &test)?;
        info!("Hold-out evaluation:\n{}", report);
        Ok(pipeline.with_evaluation(report))
    }

    /// Load a CSV corpus, train, and atomically write the artifact.
    pub fn train_file(&self, corpus_path: &Path, output: &Path) -> Result<SpamPipeline> {
        let corpus = Corpus::load_csv(corpus_path)?;
        let pipeline = self.train(&corpus)?;
        artifact::save(&pipeline, output)?;
        Ok(pipeline)
    }
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new(TrainingConfig::default())
    }
}

/// Score `pipeline` against labeled examples.
pub fn evaluate(pipeline: &SpamPipeline, examples: &[TrainingExample]) -> Result<EvaluationReport> {
    let actual: Vec<Label> = examples.iter().map(|e| e.label).collect();
    let predicted = examples
        .iter()
        .map(|e| pipeline.predict_proba(&e.text).map(|p| p.label()))
        .collect::<Result<Vec<Label>>>()?;
    Ok(EvaluationReport::from_predictions(&actual, &predicted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn small_config(test_size: f64) -> TrainingConfig {
        TrainingConfig {
            test_size,
            n_forest_trees: 10,
            n_boosting_rounds: 20,
            ..TrainingConfig::default()
        }
    }

    fn corpus() -> Corpus {
        let mut examples = Vec::new();
        for i in 0..10 {
            examples.push(TrainingExample::new(
                Label::Spam,
                format!("WINNER claim your free prize number {} now", i),
            ));
            examples.push(TrainingExample::new(
                Label::Ham,
                format!("meeting notes for project {} attached, see you at lunch", i),
            ));
        }
        Corpus::from_examples(examples)
    }

    #[test]
    fn test_train_with_holdout() {
        let pipeline = Trainer::new(small_config(0.2)).train(&corpus()).unwrap();
        let metadata = pipeline.metadata();
        assert_eq!(metadata.n_training_examples, 16);

        let report = metadata.evaluation.as_ref().unwrap();
        assert_eq!(report.n_test, 4);
        assert!((0.0..=1.0).contains(&report.accuracy));
    }

    #[test]
    fn test_train_without_holdout() {
        let pipeline = Trainer::new(small_config(0.0)).train(&corpus()).unwrap();
        assert_eq!(pipeline.metadata().n_training_examples, 20);
        assert!(pipeline.metadata().evaluation.is_none());
    }

    #[test]
    fn test_empty_corpus_aborts() {
        let result = Trainer::default().train(&Corpus::default());
        assert!(matches!(result, Err(SpamError::EmptyCorpus)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = TrainingConfig {
            learning_rate: 0.0,
            ..TrainingConfig::default()
        };
        assert!(matches!(
            Trainer::new(config).train(&corpus()),
            Err(SpamError::Config(_))
        ));
    }

    #[test]
    fn test_train_file_writes_artifact() {
        let dir = TempDir::new().unwrap();
        let csv = dir.path().join("spam.csv");
        let output = dir.path().join("model").join("pipeline.bin");

        let mut content = String::from("v1,v2,,,\n");
        for e in corpus().examples() {
            content.push_str(&format!("{},\"{}\",,,\n", e.label, e.text));
        }
        std::fs::write(&csv, content).unwrap();

        let trained = Trainer::new(small_config(0.2))
            .train_file(&csv, &output)
            .unwrap();
        let loaded = artifact::load(&output).unwrap();
        assert_eq!(loaded, trained);
    }
}
