//! End-to-end tests: train, persist, reload, classify

use spam_rs::inference::{InferenceService, ModelCache};
use spam_rs::model::artifact::{self, ARTIFACT_FORMAT_VERSION};
use spam_rs::model::{EnsembleParams, Label, SpamPipeline};
use spam_rs::training::{Corpus, Trainer};
use spam_rs::{Config, SpamError};
use std::sync::Arc;
use tempfile::TempDir;

fn scenario_pipeline() -> SpamPipeline {
    let texts = [
        "Free entry! Claim now!",
        "See you at lunch",
        "WINNER! Claim your prize",
        "Meeting notes attached",
    ];
    let labels = [Label::Spam, Label::Ham, Label::Spam, Label::Ham];
    SpamPipeline::fit_texts(&texts, &labels, &EnsembleParams::default()).unwrap()
}

#[test]
fn test_spam_text_is_classified_as_spam() {
    let pipeline = scenario_pipeline();
    let result = pipeline.classify("Claim your free prize now!").unwrap();

    assert_eq!(result.label, Label::Spam);
    assert!(result.probability > 50.0, "probability was {}", result.probability);
    assert!(result.spam_probability > 0.5);
}

#[test]
fn test_meeting_text_is_classified_as_ham() {
    let pipeline = scenario_pipeline();
    let result = pipeline
        .classify("Let's schedule the meeting for tomorrow")
        .unwrap();

    assert_eq!(result.label, Label::Ham);
    assert!(result.probability >= 50.0);
    assert!(result.spam_probability <= 0.5);
}

#[test]
fn test_probabilities_sum_to_one() {
    let pipeline = scenario_pipeline();
    for text in [
        "Claim your free prize now!",
        "lunch meeting",
        "completely unrelated words",
        "WINNER WINNER WINNER",
    ] {
        let probs = pipeline.predict_proba(text).unwrap();
        assert!((probs.ham + probs.spam - 1.0).abs() < 1e-6, "{}: {:?}", text, probs);
    }
}

#[test]
fn test_saved_and_loaded_pipeline_classifies_identically() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pipeline.bin");
    let pipeline = scenario_pipeline();

    artifact::save(&pipeline, &path).unwrap();
    let loaded = artifact::load(&path).unwrap();

    for text in [
        "Claim your free prize now!",
        "Let's schedule the meeting for tomorrow",
        "see you",
    ] {
        let before = pipeline.classify(text).unwrap();
        let after = loaded.classify(text).unwrap();
        assert_eq!(before.label, after.label);
        assert!((before.probability - after.probability).abs() < 1e-9);
        assert!((before.spam_probability - after.spam_probability).abs() < 1e-9);
    }
}

#[test]
fn test_classify_is_idempotent() {
    let pipeline = scenario_pipeline();
    let text = "WINNER! Claim your prize";
    let first = pipeline.classify(text).unwrap();
    for _ in 0..5 {
        assert_eq!(pipeline.classify(text).unwrap(), first);
    }
}

#[test]
fn test_empty_input() {
    let pipeline = scenario_pipeline();
    assert!(matches!(pipeline.classify(""), Err(SpamError::EmptyInput)));
    assert!(matches!(pipeline.classify(" \t\n"), Err(SpamError::EmptyInput)));
}

#[test]
fn test_unrecognized_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pipeline.bin");
    artifact::save(&scenario_pipeline(), &path).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    let future = ARTIFACT_FORMAT_VERSION + 1;
    bytes[8..10].copy_from_slice(&future.to_be_bytes());
    std::fs::write(&path, bytes).unwrap();

    match artifact::load(&path) {
        Err(SpamError::ArtifactVersionMismatch { expected, found }) => {
            assert_eq!(expected, ARTIFACT_FORMAT_VERSION);
            assert_eq!(found, future);
        }
        other => panic!("expected version mismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_empty_corpus_aborts_training() {
    let texts: [&str; 2] = ["", "   "];
    let labels = [Label::Spam, Label::Ham];
    assert!(matches!(
        SpamPipeline::fit_texts(&texts, &labels, &EnsembleParams::default()),
        Err(SpamError::EmptyCorpus)
    ));
}

#[test]
fn test_train_from_csv_and_serve() {
    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("spam.csv");
    let output = dir.path().join("model").join("spam_pipeline.bin");

    let mut content = String::from("v1,v2,,,\n");
    for i in 0..12 {
        content.push_str(&format!(
            "spam,\"WINNER!! Claim your free prize {}, txt now\",,,\n",
            i
        ));
        content.push_str(&format!("ham,Are we still on for lunch at {} today?,,,\n", i));
    }
    std::fs::write(&csv, content).unwrap();

    let mut config = Config::default();
    config.training.n_forest_trees = 20;
    config.training.n_boosting_rounds = 30;

    let trained = Trainer::new(config.training.clone())
        .train_file(&csv, &output)
        .unwrap();
    let report = trained.metadata().evaluation.clone().unwrap();
    assert_eq!(report.n_test, 5);

    let corpus = Corpus::load_csv(&csv).unwrap();
    assert_eq!(corpus.len(), 24);

    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async {
        let service = InferenceService::new(Arc::new(ModelCache::from_path(&output)));
        let spam = service.classify("Claim your free prize now").await.unwrap();
        assert_eq!(spam.label, Label::Spam);
        let ham = service.classify("lunch today?").await.unwrap();
        assert_eq!(ham.label, Label::Ham);
    });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_access_reads_artifact_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pipeline.bin");
    artifact::save(&scenario_pipeline(), &path).unwrap();

    let cache = Arc::new(ModelCache::from_path(&path));
    let handles: Vec<_> = (0..12)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_pipeline().await.unwrap() })
        })
        .collect();

    let mut loaded = Vec::new();
    for handle in handles {
        loaded.push(handle.await.unwrap());
    }

    assert_eq!(cache.load_count(), 1);
    assert!(loaded.iter().all(|p| Arc::ptr_eq(p, &loaded[0])));
}
