//! Offline training and inspection tool
//!
//! # Usage
//!
//! ```bash
//! # Train on a labeled CSV and write the artifact
//! spam-train train --corpus spam.csv --output model/spam_pipeline.bin
//!
//! # Show artifact metadata and hold-out evaluation
//! spam-train inspect model/spam_pipeline.bin
//!
//! # Classify one text with a saved artifact
//! spam-train classify model/spam_pipeline.bin "WINNER! Claim your prize"
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use spam_rs::model::artifact;
use spam_rs::training::Trainer;
use spam_rs::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spam-train")]
#[command(about = "Train and inspect spam classifier artifacts", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a pipeline from a labeled CSV corpus
    Train {
        /// CSV with label and text columns
        #[arg(long)]
        corpus: PathBuf,
        /// Artifact destination (defaults to model.artifact_path)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Fraction held out for evaluation, 0 to train on everything
        #[arg(long)]
        test_size: Option<f64>,
        #[arg(long)]
        seed: Option<u64>,
        /// Random forest size
        #[arg(long)]
        trees: Option<usize>,
        /// Gradient boosting rounds
        #[arg(long)]
        rounds: Option<usize>,
        #[arg(long)]
        learning_rate: Option<f64>,
    },
    /// Print artifact metadata
    Inspect {
        artifact: PathBuf,
    },
    /// Classify one text
    Classify {
        artifact: PathBuf,
        text: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    spam_rs::logging::init(&config.logging);

    match cli.command {
        Commands::Train {
            corpus,
            output,
            test_size,
            seed,
            trees,
            rounds,
            learning_rate,
        } => {
            let training = &mut config.training;
            if let Some(v) = test_size {
                training.test_size = v;
            }
            if let Some(v) = seed {
                training.seed = v;
            }
            if let Some(v) = trees {
                training.n_forest_trees = v;
            }
            if let Some(v) = rounds {
                training.n_boosting_rounds = v;
            }
            if let Some(v) = learning_rate {
                training.learning_rate = v;
            }

            let output = output.unwrap_or_else(|| config.model.artifact_path.clone());
            let pipeline = Trainer::new(config.training.clone())
                .train_file(&corpus, &output)
                .with_context(|| format!("training from {}", corpus.display()))?;

            let metadata = pipeline.metadata();
            println!("✓ Model written to {}", output.display());
            println!(
                "  {} training examples, {} features",
                metadata.n_training_examples, metadata.vocabulary_size
            );
            if let Some(report) = &metadata.evaluation {
                println!("\n{}", report);
            }
        }
        Commands::Inspect { artifact: path } => {
            let metadata = artifact::inspect(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            println!("Artifact:           {}", path.display());
            println!("Format version:     {}", artifact::ARTIFACT_FORMAT_VERSION);
            println!("Trained at:         {}", metadata.trained_at.to_rfc3339());
            println!("Crate version:      {}", metadata.crate_version);
            println!("Training examples:  {}", metadata.n_training_examples);
            println!("Vocabulary size:    {}", metadata.vocabulary_size);
            match &metadata.evaluation {
                Some(report) => println!("\n{}", report),
                None => println!("No hold-out evaluation recorded"),
            }
        }
        Commands::Classify { artifact: path, text } => {
            let pipeline = artifact::load(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let result = pipeline.classify(&text)?;
            println!(
                "{} ({}%, p_spam={:.4})",
                result.label,
                result.probability_display(),
                result.spam_probability
            );
        }
    }

    Ok(())
}
