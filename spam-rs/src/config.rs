use crate::error::{Result, SpamError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment prefix for overrides, e.g. `SPAM_RS_MODEL__ARTIFACT_PATH`.
const ENV_PREFIX: &str = "SPAM_RS";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub storage: StorageConfig,
    pub training: TrainingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub listen_addr: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Location of the trained pipeline artifact read by the model cache
    pub artifact_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub database_url: String,
}

/// Hyper-parameters for an offline training run
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrainingConfig {
    /// Fraction of the corpus held out for evaluation (0 disables evaluation)
    pub test_size: f64,
    pub seed: u64,
    pub nb_alpha: f64,
    pub n_forest_trees: usize,
    #[serde(default)]
    pub forest_max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub n_boosting_rounds: usize,
    pub learning_rate: f64,
    pub boosting_max_depth: usize,
    /// Soft-vote weights for naive Bayes, random forest, gradient boosting
    pub member_weights: [f64; 3],
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SpamError::Config(e.to_string()))?;

        toml::from_str(&content).map_err(|e| SpamError::Config(e.to_string()))
    }

    /// Layer defaults, an optional TOML file and `SPAM_RS_*` environment
    /// variables, later sources winning.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())
            .map_err(|e| SpamError::Config(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| SpamError::Config(e.to_string()))
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig {
                listen_addr: "0.0.0.0:8080".to_string(),
            },
            model: ModelConfig {
                artifact_path: PathBuf::from("./model/spam_pipeline.bin"),
            },
            storage: StorageConfig {
                database_url: "sqlite://spam.db?mode=rwc".to_string(),
            },
            training: TrainingConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            nb_alpha: 1.0,
            n_forest_trees: 100,
            forest_max_depth: None,
            min_samples_split: 2,
            n_boosting_rounds: 100,
            learning_rate: 0.1,
            boosting_max_depth: 3,
            member_weights: [1.0, 1.0, 1.0],
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.test_size) {
            return Err(SpamError::Config(format!(
                "test_size must be in [0, 1), got {}",
                self.test_size
            )));
        }
        if !is_positive(self.nb_alpha) {
            return Err(SpamError::Config("nb_alpha must be positive".to_string()));
        }
        if self.n_forest_trees == 0 || self.n_boosting_rounds == 0 {
            return Err(SpamError::Config(
                "forest and boosting need at least one tree".to_string(),
            ));
        }
        if !is_positive(self.learning_rate) {
            return Err(SpamError::Config("learning_rate must be positive".to_string()));
        }
        if self.min_samples_split < 2 {
            return Err(SpamError::Config("min_samples_split must be >= 2".to_string()));
        }
        let weight_sum: f64 = self.member_weights.iter().sum();
        if self.member_weights.iter().any(|w| !w.is_finite() || *w < 0.0)
            || !is_positive(weight_sum)
        {
            return Err(SpamError::Config(
                "member_weights must be non-negative with a positive sum".to_string(),
            ));
        }
        Ok(())
    }
}

/// Finite and strictly positive; rejects NaN
fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
