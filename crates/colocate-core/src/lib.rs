pub mod app_config;
pub mod config;
pub mod lexicon;
pub mod types;

pub use app_config::{AppConfig, Environment, FailSafe};
pub use config::{load_app_config, load_app_config_from_env};
pub use lexicon::{load_lexicon, CategoryLexicon, Territory};
pub use types::{
    AddressComponents, AnchorLocation, CandidateListing, ClassificationResult, Confidence,
    Coordinate, MatchedCandidate, ResolutionResult, UNKNOWN,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read lexicon file {path}: {source}")]
    LexiconFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse lexicon file: {0}")]
    LexiconFileParse(#[from] serde_yaml::Error),

    #[error("lexicon validation failed: {0}")]
    Validation(String),
}
