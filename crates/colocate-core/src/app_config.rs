use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// What to report for an anchor whose candidates could not be gathered.
///
/// `AssumeMatch` errs toward "a repair shop is already there" and keeps the
/// anchor out of the qualifying set; `AssumeNoMatch` keeps it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailSafe {
    #[default]
    AssumeNoMatch,
    AssumeMatch,
}

impl FailSafe {
    /// The `has_category_match_nearby` value recorded for a failed anchor.
    #[must_use]
    pub fn assumed_match(self) -> bool {
        matches!(self, FailSafe::AssumeMatch)
    }
}

impl std::fmt::Display for FailSafe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailSafe::AssumeNoMatch => write!(f, "assume-no-match"),
            FailSafe::AssumeMatch => write!(f, "assume-match"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub host_brand: String,
    pub lexicon_path: Option<PathBuf>,
    pub workers: usize,
    pub max_attempts: u32,
    pub retry_backoff_base_ms: u64,
    pub source_timeout_secs: u64,
    pub checkpoint_every: usize,
    pub min_reviews: u64,
    pub skip_search_below_min_reviews: bool,
    pub search_radius_meters: f64,
    pub fail_safe: FailSafe,
    /// `false` when `fail_safe` came from the default rather than the env.
    pub fail_safe_configured: bool,
    pub output_dir: PathBuf,
    pub anchors_path: Option<PathBuf>,
    pub fixture_path: Option<PathBuf>,
}

impl AppConfig {
    #[must_use]
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }
}
