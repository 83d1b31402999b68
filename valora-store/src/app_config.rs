use serde::Deserialize;
use std::env;
use std::path::Path;
use valora_catalog::PricingConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub runs: RunConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub people_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RunConfig {
    /// Used when a run request does not name a record count
    pub default_record_count: u64,
    /// Absent means one worker per hardware thread
    #[serde(default)]
    pub default_worker_count: Option<usize>,
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: u64,
    /// Largest record count the API will accept
    #[serde(default = "default_max_record_count")]
    pub max_record_count: u64,
}

fn default_checkpoint_interval() -> u64 { 100_000_000 }
fn default_max_record_count() -> u64 { 1_000_000_000 }

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            default_record_count: 10_000_000,
            default_worker_count: None,
            checkpoint_interval: default_checkpoint_interval(),
            max_record_count: default_max_record_count(),
        }
    }
}

impl Config {
    /// Load from `./config` using `RUN_MODE` (default `development`)
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        Self::load_from(Path::new("config"), &run_mode)
    }

    pub fn load_from(dir: &Path, run_mode: &str) -> Result<Self, config::ConfigError> {
        let source = |name: &str| dir.join(name).to_string_lossy().into_owned();

        let s = config::Config::builder()
            .add_source(config::File::with_name(&source("default")))
            .add_source(config::File::with_name(&source(run_mode)).required(false))
            // Machine-local overrides, not checked in
            .add_source(config::File::with_name(&source("local")).required(false))
            // Eg.. `VALORA__SERVER__PORT=9000`
            .add_source(config::Environment::with_prefix("VALORA").separator("__"))
            .build()?;

        let config: Config = s.try_deserialize()?;
        config
            .pricing
            .validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(config)
    }
}
