//! Runtime configuration read from `SYMBIO_*` environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::debug;

use crate::error::{Error, Result};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 100_000;
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Root for stored records and logs
    pub data_dir: PathBuf,
    /// Hosted model key; narrative generation is off without it
    pub api_key: Option<String>,
    pub model: String,
    pub api_timeout: Duration,
    /// Upper bound on FASTA text accepted for analysis
    pub max_sequence_length: usize,
    /// Run composition and codon counting on worker threads
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
            parallel: num_cpus::get() > 1,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset or blank keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(dir) = get("SYMBIO_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        config.api_key = get("GEMINI_API_KEY");
        if let Some(model) = get("SYMBIO_MODEL") {
            config.model = model;
        }
        if let Some(secs) = get("SYMBIO_API_TIMEOUT_SECS") {
            config.api_timeout = Duration::from_secs(parse_value("SYMBIO_API_TIMEOUT_SECS", &secs)?);
        }
        if let Some(max) = get("SYMBIO_MAX_SEQUENCE_LENGTH") {
            config.max_sequence_length = parse_value("SYMBIO_MAX_SEQUENCE_LENGTH", &max)?;
        }
        if let Some(parallel) = get("SYMBIO_PARALLEL") {
            config.parallel = parse_flag("SYMBIO_PARALLEL", &parallel)?;
        }

        debug!(
            "Loaded configuration: data dir {:?}, model {}, narrative {}, max length {}, parallel {}",
            config.data_dir,
            config.model,
            if config.api_key.is_some() { "enabled" } else { "disabled" },
            config.max_sequence_length,
            config.parallel
        );
        Ok(config)
    }

    pub fn records_dir(&self) -> PathBuf {
        self.data_dir.join("records")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".symbio")
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} has invalid value '{raw}'")))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{key} must be a boolean, got '{raw}'"))),
    }
}
