//! TOML configuration.
//!
//! Every section and key is optional; a missing file at the default path
//! falls back to [`Config::minimal`]. See `config/liftprog.example.toml`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use lift_progression_core::fuzzy::DEFAULT_THRESHOLD;
use lift_progression_core::models::{Lift, Unit};
use lift_progression_core::query::EquipmentFilter;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
    /// Remote CSV; when set it is downloaded to `download_path` and read
    /// from there instead of `csv_path`.
    #[serde(default)]
    pub csv_url: Option<String>,
    #[serde(default = "default_download_path")]
    pub download_path: PathBuf,
    /// Read at most this many data rows. 0 means no limit.
    #[serde(default)]
    pub max_rows: usize,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            csv_url: None,
            download_path: default_download_path(),
            max_rows: 0,
            delimiter: default_delimiter(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("data/sample.csv")
}
fn default_download_path() -> PathBuf {
    PathBuf::from("data/raw.csv")
}
fn default_delimiter() -> String {
    ",".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}

impl DataConfig {
    /// The configured URL, ignoring an empty string.
    pub fn url(&self) -> Option<&str> {
        self.csv_url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    pub fn delimiter_byte(&self) -> u8 {
        match self.delimiter.as_str() {
            "\\t" | "tab" => b'\t',
            d => d.as_bytes().first().copied().unwrap_or(b','),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            limit: default_limit(),
        }
    }
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}
fn default_limit() -> usize {
    12
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    #[serde(default = "default_lifts")]
    pub default_lifts: Vec<String>,
    #[serde(default = "default_unit")]
    pub default_unit: String,
    #[serde(default = "default_equipment")]
    pub default_equipment: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_lifts: default_lifts(),
            default_unit: default_unit(),
            default_equipment: default_equipment(),
        }
    }
}

fn default_lifts() -> Vec<String> {
    vec!["Squat".to_string(), "Bench".to_string(), "Deadlift".to_string()]
}
fn default_unit() -> String {
    "kg".to_string()
}
fn default_equipment() -> String {
    "all".to_string()
}

impl QueryConfig {
    pub fn lifts(&self) -> Result<Vec<Lift>> {
        self.default_lifts
            .iter()
            .map(|l| l.parse::<Lift>().map_err(anyhow::Error::from))
            .collect()
    }

    pub fn unit(&self) -> Result<Unit> {
        Ok(self.default_unit.parse()?)
    }

    pub fn equipment(&self) -> Result<EquipmentFilter> {
        Ok(self.default_equipment.parse()?)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path`, or fall back to [`Config::minimal`] when `path` is the
/// default location and does not exist.
pub fn load_or_minimal(path: &Path, is_default: bool) -> Result<Config> {
    if is_default && !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::minimal());
    }
    load_config(path)
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate search
    if !(config.search.threshold > 0.0 && config.search.threshold <= 1.0) {
        anyhow::bail!("search.threshold must be in (0.0, 1.0]");
    }
    if config.search.limit < 1 {
        anyhow::bail!("search.limit must be >= 1");
    }

    // Validate data
    if config.data.delimiter.is_empty() {
        anyhow::bail!("data.delimiter must not be empty");
    }
    if let Some(url) = config.data.url() {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("data.csv_url must be an http(s) URL, got '{}'", url);
        }
    }

    // Validate query defaults
    config
        .query
        .lifts()
        .context("Invalid query.default_lifts")?;
    config.query.unit().context("Invalid query.default_unit")?;
    config
        .query
        .equipment()
        .context("Invalid query.default_equipment")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_str)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.data.csv_path, PathBuf::from("data/sample.csv"));
        assert_eq!(config.search.limit, 12);
        assert_eq!(config.search.threshold, 0.75);
        assert_eq!(
            config.query.lifts().unwrap(),
            vec![Lift::Squat, Lift::Bench, Lift::Deadlift]
        );
        assert_eq!(config.server.bind, "127.0.0.1:7341");
    }

    #[test]
    fn test_full_file() {
        let config = parse(
            r#"
[data]
csv_url = "https://example.com/opl.csv"
download_path = "cache/opl.csv"
max_rows = 500
delimiter = "tab"

[search]
threshold = 0.8
limit = 5

[query]
default_lifts = ["total"]
default_unit = "lb"
default_equipment = "raw"
"#,
        )
        .unwrap();
        assert_eq!(config.data.url(), Some("https://example.com/opl.csv"));
        assert_eq!(config.data.delimiter_byte(), b'\t');
        assert_eq!(config.data.max_rows, 500);
        assert_eq!(config.query.unit().unwrap(), Unit::Lb);
        assert_eq!(config.query.equipment().unwrap(), EquipmentFilter::Raw);
    }

    #[test]
    fn test_empty_url_ignored() {
        let config = parse("[data]\ncsv_url = \"\"\n").unwrap();
        assert_eq!(config.data.url(), None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(parse("[search]\nthreshold = 0.0\n").is_err());
        assert!(parse("[search]\nthreshold = 1.5\n").is_err());
        assert!(parse("[search]\nlimit = 0\n").is_err());
        assert!(parse("[data]\ncsv_url = \"ftp://x/y.csv\"\n").is_err());
        assert!(parse("[query]\ndefault_unit = \"stone\"\n").is_err());
        assert!(parse("[query]\ndefault_lifts = [\"snatch\"]\n").is_err());
    }

    #[test]
    fn test_missing_default_path_falls_back() {
        let config = load_or_minimal(Path::new("/nonexistent/liftprog.toml"), true).unwrap();
        assert_eq!(config.search.limit, 12);
        assert!(load_or_minimal(Path::new("/nonexistent/liftprog.toml"), false).is_err());
    }
}
