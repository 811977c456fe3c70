use crate::legacy::parse_yaml;
use anyhow::{Context, Result};
use critspeed_core::pipeline::{critical_speed, CriticalSpeedInput, CriticalSpeedResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_OUTPUT_FILE: &str = "critical_speed_results.json";

/// One run as described by a configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct CriticalSpeedConfig {
    #[serde(flatten)]
    pub input: CriticalSpeedInput,
    #[serde(default)]
    pub output: OutputConfig,
}

/// On-disk layouts understood by [`load_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    /// GoTrain style YAML, see [`crate::legacy`].
    Yaml,
}

impl ConfigFormat {
    pub const EXTENSIONS: [&'static str; 3] = ["toml", "yaml", "yml"];

    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Relative paths are taken from the directory holding the config file.
    pub file_name: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_name: PathBuf::from(DEFAULT_OUTPUT_FILE),
        }
    }
}

impl CriticalSpeedConfig {
    pub fn output_path(&self, config_path: &Path) -> PathBuf {
        if self.output.file_name.is_absolute() {
            return self.output.file_name.clone();
        }
        match config_path.parent() {
            Some(dir) => dir.join(&self.output.file_name),
            None => self.output.file_name.clone(),
        }
    }
}

/// Reads a `.yaml`/`.yml` file as GoTrain YAML and anything else as TOML.
pub fn load_config(path: &Path) -> Result<CriticalSpeedConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let parsed = match ConfigFormat::from_path(path) {
        Some(ConfigFormat::Yaml) => parse_yaml(&text),
        _ => toml::from_str::<CriticalSpeedConfig>(&text).map_err(anyhow::Error::from),
    };
    parsed.with_context(|| format!("Failed to parse config file {}", path.display()))
}

pub fn write_results(path: &Path, results: &CriticalSpeedResult) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(results).context("Failed to serialize results")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write results to {}", path.display()))
}

/// Loads `config_path`, computes the critical speed and writes the JSON result.
///
/// Returns the path the result was written to.
pub fn run_config(config_path: &Path, output_override: Option<&Path>) -> Result<PathBuf> {
    let config = load_config(config_path)?;
    let results = critical_speed(&config.input)
        .with_context(|| format!("Critical speed computation failed for {}", config_path.display()))?;

    let output = match output_override {
        Some(path) => path.to_path_buf(),
        None => config.output_path(config_path),
    };
    write_results(&output, &results)?;
    log::info!(
        "{}: critical speed {:.3} m/s, results written to {}",
        config_path.display(),
        results.critical_velocity,
        output.display()
    );
    Ok(output)
}
