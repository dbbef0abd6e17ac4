//! Application configuration for atplan.
//!
//! User config lives at `~/.atplan/atplan.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AtplanError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "atplan.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".atplan";

// ---------------------------------------------------------------------------
// Config structs (matching atplan.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Batch output behaviour.
    #[serde(default)]
    pub batch: BatchSection,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Combined JSON output file.
    #[serde(default = "default_output_file")]
    pub output_file: String,

    /// Number of documents extracted in parallel.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// File extension of table dumps picked up from the input tree.
    #[serde(default = "default_input_extension")]
    pub input_extension: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_file: default_output_file(),
            concurrency: default_concurrency(),
            input_extension: default_input_extension(),
        }
    }
}

fn default_output_file() -> String {
    "extracted_atp_data.json".into()
}
fn default_concurrency() -> u32 {
    4
}
fn default_input_extension() -> String {
    "json".into()
}

/// `[batch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSection {
    /// Write a `<output stem>.report.json` sidecar with per-document checksums.
    #[serde(default = "default_true")]
    pub write_report: bool,

    /// Pretty-print the JSON output.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            write_report: true,
            pretty: true,
        }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Batch config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime batch configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Root directory scanned for table dumps.
    pub input_root: PathBuf,
    /// Combined JSON output file.
    pub output_file: PathBuf,
    /// Maximum documents extracted concurrently.
    pub concurrency: u32,
    /// Table dump extension (without the dot).
    pub input_extension: String,
    /// Whether to write the report sidecar.
    pub write_report: bool,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
}

impl From<&AppConfig> for BatchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            input_root: PathBuf::from("."),
            output_file: PathBuf::from(&config.defaults.output_file),
            concurrency: config.defaults.concurrency,
            input_extension: config.defaults.input_extension.clone(),
            write_report: config.batch.write_report,
            pretty: config.batch.pretty,
        }
    }
}

impl BatchConfig {
    /// Reject settings the batch driver cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(AtplanError::config("concurrency must be at least 1"));
        }
        if self.input_extension.trim_start_matches('.').is_empty() {
            return Err(AtplanError::config("input_extension must not be empty"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.atplan/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AtplanError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.atplan/atplan.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AtplanError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| AtplanError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| AtplanError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| AtplanError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| AtplanError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
