use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, XrefError};

/// Name of the configuration file stored inside the `.docxref` directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Name of the hidden directory holding docxref settings.
pub const DOCXREF_DIR: &str = ".docxref";

/// Settings for one resolution batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XrefConfig {
    /// Schema version of the configuration.
    pub version: u32,
    /// Whether names must match case exactly.
    pub case_sensitive: bool,
    /// Glob patterns over declaration file paths; matching declarations are
    /// not indexed.
    pub exclude: Vec<String>,
    /// Whether to warn about same-file declarations with identical shape.
    pub report_redeclarations: bool,
    /// Whether to resolve references on the rayon thread pool.
    pub parallel: bool,
}

impl Default for XrefConfig {
    fn default() -> Self {
        Self {
            version: 1,
            case_sensitive: true,
            exclude: Vec::new(),
            report_redeclarations: true,
            parallel: false,
        }
    }
}

/// Returns the path to the `.docxref` directory within the given project root.
pub fn get_docxref_dir(project_root: &Path) -> PathBuf {
    project_root.join(DOCXREF_DIR)
}

/// Returns the path to `config.json` within the `.docxref` directory.
pub fn get_config_path(project_root: &Path) -> PathBuf {
    get_docxref_dir(project_root).join(CONFIG_FILENAME)
}

/// Loads the project configuration, falling back to defaults when no
/// configuration file exists.
pub fn load_config(project_root: &Path) -> Result<XrefConfig> {
    let config_path = get_config_path(project_root);
    if !config_path.exists() {
        return Ok(XrefConfig::default());
    }
    load_config_file(&config_path)
}

/// Loads a configuration from an explicit file path.
pub fn load_config_file(config_path: &Path) -> Result<XrefConfig> {
    let contents = fs::read_to_string(config_path).map_err(|e| XrefError::Config {
        message: format!(
            "failed to read config file '{}': {}",
            config_path.display(),
            e
        ),
    })?;

    let config: XrefConfig = serde_json::from_str(&contents).map_err(|e| XrefError::Config {
        message: format!(
            "failed to parse config file '{}': {}",
            config_path.display(),
            e
        ),
    })?;

    for pattern in &config.exclude {
        Pattern::new(pattern).map_err(|e| XrefError::Config {
            message: format!("invalid exclude pattern '{}': {}", pattern, e),
        })?;
    }

    Ok(config)
}

/// Saves the configuration to disk using an atomic write.
///
/// Writes to a temporary file first and then renames it to the final location,
/// ensuring that a partial write never corrupts the configuration.
pub fn save_config(project_root: &Path, config: &XrefConfig) -> Result<()> {
    let docxref_dir = get_docxref_dir(project_root);
    fs::create_dir_all(&docxref_dir).map_err(|e| XrefError::Config {
        message: format!(
            "failed to create docxref directory '{}': {}",
            docxref_dir.display(),
            e
        ),
    })?;

    let config_path = get_config_path(project_root);
    let tmp_path = config_path.with_extension("tmp");

    let json = serde_json::to_string_pretty(config).map_err(|e| XrefError::Config {
        message: format!("failed to serialize config: {}", e),
    })?;

    fs::write(&tmp_path, &json).map_err(|e| XrefError::Config {
        message: format!(
            "failed to write temporary config file '{}': {}",
            tmp_path.display(),
            e
        ),
    })?;

    fs::rename(&tmp_path, &config_path).map_err(|e| XrefError::Config {
        message: format!(
            "failed to rename temporary config file '{}' to '{}': {}",
            tmp_path.display(),
            config_path.display(),
            e
        ),
    })?;

    Ok(())
}

/// Whether declarations from `file_path` should be indexed.
///
/// Invalid patterns are skipped; `load_config_file` rejects them up front.
pub fn should_index_file(file_path: &str, config: &XrefConfig) -> bool {
    let match_opts = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    !config.exclude.iter().any(|pattern_str| {
        Pattern::new(pattern_str)
            .map(|pattern| pattern.matches_with(file_path, match_opts))
            .unwrap_or(false)
    })
}
