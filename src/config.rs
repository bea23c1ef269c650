use anyhow::{Context, Result};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::transform::{self, CompressOptions, DEFAULT_QUALITY, Resize};

/// Top-level configuration for imagefox.
///
/// Supplies defaults for the compress command and output behaviour.
///
/// # Loading
///
/// ```rust,no_run
/// use imagefox::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.compress.default_quality = 70;
/// config.output.backup_originals = true;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults for `compress`.
    pub compress: CompressConfig,
    /// Output behaviour (backups).
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressConfig {
    /// JPEG quality used when `--quality` is not given.
    pub default_quality: u8,
    /// Filter used by `--resize`.
    pub resize_filter: ResizeFilter,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            default_quality: DEFAULT_QUALITY,
            resize_filter: ResizeFilter::default(),
        }
    }
}

/// Resampling filters, named as in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Output and behavior configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// If `true`, copy the original to `<name>.<ext>.bak` before overwriting it.
    pub backup_originals: bool,
}

impl Config {
    /// Resolve the config file path — same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        config
            .validate()
            .with_context(|| format!("Invalid config in {}", config_path.display()))?;
        log::debug!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(config_path)
    }

    pub fn validate(&self) -> Result<()> {
        transform::validate_quality(self.compress.default_quality)?;
        Ok(())
    }

    /// Compress options from these defaults and the command-line overrides.
    pub fn compress_options(&self, quality: Option<u8>, resize: Option<Resize>) -> CompressOptions {
        CompressOptions {
            quality: quality.unwrap_or(self.compress.default_quality),
            resize,
            filter: self.compress.resize_filter.into(),
        }
    }
}
