use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::cropper::{AspectRatio, CropSettings, HitZone};
use crate::geometry::{DisplayGeometry, OutputSize};

const APP_DIR: &str = "cover-cropper";
const APP_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPathError {
    MissingHomeDirectory,
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    ReadConfig { path: PathBuf, source: io::Error },
    #[error("failed to parse config")]
    ParseConfig(#[from] serde_json::Error),
    #[error("invalid aspect ratio: {0}")]
    InvalidAspectRatio(String),
}

/// Settings from `config.json`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CropperConfig {
    pub aspect_ratio: Option<String>,
    pub output_max_width: Option<u32>,
    pub output_max_height: Option<u32>,
    pub preview_max_width: Option<u32>,
    pub preview_max_height: Option<u32>,
    pub min_crop_size: Option<f64>,
    pub handle_size: Option<f64>,
    pub hit_tolerance: Option<f64>,
    pub jpeg_quality: Option<u8>,
}

impl CropperConfig {
    pub fn from_json(contents: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Reads an explicit config file. Unlike [`load_cropper_config`], errors
    /// are returned to the caller.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Overlays the configured values on the built-in defaults.
    pub fn resolve(&self) -> ConfigResult<CropSettings> {
        let defaults = CropSettings::default();
        let aspect_ratio = match self.aspect_ratio.as_deref() {
            Some(value) => value
                .parse::<AspectRatio>()
                .map_err(ConfigError::InvalidAspectRatio)?,
            None => defaults.aspect_ratio,
        };
        let positive = |value: Option<f64>, fallback: f64| {
            value
                .filter(|value| value.is_finite() && *value > 0.0)
                .unwrap_or(fallback)
        };

        Ok(CropSettings {
            aspect_ratio,
            preview_max: DisplayGeometry::new(
                self.preview_max_width
                    .unwrap_or(defaults.preview_max.width)
                    .max(1),
                self.preview_max_height
                    .unwrap_or(defaults.preview_max.height)
                    .max(1),
            ),
            output_max: OutputSize::new(
                self.output_max_width
                    .unwrap_or(defaults.output_max.width)
                    .max(1),
                self.output_max_height
                    .unwrap_or(defaults.output_max.height)
                    .max(1),
            ),
            min_crop_size: positive(self.min_crop_size, defaults.min_crop_size),
            hit_zone: HitZone {
                handle_size: positive(self.handle_size, defaults.hit_zone.handle_size),
                tolerance: self
                    .hit_tolerance
                    .filter(|value| value.is_finite() && *value >= 0.0)
                    .unwrap_or(defaults.hit_zone.tolerance),
            },
            jpeg_quality: self
                .jpeg_quality
                .unwrap_or(defaults.jpeg_quality)
                .clamp(1, 100),
        })
    }
}

pub fn load_cropper_config() -> CropperConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_cropper_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_cropper_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> CropperConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return CropperConfig::default(),
    };
    if !path.exists() {
        return CropperConfig::default();
    }
    match CropperConfig::from_path(&path) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(%err, ?path, "failed to load config.json; using defaults");
            CropperConfig::default()
        }
    }
}

/// Loads the user config and resolves it, falling back to defaults when the
/// values do not validate.
pub fn load_crop_settings() -> CropSettings {
    let config = load_cropper_config();
    config.resolve().unwrap_or_else(|err| {
        tracing::warn!(%err, "invalid crop settings; using defaults");
        CropSettings::default()
    })
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
