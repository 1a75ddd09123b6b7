//! Settings shared by the command line tools, read from a TOML file.

use crate::dataset::{BoundingBox, JOHOR_BBOX};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

fn default_dataset() -> PathBuf {
    PathBuf::from("data/ookla_johor.geojson")
}

fn default_radius_km() -> f64 {
    5.0
}

fn default_bbox() -> BoundingBox {
    JOHOR_BBOX
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Dataset queried when none is given on the command line
    #[serde(default = "default_dataset")]
    pub dataset: PathBuf,
    /// Radius used for point queries
    #[serde(default = "default_radius_km")]
    pub default_radius_km: f64,
    /// Region of interest the clip tool narrows datasets to
    #[serde(default = "default_bbox")]
    pub bbox: BoundingBox,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive, `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            dataset: default_dataset(),
            default_radius_km: default_radius_km(),
            bbox: default_bbox(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    /// Reads `path`, or falls back to the defaults if there is no such file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("no config at {}, using defaults", path.display());
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }
}
