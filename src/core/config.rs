use crate::core::progress::{DEFAULT_XP_TO_NEXT_LEVEL, XpCurve};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_FORECAST_URL: &str = "http://localhost:5000";

/// How often a request to the forecasting service is re-sent when it
/// cannot be delivered.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct RetryPolicy {
    /// Extra sends after the first one fails.
    pub retries: u32,
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            retries: 3,
            delay_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ForecastProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub retry: RetryPolicy,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub forecast: Option<ForecastProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            forecast: Some(ForecastProviderConfig {
                base_url: DEFAULT_FORECAST_URL.to_string(),
                retry: RetryPolicy::default(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LearningConfig {
    /// Key the learner's progress is stored under.
    pub profile: String,
    pub initial_xp_to_next_level: u32,
    pub xp_curve: XpCurve,
    /// Replaces the built-in curriculum when set.
    pub curriculum_path: Option<String>,
}

impl Default for LearningConfig {
    fn default() -> Self {
        LearningConfig {
            profile: "default".to_string(),
            initial_xp_to_next_level: DEFAULT_XP_TO_NEXT_LEVEL,
            xp_curve: XpCurve::default(),
            curriculum_path: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ExportConfig {
    pub out_dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            out_dir: ".".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub learning: LearningConfig,
    #[serde(default)]
    pub export: ExportConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    /// Loads the config from the default location, or the defaults when no
    /// file has been set up yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "stockcast", "stockcast")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "stockcast", "stockcast")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn forecast_base_url(&self) -> &str {
        self.providers
            .forecast
            .as_ref()
            .map_or(DEFAULT_FORECAST_URL, |p| &p.base_url)
    }

    pub fn forecast_retry_policy(&self) -> RetryPolicy {
        self.providers
            .forecast
            .as_ref()
            .map(|p| p.retry)
            .unwrap_or_default()
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
