//! Configuration file support for the dashboard.
//!
//! A mounted dashboard reads one `DashboardConfig`: where the scoring API
//! lives, how verbose logging is, and the sizes and colors of the canvas
//! panels. The only external override is the API root (see
//! [`crate::constants::API_URL_ENV`]).

use serde::{Deserialize, Serialize};
use si_raster::Rgba;

use crate::constants;
use crate::results::ResultMode;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(self) -> log::LevelFilter {
        self.to_level().to_level_filter()
    }

    /// Convert to log crate's Level.
    pub fn to_level(self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Version of the configuration file format
    #[serde(default = "default_version")]
    pub version: u32,

    /// Root of the scoring API, e.g. `https://host/api`
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Annotation canvas
    #[serde(default)]
    pub editor: EditorOptions,

    /// Ranked prediction panel
    #[serde(default)]
    pub ranked: RankedOptions,

    /// Lazy loading of result rows
    #[serde(default)]
    pub viewport: ViewportOptions,

    /// Result grid geometry
    #[serde(default)]
    pub grid: GridOptions,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

/// Annotation canvas options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Brush color as `#rrggbb`
    pub draw_color: String,
    /// Opacity of stamps and of the annotation layer in the preview
    pub active_alpha: f32,
    /// Side length of the mask sent for ranking
    pub mask_size: u32,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            width: constants::MASK_WIRE_SIZE,
            height: constants::MASK_WIRE_SIZE,
            draw_color: constants::DRAW_COLOR.to_string(),
            active_alpha: constants::ACTIVE_ALPHA,
            mask_size: constants::MASK_WIRE_SIZE,
        }
    }
}

impl EditorOptions {
    /// Brush color, falling back to the default on a malformed value.
    pub fn brush_color(&self) -> Rgba {
        Rgba::from_hex(&self.draw_color).unwrap_or_else(|e| {
            log::warn!("Ignoring brush color '{}': {}", self.draw_color, e);
            Rgba::opaque(0xf2, 0xd6, 0x02)
        })
    }
}

/// Ranked prediction panel options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankedOptions {
    /// Number of predictions requested
    pub top_k: u32,
    /// Opacity of pixels outside a prediction's mask
    pub dim_alpha: f32,
}

impl Default for RankedOptions {
    fn default() -> Self {
        Self {
            top_k: constants::DEFAULT_TOP_K,
            dim_alpha: constants::DIM_ALPHA,
        }
    }
}

/// Lazy loading options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportOptions {
    /// Margin around the viewport that already counts as visible
    pub root_margin: f64,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            root_margin: constants::DEFAULT_ROOT_MARGIN,
        }
    }
}

/// Result grid geometry in CSS pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    /// Cards per row in the image grid
    pub columns: u32,
    /// Card width
    pub card_width: f64,
    /// Card height
    pub card_height: f64,
    /// Space between cards
    pub gap: f64,
    /// Row height in the text list
    pub text_row_height: f64,
    /// Image grid or text list; derived from the case study when unset
    pub mode: Option<ResultMode>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            columns: 5,
            card_width: 175.0,
            card_height: 210.0,
            gap: 8.0,
            text_row_height: 130.0,
            mode: None,
        }
    }
}

impl DashboardConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            api_base_url: None,
            log_level: LogLevel::default(),
            editor: EditorOptions::default(),
            ranked: RankedOptions::default(),
            viewport: ViewportOptions::default(),
            grid: GridOptions::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Apply the API root override from the environment (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn with_env_overrides(self) -> Self {
        self.with_api_override(std::env::var(constants::API_URL_ENV).ok())
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn with_api_override(mut self, value: Option<String>) -> Self {
        if let Some(url) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            log::info!("Using API root override {}", url);
            self.api_base_url = Some(url);
        }
        self
    }

    /// Resolve the API root: explicit setting, otherwise the platform default.
    pub fn api_base_url(&self) -> String {
        if let Some(url) = &self.api_base_url {
            return url.clone();
        }
        platform_api_url()
    }

    /// LocalStorage key for WASM config persistence.
    #[cfg(target_arch = "wasm32")]
    const LOCALSTORAGE_KEY: &'static str = "shared-interest-config";

    /// Try to load configuration from localStorage (WASM only).
    /// Returns None if not found or can't be parsed.
    #[cfg(target_arch = "wasm32")]
    pub fn load_from_local_storage() -> Option<Self> {
        let window = web_sys::window()?;
        let storage = window.local_storage().ok()??;

        match storage.get_item(Self::LOCALSTORAGE_KEY) {
            Ok(Some(json)) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from localStorage");
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config from localStorage: {}", e);
                    None
                }
            },
            Ok(None) => {
                log::debug!("No config found in localStorage");
                None
            }
            Err(e) => {
                log::warn!("Failed to read from localStorage: {:?}", e);
                None
            }
        }
    }

    /// Save configuration to localStorage (WASM only).
    #[cfg(target_arch = "wasm32")]
    pub fn save_to_local_storage(&self) -> Result<(), ConfigError> {
        let window = web_sys::window()
            .ok_or_else(|| ConfigError::StorageError("No window object available".to_string()))?;

        let storage = window
            .local_storage()
            .map_err(|e| ConfigError::StorageError(format!("localStorage access error: {:?}", e)))?
            .ok_or_else(|| ConfigError::StorageError("localStorage not available".to_string()))?;

        storage
            .set_item(Self::LOCALSTORAGE_KEY, &self.to_json()?)
            .map_err(|e| {
                ConfigError::StorageError(format!("Failed to save to localStorage: {:?}", e))
            })?;

        log::info!("Saved configuration to localStorage");
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn platform_api_url() -> String {
    constants::DEFAULT_API_URL.to_string()
}

/// Same origin as the page, under `/api`.
#[cfg(target_arch = "wasm32")]
fn platform_api_url() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .map(|origin| format!("{}/api", origin.trim_end_matches('/')))
        .unwrap_or_else(|| constants::DEFAULT_API_URL.to_string())
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// Storage error (localStorage in WASM)
    #[error("Storage error: {0}")]
    StorageError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.editor.width, 224);
        assert_eq!(config.editor.mask_size, 224);
        assert_eq!(config.ranked.top_k, 5);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config =
            DashboardConfig::from_json(r#"{"log_level": "debug", "editor": {"width": 256}}"#)
                .unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.editor.width, 256);
        assert_eq!(config.editor.height, 224);
        assert_eq!(config.grid, GridOptions::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = DashboardConfig::new();
        config.api_base_url = Some("https://example.org/api".to_string());
        config.ranked.top_k = 3;
        let parsed = DashboardConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed.api_base_url, config.api_base_url);
        assert_eq!(parsed.ranked, config.ranked);
    }

    #[test]
    fn test_rejects_newer_version() {
        let err = DashboardConfig::from_json(r#"{"version": 99}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::VersionTooNew {
                file_version: 99,
                ..
            }
        ));
    }

    #[test]
    fn test_api_override() {
        let config = DashboardConfig::new().with_api_override(Some(" http://x/api ".into()));
        assert_eq!(config.api_base_url(), "http://x/api");

        let untouched = DashboardConfig::new().with_api_override(Some("   ".into()));
        assert_eq!(untouched.api_base_url(), constants::DEFAULT_API_URL);
    }

    #[test]
    fn test_brush_color_fallback() {
        let mut editor = EditorOptions::default();
        assert_eq!(editor.brush_color(), Rgba::opaque(0xf2, 0xd6, 0x02));
        editor.draw_color = "not a color".to_string();
        assert_eq!(editor.brush_color(), Rgba::opaque(0xf2, 0xd6, 0x02));
    }
}
