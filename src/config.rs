//! Display and runtime options, loaded once at startup from `main.toml`.
//!
//! Every required key has to be present and well-typed. A single missing or
//! malformed key rejects the whole file and the built-in defaults are used
//! instead; a broken config never stops the visualizer from starting.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name looked up in the working directory and the user config dir.
pub const CONFIG_FILE_NAME: &str = "main.toml";

const APP_DIR_NAME: &str = "laneinputs";
const DEFAULT_FONT_PATH: &str = "DroidSans-Bold.ttf";

/// Errors raised while reading the config file. None of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no {0} found in any search location")]
    NotFound(&'static str),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// How axis-motion events are picked out of the platform event queue.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AxisFilter {
    /// Only genuine axis-motion events update the axis state.
    #[default]
    Strict,
    /// Every non-quit event is read as axis motion through its
    /// device/code/value fields.
    Permissive,
}

/// Immutable option set for the lifetime of the process.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayConfig {
    pub always_on_top: bool,
    pub borderless: bool,
    pub window_width: i32,
    pub window_height: i32,
    pub font_size: i32,
    pub font_path: PathBuf,
    pub vsync: bool,
    pub use_gamepad: bool,
    pub axis_filter: AxisFilter,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            always_on_top: false,
            borderless: false,
            window_width: 640,
            window_height: 480,
            font_size: 20,
            font_path: PathBuf::from(DEFAULT_FONT_PATH),
            vsync: true,
            use_gamepad: false,
            axis_filter: AxisFilter::Strict,
        }
    }
}

// On-disk shape of main.toml. Required keys carry no serde default.
#[derive(Deserialize, Debug)]
struct ConfigFile {
    window: WindowSection,
    input: InputSection,
}

#[derive(Deserialize, Debug)]
struct WindowSection {
    always_on_top: bool,
    borderless: bool,
    resolution: ResolutionSection,
    text: TextSection,
    #[serde(default = "default_vsync")]
    vsync: bool,
}

#[derive(Deserialize, Debug)]
struct ResolutionSection {
    width: i32,
    height: i32,
}

#[derive(Deserialize, Debug)]
struct TextSection {
    font_size: i32,
    #[serde(default)]
    font_path: Option<PathBuf>,
}

#[derive(Deserialize, Debug)]
struct InputSection {
    use_gamepad: bool,
    #[serde(default)]
    axis_filter: AxisFilter,
}

fn default_vsync() -> bool {
    true
}

impl DisplayConfig {
    /// Loads the first config file found in the search locations, falling
    /// back to defaults on any error.
    pub fn load_or_default() -> Self {
        let loaded = search_paths()
            .into_iter()
            .find(|path| path.is_file())
            .ok_or(ConfigError::NotFound(CONFIG_FILE_NAME))
            .and_then(|path| Self::load(&path));

        match loaded {
            Ok(config) => config,
            Err(e) => {
                warn!("Reading config failed, using defaults: {}", e);
                let config = Self::default();
                config.log_values();
                config
            }
        }
    }

    /// Loads and validates a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Reading config from {}", path.display());
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&raw).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        info!("Loaded config from {}", path.display());
        config.log_values();
        Ok(config)
    }

    /// Parses and validates config text.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: PathBuf::from(CONFIG_FILE_NAME),
            source,
        })?;

        let config = Self {
            always_on_top: file.window.always_on_top,
            borderless: file.window.borderless,
            window_width: file.window.resolution.width,
            window_height: file.window.resolution.height,
            font_size: file.window.text.font_size,
            font_path: file
                .window
                .text
                .font_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FONT_PATH)),
            vsync: file.window.vsync,
            use_gamepad: file.input.use_gamepad,
            axis_filter: file.input.axis_filter,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("window.resolution.width", self.window_width),
            ("window.resolution.height", self.window_height),
            ("window.text.font_size", self.font_size),
        ];
        for (key, value) in positive {
            if value <= 0 {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("must be greater than zero, got {}", value),
                });
            }
        }
        Ok(())
    }

    fn log_values(&self) {
        info!("always_on_top: {}", self.always_on_top);
        info!("borderless: {}", self.borderless);
        info!("resolution: {}x{}", self.window_width, self.window_height);
        info!("font_size: {}", self.font_size);
        info!("use_gamepad: {}", self.use_gamepad);
        debug!(
            "font_path: {}, vsync: {}, axis_filter: {:?}",
            self.font_path.display(),
            self.vsync,
            self.axis_filter
        );
    }
}

fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME));
    }
    paths
}
