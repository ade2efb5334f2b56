//! Configuration system
//!
//! Any `Serialize + Deserialize + Default` type can implement [`Config`] and
//! gain `.toml` / `.ron` loading and saving. [`RuntimeConfig`] bundles the
//! sections the wrapper layer consumes:
//!
//! - [`WindowConfig`]: size, title and creation hints for [`crate::Window`]
//! - [`AudioConfig`]: output parameters for [`crate::AudioDevice`]
//! - [`SurfaceConfig`]: search paths and display backend for [`crate::Surface`]

use crate::native::display::WindowFlags;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk encodings, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.ron`
    Ron,
}

impl ConfigFormat {
    /// Format of `path`, if its extension is known
    pub fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Serializable settings stored as `.toml` or `.ron`
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Parse `path`; missing fields take their defaults
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::of(path)?;
        let contents = std::fs::read_to_string(path)?;
        let parsed = match format {
            ConfigFormat::Toml => toml::from_str(&contents).map_err(|e| e.to_string()),
            ConfigFormat::Ron => ron::from_str(&contents).map_err(|e| e.to_string()),
        };
        parsed.map_err(|reason| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Write to `path` in the format its extension names
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::of(path)? {
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| e.to_string()),
            ConfigFormat::Ron => {
                ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                    .map_err(|e| e.to_string())
            }
        }
        .map_err(ConfigError::Serialize)?;

        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid for its format
    #[error("Failed to parse {}: {reason}", .path.display())]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// The settings could not be encoded
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Extension is neither `.toml` nor `.ron`
    #[error("Unsupported config format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Window configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width
    pub width: u32,
    /// Window height
    pub height: u32,
    /// Whether window is resizable
    pub resizable: bool,
    /// Whether to start in fullscreen
    pub fullscreen: bool,
    /// VSync setting
    pub vsync: bool,
    /// Create the window without showing it
    pub hidden: bool,
}

impl WindowConfig {
    /// Create a window configuration with the given size and title
    pub fn new(width: u32, height: u32, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            ..Self::default()
        }
    }

    /// Set resizability
    pub const fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    /// Set fullscreen start
    pub const fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    /// Set vsync
    pub const fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Creation hints for the display backend
    pub fn flags(&self) -> WindowFlags {
        let mut flags = WindowFlags::empty();
        flags.set(WindowFlags::RESIZABLE, self.resizable);
        flags.set(WindowFlags::FULLSCREEN, self.fullscreen);
        flags.set(WindowFlags::VSYNC, self.vsync);
        flags.set(WindowFlags::HIDDEN, self.hidden);
        flags
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "raywrap".to_string(),
            width: 800,
            height: 450,
            resizable: false,
            fullscreen: false,
            vsync: true,
            hidden: false,
        }
    }
}

/// Configuration for the audio device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate (e.g., 44100, 48000)
    pub sample_rate: u32,
    /// Number of output channels (1=mono, 2=stereo)
    pub channels: u16,
    /// Buffer size for audio processing
    pub buffer_size: usize,
    /// Initial master volume (0.0 to 1.0)
    pub master_volume: f32,
}

impl AudioConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample rate must be non-zero".to_string()));
        }
        if !(1..=2).contains(&self.channels) {
            return Err(ConfigError::Invalid(format!(
                "output channels must be 1 or 2, got {}",
                self.channels
            )));
        }
        if !(0.0..=1.0).contains(&self.master_volume) {
            return Err(ConfigError::Invalid(format!(
                "master volume must be within 0.0..=1.0, got {}",
                self.master_volume
            )));
        }
        Ok(())
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            buffer_size: 4096,
            master_volume: 1.0,
        }
    }
}

/// Which display backend a software surface drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayKind {
    /// In-process display without a platform window
    #[default]
    Headless,
    /// GLFW desktop window (requires the `glfw` feature)
    Glfw,
}

/// Native surface configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Directories searched, in order, before a path is used as given
    pub search_paths: Vec<String>,
    /// Display backend
    pub display: DisplayKind,
}

impl SurfaceConfig {
    /// Create a configuration with no search paths and a headless display
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a search path
    pub fn with_search_path(mut self, dir: impl Into<String>) -> Self {
        self.search_paths.push(dir.into());
        self
    }

    /// Select the display backend
    pub const fn with_display(mut self, display: DisplayKind) -> Self {
        self.display = display;
        self
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            search_paths: vec!["resources".to_string()],
            display: DisplayKind::Headless,
        }
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Window section
    pub window: WindowConfig,
    /// Audio section
    pub audio: AudioConfig,
    /// Surface section
    pub surface: SurfaceConfig,
}

impl RuntimeConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window.validate()?;
        self.audio.validate()
    }

    /// Load `path` and reject out-of-range values
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path.as_ref())?;
        config.validate()?;
        log::info!("Loaded runtime config from {}", path.as_ref().display());
        Ok(config)
    }
}

impl Config for RuntimeConfig {}
