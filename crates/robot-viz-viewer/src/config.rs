//! Viewer configuration
//!
//! Stored as RON in `<config_dir>/robot-viz/config.ron`.

use std::path::{Path, PathBuf};

use robot_viz::scene::Color;
use robot_viz::{MarkerStyle, PathStyle, RobotOptions};
use serde::{Deserialize, Serialize};

/// Configuration error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

/// How robot link meshes are drawn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RobotDisplayConfig {
    pub color: Color,
    pub opacity: f32,
    /// Use URDF material colors instead of `color`
    pub use_material_colors: bool,
}

impl Default for RobotDisplayConfig {
    fn default() -> Self {
        let options = RobotOptions::default();
        Self {
            color: options.color,
            opacity: options.opacity,
            use_material_colors: options.use_material_colors,
        }
    }
}

/// Complete viewer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    /// Configuration format version
    pub version: u32,
    pub robot: RobotDisplayConfig,
    /// End-effector link; the deepest leaf link when unset
    pub ee_link: Option<String>,
    pub marker: MarkerStyle,
    pub path: PathStyle,
    /// Length of the world and end-effector axes
    pub axes_scale: f64,
    pub show_world_axes: bool,
    pub show_grid: bool,
    pub background: Color,
    pub window_size: [f32; 2],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            robot: RobotDisplayConfig::default(),
            ee_link: None,
            marker: MarkerStyle::default(),
            path: PathStyle::default(),
            axes_scale: 0.1,
            show_world_axes: true,
            show_grid: true,
            background: Color::rgb(0.12, 0.12, 0.14),
            window_size: [1400.0, 900.0],
        }
    }
}

impl ViewerConfig {
    /// Current configuration version
    pub const CURRENT_VERSION: u32 = 1;

    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Robot load options carrying the display settings
    pub fn robot_options(&self) -> RobotOptions {
        RobotOptions {
            color: self.robot.color,
            opacity: self.robot.opacity,
            use_material_colors: self.robot.use_material_colors,
            ..Default::default()
        }
    }
}

/// Configuration manager handles loading, saving, and accessing viewer configuration
pub struct ConfigManager {
    config: ViewerConfig,
    config_path: PathBuf,
    dirty: bool,
}

impl ConfigManager {
    /// Load from the OS-standard location, falling back to defaults
    pub fn new() -> Self {
        Self::open(Self::default_config_path())
    }

    /// Load from `path`, falling back to defaults
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let config_path = path.into();
        let config = Self::load_from_path(&config_path).unwrap_or_else(|| {
            tracing::info!("No config file at {:?}, using defaults", config_path);
            ViewerConfig::default()
        });

        Self {
            config,
            config_path,
            dirty: false,
        }
    }

    /// Get the OS-standard configuration directory
    fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("robot-viz")
    }

    pub fn default_config_path() -> PathBuf {
        Self::config_dir().join("config.ron")
    }

    fn load_from_path(path: &Path) -> Option<ViewerConfig> {
        let content = std::fs::read_to_string(path).ok()?;
        match ViewerConfig::from_ron(&content) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Get a mutable reference to the configuration (marks as dirty)
    pub fn config_mut(&mut self) -> &mut ViewerConfig {
        self.dirty = true;
        &mut self.config
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Save the configuration to disk if it changed
    pub fn save(&mut self) -> Result<(), ConfigError> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let content = self.config.to_ron()?;
        std::fs::write(&self.config_path, &content).map_err(|e| ConfigError::Io(e.to_string()))?;

        tracing::info!("Saved config to {:?}", self.config_path);
        self.dirty = false;
        Ok(())
    }

    pub fn reset_to_defaults(&mut self) {
        self.config = ViewerConfig::default();
        self.dirty = true;
    }

    pub fn config_file_path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
