//! TOML configuration file support.
//!
//! Settings are layered with figment: built-in defaults, then the TOML file,
//! then command-line overrides.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::panel::{DEFAULT_PLACEHOLDER_SIZE, PanelSettings};
use crate::render::RenderOptions;
use crate::theme::{Theme, ThemeError, ThemeVariant, import_scheme, parse_color};

/// Error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error(transparent)]
    Extract(#[from] Box<figment::Error>),
    #[error(transparent)]
    Theme(#[from] ThemeError),
}

/// Root configuration structure for TOML files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeowatchConfig {
    pub theme: ThemeConfig,
    pub display: DisplayConfig,
    pub render: RenderOptions,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Theme selection. Explicit colors override the variant or scheme.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub variant: ThemeVariant,
    /// Base16/Base24 scheme file used instead of a built-in theme
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<String>>,
}

/// Raster sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Side of the square shown when nothing is drawn
    pub placeholder_size: u32,
    /// Display area used by the non-interactive renderer
    pub width: u32,
    pub height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            placeholder_size: DEFAULT_PLACEHOLDER_SIZE,
            width: 800,
            height: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Snapshot file evaluated by the scripted debugger
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Where the interactive "copy image" action writes
    pub copy_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: None,
            copy_path: PathBuf::from("geowatch-copy.ppm"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
        }
    }
}

impl GeowatchConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::layered(Some(path), &ConfigOverrides::default())
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, then `path` if given, then `overrides`.
    pub fn layered(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
                });
            }
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Serialized::defaults(overrides))
            .extract()
            .map_err(|e| ConfigError::Extract(Box::new(e)))
    }

    /// Build the theme these settings describe.
    pub fn resolve_theme(&self) -> Result<Theme, ConfigError> {
        Ok(self.theme.resolve()?)
    }

    pub fn panel_settings(&self) -> PanelSettings {
        PanelSettings {
            placeholder_size: self.display.placeholder_size,
            render: self.render,
        }
    }
}

impl ThemeConfig {
    /// Start from the scheme file or built-in variant, then apply explicit colors.
    pub fn resolve(&self) -> Result<Theme, ThemeError> {
        let base = match &self.scheme {
            Some(path) => import_scheme(path)?,
            None => Theme::builtin(self.variant),
        };
        let background = match &self.background {
            Some(c) => parse_color(c)?,
            None => base.background,
        };
        let selection = match &self.selection {
            Some(c) => parse_color(c)?,
            None => base.selection,
        };
        let palette = match &self.palette {
            Some(colors) => colors
                .iter()
                .map(|c| parse_color(c))
                .collect::<Result<Vec<_>, _>>()?,
            None => base.palette().to_vec(),
        };
        Theme::new(background, selection, palette)
    }
}

/// Values set explicitly on the command line. Unset fields are not
/// serialized, so they do not mask lower layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigOverrides {
    pub theme: ThemeOverrides,
    pub display: DisplayOverrides,
    pub render: RenderOverrides,
    pub session: SessionOverrides,
    pub logging: LoggingOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThemeOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<ThemeVariant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_direction: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_labels: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoggingOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}
