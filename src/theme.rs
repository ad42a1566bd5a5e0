//! Theme colors: raster background, selection tint and the watch palette.

use std::path::{Path, PathBuf};

use csscolorparser::Color as CssColor;
use palette::Srgba;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tinted_builder::Base16Scheme;

use crate::color_pool::ColorId;

/// 8-bit sRGB color with alpha.
pub type Rgba = Srgba<u8>;

/// Alpha applied to the selection tint (matches a translucent highlight).
const SELECTION_ALPHA: u8 = 92;

/// Accent slots read from a Base16 scheme, in palette order.
const BASE16_ACCENTS: [&str; 8] = [
    "base08", "base09", "base0A", "base0B", "base0C", "base0D", "base0E", "base0F",
];

/// Extra accent slots read from a Base24 scheme.
const BASE24_ACCENTS: [&str; 8] = [
    "base10", "base11", "base12", "base13", "base14", "base15", "base16", "base17",
];

const DARK_PALETTE: [(u8, u8, u8); 12] = [
    (0xe0, 0x6c, 0x75),
    (0x98, 0xc3, 0x79),
    (0x61, 0xaf, 0xef),
    (0xe5, 0xc0, 0x7b),
    (0xc6, 0x78, 0xdd),
    (0x56, 0xb6, 0xc2),
    (0xd1, 0x9a, 0x66),
    (0xbe, 0x50, 0x46),
    (0x7e, 0xc6, 0x99),
    (0x52, 0x8b, 0xff),
    (0xff, 0x9e, 0xc7),
    (0xab, 0xb2, 0xbf),
];

const LIGHT_PALETTE: [(u8, u8, u8); 12] = [
    (0xca, 0x12, 0x43),
    (0x40, 0xa0, 0x2b),
    (0x1e, 0x66, 0xf5),
    (0xdf, 0x8e, 0x1d),
    (0x88, 0x39, 0xef),
    (0x17, 0x92, 0x99),
    (0xfe, 0x64, 0x0b),
    (0xd2, 0x0f, 0x39),
    (0x20, 0x9f, 0xb5),
    (0x72, 0x87, 0xfd),
    (0xea, 0x76, 0xcb),
    (0x5c, 0x5f, 0x77),
];

/// Error type for theme construction and import.
#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("theme palette must contain at least one color")]
    EmptyPalette,
    #[error("invalid color '{input}': {reason}")]
    InvalidColor { input: String, reason: String },
    #[error("scheme is missing palette color {name}")]
    MissingColor { name: String },
    #[error("failed to read scheme {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scheme {}: {details}", path.display())]
    Parse { path: PathBuf, details: String },
}

/// Built-in theme variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeVariant {
    #[default]
    Dark,
    Light,
}

impl ThemeVariant {
    /// The other variant.
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

/// Colors used to paint the raster and identify watch rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: Rgba,
    pub selection: Rgba,
    palette: Vec<Rgba>,
}

impl Theme {
    /// Build a theme; the palette must not be empty.
    pub fn new(background: Rgba, selection: Rgba, palette: Vec<Rgba>) -> Result<Self, ThemeError> {
        if palette.is_empty() {
            return Err(ThemeError::EmptyPalette);
        }
        Ok(Self {
            background,
            selection,
            palette,
        })
    }

    /// One of the built-in themes.
    pub fn builtin(variant: ThemeVariant) -> Self {
        let (background, selection, colors) = match variant {
            ThemeVariant::Dark => (
                Rgba::new(0x1e, 0x1e, 0x1e, 0xff),
                Rgba::new(0x33, 0x99, 0xff, SELECTION_ALPHA),
                &DARK_PALETTE,
            ),
            ThemeVariant::Light => (
                Rgba::new(0xff, 0xff, 0xff, 0xff),
                Rgba::new(0x00, 0x78, 0xd7, SELECTION_ALPHA),
                &LIGHT_PALETTE,
            ),
        };
        Self {
            background,
            selection,
            palette: colors
                .iter()
                .map(|&(r, g, b)| Rgba::new(r, g, b, 0xff))
                .collect(),
        }
    }

    /// Ordered palette colors.
    pub fn palette(&self) -> &[Rgba] {
        &self.palette
    }

    /// Number of palette colors, which bounds the colored rows.
    pub fn len(&self) -> usize {
        self.palette.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palette.is_empty()
    }

    /// Palette color for a color id.
    pub fn color(&self, id: ColorId) -> Option<Rgba> {
        self.palette.get(id).copied()
    }

    /// Color used for rows without an assigned id.
    pub fn fallback_color(&self) -> Rgba {
        self.palette
            .last()
            .copied()
            .unwrap_or(Rgba::new(0x80, 0x80, 0x80, 0xff))
    }

    /// Color for an optional id, falling back when unassigned.
    pub fn color_or_fallback(&self, id: Option<ColorId>) -> Rgba {
        id.and_then(|id| self.color(id))
            .unwrap_or_else(|| self.fallback_color())
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::builtin(ThemeVariant::Dark)
    }
}

/// Parse a color in any CSS format (hex, rgb(), rgba(), hsl(), named).
pub fn parse_color(input: &str) -> Result<Rgba, ThemeError> {
    let css_color: CssColor = input.parse().map_err(|e| ThemeError::InvalidColor {
        input: input.to_string(),
        reason: format!("{e}"),
    })?;
    let [r, g, b, a] = css_color.to_rgba8();
    Ok(Rgba::new(r, g, b, a))
}

/// Format a color as `#rrggbb`, or `#rrggbbaa` when translucent.
pub fn to_hex(color: Rgba) -> String {
    if color.alpha == 0xff {
        format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
    } else {
        format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            color.red, color.green, color.blue, color.alpha
        )
    }
}

/// Load a Base16/Base24 scheme file (YAML, or JSON by extension) as a theme.
///
/// base00 becomes the background, base02 the selection tint, and the accent
/// slots base08-base0F (followed by base10-base17 when present) the palette.
pub fn import_scheme(path: &Path) -> Result<Theme, ThemeError> {
    let content = std::fs::read_to_string(path).map_err(|source| ThemeError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let scheme: Base16Scheme = if is_json {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    }
    .map_err(|details| ThemeError::Parse {
        path: path.to_path_buf(),
        details,
    })?;

    theme_from_scheme(&scheme)
}

/// Convert a parsed scheme to a theme.
pub fn theme_from_scheme(scheme: &Base16Scheme) -> Result<Theme, ThemeError> {
    let background = scheme_color(scheme, "base00")?;
    let selection = scheme_color(scheme, "base02")?;

    let mut palette = BASE16_ACCENTS
        .iter()
        .map(|name| scheme_color(scheme, name))
        .collect::<Result<Vec<_>, _>>()?;
    if BASE24_ACCENTS.iter().all(|name| scheme_color(scheme, name).is_ok()) {
        for name in BASE24_ACCENTS {
            palette.push(scheme_color(scheme, name)?);
        }
    }

    Theme::new(
        background,
        Rgba::new(selection.red, selection.green, selection.blue, SELECTION_ALPHA),
        palette,
    )
}

fn scheme_color(scheme: &Base16Scheme, name: &str) -> Result<Rgba, ThemeError> {
    // Scheme files disagree on the case of base0A-base0F
    let color = scheme
        .palette
        .get(name)
        .or_else(|| scheme.palette.get(&name.to_lowercase()))
        .ok_or_else(|| ThemeError::MissingColor {
            name: name.to_string(),
        })?;
    let (r, g, b) = color.rgb;
    Ok(Rgba::new(r, g, b, 0xff))
}
