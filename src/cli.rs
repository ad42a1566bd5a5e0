//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{
    ConfigOverrides, DisplayOverrides, LoggingOverrides, RenderOverrides, SessionOverrides,
    ThemeOverrides,
};
use crate::report::OutputFormat;
use crate::theme::ThemeVariant;
use crate::view::{Point, Rect};

/// Built-in theme selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Dark,
    Light,
}

impl From<ThemeArg> for ThemeVariant {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Dark => ThemeVariant::Dark,
            ThemeArg::Light => ThemeVariant::Light,
        }
    }
}

/// A pointer drag in display pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragArg {
    pub origin: Point,
    pub pointer: Point,
}

/// Live watch list of geometric expressions rendered to a raster.
#[derive(Parser, Debug)]
#[command(name = "geowatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Session snapshot (YAML or JSON) the expressions are evaluated against
    #[arg(short, long, value_name = "FILE")]
    pub session: Option<PathBuf>,

    /// Expression to watch; repeat to add rows in order
    #[arg(short, long = "watch", value_name = "EXPR")]
    pub watch: Vec<String>,

    /// Display width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Display height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Zoom into a display rectangle LEFT,TOP,WIDTH,HEIGHT; repeat to compound
    #[arg(long, value_name = "L,T,W,H", value_parser = parse_rect)]
    pub zoom: Vec<Rect>,

    /// Zoom by dragging from OX,OY to X,Y (aspect-locked); applied after --zoom
    #[arg(long, value_name = "OX,OY,X,Y", value_parser = parse_drag)]
    pub drag: Vec<DragArg>,

    /// Write the displayed raster as a PPM image
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Built-in theme
    #[arg(long, value_enum)]
    pub theme: Option<ThemeArg>,

    /// Base16/Base24 scheme file to take the theme from
    #[arg(long, value_name = "FILE")]
    pub scheme: Option<PathBuf>,

    /// Mark the first vertex of every path
    #[arg(long)]
    pub show_direction: bool,

    /// Request labels from the drawing service
    #[arg(long)]
    pub show_labels: bool,

    /// Launch the interactive TUI
    #[arg(short, long)]
    pub interactive: bool,

    /// Load configuration from TOML file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Save the effective configuration to TOML file
    #[arg(long, value_name = "FILE")]
    pub save_config: Option<PathBuf>,

    /// Generate shell completions for the specified shell
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<clap_complete::Shell>,

    /// Log file path (default: geowatch.log)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error (default: info)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Settings given explicitly on the command line, for figment layering.
    ///
    /// Flags that were not passed stay `None` and leave the config file value
    /// in place.
    pub fn to_config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            theme: ThemeOverrides {
                variant: self.theme.map(Into::into),
                scheme: self.scheme.clone(),
            },
            display: DisplayOverrides {
                width: self.width,
                height: self.height,
            },
            render: RenderOverrides {
                show_direction: self.show_direction.then_some(true),
                show_labels: self.show_labels.then_some(true),
            },
            session: SessionOverrides {
                path: self.session.clone(),
                copy_path: None,
            },
            logging: LoggingOverrides {
                file: self.log_file.clone(),
                level: self.log_level.clone(),
            },
        }
    }
}

fn parse_quad(input: &str) -> Result<[f64; 4], String> {
    let parts: Vec<f64> = input
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .map_err(|e| format!("'{}': {e}", p.trim()))
        })
        .collect::<Result<_, _>>()?;
    <[f64; 4]>::try_from(parts)
        .map_err(|parts| format!("expected 4 comma-separated numbers, got {}", parts.len()))
}

fn parse_rect(input: &str) -> Result<Rect, String> {
    let [left, top, width, height] = parse_quad(input)?;
    Ok(Rect::new(left, top, width, height))
}

fn parse_drag(input: &str) -> Result<DragArg, String> {
    let [ox, oy, x, y] = parse_quad(input)?;
    Ok(DragArg {
        origin: Point::new(ox, oy),
        pointer: Point::new(x, y),
    })
}
