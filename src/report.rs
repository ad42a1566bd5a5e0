//! Watch report printed by the command-line renderer.

use std::fmt::Write as _;

use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;

use crate::debugger::Debugger;
use crate::drawing::{DrawFailure, DrawingService};
use crate::panel::Panel;
use crate::theme::to_hex;
use crate::view::Rect;

/// Report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text table
    #[default]
    Table,
    Json,
    Yaml,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("JSON serialize error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML serialize error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowReport {
    pub index: usize,
    pub text: String,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub color_id: Option<usize>,
    /// `#rrggbb`; absent for uncolored rows
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageReport {
    pub width: u32,
    pub height: u32,
    pub placeholder: bool,
}

/// Snapshot of the panel after a render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchReport {
    pub rows: Vec<RowReport>,
    pub zoomed: bool,
    pub crop: Rect,
    pub image: ImageReport,
    pub copy_enabled: bool,
    pub reset_zoom_enabled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<DrawFailure>,
}

impl WatchReport {
    /// Describe `panel`. The trailing placeholder row is left out.
    pub fn new<D, S>(panel: &Panel<D, S>, failures: Vec<DrawFailure>) -> Self
    where
        D: Debugger,
        S: DrawingService<D>,
    {
        let rows = panel
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.is_placeholder())
            .map(|(index, row)| RowReport {
                index,
                text: row.text.clone(),
                type_name: row.type_name.clone(),
                color_id: row.color_id,
                color: row.color_id.map(|_| to_hex(row.color)),
            })
            .collect();

        let affordances = panel.affordances();
        Self {
            rows,
            zoomed: panel.view().is_zoomed(),
            crop: panel.view().crop(),
            image: ImageReport {
                width: panel.image().width(),
                height: panel.image().height(),
                placeholder: panel.is_placeholder_shown(),
            },
            copy_enabled: affordances.copy_enabled,
            reset_zoom_enabled: affordances.reset_zoom_enabled,
            failures,
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String, ReportError> {
        Ok(match format {
            OutputFormat::Table => self.to_table(),
            OutputFormat::Json => serde_json::to_string_pretty(self)? + "\n",
            OutputFormat::Yaml => serde_yaml::to_string(self)?,
        })
    }

    fn to_table(&self) -> String {
        let text_width = self
            .rows
            .iter()
            .map(|r| r.text.chars().count())
            .max()
            .unwrap_or(0)
            .max("EXPRESSION".len());

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>3}  {:<text_width$}  {:<12}  {:>5}  COLOR",
            "#", "EXPRESSION", "TYPE", "SLOT"
        );
        for row in &self.rows {
            let _ = writeln!(
                out,
                "{:>3}  {:<text_width$}  {:<12}  {:>5}  {}",
                row.index,
                row.text,
                row.type_name.as_deref().unwrap_or("<invalid>"),
                row.color_id.map(|id| id.to_string()).unwrap_or_else(|| "-".into()),
                row.color.as_deref().unwrap_or("-"),
            );
        }

        let c = &self.crop;
        let _ = writeln!(
            out,
            "\nimage: {}x{}{}",
            self.image.width,
            self.image.height,
            if self.image.placeholder {
                " (placeholder)"
            } else {
                ""
            }
        );
        let _ = writeln!(
            out,
            "view: {} crop=({:.4}, {:.4}, {:.4}, {:.4})",
            if self.zoomed { "zoomed" } else { "full" },
            c.left,
            c.top,
            c.width,
            c.height
        );
        for failure in &self.failures {
            let _ = writeln!(out, "not drawn: {} ({})", failure.name, failure.reason);
        }
        out
    }
}
