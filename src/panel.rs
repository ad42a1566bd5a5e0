//! The watch panel: owns all synchronization state and processes triggers.
//!
//! Every external event (break entered, resize, theme change, row edit,
//! batch delete, zoom) is a [`Trigger`] handed to [`Panel::handle`], which
//! updates the rows and re-renders through one reconciliation pass.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{debug, info};

#[cfg(debug_assertions)]
use tracing::instrument;

use crate::color_pool::ColorIdPool;
use crate::debugger::Debugger;
use crate::drawing::DrawingService;
use crate::raster::{ExportError, ImageSink, Raster};
use crate::render::{Affordances, RenderCoordinator, RenderOptions, RenderOutcome, RenderRequest};
use crate::theme::Theme;
use crate::view::{Rect, Size, ViewTransform};
use crate::watch::{WatchEntry, WatchList};

/// Side length of the placeholder raster.
pub const DEFAULT_PLACEHOLDER_SIZE: u32 = 100;

/// An external event the panel reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// The debugged process paused
    EnterBreak,
    /// The display area changed size
    Resize { width: u32, height: u32 },
    /// The splitter between list and image moved
    SplitterDragged { width: u32, height: u32 },
    ThemeChanged(Theme),
    /// An edit of a row's text was committed
    RowCommitted { index: usize, text: String },
    /// Delete the selected rows
    DeleteRows(Vec<usize>),
    /// A cell edit started in the host list
    BeginEdit,
    /// The cell edit finished or was cancelled
    EndEdit,
    /// A zoom gesture completed with `selection` in pixels of `display`
    Zoom { selection: Rect, display: Size },
    ResetZoom,
    /// Re-evaluate and redraw everything
    Refresh,
}

/// Row the host list should select after a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub index: usize,
    /// Begin editing the selected row
    pub focus_new: bool,
}

/// What changed while handling a trigger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelUpdate {
    pub selection: Option<Selection>,
    /// Set when a render pass ran
    pub render: Option<RenderOutcome>,
    /// Rows removed
    pub removed: usize,
}

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("theme has {found} colors but the panel was built for {expected}")]
    PaletteSizeMismatch { expected: usize, found: usize },
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// A broken panel invariant, reported by [`Panel::check_invariants`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("expected exactly one empty row at the end, found empty rows at {empty:?}")]
    Placeholder { empty: Vec<usize> },
    #[error("color id {id} is held by more than one row")]
    DuplicateColor { id: usize },
    #[error("color id {id} is held by a row but free in the pool")]
    FreeColorInUse { id: usize },
    #[error("{free} free ids plus {colored} colored rows != palette size {capacity}")]
    Conservation {
        free: usize,
        colored: usize,
        capacity: usize,
    },
}

/// Settings fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelSettings {
    pub placeholder_size: u32,
    pub render: RenderOptions,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            placeholder_size: DEFAULT_PLACEHOLDER_SIZE,
            render: RenderOptions::default(),
        }
    }
}

pub struct Panel<D, S> {
    debugger: D,
    drawer: S,
    theme: Theme,
    pool: ColorIdPool,
    rows: WatchList,
    view: ViewTransform,
    renderer: RenderCoordinator,
    options: RenderOptions,
    display: Size,
    editing: bool,
}

impl<D, S> Panel<D, S>
where
    D: Debugger,
    S: DrawingService<D>,
{
    /// A panel with one placeholder row, a full view, and no display area
    /// until the first resize.
    pub fn new(debugger: D, drawer: S, theme: Theme, settings: PanelSettings) -> Self {
        Self {
            pool: ColorIdPool::new(theme.len()),
            rows: WatchList::new(&theme),
            renderer: RenderCoordinator::new(settings.placeholder_size, &theme),
            view: ViewTransform::new(),
            options: settings.render,
            display: Size::default(),
            editing: false,
            debugger,
            drawer,
            theme,
        }
    }

    pub fn rows(&self) -> &[WatchEntry] {
        self.rows.entries()
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    /// The displayed raster.
    pub fn image(&self) -> &Raster {
        self.renderer.image()
    }

    pub fn is_placeholder_shown(&self) -> bool {
        self.renderer.is_placeholder()
    }

    pub fn affordances(&self) -> Affordances {
        self.renderer.affordances()
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn pool(&self) -> &ColorIdPool {
        &self.pool
    }

    pub fn display(&self) -> Size {
        self.display
    }

    pub fn render_options(&self) -> RenderOptions {
        self.options
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn debugger(&self) -> &D {
        &self.debugger
    }

    pub fn debugger_mut(&mut self) -> &mut D {
        &mut self.debugger
    }

    /// Process one trigger.
    #[cfg_attr(debug_assertions, instrument(skip(self)))]
    pub fn handle(&mut self, trigger: Trigger) -> Result<PanelUpdate, PanelError> {
        let update = match trigger {
            Trigger::EnterBreak | Trigger::Refresh => self.reconciled(None),
            Trigger::Resize { width, height } | Trigger::SplitterDragged { width, height } => {
                self.display = Size::new(f64::from(width), f64::from(height));
                self.reconciled(None)
            }
            Trigger::ThemeChanged(theme) => self.change_theme(theme)?,
            Trigger::RowCommitted { index, text } => self.commit_row(index, text),
            Trigger::DeleteRows(indices) => self.delete_rows(&indices),
            Trigger::BeginEdit => {
                self.editing = true;
                PanelUpdate::default()
            }
            Trigger::EndEdit => {
                self.editing = false;
                PanelUpdate::default()
            }
            Trigger::Zoom { selection, display } => {
                if self.view.zoom(selection, display) {
                    info!(crop = ?self.view.crop(), "Zoomed");
                    self.reconciled(None)
                } else {
                    debug!(?selection, "Ignored degenerate zoom");
                    PanelUpdate::default()
                }
            }
            Trigger::ResetZoom => {
                if self.view.reset() {
                    info!("Zoom reset");
                    self.reconciled(None)
                } else {
                    PanelUpdate::default()
                }
            }
        };

        debug_assert!(
            self.check_invariants().is_ok(),
            "panel invariant broken: {:?}",
            self.check_invariants()
        );
        Ok(update)
    }

    /// Write the displayed image to `sink`. Returns `false` when copying is
    /// not available because only the placeholder is displayed.
    pub fn copy_image(&self, sink: &mut dyn ImageSink) -> Result<bool, PanelError> {
        if !self.affordances().copy_enabled {
            return Ok(false);
        }
        sink.copy_image(self.renderer.image())?;
        Ok(true)
    }

    /// Verify the row/pool invariants: one trailing placeholder, distinct
    /// color ids, and every palette id either free or held by exactly one row.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let rows = self.rows.entries();
        let empty: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_placeholder())
            .map(|(i, _)| i)
            .collect();
        if empty.len() != 1 || empty[0] + 1 != rows.len() {
            return Err(InvariantViolation::Placeholder { empty });
        }

        let mut seen = BTreeSet::new();
        for id in rows.iter().filter_map(|e| e.color_id) {
            if !seen.insert(id) {
                return Err(InvariantViolation::DuplicateColor { id });
            }
            if !self.pool.is_allocated(id) {
                return Err(InvariantViolation::FreeColorInUse { id });
            }
        }

        let free = self.pool.free_count();
        let colored = seen.len();
        let capacity = self.pool.capacity();
        if free + colored != capacity {
            return Err(InvariantViolation::Conservation {
                free,
                colored,
                capacity,
            });
        }
        Ok(())
    }

    fn commit_row(&mut self, index: usize, text: String) -> PanelUpdate {
        if index >= self.rows.len() {
            debug!(index, rows = self.rows.len(), "Commit for missing row ignored");
            return PanelUpdate::default();
        }
        let last = self.rows.last_index();

        if text.is_empty() {
            if index == last {
                return PanelUpdate::default();
            }
            self.rows.remove(index, &mut self.pool);
            info!(index, "Row cleared and removed");
            return PanelUpdate {
                removed: 1,
                ..self.reconciled(None)
            };
        }

        info!(index, expression = %text, "Row committed");
        self.rows.set_text(index, text);
        let mut update = self.reconciled(Some(index));
        if index == last {
            self.rows.insert_placeholder(index + 1, &self.theme);
        }
        update.selection = Some(Selection {
            index: index + 1,
            focus_new: index == last,
        });
        update
    }

    fn delete_rows(&mut self, indices: &[usize]) -> PanelUpdate {
        if self.editing {
            debug!("Delete ignored while editing");
            return PanelUpdate::default();
        }
        let removed = self.rows.delete_rows(indices, &mut self.pool);
        if removed == 0 {
            return PanelUpdate::default();
        }
        info!(removed, "Rows deleted");
        PanelUpdate {
            removed,
            ..self.reconciled(None)
        }
    }

    fn change_theme(&mut self, theme: Theme) -> Result<PanelUpdate, PanelError> {
        if theme.len() != self.pool.capacity() {
            return Err(PanelError::PaletteSizeMismatch {
                expected: self.pool.capacity(),
                found: theme.len(),
            });
        }
        self.theme = theme;
        self.rows.recolor(&self.theme);
        Ok(self.reconciled(None))
    }

    fn reconciled(&mut self, modified: Option<usize>) -> PanelUpdate {
        PanelUpdate {
            render: Some(self.reconcile(modified)),
            ..PanelUpdate::default()
        }
    }

    /// One reconciliation pass: evaluate rows, then render.
    fn reconcile(&mut self, modified: Option<usize>) -> RenderOutcome {
        if !self.debugger.is_at_break() {
            debug!("Not at a break, showing placeholder");
            self.renderer.show_placeholder(&self.theme);
            return RenderOutcome::Placeholder;
        }

        let report = self
            .rows
            .reconcile(modified, &self.debugger, &mut self.pool, &self.theme);
        debug!(?report, "Rows reconciled");

        let request = RenderRequest::from_entries(self.rows.entries(), &self.options);
        self.renderer.render(
            &request,
            &self.debugger,
            &mut self.drawer,
            &self.theme,
            &self.view,
            self.display,
        )
    }
}
