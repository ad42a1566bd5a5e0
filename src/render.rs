//! Builds draw requests from the watch rows and owns the displayed raster.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[cfg(debug_assertions)]
use tracing::instrument;

use crate::debugger::Debugger;
use crate::drawing::{DrawFailure, DrawSettings, DrawingService};
use crate::raster::Raster;
use crate::theme::Theme;
use crate::view::{Size, ViewTransform};
use crate::watch::WatchEntry;

/// Display flags applied to every drawn row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub show_direction: bool,
    pub show_labels: bool,
}

/// One named value to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem {
    pub name: String,
    pub settings: DrawSettings,
}

impl RenderItem {
    pub fn new(name: impl Into<String>, settings: DrawSettings) -> Self {
        Self {
            name: name.into(),
            settings,
        }
    }
}

/// Ordered list of values to draw in one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderRequest {
    items: Vec<RenderItem>,
}

impl RenderRequest {
    pub fn new(items: Vec<RenderItem>) -> Self {
        Self { items }
    }

    /// Every row with text, in row order, resolved or not.
    pub fn from_entries(entries: &[WatchEntry], options: &RenderOptions) -> Self {
        let items = entries
            .iter()
            .filter(|e| !e.is_placeholder())
            .map(|e| {
                RenderItem::new(
                    e.text.clone(),
                    DrawSettings {
                        color: e.color,
                        show_direction: options.show_direction,
                        show_labels: options.show_labels,
                    },
                )
            })
            .collect();
        Self { items }
    }

    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Which user actions are available for the displayed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Affordances {
    pub copy_enabled: bool,
    pub reset_zoom_enabled: bool,
}

/// Result of a render pass.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// Display has no area; nothing changed
    Deferred,
    /// Nothing was drawn; the placeholder is displayed
    Placeholder,
    /// A fresh raster is displayed
    Drawn {
        drawn: usize,
        failures: Vec<DrawFailure>,
    },
}

impl RenderOutcome {
    pub fn is_drawn(&self) -> bool {
        matches!(self, Self::Drawn { .. })
    }
}

/// Owns the displayed raster and decides between a drawn image and the
/// placeholder.
#[derive(Debug, Clone)]
pub struct RenderCoordinator {
    placeholder_size: u32,
    image: Raster,
    is_placeholder: bool,
}

impl RenderCoordinator {
    pub fn new(placeholder_size: u32, theme: &Theme) -> Self {
        Self {
            placeholder_size,
            image: Raster::filled(placeholder_size, placeholder_size, theme.background),
            is_placeholder: true,
        }
    }

    /// The displayed raster.
    pub fn image(&self) -> &Raster {
        &self.image
    }

    pub fn is_placeholder(&self) -> bool {
        self.is_placeholder
    }

    pub fn affordances(&self) -> Affordances {
        Affordances {
            copy_enabled: !self.is_placeholder,
            reset_zoom_enabled: true,
        }
    }

    /// Display the placeholder square in the theme background.
    pub fn show_placeholder(&mut self, theme: &Theme) {
        self.image = Raster::filled(self.placeholder_size, self.placeholder_size, theme.background);
        self.is_placeholder = true;
    }

    #[cfg_attr(
        debug_assertions,
        instrument(skip(self, request, debugger, drawer, theme, view, display), fields(items = request.len()))
    )]
    pub fn render<D, S>(
        &mut self,
        request: &RenderRequest,
        debugger: &D,
        drawer: &mut S,
        theme: &Theme,
        view: &ViewTransform,
        display: Size,
    ) -> RenderOutcome
    where
        D: Debugger + ?Sized,
        S: DrawingService<D> + ?Sized,
    {
        if request.is_empty() {
            self.show_placeholder(theme);
            return RenderOutcome::Placeholder;
        }
        if display.is_empty() {
            debug!("Display has no area, render deferred");
            return RenderOutcome::Deferred;
        }

        let width = display.width.round() as u32;
        let height = display.height.round() as u32;
        let mut raster = Raster::filled(width, height, theme.background);
        let outcome = drawer.draw(&mut raster, debugger, request, theme, view);

        for failure in &outcome.failures {
            warn!(name = %failure.name, reason = %failure.reason, "Row not drawn");
        }

        if outcome.drawn == 0 {
            self.show_placeholder(theme);
            return RenderOutcome::Placeholder;
        }

        self.image = raster;
        self.is_placeholder = false;
        debug!(width, height, drawn = outcome.drawn, "Raster updated");
        RenderOutcome::Drawn {
            drawn: outcome.drawn,
            failures: outcome.failures,
        }
    }
}
