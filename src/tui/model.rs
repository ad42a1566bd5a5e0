//! Application model for the TUI.

use std::collections::BTreeSet;

use color_eyre::eyre::{Result, WrapErr};
use tracing::{error, info};
use tuirealm::Update;

use crate::config::GeowatchConfig;
use crate::debugger::SessionDebugger;
use crate::drawing::VertexPlotter;
use crate::panel::{Panel, PanelUpdate, Trigger};
use crate::raster::PpmFileSink;
use crate::render::RenderOutcome;
use crate::theme::{Theme, ThemeVariant};

use super::activities::Msg;

/// The panel type the TUI drives.
pub type WatchPanel = Panel<SessionDebugger, VertexPlotter>;

/// Application model containing all state.
pub struct Model {
    pub panel: WatchPanel,
    pub variant: ThemeVariant,

    // Table state
    pub selected: usize,
    pub marked: BTreeSet<usize>,
    /// Start editing the selected row once the table is rebuilt
    pub edit_selected: bool,

    // UI state
    pub quit: bool,
    pub show_help: bool,
    pub message: Option<String>,

    copy_sink: PpmFileSink,
    dirty: bool,
}

impl Model {
    /// Build the panel from configuration and commit `watches` as rows.
    pub fn from_config(config: &GeowatchConfig, watches: &[String]) -> Result<Self> {
        let theme = config.resolve_theme().wrap_err("Failed to build theme")?;
        let debugger = match &config.session.path {
            Some(path) => SessionDebugger::load(path)
                .wrap_err_with(|| format!("Failed to load session {}", path.display()))?,
            None => SessionDebugger::default(),
        };

        let mut panel = Panel::new(
            debugger,
            VertexPlotter::new(),
            theme,
            config.panel_settings(),
        );
        panel.handle(Trigger::EnterBreak)?;
        for text in watches {
            let index = panel.rows().len() - 1;
            panel.handle(Trigger::RowCommitted {
                index,
                text: text.clone(),
            })?;
        }

        Ok(Self {
            panel,
            variant: config.theme.variant,
            selected: 0,
            marked: BTreeSet::new(),
            edit_selected: false,
            quit: false,
            show_help: false,
            message: None,
            copy_sink: PpmFileSink::new(config.session.copy_path.clone()),
            dirty: true,
        })
    }

    /// Whether components must be rebuilt; clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Forward a trigger to the panel. Returns whether it was accepted.
    fn apply(&mut self, trigger: Trigger) -> bool {
        match self.panel.handle(trigger) {
            Ok(update) => {
                self.absorb(update);
                true
            }
            Err(e) => {
                error!(error = %e, "Trigger rejected");
                self.message = Some(format!("Error: {e}"));
                false
            }
        }
    }

    fn absorb(&mut self, update: PanelUpdate) {
        if let Some(selection) = update.selection {
            self.selected = selection.index;
            self.edit_selected = selection.focus_new;
        }
        if update.removed > 0 {
            self.marked.clear();
            self.message = Some(format!("Removed {} row(s)", update.removed));
        }
        if let Some(RenderOutcome::Drawn { failures, .. }) = &update.render
            && !failures.is_empty()
        {
            let names: Vec<&str> = failures.iter().map(|f| f.name.as_str()).collect();
            self.message = Some(format!("Not drawn: {}", names.join(", ")));
        }
        self.selected = self.selected.min(self.panel.rows().len() - 1);
        self.dirty = true;
    }

    fn reload_session(&mut self) {
        match self.panel.debugger_mut().reload() {
            Ok(()) => {
                self.message = Some("Session reloaded".to_string());
                self.apply(Trigger::EnterBreak);
            }
            Err(e) => {
                error!(error = %e, "Reload failed");
                self.message = Some(format!("Reload failed: {e}"));
            }
        }
    }

    fn copy_image(&mut self) {
        self.message = Some(match self.panel.copy_image(&mut self.copy_sink) {
            Ok(true) => format!("Image written to {}", self.copy_sink.path().display()),
            Ok(false) => "Nothing to copy".to_string(),
            Err(e) => format!("Copy failed: {e}"),
        });
    }

    fn toggle_theme(&mut self) {
        let variant = self.variant.toggled();
        if self.apply(Trigger::ThemeChanged(Theme::builtin(variant))) {
            self.variant = variant;
            info!(?variant, "Theme switched");
            self.message = Some(match variant {
                ThemeVariant::Dark => "Dark theme".to_string(),
                ThemeVariant::Light => "Light theme".to_string(),
            });
        }
    }
}

impl Update<Msg> for Model {
    fn update(&mut self, msg: Option<Msg>) -> Option<Msg> {
        let msg = msg?;

        match msg {
            Msg::Quit => {
                self.quit = true;
                None
            }
            Msg::ShowHelp => {
                self.show_help = true;
                None
            }
            Msg::HideHelp => {
                self.show_help = false;
                None
            }

            // Focus is handled by the activity
            Msg::FocusNext | Msg::FocusPrev => None,

            Msg::SelectRow(index) => {
                self.selected = index.min(self.panel.rows().len() - 1);
                None
            }
            Msg::ToggleMark(index) => {
                let deletable = index + 1 < self.panel.rows().len();
                if !self.marked.remove(&index) && deletable {
                    self.marked.insert(index);
                }
                self.dirty = true;
                None
            }

            Msg::BeginEdit => {
                self.edit_selected = false;
                self.apply(Trigger::BeginEdit);
                None
            }
            Msg::CancelEdit => {
                self.apply(Trigger::EndEdit);
                None
            }
            Msg::CommitRow { index, text } => {
                self.apply(Trigger::EndEdit);
                self.apply(Trigger::RowCommitted { index, text });
                None
            }
            Msg::DeleteRows(indices) => {
                self.apply(Trigger::DeleteRows(indices));
                None
            }

            Msg::Resize { width, height } => {
                self.apply(Trigger::Resize { width, height });
                None
            }
            Msg::Zoom { selection, display } => {
                self.apply(Trigger::Zoom { selection, display });
                None
            }
            Msg::ResetZoom => {
                self.apply(Trigger::ResetZoom);
                None
            }
            Msg::Refresh => {
                self.apply(Trigger::Refresh);
                None
            }

            Msg::CopyImage => {
                self.copy_image();
                None
            }
            Msg::ReloadSession => {
                self.reload_session();
                None
            }
            Msg::ToggleTheme => {
                self.toggle_theme();
                None
            }
        }
    }
}
