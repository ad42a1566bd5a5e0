//! Interactive TUI: the watch table beside the rendered raster.
//!
//! Architecture: one tui-realm Application hosting the watch table and the
//! raster canvas; all state lives in [`Model`], which forwards every change to
//! the [`Panel`](crate::panel::Panel) as a trigger.

mod activities;
mod components;
mod model;

use std::io::stdout;
use std::sync::LazyLock;

use color_eyre::eyre::Result;
use crossterm_actions::{
    ActionBinding, ActionConfig, AppEvent, EditingMode, TuiEvent, TuiRealmDispatcher,
    defaults, keys,
};
use ratatui::{
    Terminal,
    crossterm::ExecutableCommand,
    crossterm::event::{DisableMouseCapture, EnableMouseCapture},
    crossterm::terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    },
    prelude::CrosstermBackend,
};

use crate::config::GeowatchConfig;

pub use model::Model;

use activities::{MainActivity, Msg};

// ============================================================================
// Event handling (shared across components)
// ============================================================================

/// Unified application events - wraps TuiEvent + custom actions.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum AppAction {
    /// Standard TUI events (navigation, input, selection, app)
    Tui(TuiEvent),
    /// Show the whole canvas again
    ResetZoom,
    /// Write the displayed image to the copy file
    CopyImage,
    /// Re-read the session snapshot (a new break)
    ReloadSession,
    /// Switch between dark and light themes
    ToggleTheme,
    /// Delete marked rows, or the selected row
    DeleteRows,
    /// Mark or unmark the selected row
    ToggleMark,
}

/// Global dispatcher instance - shared by all components.
pub static DISPATCHER: LazyLock<TuiRealmDispatcher<AppAction>> = LazyLock::new(|| {
    let mut config = ActionConfig::new(EditingMode::Emacs);

    for binding in defaults::emacs_defaults().bindings() {
        config.bind(ActionBinding {
            action: AppAction::Tui(binding.action),
            keys: binding.keys.clone(),
            description: binding.description.clone(),
        });
    }

    config.bind(
        ActionBinding::builder()
            .action(AppAction::ResetZoom)
            .key(keys::char('0'))
            .description("Reset zoom")
            .build(),
    );
    config.bind(
        ActionBinding::builder()
            .action(AppAction::CopyImage)
            .key(keys::char('y'))
            .description("Copy image to file")
            .build(),
    );
    config.bind(
        ActionBinding::builder()
            .action(AppAction::ReloadSession)
            .key(keys::char('r'))
            .description("Reload session")
            .build(),
    );
    config.bind(
        ActionBinding::builder()
            .action(AppAction::ToggleTheme)
            .key(keys::char('t'))
            .description("Toggle dark/light theme")
            .build(),
    );
    config.bind(
        ActionBinding::builder()
            .action(AppAction::DeleteRows)
            .key(keys::char('d'))
            .description("Delete marked rows")
            .build(),
    );
    config.bind(
        ActionBinding::builder()
            .action(AppAction::ToggleMark)
            .key(keys::char(' '))
            .description("Mark row")
            .build(),
    );

    config.compile();
    TuiRealmDispatcher::new(config)
});

/// Convenience function for components to access the dispatcher.
pub fn dispatcher() -> &'static TuiRealmDispatcher<AppAction> {
    &DISPATCHER
}

/// Handle global application events that are common across all components.
/// Returns Some(Msg) if the action was handled, None otherwise.
pub fn handle_global_app_events(action: &AppAction) -> Option<Msg> {
    match action {
        AppAction::Tui(TuiEvent::App(AppEvent::Quit)) => Some(Msg::Quit),
        AppAction::Tui(TuiEvent::App(AppEvent::Help)) => Some(Msg::ShowHelp),
        AppAction::Tui(TuiEvent::App(AppEvent::Refresh)) => Some(Msg::Refresh),
        AppAction::ResetZoom => Some(Msg::ResetZoom),
        AppAction::CopyImage => Some(Msg::CopyImage),
        AppAction::ReloadSession => Some(Msg::ReloadSession),
        AppAction::ToggleTheme => Some(Msg::ToggleTheme),
        _ => None,
    }
}

// ============================================================================
// TUI entry point
// ============================================================================

/// Run the interactive TUI with `watches` pre-filled as rows.
pub fn run(config: &GeowatchConfig, watches: &[String]) -> Result<()> {
    let model = Model::from_config(config, watches)?;

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut activity = MainActivity::new(model);
    let result = activity.run(&mut terminal);

    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}
