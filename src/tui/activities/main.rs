//! Main activity - the watch table beside the rendered image.

use std::io::Stdout;
use std::time::Duration;

use color_eyre::eyre::Result;
use ratatui::{
    Terminal,
    crossterm::event::{self, Event, KeyCode},
    layout::{Constraint, Direction, Layout, Rect as Area},
    prelude::CrosstermBackend,
    style::{Modifier, Style},
    widgets::Paragraph,
};
use tuirealm::{
    Application, EventListenerCfg, PollStrategy, Sub, SubClause, SubEventClause, Update,
};

use crate::theme::ThemeVariant;
use crate::tui::Model;
use crate::tui::components::{
    Canvas, MAIN_FOOTER_ACTIONS, RowView, WatchTable, display_size, format_footer, render_help,
};
use crate::view::{Rect, Size};

// ============================================================================
// Component identifiers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Id {
    WatchTable,
    Canvas,
}

// ============================================================================
// Messages
// ============================================================================

/// All possible messages that can be sent in MainActivity.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    // Application control
    Quit,
    ShowHelp,
    HideHelp,

    // Focus/Navigation
    FocusNext,
    FocusPrev,

    // Watch table
    SelectRow(usize),
    ToggleMark(usize),
    BeginEdit,
    CancelEdit,
    CommitRow { index: usize, text: String },
    DeleteRows(Vec<usize>),

    // Canvas
    Resize { width: u32, height: u32 },
    Zoom { selection: Rect, display: Size },
    ResetZoom,

    // Global actions
    Refresh,
    CopyImage,
    ReloadSession,
    ToggleTheme,
}

/// Custom user events (unused, but required by tui-realm).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd)]
pub enum UserEvent {}

// ============================================================================
// Focus management
// ============================================================================

const ALL_FOCUS_IDS: &[Id] = &[Id::WatchTable, Id::Canvas];

/// Manages focus state for Tab navigation.
#[derive(Default)]
pub struct FocusManager {
    current_idx: usize,
}

impl FocusManager {
    pub fn current_focus(&self) -> Id {
        ALL_FOCUS_IDS
            .get(self.current_idx)
            .copied()
            .unwrap_or(Id::WatchTable)
    }

    pub fn focus_next(&mut self) -> Id {
        self.current_idx = (self.current_idx + 1) % ALL_FOCUS_IDS.len();
        self.current_focus()
    }

    pub fn focus_prev(&mut self) -> Id {
        self.current_idx = (self.current_idx + ALL_FOCUS_IDS.len() - 1) % ALL_FOCUS_IDS.len();
        self.current_focus()
    }

    pub fn focus(&mut self, id: Id) {
        if let Some(idx) = ALL_FOCUS_IDS.iter().position(|i| *i == id) {
            self.current_idx = idx;
        }
    }
}

// ============================================================================
// MainActivity
// ============================================================================

pub struct MainActivity {
    app: Application<Id, Msg, UserEvent>,
    model: Model,
    focus: FocusManager,
    /// Pixel size last reported to the panel
    display: Option<(u32, u32)>,
}

impl MainActivity {
    pub fn new(model: Model) -> Self {
        let app = Application::init(
            EventListenerCfg::default()
                .crossterm_input_listener(Duration::from_millis(20), 10)
                .poll_timeout(Duration::from_millis(50)),
        );
        Self {
            app,
            model,
            focus: FocusManager::default(),
            display: None,
        }
    }

    /// Draw and handle events until the user quits.
    pub fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        self.sync_components();
        while !self.model.quit {
            self.on_draw(terminal)?;
        }
        Ok(())
    }

    /// Remount components from the model and restore focus.
    ///
    /// The table is left alone while a cell edit is open so the edit buffer
    /// survives redraws of the image.
    fn sync_components(&mut self) {
        let model = &mut self.model;
        let rows: Vec<RowView> = model.panel.rows().iter().map(RowView::from).collect();

        if model.edit_selected {
            let table = WatchTable::new(rows, model.selected, model.marked.clone());
            let _ = self.app.umount(&Id::WatchTable);
            let _ = self
                .app
                .mount(Id::WatchTable, Box::new(table.editing_selected()), vec![]);
            self.focus.focus(Id::WatchTable);
            model.update(Some(Msg::BeginEdit));
        } else if !model.panel.is_editing() {
            let table = WatchTable::new(rows, model.selected, model.marked.clone());
            let _ = self.app.umount(&Id::WatchTable);
            let _ = self.app.mount(Id::WatchTable, Box::new(table), vec![]);
        }

        let title = if model.panel.view().is_zoomed() {
            " Image (zoomed) "
        } else {
            " Image "
        };
        let canvas = Canvas::new(
            model.panel.image().clone(),
            title,
            model.panel.theme().background,
            model.panel.theme().selection,
        );
        let _ = self.app.umount(&Id::Canvas);
        let _ = self.app.mount(
            Id::Canvas,
            Box::new(canvas),
            vec![Sub::new(SubEventClause::Any, SubClause::Always)],
        );

        model.take_dirty();
        let _ = self.app.active(&self.focus.current_focus());
    }

    fn process(&mut self, msg: Msg) {
        match &msg {
            Msg::FocusNext => {
                let next = self.focus.focus_next();
                let _ = self.app.active(&next);
            }
            Msg::FocusPrev => {
                let prev = self.focus.focus_prev();
                let _ = self.app.active(&prev);
            }
            _ => {}
        }

        let mut current = Some(msg);
        while let Some(m) = current {
            current = self.model.update(Some(m));
        }
    }

    fn on_draw(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let app = &mut self.app;
        let model = &self.model;
        let mut canvas_area: Option<Area> = None;

        terminal.draw(|frame| {
            let main_rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1), // Title
                    Constraint::Min(6),    // Content
                    Constraint::Length(1), // Status
                ])
                .split(frame.area());

            let session = model
                .panel
                .debugger()
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "no session".to_string());
            let variant = match model.variant {
                ThemeVariant::Dark => "dark",
                ThemeVariant::Light => "light",
            };
            let title = format!(" geowatch - {session} - {variant} ");
            let title_widget =
                Paragraph::new(title).style(Style::default().add_modifier(Modifier::BOLD));
            frame.render_widget(title_widget, main_rows[0]);

            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
                .split(main_rows[1]);

            app.view(&Id::WatchTable, frame, cols[0]);
            app.view(&Id::Canvas, frame, cols[1]);
            canvas_area = Some(cols[1]);

            let status = model.message.clone().unwrap_or_else(|| {
                format_footer(MAIN_FOOTER_ACTIONS, &[("zoom", "drag"), ("edit", "Enter")])
            });
            let status_widget =
                Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
            frame.render_widget(status_widget, main_rows[2]);

            if model.show_help {
                render_help(frame);
            }
        })?;

        // The splitter is fixed, so the canvas only changes size with the terminal
        if let Some(area) = canvas_area {
            let size = display_size(area);
            if self.display != Some(size) {
                self.display = Some(size);
                self.process(Msg::Resize {
                    width: size.0,
                    height: size.1,
                });
            }
        }

        // The help modal intercepts all input while visible
        if self.model.show_help {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('?') => {
                        self.process(Msg::HideHelp);
                    }
                    _ => {}
                }
            }
            return Ok(());
        }

        // Timeouts are expected between events
        if let Ok(messages) = self.app.tick(PollStrategy::Once) {
            for msg in messages {
                self.process(msg);
            }
        }

        if self.model.take_dirty() {
            self.sync_components();
        }

        Ok(())
    }
}
