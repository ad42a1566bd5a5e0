//! Help modal displaying keybindings.

use crossterm_actions::{AppEvent, NavigationEvent, SelectionEvent, TuiEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::tui::{AppAction, dispatcher};

/// Actions to display in a keybinding group.
struct KeybindingGroup {
    title: &'static str,
    actions: &'static [AppAction],
}

/// Groups of actions for the help modal.
const HELP_GROUPS: &[KeybindingGroup] = &[
    KeybindingGroup {
        title: "Global",
        actions: &[
            AppAction::Tui(TuiEvent::App(AppEvent::Quit)),
            AppAction::Tui(TuiEvent::App(AppEvent::Help)),
            AppAction::Tui(TuiEvent::App(AppEvent::Refresh)),
            AppAction::ReloadSession,
            AppAction::ToggleTheme,
        ],
    },
    KeybindingGroup {
        title: "Focus Navigation",
        actions: &[
            AppAction::Tui(TuiEvent::Selection(SelectionEvent::Next)),
            AppAction::Tui(TuiEvent::Selection(SelectionEvent::Prev)),
        ],
    },
    KeybindingGroup {
        title: "Watch List",
        actions: &[
            AppAction::Tui(TuiEvent::Navigation(NavigationEvent::Up)),
            AppAction::Tui(TuiEvent::Navigation(NavigationEvent::Down)),
            AppAction::ToggleMark,
            AppAction::DeleteRows,
        ],
    },
    KeybindingGroup {
        title: "Image",
        actions: &[AppAction::ResetZoom, AppAction::CopyImage],
    },
];

/// Bindings handled directly by components rather than the dispatcher.
/// Format: (description, keys)
const EXTRA_BINDINGS: &[(&str, &str)] = &[
    ("Edit expression", "Enter"),
    ("Commit edit", "Enter"),
    ("Cancel edit", "Esc"),
    ("Delete character", "Backspace"),
    ("Zoom to area", "drag mouse"),
    ("Cancel zoom drag", "Esc"),
];

/// Actions shown in the status bar footer.
pub const MAIN_FOOTER_ACTIONS: &[AppAction] = &[
    AppAction::Tui(TuiEvent::Selection(SelectionEvent::Next)),
    AppAction::DeleteRows,
    AppAction::ResetZoom,
    AppAction::Tui(TuiEvent::App(AppEvent::Help)),
    AppAction::Tui(TuiEvent::App(AppEvent::Quit)),
];

/// Format a footer string from a list of actions.
/// Format: "desc: key | desc: key" (description first, single key binding)
pub fn format_footer(actions: &[AppAction], extras: &[(&str, &str)]) -> String {
    let help_entries = dispatcher().config().help_entries();
    let mut parts: Vec<String> = Vec::new();

    for action in actions {
        if let Some(entry) = help_entries.get(action)
            && let (Some(key), Some(desc)) = (entry.keys.first(), entry.description)
        {
            let short_desc = desc
                .split_whitespace()
                .next()
                .unwrap_or(desc)
                .to_lowercase();
            parts.push(format!("{short_desc}: {key}"));
        }
    }

    for (desc, key) in extras {
        parts.push(format!("{desc}: {key}"));
    }

    parts.join(" | ")
}

/// Centered popup area with given width/height percentages.
fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

fn binding_line(description: &str, keys: String, dim: Style) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("  {description:<20}")),
        Span::styled(keys, dim),
    ])
}

/// Render the help modal overlay.
pub fn render_help(frame: &mut Frame) {
    let area = popup_area(frame.area(), 50, 80);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [content_area, footer_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().fg(Color::Gray);

    let mut lines = vec![
        Line::from(Span::styled("Keybindings", bold)),
        Line::from(""),
    ];

    let help_entries = dispatcher().config().help_entries();

    for group in HELP_GROUPS {
        lines.push(Line::from(Span::styled(group.title, bold)));
        for action in group.actions {
            if let Some(entry) = help_entries.get(action) {
                let keys_str = entry
                    .keys
                    .iter()
                    .map(|k| k.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                let desc = entry.description.unwrap_or("(no description)");
                lines.push(binding_line(desc, keys_str, dim));
            }
        }
        lines.push(Line::from(""));
    }

    lines.push(Line::from(Span::styled("Editing and Zoom", bold)));
    for (description, keys) in EXTRA_BINDINGS {
        lines.push(binding_line(description, keys.to_string(), dim));
    }

    frame.render_widget(Paragraph::new(lines), content_area);

    let footer = Paragraph::new(Line::from(Span::styled(
        "Press Esc, ?, or Enter to close",
        Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::ITALIC),
    )))
    .alignment(ratatui::layout::Alignment::Center);
    frame.render_widget(footer, footer_area);
}
