//! Watch list table: expression, type and color swatch per row.

use std::collections::BTreeSet;

use crossterm_actions::{InputEvent, NavigationEvent, SelectionEvent, TuiEvent};
use ratatui::Frame;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
};
use tuirealm::{
    Component, Event, MockComponent, State, StateValue,
    command::{Cmd, CmdResult, Direction as CmdDirection},
    props::{AttrValue, Attribute, Props},
};

use crate::theme::Rgba;
use crate::tui::activities::{Msg, UserEvent};
use crate::tui::{AppAction, dispatcher, handle_global_app_events};
use crate::watch::WatchEntry;

/// What the table shows for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub text: String,
    pub type_name: Option<String>,
    pub color: Rgba,
    /// Whether the row holds a palette color
    pub colored: bool,
}

impl From<&WatchEntry> for RowView {
    fn from(entry: &WatchEntry) -> Self {
        Self {
            text: entry.text.clone(),
            type_name: entry.type_name.clone(),
            color: entry.color,
            colored: entry.color_id.is_some(),
        }
    }
}

pub(crate) fn to_color(c: Rgba) -> Color {
    Color::Rgb(c.red, c.green, c.blue)
}

/// Editable list of watched expressions.
pub struct WatchTable {
    props: Props,
    rows: Vec<RowView>,
    selected: usize,
    marked: BTreeSet<usize>,
    editing: bool,
    edit_buffer: String,
}

impl WatchTable {
    pub fn new(rows: Vec<RowView>, selected: usize, marked: BTreeSet<usize>) -> Self {
        let selected = selected.min(rows.len().saturating_sub(1));
        Self {
            props: Props::default(),
            rows,
            selected,
            marked,
            editing: false,
            edit_buffer: String::new(),
        }
    }

    /// Open the selected row for editing, as after committing into the
    /// placeholder row.
    pub fn editing_selected(mut self) -> Self {
        self.start_editing();
        self
    }

    fn start_editing(&mut self) {
        self.editing = true;
        self.edit_buffer = self
            .rows
            .get(self.selected)
            .map(|r| r.text.clone())
            .unwrap_or_default();
    }

    fn cancel_editing(&mut self) {
        self.editing = false;
        self.edit_buffer.clear();
    }

    fn confirm_editing(&mut self) -> Msg {
        self.editing = false;
        Msg::CommitRow {
            index: self.selected,
            text: std::mem::take(&mut self.edit_buffer),
        }
    }

    fn delete_targets(&self) -> Vec<usize> {
        if self.marked.is_empty() {
            vec![self.selected]
        } else {
            self.marked.iter().copied().collect()
        }
    }

    fn table_row(&self, index: usize, row: &RowView) -> Row<'static> {
        let mark = if self.marked.contains(&index) { "*" } else { " " };

        let text = if self.editing && index == self.selected {
            Line::from(vec![
                Span::styled(
                    self.edit_buffer.clone(),
                    Style::default().fg(Color::White).bg(Color::DarkGray),
                ),
                Span::styled("▏", Style::default().fg(Color::Cyan)),
            ])
        } else if row.text.is_empty() {
            Line::from(Span::styled(
                "<add expression>",
                Style::default().add_modifier(Modifier::DIM),
            ))
        } else {
            Line::from(row.text.clone())
        };

        let type_cell = match &row.type_name {
            Some(t) => Span::raw(t.clone()),
            None if row.text.is_empty() => Span::raw(""),
            None => Span::styled("<invalid>", Style::default().fg(Color::Red)),
        };

        let swatch = if row.colored {
            Span::styled("███", Style::default().fg(to_color(row.color)))
        } else {
            Span::raw("")
        };

        Row::new(vec![
            Cell::from(mark),
            Cell::from(text),
            Cell::from(type_cell),
            Cell::from(swatch),
        ])
    }
}

impl MockComponent for WatchTable {
    fn view(&mut self, frame: &mut Frame, area: Rect) {
        let focused = self
            .props
            .get_or(Attribute::Focus, AttrValue::Flag(false))
            .unwrap_flag();

        let border_style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };

        let block = Block::default()
            .title(" Watch ")
            .borders(Borders::ALL)
            .border_style(border_style);

        let header = Row::new(vec!["", "Expression", "Type", "Color"])
            .style(Style::default().add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| self.table_row(i, r))
            .collect();

        let highlight = if focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };

        let table = Table::new(
            rows,
            [
                Constraint::Length(1),
                Constraint::Min(12),
                Constraint::Length(12),
                Constraint::Length(5),
            ],
        )
        .header(header)
        .block(block)
        .row_highlight_style(highlight);

        let mut state = TableState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn query(&self, attr: Attribute) -> Option<AttrValue> {
        self.props.get(attr)
    }

    fn attr(&mut self, attr: Attribute, value: AttrValue) {
        self.props.set(attr, value);
    }

    fn state(&self) -> State {
        State::One(StateValue::Usize(self.selected))
    }

    fn perform(&mut self, cmd: Cmd) -> CmdResult {
        match cmd {
            Cmd::Move(CmdDirection::Up) if self.selected > 0 => {
                self.selected -= 1;
                CmdResult::Changed(self.state())
            }
            Cmd::Move(CmdDirection::Down) if self.selected + 1 < self.rows.len() => {
                self.selected += 1;
                CmdResult::Changed(self.state())
            }
            _ => CmdResult::None,
        }
    }
}

impl Component<Msg, UserEvent> for WatchTable {
    fn on(&mut self, ev: Event<UserEvent>) -> Option<Msg> {
        let focused = self
            .props
            .get_or(Attribute::Focus, AttrValue::Flag(false))
            .unwrap_flag();

        if !focused {
            return None;
        }

        let Event::Keyboard(key_event) = ev else {
            return None;
        };

        // Editing reads raw keys
        if self.editing {
            return match key_event.code {
                tuirealm::event::Key::Enter => Some(self.confirm_editing()),
                tuirealm::event::Key::Esc => {
                    self.cancel_editing();
                    Some(Msg::CancelEdit)
                }
                tuirealm::event::Key::Backspace => {
                    self.edit_buffer.pop();
                    None
                }
                tuirealm::event::Key::Char(c) => {
                    self.edit_buffer.push(c);
                    None
                }
                _ => None,
            };
        }

        let action = dispatcher().dispatch(&key_event)?;

        if let Some(msg) = handle_global_app_events(&action) {
            return Some(msg);
        }

        match action {
            AppAction::Tui(TuiEvent::Selection(SelectionEvent::Next)) => Some(Msg::FocusNext),
            AppAction::Tui(TuiEvent::Selection(SelectionEvent::Prev)) => Some(Msg::FocusPrev),
            AppAction::Tui(TuiEvent::Navigation(NavigationEvent::Up)) => {
                match self.perform(Cmd::Move(CmdDirection::Up)) {
                    CmdResult::Changed(_) => Some(Msg::SelectRow(self.selected)),
                    _ => None,
                }
            }
            AppAction::Tui(TuiEvent::Navigation(NavigationEvent::Down)) => {
                match self.perform(Cmd::Move(CmdDirection::Down)) {
                    CmdResult::Changed(_) => Some(Msg::SelectRow(self.selected)),
                    _ => None,
                }
            }
            AppAction::Tui(TuiEvent::Input(InputEvent::Confirm)) => {
                self.start_editing();
                Some(Msg::BeginEdit)
            }
            AppAction::ToggleMark => {
                // The placeholder row cannot be deleted, so it is never marked
                if self.selected + 1 < self.rows.len() && !self.marked.remove(&self.selected) {
                    self.marked.insert(self.selected);
                }
                Some(Msg::ToggleMark(self.selected))
            }
            AppAction::DeleteRows => Some(Msg::DeleteRows(self.delete_targets())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use tuirealm::event::{Key, KeyEvent, KeyModifiers};

    use super::*;
    use crate::theme::{Theme, ThemeVariant};

    fn rows() -> Vec<RowView> {
        let theme = Theme::builtin(ThemeVariant::Dark);
        vec![
            RowView::from(&WatchEntry::new("poly", Some("polygon".into()), Some(0), &theme)),
            RowView::from(&WatchEntry::new("bad", None, None, &theme)),
            RowView::from(&WatchEntry::placeholder(&theme)),
        ]
    }

    fn focused(table: WatchTable) -> WatchTable {
        let mut table = table;
        table.attr(Attribute::Focus, AttrValue::Flag(true));
        table
    }

    fn key(code: Key) -> Event<UserEvent> {
        Event::Keyboard(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn ignores_keys_without_focus() {
        let mut table = WatchTable::new(rows(), 0, BTreeSet::new());
        assert_eq!(table.on(key(Key::Down)), None);
    }

    #[test]
    fn moves_stay_within_bounds() {
        let mut table = WatchTable::new(rows(), 0, BTreeSet::new());
        assert_eq!(table.perform(Cmd::Move(CmdDirection::Up)), CmdResult::None);
        table.perform(Cmd::Move(CmdDirection::Down));
        table.perform(Cmd::Move(CmdDirection::Down));
        assert_eq!(table.perform(Cmd::Move(CmdDirection::Down)), CmdResult::None);
        assert_eq!(table.state(), State::One(StateValue::Usize(2)));
    }

    #[test]
    fn edit_commits_buffer() {
        let mut table = focused(WatchTable::new(rows(), 2, BTreeSet::new()).editing_selected());
        for c in "ring".chars() {
            assert_eq!(table.on(key(Key::Char(c))), None);
        }
        table.on(key(Key::Backspace));
        assert_eq!(
            table.on(key(Key::Enter)),
            Some(Msg::CommitRow {
                index: 2,
                text: "rin".into()
            })
        );
    }

    #[test]
    fn escape_cancels_edit() {
        let mut table = focused(WatchTable::new(rows(), 0, BTreeSet::new()).editing_selected());
        table.on(key(Key::Char('x')));
        assert_eq!(table.on(key(Key::Esc)), Some(Msg::CancelEdit));
        assert!(!table.editing);
    }

    #[test]
    fn delete_targets_prefer_marks() {
        let table = WatchTable::new(rows(), 1, BTreeSet::from([0]));
        assert_eq!(table.delete_targets(), [0]);
        let table = WatchTable::new(rows(), 1, BTreeSet::new());
        assert_eq!(table.delete_targets(), [1]);
    }
}
