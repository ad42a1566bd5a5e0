//! Raster canvas with mouse drag-to-zoom.
//!
//! Each terminal cell shows two vertically stacked pixels using the upper
//! half block: the foreground is the top pixel, the background the bottom.

use ratatui::Frame;
use ratatui::{
    layout::Rect as Area,
    style::{Color, Style},
    widgets::{Block, Borders},
};
use tuirealm::{
    Component, Event, MockComponent, State,
    command::{Cmd, CmdResult},
    event::{Key, MouseButton, MouseEventKind},
    props::{AttrValue, Attribute, Props},
};

use crate::raster::Raster;
use crate::selection::ZoomDrag;
use crate::theme::Rgba;
use crate::tui::activities::{Msg, UserEvent};
use crate::tui::components::watch_table::to_color;
use crate::tui::{AppAction, dispatcher, handle_global_app_events};
use crate::view::{Point, Size};
use crossterm_actions::{SelectionEvent, TuiEvent};

const UPPER_HALF: &str = "▀";

/// Opacity of the drag rectangle overlay.
const SELECTION_ALPHA: u8 = 96;

/// Pixel area available inside the canvas border for a given frame area.
pub fn display_size(area: Area) -> (u32, u32) {
    let inner = Block::default().borders(Borders::ALL).inner(area);
    (u32::from(inner.width), u32::from(inner.height) * 2)
}

pub struct Canvas {
    props: Props,
    image: Raster,
    title: String,
    /// Shown around an image smaller than the display
    background: Rgba,
    selection_color: Rgba,
    drag: ZoomDrag,
    /// Inner area from the last draw, for mapping mouse cells to pixels
    inner: Area,
}

impl Canvas {
    pub fn new(
        image: Raster,
        title: impl Into<String>,
        background: Rgba,
        selection_color: Rgba,
    ) -> Self {
        Self {
            props: Props::default(),
            image,
            title: title.into(),
            background,
            selection_color,
            drag: ZoomDrag::new(),
            inner: Area::default(),
        }
    }

    fn display(&self) -> Size {
        Size::new(
            f64::from(self.inner.width),
            f64::from(self.inner.height) * 2.0,
        )
    }

    /// Pixel under a terminal cell, clamped to the display.
    fn to_pixel(&self, column: u16, row: u16) -> Point {
        let x = column.saturating_sub(self.inner.x).min(self.inner.width);
        let y = row.saturating_sub(self.inner.y).min(self.inner.height);
        Point::new(f64::from(x), f64::from(y) * 2.0)
    }

    fn on_mouse(&mut self, kind: MouseEventKind, column: u16, row: u16) -> Option<Msg> {
        let point = self.to_pixel(column, row);
        match kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let inside = column >= self.inner.x
                    && row >= self.inner.y
                    && column < self.inner.x + self.inner.width
                    && row < self.inner.y + self.inner.height;
                if inside {
                    self.drag.press(point);
                }
                None
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.drag.motion(point, self.display());
                None
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.drag.release().map(|selection| Msg::Zoom {
                    selection,
                    display: self.display(),
                })
            }
            _ => None,
        }
    }

    /// Pixel shown at display position (x, y): the image centered in the
    /// display, with the drag rectangle blended over it.
    fn pixel_at(&self, x: u32, y: u32) -> Rgba {
        let off_x = (i64::from(self.inner.width) - i64::from(self.image.width())) / 2;
        let off_y = (i64::from(self.inner.height) * 2 - i64::from(self.image.height())) / 2;
        let ix = i64::from(x) - off_x;
        let iy = i64::from(y) - off_y;

        let base = if ix >= 0 && iy >= 0 {
            self.image
                .pixel(ix as u32, iy as u32)
                .unwrap_or(self.background)
        } else {
            self.background
        };

        match self.drag.selection() {
            Some(sel) if sel.contains(Point::new(f64::from(x), f64::from(y))) => {
                let mut cell = Raster::filled(1, 1, base);
                let mut overlay = self.selection_color;
                overlay.alpha = SELECTION_ALPHA;
                cell.blend_pixel(0, 0, overlay);
                cell.pixel(0, 0).unwrap_or(base)
            }
            _ => base,
        }
    }
}

impl MockComponent for Canvas {
    fn view(&mut self, frame: &mut Frame, area: Area) {
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
            .title(self.title.as_str())
            .borders(Borders::ALL)
            .border_style(border_style);

        self.inner = block.inner(area);
        frame.render_widget(block, area);

        let buf = frame.buffer_mut();
        for row in 0..self.inner.height {
            for col in 0..self.inner.width {
                let top = self.pixel_at(u32::from(col), u32::from(row) * 2);
                let bottom = self.pixel_at(u32::from(col), u32::from(row) * 2 + 1);
                if let Some(cell) = buf.cell_mut((self.inner.x + col, self.inner.y + row)) {
                    cell.set_symbol(UPPER_HALF)
                        .set_fg(to_color(top))
                        .set_bg(to_color(bottom));
                }
            }
        }
    }

    fn query(&self, attr: Attribute) -> Option<AttrValue> {
        self.props.get(attr)
    }

    fn attr(&mut self, attr: Attribute, value: AttrValue) {
        self.props.set(attr, value);
    }

    fn state(&self) -> State {
        State::None
    }

    fn perform(&mut self, _cmd: Cmd) -> CmdResult {
        CmdResult::None
    }
}

impl Component<Msg, UserEvent> for Canvas {
    fn on(&mut self, ev: Event<UserEvent>) -> Option<Msg> {
        match ev {
            Event::Mouse(mouse) => self.on_mouse(mouse.kind, mouse.column, mouse.row),
            Event::Keyboard(key_event) => {
                let focused = self
                    .props
                    .get_or(Attribute::Focus, AttrValue::Flag(false))
                    .unwrap_flag();
                if !focused {
                    return None;
                }

                if key_event.code == Key::Esc && self.drag.is_active() {
                    self.drag.cancel();
                    return None;
                }

                let action = dispatcher().dispatch(&key_event)?;

                if let Some(msg) = handle_global_app_events(&action) {
                    return Some(msg);
                }

                match action {
                    AppAction::Tui(TuiEvent::Selection(SelectionEvent::Next)) => {
                        Some(Msg::FocusNext)
                    }
                    AppAction::Tui(TuiEvent::Selection(SelectionEvent::Prev)) => {
                        Some(Msg::FocusPrev)
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }
}
