//! TUI components using tui-realm.

pub mod canvas;
pub mod help;
pub mod watch_table;

pub use canvas::{Canvas, display_size};
pub use help::{MAIN_FOOTER_ACTIONS, format_footer, render_help};
pub use watch_table::{RowView, WatchTable};
