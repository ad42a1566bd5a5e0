//! Synchronization engine for a live watch list of geometric expressions.
//!
//! A [`panel::Panel`] keeps an ordered list of watched expressions in sync
//! with a rendered raster of their values. Expressions are evaluated against a
//! [`debugger::Debugger`], each resolved row claims a color from a
//! [`color_pool::ColorIdPool`], and the raster is painted by a
//! [`drawing::DrawingService`] through the current [`view::ViewTransform`].
//! Every external event enters through [`panel::Panel::handle`].

pub mod cli;
pub mod color_pool;
pub mod config;
pub mod debugger;
pub mod drawing;
pub mod logging;
pub mod panel;
pub mod raster;
pub mod render;
pub mod report;
pub mod selection;
pub mod theme;
pub mod tui;
pub mod view;
pub mod watch;
