//! Property tests for the row/color invariants and the selection rectangle.

use std::collections::HashSet;

use geowatch::debugger::SessionDebugger;
use geowatch::drawing::VertexPlotter;
use geowatch::panel::{Panel, PanelSettings, Trigger};
use geowatch::selection::selection_rect;
use geowatch::theme::{Rgba, Theme};
use geowatch::view::{Point, Rect, Size};
use proptest::prelude::*;
use serde_json::json;

const EXPRESSIONS: &[&str] = &["a", "b", "c", "d", "e", "missing", "a.x", ""];

fn small_theme(shade: u8) -> Theme {
    let c = |r, g, b| Rgba::new(r, g, b, 255);
    Theme::new(
        c(shade, shade, shade),
        c(200, 200, 0),
        vec![c(255, 0, 0), c(0, 255, 0), c(0, 0, 255)],
    )
    .unwrap()
}

fn panel() -> Panel<SessionDebugger, VertexPlotter> {
    let mut dbg = SessionDebugger::default();
    dbg.insert("a", "point", json!({"x": 1.0, "y": 2.0}));
    dbg.insert("b", "linestring", json!([[0, 0], [5, 5]]));
    dbg.insert("c", "point", json!([7, 1]));
    dbg.insert("d", "polygon", json!([[0, 0], [4, 0], [4, 4]]));
    dbg.insert("e", "double", json!(2.5));
    Panel::new(
        dbg,
        VertexPlotter::new(),
        small_theme(0),
        PanelSettings::default(),
    )
}

fn trigger() -> impl Strategy<Value = Trigger> {
    prop_oneof![
        4 => (0usize..10, prop::sample::select(EXPRESSIONS)).prop_map(|(index, text)| {
            Trigger::RowCommitted {
                index,
                text: text.to_string(),
            }
        }),
        2 => prop::collection::vec(0usize..10, 0..5).prop_map(Trigger::DeleteRows),
        1 => Just(Trigger::EnterBreak),
        1 => Just(Trigger::Refresh),
        1 => (0u32..400, 0u32..200).prop_map(|(width, height)| Trigger::Resize { width, height }),
        1 => (0.0f64..400.0, 0.0f64..200.0, 0.0f64..400.0, 0.0f64..200.0).prop_map(
            |(left, top, width, height)| Trigger::Zoom {
                selection: Rect::new(left, top, width, height),
                display: Size::new(400.0, 200.0),
            }
        ),
        1 => Just(Trigger::ResetZoom),
        1 => Just(Trigger::BeginEdit),
        1 => Just(Trigger::EndEdit),
        1 => (0u8..=255).prop_map(|shade| Trigger::ThemeChanged(small_theme(shade))),
    ]
}

proptest! {
    #[test]
    fn row_and_color_invariants_hold(triggers in prop::collection::vec(trigger(), 1..60)) {
        let mut panel = panel();
        for trigger in triggers {
            panel.handle(trigger).unwrap();

            // Exactly one empty row, and it is last
            let rows = panel.rows();
            let empty: Vec<usize> = rows
                .iter()
                .enumerate()
                .filter(|(_, r)| r.text.is_empty())
                .map(|(i, _)| i)
                .collect();
            prop_assert_eq!(empty, vec![rows.len() - 1]);

            // No color id is held twice
            let ids: Vec<usize> = rows.iter().filter_map(|r| r.color_id).collect();
            let distinct: HashSet<usize> = ids.iter().copied().collect();
            prop_assert_eq!(ids.len(), distinct.len());

            // Free ids plus held ids account for the whole palette
            prop_assert_eq!(panel.pool().free_count() + ids.len(), panel.theme().len());
            for id in &ids {
                prop_assert!(panel.pool().is_allocated(*id));
            }

            prop_assert!(panel.check_invariants().is_ok());
        }
    }

    #[test]
    fn selection_keeps_display_aspect(
        ox in 0.0f64..800.0,
        oy in 0.0f64..400.0,
        x in -100.0f64..900.0,
        y in -100.0f64..500.0,
        dw in 10.0f64..1000.0,
        dh in 10.0f64..1000.0,
    ) {
        let display = Size::new(dw, dh);
        if let Some(r) = selection_rect(Point::new(ox, oy), Point::new(x, y), display) {
            let ratio = r.height / r.width;
            let expected = dh / dw;
            prop_assert!(
                ((ratio - expected) / expected).abs() < 1e-9,
                "ratio {} != {}", ratio, expected
            );
            prop_assert!(r.left >= -1e-9 && r.top >= -1e-9);
            prop_assert!(r.right() <= dw + 1e-6 && r.bottom() <= dh + 1e-6);
        }
    }
}
