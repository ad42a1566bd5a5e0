//! Panel behavior through its trigger interface.

use geowatch::debugger::SessionDebugger;
use geowatch::drawing::VertexPlotter;
use geowatch::panel::{Panel, PanelSettings, PanelUpdate, Selection, Trigger};
use geowatch::raster::{ExportError, ImageSink, Raster};
use geowatch::render::RenderOutcome;
use geowatch::selection::selection_rect;
use geowatch::theme::{Theme, ThemeVariant};
use geowatch::view::{Point, Rect, Size};
use serde_json::json;

type TestPanel = Panel<SessionDebugger, VertexPlotter>;

fn debugger() -> SessionDebugger {
    let mut dbg = SessionDebugger::default();
    dbg.insert("v", "point", json!([3.0, 4.0]));
    dbg.insert("w", "point", json!({"x": 1.0, "y": 1.0}));
    dbg.insert(
        "poly",
        "polygon",
        json!([[0.0, 0.0], [10.0, 0.0], [10.0, 5.0], [0.0, 5.0]]),
    );
    dbg.insert("n", "int", json!(42));
    dbg
}

fn panel_with(dbg: SessionDebugger) -> TestPanel {
    Panel::new(
        dbg,
        VertexPlotter::new(),
        Theme::builtin(ThemeVariant::Dark),
        PanelSettings::default(),
    )
}

fn sized_panel() -> TestPanel {
    let mut panel = panel_with(debugger());
    panel.handle(Trigger::EnterBreak).unwrap();
    panel
        .handle(Trigger::Resize {
            width: 800,
            height: 400,
        })
        .unwrap();
    panel
}

fn commit(panel: &mut TestPanel, index: usize, text: &str) -> PanelUpdate {
    panel
        .handle(Trigger::RowCommitted {
            index,
            text: text.to_string(),
        })
        .unwrap()
}

fn append(panel: &mut TestPanel, text: &str) -> PanelUpdate {
    let index = panel.rows().len() - 1;
    commit(panel, index, text)
}

#[derive(Default)]
struct RecordingSink {
    copies: Vec<(u32, u32)>,
}

impl ImageSink for RecordingSink {
    fn copy_image(&mut self, raster: &Raster) -> Result<(), ExportError> {
        self.copies.push((raster.width(), raster.height()));
        Ok(())
    }
}

#[test]
fn scenario_a_empty_list_shows_placeholder() {
    let mut panel = panel_with(debugger());
    let update = panel.handle(Trigger::EnterBreak).unwrap();
    // No display area yet, but nothing needs one
    assert_eq!(update.render, Some(RenderOutcome::Placeholder));
    assert!(panel.is_placeholder_shown());

    let update = panel
        .handle(Trigger::Resize {
            width: 800,
            height: 400,
        })
        .unwrap();
    assert_eq!(update.render, Some(RenderOutcome::Placeholder));
    assert!(panel.is_placeholder_shown());
    assert_eq!(panel.image().width(), 100);
    assert_eq!(panel.image().height(), 100);
    assert_eq!(panel.rows().len(), 1);
    assert!(panel.rows()[0].is_placeholder());
}

#[test]
fn scenario_b_valid_commit_assigns_color_and_new_row() {
    let mut panel = sized_panel();
    let update = commit(&mut panel, 0, "v");

    let row = &panel.rows()[0];
    assert_eq!(row.type_name.as_deref(), Some("point"));
    let id = row.color_id.expect("row should be colored");
    assert!(id < panel.theme().len());
    assert_eq!(row.color, panel.theme().color(id).unwrap());

    assert_eq!(panel.rows().len(), 2);
    assert!(panel.rows()[1].is_placeholder());
    assert_eq!(
        update.selection,
        Some(Selection {
            index: 1,
            focus_new: true
        })
    );
    assert!(!panel.is_placeholder_shown());
    assert_eq!(panel.image().width(), 800);
}

#[test]
fn scenario_c_clearing_a_row_frees_its_color() {
    let mut panel = sized_panel();
    append(&mut panel, "v");
    append(&mut panel, "w");
    assert_eq!(panel.rows()[0].color_id, Some(0));
    assert_eq!(panel.rows()[1].color_id, Some(1));
    let free_before = panel.pool().free_count();

    let update = commit(&mut panel, 0, "");

    assert_eq!(update.removed, 1);
    assert!(update.render.is_some(), "removal should trigger a reconcile");
    assert_eq!(panel.rows().len(), 2);
    assert_eq!(panel.rows()[0].text, "w");
    assert_eq!(panel.rows()[0].color_id, Some(1));
    assert!(!panel.pool().is_allocated(0));
    assert_eq!(panel.pool().free_count(), free_before + 1);
}

#[test]
fn scenario_d_drag_selection_zooms_view() {
    let mut panel = sized_panel();
    append(&mut panel, "poly");
    let display = panel.display();

    let selection =
        selection_rect(Point::new(100.0, 100.0), Point::new(500.0, 150.0), display).unwrap();
    assert_eq!(selection, Rect::new(100.0, 100.0, 400.0, 200.0));

    let update = panel
        .handle(Trigger::Zoom { selection, display })
        .unwrap();
    assert!(update.render.is_some());
    assert!(panel.view().is_zoomed());
    assert!(
        panel
            .view()
            .crop()
            .approx_eq(&Rect::new(0.125, 0.25, 0.5, 0.5))
    );
}

#[test]
fn scenario_e_reset_renders_once() {
    let mut panel = sized_panel();
    append(&mut panel, "poly");
    panel
        .handle(Trigger::Zoom {
            selection: Rect::new(0.0, 0.0, 400.0, 200.0),
            display: panel.display(),
        })
        .unwrap();
    assert!(panel.affordances().reset_zoom_enabled);

    let first = panel.handle(Trigger::ResetZoom).unwrap();
    assert!(first.render.is_some_and(|r| r.is_drawn()));
    assert!(!panel.view().is_zoomed());
    assert!(panel.affordances().reset_zoom_enabled);

    let second = panel.handle(Trigger::ResetZoom).unwrap();
    assert_eq!(second, PanelUpdate::default());
}

#[test]
fn reset_without_zoom_is_a_no_op() {
    let mut panel = sized_panel();
    let update = panel.handle(Trigger::ResetZoom).unwrap();
    assert_eq!(update.render, None);
    assert!(panel.view().crop().approx_eq(&Rect::UNIT));
}

#[test]
fn commit_evaluates_only_the_edited_row() {
    let mut panel = sized_panel();
    append(&mut panel, "v");
    append(&mut panel, "n");
    let before = panel.rows()[0].clone();

    // "v" would no longer resolve, but only row 1 is re-evaluated
    panel.debugger_mut().remove("v");
    commit(&mut panel, 1, "poly");

    assert_eq!(panel.rows()[0], before);
    assert_eq!(panel.rows()[1].type_name.as_deref(), Some("polygon"));

    // A full pass picks the change up; the row keeps its color
    panel.handle(Trigger::Refresh).unwrap();
    assert_eq!(panel.rows()[0].type_name, None);
    assert_eq!(panel.rows()[0].color_id, before.color_id);
}

#[test]
fn batch_delete_never_removes_last_row() {
    let mut panel = sized_panel();
    append(&mut panel, "v");
    append(&mut panel, "w");
    append(&mut panel, "poly");
    let last = panel.rows().len() - 1;

    let update = panel.handle(Trigger::DeleteRows(vec![0, 2, last])).unwrap();

    assert_eq!(update.removed, 2);
    let texts: Vec<&str> = panel.rows().iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, ["w", ""]);
    panel.check_invariants().unwrap();
}

#[test]
fn delete_ignored_while_editing() {
    let mut panel = sized_panel();
    append(&mut panel, "v");
    panel.handle(Trigger::BeginEdit).unwrap();
    let update = panel.handle(Trigger::DeleteRows(vec![0])).unwrap();
    assert_eq!(update.removed, 0);
    assert_eq!(panel.rows().len(), 2);

    panel.handle(Trigger::EndEdit).unwrap();
    let update = panel.handle(Trigger::DeleteRows(vec![0])).unwrap();
    assert_eq!(update.removed, 1);
}

#[test]
fn palette_exhaustion_leaves_rows_uncolored() {
    let mut dbg = SessionDebugger::default();
    for i in 0..14 {
        dbg.insert(format!("p{i}"), "point", json!([i, i]));
    }
    let mut panel = panel_with(dbg);
    panel
        .handle(Trigger::Resize {
            width: 80,
            height: 40,
        })
        .unwrap();
    let capacity = panel.theme().len();

    for i in 0..capacity + 2 {
        append(&mut panel, &format!("p{i}"));
    }

    let colored = panel.rows().iter().filter(|r| r.color_id.is_some()).count();
    assert_eq!(colored, capacity);
    assert_eq!(panel.pool().free_count(), 0);
    let overflow = &panel.rows()[capacity];
    assert_eq!(overflow.type_name.as_deref(), Some("point"));
    assert_eq!(overflow.color_id, None);
    assert_eq!(overflow.color, panel.theme().fallback_color());

    // The pass after a removal hands the freed id to a waiting row
    commit(&mut panel, 0, "");
    assert_eq!(panel.rows()[capacity - 1].color_id, Some(0));
    let colored = panel.rows().iter().filter(|r| r.color_id.is_some()).count();
    assert_eq!(colored, capacity);
    panel.check_invariants().unwrap();
}

#[test]
fn unresolved_rows_are_not_drawn() {
    let mut panel = sized_panel();
    let update = append(&mut panel, "missing");
    assert_eq!(panel.rows()[0].type_name, None);
    assert_eq!(panel.rows()[0].color_id, None);
    assert_eq!(update.render, Some(RenderOutcome::Placeholder));
}

#[test]
fn non_geometric_values_are_reported_as_failures() {
    let mut panel = sized_panel();
    append(&mut panel, "v");
    let update = append(&mut panel, "n");
    match update.render {
        Some(RenderOutcome::Drawn { drawn, failures }) => {
            assert_eq!(drawn, 1);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].name, "n");
        }
        other => panic!("expected a drawn image, got {other:?}"),
    }
}

#[test]
fn copy_is_disabled_on_placeholder() {
    let mut panel = sized_panel();
    let mut sink = RecordingSink::default();
    assert!(!panel.affordances().copy_enabled);
    assert!(!panel.copy_image(&mut sink).unwrap());
    assert!(sink.copies.is_empty());

    append(&mut panel, "poly");
    assert!(panel.copy_image(&mut sink).unwrap());
    assert_eq!(sink.copies, [(800, 400)]);
}

#[test]
fn theme_change_recolors_rows() {
    let mut panel = sized_panel();
    append(&mut panel, "v");
    let light = Theme::builtin(ThemeVariant::Light);
    panel.handle(Trigger::ThemeChanged(light.clone())).unwrap();

    let row = &panel.rows()[0];
    assert_eq!(row.color, light.color(row.color_id.unwrap()).unwrap());
    assert_eq!(panel.theme(), &light);
}

#[test]
fn splitter_drag_resizes_display() {
    let mut panel = sized_panel();
    append(&mut panel, "poly");
    panel
        .handle(Trigger::SplitterDragged {
            width: 300,
            height: 200,
        })
        .unwrap();
    assert_eq!(panel.display(), Size::new(300.0, 200.0));
    assert_eq!(panel.image().width(), 300);
    assert_eq!(panel.image().height(), 200);
}

#[test]
fn clearing_the_list_without_display_shows_placeholder() {
    let mut panel = sized_panel();
    append(&mut panel, "poly");
    assert!(panel.affordances().copy_enabled);

    let update = panel
        .handle(Trigger::Resize {
            width: 0,
            height: 0,
        })
        .unwrap();
    assert_eq!(update.render, Some(RenderOutcome::Deferred));

    let update = panel.handle(Trigger::DeleteRows(vec![0])).unwrap();
    assert_eq!(update.removed, 1);
    assert_eq!(update.render, Some(RenderOutcome::Placeholder));
    assert!(panel.is_placeholder_shown());
    assert_eq!(panel.image().width(), 100);
    assert!(!panel.affordances().copy_enabled);
}

#[test]
fn repeated_deep_zooms_keep_drawing() {
    let mut panel = sized_panel();
    append(&mut panel, "poly");
    let display = panel.display();

    for _ in 0..10 {
        let update = panel
            .handle(Trigger::Zoom {
                selection: Rect::new(0.0, 0.0, 1.0, 1.0),
                display,
            })
            .unwrap();
        assert!(update.render.is_some());
    }

    assert!(panel.view().is_zoomed());
    assert!(panel.view().crop().width < 1e-20);
    assert_eq!(panel.image().width(), 800);
    panel.check_invariants().unwrap();
}
