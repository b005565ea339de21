//! End-to-end behaviour of a page driven through pointer events.

use inkpad_core::eraser::{object_erase_lasso, pixel_erase};
use inkpad_core::objects::StrokePoint;
use inkpad_core::{
    DrawableObject, EraserMode, FreehandStroke, Notebook, ObjectId, PageDocument, PageId, PipelineEvent, PointerEvent,
    ShapeGeometry, ShapeKind, ShapeObject, TextObject, TextStyle, ToolDefaults, ToolKind, recognize,
};
use kurbo::{Point, Rect};
use std::sync::Arc;

fn pen_stroke(id: &str, points: &[(f64, f64)]) -> DrawableObject {
    let points = points
        .iter()
        .map(|&(x, y)| StrokePoint::new(Point::new(x, y), ToolDefaults::default()))
        .collect();
    let stroke = FreehandStroke::from_points(ToolKind::Pen, "#000000", 6.0, points);
    let mut object: DrawableObject = stroke.into();
    object.set_id(ObjectId::from(id));
    object
}

fn rect(id: &str, x: f64, y: f64, w: f64, h: f64) -> DrawableObject {
    let shape = ShapeObject::new(ToolKind::Rectangle, ShapeKind::Rectangle, ShapeGeometry::Rect { x, y, w, h }, 2.0, "#000000");
    let mut object: DrawableObject = shape.into();
    object.set_id(ObjectId::from(id));
    object
}

fn ids(doc: &PageDocument) -> Vec<&str> {
    doc.objects().iter().map(|o| o.id().as_str()).collect()
}

fn notebook_with_page() -> (Notebook, PageId) {
    let mut notebook = Notebook::default();
    let page = PageId::from("page-1");
    notebook.insert_page(page.clone(), Rect::new(0.0, 0.0, 800.0, 1100.0));
    (notebook, page)
}

fn send(notebook: &mut Notebook, page: &PageId, events: &[PointerEvent]) {
    for event in events {
        notebook.handle_pointer(page, *event);
    }
}

fn down(x: f64, y: f64, t: u64) -> PointerEvent {
    PointerEvent::Down { position: Point::new(x, y), time_ms: t }
}

fn mv(x: f64, y: f64, t: u64) -> PointerEvent {
    PointerEvent::Move { position: Point::new(x, y), time_ms: t }
}

fn up(x: f64, y: f64, t: u64) -> PointerEvent {
    PointerEvent::Up { position: Point::new(x, y), time_ms: t }
}

#[test]
fn erasing_an_empty_region_changes_nothing() {
    let mut doc = PageDocument::new();
    doc.store.replace_all(vec![pen_stroke("a", &[(0.0, 0.0), (50.0, 0.0)])]);
    let before = doc.store.snapshot();

    pixel_erase(&mut doc.store, &mut doc.redo, &[Point::new(400.0, 400.0)], 6.0, 1);
    object_erase_lasso(
        &mut doc.store,
        &mut doc.redo,
        &[Point::new(300.0, 300.0), Point::new(350.0, 300.0), Point::new(350.0, 350.0)],
    );

    assert!(Arc::ptr_eq(&before, &doc.store.snapshot()));
    assert!(doc.redo.is_empty());
}

#[test]
fn pixel_erase_discards_single_point_remnants() {
    let mut doc = PageDocument::new();
    doc.store.replace_all(vec![pen_stroke("s", &[(0.0, 0.0), (0.0, 100.0)])]);

    let report = pixel_erase(&mut doc.store, &mut doc.redo, &[Point::new(0.0, 50.0)], 6.0, 99);

    assert_eq!(report.removed, vec![ObjectId::from("s")]);
    assert!(doc.objects().is_empty());
    assert_eq!(doc.redo.len(), 1);
}

#[test]
fn pixel_erase_then_restore_returns_original() {
    let mut doc = PageDocument::new();
    let line: Vec<(f64, f64)> = (0..=10).map(|i| (i as f64 * 10.0, 0.0)).collect();
    doc.store.replace_all(vec![pen_stroke("s", &line), pen_stroke("t", &[(0.0, 300.0), (10.0, 300.0)])]);

    pixel_erase(&mut doc.store, &mut doc.redo, &[Point::new(50.0, 0.0)], 6.0, 7);
    assert_eq!(ids(&doc), ["s_part0_7", "s_part1_7", "t"]);

    doc.restore_last_erased();
    assert_eq!(ids(&doc), ["s", "t"]);
}

#[test]
fn recognizer_classifies_near_square_box() {
    let points = [
        Point::new(10.0, 20.0),
        Point::new(50.0, 20.0),
        Point::new(50.0, 62.0),
        Point::new(10.0, 62.0),
    ];
    let first = recognize(&points).unwrap();
    assert_eq!(first.kind, ShapeKind::Square);
    assert_eq!(first.shape, ShapeGeometry::Rect { x: 10.0, y: 20.0, w: 42.0, h: 42.0 });
    assert_eq!(recognize(&points), Some(first));
}

#[test]
fn lasso_removes_enclosed_objects_in_store_order() {
    let mut doc = PageDocument::new();
    doc.store.replace_all(vec![
        rect("a", 0.0, 0.0, 20.0, 20.0),
        rect("outside", 200.0, 200.0, 20.0, 20.0),
        rect("b", 40.0, 40.0, 20.0, 20.0),
    ]);
    let lasso = [Point::new(-10.0, -10.0), Point::new(100.0, -10.0), Point::new(100.0, 100.0), Point::new(-10.0, 100.0)];

    object_erase_lasso(&mut doc.store, &mut doc.redo, &lasso);

    assert_eq!(ids(&doc), ["outside"]);
    let erased: Vec<&str> = doc.redo.entries().iter().map(|e| e.object.id().as_str()).collect();
    assert_eq!(erased, ["a", "b"]);
}

#[test]
fn z_order_survives_unrelated_mutations() {
    let mut doc = PageDocument::new();
    doc.store.replace_all(vec![
        pen_stroke("a", &[(0.0, 0.0), (10.0, 0.0)]),
        pen_stroke("b", &[(0.0, 100.0), (10.0, 100.0)]),
        pen_stroke("c", &[(0.0, 200.0), (10.0, 200.0)]),
    ]);
    doc.delete_object(&ObjectId::from("b"));
    doc.store.append(pen_stroke("d", &[(0.0, 300.0), (10.0, 300.0)]));
    doc.store.update_by_id(&ObjectId::from("a"), |o| o.set_fill("#ff0000"));
    assert_eq!(ids(&doc), ["a", "c", "d"]);
}

#[test]
fn drawing_clears_redo_and_erasing_appends() {
    let (mut notebook, page) = notebook_with_page();
    send(&mut notebook, &page, &[down(10.0, 10.0, 0), mv(60.0, 10.0, 5), mv(110.0, 10.0, 10), up(110.0, 10.0, 15)]);

    notebook.tools.set_tool(ToolKind::Eraser);
    notebook.tools.eraser_mode = EraserMode::Stroke;
    send(&mut notebook, &page, &[down(60.0, 10.0, 1000), up(60.0, 10.0, 1010)]);
    notebook.on_frame(1400);
    assert_eq!(notebook.page(&page).unwrap().document.redo.len(), 1);

    notebook.tools.set_tool(ToolKind::Pen);
    send(&mut notebook, &page, &[down(10.0, 500.0, 2000), mv(60.0, 500.0, 2005), up(60.0, 500.0, 2010)]);
    let doc = &notebook.page(&page).unwrap().document;
    assert!(doc.redo.is_empty());
    assert_eq!(doc.objects().len(), 1);
}

#[test]
fn tap_selects_text_and_second_tap_opens_editor() {
    let (mut notebook, page) = notebook_with_page();
    let style = TextStyle { bold: true, italic: true, ..TextStyle::default() };
    let text = TextObject::new(ToolKind::Text, Point::new(100.0, 200.0), "shopping list".into(), style);
    let center = text.layout_rect().center();
    let id = {
        let doc = &mut notebook.page_mut(&page).unwrap().document;
        let object: DrawableObject = text.into();
        let id = object.id().clone();
        doc.store.append(object);
        id
    };

    send(&mut notebook, &page, &[down(center.x, center.y, 0), up(center.x, center.y, 10)]);
    notebook.on_frame(400);
    {
        let p = notebook.page_mut(&page).unwrap();
        assert_eq!(p.pipeline().overlay().selected(), Some(&id));
        assert!(!p.pipeline().overlay().is_editing());
        let events = p.drain_events();
        assert_eq!(events, vec![PipelineEvent::SelectionChanged { selected: Some(id.clone()) }]);
    }

    send(&mut notebook, &page, &[down(center.x, center.y, 600), up(center.x, center.y, 610)]);
    notebook.on_frame(1000);
    let p = notebook.page_mut(&page).unwrap();
    let events = p.drain_events();
    let Some(PipelineEvent::EditorOpened { target, draft }) = events.last() else {
        panic!("editor did not open: {events:?}");
    };
    assert_eq!(target, &id);
    assert_eq!(draft.text, "shopping list");
    assert!(draft.bold && draft.italic && !draft.underline);
}

#[test]
fn sticky_note_is_placed_by_drag_and_committed() {
    let (mut notebook, page) = notebook_with_page();
    notebook.tools.set_tool(ToolKind::Sticky);

    // Drag places the pending note, release opens its editor
    send(&mut notebook, &page, &[down(100.0, 300.0, 0), mv(150.0, 320.0, 10), up(150.0, 320.0, 20)]);
    {
        let p = notebook.page_mut(&page).unwrap();
        let pending = p.pipeline().pending_text().unwrap();
        assert!((pending.x - 150.0).abs() < f64::EPSILON);
        assert!((pending.y - 320.0).abs() < f64::EPSILON);
        assert!(p.document.objects().is_empty());
        p.edit_text(100, |d| d.text = "call mom".into());
        assert!(p.submit_editor());
        assert_eq!(p.document.objects().len(), 1);
    }

    let p = notebook.page_mut(&page).unwrap();
    let stored = p.document.objects()[0].as_text().unwrap();
    assert_eq!(stored.text, "call mom");
    assert!(stored.style.background_color.is_some());
    assert!(p.drain_events().iter().any(|e| matches!(e, PipelineEvent::Committed { .. })));
}
