//! Integration tests for model/surface reconciliation (editor-canvas).
//!
//! Covers idempotence of outbound passes, staleness of late loads, failed
//! loads and the inbound manipulation path.

use std::sync::Arc;

use editor_canvas::image::create_solid_color;
use editor_canvas::{
    CanvasSynchronizer, Editor, EditorConfig, ImageLoader, LoadEffect, MemoryImageLoader,
    PlaceholderReason, SurfaceBody,
};
use editor_core::{
    Design, ElementKind, ElementPatch, Manipulation, Product, ReorderDirection, SurfaceEvent,
};

fn product() -> Product {
    Product {
        id: "card".to_string(),
        name: "Cartão de visita".to_string(),
        description: "Frente".to_string(),
        canvas_width: 400,
        canvas_height: 240,
        background_url: "card.png".to_string(),
        fallback_url: None,
    }
}

fn loader() -> Arc<MemoryImageLoader> {
    Arc::new(
        MemoryImageLoader::new()
            .with_image("card.png", create_solid_color(800, 480, [240, 240, 240, 255]))
            .with_image("logo.png", create_solid_color(64, 32, [200, 0, 0, 255]))
            .with_image("photo.png", create_solid_color(32, 32, [0, 0, 200, 255])),
    )
}

async fn ready_editor(loader: Arc<MemoryImageLoader>) -> Editor {
    let mut editor = Editor::with_products(vec![product()], loader, EditorConfig::default());
    editor.request_product("card").expect("known product");
    editor.settle().await;
    editor
}

// ==========================================================================
// Outbound
// ==========================================================================

#[tokio::test]
async fn test_reconcile_twice_has_no_churn() {
    let loader = loader();
    let mut sync = CanvasSynchronizer::new(Arc::clone(&loader) as Arc<dyn ImageLoader>);
    sync.attach(&product());

    let mut design = Design::for_product("card");
    let ctx = product().context();
    design.add(ElementKind::Text, ctx);
    let logo = design.add(ElementKind::Logo, ctx).id;
    design
        .update(logo, &ElementPatch::content("logo.png"))
        .expect("update");
    design.add(ElementKind::Image, ctx);

    let first = sync.reconcile(&design);
    assert_eq!((first.created, first.queued), (2, 1));
    sync.settle(&design).await;

    let surface = sync.surface().expect("surface");
    let tags: Vec<_> = surface.tags().collect();
    let stats = surface.stats();
    let requests = loader.requests();

    let second = sync.reconcile(&design);
    assert!(!second.has_churn(), "unexpected churn: {second:?}");
    let third = sync.reconcile(&design);
    assert_eq!(second, third);

    let surface = sync.surface().expect("surface");
    assert_eq!(surface.tags().collect::<Vec<_>>(), tags);
    assert_eq!(surface.stats(), stats);
    assert_eq!(loader.requests(), requests);
}

#[tokio::test]
async fn test_surface_mirrors_model_order_and_selection() {
    let mut editor = ready_editor(loader()).await;
    let seeded = editor.design().elements()[0].id;
    let phone = editor.add(ElementKind::PhoneContact).id;
    let social = editor.add(ElementKind::SocialHandle).id;

    let surface = editor.surface().expect("surface");
    assert_eq!(surface.tags().collect::<Vec<_>>(), vec![seeded, phone, social]);
    assert_eq!(surface.active(), Some(social));

    editor.reorder(social, ReorderDirection::Down);
    let surface = editor.surface().expect("surface");
    assert_eq!(surface.tags().collect::<Vec<_>>(), vec![seeded, social, phone]);

    editor.select(None);
    assert_eq!(editor.surface().and_then(|s| s.active()), None);
}

#[tokio::test]
async fn test_geometry_change_patches_in_place() {
    let mut editor = ready_editor(loader()).await;
    let logo = editor.add(ElementKind::Logo).id;
    editor.update(logo, &ElementPatch::content("logo.png"));
    editor.settle().await;
    let created = editor.surface().expect("surface").stats().objects_created;

    let mut patch = ElementPatch::geometry(10.0, 20.0, 128.0, 64.0, 45.0);
    patch.inverted = Some(true);
    assert!(editor.update(logo, &patch));

    let surface = editor.surface().expect("surface");
    assert_eq!(surface.stats().objects_created, created);
    let object = surface.object(logo).expect("logo object");
    assert!((object.left - 10.0).abs() < f32::EPSILON);
    assert!((object.scaled_width() - 128.0).abs() < 1e-3);
    assert!((object.angle - 45.0).abs() < f32::EPSILON);
    match &object.body {
        SurfaceBody::Raster(raster) => assert!(raster.is_inverted()),
        other => panic!("expected raster, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_raster_shows_placeholder() {
    let mut editor = ready_editor(loader()).await;
    let image = editor.add(ElementKind::Image).id;

    let object = editor
        .surface()
        .and_then(|s| s.object(image))
        .expect("placeholder is built synchronously");
    match &object.body {
        SurfaceBody::Placeholder(p) => assert_eq!(p.reason, PlaceholderReason::Empty),
        other => panic!("expected placeholder, got {other:?}"),
    }
}

// ==========================================================================
// Async loads
// ==========================================================================

#[tokio::test]
async fn test_removed_element_load_is_dropped() {
    let mut editor = ready_editor(loader()).await;
    let logo = editor.add(ElementKind::Logo).id;
    editor.update(logo, &ElementPatch::content("logo.png"));
    assert_eq!(editor.synchronizer().in_flight(), 1);

    editor.remove(logo);
    let effects = editor.settle().await;

    assert_eq!(effects, vec![LoadEffect::Stale]);
    assert!(editor.surface().and_then(|s| s.object(logo)).is_none());
}

#[tokio::test]
async fn test_superseded_source_load_is_dropped() {
    let mut editor = ready_editor(loader()).await;
    let logo = editor.add(ElementKind::Logo).id;
    editor.update(logo, &ElementPatch::content("logo.png"));
    editor.update(logo, &ElementPatch::content("photo.png"));

    let effects = editor.settle().await;
    assert!(effects.contains(&LoadEffect::Stale));
    assert!(effects.contains(&LoadEffect::Applied(logo)));

    let object = editor.surface().and_then(|s| s.object(logo)).expect("logo");
    match &object.body {
        SurfaceBody::Raster(raster) => {
            assert_eq!(raster.src, "photo.png");
            assert_eq!(raster.dimensions(), (32, 32));
        }
        other => panic!("expected raster, got {other:?}"),
    }
}

#[tokio::test]
async fn test_duplicate_loads_not_issued_while_in_flight() {
    let loader = loader();
    let mut editor = ready_editor(Arc::clone(&loader)).await;
    let before = loader.requests();

    let logo = editor.add(ElementKind::Logo).id;
    editor.update(logo, &ElementPatch::content("logo.png"));
    editor.update(logo, &ElementPatch::geometry(5.0, 5.0, 100.0, 100.0, 0.0));
    editor.update(logo, &ElementPatch::geometry(6.0, 6.0, 100.0, 100.0, 0.0));
    editor.settle().await;

    assert_eq!(loader.requests() - before, 1);
}

#[tokio::test]
async fn test_failed_load_is_local_placeholder() {
    let mut editor = ready_editor(loader()).await;
    let broken = editor.add(ElementKind::Image).id;
    editor.update(broken, &ElementPatch::content("https://cdn.invalid/missing.png"));
    let logo = editor.add(ElementKind::Logo).id;
    editor.update(logo, &ElementPatch::content("logo.png"));

    let effects = editor.settle().await;
    assert!(effects.contains(&LoadEffect::Placeholder(broken)));
    assert!(effects.contains(&LoadEffect::Applied(logo)));

    let surface = editor.surface().expect("surface");
    match &surface.object(broken).expect("marker").body {
        SurfaceBody::Placeholder(p) => {
            assert!(matches!(p.reason, PlaceholderReason::LoadFailed(_)));
        }
        other => panic!("expected placeholder, got {other:?}"),
    }
    assert!(surface.rasterize().is_ok());
}

// ==========================================================================
// Inbound
// ==========================================================================

#[tokio::test]
async fn test_manipulation_commits_once_with_rounded_geometry() {
    let mut editor = ready_editor(loader()).await;
    let id = editor.design().elements()[0].id;
    let snapshots = editor.history().len();

    let surface = editor.surface_mut().expect("surface");
    assert!(surface.begin_manipulation(id, Manipulation::Move));
    for step in 0..10u8 {
        surface.drag_to(f32::from(step) * 3.3, 40.6);
    }
    let event = surface.end_manipulation().expect("event on release");
    assert_eq!(editor.history().len(), snapshots, "no commit mid-gesture");

    assert!(editor.handle_surface_event(&event));
    assert_eq!(editor.history().len(), snapshots + 1);

    let element = editor.design().get(id).expect("element");
    assert!((element.x - 30.0).abs() < f32::EPSILON);
    assert!((element.y - 41.0).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_gesture_without_movement_keeps_history() {
    let mut editor = ready_editor(loader()).await;
    let before = editor.design().elements().to_vec();
    let id = before[0].id;
    let snapshots = editor.history().len();

    let surface = editor.surface_mut().expect("surface");
    assert!(surface.begin_manipulation(id, Manipulation::Move));
    let event = surface.end_manipulation().expect("event on release");

    assert!(!editor.handle_surface_event(&event));
    assert_eq!(editor.history().len(), snapshots);
    assert_eq!(editor.design().elements(), before.as_slice());
}

#[tokio::test]
async fn test_rotate_gesture_normalizes_angle() {
    let mut editor = ready_editor(loader()).await;
    let id = editor.design().elements()[0].id;

    let surface = editor.surface_mut().expect("surface");
    surface.begin_manipulation(id, Manipulation::Rotate);
    surface.rotate_to(-89.6);
    let event = surface.end_manipulation().expect("event");
    editor.handle_surface_event(&event);

    let element = editor.design().get(id).expect("element");
    assert!((element.angle - 270.0).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_selection_events_update_model() {
    let mut editor = ready_editor(loader()).await;
    let id = editor.design().elements()[0].id;
    editor.select(None);

    let event = editor
        .surface_mut()
        .and_then(|s| s.click_object(id))
        .expect("tagged object");
    editor.handle_surface_event(&event);
    assert_eq!(editor.design().selected(), Some(id));

    let event = editor.surface_mut().expect("surface").click_background();
    editor.handle_surface_event(&event);
    assert_eq!(editor.design().selected(), None);
    assert!(matches!(event, SurfaceEvent::SelectionChanged { tag: None }));
}
