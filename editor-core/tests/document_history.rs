//! Integration tests for the document, its history and persistence
//! (editor-core).

use editor_core::{
    Design, ElementKind, ElementPatch, History, HistoryConfig, HistoryState, ProductContext,
    ReorderDirection, SavedDesign,
};

fn ctx() -> ProductContext {
    ProductContext::new(1200, 800)
}

/// Apply `step` to `design` and record the result, like the session does.
fn commit(design: &mut Design, history: &mut History, step: impl FnOnce(&mut Design)) {
    step(design);
    history.record_design(design);
}

#[test]
fn test_snapshot_restore_reproduces_sequence() {
    let mut design = Design::for_product("banner");
    let mut history = History::new();
    history.record_design(&design);

    let a = design.add(ElementKind::Text, ctx()).id;
    history.record_design(&design);
    let b = design.add(ElementKind::Logo, ctx()).id;
    history.record_design(&design);
    commit(&mut design, &mut history, |d| {
        d.update(a, &ElementPatch::geometry(1.0, 2.0, 300.0, 40.0, 370.0))
            .expect("update");
    });
    commit(&mut design, &mut history, |d| {
        d.duplicate(b).expect("duplicate");
    });
    commit(&mut design, &mut history, |d| {
        d.reorder(a, ReorderDirection::Up).expect("reorder");
    });
    let snapshot = HistoryState::capture(&design);

    commit(&mut design, &mut history, |d| {
        d.remove(b).expect("remove");
    });
    let restored = history.undo().expect("undo").clone();

    assert_eq!(restored, snapshot);
    design.replace_elements(restored.elements);
    assert_eq!(design.elements(), snapshot.elements.as_slice());
    assert!((design.get(a).expect("a").angle - 10.0).abs() < f32::EPSILON);
}

#[test]
fn test_undo_redo_bounds() {
    let mut design = Design::new();
    let mut history = History::with_config(HistoryConfig { capacity: 3 });
    history.record_design(&design);
    assert!(!history.can_undo());
    assert!(!history.can_redo());
    assert!(history.undo().is_none());

    for _ in 0..4 {
        design.add(ElementKind::Email, ctx());
        history.record_design(&design);
    }
    assert_eq!(history.len(), 3);
    assert_eq!(history.cursor(), 2);

    assert_eq!(history.undo().map(|s| s.elements.len()), Some(3));
    assert_eq!(history.undo().map(|s| s.elements.len()), Some(2));
    assert!(history.undo().is_none(), "oldest entries were evicted");
    assert_eq!(history.redo().map(|s| s.elements.len()), Some(3));
    assert_eq!(history.redo().map(|s| s.elements.len()), Some(4));
    assert!(history.redo().is_none());
}

#[test]
fn test_saved_design_file_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("design.json");

    let mut design = Design::for_product("mug");
    design.meta.name = "Caneca Personalizada".to_string();
    let text = design.add(ElementKind::Text, ctx()).id;
    design
        .update(
            text,
            &ElementPatch {
                fill: Some("#ff0000".to_string()),
                inverted: Some(true),
                ..ElementPatch::default()
            },
        )
        .expect("update");
    design.add(ElementKind::Image, ctx());

    SavedDesign::from(&design).save(&path).expect("save");
    let loaded = SavedDesign::load(&path)
        .expect("load")
        .into_design()
        .expect("materialize");

    assert_eq!(loaded.elements(), design.elements());
    assert_eq!(loaded.product_id.as_deref(), Some("mug"));
    assert_eq!(loaded.meta, design.meta);
    assert_eq!(loaded.selected(), None);
}

#[test]
fn test_saved_design_json_is_camel_case() {
    let mut design = Design::for_product("mug");
    design.add(ElementKind::SocialHandle, ctx());
    let json = SavedDesign::from(&design).to_json().expect("json");

    for key in ["\"productId\"", "\"createdAt\"", "\"updatedAt\"", "\"socialHandle\""] {
        assert!(json.contains(key), "missing {key} in {json}");
    }
}

#[test]
fn test_non_finite_update_still_reloads() {
    let mut design = Design::for_product("mug");
    let id = design.add(ElementKind::Text, ctx()).id;
    design
        .update(
            id,
            &ElementPatch {
                x: Some(f32::INFINITY),
                font_size: Some(f32::INFINITY),
                ..ElementPatch::default()
            },
        )
        .expect("update");

    let json = SavedDesign::from(&design).to_json().expect("serialize");
    let back = SavedDesign::from_json(&json).expect("reloads");
    assert_eq!(back.elements, design.elements().to_vec());
    assert!(back.elements[0].x.is_finite());
}
