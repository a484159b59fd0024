#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;

// =============================================================
// Point
// =============================================================

#[test]
fn midpoint_and_distance() {
    let a = Point::new(0.0, 0.0);
    let b = Point::new(10.0, 0.0);
    assert_eq!(a.midpoint(b), Point::new(5.0, 0.0));
    assert_eq!(a.distance(b), 10.0);
    assert_eq!(Point::new(3.0, 0.0).distance(Point::new(0.0, 4.0)), 5.0);
}

// =============================================================
// Serde wire shapes
// =============================================================

#[test]
fn enums_serialize_lowercase() {
    assert_eq!(serde_json::to_string(&Tool::Eraser).unwrap(), "\"eraser\"");
    assert_eq!(serde_json::to_string(&BrushType::Highlighter).unwrap(), "\"highlighter\"");
    assert_eq!(serde_json::to_string(&ShapeKind::Rectangle).unwrap(), "\"rectangle\"");
}

#[test]
fn shape_kind_uses_type_key() {
    let shape = Shape {
        kind: ShapeKind::Circle,
        start: Point::new(0.0, 0.0),
        end: Point::new(10.0, 0.0),
        text: None,
    };
    let value = serde_json::to_value(&shape).unwrap();
    assert_eq!(value["type"], "circle");
    assert!(value.get("text").is_none());
}

#[test]
fn action_round_trip_camel_case() {
    let action = DrawingAction::stroke(
        Tool::Brush,
        BrushType::Pencil,
        vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)],
        "#112233",
        3.0,
    );
    let value = serde_json::to_value(&action).unwrap();
    assert_eq!(value["brushType"], "pencil");
    assert!(value.get("brush_type").is_none());
    assert!(value.get("shape").is_none());

    let restored: DrawingAction = serde_json::from_value(value).unwrap();
    assert_eq!(restored, action);
}

#[test]
fn fill_action_omits_empty_points() {
    let action = DrawingAction::fill("#ff0000", 3.0);
    let value = serde_json::to_value(&action).unwrap();
    assert!(value.get("points").is_none());
    assert_eq!(value["brushType"], "fill");
}

#[test]
fn deserializes_peer_payload_without_points_or_shape() {
    // The log tolerates minimal payloads; replay treats them as no-ops.
    let action: DrawingAction = serde_json::from_value(json!({
        "id": "abc123",
        "tool": "brush",
        "brushType": "fill",
        "color": "#00ff00",
        "width": 2.0,
        "timestamp": 1_700_000_000_000_i64,
    }))
    .unwrap();
    assert!(action.points.is_empty());
    assert!(action.shape.is_none());
}

// =============================================================
// Constructors
// =============================================================

#[test]
fn constructors_assign_id_and_timestamp() {
    let a = DrawingAction::fill("#fff", 1.0);
    let b = DrawingAction::fill("#fff", 1.0);
    assert!(!a.id.is_empty());
    assert_ne!(a.id, b.id);
    assert!(a.timestamp > 0);
}

#[test]
fn shape_constructor_sets_brush_type() {
    let shape = Shape {
        kind: ShapeKind::Text,
        start: Point::new(5.0, 5.0),
        end: Point::new(5.0, 5.0),
        text: Some("hi".into()),
    };
    let action = DrawingAction::shape(shape, "#000", 2.0);
    assert_eq!(action.brush_type, BrushType::Shape);
    assert!(action.points.is_empty());
    assert_eq!(action.shape.as_ref().unwrap().text.as_deref(), Some("hi"));
}
