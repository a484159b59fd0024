use serde_json::{Value, json};

use super::*;

fn sample_frame() -> Frame {
    Frame::request(
        "action:append",
        json!({
            "id": "k3j2h1g1694000000",
            "tool": "brush",
            "brushType": "pencil",
            "color": "#112233",
            "width": 3.0,
            "points": [{"x": 1.0, "y": 2.0}, {"x": 3.0, "y": 4.0}],
        }),
    )
    .with_session_id("abc1234")
    .with_from("author")
}

#[test]
fn encode_decode_round_trip() {
    let original = sample_frame();
    let bytes = encode_frame(&original);
    let restored = decode_frame(&bytes).expect("decode");

    assert_eq!(restored.id, original.id);
    assert_eq!(restored.session_id, original.session_id);
    assert_eq!(restored.from, original.from);
    assert_eq!(restored.event, original.event);
    assert_eq!(restored.status, original.status);
    assert_eq!(restored.data, original.data);
}

#[test]
fn reply_round_trip_keeps_parent() {
    let req = sample_frame();
    let done = req.done_with(json!({"ok": true}));
    let restored = decode_frame(&encode_frame(&done)).expect("decode");

    assert_eq!(restored.parent_id, Some(req.id));
    assert_eq!(restored.status, Status::Done);
    assert_eq!(restored.data.get("ok").and_then(Value::as_bool), Some(true));
}

#[test]
fn nested_payload_survives() {
    let frame = Frame::request(
        "action:append",
        json!({
            "shape": {
                "kind": "rectangle",
                "start": {"x": 10.0, "y": 10.0},
                "end": {"x": 50.0, "y": 30.0},
                "text": null,
            }
        }),
    );
    let restored = decode_frame(&encode_frame(&frame)).expect("decode");
    assert_eq!(
        restored.data["shape"]["end"]["x"].as_f64(),
        Some(50.0)
    );
    assert!(restored.data["shape"]["text"].is_null());
}

#[test]
fn garbage_bytes_fail_to_decode() {
    // A long run of 0xFF is not a valid length-delimited message.
    let garbage = vec![0xFF; 64];
    assert!(matches!(decode_frame(&garbage), Err(CodecError::Decode(_))));
}

#[test]
fn missing_data_decodes_to_empty_object() {
    let mut frame = sample_frame();
    frame.data = Value::Null;
    let bytes = encode_frame(&frame);
    let restored = decode_frame(&bytes).expect("decode");
    // Null maps to a proto NullValue which round-trips to Null.
    assert!(restored.data.is_null());
}
