use image::Rgba;
use serde_json::Value;

use super::*;
use crate::action::{Shape, ShapeKind, Tool};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn engine() -> Engine {
    let prefs = ClientPreferences { username: "tester".into(), ..ClientPreferences::default() };
    Engine::new(32, 32, prefs)
}

fn stroke() -> DrawingAction {
    DrawingAction::stroke(
        Tool::Brush,
        BrushType::Pencil,
        vec![Point::new(4.0, 16.0), Point::new(28.0, 16.0)],
        "#000000",
        4.0,
    )
}

/// Deliver a broadcast frame the way a peer's transport would: decode the
/// action payload and apply it.
fn relay_action(frame: &Frame, to: &mut Engine) {
    assert_eq!(frame.event, "action:append");
    let action: DrawingAction = serde_json::from_value(frame.data.clone()).unwrap();
    to.apply_remote(Remote::Action(action));
}

// =============================================================
// Session membership
// =============================================================

#[test]
fn create_session_mints_id_and_returns_join_frame() {
    let mut e = engine();
    let frame = e.create_session();

    let session_id = e.session_id().unwrap().to_owned();
    assert_eq!(session_id.len(), wire::ids::SESSION_ID_LEN);
    assert_eq!(frame.event, "session:join");
    assert_eq!(frame.session_id.as_deref(), Some(session_id.as_str()));
    assert_eq!(frame.from.as_deref(), Some(e.user_id()));
    assert_eq!(frame.data["username"], "tester");
}

#[test]
fn join_session_trims_and_rejects_blank_ids() {
    let mut e = engine();
    assert!(matches!(e.join_session("   "), Err(EngineError::EmptySessionId)));
    assert!(e.session_id().is_none());

    let frame = e.join_session("  abc1234  ").unwrap();
    assert_eq!(e.session_id(), Some("abc1234"));
    assert_eq!(frame.session_id.as_deref(), Some("abc1234"));
}

// =============================================================
// Local gestures and outbound frames
// =============================================================

#[test]
fn draw_before_join_applies_locally_but_sends_nothing() {
    let mut e = engine();
    assert!(e.draw(stroke()).is_none());
    assert_eq!(e.actions().len(), 1);
    assert_ne!(*e.canvas().get_pixel(16, 16), WHITE);
}

#[test]
fn draw_after_join_broadcasts_the_action() {
    let mut e = engine();
    e.join_session("room123").unwrap();
    let frame = e.draw(stroke()).unwrap();

    assert_eq!(frame.event, "action:append");
    assert_eq!(frame.session_id.as_deref(), Some("room123"));
    assert_eq!(frame.from.as_deref(), Some(e.user_id()));
    let echoed: DrawingAction = serde_json::from_value(frame.data).unwrap();
    assert_eq!(&echoed, &e.actions()[0]);
}

#[test]
fn undo_and_redo_rerender_the_canvas() {
    let mut e = engine();
    e.draw(stroke());
    let drawn = e.canvas().clone();

    assert!(e.undo());
    assert!(e.canvas().pixels().all(|p| *p == WHITE));
    assert!(!e.undo());

    assert!(e.redo());
    assert_eq!(*e.canvas(), drawn);
    assert!(!e.redo());
}

#[test]
fn clear_wipes_history_and_canvas_locally() {
    let mut e = engine();
    e.join_session("room123").unwrap();
    e.draw(stroke());
    e.draw(stroke());
    e.undo();

    e.clear();
    assert!(e.actions().is_empty());
    assert!(!e.history().can_redo());
    assert!(e.canvas().pixels().all(|p| *p == WHITE));
}

#[test]
fn fill_canvas_rerenders_beneath_existing_strokes() {
    let mut e = engine();
    e.draw(stroke());
    e.fill_canvas("#0000ff");

    // Background turned blue, the stroke replayed on top.
    assert_eq!(*e.canvas().get_pixel(2, 2), Rgba([0, 0, 255, 255]));
    assert_eq!(*e.canvas().get_pixel(16, 16), Rgba([0, 0, 0, 255]));
}

#[test]
fn move_cursor_emits_ephemeral_frame_only() {
    let mut e = engine();
    assert!(e.move_cursor(Point::new(3.0, 4.0)).is_none());

    e.join_session("room123").unwrap();
    let frame = e.move_cursor(Point::new(3.0, 4.0)).unwrap();
    assert_eq!(frame.event, "cursor:update");
    assert_eq!(frame.data["userId"], Value::from(e.user_id()));
    assert_eq!(frame.data["x"], 3.0);
    assert_eq!(frame.data["y"], 4.0);
    assert_eq!(frame.data["username"], "tester");
    assert!(e.cursors().is_empty());
}

#[test]
fn own_chat_waits_for_the_echo() {
    let mut e = engine();
    e.join_session("room123").unwrap();
    let frame = e.chat("hello").unwrap();
    assert_eq!(frame.event, "chat:message");
    assert!(e.chat_log().is_empty());

    let message: ChatMessage = serde_json::from_value(frame.data).unwrap();
    e.apply_remote(Remote::Chat(message));
    assert_eq!(e.chat_log().len(), 1);
    assert_eq!(e.chat_log()[0].content, "hello");
    assert_eq!(e.chat_log()[0].user_id, e.user_id());
}

// =============================================================
// Remote messages
// =============================================================

#[test]
fn two_peers_converge_on_the_same_canvas() {
    let mut alice = engine();
    let mut bob = engine();
    let session = alice.create_session();
    bob.join_session(session.session_id.as_deref().unwrap()).unwrap();

    let f1 = alice.draw(stroke()).unwrap();
    relay_action(&f1, &mut bob);

    let shape = DrawingAction::shape(
        Shape {
            kind: ShapeKind::Rectangle,
            start: Point::new(4.0, 4.0),
            end: Point::new(20.0, 12.0),
            text: None,
        },
        "#ff0000",
        2.0,
    );
    let f2 = bob.draw(shape).unwrap();
    relay_action(&f2, &mut alice);

    assert_eq!(alice.actions(), bob.actions());
    assert_eq!(alice.canvas(), bob.canvas());
}

#[test]
fn remote_fill_rerenders_beneath_local_strokes() {
    let mut e = engine();
    e.draw(stroke());
    e.apply_remote(Remote::Action(DrawingAction::fill("#00ff00", 3.0)));

    assert_eq!(*e.canvas().get_pixel(2, 2), Rgba([0, 255, 0, 255]));
    assert_eq!(*e.canvas().get_pixel(16, 16), Rgba([0, 0, 0, 255]));
}

#[test]
fn cursor_upsert_assigns_stable_color_and_updates_position() {
    let mut e = engine();
    e.apply_remote(Remote::Cursor {
        user_id: "peer1".into(),
        point: Point::new(1.0, 2.0),
        username: "Ada".into(),
    });
    let color = e.cursors()["peer1"].color.clone();
    assert!(color.starts_with("hsl("));

    e.apply_remote(Remote::Cursor {
        user_id: "peer1".into(),
        point: Point::new(9.0, 9.0),
        username: "Ada".into(),
    });
    let record = &e.cursors()["peer1"];
    assert_eq!(record.point, Point::new(9.0, 9.0));
    assert_eq!(record.color, color);
    assert_eq!(e.cursors().len(), 1);
}

#[test]
fn cursor_without_username_gets_a_placeholder() {
    let mut e = engine();
    e.apply_remote(Remote::Cursor {
        user_id: "peer42xyz".into(),
        point: Point::new(0.0, 0.0),
        username: String::new(),
    });
    assert_eq!(e.cursors()["peer42xyz"].username, "User-peer");
}

#[test]
fn cursor_placeholder_handles_multibyte_ids() {
    let mut e = engine();
    e.apply_remote(Remote::Cursor {
        user_id: "日本語ペン".into(),
        point: Point::new(0.0, 0.0),
        username: String::new(),
    });
    assert_eq!(e.cursors()["日本語ペン"].username, "User-日本語ペ");

    e.apply_remote(Remote::Cursor {
        user_id: "日本".into(),
        point: Point::new(1.0, 1.0),
        username: String::new(),
    });
    assert_eq!(e.cursors()["日本"].username, "User-日本");
}

#[test]
fn peer_departure_removes_their_cursor() {
    let mut e = engine();
    e.apply_remote(Remote::Cursor {
        user_id: "peer1".into(),
        point: Point::new(1.0, 1.0),
        username: "Ada".into(),
    });
    e.apply_remote(Remote::PeerLeft { user_id: "peer1".into() });
    assert!(e.cursors().is_empty());

    // Departure of an unknown peer is a no-op.
    e.apply_remote(Remote::PeerLeft { user_id: "ghost".into() });
}

#[test]
fn remote_append_clears_the_redo_stack() {
    let mut e = engine();
    e.draw(stroke());
    e.undo();
    assert!(e.history().can_redo());

    e.apply_remote(Remote::Action(stroke()));
    // A peer's append lands in the log like any other.
    assert_eq!(e.actions().len(), 1);
    assert!(!e.history().can_redo());
}
