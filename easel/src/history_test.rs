use super::*;
use crate::action::{BrushType, DrawingAction, Point, Tool};

fn stroke(tag: &str) -> DrawingAction {
    let mut action = DrawingAction::stroke(
        Tool::Brush,
        BrushType::Pencil,
        vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
        "#000000",
        3.0,
    );
    action.id = tag.into();
    action
}

#[test]
fn starts_empty() {
    let state = HistoryState::new();
    assert!(state.actions().is_empty());
    assert!(state.redo_stack().is_empty());
    assert!(!state.can_undo());
    assert!(!state.can_redo());
}

#[test]
fn append_preserves_order() {
    let mut state = HistoryState::new();
    state.append(stroke("a"));
    state.append(stroke("b"));
    let ids: Vec<&str> = state.actions().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
}

#[test]
fn undo_moves_tail_to_redo_stack() {
    let mut state = HistoryState::new();
    state.append(stroke("a"));
    state.append(stroke("b"));

    assert!(state.undo());
    assert_eq!(state.actions().len(), 1);
    assert_eq!(state.redo_stack().len(), 1);
    assert_eq!(state.redo_stack()[0].id, "b");
}

#[test]
fn undo_on_empty_is_noop() {
    let mut state = HistoryState::new();
    assert!(!state.undo());
    assert_eq!(state, HistoryState::new());
}

#[test]
fn redo_on_empty_is_noop() {
    let mut state = HistoryState::new();
    state.append(stroke("a"));
    assert!(!state.redo());
    assert_eq!(state.actions().len(), 1);
}

#[test]
fn redo_undo_are_inverse() {
    let mut state = HistoryState::new();
    state.append(stroke("a"));
    state.append(stroke("b"));

    let before = state.clone();
    assert!(state.undo());
    assert!(state.redo());
    assert_eq!(state, before);

    // And the other direction, starting from a non-empty redo stack.
    state.undo();
    let before = state.clone();
    assert!(state.redo());
    assert!(state.undo());
    assert_eq!(state, before);
}

#[test]
fn append_clears_redo_stack() {
    let mut state = HistoryState::new();
    state.append(stroke("a"));
    state.append(stroke("b"));
    state.undo();
    assert!(state.can_redo());

    state.append(stroke("c"));
    assert!(state.redo_stack().is_empty());
    let ids: Vec<&str> = state.actions().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["a", "c"]);
}

#[test]
fn clear_empties_both_stacks() {
    let mut state = HistoryState::new();
    state.append(stroke("a"));
    state.append(stroke("b"));
    state.undo();

    state.clear();
    assert!(state.actions().is_empty());
    assert!(state.redo_stack().is_empty());
}

#[test]
fn identical_appends_yield_identical_logs() {
    // Content equality across independent stores, not reference identity.
    let (a, b) = (stroke("a"), stroke("b"));

    let mut left = HistoryState::new();
    left.append(a.clone());
    left.append(b.clone());

    let mut right = HistoryState::new();
    right.append(a);
    right.append(b);

    assert_eq!(left.actions(), right.actions());
}
