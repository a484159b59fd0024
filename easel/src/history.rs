//! Local history store: the per-client ordered action log plus redo stack.
//!
//! Pure state-transition logic with no side effects. Undo, redo, and clear
//! operate on the local log only — they are never broadcast, so peers can
//! observe divergent canvases after one participant undoes or clears. That is
//! a documented property of the design, not an accident.

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;

use crate::action::DrawingAction;

/// Ordered action log and redo stack. Initial state is empty/empty; there is
/// no terminal state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryState {
    actions: Vec<DrawingAction>,
    redo_stack: Vec<DrawingAction>,
}

impl HistoryState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fully-formed action (id and timestamp pre-assigned by the
    /// producer). Any append — local or remote — clears the redo stack.
    /// Always succeeds.
    pub fn append(&mut self, action: DrawingAction) {
        self.actions.push(action);
        self.redo_stack.clear();
    }

    /// Move the last action onto the redo stack. No-op on an empty log.
    /// Returns whether a transition happened.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.actions.pop() else {
            return false;
        };
        self.redo_stack.push(action);
        true
    }

    /// Move the last undone action back onto the log. No-op on an empty redo
    /// stack. Returns whether a transition happened.
    pub fn redo(&mut self) -> bool {
        let Some(action) = self.redo_stack.pop() else {
            return false;
        };
        self.actions.push(action);
        true
    }

    /// Empty both the log and the redo stack unconditionally.
    pub fn clear(&mut self) {
        self.actions.clear();
        self.redo_stack.clear();
    }

    /// The ordered log, oldest first.
    #[must_use]
    pub fn actions(&self) -> &[DrawingAction] {
        &self.actions
    }

    /// The redo stack, oldest undo first.
    #[must_use]
    pub fn redo_stack(&self) -> &[DrawingAction] {
        &self.redo_stack
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.actions.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}
