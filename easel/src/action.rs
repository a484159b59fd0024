//! The drawing-action model: the immutable unit of the shared log, plus the
//! ephemeral cursor and chat records that travel over the same transport.
//!
//! Field names serialize in camelCase to match the session-room wire shapes.
//! A well-formed action carries exactly one of a point path (freehand stroke),
//! a shape, or neither (canvas fill); producers are responsible for that —
//! replay handles all three defensively either way.

#[cfg(test)]
#[path = "action_test.rs"]
mod tests;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// A point in canvas-pixel coordinates. Immutable value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint between this point and another.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Drawing mode in effect when an action was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Brush,
    Eraser,
}

/// Rendering style selector for replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushType {
    Pencil,
    Highlighter,
    /// Full-canvas background color change. Only the last fill in a log is
    /// rendered; earlier fills are superseded.
    Fill,
    /// The action carries a [`Shape`] instead of a point path.
    Shape,
}

/// Kind of a shape insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Arrow,
    Text,
}

/// A shape or text insertion, defined by its drag gesture endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    pub start: Point,
    pub end: Point,
    /// Present iff `kind == Text`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// The atomic, immutable unit of the shared drawing log.
///
/// Created once by the authoring client (which assigns `id` and `timestamp`),
/// appended locally, broadcast, and appended unmodified by every peer.
/// Log order, not `timestamp`, is authoritative for replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingAction {
    /// Globally-unique id assigned by the authoring client.
    pub id: String,
    pub tool: Tool,
    /// Ordered freehand path; empty for shape and fill actions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Shape>,
    pub brush_type: BrushType,
    /// Stroke or fill color as a hex string, e.g. `"#1f1a17"`.
    pub color: String,
    /// Stroke width before brush-type scaling.
    pub width: f64,
    /// Creation time in milliseconds since Unix epoch. Informative only.
    pub timestamp: i64,
}

impl DrawingAction {
    /// A freehand stroke action.
    #[must_use]
    pub fn stroke(
        tool: Tool,
        brush_type: BrushType,
        points: Vec<Point>,
        color: impl Into<String>,
        width: f64,
    ) -> Self {
        Self {
            id: wire::ids::action_id(),
            tool,
            points,
            shape: None,
            brush_type,
            color: color.into(),
            width,
            timestamp: now_ms(),
        }
    }

    /// A shape or text insertion.
    #[must_use]
    pub fn shape(shape: Shape, color: impl Into<String>, width: f64) -> Self {
        Self {
            id: wire::ids::action_id(),
            tool: Tool::Brush,
            points: Vec::new(),
            shape: Some(shape),
            brush_type: BrushType::Shape,
            color: color.into(),
            width,
            timestamp: now_ms(),
        }
    }

    /// A full-canvas background fill.
    #[must_use]
    pub fn fill(color: impl Into<String>, width: f64) -> Self {
        Self {
            id: wire::ids::action_id(),
            tool: Tool::Brush,
            points: Vec::new(),
            shape: None,
            brush_type: BrushType::Fill,
            color: color.into(),
            width,
            timestamp: now_ms(),
        }
    }
}

/// One remote participant's cursor. Overwritten on every update, dropped when
/// the participant leaves. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorRecord {
    pub user_id: String,
    pub point: Point,
    /// Display color assigned by the receiving client on first sight.
    pub color: String,
    pub username: String,
}

/// A chat message in a session room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub content: String,
    pub timestamp: i64,
}

pub(crate) fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}
