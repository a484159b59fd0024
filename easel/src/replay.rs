//! Deterministic replay: ordered action log → pixels.
//!
//! `render` is a pure, total function. It never fails on a well-formed log,
//! and entries missing the fields their kind requires are skipped rather
//! than fatal. Replay walks the log strictly in sequence order — the log
//! order is authoritative, never timestamps.

#[cfg(test)]
#[path = "replay_test.rs"]
mod tests;

use image::{Rgba, RgbaImage};

use crate::action::{BrushType, DrawingAction, Point, Shape, ShapeKind, Tool};
use crate::raster::{Cap, Surface};

/// Opaque white, the default canvas background.
pub const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Fill alpha for shape interiors (the `"#RRGGBB" + "33"` of the source
/// design, i.e. 20%).
const SHAPE_FILL_ALPHA: f64 = 0.2;

/// Highlighter stroke opacity.
const HIGHLIGHTER_ALPHA: f64 = 0.3;

/// Flattening steps per quadratic curve segment of a smoothed path.
const CURVE_STEPS: usize = 8;

/// Render an ordered log onto a fresh canvas of the given dimensions.
///
/// The background is opaque white unless the log contains fill actions, in
/// which case the last fill's color wins. Earlier fills are visually
/// superseded and are skipped entirely during the stroke pass — they are
/// never replayed as colored rectangles.
#[must_use]
pub fn render(actions: &[DrawingAction], width: u32, height: u32) -> RgbaImage {
    render_surface(actions, width, height).into_image()
}

/// Same as [`render`], keeping the [`Surface`] so callers can continue to
/// draw on it incrementally.
#[must_use]
pub fn render_surface(actions: &[DrawingAction], width: u32, height: u32) -> Surface {
    let mut surface = Surface::new(width, height, background(actions));
    for action in actions {
        if action.brush_type != BrushType::Fill {
            draw_action(&mut surface, action);
        }
    }
    surface
}

/// The effective background for a log: the last fill's color, else white.
#[must_use]
pub fn background(actions: &[DrawingAction]) -> Rgba<u8> {
    actions
        .iter()
        .rev()
        .find(|a| a.brush_type == BrushType::Fill)
        .map_or(BACKGROUND, |a| parse_hex_color(&a.color))
}

/// Rasterize a single non-fill action onto an existing surface. Malformed
/// actions (no shape and fewer than two points) draw nothing.
pub fn draw_action(surface: &mut Surface, action: &DrawingAction) {
    if let Some(shape) = &action.shape {
        draw_shape(surface, shape, action);
    } else if action.points.len() >= 2 {
        draw_stroke(surface, action);
    }
}

fn draw_stroke(surface: &mut Surface, action: &DrawingAction) {
    // Eraser strokes paint background white over whatever is beneath.
    let color = if action.tool == Tool::Eraser {
        BACKGROUND
    } else {
        parse_hex_color(&action.color)
    };

    let (width, alpha, cap) = match action.brush_type {
        BrushType::Highlighter => (action.width * 2.0, HIGHLIGHTER_ALPHA, Cap::Square),
        BrushType::Pencil => ((action.width * 0.7).max(1.0), 1.0, Cap::Butt),
        BrushType::Fill | BrushType::Shape => (action.width, 1.0, Cap::Round),
    };

    let path = smooth_path(&action.points);
    surface.stroke_path(&path, width, cap, color, alpha);
}

/// Flatten the quadratic-through-midpoints smoothing of a freehand path into
/// line segments: each control point `p[i]` curves toward the midpoint of
/// `p[i]` and `p[i+1]`, and the final curve lands exactly on the last point.
fn smooth_path(points: &[Point]) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let mut out = vec![points[0]];
    let mut cursor = points[0];
    for i in 1..points.len() - 2 {
        let target = points[i].midpoint(points[i + 1]);
        flatten_quadratic(&mut out, cursor, points[i], target);
        cursor = target;
    }
    let last = points.len() - 1;
    flatten_quadratic(&mut out, cursor, points[last - 1], points[last]);
    out
}

fn flatten_quadratic(out: &mut Vec<Point>, from: Point, control: Point, to: Point) {
    for step in 1..=CURVE_STEPS {
        #[allow(clippy::cast_precision_loss)]
        let t = step as f64 / CURVE_STEPS as f64;
        let u = 1.0 - t;
        let x = u * u * from.x + 2.0 * u * t * control.x + t * t * to.x;
        let y = u * u * from.y + 2.0 * u * t * control.y + t * t * to.y;
        out.push(Point::new(x, y));
    }
}

fn draw_shape(surface: &mut Surface, shape: &Shape, action: &DrawingAction) {
    let color = parse_hex_color(&action.color);
    let (start, end) = (shape.start, shape.end);

    match shape.kind {
        ShapeKind::Rectangle => {
            let x = start.x.min(end.x);
            let y = start.y.min(end.y);
            let w = (end.x - start.x).abs();
            let h = (end.y - start.y).abs();
            surface.fill_rect(x, y, w, h, color, SHAPE_FILL_ALPHA);
            surface.stroke_rect(x, y, w, h, action.width, color, 1.0);
        }
        ShapeKind::Circle => {
            let center = start.midpoint(end);
            let radius = start.distance(end) / 2.0;
            surface.fill_circle(center, radius, color, SHAPE_FILL_ALPHA);
            surface.stroke_circle(center, radius, action.width, color, 1.0);
        }
        ShapeKind::Arrow => {
            surface.line(start, end, action.width, Cap::Round, color, 1.0);
            draw_arrowhead(surface, start, end, action.width, color);
        }
        ShapeKind::Text => {
            if let Some(text) = &shape.text {
                surface.text(text, start, action.width * 8.0, color, 1.0);
            }
        }
    }
}

/// Filled triangular arrowhead at `end`, oriented along the line's angle.
/// Head length grows with the stroke width.
fn draw_arrowhead(surface: &mut Surface, start: Point, end: Point, width: f64, color: Rgba<u8>) {
    let angle = (end.y - start.y).atan2(end.x - start.x);
    let head_len = width.mul_add(2.0, 20.0);
    let half_w = width.mul_add(1.0, 10.0) / 2.0;

    let base_x = end.x - head_len * angle.cos();
    let base_y = end.y - head_len * angle.sin();
    let left = Point::new(
        half_w.mul_add(angle.sin(), base_x),
        half_w.mul_add(-angle.cos(), base_y),
    );
    let right = Point::new(
        half_w.mul_add(-angle.sin(), base_x),
        half_w.mul_add(angle.cos(), base_y),
    );

    surface.fill_polygon(&[end, left, right], color, 1.0);
}

/// Parse a `#RGB`, `#RRGGBB`, or `#RRGGBBAA` hex color. Unparseable input
/// falls back to opaque black — replay is total, never fatal.
#[must_use]
pub fn parse_hex_color(s: &str) -> Rgba<u8> {
    let hex = s.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return Rgba([0, 0, 0, 255]);
    }

    let parse2 = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let parse1 = |i: usize| {
        u8::from_str_radix(&hex[i..=i], 16)
            .ok()
            .map(|v| v << 4 | v)
    };

    let channels = match hex.len() {
        3 => [parse1(0), parse1(1), parse1(2), Some(255)],
        6 => [parse2(0), parse2(2), parse2(4), Some(255)],
        8 => [parse2(0), parse2(2), parse2(4), parse2(6)],
        _ => return Rgba([0, 0, 0, 255]),
    };

    match channels {
        [Some(r), Some(g), Some(b), Some(a)] => Rgba([r, g, b, a]),
        _ => Rgba([0, 0, 0, 255]),
    }
}
