pub use kurbo::{Point, Rect, Size, Vec2};

/// Build a rectangle from an origin and size in pixel space.
///
/// Frames, trims, and orig rectangles are all conventionally given as
/// `(x, y, width, height)`; this adapts that convention to [`Rect`]'s
/// corner representation.
pub fn rect_xywh(x: f64, y: f64, width: f64, height: f64) -> Rect {
    Rect::from_origin_size((x, y), (width, height))
}
