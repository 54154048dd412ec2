use serde::{Deserialize, Serialize};

use crate::foundation::core::Rect;
use crate::view::rotate;

/// Normalized sampling coordinates for one oriented sub-image quad.
///
/// Corners are ordered so that a renderer placing `(x0, y0)` at a sprite's
/// top-left reproduces the sub-image in the orientation the packer declared.
/// `u_limit`/`v_limit` are the far-edge bounds of the frame in normalized
/// space, used to clamp sampling of a trimmed sub-region so it cannot bleed
/// into atlas neighbors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UvQuad {
    /// First corner U.
    pub x0: f32,
    /// First corner V.
    pub y0: f32,
    /// Second corner U.
    pub x1: f32,
    /// Second corner V.
    pub y1: f32,
    /// Third corner U.
    pub x2: f32,
    /// Third corner V.
    pub y2: f32,
    /// Fourth corner U.
    pub x3: f32,
    /// Fourth corner V.
    pub y3: f32,
    /// Far-edge clamp on the U axis.
    pub u_limit: f32,
    /// Far-edge clamp on the V axis.
    pub v_limit: f32,
}

impl UvQuad {
    /// Derive the quad for `frame` inside a `base_width` x `base_height`
    /// resource whose sub-image is stored under the axis-aligned rotation
    /// `tag`.
    ///
    /// Pure: no state beyond the returned value. `tag` must be even; odd
    /// (diamond) members are rejected before reaching the calculator.
    pub fn compute(frame: Rect, base_width: u32, base_height: u32, tag: u8) -> UvQuad {
        debug_assert!(
            rotate::axis_aligned(tag),
            "diamond tags never reach the uv calculator"
        );
        // Degenerate bases yield a degenerate quad, not NaN.
        let tw = f64::from(base_width.max(1));
        let th = f64::from(base_height.max(1));

        let mut quad = if tag == rotate::UPRIGHT {
            UvQuad {
                x0: (frame.x0 / tw) as f32,
                y0: (frame.y0 / th) as f32,
                x1: (frame.x1 / tw) as f32,
                y1: (frame.y0 / th) as f32,
                x2: (frame.x1 / tw) as f32,
                y2: (frame.y1 / th) as f32,
                x3: (frame.x0 / tw) as f32,
                y3: (frame.y1 / th) as f32,
                u_limit: 0.0,
                v_limit: 0.0,
            }
        } else {
            // Walk the frame's corners: seed at the rotated top-left, then
            // advance a quarter turn per corner.
            let w2 = frame.width() / 2.0 / tw;
            let h2 = frame.height() / 2.0 / th;
            let cx = frame.x0 / tw + w2;
            let cy = frame.y0 / th + h2;

            let mut sel = rotate::compose(tag, rotate::NORTH_WEST);
            let (x0, y0) = corner(cx, cy, w2, h2, sel);
            sel = rotate::compose(sel, rotate::QUARTER);
            let (x1, y1) = corner(cx, cy, w2, h2, sel);
            sel = rotate::compose(sel, rotate::QUARTER);
            let (x2, y2) = corner(cx, cy, w2, h2, sel);
            sel = rotate::compose(sel, rotate::QUARTER);
            let (x3, y3) = corner(cx, cy, w2, h2, sel);

            UvQuad {
                x0,
                y0,
                x1,
                y1,
                x2,
                y2,
                x3,
                y3,
                u_limit: 0.0,
                v_limit: 0.0,
            }
        };

        quad.u_limit = quad.x0.max(quad.x1).max(quad.x2).max(quad.x3);
        quad.v_limit = quad.y0.max(quad.y1).max(quad.y2).max(quad.y3);
        quad
    }
}

fn corner(cx: f64, cy: f64, w2: f64, h2: f64, sel: u8) -> (f32, f32) {
    (
        (cx + w2 * rotate::u_x(sel)) as f32,
        (cy + h2 * rotate::u_y(sel)) as f32,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/view/uvs.rs"]
mod tests;
