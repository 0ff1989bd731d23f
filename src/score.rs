// candidate scoring: rasterize a polygon, solve for the optimal fill color
// analytically, and measure whole-image similarity with the shape previewed

use crate::canvas::{Bounds, Canvas};
use crate::fitness::{sad_rgb, similarity};
use crate::geom::{bounding_box, min_interior_angle_deg, point_in_polygon};
use crate::shape::Shape;

/// interior angles below this mark a shape as a degenerate sliver.
/// thin shapes score deceptively well at high shape counts but render badly.
pub const MIN_INTERIOR_ANGLE_DEG: f64 = 4.0;

/// the result of scoring one polygon placement. `patch` written into the
/// canvas at `bounds` applies the shape; nothing here is persisted until
/// the composition builder commits it.
#[derive(Clone, Debug)]
pub struct Change {
    /// whole-image similarity in [0, 1] with the shape applied
    pub score: f64,
    /// analytically optimal fill color
    pub color: [u8; 3],
    pub patch: Vec<u8>,
    pub bounds: Bounds,
}

/// score one polygon placement against the canvas.
///
/// returns `None` for unscoreable shapes (sliver angles, zero pixel
/// coverage); callers must never commit a `None`. the canvas is mutated
/// only temporarily: its contents are byte-identical before and after.
pub fn score_shape(canvas: &mut Canvas, shape: &Shape, alpha: f64) -> Option<Change> {
    let points = shape.points();
    let bounds = bounding_box(points);

    if min_interior_angle_deg(points) < MIN_INTERIOR_ANGLE_DEG {
        return None;
    }

    // rasterize: membership of every integer grid point in the box
    let rows = bounds.rows() as usize;
    let cols = bounds.cols() as usize;
    let mut inside = vec![false; rows * cols];
    let mut inside_count: u64 = 0;
    for r in 0..rows {
        for c in 0..cols {
            let hit = point_in_polygon(
                points,
                (bounds.min_row + r as u32) as i32,
                (bounds.min_col + c as u32) as i32,
            );
            inside[r * cols + c] = hit;
            inside_count += hit as u64;
        }
    }
    if inside_count == 0 {
        return None;
    }

    let (_, width) = canvas.dimensions();

    // per-channel sums over covered pixels, separately for target and current
    let mut target_sum = [0u64; 3];
    let mut current_sum = [0u64; 3];
    for r in 0..rows {
        for c in 0..cols {
            if !inside[r * cols + c] {
                continue;
            }
            let idx = (((bounds.min_row + r as u32) * width + bounds.min_col + c as u32) * 3)
                as usize;
            for ch in 0..3 {
                target_sum[ch] += canvas.target()[idx + ch] as u64;
                current_sum[ch] += canvas.current()[idx + ch] as u64;
            }
        }
    }

    // closed-form inverse of result = alpha*color + (1-alpha)*base, per
    // channel, independently clipped
    let mut color = [0u8; 3];
    for ch in 0..3 {
        let target_avg = (target_sum[ch] / inside_count) as f64;
        let current_avg = (current_sum[ch] / inside_count) as f64;
        color[ch] = ((target_avg - (1.0 - alpha) * current_avg) / alpha).clamp(0.0, 255.0) as u8;
    }

    // build the patch: blend inside the shape, untouched outside
    let mut patch = canvas.read_region(&bounds);
    for r in 0..rows {
        for c in 0..cols {
            if !inside[r * cols + c] {
                continue;
            }
            let idx = (r * cols + c) * 3;
            for ch in 0..3 {
                let base = patch[idx + ch] as f64;
                patch[idx + ch] = (alpha * color[ch] as f64 + (1.0 - alpha) * base) as u8;
            }
        }
    }

    // preview, score the whole image, restore
    let saved = canvas.read_region(&bounds);
    canvas.apply_patch(&patch, &bounds);
    let sad = sad_rgb(canvas.target(), canvas.current());
    canvas.apply_patch(&saved, &bounds);

    Some(Change {
        score: similarity(sad, canvas.pixel_count()),
        color,
        patch,
        bounds,
    })
}
