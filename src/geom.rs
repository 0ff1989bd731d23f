// integer-grid geometry for polygon rasterization and the degeneracy guard

use crate::canvas::Bounds;

/// axis-aligned bounding box of a vertex ring, exclusive upper bounds.
/// vertices are assumed in-canvas (the shape module clamps them).
pub fn bounding_box(points: &[(i32, i32)]) -> Bounds {
    debug_assert!(!points.is_empty());

    let mut min_row = i32::MAX;
    let mut max_row = i32::MIN;
    let mut min_col = i32::MAX;
    let mut max_col = i32::MIN;
    for &(r, c) in points {
        min_row = min_row.min(r);
        max_row = max_row.max(r);
        min_col = min_col.min(c);
        max_col = max_col.max(c);
    }

    Bounds {
        min_row: min_row as u32,
        max_row: (max_row + 1) as u32,
        min_col: min_col as u32,
        max_col: (max_col + 1) as u32,
    }
}

/// even-odd containment test of a grid point against the vertex ring
pub fn point_in_polygon(points: &[(i32, i32)], row: i32, col: i32) -> bool {
    let (py, px) = (row as f64, col as f64);
    let mut inside = false;

    let n = points.len();
    let mut j = n - 1;
    for i in 0..n {
        let (yi, xi) = (points[i].0 as f64, points[i].1 as f64);
        let (yj, xj) = (points[j].0 as f64, points[j].1 as f64);

        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// smallest interior angle over all cyclic vertex triples, in degrees.
/// the angle at the middle vertex is the absolute atan2 difference of the
/// two edge vectors meeting there, reflected over 180 into [0, 180].
pub fn min_interior_angle_deg(points: &[(i32, i32)]) -> f64 {
    let n = points.len();
    let mut min_angle = 180.0f64;

    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];

        let to_a = ((a.0 - b.0) as f64, (a.1 - b.1) as f64);
        let to_c = ((c.0 - b.0) as f64, (c.1 - b.1) as f64);

        let mut angle =
            (to_a.0.atan2(to_a.1) - to_c.0.atan2(to_c.1)).abs().to_degrees();
        if angle > 180.0 {
            angle = 360.0 - angle;
        }

        min_angle = min_angle.min(angle);
    }

    min_angle
}
