use std::fmt;
use std::str::FromStr;

use rand::Rng;

/// offset window for the second and third vertex of a fresh triangle,
/// biasing the search toward small initial shapes
const TRIANGLE_SPREAD: i32 = 15;
/// side length of a freshly placed square
const SQUARE_START_SIZE: i32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    Triangle,
    Square,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 2] = [ShapeKind::Triangle, ShapeKind::Square];

    /// fixed vertex count per kind
    pub fn vertex_count(&self) -> usize {
        match self {
            ShapeKind::Triangle => 3,
            ShapeKind::Square => 4,
        }
    }

    /// smallest canvas dimension this kind can be placed on
    pub fn min_canvas_side(&self) -> u32 {
        match self {
            ShapeKind::Triangle => 1,
            ShapeKind::Square => (SQUARE_START_SIZE + 2) as u32,
        }
    }
}

impl FromStr for ShapeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "triangle" => Ok(ShapeKind::Triangle),
            "square" => Ok(ShapeKind::Square),
            other => Err(format!("unknown shape kind '{other}' (expected triangle or square)")),
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeKind::Triangle => write!(f, "triangle"),
            ShapeKind::Square => write!(f, "square"),
        }
    }
}

/// a polygon under optimization: integer (row, col) vertices in clockwise
/// order, clamped to the canvas, with one level of mutation undo.
///
/// squares keep a rectangular invariant: every mutation is either a pure
/// translation or a centroid-relative uniform scale, never a per-vertex edit.
#[derive(Clone, Debug)]
pub struct Shape {
    kind: ShapeKind,
    points: Vec<(i32, i32)>,
    prev_points: Option<Vec<(i32, i32)>>,
    /// (height, width) of the canvas, for clamping
    image_bounds: (u32, u32),
}

impl Shape {
    /// place a fresh randomized shape of the given kind
    pub fn random<R: Rng>(kind: ShapeKind, image_bounds: (u32, u32), rng: &mut R) -> Self {
        let (h, w) = (image_bounds.0 as i32, image_bounds.1 as i32);
        debug_assert!(h >= kind.min_canvas_side() as i32 && w >= kind.min_canvas_side() as i32);

        let points = match kind {
            ShapeKind::Triangle => {
                // one uniform seed vertex, two more close by
                let seed = (rng.random_range(0..h), rng.random_range(0..w));
                let mut points = vec![seed];
                for _ in 0..2 {
                    let r = (seed.0 + rng.random_range(-TRIANGLE_SPREAD..=TRIANGLE_SPREAD))
                        .clamp(0, h - 1);
                    let c = (seed.1 + rng.random_range(-TRIANGLE_SPREAD..=TRIANGLE_SPREAD))
                        .clamp(0, w - 1);
                    points.push((r, c));
                }
                points
            }
            ShapeKind::Square => {
                // uniform upper-left corner such that the starting square fits
                let size = SQUARE_START_SIZE;
                let r0 = rng.random_range(0..=h - (size + 1));
                let c0 = rng.random_range(0..=w - (size + 1));
                vec![
                    (r0, c0),
                    (r0, c0 + size),
                    (r0 + size, c0 + size),
                    (r0 + size, c0),
                ]
            }
        };

        Self {
            kind,
            points,
            prev_points: None,
            image_bounds,
        }
    }

    /// test-only constructor for handcrafted vertex sets
    #[cfg(test)]
    pub(crate) fn from_points(
        kind: ShapeKind,
        points: Vec<(i32, i32)>,
        image_bounds: (u32, u32),
    ) -> Self {
        Self { kind, points, prev_points: None, image_bounds }
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    #[inline]
    pub fn points(&self) -> &[(i32, i32)] {
        &self.points
    }

    /// perturb the shape; magnitude scales with `heat`. saves the prior
    /// vertex set so the mutation can be undone once.
    pub fn mutate<R: Rng>(&mut self, heat: i32, rng: &mut R) {
        debug_assert!(heat >= 1);
        self.prev_points = Some(self.points.clone());

        match self.kind {
            ShapeKind::Triangle => self.mutate_vertex(heat, rng),
            ShapeKind::Square => {
                if rng.random::<f64>() < 0.5 {
                    self.scale_about_centroid(heat, rng);
                } else {
                    self.translate(heat, rng);
                }
            }
        }
    }

    /// restore the vertex set from just before the last `mutate`
    pub fn undo_mutate(&mut self) {
        if let Some(prev) = self.prev_points.take() {
            self.points = prev;
        }
    }

    /// jitter one uniformly chosen vertex, clamped to the canvas
    fn mutate_vertex<R: Rng>(&mut self, heat: i32, rng: &mut R) {
        let (h, w) = (self.image_bounds.0 as i32, self.image_bounds.1 as i32);
        let half = heat / 2;

        let i = rng.random_range(0..self.points.len());
        let (r, c) = self.points[i];
        self.points[i] = (
            (r + rng.random_range(-half..=half)).clamp(0, h - 1),
            (c + rng.random_range(-half..=half)).clamp(0, w - 1),
        );
    }

    /// uniform scale about the centroid; the deviation from 1.0 is drawn
    /// proportional to heat/100, growing or shrinking with equal probability.
    /// redraws the factor until every corner lands inside the canvas (a
    /// factor of exactly 1.0 is always drawable, so this terminates).
    fn scale_about_centroid<R: Rng>(&mut self, heat: i32, rng: &mut R) {
        let (h, w) = (self.image_bounds.0 as i32, self.image_bounds.1 as i32);

        let n = self.points.len() as f64;
        let cr = self.points.iter().map(|p| p.0 as f64).sum::<f64>() / n;
        let cc = self.points.iter().map(|p| p.1 as f64).sum::<f64>() / n;

        loop {
            let deviation = (rng.random_range(0..=heat) as f64 / 100.0) / 2.0;
            let scale = if rng.random::<f64>() < 0.5 {
                1.0 + deviation * 2.0
            } else {
                1.0 - deviation
            };

            let scaled: Vec<(i32, i32)> = self
                .points
                .iter()
                .map(|&(r, c)| {
                    (
                        ((r as f64 - cr) * scale + cr).round() as i32,
                        ((c as f64 - cc) * scale + cc).round() as i32,
                    )
                })
                .collect();

            let bounded = scaled
                .iter()
                .all(|&(r, c)| r >= 0 && r < h && c >= 0 && c < w);
            if bounded {
                self.points = scaled;
                return;
            }
        }
    }

    /// translate the whole vertex set; the offsets (not the points) are
    /// clamped so the bounding box stays inside the canvas
    fn translate<R: Rng>(&mut self, heat: i32, rng: &mut R) {
        let (h, w) = (self.image_bounds.0 as i32, self.image_bounds.1 as i32);
        let half = heat / 2;

        let mut dr = rng.random_range(-half..=half);
        let mut dc = rng.random_range(-half..=half);

        let min_r = self.points.iter().map(|p| p.0).min().unwrap_or(0);
        let max_r = self.points.iter().map(|p| p.0).max().unwrap_or(0);
        let min_c = self.points.iter().map(|p| p.1).min().unwrap_or(0);
        let max_c = self.points.iter().map(|p| p.1).max().unwrap_or(0);

        dr = dr.max(-min_r).min(h - 1 - max_r);
        dc = dc.max(-min_c).min(w - 1 - max_c);

        for p in &mut self.points {
            p.0 += dr;
            p.1 += dc;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const BOUNDS: (u32, u32) = (100, 80);

    fn in_bounds(shape: &Shape) -> bool {
        shape
            .points()
            .iter()
            .all(|&(r, c)| r >= 0 && r < 100 && c >= 0 && c < 80)
    }

    /// all four corners derivable from one corner plus per-axis side lengths
    fn is_axis_aligned_rect(pts: &[(i32, i32)]) -> bool {
        pts.len() == 4
            && pts[0].0 == pts[1].0
            && pts[2].0 == pts[3].0
            && pts[0].1 == pts[3].1
            && pts[1].1 == pts[2].1
            && pts[2].0 > pts[0].0
            && pts[1].1 > pts[0].1
    }

    #[test]
    fn random_triangle_is_small_and_bounded() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..200 {
            let shape = Shape::random(ShapeKind::Triangle, BOUNDS, &mut rng);
            assert_eq!(shape.points().len(), 3);
            assert!(in_bounds(&shape));

            let seed = shape.points()[0];
            for &(r, c) in &shape.points()[1..] {
                // clamping can only pull vertices closer to the seed
                assert!((r - seed.0).abs() <= TRIANGLE_SPREAD);
                assert!((c - seed.1).abs() <= TRIANGLE_SPREAD);
            }
        }
    }

    #[test]
    fn random_square_starts_axis_aligned() {
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..200 {
            let shape = Shape::random(ShapeKind::Square, BOUNDS, &mut rng);
            assert!(in_bounds(&shape));
            assert!(is_axis_aligned_rect(shape.points()));
        }
    }

    #[test]
    fn undo_restores_exact_points_for_every_kind() {
        let mut rng = Pcg32::seed_from_u64(3);
        for kind in ShapeKind::ALL {
            let mut shape = Shape::random(kind, BOUNDS, &mut rng);
            for heat in [10, 40, 100] {
                let before = shape.points().to_vec();
                shape.mutate(heat, &mut rng);
                shape.undo_mutate();
                assert_eq!(shape.points(), before, "kind {kind} heat {heat}");
            }
        }
    }

    #[test]
    fn square_mutations_preserve_rect_invariant() {
        let mut rng = Pcg32::seed_from_u64(99);
        let mut shape = Shape::random(ShapeKind::Square, BOUNDS, &mut rng);
        for _ in 0..500 {
            shape.mutate(100, &mut rng);
            assert!(in_bounds(&shape));
            let p = shape.points();
            // rows pair up and cols pair up under both scale and translate
            assert_eq!(p[0].0, p[1].0);
            assert_eq!(p[2].0, p[3].0);
            assert_eq!(p[0].1, p[3].1);
            assert_eq!(p[1].1, p[2].1);
        }
    }

    #[test]
    fn triangle_mutation_moves_one_vertex_at_most() {
        let mut rng = Pcg32::seed_from_u64(21);
        let mut shape = Shape::random(ShapeKind::Triangle, BOUNDS, &mut rng);
        for _ in 0..100 {
            let before = shape.points().to_vec();
            shape.mutate(30, &mut rng);
            let moved = shape
                .points()
                .iter()
                .zip(&before)
                .filter(|(a, b)| a != b)
                .count();
            assert!(moved <= 1);
            assert!(in_bounds(&shape));
        }
    }
}
