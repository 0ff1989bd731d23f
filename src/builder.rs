// the outer fitting loop: grow the composition one committed shape at a
// time, widening the search for the early shapes where placement quality
// matters most, and emit snapshots at the requested counts

use log::{debug, info};
use rand_pcg::Pcg32;

use crate::canvas::Canvas;
use crate::config::FitConfig;
use crate::error::FitError;
use crate::search::{best_shape_parallel, best_shape_sequential};
use crate::shape::Shape;

/// one committed shape: final vertices plus the fill assigned at commit time
#[derive(Clone, Debug)]
pub struct CommittedShape {
    /// (row, col) vertices in canvas coordinates
    pub points: Vec<(i32, i32)>,
    pub rgb: [u8; 3],
    pub alpha: f64,
}

/// the ordered, append-only stack of committed shapes. shapes are never
/// reordered or removed, so any earlier snapshot is a prefix of any later
/// one.
#[derive(Clone, Debug)]
pub struct Composition {
    pub height: u32,
    pub width: u32,
    pub background: [u8; 3],
    pub shapes: Vec<CommittedShape>,
}

impl Composition {
    fn new(canvas: &Canvas) -> Self {
        let (height, width) = canvas.dimensions();
        Self {
            height,
            width,
            background: canvas.background(),
            shapes: Vec::new(),
        }
    }
}

/// where the builder reports progress and hands off snapshots.
/// `snapshot` is called once per requested shape count, in increasing
/// order, with the composition as it stands at that count.
pub trait ProgressSink {
    /// low-volume progress signal, one call per committed shape
    fn shape_committed(&mut self, _shape_number: usize, _similarity: f64) {}

    fn snapshot(&mut self, composition: &Composition) -> std::io::Result<()>;
}

/// collect snapshots in memory; handy default and test double
#[derive(Default)]
pub struct SnapshotCollector {
    pub snapshots: Vec<Composition>,
}

impl ProgressSink for SnapshotCollector {
    fn snapshot(&mut self, composition: &Composition) -> std::io::Result<()> {
        self.snapshots.push(composition.clone());
        Ok(())
    }
}

/// fit shapes until the largest requested snapshot count is reached.
///
/// each step runs a multi-start search (wide and parallel below the quality
/// cutoff, single-start above it), retries a bounded number of times if every
/// attempt came back invalid, then commits the winner: patch into the
/// canonical canvas, shape + color into the composition.
pub fn fit_shapes(
    canvas: &mut Canvas,
    cfg: &FitConfig,
    rng: &mut Pcg32,
    sink: &mut dyn ProgressSink,
) -> Result<Composition, FitError> {
    cfg.validate()?;

    let (h, w) = canvas.dimensions();
    let min_side = cfg.shape_kind.min_canvas_side();
    if h < min_side || w < min_side {
        return Err(FitError::InvalidConfig(format!(
            "canvas {h}x{w} is too small for shape kind '{}' (needs {min_side})",
            cfg.shape_kind
        )));
    }

    let mut composition = Composition::new(canvas);
    let quality_limit = cfg.quality_limit();

    for shape_number in 1..=cfg.max_shape_count() {
        // wide search only while a below-threshold snapshot is still ahead;
        // past that point shape choice matters less than throughput
        let best_of = match quality_limit {
            Some(limit) if shape_number <= limit => cfg.quality_best_of,
            _ => 1,
        };

        let (shape, change) = fit_one(canvas, cfg, best_of, rng, shape_number)?;

        canvas.apply_patch(&change.patch, &change.bounds);
        composition.shapes.push(CommittedShape {
            points: shape.points().to_vec(),
            rgb: change.color,
            alpha: cfg.alpha,
        });

        info!(
            "shape {shape_number}/{}: similarity {:.2}%",
            cfg.max_shape_count(),
            change.score * 100.0
        );
        sink.shape_committed(shape_number, change.score);

        if cfg.snapshot_counts.contains(&shape_number) {
            sink.snapshot(&composition).map_err(|source| FitError::Snapshot {
                shape_count: shape_number,
                source,
            })?;
        }
    }

    Ok(composition)
}

/// run the search for one step, retrying on all-invalid results up to the
/// configured bound
fn fit_one(
    canvas: &mut Canvas,
    cfg: &FitConfig,
    best_of: usize,
    rng: &mut Pcg32,
    shape_number: usize,
) -> Result<(Shape, crate::score::Change), FitError> {
    for attempt in 1..=cfg.max_retries {
        let result = if best_of > 1 {
            best_shape_parallel(canvas, cfg, best_of, rng)?
        } else {
            best_shape_sequential(canvas, cfg, best_of, rng)
        };

        match result {
            Some(found) => return Ok(found),
            None => debug!(
                "shape {shape_number}: invalid fit (attempt {attempt}/{}), retrying",
                cfg.max_retries
            ),
        }
    }

    Err(FitError::ExhaustedRetries {
        shape_number,
        attempts: cfg.max_retries,
    })
}
