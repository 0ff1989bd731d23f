use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use image::imageops::FilterType;
use image::RgbaImage;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use shapefit::svgout;
use shapefit::{fit_shapes, Canvas, Composition, FitConfig, ProgressSink, ShapeKind};

/// working resolution: the input is downscaled until its longer side is at
/// most this, and snapshots are scaled back up on output
const MAX_WORKING_SIDE: u32 = 315;

#[derive(Parser)]
#[command(name = "shapefit")]
#[command(about = "Approximate an image as a stack of translucent polygons", version)]
struct Args {
    /// target image (PNG, JPEG, ...)
    input: PathBuf,

    /// shape counts at which to emit an SVG snapshot; the largest is the
    /// total number of shapes fitted
    #[arg(required = true)]
    counts: Vec<usize>,

    /// polygon kind: triangle or square
    #[arg(short, long, default_value = "triangle")]
    shape: ShapeKind,

    /// output path prefix; snapshots land at <prefix>_<count>.svg
    #[arg(short, long, default_value = "out")]
    output: PathBuf,

    /// fill opacity of every committed shape
    #[arg(long, default_value_t = 0.5)]
    alpha: f64,

    /// mutation attempts per local search
    #[arg(long, default_value_t = 100)]
    cycles: usize,

    /// initial mutation magnitude
    #[arg(long, default_value_t = 100)]
    start_heat: i32,

    /// heat divisor applied on every accepted improvement
    #[arg(long, default_value_t = 1.1)]
    cooling_ratio: f64,

    /// independent attempts per shape while below the quality threshold
    #[arg(long, default_value_t = 10)]
    best_of: usize,

    /// shape counts below this get the wider multi-start search
    #[arg(long, default_value_t = 100)]
    quality_threshold: usize,

    /// all-invalid searches tolerated per shape before giving up
    #[arg(long, default_value_t = 25)]
    max_retries: usize,

    /// RNG seed; omit for a time-derived one
    #[arg(long)]
    seed: Option<u64>,

    /// cap on the rayon thread pool; defaults to all cores
    #[arg(short, long)]
    threads: Option<usize>,
}

/// drives the progress bar and writes each snapshot out as SVG
struct SvgSink {
    prefix: PathBuf,
    inv_scale: f64,
    bar: ProgressBar,
}

impl ProgressSink for SvgSink {
    fn shape_committed(&mut self, _shape_number: usize, similarity: f64) {
        self.bar.set_message(format!("{:.2}%", similarity * 100.0));
        self.bar.inc(1);
    }

    fn snapshot(&mut self, composition: &Composition) -> std::io::Result<()> {
        let path = self.prefix.with_file_name(format!(
            "{}_{:05}.svg",
            self.prefix.file_name().unwrap_or_default().to_string_lossy(),
            composition.shapes.len()
        ));
        svgout::write_svg(composition, self.inv_scale, &path)?;
        self.bar.println(format!("wrote {}", path.display()));
        Ok(())
    }
}

/// flatten any alpha onto a white background, the way a browser renders the
/// image over a blank page
fn flatten_onto_white(rgba: &RgbaImage) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.pixels().len() * 3);
    for px in rgba.pixels() {
        let a = px[3] as u32;
        for ch in 0..3 {
            rgb.push(((px[ch] as u32 * a + 255 * (255 - a)) / 255) as u8);
        }
    }
    rgb
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configuring the thread pool")?;
    }

    let img = image::open(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?;
    let (orig_w, orig_h) = (img.width(), img.height());
    let long_side = orig_w.max(orig_h);
    if long_side == 0 {
        bail!("{} is empty", args.input.display());
    }

    // fit at a reduced working resolution; SVG output is scaled back up
    let working = if long_side > MAX_WORKING_SIDE {
        img.resize(MAX_WORKING_SIDE, MAX_WORKING_SIDE, FilterType::Triangle)
    } else {
        img
    };
    let inv_scale = long_side as f64 / working.width().max(working.height()) as f64;

    let rgba = working.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut canvas = Canvas::new(flatten_onto_white(&rgba), h, w);
    info!(
        "fitting {} at {w}x{h} (original {orig_w}x{orig_h})",
        args.input.display()
    );

    let cfg = FitConfig {
        shape_kind: args.shape,
        snapshot_counts: args.counts,
        cycles_per_attempt: args.cycles,
        start_heat: args.start_heat,
        heat_cooling_ratio: args.cooling_ratio,
        alpha: args.alpha,
        quality_best_of: args.best_of,
        quality_threshold: args.quality_threshold,
        max_retries: args.max_retries,
        ..FitConfig::default()
    };

    let seed = args.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0xDEADBEEF)
    });
    info!("seed {seed}");
    let mut rng = Pcg32::seed_from_u64(seed);

    let bar = ProgressBar::new(cfg.max_shape_count() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );
    let mut sink = SvgSink {
        prefix: args.output,
        inv_scale,
        bar,
    };

    fit_shapes(&mut canvas, &cfg, &mut rng, &mut sink)?;
    sink.bar.finish();

    Ok(())
}
