// shapefit: approximate a raster image as an ordered stack of translucent
// polygons, fitted by randomized hill-climbing against the target

pub mod builder;
pub mod canvas;
pub mod config;
pub mod error;
pub mod fitness;
pub mod geom;
pub mod score;
pub mod search;
pub mod shape;
pub mod svgout;

pub use builder::{fit_shapes, Composition, CommittedShape, ProgressSink, SnapshotCollector};
pub use canvas::{Bounds, Canvas};
pub use config::FitConfig;
pub use error::FitError;
pub use score::Change;
pub use shape::{Shape, ShapeKind};
