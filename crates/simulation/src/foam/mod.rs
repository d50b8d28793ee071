//! Foam dispersion and contour extraction.
//!
//! Breaking waves deposit `FoamRow`s. Each tick the pipeline:
//!   1. Rasterizes live rows into an intensity grid with `max` (never `+=`)
//!   2. Spreads older foam further (box blur passes grow with age by default)
//!   3. Folds the result into a slow-decaying halo floor
//!   4. Runs marching squares per threshold: the outer ring over
//!      `max(core, halo)`, inner rings over the core alone
//!   5. Normalizes segments to `[0, 1]` for the renderer
//!
//! The halo floor keeps the outer ring from shrinking while its cells still
//! carry foam; only the inner rings contract as the core fades.

pub mod blur;
pub mod halo;
pub mod intensity;
pub mod marching_squares;
pub mod pipeline;
pub mod rows;
pub mod strategy;

pub use blur::box_blur;
pub use halo::HaloFloor;
pub use intensity::{build_intensity_grid, IntensityGrid};
pub use marching_squares::{
    chain_segments, extract_line_segments, marching_squares, Bounds, ContourLevel, LineSegment,
    Polyline,
};
pub use pipeline::{ContourSet, FoamPipeline};
pub use rows::{reap_foam_rows, spans_from_samples, FoamRow, FoamSegment};
pub use strategy::{
    BlurDispersion, DispersionStrategy, ExpandBoundsDispersion, FoamDispersion, RadiusDispersion,
};
