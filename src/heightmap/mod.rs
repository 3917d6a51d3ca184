//! Height grid generation
//!
//! Builds square grids of noise elevation around a sample centre, optionally
//! shaped by an edge falloff profile.

pub mod builder;
pub mod context;
pub mod curve;
pub mod falloff;
pub mod range;

pub use builder::{build_height_grid, grid_sample_point, HeightGrid, HeightMapBuilder};
pub use context::GenerationContext;
pub use curve::{CurveKey, ResponseCurve};
pub use falloff::{default_falloff, FalloffCache, FalloffMap};
pub use range::HeightRange;
