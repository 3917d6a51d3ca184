//! Procedural noise
//!
//! Layered simplex noise evaluated at 3D points. Layers combine through a
//! "first layer as mask" rule so detail layers only show up where the base
//! layer already produced land.

pub mod field;
pub mod filter;
pub mod noise_layer;

pub use field::NoiseField;
pub use filter::NoiseFilter;
pub use noise_layer::{FilterKind, NoiseLayerConfig};
