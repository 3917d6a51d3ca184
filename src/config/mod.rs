//! Terrain configuration
//!
//! `TerrainSettings` is the single serializable root object. It is loaded from
//! TOML or JSON, validated at the boundary, and published through a
//! `SettingsStore` that notifies subscribers of every version bump.

pub mod format;
pub mod settings;
pub mod store;
#[cfg(feature = "native")]
pub mod watcher;

pub use format::{load_settings, save_settings, ConfigFormat};
pub use settings::{HeightMapSettings, MeshSettings, MeshSource, StreamerSettings, TerrainSettings};
pub use store::{SettingsChanged, SettingsStore};
#[cfg(feature = "native")]
pub use watcher::SettingsWatcher;
