use super::settings::TerrainSettings;
use crate::error::{TerrainError, TerrainResult};
use std::path::Path;

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(ConfigFormat::Json),
            Some("toml") => Some(ConfigFormat::Toml),
            _ => None,
        }
    }

    /// Parse and validate settings from a string
    pub fn parse(self, raw: &str, origin: &str) -> TerrainResult<TerrainSettings> {
        let mut settings: TerrainSettings = match self {
            ConfigFormat::Json => serde_json::from_str(raw).map_err(|e| TerrainError::ConfigParse {
                path: origin.to_string(),
                message: e.to_string(),
            })?,
            ConfigFormat::Toml => toml::from_str(raw).map_err(|e| TerrainError::ConfigParse {
                path: origin.to_string(),
                message: e.to_string(),
            })?,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn serialize(self, settings: &TerrainSettings) -> TerrainResult<String> {
        let serialized = match self {
            ConfigFormat::Json => serde_json::to_string_pretty(settings).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::to_string_pretty(settings).map_err(|e| e.to_string()),
        };
        serialized.map_err(|error| TerrainError::SystemError {
            component: "ConfigFormat".to_string(),
            error,
        })
    }
}

fn detect(path: &Path) -> TerrainResult<ConfigFormat> {
    ConfigFormat::from_path(path).ok_or_else(|| TerrainError::UnknownConfigFormat {
        path: path.display().to_string(),
    })
}

/// Load, parse and validate settings from a `.toml` or `.json` file
pub fn load_settings(path: impl AsRef<Path>) -> TerrainResult<TerrainSettings> {
    let path = path.as_ref();
    let format = detect(path)?;
    let raw = std::fs::read_to_string(path).map_err(|source| TerrainError::ConfigIo {
        path: path.display().to_string(),
        source,
    })?;
    let settings = format.parse(&raw, &path.display().to_string())?;
    log::info!("[Config] Loaded terrain settings from {}", path.display());
    Ok(settings)
}

/// Write settings to a `.toml` or `.json` file
pub fn save_settings(path: impl AsRef<Path>, settings: &TerrainSettings) -> TerrainResult<()> {
    let path = path.as_ref();
    let raw = detect(path)?.serialize(settings)?;
    std::fs::write(path, raw).map_err(|source| TerrainError::ConfigIo {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MeshSource;
    use std::io::Write;

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_path(Path::new("a/terrain.toml")), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_path(Path::new("terrain.json")), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_path(Path::new("terrain.yaml")), None);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let raw = r#"
collider_lod_index = 1

[mesh]
chunk_size_index = 0

[[lods]]
lod = 0
visible_distance = 100.0

[[lods]]
lod = 1
visible_distance = 250.0

[streaming]
mesh_source = "direct_noise"
"#;
        let settings = ConfigFormat::Toml.parse(raw, "inline").unwrap();
        assert_eq!(settings.mesh.vertices_per_line(), 53);
        assert_eq!(settings.lods.len(), 2);
        assert_eq!(settings.streaming.mesh_source, MeshSource::DirectNoise);
        assert_eq!(settings.streaming.max_compute_retries, 3);
        assert!(!settings.height.noise_layers.is_empty());
    }

    #[test]
    fn test_parse_error_names_origin() {
        let error = ConfigFormat::Json.parse("{ not json", "broken.json").unwrap_err();
        assert!(matches!(error, TerrainError::ConfigParse { ref path, .. } if path == "broken.json"));
    }

    #[test]
    fn test_invalid_values_are_rejected_after_parse() {
        let error = ConfigFormat::Json.parse(r#"{"lods": []}"#, "empty.json").unwrap_err();
        assert!(matches!(error, TerrainError::InvalidConfig { .. }));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terrain.toml");
        let mut settings = TerrainSettings::default();
        settings.height.seed = 99;

        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path).unwrap(), settings);
    }

    #[test]
    fn test_load_unknown_extension() {
        let mut file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        writeln!(file, "seed = 1").unwrap();
        assert!(matches!(
            load_settings(file.path()),
            Err(TerrainError::UnknownConfigFormat { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_settings(dir.path().join("missing.json")),
            Err(TerrainError::ConfigIo { .. })
        ));
    }
}
