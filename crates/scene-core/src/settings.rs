//! Engine settings

use serde::{Deserialize, Serialize};

use crate::i18n::Lang;

/// Placement grid settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Grid cell size in world units
    pub cell_size: f64,
    /// Largest |x| and |z| of a valid cell center
    pub half_extent: f64,
    /// Height at which placed objects rest, above the ground plane
    pub ground_offset: f64,
    /// Screen-space travel (pixels) after which a press becomes a drag
    pub drag_threshold_px: f64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            cell_size: 1.0,
            half_extent: 10.0,
            ground_offset: 1.1,
            drag_threshold_px: 6.0,
        }
    }
}

/// Six-view capture settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Headroom multiplier on the framing distance
    pub padding: f64,
    /// Camera distance used when the bounds are unusable
    pub fallback_distance: f64,
    /// Look-at point used when the bounds are unusable
    pub fallback_center: [f64; 3],
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            padding: 1.5,
            fallback_distance: 10.0,
            fallback_center: [0.0, 0.0, 0.0],
        }
    }
}

/// All engine settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub grid: GridSettings,
    #[serde(default)]
    pub capture: CaptureSettings,
    /// Language of user-visible messages
    #[serde(default)]
    pub language: Lang,
}

impl EngineSettings {
    fn config_path() -> Option<std::path::PathBuf> {
        directories::ProjectDirs::from("com", "buildscene", "buildscene")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from file, or return default if not found
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => Self::from_json(&json).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed settings at {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Save settings to file
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            return;
        };
        if let Some(dir) = path.parent() {
            if std::fs::create_dir_all(dir).is_err() {
                return;
            }
        }
        if let Ok(json) = serde_json::to_string_pretty(self) {
            if let Err(e) = std::fs::write(&path, json) {
                tracing::warn!("Failed to save settings to {}: {e}", path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{"grid": {"cell_size": 2.0}, "language": "en"}"#;
        let s = EngineSettings::from_json(json).unwrap();
        assert_eq!(s.grid.cell_size, 2.0);
        assert_eq!(s.grid.half_extent, 10.0);
        assert_eq!(s.grid.drag_threshold_px, 6.0);
        assert_eq!(s.capture, CaptureSettings::default());
        assert_eq!(s.language, Lang::En);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(EngineSettings::from_json("{}").unwrap(), EngineSettings::default());
    }
}
