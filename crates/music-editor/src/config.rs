use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Bar painting strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarStyle {
    /// Trailing translucent backdrop, linear height, alpha follows magnitude
    #[default]
    Wave,
    /// Solid backdrop, boosted quiet bins, separated bars
    Harmonics,
}

impl BarStyle {
    pub const ALL: [BarStyle; 2] = [BarStyle::Wave, BarStyle::Harmonics];

    pub fn label(self) -> &'static str {
        match self {
            BarStyle::Wave => "Wave",
            BarStyle::Harmonics => "Harmonics",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub fft_size: u32,
    pub smoothing: f64,
    pub style: BarStyle,
    // Used when the canvas reports a zero size at bind time
    pub fallback_width: u32,
    pub fallback_height: u32,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            smoothing: 0.8,
            style: BarStyle::Wave,
            fallback_width: 300,
            fallback_height: 64,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub initial_volume: f32,
    pub initial_pan: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_volume: 1.0,
            initial_pan: 0.0,
        }
    }
}

/// Top-level editor settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub visualizer: VisualizerConfig,
    pub session: SessionConfig,
    /// Track listing endpoint.
    pub library_url: String,
    pub stream_base_url: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            visualizer: VisualizerConfig::default(),
            session: SessionConfig::default(),
            library_url: "http://localhost:3000/api/music".to_string(),
            stream_base_url: "http://localhost:3000/api/music/stream".to_string(),
        }
    }
}

impl EditorConfig {
    /// Parses and validates a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fft = self.visualizer.fft_size;
        if !fft.is_power_of_two() || !(32..=32768).contains(&fft) {
            return Err(ConfigError::Invalid {
                field: "visualizer.fft_size",
                reason: format!("{fft} is not a power of two in 32..=32768"),
            });
        }
        if !(0.0..=1.0).contains(&self.visualizer.smoothing) {
            return Err(ConfigError::Invalid {
                field: "visualizer.smoothing",
                reason: format!("{} is outside 0..=1", self.visualizer.smoothing),
            });
        }
        if self.visualizer.fallback_width == 0 || self.visualizer.fallback_height == 0 {
            return Err(ConfigError::Invalid {
                field: "visualizer.fallback_width",
                reason: "fallback size must be non-zero".to_string(),
            });
        }
        let volume = self.session.initial_volume;
        if volume.is_nan() || volume < 0.0 {
            return Err(ConfigError::Invalid {
                field: "session.initial_volume",
                reason: format!("{volume} is not a non-negative gain"),
            });
        }
        if !(-1.0..=1.0).contains(&self.session.initial_pan) {
            return Err(ConfigError::Invalid {
                field: "session.initial_pan",
                reason: format!("{} is outside -1..=1", self.session.initial_pan),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = EditorConfig::from_json("{}").unwrap();
        assert_eq!(cfg, EditorConfig::default());
        assert_eq!(cfg.visualizer.fft_size, 1024);
    }

    #[test]
    fn partial_document_overrides_fields() {
        let cfg = EditorConfig::from_json(
            r#"{"visualizer": {"style": "harmonics", "fft_size": 512}, "session": {"initial_pan": -0.5}}"#,
        )
        .unwrap();
        assert_eq!(cfg.visualizer.style, BarStyle::Harmonics);
        assert_eq!(cfg.visualizer.fft_size, 512);
        assert_eq!(cfg.visualizer.fallback_height, 64);
        assert_eq!(cfg.session.initial_pan, -0.5);
        assert_eq!(cfg.session.initial_volume, 1.0);
    }

    #[test]
    fn rejects_non_power_of_two_fft() {
        let err = EditorConfig::from_json(r#"{"visualizer": {"fft_size": 1000}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "visualizer.fft_size", .. }));
    }

    #[test]
    fn rejects_pan_out_of_range() {
        let err = EditorConfig::from_json(r#"{"session": {"initial_pan": 1.5}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "session.initial_pan", .. }));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(EditorConfig::from_json("{"), Err(ConfigError::Parse(_))));
    }
}
