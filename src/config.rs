use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{LogError, Result};

// ---------------------------------------------------------------------------
// Chart kinds
// ---------------------------------------------------------------------------

/// The chart families the viewer offers. Each kind shares one settings
/// structure; kinds only differ in which fields the renderer consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    Line,
    Bar,
    Scatter,
    Heatmap,
    Histogram,
}

impl ChartKind {
    pub const ALL: &'static [ChartKind] = &[
        ChartKind::Line,
        ChartKind::Bar,
        ChartKind::Scatter,
        ChartKind::Heatmap,
        ChartKind::Histogram,
    ];
}

// ---------------------------------------------------------------------------
// Chart settings
// ---------------------------------------------------------------------------

const TITLE_FONT_RANGE: std::ops::RangeInclusive<u32> = 10..=40;
const AXIS_FONT_RANGE: std::ops::RangeInclusive<u32> = 10..=30;

/// Strongly-typed chart settings with explicit defaults.
///
/// Replaces the free-form settings dictionary of the original viewer: the
/// recognized fields are enumerated here and unknown keys in user settings
/// are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    pub graph_title: String,
    pub title_font_size: u32,
    pub x_axis: String,
    pub y_axis: Vec<String>,
    pub use_secondary_y: bool,
    pub secondary_y_axis: Vec<String>,
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub secondary_y_axis_title: String,
    pub x_axis_title_font_size: u32,
    pub y_axis_title_font_size: u32,
    pub x_axis_value_size: u32,
    pub y_axis_value_size: u32,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            graph_title: String::new(),
            title_font_size: 20,
            x_axis: String::new(),
            y_axis: Vec::new(),
            use_secondary_y: false,
            secondary_y_axis: Vec::new(),
            x_axis_title: String::new(),
            y_axis_title: String::new(),
            secondary_y_axis_title: String::new(),
            x_axis_title_font_size: 12,
            y_axis_title_font_size: 12,
            x_axis_value_size: 12,
            y_axis_value_size: 12,
        }
    }
}

impl ChartSettings {
    /// Check font-size ranges, consuming and returning the settings so a
    /// construction site can write `ChartSettings { .. }.validated()?`.
    pub fn validated(self) -> Result<Self> {
        let check = |name: &'static str,
                     value: u32,
                     range: &std::ops::RangeInclusive<u32>|
         -> Result<()> {
            if range.contains(&value) {
                Ok(())
            } else {
                Err(LogError::InvalidSetting { name, value })
            }
        };
        check("title_font_size", self.title_font_size, &TITLE_FONT_RANGE)?;
        check(
            "x_axis_title_font_size",
            self.x_axis_title_font_size,
            &AXIS_FONT_RANGE,
        )?;
        check(
            "y_axis_title_font_size",
            self.y_axis_title_font_size,
            &AXIS_FONT_RANGE,
        )?;
        check("x_axis_value_size", self.x_axis_value_size, &AXIS_FONT_RANGE)?;
        check("y_axis_value_size", self.y_axis_value_size, &AXIS_FONT_RANGE)?;
        Ok(self)
    }

    /// Overlay user-saved settings onto these defaults.
    ///
    /// Only recognized keys with a value of the matching JSON type are
    /// applied; everything else is left untouched. Persistence of the JSON
    /// itself is the caller's concern.
    pub fn apply_user_settings(&mut self, user: &JsonValue) {
        let Some(obj) = user.as_object() else { return };

        let string = |key: &str| obj.get(key).and_then(JsonValue::as_str).map(str::to_string);
        let font = |key: &str| {
            obj.get(key)
                .and_then(JsonValue::as_u64)
                .and_then(|v| u32::try_from(v).ok())
        };
        let string_list = |key: &str| -> Option<Vec<String>> {
            obj.get(key)?
                .as_array()?
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect()
        };

        if let Some(v) = string("graph_title") {
            self.graph_title = v;
        }
        if let Some(v) = font("title_font_size") {
            self.title_font_size = v;
        }
        if let Some(v) = string("x_axis") {
            self.x_axis = v;
        }
        if let Some(v) = string_list("y_axis") {
            self.y_axis = v;
        }
        if let Some(v) = obj.get("use_secondary_y").and_then(JsonValue::as_bool) {
            self.use_secondary_y = v;
        }
        if let Some(v) = string_list("secondary_y_axis") {
            self.secondary_y_axis = v;
        }
        if let Some(v) = string("x_axis_title") {
            self.x_axis_title = v;
        }
        if let Some(v) = string("y_axis_title") {
            self.y_axis_title = v;
        }
        if let Some(v) = string("secondary_y_axis_title") {
            self.secondary_y_axis_title = v;
        }
        if let Some(v) = font("x_axis_title_font_size") {
            self.x_axis_title_font_size = v;
        }
        if let Some(v) = font("y_axis_title_font_size") {
            self.y_axis_title_font_size = v;
        }
        if let Some(v) = font("x_axis_value_size") {
            self.x_axis_value_size = v;
        }
        if let Some(v) = font("y_axis_value_size") {
            self.y_axis_value_size = v;
        }
    }
}

// ---------------------------------------------------------------------------
// FFT settings
// ---------------------------------------------------------------------------

/// Caller-facing FFT parameters.
///
/// Power-of-two window sizes are what the UI suggests, but any positive
/// size is accepted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FftSettings {
    pub start_sec: f64,
    pub window_size: usize,
}

impl Default for FftSettings {
    fn default() -> Self {
        Self {
            start_sec: 0.0,
            window_size: 1024,
        }
    }
}

impl FftSettings {
    pub fn validated(self) -> Result<Self> {
        if self.window_size == 0 {
            return Err(LogError::InvalidWindow);
        }
        if !self.start_sec.is_finite() || self.start_sec < 0.0 {
            return Err(LogError::InvalidStart);
        }
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_pass_validation() {
        assert!(ChartSettings::default().validated().is_ok());
        assert!(FftSettings::default().validated().is_ok());
    }

    #[test]
    fn out_of_range_font_size_is_rejected() {
        let settings = ChartSettings {
            title_font_size: 99,
            ..Default::default()
        };
        assert!(matches!(
            settings.validated().unwrap_err(),
            LogError::InvalidSetting {
                name: "title_font_size",
                value: 99
            }
        ));
    }

    #[test]
    fn user_settings_overlay_only_matching_types() {
        let mut settings = ChartSettings::default();
        settings.apply_user_settings(&json!({
            "graph_title": "vibration",
            "title_font_size": 24,
            "y_axis": ["CH1", "CH2"],
            "use_secondary_y": true,
            // wrong type: ignored
            "x_axis_title_font_size": "big",
            // unknown key: ignored
            "plot_color": "#ff0000",
        }));
        assert_eq!(settings.graph_title, "vibration");
        assert_eq!(settings.title_font_size, 24);
        assert_eq!(settings.y_axis, vec!["CH1", "CH2"]);
        assert!(settings.use_secondary_y);
        assert_eq!(settings.x_axis_title_font_size, 12);
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = ChartSettings {
            graph_title: "run 7".into(),
            y_axis: vec!["CH1".into()],
            ..Default::default()
        };
        let text = serde_json::to_string(&settings).unwrap();
        let back: ChartSettings = serde_json::from_str(&text).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn negative_start_is_rejected() {
        let settings = FftSettings {
            start_sec: -1.0,
            window_size: 256,
        };
        assert!(settings.validated().is_err());
    }
}
