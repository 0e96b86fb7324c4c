//! Tolerances and export precision shared by every stage of the pipeline.

use serde::{Deserialize, Serialize};

/// Numeric settings for classification, joining and export.
///
/// All lengths are in model units (millimetres in the bundled scenarios).
///
/// # Examples
/// ```
/// use timberjoin::Settings;
///
/// let settings = Settings::from_json(r#"{"point_precision": 2}"#).expect("valid settings");
/// assert_eq!(settings.point_precision, 2);
/// assert_eq!(settings.angle_precision, 3);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Absolute tolerance for geometric equality checks.
    pub tolerance: f64,
    /// Largest allowed gap between two centerlines for them to be considered touching.
    /// `None` accepts any gap.
    pub max_distance: Option<f64>,
    /// Distance from an endpoint within which a closest point counts as that endpoint.
    pub end_tolerance: f64,
    /// Extra length added to every blank extension.
    pub extension_tolerance: f64,
    /// Offset applied to the dovetail wedge vertices.
    pub dovetail_nudge: f64,
    /// Decimal places of linear fabrication values.
    pub point_precision: usize,
    /// Decimal places of angular fabrication values.
    pub angle_precision: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tolerance: 1.0e-6,
            max_distance: None,
            end_tolerance: 1.0e-3,
            extension_tolerance: 0.01,
            dovetail_nudge: 0.01,
            point_precision: 3,
            angle_precision: 3,
        }
    }
}

impl Settings {
    /// Parse settings from JSON; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] for malformed input.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Format a linear value with [`Settings::point_precision`] decimals.
    #[must_use]
    pub fn format_length(&self, value: f64) -> String {
        format_fixed(value, self.point_precision)
    }

    /// Format an angle in degrees with [`Settings::angle_precision`] decimals.
    #[must_use]
    pub fn format_angle(&self, value: f64) -> String {
        format_fixed(value, self.angle_precision)
    }
}

/// Fixed-point formatting that never renders a negative zero.
fn format_fixed(value: f64, precision: usize) -> String {
    let half_step = 0.5 * 10f64.powi(-i32::try_from(precision).unwrap_or(i32::MAX));
    let value = if value.abs() < half_step { 0.0 } else { value };
    format!("{value:.precision$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.max_distance, None);
        assert_eq!(settings.point_precision, 3);
        assert!((settings.extension_tolerance - 0.01).abs() < f64::EPSILON);
    }

    #[test]
    fn tiny_negative_values_format_as_zero() {
        let settings = Settings::default();
        assert_eq!(settings.format_length(-1.0e-9), "0.000");
        assert_eq!(settings.format_angle(90.0), "90.000");
        assert_eq!(settings.format_length(-12.3456), "-12.346");
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(Settings::from_json("{\"tolerance\": \"tight\"}").is_err());
    }
}
