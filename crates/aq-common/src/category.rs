//! Air-quality index banding.

use serde::{Deserialize, Serialize};

/// US-EPA style AQI band for a pollutant index value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    /// Band an index value. Upper bounds are inclusive.
    pub fn from_index(aqi: f64) -> Self {
        if aqi <= 50.0 {
            Self::Good
        } else if aqi <= 100.0 {
            Self::Moderate
        } else if aqi <= 150.0 {
            Self::UnhealthyForSensitiveGroups
        } else if aqi <= 200.0 {
            Self::Unhealthy
        } else if aqi <= 300.0 {
            Self::VeryUnhealthy
        } else {
            Self::Hazardous
        }
    }

    /// Human-readable band name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            Self::Unhealthy => "Unhealthy",
            Self::VeryUnhealthy => "Very Unhealthy",
            Self::Hazardous => "Hazardous",
        }
    }

    /// Display colour as RGB.
    pub fn color(&self) -> [u8; 3] {
        match self {
            Self::Good => [0, 158, 96],
            Self::Moderate => [255, 214, 0],
            Self::UnhealthyForSensitiveGroups => [249, 115, 22],
            Self::Unhealthy => [220, 38, 38],
            Self::VeryUnhealthy => [147, 51, 234],
            Self::Hazardous => [126, 34, 206],
        }
    }
}

impl std::fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges() {
        assert_eq!(AqiCategory::from_index(0.0), AqiCategory::Good);
        assert_eq!(AqiCategory::from_index(50.0), AqiCategory::Good);
        assert_eq!(AqiCategory::from_index(50.5), AqiCategory::Moderate);
        assert_eq!(AqiCategory::from_index(150.0), AqiCategory::UnhealthyForSensitiveGroups);
        assert_eq!(AqiCategory::from_index(200.0), AqiCategory::Unhealthy);
        assert_eq!(AqiCategory::from_index(300.0), AqiCategory::VeryUnhealthy);
        assert_eq!(AqiCategory::from_index(301.0), AqiCategory::Hazardous);
        assert_eq!(AqiCategory::from_index(999.0), AqiCategory::Hazardous);
    }

    #[test]
    fn test_label_display() {
        assert_eq!(
            AqiCategory::UnhealthyForSensitiveGroups.to_string(),
            "Unhealthy for Sensitive Groups"
        );
    }
}
