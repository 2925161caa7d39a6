//! Probability to display percentage and risk band.
//!
//! Percentages are rounded to one decimal, half away from zero, on
//! `probability * 1000`. The band threshold is inclusive at 50.0%.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Percentage at or above which a result is classed as high risk
pub const HIGH_RISK_THRESHOLD_PCT: f64 = 50.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiskBand {
    #[serde(rename = "Low/moderate risk")]
    LowModerate,
    #[serde(rename = "High risk")]
    High,
}

impl RiskBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::LowModerate => "Low/moderate risk",
            RiskBand::High => "High risk",
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified outcome of one request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PredictionResult {
    pub probability: f64,
    pub label: u8,
    #[serde(rename = "risk_pct")]
    pub risk_percentage: f64,
    pub risk_band: RiskBand,
}

impl PredictionResult {
    /// Markdown line shown to the user
    pub fn display_message(&self) -> String {
        format!(
            "**Predicted NAFLD risk: {:.1}% ({})**",
            self.risk_percentage, self.risk_band
        )
    }
}

/// `round(probability * 100, 1)` with half-away-from-zero rounding
pub fn risk_percentage(probability: f64) -> f64 {
    (probability * 1000.0).round() / 10.0
}

pub fn risk_band(percentage: f64) -> RiskBand {
    if percentage >= HIGH_RISK_THRESHOLD_PCT {
        RiskBand::High
    } else {
        RiskBand::LowModerate
    }
}

pub fn classify(probability: f64, label: u8) -> PredictionResult {
    let pct = risk_percentage(probability);
    PredictionResult {
        probability,
        label,
        risk_percentage: pct,
        risk_band: risk_band(pct),
    }
}
