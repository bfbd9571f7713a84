//! Policy constants and thresholds for an analysis run.

use crate::alerts::{AlertThresholds, DEFAULT_BREACH_THRESHOLD, DEFAULT_WARN_THRESHOLD};
use crate::benchmarks::DEFAULT_INDUSTRY;
use crate::error::{AnalysisError, AnalysisResult};
use crate::rightsizing::DEFAULT_RECOVERABLE_FACTOR;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Fraction of detected waste assumed recoverable, in (0, 1].
    pub recoverable_factor: f64,
    pub alert_warn_threshold: f64,
    pub alert_breach_threshold: f64,
    /// Industry tag used for benchmarking.
    pub industry: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            recoverable_factor: DEFAULT_RECOVERABLE_FACTOR,
            alert_warn_threshold: DEFAULT_WARN_THRESHOLD,
            alert_breach_threshold: DEFAULT_BREACH_THRESHOLD,
            industry: DEFAULT_INDUSTRY.to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Breach below warn is accepted; the evaluator applies whatever it gets.
    pub fn validate(&self) -> AnalysisResult<()> {
        let f = self.recoverable_factor;
        if !f.is_finite() || f <= 0.0 || f > 1.0 {
            return Err(AnalysisError::invalid_config(
                "recoverable_factor",
                format!("must be in (0, 1], got {}", f),
            ));
        }
        for (field, v) in [
            ("alert_warn_threshold", self.alert_warn_threshold),
            ("alert_breach_threshold", self.alert_breach_threshold),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(AnalysisError::invalid_config(
                    field,
                    format!("must be a positive number, got {}", v),
                ));
            }
        }
        Ok(())
    }

    pub fn thresholds(&self) -> AlertThresholds {
        AlertThresholds {
            warn: self.alert_warn_threshold,
            breach: self.alert_breach_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = AnalysisConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.thresholds(), AlertThresholds::default());
        assert_eq!(c.industry, "msp");
    }

    #[test]
    fn rejects_out_of_range_factor() {
        for f in [0.0, -0.2, 1.01, f64::NAN] {
            let c = AnalysisConfig { recoverable_factor: f, ..Default::default() };
            assert!(matches!(
                c.validate(),
                Err(AnalysisError::InvalidConfig { ref field, .. }) if field == "recoverable_factor"
            ));
        }
        let c = AnalysisConfig { recoverable_factor: 1.0, ..Default::default() };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn inverted_thresholds_allowed_but_non_positive_rejected() {
        let c = AnalysisConfig {
            alert_warn_threshold: 1.2,
            alert_breach_threshold: 0.8,
            ..Default::default()
        };
        assert!(c.validate().is_ok());
        let c = AnalysisConfig { alert_warn_threshold: 0.0, ..Default::default() };
        assert!(c.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: AnalysisConfig = serde_json::from_str(r#"{"industry":"saas"}"#).unwrap();
        assert_eq!(c.industry, "saas");
        assert_eq!(c.recoverable_factor, 0.8);
    }
}
