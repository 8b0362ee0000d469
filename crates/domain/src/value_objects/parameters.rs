use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Monte Carlo parameters for a traditional vs blockchain comparison run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Probability that a bank is hit by an exogenous shock in one run.
    pub shock_prob: f64,
    /// Number of Monte Carlo iterations.
    pub n_sim: u32,
    /// Bank failures at or above which a run counts as a systemic event.
    pub systemic_threshold: u32,
    /// Loss given default in the traditional system.
    pub trad_lgd: f64,
    /// Loss given default in the blockchain system.
    pub bc_lgd: f64,
    /// Fractional reduction of interbank liabilities under blockchain settlement.
    pub bc_liability_reduction: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            shock_prob: 0.03,
            n_sim: 10_000,
            systemic_threshold: 3,
            trad_lgd: 0.6,
            bc_lgd: 0.3,
            bc_liability_reduction: 0.5,
        }
    }
}

impl SimulationParameters {
    /// Validates the parameters with the same rules the backend enforces.
    ///
    /// # Errors
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        open_unit_interval("shock_prob", self.shock_prob)?;
        if self.n_sim < 100 {
            return Err(ValidationError::new(
                "n_sim",
                "n_sim must be an integer of at least 100",
            ));
        }
        if self.systemic_threshold < 1 {
            return Err(ValidationError::new(
                "systemic_threshold",
                "systemic_threshold must be an integer of at least 1",
            ));
        }
        open_unit_interval("trad_lgd", self.trad_lgd)?;
        open_unit_interval("bc_lgd", self.bc_lgd)?;
        open_unit_interval("bc_liability_reduction", self.bc_liability_reduction)?;
        Ok(())
    }

    /// Parameter name/value pairs in wire order, for tables and exports.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("shock_prob", self.shock_prob.to_string()),
            ("n_sim", self.n_sim.to_string()),
            ("systemic_threshold", self.systemic_threshold.to_string()),
            ("trad_lgd", self.trad_lgd.to_string()),
            ("bc_lgd", self.bc_lgd.to_string()),
            (
                "bc_liability_reduction",
                self.bc_liability_reduction.to_string(),
            ),
        ]
    }
}

fn open_unit_interval(field: &str, value: f64) -> Result<(), ValidationError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("{field} must be between 0 and 1"),
        ))
    }
}

/// Partial parameter update. Absent fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shock_prob: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_sim: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub systemic_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trad_lgd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bc_lgd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bc_liability_reduction: Option<f64>,
}

impl ParameterUpdate {
    /// Merges the update over `current`.
    #[must_use]
    pub fn apply_to(&self, current: &SimulationParameters) -> SimulationParameters {
        SimulationParameters {
            shock_prob: self.shock_prob.unwrap_or(current.shock_prob),
            n_sim: self.n_sim.unwrap_or(current.n_sim),
            systemic_threshold: self.systemic_threshold.unwrap_or(current.systemic_threshold),
            trad_lgd: self.trad_lgd.unwrap_or(current.trad_lgd),
            bc_lgd: self.bc_lgd.unwrap_or(current.bc_lgd),
            bc_liability_reduction: self
                .bc_liability_reduction
                .unwrap_or(current.bc_liability_reduction),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SimulationParameters::default().validate().is_ok());
    }

    #[test]
    fn test_probability_bounds_are_open() {
        let params = SimulationParameters {
            shock_prob: 1.0,
            ..Default::default()
        };
        let err = params.validate().unwrap_err();
        assert_eq!(err.field, "shock_prob");
        assert_eq!(err.message, "shock_prob must be between 0 and 1");

        let params = SimulationParameters {
            bc_lgd: 0.0,
            ..Default::default()
        };
        assert_eq!(params.validate().unwrap_err().field, "bc_lgd");
    }

    #[test]
    fn test_minimum_iterations() {
        let params = SimulationParameters {
            n_sim: 99,
            ..Default::default()
        };
        assert_eq!(
            params.validate().unwrap_err().to_string(),
            "n_sim must be an integer of at least 100"
        );
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let params = SimulationParameters {
            systemic_threshold: 0,
            ..Default::default()
        };
        assert_eq!(params.validate().unwrap_err().field, "systemic_threshold");
    }

    #[test]
    fn test_parameter_update_merge() {
        let update = ParameterUpdate {
            n_sim: Some(500),
            trad_lgd: Some(0.7),
            ..Default::default()
        };
        let merged = update.apply_to(&SimulationParameters::default());
        assert_eq!(merged.n_sim, 500);
        assert_eq!(merged.trad_lgd, 0.7);
        assert_eq!(merged.bc_lgd, 0.3);
        assert!(!update.is_empty());
        assert!(ParameterUpdate::default().is_empty());
    }

    #[test]
    fn test_update_serializes_only_present_fields() {
        let update = ParameterUpdate {
            shock_prob: Some(0.05),
            ..Default::default()
        };
        let json = serde_json::to_value(update).unwrap();
        assert_eq!(json, serde_json::json!({ "shock_prob": 0.05 }));
    }
}
