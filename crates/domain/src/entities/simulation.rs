use crate::enums::SimulationStatus;
use crate::error::ValidationError;
use crate::value_objects::parameters::SimulationParameters;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A simulation run as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_by: Uuid,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    pub status: SimulationStatus,
    /// Fraction complete, `0.0..=1.0`.
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    pub parameters: SimulationParameters,
    #[serde(default)]
    pub has_result: bool,
}

impl Simulation {
    /// Progress as a percentage, clamped to `0..=100`.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        (self.progress * 100.0).clamp(0.0, 100.0)
    }

    #[must_use]
    pub fn results_available(&self) -> bool {
        self.status == SimulationStatus::Completed && self.has_result
    }
}

/// Lightweight status poll response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStatusReport {
    pub status: SimulationStatus,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Body for creating a simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSimulation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: SimulationParameters,
}

impl NewSimulation {
    /// # Errors
    /// Returns an error for a blank name or out-of-range parameters.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "Simulation name is required"));
        }
        self.parameters.validate()
    }
}
