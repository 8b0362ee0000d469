//! Cross-simulation comparison and history views.

use crate::entities::{Simulation, SimulationResults};
use crate::value_objects::parameters::SimulationParameters;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Spread of one metric across the compared simulations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRange {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub range: f64,
}

impl MetricRange {
    /// Summarises `values`. Returns `None` for an empty slice.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        Some(Self {
            min,
            max,
            avg,
            range: max - min,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonMetrics {
    pub traditional_avg_failures: MetricRange,
    pub blockchain_avg_failures: MetricRange,
    pub traditional_systemic_prob: MetricRange,
    pub blockchain_systemic_prob: MetricRange,
    /// Percent reduction of average failures, per simulation.
    pub improvement: MetricRange,
}

impl ComparisonMetrics {
    /// Computes the comparison the backend attaches to `/compare` responses.
    ///
    /// Returns `None` when `results` is empty.
    #[must_use]
    pub fn from_results(results: &[SimulationResults]) -> Option<Self> {
        let pick = |f: fn(&SimulationResults) -> f64| -> Vec<f64> { results.iter().map(f).collect() };

        let trad_avg = pick(|r| r.traditional_summary.average_failures);
        let bc_avg = pick(|r| r.blockchain_summary.average_failures);
        let improvements: Vec<f64> = trad_avg
            .iter()
            .zip(&bc_avg)
            .map(|(trad, bc)| improvement_percent(*trad, *bc))
            .collect();

        Some(Self {
            traditional_avg_failures: MetricRange::from_values(&trad_avg)?,
            blockchain_avg_failures: MetricRange::from_values(&bc_avg)?,
            traditional_systemic_prob: MetricRange::from_values(&pick(|r| {
                r.traditional_summary.probability_systemic_event
            }))?,
            blockchain_systemic_prob: MetricRange::from_values(&pick(|r| {
                r.blockchain_summary.probability_systemic_event
            }))?,
            improvement: MetricRange::from_values(&improvements)?,
        })
    }
}

/// `(1 - bc / trad) * 100`, or `0` when the traditional figure is not positive.
#[must_use]
pub fn improvement_percent(traditional: f64, blockchain: f64) -> f64 {
    if traditional > 0.0 {
        (1.0 - blockchain / traditional) * 100.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationComparison {
    pub simulations: Vec<Simulation>,
    pub results: Vec<SimulationResults>,
    /// Empty object from the backend when nothing was compared.
    #[serde(default, deserialize_with = "deserialize_optional_metrics")]
    pub comparison: Option<ComparisonMetrics>,
}

fn deserialize_optional_metrics<'de, D>(deserializer: D) -> Result<Option<ComparisonMetrics>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match &value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(map) if map.is_empty() => Ok(None),
        _ => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub parameters: SimulationParameters,
    pub traditional_avg_failures: f64,
    pub blockchain_avg_failures: f64,
    pub traditional_systemic_prob: f64,
    pub blockchain_systemic_prob: f64,
    pub improvement_percent: f64,
}

/// Completed simulations over a trailing window, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationHistory {
    pub history: Vec<HistoryEntry>,
    pub count: usize,
}
