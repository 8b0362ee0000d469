use crate::enums::EffectSize;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Summary statistics for one banking scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub average_failures: f64,
    #[serde(default)]
    pub median_failures: f64,
    pub max_failures: u32,
    #[serde(default)]
    pub min_failures: u32,
    pub std_dev_failures: f64,
    pub probability_systemic_event: f64,
    #[serde(default)]
    pub ci_lower: f64,
    #[serde(default)]
    pub ci_upper: f64,
    /// Failure count (as string key) to percentage of runs.
    #[serde(default)]
    pub distribution: BTreeMap<String, f64>,
    /// Bank index (as string key) to percentage of runs in which it failed.
    #[serde(default)]
    pub bank_failures: BTreeMap<String, f64>,
    #[serde(default)]
    pub systemic_threshold: u32,
}

impl ScenarioSummary {
    /// Distribution sorted by numeric failure count. Non-numeric keys are skipped.
    #[must_use]
    pub fn distribution_points(&self) -> Vec<(u32, f64)> {
        numeric_points(&self.distribution)
    }

    /// Bank failure frequencies sorted by bank index.
    #[must_use]
    pub fn bank_failure_points(&self) -> Vec<(u32, f64)> {
        numeric_points(&self.bank_failures)
    }
}

fn numeric_points(map: &BTreeMap<String, f64>) -> Vec<(u32, f64)> {
    let mut points: Vec<(u32, f64)> = map
        .iter()
        .filter_map(|(k, v)| k.parse::<u32>().ok().map(|k| (k, *v)))
        .collect();
    points.sort_by_key(|(k, _)| *k);
    points
}

/// Relative improvement of the blockchain scenario over the traditional one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Improvements {
    /// Percent.
    pub average_failures: f64,
    /// Absolute difference in bank count.
    pub max_failures: i64,
    /// Percent.
    pub probability_systemic_event: f64,
    /// Percent.
    pub std_dev_failures: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticalAnalysis {
    pub t_stat: f64,
    pub p_value: f64,
    pub cohens_d: f64,
    pub effect: EffectSize,
    #[serde(default)]
    pub significant: bool,
}

impl StatisticalAnalysis {
    /// Significance at the 5% level.
    #[must_use]
    pub fn is_significant(&self) -> bool {
        self.significant || self.p_value < 0.05
    }
}

/// Per-run failure counts, truncated by the backend to the first 1000 runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawData {
    #[serde(default)]
    pub traditional_failures: Vec<u32>,
    #[serde(default)]
    pub blockchain_failures: Vec<u32>,
    #[serde(default)]
    pub bank_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResults {
    pub id: Uuid,
    pub simulation_id: Uuid,
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
    pub traditional_summary: ScenarioSummary,
    pub blockchain_summary: ScenarioSummary,
    pub improvements: Improvements,
    pub statistical_analysis: StatisticalAnalysis,
    #[serde(default)]
    pub has_raw_data: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<RawData>,
}

impl SimulationResults {
    /// Name of the bank at `index`, if raw data with bank names was requested.
    #[must_use]
    pub fn bank_name(&self, index: u32) -> Option<&str> {
        self.raw_data
            .as_ref()
            .and_then(|raw| raw.bank_names.get(index as usize))
            .map(String::as_str)
    }
}
