//! Downloadable artifacts for simulation results.
//!
//! This crate provides:
//! - Saving the backend's JSON and CSV exports to disk
//! - A client-side CSV rendering of results
//! - Bar chart rasterization for failure distributions and frequencies
//! - A paginated PDF report with embedded charts
//! - One PNG per chart, each rendered independently

/// Prelude module for convenient imports.
pub mod prelude;

/// Bar chart specs and rasterization.
pub mod chart;
/// Client-side CSV rendering.
pub mod csv_export;
/// Writing artifacts to disk.
pub mod download;
/// Export errors.
pub mod error;
/// PNG export of charts.
pub mod images;
/// PDF report assembly.
pub mod pdf;
/// Export state tracking.
pub mod session;

pub use chart::{ChartKind, ChartRenderer, ChartSpec, Series};
pub use error::ExportError;
pub use session::ExportSession;

#[cfg(test)]
pub(crate) mod fixtures {
    use riskdash_domain::entities::{Simulation, SimulationResults};
    use serde_json::json;

    pub fn simulation(name: &str) -> Simulation {
        serde_json::from_value(json!({
            "id": "4f8a1f0e-5b7e-4c55-9d3b-2a8a3c1d9e01",
            "name": name,
            "description": "Baseline shock with default loss given default",
            "created_by": "0b7d9c57-3c0e-4b0e-8d5b-9f6f3a4c2e10",
            "created_at": "2024-03-01T10:15:30",
            "status": "completed",
            "progress": 1.0,
            "parameters": {
                "shock_prob": 0.03, "n_sim": 10000, "systemic_threshold": 3,
                "trad_lgd": 0.6, "bc_lgd": 0.3, "bc_liability_reduction": 0.5
            },
            "has_result": true
        }))
        .unwrap()
    }

    pub fn results() -> SimulationResults {
        serde_json::from_value(json!({
            "id": "1e2d3c4b-5a69-4788-9a0b-1c2d3e4f5a6b",
            "simulation_id": "4f8a1f0e-5b7e-4c55-9d3b-2a8a3c1d9e01",
            "traditional_summary": {
                "average_failures": 2.4, "max_failures": 12, "std_dev_failures": 1.8,
                "probability_systemic_event": 0.21,
                "distribution": { "0": 40.0, "1": 25.0, "2": 15.0, "10": 20.0 },
                "bank_failures": { "0": 12.0, "1": 30.5, "2": 8.0 }
            },
            "blockchain_summary": {
                "average_failures": 1.2, "max_failures": 7, "std_dev_failures": 0.9,
                "probability_systemic_event": 0.06,
                "distribution": { "0": 65.0, "1": 25.0, "2": 10.0 },
                "bank_failures": { "0": 5.0, "1": 14.0, "2": 3.5 }
            },
            "improvements": {
                "average_failures": 50.0, "max_failures": 5,
                "probability_systemic_event": 71.43, "std_dev_failures": 50.0
            },
            "statistical_analysis": {
                "t_stat": 14.2, "p_value": 0.0001, "cohens_d": 0.85, "effect": "Large"
            },
            "has_raw_data": true,
            "raw_data": { "bank_names": ["Deutsche Bank", "BNP Paribas", "Santander"] }
        }))
        .unwrap()
    }
}
