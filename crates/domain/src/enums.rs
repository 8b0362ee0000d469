use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a simulation run on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationStatus {
    /// Queued, not yet picked up by a worker.
    Pending,
    /// Currently executing.
    Running,
    /// Finished with results available.
    Completed,
    /// Aborted with an error message.
    Failed,
    /// Canceled by the user.
    Canceled,
}

impl SimulationStatus {
    /// Returns the wire name of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }

    /// No further progress events are expected once a run reaches this state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled)
    }

    /// Whether the backend accepts a cancel request in this state.
    #[must_use]
    pub fn can_cancel(&self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }

    /// Whether the backend accepts a parameter update in this state.
    #[must_use]
    pub fn can_update_parameters(&self) -> bool {
        matches!(self, Self::Pending | Self::Failed)
    }
}

impl fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimulationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            other => Err(format!("unknown simulation status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Analyst,
    Viewer,
}

impl UserRole {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Admin => "admin",
            Self::Analyst => "analyst",
            Self::Viewer => "viewer",
        };
        f.write_str(s)
    }
}

/// Cohen's d interpretation reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectSize {
    Small,
    Medium,
    Large,
}

impl EffectSize {
    /// Classifies an effect size using the usual 0.5 / 0.8 cut-offs.
    #[must_use]
    pub fn from_cohens_d(d: f64) -> Self {
        let d = d.abs();
        if d < 0.5 {
            Self::Small
        } else if d < 0.8 {
            Self::Medium
        } else {
            Self::Large
        }
    }
}

impl fmt::Display for EffectSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Small => "Small",
            Self::Medium => "Medium",
            Self::Large => "Large",
        };
        f.write_str(s)
    }
}

/// Artifact formats a simulation can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Pre-formatted by the backend.
    Json,
    /// Pre-formatted by the backend.
    Csv,
    /// Assembled client-side.
    Pdf,
    /// One PNG per chart, rendered client-side.
    Images,
}

impl ExportFormat {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Pdf => "pdf",
            Self::Images => "images",
        }
    }

    /// True for formats the backend renders itself.
    #[must_use]
    pub fn is_server_side(&self) -> bool {
        matches!(self, Self::Json | Self::Csv)
    }

    /// File extension for single-file formats.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Pdf => "pdf",
            Self::Images => "png",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "pdf" => Ok(Self::Pdf),
            "images" | "png" => Ok(Self::Images),
            other => Err(format!("unsupported export format: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert!(SimulationStatus::Running.can_cancel());
        assert!(!SimulationStatus::Completed.can_cancel());
        assert!(SimulationStatus::Failed.can_update_parameters());
        assert!(!SimulationStatus::Running.can_update_parameters());
        assert!(SimulationStatus::Canceled.is_terminal());
        assert!(!SimulationStatus::Pending.is_terminal());
    }

    #[test]
    fn test_status_wire_format() {
        let status: SimulationStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, SimulationStatus::Completed);
        assert_eq!(
            serde_json::to_string(&SimulationStatus::Canceled).unwrap(),
            "\"canceled\""
        );
        assert_eq!(
            "CANCELLED".parse::<SimulationStatus>().unwrap(),
            SimulationStatus::Canceled
        );
    }

    #[test]
    fn test_effect_size_cutoffs() {
        assert_eq!(EffectSize::from_cohens_d(0.2), EffectSize::Small);
        assert_eq!(EffectSize::from_cohens_d(-0.6), EffectSize::Medium);
        assert_eq!(EffectSize::from_cohens_d(1.4), EffectSize::Large);
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!("PNG".parse::<ExportFormat>().unwrap(), ExportFormat::Images);
        assert!(ExportFormat::Csv.is_server_side());
        assert!(!ExportFormat::Pdf.is_server_side());
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }
}
