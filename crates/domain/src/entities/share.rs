use crate::entities::results::SimulationResults;
use crate::value_objects::parameters::SimulationParameters;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A public link to a simulation's results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareLink {
    pub token: String,
    /// Dashboard URL of the shared view (`/shared/{token}`).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub expires_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub password_protected: bool,
}

impl ShareLink {
    /// Link is past its expiry at `now`. Links without an expiry never expire.
    #[must_use]
    pub fn is_expired_at(&self, now: NaiveDateTime) -> bool {
        self.expires_at.is_some_and(|expires| expires < now)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShareRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// The limited simulation view exposed through a share link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedSimulationSummary {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    pub parameters: SimulationParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedSimulation {
    pub simulation: SharedSimulationSummary,
    pub results: SimulationResults,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_expiry() {
        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();
        let mut link = ShareLink {
            token: "abc".into(),
            url: None,
            expires_at: None,
            password_protected: false,
        };
        assert!(!link.is_expired_at(now));
        link.expires_at = Some(now - chrono::Duration::hours(1));
        assert!(link.is_expired_at(now));
    }

    #[test]
    fn test_share_request_omits_empty_fields() {
        let body = serde_json::to_value(ShareRequest {
            expires_in_days: Some(7),
            password: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "expires_in_days": 7 }));
    }
}
