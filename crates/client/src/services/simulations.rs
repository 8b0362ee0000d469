//! Simulation endpoints.

use super::banks::cache_mismatch;
use crate::error::ApiError;
use crate::http::{Auth, HttpClient, send_bytes, send_empty, send_json};
use reqwest::Method;
use riskdash_cache::keys;
use riskdash_cache::{DomainCaches, SimulationEntry};
use riskdash_domain::ValidationError;
use riskdash_domain::entities::{
    NewSimulation, ShareLink, ShareRequest, SharedSimulation, Simulation, SimulationResults,
    SimulationStatusReport,
};
use riskdash_domain::enums::ExportFormat;
use riskdash_domain::value_objects::{
    ListQuery, ParameterUpdate, SimulationComparison, SimulationHistory, SimulationPage,
    SimulationParameters,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Deserialize)]
struct SimulationBody {
    simulation: Simulation,
}

#[derive(Deserialize)]
struct ResultsBody {
    results: SimulationResults,
}

#[derive(Deserialize)]
struct ShareBody {
    #[serde(alias = "share")]
    share_link: ShareLink,
}

/// Service for `/api/simulations`.
#[derive(Clone)]
pub struct SimulationService {
    http: HttpClient,
    caches: Arc<DomainCaches>,
}

impl SimulationService {
    /// Creates a new SimulationService.
    pub(crate) fn new(http: HttpClient, caches: Arc<DomainCaches>) -> Self {
        Self { http, caches }
    }

    /// One page of the caller's simulations.
    ///
    /// # Errors
    /// Returns the backend's error; failures are not cached.
    pub async fn list(&self, query: &ListQuery) -> Result<SimulationPage, ApiError> {
        let key = keys::simulation_list(query);
        let entry = self
            .caches
            .simulations
            .get_or_set(&key, self.caches.simulations_ttl(), || async {
                let request = self.http.get("/api/simulations").query(&query.to_pairs());
                let page: SimulationPage = send_json(request).await?;
                Ok::<_, ApiError>(SimulationEntry::Page(page))
            })
            .await?;
        match entry {
            SimulationEntry::Page(page) => Ok(page),
            _ => Err(cache_mismatch(&key)),
        }
    }

    /// A single simulation.
    ///
    /// # Errors
    /// Returns [`ApiError::NotFound`] or [`ApiError::Forbidden`] from the backend.
    pub async fn get(&self, id: Uuid) -> Result<Simulation, ApiError> {
        let key = keys::simulation(id);
        let entry = self
            .caches
            .simulations
            .get_or_set(&key, self.caches.simulations_ttl(), || async {
                let body: SimulationBody =
                    send_json(self.http.get(&format!("/api/simulations/{id}"))).await?;
                Ok::<_, ApiError>(SimulationEntry::Simulation(body.simulation))
            })
            .await?;
        match entry {
            SimulationEntry::Simulation(simulation) => Ok(simulation),
            _ => Err(cache_mismatch(&key)),
        }
    }

    /// Live status and progress. Never cached.
    ///
    /// # Errors
    /// Returns the backend's error.
    pub async fn status(&self, id: Uuid) -> Result<SimulationStatusReport, ApiError> {
        send_json(self.http.get(&format!("/api/simulations/{id}/status"))).await
    }

    /// Results of a completed simulation, optionally with per-run raw data.
    ///
    /// # Errors
    /// Returns [`ApiError::BadRequest`] while the simulation is not completed.
    pub async fn results(&self, id: Uuid, include_raw: bool) -> Result<SimulationResults, ApiError> {
        let key = keys::simulation_results(id, include_raw);
        let entry = self
            .caches
            .simulations
            .get_or_set(&key, self.caches.simulations_ttl(), || async {
                let request = self
                    .http
                    .get(&format!("/api/simulations/{id}/results"))
                    .query(&[("include_raw_data", include_raw.to_string())]);
                let body: ResultsBody = send_json(request).await?;
                Ok::<_, ApiError>(SimulationEntry::Results(Box::new(body.results)))
            })
            .await?;
        match entry {
            SimulationEntry::Results(results) => Ok(*results),
            _ => Err(cache_mismatch(&key)),
        }
    }

    /// Queues a new simulation.
    ///
    /// # Errors
    /// Returns a validation error before sending, or the backend's rejection.
    pub async fn create(&self, new: &NewSimulation) -> Result<Simulation, ApiError> {
        new.validate()?;
        let request = self.http.post("/api/simulations").json(new);
        let body: SimulationBody = send_json(request).await?;
        self.invalidate_lists();
        info!(simulation_id = %body.simulation.id, name = %body.simulation.name, "Simulation created");
        Ok(body.simulation)
    }

    /// Replaces some parameters and requeues the run.
    ///
    /// Only pending or failed simulations accept new parameters.
    ///
    /// # Errors
    /// Returns a validation error for out-of-range values, or the backend's
    /// rejection.
    pub async fn update_parameters(
        &self,
        id: Uuid,
        update: &ParameterUpdate,
    ) -> Result<Simulation, ApiError> {
        update.apply_to(&SimulationParameters::default()).validate()?;
        let request = self
            .http
            .put(&format!("/api/simulations/{id}/parameters"))
            .json(update);
        let body: SimulationBody = send_json(request).await?;
        self.invalidate(id);
        info!(simulation_id = %id, "Simulation parameters updated");
        Ok(body.simulation)
    }

    /// Cancels a pending or running simulation.
    ///
    /// # Errors
    /// Returns [`ApiError::BadRequest`] when the run already finished.
    pub async fn cancel(&self, id: Uuid) -> Result<Simulation, ApiError> {
        let body: SimulationBody =
            send_json(self.http.post(&format!("/api/simulations/{id}/cancel"))).await?;
        self.invalidate(id);
        info!(simulation_id = %id, "Simulation canceled");
        Ok(body.simulation)
    }

    /// Requeues a simulation from scratch.
    ///
    /// # Errors
    /// Returns the backend's error.
    pub async fn restart(&self, id: Uuid) -> Result<Simulation, ApiError> {
        let body: SimulationBody =
            send_json(self.http.post(&format!("/api/simulations/{id}/restart"))).await?;
        self.invalidate(id);
        info!(simulation_id = %id, "Simulation restarted");
        Ok(body.simulation)
    }

    /// Deletes a simulation and its results.
    ///
    /// # Errors
    /// Returns the backend's error.
    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        send_empty(self.http.delete(&format!("/api/simulations/{id}"))).await?;
        self.invalidate(id);
        info!(simulation_id = %id, "Simulation deleted");
        Ok(())
    }

    /// Side-by-side results of completed simulations.
    ///
    /// # Errors
    /// Returns a validation error for an empty id list, or the backend's error
    /// if any simulation is missing or not completed.
    pub async fn compare(&self, ids: &[Uuid]) -> Result<SimulationComparison, ApiError> {
        if ids.is_empty() {
            return Err(ValidationError::new("ids", "No simulation IDs provided").into());
        }
        let pairs: Vec<(&str, String)> = ids.iter().map(|id| ("ids", id.to_string())).collect();
        let request = self.http.get("/api/simulations/compare").query(&pairs);
        send_json(request).await
    }

    /// Completed simulations of the last `days` days with headline metrics.
    ///
    /// # Errors
    /// Returns a validation error for `days == 0`, or the backend's error.
    pub async fn history(&self, days: u32) -> Result<SimulationHistory, ApiError> {
        if days == 0 {
            return Err(ValidationError::new("days", "days must be at least 1").into());
        }
        let request = self
            .http
            .get("/api/simulations/history")
            .query(&[("days", days)]);
        send_json(request).await
    }

    /// Results as rendered by the backend. Only JSON and CSV are server-side.
    ///
    /// # Errors
    /// Returns a validation error for client-side formats, or the backend's
    /// error.
    pub async fn export(&self, id: Uuid, format: ExportFormat) -> Result<Vec<u8>, ApiError> {
        if !format.is_server_side() {
            return Err(ValidationError::new(
                "format",
                format!("Unsupported export format: {}", format.as_str()),
            )
            .into());
        }
        let request = self
            .http
            .get(&format!("/api/simulations/{id}/export"))
            .query(&[("format", format.as_str())]);
        let bytes = send_bytes(request).await?;
        debug!(simulation_id = %id, format = format.as_str(), bytes = bytes.len(), "Export downloaded");
        Ok(bytes)
    }

    /// Creates a share link for a simulation's results.
    ///
    /// # Errors
    /// Returns the backend's error.
    pub async fn share(&self, id: Uuid, request: &ShareRequest) -> Result<ShareLink, ApiError> {
        let builder = self
            .http
            .post(&format!("/api/simulations/{id}/share"))
            .json(request);
        let mut link = send_json::<ShareBody>(builder).await?.share_link;
        if link.url.is_none() {
            let url = self.http.segments_url(&["shared", &link.token])?;
            link.url = Some(url.to_string());
        }
        info!(simulation_id = %id, expires_at = ?link.expires_at, "Share link created");
        Ok(link)
    }

    /// The public view behind a share token. No sign-in needed.
    ///
    /// # Errors
    /// Returns [`ApiError::NotFound`] for an unknown token, or
    /// [`ApiError::Unauthorized`] for a wrong password.
    pub async fn shared(
        &self,
        token: &str,
        password: Option<&str>,
    ) -> Result<SharedSimulation, ApiError> {
        let mut request = self.http.request_segments(
            Method::GET,
            &["api", "simulations", "share", token],
            Auth::None,
        )?;
        if let Some(password) = password {
            request = request.query(&[("password", password)]);
        }
        send_json(request).await
    }

    fn invalidate_lists(&self) {
        if let Some(pattern) = keys::simulation_lists() {
            let removed = self.caches.simulations.invalidate_pattern(&pattern);
            debug!(removed, "Simulation list cache invalidated");
        }
    }

    fn invalidate(&self, id: Uuid) {
        self.invalidate_lists();
        if let Some(pattern) = keys::simulation_scope(id) {
            let removed = self.caches.simulations.invalidate_pattern(&pattern);
            debug!(simulation_id = %id, removed, "Simulation cache invalidated");
        }
    }
}
