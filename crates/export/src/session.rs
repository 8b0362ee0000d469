//! Export state tracking.

use crate::chart::{ChartRenderer, ChartSpec};
use crate::download::{download_filename, save_download};
use crate::error::ExportError;
use crate::images::{self, ChartOutcome};
use crate::pdf::render_pdf;
use riskdash_client::services::SimulationService;
use riskdash_domain::entities::{Simulation, SimulationResults};
use riskdash_domain::enums::ExportFormat;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// Tracks whether an export is running and the last failure.
///
/// Every export clears the previous error before it starts. Failures are
/// recorded and returned; nothing is retried.
#[derive(Debug, Default)]
pub struct ExportSession {
    renderer: ChartRenderer,
    exporting: bool,
    error: Option<String>,
}

impl ExportSession {
    /// Creates a new session rendering charts with `renderer`.
    #[must_use]
    pub fn new(renderer: ChartRenderer) -> Self {
        Self {
            renderer,
            exporting: false,
            error: None,
        }
    }

    #[must_use]
    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    /// Message of the last failed export, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    #[must_use]
    pub fn renderer(&self) -> &ChartRenderer {
        &self.renderer
    }

    /// Downloads the backend's JSON or CSV export and saves it in `dir`.
    ///
    /// # Errors
    /// Returns an error for formats the backend does not serve, or if the
    /// download or write fails.
    pub async fn export_data(
        &mut self,
        simulations: &SimulationService,
        simulation_id: Uuid,
        format: ExportFormat,
        dir: &Path,
    ) -> Result<PathBuf, ExportError> {
        self.begin();
        let result = async {
            let bytes = simulations.export(simulation_id, format).await?;
            save_download(dir, &download_filename(simulation_id, format), &bytes)
        }
        .await;
        self.finish(result)
    }

    /// Renders the PDF report and saves it as `simulation_{id}.pdf` in `dir`.
    ///
    /// # Errors
    /// Returns an error if the document cannot be built or written. Charts
    /// that fail to render become placeholders instead.
    pub fn export_pdf(
        &mut self,
        simulation: &Simulation,
        results: &SimulationResults,
        charts: &[ChartSpec],
        dir: &Path,
    ) -> Result<PathBuf, ExportError> {
        self.begin();
        let result = render_pdf(simulation, results, charts, &self.renderer).and_then(|report| {
            if !report.placeholders.is_empty() {
                warn!(
                    simulation_id = %simulation.id,
                    missing = report.placeholders.len(),
                    "PDF written with chart placeholders"
                );
            }
            save_download(
                dir,
                &download_filename(simulation.id, ExportFormat::Pdf),
                &report.bytes,
            )
        });
        self.finish(result)
    }

    /// Writes one PNG per chart into `dir`.
    ///
    /// The session error records the first failed chart; the other charts
    /// are still written.
    pub fn export_images(&mut self, charts: &[ChartSpec], dir: &Path) -> Vec<ChartOutcome> {
        self.begin();
        let outcomes = images::export_images(charts, &self.renderer, dir);
        self.exporting = false;
        if let Some((title, e)) = outcomes
            .iter()
            .find_map(|o| o.result.as_ref().err().map(|e| (&o.title, e)))
        {
            self.error = Some(format!("{title}: {e}"));
        }
        info!(
            written = outcomes.iter().filter(|o| o.is_ok()).count(),
            total = outcomes.len(),
            "Chart images exported"
        );
        outcomes
    }

    fn begin(&mut self) {
        self.error = None;
        self.exporting = true;
    }

    fn finish<T>(&mut self, result: Result<T, ExportError>) -> Result<T, ExportError> {
        self.exporting = false;
        if let Err(e) = &result {
            warn!(error = %e, "Export failed");
            self.error = Some(e.to_string());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartKind;
    use crate::fixtures;
    use riskdash_client::{ApiClient, ClientConfig, MemoryTokenStore};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn offline_simulations() -> SimulationService {
        // Nothing listens here; only checks that run before a request can pass.
        ApiClient::new(
            ClientConfig::new("http://127.0.0.1:9"),
            Arc::new(MemoryTokenStore::new()),
        )
        .unwrap()
        .simulations()
    }

    #[tokio::test]
    async fn test_pdf_is_not_a_server_format() {
        let dir = TempDir::new().unwrap();
        let mut session = ExportSession::default();
        let err = session
            .export_data(&offline_simulations(), Uuid::new_v4(), ExportFormat::Pdf, dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Api(_)));
        assert_eq!(session.error(), Some("Unsupported export format: pdf"));
        assert!(!session.is_exporting());
    }

    #[test]
    fn test_pdf_export_writes_file_and_clears_old_error() {
        let dir = TempDir::new().unwrap();
        let mut session = ExportSession::new(ChartRenderer::new(400, 240));
        session.error = Some("previous failure".into());

        let results = fixtures::results();
        let simulation = fixtures::simulation("Baseline");
        let path = session
            .export_pdf(&simulation, &results, &ChartSpec::standard_set(&results), dir.path())
            .unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            format!("simulation_{}.pdf", simulation.id)
        );
        assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
        assert_eq!(session.error(), None);
    }

    #[test]
    fn test_image_failure_is_recorded() {
        let dir = TempDir::new().unwrap();
        let mut session = ExportSession::new(ChartRenderer::new(400, 240));
        let results = fixtures::results();
        let charts = vec![
            ChartSpec {
                kind: ChartKind::FailureDistribution,
                title: "Distribution of Bank Failures".into(),
                categories: Vec::new(),
                series: Vec::new(),
            },
            ChartSpec::systemic_probability(&results),
        ];

        let outcomes = session.export_images(&charts, dir.path());
        assert!(!outcomes[0].is_ok());
        assert!(outcomes[1].is_ok());
        assert_eq!(
            session.error(),
            Some("Distribution of Bank Failures: Chart 'Distribution of Bank Failures' has no data")
        );

        session.clear_error();
        assert_eq!(session.error(), None);
    }
}
