//! Export errors.

use riskdash_client::ApiError;
use thiserror::Error;

/// Errors from producing an export artifact.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Fetching a server-side export failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The chart has nothing to draw.
    #[error("Chart '{0}' has no data")]
    EmptyChart(String),

    /// The chart could not be drawn or encoded.
    #[error("Chart rendering failed: {0}")]
    Render(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF error: {0}")]
    Pdf(String),
}
