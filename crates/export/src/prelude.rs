//! Prelude module for convenient imports.

pub use crate::chart::{ChartKind, ChartRenderer, ChartSpec, Series};
pub use crate::csv_export::results_to_csv;
pub use crate::download::{download_filename, save_download};
pub use crate::error::ExportError;
pub use crate::images::{ChartOutcome, export_images};
pub use crate::pdf::{PdfReport, render_pdf};
pub use crate::session::ExportSession;
