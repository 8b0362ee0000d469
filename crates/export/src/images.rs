//! PNG export of charts.

use crate::chart::{ChartRenderer, ChartSpec};
use crate::error::ExportError;
use image::ImageFormat;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of exporting one chart.
#[derive(Debug)]
pub struct ChartOutcome {
    pub title: String,
    pub result: Result<PathBuf, ExportError>,
}

impl ChartOutcome {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Writes each chart to `dir/chart_{n}_{slug}.png`, numbering from 1.
///
/// Charts are independent: a chart that fails to render or save is reported
/// in its outcome and the remaining charts are still written.
pub fn export_images(
    charts: &[ChartSpec],
    renderer: &ChartRenderer,
    dir: &Path,
) -> Vec<ChartOutcome> {
    if let Err(e) = fs::create_dir_all(dir) {
        warn!(dir = %dir.display(), error = %e, "Cannot create image directory");
    }

    charts
        .iter()
        .enumerate()
        .map(|(i, chart)| {
            let path = dir.join(format!("chart_{}_{}.png", i + 1, chart.slug()));
            let result = renderer.render(chart).and_then(|img| {
                img.save_with_format(&path, ImageFormat::Png)?;
                Ok(path)
            });
            match &result {
                Ok(path) => info!(chart = %chart.title, path = %path.display(), "Chart saved"),
                Err(e) => warn!(chart = %chart.title, error = %e, "Chart export failed"),
            }
            ChartOutcome {
                title: chart.title.clone(),
                result,
            }
        })
        .collect()
}
