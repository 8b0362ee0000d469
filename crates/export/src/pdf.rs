//! PDF report assembly.
//!
//! Text is laid out top-down on A4 pages with a fixed margin. A new page is
//! started whenever the next line or image would cross the bottom margin.
//! Charts that fail to rasterize are replaced by a placeholder line.

use crate::chart::{ChartRenderer, ChartSpec};
use crate::error::ExportError;
use image::{DynamicImage, RgbImage};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference,
};
use riskdash_domain::entities::{Simulation, SimulationResults};
use tracing::{debug, warn};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const PT_TO_MM: f32 = 0.3528;
const LINE_SPACING: f32 = 1.4;

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 10.0;
/// Characters per body line before wrapping.
const WRAP_AT: usize = 95;

/// A rendered report.
#[derive(Debug, Clone)]
pub struct PdfReport {
    pub bytes: Vec<u8>,
    pub pages: usize,
    pub charts_embedded: usize,
    /// Placeholder lines written for charts that could not be drawn.
    pub placeholders: Vec<String>,
}

/// Placeholder written in place of a chart that failed to rasterize.
#[must_use]
pub fn chart_placeholder(title: &str) -> String {
    format!("[chart unavailable: {title}]")
}

/// Builds the report for `simulation` with its `results` and `charts`.
///
/// # Errors
/// Returns an error if the document itself cannot be created or serialized.
/// Individual chart failures never abort the report.
pub fn render_pdf(
    simulation: &Simulation,
    results: &SimulationResults,
    charts: &[ChartSpec],
    renderer: &ChartRenderer,
) -> Result<PdfReport, ExportError> {
    let mut writer = PageWriter::new(&format!("Simulation report: {}", simulation.name))?;

    writer.line("Systemic Risk Simulation Report", TITLE_SIZE, true);
    writer.gap(2.0);
    writer.line(&format!("Simulation: {}", simulation.name), BODY_SIZE, false);
    if let Some(description) = simulation.description.as_deref().filter(|d| !d.is_empty()) {
        writer.paragraph(&format!("Description: {description}"));
    }
    writer.line(&format!("Status: {}", simulation.status), BODY_SIZE, false);
    if let Some(created) = simulation.created_at {
        writer.line(
            &format!("Created: {}", created.format("%Y-%m-%d %H:%M")),
            BODY_SIZE,
            false,
        );
    }

    writer.heading("Parameters");
    for (name, value) in simulation.parameters.entries() {
        writer.line(&format!("{name}: {value}"), BODY_SIZE, false);
    }

    let trad = &results.traditional_summary;
    let bc = &results.blockchain_summary;
    let imp = &results.improvements;
    writer.heading("Results");
    writer.line(
        &format!(
            "Average failures: traditional {:.2}, blockchain {:.2} ({:.1}% improvement)",
            trad.average_failures, bc.average_failures, imp.average_failures
        ),
        BODY_SIZE,
        false,
    );
    writer.line(
        &format!(
            "Maximum failures: traditional {}, blockchain {} ({} fewer)",
            trad.max_failures, bc.max_failures, imp.max_failures
        ),
        BODY_SIZE,
        false,
    );
    writer.line(
        &format!(
            "Std dev of failures: traditional {:.2}, blockchain {:.2} ({:.1}% improvement)",
            trad.std_dev_failures, bc.std_dev_failures, imp.std_dev_failures
        ),
        BODY_SIZE,
        false,
    );
    writer.line(
        &format!(
            "Probability of systemic event: traditional {:.2}%, blockchain {:.2}% ({:.1}% improvement)",
            trad.probability_systemic_event * 100.0,
            bc.probability_systemic_event * 100.0,
            imp.probability_systemic_event
        ),
        BODY_SIZE,
        false,
    );

    let stats = &results.statistical_analysis;
    writer.heading("Statistical analysis");
    writer.line(&format!("t-statistic: {:.4}", stats.t_stat), BODY_SIZE, false);
    writer.line(&format!("p-value: {:.6}", stats.p_value), BODY_SIZE, false);
    writer.line(
        &format!(
            "Statistically significant: {}",
            if stats.is_significant() { "yes" } else { "no" }
        ),
        BODY_SIZE,
        false,
    );
    writer.line(
        &format!("Effect size (Cohen's d): {:.3} ({:?})", stats.cohens_d, stats.effect),
        BODY_SIZE,
        false,
    );

    if !charts.is_empty() {
        writer.heading("Charts");
    }
    let mut charts_embedded = 0;
    let mut placeholders = Vec::new();
    for chart in charts {
        match renderer.render(chart) {
            Ok(bitmap) => {
                writer.line(&chart.title, BODY_SIZE, true);
                writer.image(bitmap);
                charts_embedded += 1;
            }
            Err(e) => {
                warn!(chart = %chart.title, error = %e, "Chart could not be rasterized, using placeholder");
                let placeholder = chart_placeholder(&chart.title);
                writer.line(&placeholder, BODY_SIZE, false);
                placeholders.push(placeholder);
            }
        }
    }

    let pages = writer.pages;
    let bytes = writer.finish()?;
    debug!(pages, charts_embedded, bytes = bytes.len(), "PDF report rendered");
    Ok(PdfReport {
        bytes,
        pages,
        charts_embedded,
        placeholders,
    })
}

/// Cursor over the pages of one document.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Baseline of the next element, in mm from the bottom edge.
    y: f32,
    pages: usize,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self, ExportError> {
        let (doc, page, layer) =
            PdfDocument::new(ascii(title), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Pdf(format!("{e:?}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ExportError::Pdf(format!("{e:?}")))?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
            pages: 1,
        })
    }

    fn line_height(size: f32) -> f32 {
        size * PT_TO_MM * LINE_SPACING
    }

    /// Starts a new page unless `height` mm still fit above the bottom margin.
    fn reserve(&mut self, height: f32) {
        if self.y - height < MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
            self.pages += 1;
        }
    }

    fn line(&mut self, text: &str, size: f32, bold: bool) {
        let height = Self::line_height(size);
        self.reserve(height);
        self.y -= height;
        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(ascii(text), size, Mm(MARGIN), Mm(self.y), font);
    }

    fn paragraph(&mut self, text: &str) {
        for line in wrap(text, WRAP_AT) {
            self.line(&line, BODY_SIZE, false);
        }
    }

    fn heading(&mut self, text: &str) {
        self.gap(3.0);
        self.line(text, HEADING_SIZE, true);
        self.gap(1.0);
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }

    /// Places `bitmap` at full content width, shrunk to fit one page if needed.
    fn image(&mut self, bitmap: RgbImage) {
        let content_w = PAGE_WIDTH - 2.0 * MARGIN;
        let content_h = PAGE_HEIGHT - 2.0 * MARGIN;
        let (px_w, px_h) = (bitmap.width() as f32, bitmap.height() as f32);

        // Image size in mm is pixels / dpi * 25.4.
        let mut dpi = px_w * 25.4 / content_w;
        if px_h * 25.4 / dpi > content_h {
            dpi = px_h * 25.4 / content_h;
        }
        let height = px_h * 25.4 / dpi;

        self.reserve(height);
        self.y -= height;
        Image::from_dynamic_image(&DynamicImage::ImageRgb8(bitmap)).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN)),
                translate_y: Some(Mm(self.y)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
        self.gap(2.0);
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        self.doc
            .save_to_bytes()
            .map_err(|e| ExportError::Pdf(format!("{e:?}")))
    }
}

/// Builtin PDF fonts only cover Latin-1; anything outside ASCII becomes `?`.
fn ascii(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartKind;
    use crate::fixtures;

    fn empty_chart(title: &str) -> ChartSpec {
        ChartSpec {
            kind: ChartKind::BankFailureFrequency,
            title: title.to_string(),
            categories: Vec::new(),
            series: Vec::new(),
        }
    }

    #[test]
    fn test_report_embeds_charts() {
        let results = fixtures::results();
        let charts = ChartSpec::standard_set(&results);
        let report = render_pdf(
            &fixtures::simulation("Baseline"),
            &results,
            &charts,
            &ChartRenderer::default(),
        )
        .unwrap();

        assert!(report.bytes.starts_with(b"%PDF"));
        assert_eq!(report.charts_embedded, 3);
        assert!(report.placeholders.is_empty());
        // Three full-width charts do not fit under the text on one page.
        assert!(report.pages >= 2);
    }

    #[test]
    fn test_failed_chart_becomes_placeholder() {
        let results = fixtures::results();
        let charts = vec![
            empty_chart("Bank Failure Frequency"),
            ChartSpec::systemic_probability(&results),
        ];
        let report = render_pdf(
            &fixtures::simulation("Baseline"),
            &results,
            &charts,
            &ChartRenderer::default(),
        )
        .unwrap();

        assert_eq!(report.charts_embedded, 1);
        assert_eq!(
            report.placeholders,
            vec!["[chart unavailable: Bank Failure Frequency]".to_string()]
        );
    }

    #[test]
    fn test_text_only_report_fits_one_page() {
        let report = render_pdf(
            &fixtures::simulation("Baseline"),
            &fixtures::results(),
            &[],
            &ChartRenderer::default(),
        )
        .unwrap();
        assert_eq!(report.pages, 1);
    }

    #[test]
    fn test_wrap_and_ascii() {
        assert_eq!(wrap("aa bb cc", 5), vec!["aa bb", "cc"]);
        assert!(wrap("   ", 10).is_empty());
        assert_eq!(ascii("\u{2265}3 banks"), "?3 banks");
    }
}
