//! Bar chart specs and rasterization.

use crate::error::ExportError;
use image::{Rgb, RgbImage};
use riskdash_domain::entities::SimulationResults;
use std::collections::BTreeSet;

/// Traditional scenario colour.
pub const TRADITIONAL_COLOR: Rgb<u8> = Rgb([0x1f, 0x77, 0xb4]);
/// Blockchain scenario colour.
pub const BLOCKCHAIN_COLOR: Rgb<u8> = Rgb([0xff, 0x7f, 0x0e]);

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([64, 64, 64]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);

/// What a chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Share of runs per number of failed banks.
    FailureDistribution,
    /// Share of runs in which each bank failed.
    BankFailureFrequency,
    /// Probability of a systemic event per scenario.
    SystemicProbability,
}

/// One coloured series of bars.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub color: Rgb<u8>,
    /// One value per category.
    pub values: Vec<f64>,
}

/// A grouped bar chart: one group per category, one bar per series.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

impl ChartSpec {
    /// Failure-count distribution, traditional vs blockchain.
    #[must_use]
    pub fn failure_distribution(results: &SimulationResults) -> Self {
        let trad = results.traditional_summary.distribution_points();
        let bc = results.blockchain_summary.distribution_points();
        let counts: BTreeSet<u32> = trad.iter().chain(bc.iter()).map(|(k, _)| *k).collect();
        Self {
            kind: ChartKind::FailureDistribution,
            title: "Distribution of Bank Failures".to_string(),
            categories: counts.iter().map(u32::to_string).collect(),
            series: vec![
                Series::aligned("Traditional", TRADITIONAL_COLOR, &counts, &trad),
                Series::aligned("Blockchain", BLOCKCHAIN_COLOR, &counts, &bc),
            ],
        }
    }

    /// Per-bank failure frequency, labelled with bank names when known.
    #[must_use]
    pub fn bank_failure_frequency(results: &SimulationResults) -> Self {
        let trad = results.traditional_summary.bank_failure_points();
        let bc = results.blockchain_summary.bank_failure_points();
        let banks: BTreeSet<u32> = trad.iter().chain(bc.iter()).map(|(k, _)| *k).collect();
        Self {
            kind: ChartKind::BankFailureFrequency,
            title: "Bank Failure Frequency".to_string(),
            categories: banks
                .iter()
                .map(|i| {
                    results
                        .bank_name(*i)
                        .map_or_else(|| format!("Bank {i}"), str::to_string)
                })
                .collect(),
            series: vec![
                Series::aligned("Traditional", TRADITIONAL_COLOR, &banks, &trad),
                Series::aligned("Blockchain", BLOCKCHAIN_COLOR, &banks, &bc),
            ],
        }
    }

    /// Systemic event probability in percent for both scenarios.
    #[must_use]
    pub fn systemic_probability(results: &SimulationResults) -> Self {
        Self {
            kind: ChartKind::SystemicProbability,
            title: "Probability of Systemic Event".to_string(),
            categories: vec!["Systemic event".to_string()],
            series: vec![
                Series {
                    label: "Traditional".to_string(),
                    color: TRADITIONAL_COLOR,
                    values: vec![results.traditional_summary.probability_systemic_event * 100.0],
                },
                Series {
                    label: "Blockchain".to_string(),
                    color: BLOCKCHAIN_COLOR,
                    values: vec![results.blockchain_summary.probability_systemic_event * 100.0],
                },
            ],
        }
    }

    /// The charts shown on the results page.
    #[must_use]
    pub fn standard_set(results: &SimulationResults) -> Vec<Self> {
        vec![
            Self::failure_distribution(results),
            Self::bank_failure_frequency(results),
            Self::systemic_probability(results),
        ]
    }

    /// No category has a value in any series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() || self.series.iter().all(|s| s.values.is_empty())
    }

    /// Lowercase file-name fragment derived from the title.
    #[must_use]
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.title.len());
        for c in self.title.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('_') {
                slug.push('_');
            }
        }
        let slug = slug.trim_end_matches('_');
        if slug.is_empty() {
            "chart".to_string()
        } else {
            slug.to_string()
        }
    }

    fn max_value(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }
}

impl Series {
    fn aligned(label: &str, color: Rgb<u8>, keys: &BTreeSet<u32>, points: &[(u32, f64)]) -> Self {
        let values = keys
            .iter()
            .map(|k| {
                points
                    .iter()
                    .find(|(pk, _)| pk == k)
                    .map_or(0.0, |(_, v)| *v)
            })
            .collect();
        Self {
            label: label.to_string(),
            color,
            values,
        }
    }
}

/// Rasterizes [`ChartSpec`]s into bitmaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartRenderer {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Blank border around the plot area in pixels.
    pub margin: u32,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self {
            width: 800,
            height: 450,
            margin: 40,
        }
    }
}

impl ChartRenderer {
    /// Creates a new renderer with the given size and a default margin.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Draws `spec` as a grouped bar chart.
    ///
    /// # Errors
    /// Returns [`ExportError::EmptyChart`] when there is nothing to draw and
    /// [`ExportError::Render`] when the image is too small for a plot area.
    pub fn render(&self, spec: &ChartSpec) -> Result<RgbImage, ExportError> {
        if spec.is_empty() {
            return Err(ExportError::EmptyChart(spec.title.clone()));
        }
        let plot_w = self.width.saturating_sub(2 * self.margin);
        let plot_h = self.height.saturating_sub(2 * self.margin);
        if plot_w < spec.categories.len() as u32 || plot_h < 10 {
            return Err(ExportError::Render(format!(
                "{}x{} leaves no room for {} categories",
                self.width,
                self.height,
                spec.categories.len()
            )));
        }

        let mut img = RgbImage::from_pixel(self.width, self.height, BACKGROUND);
        let left = self.margin;
        let bottom = self.height - self.margin;
        let top = self.margin;

        for step in 1..=4 {
            let y = bottom - plot_h * step / 4;
            fill_rect(&mut img, left, y, plot_w, 1, GRID);
        }

        let max = match spec.max_value() {
            m if m > 0.0 => m,
            _ => 1.0,
        };
        let groups = spec.categories.len() as u32;
        let group_w = plot_w / groups;
        let bars = spec.series.len().max(1) as u32;
        let bar_w = (group_w * 4 / 5 / bars).max(1);
        let pad = group_w.saturating_sub(bar_w * bars) / 2;

        for (g, _) in spec.categories.iter().enumerate() {
            let group_x = left + group_w * g as u32 + pad;
            for (s, series) in spec.series.iter().enumerate() {
                let value = series.values.get(g).copied().unwrap_or(0.0);
                if !value.is_finite() || value <= 0.0 {
                    continue;
                }
                let h = ((value / max) * f64::from(plot_h)).round() as u32;
                let h = h.clamp(1, plot_h);
                fill_rect(&mut img, group_x + bar_w * s as u32, bottom - h, bar_w, h, series.color);
            }
        }

        fill_rect(&mut img, left, top, 1, plot_h, AXIS);
        fill_rect(&mut img, left, bottom, plot_w, 1, AXIS);

        // Legend swatches, right-aligned above the plot.
        let swatch = (self.margin / 3).max(4);
        for (s, series) in spec.series.iter().enumerate() {
            let x = (left + plot_w).saturating_sub((s as u32 + 1) * swatch * 2);
            fill_rect(&mut img, x, top.saturating_sub(swatch + 4), swatch, swatch, series.color);
        }

        Ok(img)
    }
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let x_end = x.saturating_add(w).min(img.width());
    let y_end = y.saturating_add(h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_distribution_aligns_missing_counts() {
        let spec = ChartSpec::failure_distribution(&fixtures::results());
        assert_eq!(spec.categories, vec!["0", "1", "2", "10"]);
        assert_eq!(spec.series[1].values, vec![65.0, 25.0, 10.0, 0.0]);
    }

    #[test]
    fn test_bank_categories_use_names() {
        let spec = ChartSpec::bank_failure_frequency(&fixtures::results());
        assert_eq!(spec.categories[1], "BNP Paribas");
        assert_eq!(spec.series[0].values[1], 30.5);

        let mut results = fixtures::results();
        results.raw_data = None;
        let spec = ChartSpec::bank_failure_frequency(&results);
        assert_eq!(spec.categories[2], "Bank 2");
    }

    #[test]
    fn test_slug() {
        let spec = ChartSpec::systemic_probability(&fixtures::results());
        assert_eq!(spec.slug(), "probability_of_systemic_event");
        let spec = ChartSpec {
            title: "  ≥3 failures! ".into(),
            ..spec
        };
        assert_eq!(spec.slug(), "3_failures");
    }

    #[test]
    fn test_render_draws_series_colours() {
        let renderer = ChartRenderer::default();
        let spec = ChartSpec::systemic_probability(&fixtures::results());
        let img = renderer.render(&spec).unwrap();
        assert_eq!(img.dimensions(), (800, 450));

        let has = |color: Rgb<u8>| img.pixels().any(|p| *p == color);
        assert!(has(TRADITIONAL_COLOR));
        assert!(has(BLOCKCHAIN_COLOR));
        // Tallest bar reaches the top of the plot area.
        let top_row = renderer.margin;
        assert!((0..img.width()).any(|x| *img.get_pixel(x, top_row) == TRADITIONAL_COLOR));
    }

    #[test]
    fn test_empty_chart_is_an_error() {
        let spec = ChartSpec {
            kind: ChartKind::FailureDistribution,
            title: "Empty".into(),
            categories: Vec::new(),
            series: Vec::new(),
        };
        let err = ChartRenderer::default().render(&spec).unwrap_err();
        assert!(matches!(err, ExportError::EmptyChart(ref t) if t == "Empty"));
    }

    #[test]
    fn test_tiny_canvas_is_an_error() {
        let spec = ChartSpec::failure_distribution(&fixtures::results());
        let err = ChartRenderer::new(60, 60).render(&spec).unwrap_err();
        assert!(matches!(err, ExportError::Render(_)));
    }
}
