//! Evaluation-curve rendering from precomputed CSV summaries.
//!
//! Each summary CSV holds one row per predicted timestep and one column per
//! model variant; the renderer draws PSNR and SSIM panels side by side.

use plotters::prelude::*;
use serde::Deserialize;
use std::error::Error;
use std::path::Path;

/// First predicted timestep in the summaries (the context frames before it
/// are not evaluated).
pub const PREDICTION_START: usize = 4;

/// One per-timestep row of a metric summary.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricRow {
    pub baseline: f64,
    pub use_haptic: f64,
    pub use_haptic_audio: f64,
    pub use_haptic_audio_vibro: f64,
}

/// Legend labels, in the same order as [`MetricRow::values`].
pub const VARIANT_LABELS: [&str; 4] = [
    "Finn et al.",
    "vision+haptic",
    "vision+haptic+audio",
    "vision+haptic+audio+vibro",
];

impl MetricRow {
    pub fn values(&self) -> [f64; 4] {
        [
            self.baseline,
            self.use_haptic,
            self.use_haptic_audio,
            self.use_haptic_audio_vibro,
        ]
    }
}

/// A named metric (e.g. PSNR) over the predicted timesteps.
#[derive(Debug, Clone)]
pub struct MetricSummary {
    pub name: String,
    pub rows: Vec<MetricRow>,
}

impl MetricSummary {
    pub fn from_csv(name: &str, path: &Path) -> anyhow::Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| anyhow::anyhow!("failed to open {}: {e}", path.display()))?;
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<MetricRow>, _>>()
            .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
        if rows.is_empty() {
            anyhow::bail!("no metric rows in {}", path.display());
        }
        Ok(Self {
            name: name.to_string(),
            rows,
        })
    }

    /// (timestep, value) points for one variant column.
    pub fn series(&self, variant: usize) -> Vec<(usize, f64)> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| (PREDICTION_START + i, row.values()[variant]))
            .collect()
    }

    /// Inclusive-exclusive timestep range covered by the summary.
    pub fn timestep_range(&self) -> (usize, usize) {
        (PREDICTION_START, PREDICTION_START + self.rows.len())
    }

    /// (min, max) over every variant, padded so curves never sit on the
    /// chart border.
    pub fn value_range(&self) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for row in &self.rows {
            for v in row.values() {
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
        let pad = ((hi - lo) * 0.05).max(1e-6);
        (lo - pad, hi + pad)
    }
}

fn variant_color(variant: usize) -> RGBColor {
    match variant {
        0 => RGBColor(76, 114, 176),
        1 => RGBColor(221, 132, 82),
        2 => RGBColor(85, 168, 104),
        _ => RGBColor(196, 78, 82),
    }
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
    summary: &MetricSummary,
    with_legend: bool,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let (x_lo, x_hi) = summary.timestep_range();
    let (y_lo, y_hi) = summary.value_range();
    let mut chart = ChartBuilder::on(area)
        .caption("Heldout set reconstruction evaluation", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_desc("Time step")
        .y_desc(summary.name.as_str())
        .draw()?;

    for (variant, label) in VARIANT_LABELS.iter().enumerate() {
        let color = variant_color(variant);
        let series = chart.draw_series(LineSeries::new(
            summary.series(variant),
            color.stroke_width(2),
        ))?;
        if with_legend {
            series
                .label(*label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color));
        }
    }

    if with_legend {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}

/// Render the PSNR and SSIM summaries side by side into a PNG, legend on
/// the last panel only.
pub fn render_curves(
    psnr: &MetricSummary,
    ssim: &MetricSummary,
    out: &Path,
    size: (u32, u32),
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let root = BitMapBackend::new(out, size).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((1, 2));
    draw_panel(&panels[0], psnr, false)?;
    draw_panel(&panels[1], ssim, true)?;
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod summary_tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "baseline,use_haptic,use_haptic_audio,use_haptic_audio_vibro\n\
                       20.0,21.0,22.0,23.0\n\
                       19.5,20.5,21.5,22.5\n\
                       19.0,20.0,21.0,22.0\n";

    fn write_csv(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("psnr_all.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parses_all_variant_columns() {
        let tmp = tempfile::tempdir().unwrap();
        let summary = MetricSummary::from_csv("PSNR", &write_csv(tmp.path())).unwrap();
        assert_eq!(summary.rows.len(), 3);
        assert_eq!(summary.rows[0].baseline, 20.0);
        assert_eq!(summary.rows[2].use_haptic_audio_vibro, 22.0);
    }

    #[test]
    fn series_start_at_the_first_predicted_timestep() {
        let tmp = tempfile::tempdir().unwrap();
        let summary = MetricSummary::from_csv("PSNR", &write_csv(tmp.path())).unwrap();
        let series = summary.series(1);
        assert_eq!(series, vec![(4, 21.0), (5, 20.5), (6, 20.0)]);
        assert_eq!(summary.timestep_range(), (4, 7));
    }

    #[test]
    fn value_range_spans_all_variants_with_padding() {
        let tmp = tempfile::tempdir().unwrap();
        let summary = MetricSummary::from_csv("PSNR", &write_csv(tmp.path())).unwrap();
        let (lo, hi) = summary.value_range();
        assert!(lo < 19.0);
        assert!(hi > 23.0);
    }

    #[test]
    fn empty_summary_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("empty.csv");
        std::fs::write(
            &path,
            "baseline,use_haptic,use_haptic_audio,use_haptic_audio_vibro\n",
        )
        .unwrap();
        assert!(MetricSummary::from_csv("PSNR", &path).is_err());
    }
}
