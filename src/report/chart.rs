//! Shared line chart of the recognized metric series.
//!
//! Renders every recognized column as one line over the row index, with a
//! legend and fixed colors per metric, into an in-memory PNG.

use crate::errors::{AssistantError, Result};
use crate::report::analyzer::{Analysis, Metric};
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 480;

fn metric_color(metric: Metric) -> RGBColor {
    match metric {
        Metric::BloodPressure => RGBColor(31, 119, 180),
        Metric::SugarLevel => RGBColor(44, 160, 44),
        Metric::HeartRate => RGBColor(214, 39, 40),
        Metric::Cholesterol => RGBColor(255, 165, 0),
    }
}

/// Render the analysis as a PNG chart.
///
/// Returns `None` when the analysis contains no recognized series; the UI
/// shows an empty chart region in that case.
pub fn render_chart(analysis: &Analysis) -> Result<Option<Vec<u8>>> {
    if analysis.metrics.is_empty() {
        return Ok(None);
    }

    let x_max = analysis
        .metrics
        .iter()
        .map(|m| m.values.len())
        .max()
        .unwrap_or(1)
        .max(2) as f64
        - 1.0;
    let y_min = analysis
        .metrics
        .iter()
        .flat_map(|m| m.values.iter().copied())
        .fold(f64::INFINITY, f64::min);
    let y_max = analysis
        .metrics
        .iter()
        .flat_map(|m| m.values.iter().copied())
        .fold(f64::NEG_INFINITY, f64::max);
    // Pad the value range so flat series still get a visible band
    let pad = ((y_max - y_min).abs() * 0.1).max(1.0);
    let y_range = (y_min - pad)..(y_max + pad);

    let mut buffer = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| AssistantError::Chart(e.to_string()))?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Health Data Over Time", ("sans-serif", 24))
            .margin(12)
            .x_label_area_size(42)
            .y_label_area_size(56)
            .build_cartesian_2d(0f64..x_max, y_range)
            .map_err(|e| AssistantError::Chart(e.to_string()))?;

        chart
            .configure_mesh()
            .x_desc("Time")
            .y_desc("Health Parameters")
            .draw()
            .map_err(|e| AssistantError::Chart(e.to_string()))?;

        for series in &analysis.metrics {
            let color = metric_color(series.metric);
            chart
                .draw_series(LineSeries::new(
                    series
                        .values
                        .iter()
                        .enumerate()
                        .map(|(i, v)| (i as f64, *v)),
                    color.stroke_width(2),
                ))
                .map_err(|e| AssistantError::Chart(e.to_string()))?
                .label(series.name)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
                });
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| AssistantError::Chart(e.to_string()))?;

        root.present()
            .map_err(|e| AssistantError::Chart(e.to_string()))?;
    }

    let img = RgbImage::from_raw(WIDTH, HEIGHT, buffer)
        .ok_or_else(|| AssistantError::Chart("bitmap buffer size mismatch".to_string()))?;
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| AssistantError::Chart(e.to_string()))?;
    Ok(Some(png))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::analyzer::analyze_csv;

    #[test]
    fn test_empty_analysis_renders_nothing() {
        let analysis = analyze_csv("Name\nalice\n").unwrap();
        assert!(render_chart(&analysis).unwrap().is_none());
    }

    #[test]
    fn test_chart_is_valid_png() {
        let analysis =
            analyze_csv("Blood Pressure,Heart Rate\n118,72\n122,75\n119,71\n").unwrap();
        let png = render_chart(&analysis).unwrap().expect("chart expected");
        // PNG signature
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    }

    #[test]
    fn test_single_row_series_renders() {
        let analysis = analyze_csv("Cholesterol\n199\n").unwrap();
        assert!(render_chart(&analysis).unwrap().is_some());
    }
}
