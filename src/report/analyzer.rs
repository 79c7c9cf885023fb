//! Threshold analysis of uploaded health reports.
//!
//! Recognized columns are matched by exact header name; all other columns are
//! ignored. Threshold values are inherited from the original advice table and
//! are not clinically verified; nothing here treats them as configurable.

use crate::errors::{AssistantError, Result};
use serde::Serialize;

/// The four recognized health metrics, in fixed scan order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Metric {
    BloodPressure,
    SugarLevel,
    HeartRate,
    Cholesterol,
}

impl Metric {
    /// Scan order: Blood Pressure -> Sugar Level -> Heart Rate -> Cholesterol
    pub const ALL: [Metric; 4] = [
        Metric::BloodPressure,
        Metric::SugarLevel,
        Metric::HeartRate,
        Metric::Cholesterol,
    ];

    /// Exact-match CSV header name
    pub fn column_name(&self) -> &'static str {
        match self {
            Metric::BloodPressure => "Blood Pressure",
            Metric::SugarLevel => "Sugar Level",
            Metric::HeartRate => "Heart Rate",
            Metric::Cholesterol => "Cholesterol",
        }
    }

    /// Strict upper threshold for the high-risk condition
    pub fn high_threshold(&self) -> f64 {
        match self {
            Metric::BloodPressure => 120.0,
            Metric::SugarLevel => 140.0,
            Metric::HeartRate => 100.0,
            Metric::Cholesterol => 200.0,
        }
    }

    /// Strict lower threshold, only defined for heart rate
    pub fn low_threshold(&self) -> Option<f64> {
        match self {
            Metric::HeartRate => Some(60.0),
            _ => None,
        }
    }

    /// Condition label appended when the high-risk threshold is crossed
    pub fn flag_label(&self) -> &'static str {
        match self {
            Metric::BloodPressure => "High Blood Pressure",
            Metric::SugarLevel => "Diabetes Risk",
            Metric::HeartRate => "Heart Risk",
            Metric::Cholesterol => "High Cholesterol",
        }
    }

    /// Classify a column mean against the fixed thresholds
    pub fn classify(&self, mean: f64) -> MetricStatus {
        if mean > self.high_threshold() {
            return MetricStatus::HighRisk;
        }
        if let Some(low) = self.low_threshold() {
            if mean < low {
                return MetricStatus::LowRate;
            }
        }
        MetricStatus::Normal
    }
}

/// Outcome of classifying one metric's mean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricStatus {
    Normal,
    HighRisk,
    /// Below the low threshold; shown as a warning but never flagged
    LowRate,
}

/// One recognized column extracted from the report
#[derive(Debug, Clone, Serialize)]
pub struct MetricSeries {
    pub metric: Metric,
    pub name: &'static str,
    pub values: Vec<f64>,
    pub mean: f64,
    pub status: MetricStatus,
    pub message: String,
}

/// Full analysis of one uploaded report
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub metrics: Vec<MetricSeries>,
    pub conditions: Vec<String>,
    pub summary: String,
}

/// Parse a CSV report and run the threshold analysis.
///
/// A dataset with none of the recognized columns yields an empty analysis,
/// not an error. A non-numeric value inside a recognized column is an error
/// naming the column and line; unrecognized columns are never inspected.
pub fn analyze_csv(csv_text: &str) -> Result<Analysis> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AssistantError::Report(format!("invalid CSV header: {}", e)))?
        .clone();

    // Column index per recognized metric, preserving scan order
    let columns: Vec<(Metric, usize)> = Metric::ALL
        .iter()
        .filter_map(|metric| {
            headers
                .iter()
                .position(|h| h == metric.column_name())
                .map(|idx| (*metric, idx))
        })
        .collect();

    let mut series: Vec<(Metric, Vec<f64>)> =
        columns.iter().map(|(metric, _)| (*metric, Vec::new())).collect();

    for (row_idx, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| AssistantError::Report(format!("invalid CSV row: {}", e)))?;
        // Header is line 1, first data row is line 2
        let line = row_idx + 2;
        for ((metric, col_idx), (_, values)) in columns.iter().zip(series.iter_mut()) {
            let Some(raw) = record.get(*col_idx) else {
                continue;
            };
            let cell = raw.trim();
            if cell.is_empty() {
                continue;
            }
            let value: f64 = cell.parse().map_err(|_| {
                AssistantError::Report(format!(
                    "non-numeric value {:?} in column '{}' at line {}",
                    cell,
                    metric.column_name(),
                    line
                ))
            })?;
            values.push(value);
        }
    }

    let mut metrics = Vec::new();
    let mut conditions = Vec::new();

    for (metric, values) in series {
        // A header with no numeric rows is treated like a missing column
        if values.is_empty() {
            continue;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let status = metric.classify(mean);
        let message = status_message(metric, status);
        if status == MetricStatus::HighRisk {
            conditions.push(metric.flag_label().to_string());
        }
        metrics.push(MetricSeries {
            metric,
            name: metric.column_name(),
            values,
            mean,
            status,
            message,
        });
    }

    let summary = if conditions.is_empty() {
        "No critical conditions detected!".to_string()
    } else {
        format!("The patient may have: {}", conditions.join(", "))
    };

    Ok(Analysis {
        metrics,
        conditions,
        summary,
    })
}

fn status_message(metric: Metric, status: MetricStatus) -> String {
    match status {
        MetricStatus::HighRisk => format!(
            "{} detected! Consult a doctor.",
            metric.flag_label()
        ),
        MetricStatus::LowRate => "Low Heart Rate detected. Monitor your health.".to_string(),
        MetricStatus::Normal => format!("{} is normal.", metric.column_name()),
    }
}
