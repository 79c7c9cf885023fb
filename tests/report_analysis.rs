//! End-to-end properties of the health report analyzer.

use healthbuddy::report::{analyze_csv, render_chart, Metric, MetricStatus};
use std::io::Write;

#[test]
fn blood_pressure_threshold_is_strict() {
    // mean exactly 120.0 must not flag
    let at = analyze_csv("Blood Pressure\n120\n120\n").unwrap();
    assert!(at.conditions.is_empty());
    assert_eq!(at.metrics[0].status, MetricStatus::Normal);

    // mean 120.1 must flag
    let above = analyze_csv("Blood Pressure\n120.1\n").unwrap();
    assert_eq!(above.conditions, vec!["High Blood Pressure"]);
}

#[test]
fn low_heart_rate_warns_without_flagging() {
    let analysis = analyze_csv("Heart Rate\n59.9\n").unwrap();
    assert!(analysis.conditions.is_empty());
    assert_eq!(analysis.metrics[0].status, MetricStatus::LowRate);
}

#[test]
fn all_four_metrics_flag_in_scan_order() {
    // means: BP 130, Sugar 150, HR 70 (normal), Cholesterol 210
    let csv = "\
Blood Pressure,Sugar Level,Heart Rate,Cholesterol
128,148,68,208
132,152,72,212
";
    let analysis = analyze_csv(csv).unwrap();
    assert_eq!(
        analysis.conditions,
        vec!["High Blood Pressure", "Diabetes Risk", "High Cholesterol"]
    );

    let hr = analysis
        .metrics
        .iter()
        .find(|m| m.metric == Metric::HeartRate)
        .unwrap();
    assert_eq!(hr.status, MetricStatus::Normal);
    assert_eq!(hr.mean, 70.0);
}

#[test]
fn column_order_in_csv_does_not_change_flag_order() {
    let csv = "Cholesterol,Blood Pressure\n210,130\n";
    let analysis = analyze_csv(csv).unwrap();
    assert_eq!(
        analysis.conditions,
        vec!["High Blood Pressure", "High Cholesterol"]
    );
}

#[test]
fn zero_recognized_columns_is_not_an_error() {
    let analysis = analyze_csv("Date,Steps,Mood\n2024-01-01,9000,good\n").unwrap();
    assert!(analysis.metrics.is_empty());
    assert!(analysis.conditions.is_empty());
    assert_eq!(analysis.summary, "No critical conditions detected!");
    assert!(render_chart(&analysis).unwrap().is_none());
}

#[test]
fn recognized_columns_render_one_chart() {
    let csv = "Blood Pressure,Heart Rate\n118,72\n121,76\n117,70\n";
    let analysis = analyze_csv(csv).unwrap();
    let png = render_chart(&analysis).unwrap().expect("chart expected");
    assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
}

#[test]
fn uploaded_file_contents_analyze_like_inline_text() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "Sugar Level").unwrap();
    writeln!(file, "145").unwrap();
    writeln!(file, "155").unwrap();
    file.flush().unwrap();

    let csv = std::fs::read_to_string(file.path()).unwrap();
    let analysis = analyze_csv(&csv).unwrap();
    assert_eq!(analysis.conditions, vec!["Diabetes Risk"]);
    assert_eq!(analysis.metrics[0].mean, 150.0);
}

#[test]
fn non_numeric_value_reports_column_and_line() {
    let err = analyze_csv("Cholesterol\n190\nhigh\n").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Cholesterol"), "got: {}", msg);
    assert!(msg.contains("line 3"), "got: {}", msg);
}
