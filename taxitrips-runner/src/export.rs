//! Run report export — JSON and CSV artifacts.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: one row per finding (missing column, rule violation, failed acquisition)
//!
//! Unknown schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::pipeline::{RunReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize RunReport to JSON")
}

/// Deserialize a `RunReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunReport> {
    let report: RunReport =
        serde_json::from_str(json).context("failed to deserialize RunReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export every finding as CSV.
///
/// Columns: file, kind, name, detail, offending_rows
pub fn export_findings_csv(report: &RunReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["file", "kind", "name", "detail", "offending_rows"])?;

    for failure in &report.acquisition_failures {
        wtr.write_record([
            failure.identifier.name(),
            "acquisition_failure",
            "",
            failure.reason.as_str(),
            "",
        ])?;
    }

    for file in &report.files {
        for column in &file.verdict.missing_columns {
            wtr.write_record([
                file.identifier.name(),
                "missing_column",
                column.as_str(),
                "",
                "",
            ])?;
        }
        for violation in &file.verdict.violations {
            let rows = violation.offending_rows.to_string();
            wtr.write_record([
                file.identifier.name(),
                "violation",
                violation.rule.as_str(),
                violation.description.as_str(),
                rows.as_str(),
            ])?;
        }
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

/// Save `report.json` and `findings.csv` into a new timestamped directory.
///
/// Returns the path to the created directory.
pub fn save_report(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "run_{}_{}_{}",
        report.range_start,
        report.range_end,
        report.generated_at.format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create report dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), export_json(report)?)?;
    std::fs::write(run_dir.join("findings.csv"), export_findings_csv(report)?)?;

    Ok(run_dir)
}

/// Load a `RunReport` from a report directory's report.json.
pub fn load_report(dir: &Path) -> Result<RunReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{AcquisitionFailure, FileVerdict};
    use std::collections::BTreeSet;
    use taxitrips_core::{FileNaming, ValidationVerdict, Violation, YearMonth};

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    fn sample_report() -> RunReport {
        let naming = FileNaming::default();
        RunReport {
            schema_version: SCHEMA_VERSION,
            range_start: ym("2024-01"),
            range_end: ym("2024-03"),
            generated_at: chrono::NaiveDate::from_ymd_opt(2024, 4, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            files: vec![
                FileVerdict {
                    identifier: naming.identifier(ym("2024-01")),
                    rows: 10,
                    content_hash: "aa".into(),
                    verdict: ValidationVerdict {
                        passed: true,
                        missing_columns: BTreeSet::new(),
                        violations: vec![],
                    },
                },
                FileVerdict {
                    identifier: naming.identifier(ym("2024-02")),
                    rows: 5,
                    content_hash: "bb".into(),
                    verdict: ValidationVerdict {
                        passed: false,
                        missing_columns: BTreeSet::from(["mta_tax".to_string()]),
                        violations: vec![],
                    },
                },
                FileVerdict {
                    identifier: naming.identifier(ym("2024-03")),
                    rows: 7,
                    content_hash: "cc".into(),
                    verdict: ValidationVerdict {
                        passed: false,
                        missing_columns: BTreeSet::new(),
                        violations: vec![Violation {
                            rule: "passenger_count_range".into(),
                            description: "passenger_count must lie in [0, 6] (2 offending rows)"
                                .into(),
                            offending_rows: 2,
                        }],
                    },
                },
            ],
            fetched: vec![naming.identifier(ym("2024-03"))],
            already_present: vec![
                naming.identifier(ym("2024-01")),
                naming.identifier(ym("2024-02")),
            ],
            acquisition_failures: vec![],
            stray_files: vec!["yellow_tripdata_2019-01.parquet".into()],
        }
    }

    #[test]
    fn json_round_trip_preserves_verdicts() {
        let report = sample_report();
        let restored = import_json(&export_json(&report).unwrap()).unwrap();

        assert_eq!(restored.files.len(), 3);
        assert_eq!(restored.range_start, ym("2024-01"));
        assert_eq!(restored.files[1].verdict, report.files[1].verdict);
        assert_eq!(restored.stray_files, report.stray_files);
        assert!(!restored.passed());
    }

    #[test]
    fn json_month_fields_are_strings() {
        let json = export_json(&sample_report()).unwrap();
        assert!(json.contains(r#""range_start": "2024-01""#));
    }

    #[test]
    fn newer_schema_version_is_rejected() {
        let mut report = sample_report();
        report.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&report).unwrap();
        assert!(import_json(&json).is_err());
    }

    #[test]
    fn findings_csv_has_one_row_per_finding() {
        let mut report = sample_report();
        report.acquisition_failures.push(AcquisitionFailure {
            identifier: FileNaming::default().identifier(ym("2024-04")),
            reason: "HTTP 503".into(),
        });

        let csv = export_findings_csv(&report).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "file,kind,name,detail,offending_rows");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("yellow_tripdata_2024-04.parquet,acquisition_failure"));
        assert_eq!(lines[2], "yellow_tripdata_2024-02.parquet,missing_column,mta_tax,,");
        assert!(lines[3].contains("passenger_count_range"));
        assert!(lines[3].ends_with(",2"));
    }

    #[test]
    fn save_and_load_report_directory() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();

        let run_dir = save_report(&report, dir.path()).unwrap();

        assert!(run_dir.ends_with("run_2024-01_2024-03_20240401_120000"));
        assert!(run_dir.join("findings.csv").is_file());
        let loaded = load_report(&run_dir).unwrap();
        assert_eq!(loaded.files.len(), report.files.len());
    }
}
