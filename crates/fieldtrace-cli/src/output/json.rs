//! JSON output formatter for programmatic integration

use std::path::PathBuf;

use fieldtrace_core::tracker::TrackReport;
use serde::Serialize;

#[derive(Serialize)]
pub struct JsonOutput<'a> {
    pub version: &'static str,
    pub summary: JsonSummary,
    pub files: Vec<JsonFile<'a>>,
}

#[derive(Serialize)]
pub struct JsonSummary {
    pub total_files: usize,
    pub files_with_bindings: usize,
    pub total_bindings: usize,
}

#[derive(Serialize)]
pub struct JsonFile<'a> {
    pub file: String,
    pub reports: &'a [TrackReport],
}

pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format(
        &self,
        results: &[(PathBuf, Vec<TrackReport>)],
        total_files: usize,
    ) -> serde_json::Result<String> {
        let output = JsonOutput {
            version: env!("CARGO_PKG_VERSION"),
            summary: JsonSummary {
                total_files,
                files_with_bindings: results.len(),
                total_bindings: results.iter().map(|(_, r)| r.len()).sum(),
            },
            files: results
                .iter()
                .map(|(path, reports)| JsonFile {
                    file: path.to_string_lossy().to_string(),
                    reports,
                })
                .collect(),
        };
        serde_json::to_string_pretty(&output)
    }
}
