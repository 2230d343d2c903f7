use std::fs;
use std::path::{Path, PathBuf};

use crate::report::error::ReportResult;
use crate::report::{file_timestamp, ReportSink};
use crate::scenario::ScenarioSnapshot;

/// Machine-readable report: the full snapshot as pretty-printed JSON.
pub struct JsonReport {
    output_dir: PathBuf,
}

impl JsonReport {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }
}

impl ReportSink for JsonReport {
    fn label(&self) -> &'static str {
        "json"
    }

    fn render(&self, snapshot: &ScenarioSnapshot) -> ReportResult<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("flowbench_{}.json", file_timestamp(snapshot)));

        let body = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, body)?;
        Ok(path)
    }
}
