use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::AnalyserOutcome;
use crate::report::error::ReportResult;
use crate::report::{file_timestamp, ReportSink};
use crate::scenario::ScenarioSnapshot;

/// CI-integration report: JUnit XML with one test case per flow+analyser
/// pair. A failed verdict becomes a `<failure>`, an analyser whose
/// finalization failed becomes a `<skipped>` marker.
pub struct JUnitReport {
    output_dir: PathBuf,
    suite_name: String,
}

impl JUnitReport {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            suite_name: "flowbench scenario".into(),
        }
    }

    pub fn with_suite_name(mut self, name: impl Into<String>) -> Self {
        self.suite_name = name.into();
        self
    }
}

fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

impl ReportSink for JUnitReport {
    fn label(&self) -> &'static str {
        "junit"
    }

    fn render(&self, snapshot: &ScenarioSnapshot) -> ReportResult<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("flowbench_{}.xml", file_timestamp(snapshot)));

        let tests = snapshot.analyser_count();
        let failures = snapshot.failure_count();
        let skipped = snapshot.unavailable_count();
        let time = snapshot.total_elapsed.as_secs_f64();

        let mut out = String::new();
        let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        let _ = writeln!(
            out,
            r#"<testsuite name="{}" tests="{tests}" failures="{failures}" skipped="{skipped}" time="{time:.3}" timestamp="{}">"#,
            xml_escape(&self.suite_name),
            snapshot.started_at.format("%Y-%m-%dT%H:%M:%S"),
        );

        for flow in &snapshot.flows {
            for analyser in &flow.analysers {
                let name = xml_escape(&format!("{} - {}", flow.name, analyser.label));
                let classname = xml_escape(flow.kind);
                match &analyser.outcome {
                    AnalyserOutcome::Finalized(output) => {
                        match output.summary.verdict() {
                            crate::analysis::Verdict::Pass => {
                                let _ = writeln!(
                                    out,
                                    r#"  <testcase name="{name}" classname="{classname}"/>"#
                                );
                            }
                            crate::analysis::Verdict::Fail(reason) => {
                                let _ = writeln!(
                                    out,
                                    r#"  <testcase name="{name}" classname="{classname}">"#
                                );
                                let _ = writeln!(
                                    out,
                                    r#"    <failure message="{}"/>"#,
                                    xml_escape(reason)
                                );
                                let _ = writeln!(out, "  </testcase>");
                            }
                        }
                    }
                    AnalyserOutcome::Unavailable { reason } => {
                        let _ = writeln!(
                            out,
                            r#"  <testcase name="{name}" classname="{classname}">"#
                        );
                        let _ = writeln!(
                            out,
                            r#"    <skipped message="{}"/>"#,
                            xml_escape(reason)
                        );
                        let _ = writeln!(out, "  </testcase>");
                    }
                }
            }
        }

        let _ = writeln!(out, "</testsuite>");
        fs::write(&path, out)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::snapshot_with_failure;
    use tempfile::TempDir;

    #[test]
    fn counts_failures_and_skips() {
        let dir = TempDir::new().unwrap();
        let sink = JUnitReport::new(dir.path());
        let snapshot = snapshot_with_failure();

        let path = sink.render(&snapshot).unwrap();
        let body = fs::read_to_string(path).unwrap();

        assert!(body.contains(r#"tests="3" failures="1" skipped="1""#));
        assert!(body.contains("<failure message="));
        assert!(body.contains("<skipped message="));
        assert!(body.contains("Downstream UDP flow - Latency and frame loss"));
    }

    #[test]
    fn escapes_xml_metacharacters() {
        assert_eq!(xml_escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }
}
