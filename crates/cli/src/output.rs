use std::io::Write;

use anyhow::Result;
use deskcheck_e2e::runner::{Outcome, TestSuite};

/// Output format for run results.
#[derive(Debug, Clone, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Structured output envelope (Terraform/ripgrep pattern).
#[derive(Debug, serde::Serialize)]
pub struct OutputEnvelope {
    pub version: &'static str,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(rename = "@message")]
    pub message: String,
    #[serde(rename = "@timestamp")]
    pub timestamp: String,
    pub data: serde_json::Value,
}

impl OutputEnvelope {
    pub fn new(data_type: &str, message: &str, data: serde_json::Value) -> Self {
        Self {
            version: "0.1",
            data_type: data_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            data,
        }
    }
}

fn summary_line(suite: &TestSuite) -> String {
    format!(
        "{} passed, {} failed, {} skipped, {} total",
        suite.passed(),
        suite.failed(),
        suite.skipped(),
        suite.total()
    )
}

/// One line per check, then the totals.
pub fn render_text(suite: &TestSuite, writer: &mut dyn Write) -> Result<()> {
    for r in &suite.results {
        let icon = match r.outcome {
            Outcome::Passed => "PASS",
            Outcome::Failed => "FAIL",
            Outcome::Skipped => "SKIP",
        };
        let dur = format!("{:.0}ms", r.duration.as_secs_f64() * 1000.0);
        writeln!(writer, "  {icon} {name} ({dur})", name = r.name)?;
        if let Some(ref err) = r.error {
            writeln!(writer, "       {err}")?;
        }
    }
    writeln!(writer, "\n{}", summary_line(suite))?;
    Ok(())
}

pub fn render_json(suite: &TestSuite, base_url: &str, writer: &mut dyn Write) -> Result<()> {
    let data = serde_json::json!({
        "baseUrl": base_url,
        "passed": suite.passed(),
        "failed": suite.failed(),
        "skipped": suite.skipped(),
        "total": suite.total(),
        "results": suite.results,
    });
    let envelope = OutputEnvelope::new("suite", &summary_line(suite), data);
    serde_json::to_writer_pretty(&mut *writer, &envelope)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskcheck_e2e::runner::TestResult;
    use std::time::Duration;

    fn suite() -> TestSuite {
        TestSuite {
            results: vec![
                TestResult {
                    name: "auth::login_super_admin".into(),
                    outcome: Outcome::Passed,
                    duration: Duration::from_millis(12),
                    error: None,
                },
                TestResult {
                    name: "todos::converted_flag_persisted".into(),
                    outcome: Outcome::Skipped,
                    duration: Duration::ZERO,
                    error: Some("no database configured (set MONGO_URL)".into()),
                },
                TestResult {
                    name: "pwa::offline_bundle_requires_auth".into(),
                    outcome: Outcome::Failed,
                    duration: Duration::from_millis(3),
                    error: Some("expected 401, got 200 OK: {}".into()),
                },
            ],
        }
    }

    #[test]
    fn text_lists_each_check_and_totals() {
        let mut out = Vec::new();
        render_text(&suite(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("  PASS auth::login_super_admin (12ms)"));
        assert!(text.contains("  SKIP todos::converted_flag_persisted"));
        assert!(text.contains("  FAIL pwa::offline_bundle_requires_auth"));
        assert!(text.contains("       expected 401, got 200 OK"));
        assert!(text.ends_with("1 passed, 1 failed, 1 skipped, 3 total\n"));
    }

    #[test]
    fn json_envelope_carries_results() {
        let mut out = Vec::new();
        render_json(&suite(), "http://localhost:3000", &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["type"], "suite");
        assert_eq!(value["version"], "0.1");
        assert_eq!(value["data"]["baseUrl"], "http://localhost:3000");
        assert_eq!(value["data"]["failed"], 1);
        assert_eq!(value["data"]["results"][0]["outcome"], "passed");
        assert_eq!(value["data"]["results"][0]["duration"], 12);
        assert_eq!(value["data"]["results"][1]["outcome"], "skipped");
    }
}
