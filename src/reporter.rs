// src/reporter.rs
use serde_json::json;
use std::io::Write;

use crate::client::CallOutcome;
use crate::errors::Result;
use crate::inspector::{Field, TokenReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Writes token reports and call outcomes to an output sink.
pub struct Reporter<W: Write> {
    out: W,
    format: OutputFormat,
    run_id: String,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render_report(&mut self, report: &TokenReport) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                for entry in &report.entries {
                    match entry.field {
                        Field::Citation(i) => writeln!(self.out, "Citation {}: {} tokens", i, entry.token_count)?,
                        Field::Context => writeln!(self.out, "Context: {} tokens", entry.token_count)?,
                        Field::Query => writeln!(self.out, "Query: {} tokens", entry.token_count)?,
                    }
                }
                writeln!(self.out, "Total: {} tokens ({})", report.total(), report.encoding)?;
            }
            OutputFormat::Json => {
                let line = json!({
                    "kind": "tokens",
                    "id": self.run_id,
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                    "encoding": report.encoding,
                    "entries": report.entries,
                    "total": report.total(),
                });
                writeln!(self.out, "{}", line)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn render_outcome(&mut self, outcome: &CallOutcome) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                writeln!(self.out, "API Response Time: {:.2} seconds", outcome.elapsed_seconds())?;
                match outcome {
                    CallOutcome::Success { body, .. } => writeln!(self.out, "API Response: {}", body)?,
                    CallOutcome::Failure { error, .. } => writeln!(self.out, "Error while calling the API: {}", error)?,
                }
            }
            OutputFormat::Json => {
                let mut line = json!({
                    "kind": "outcome",
                    "id": self.run_id,
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                    "success": outcome.is_success(),
                    "elapsed_seconds": outcome.elapsed_seconds(),
                });
                match outcome {
                    CallOutcome::Success { body, .. } => line["body"] = body.clone(),
                    CallOutcome::Failure { error, .. } => line["error"] = json!(error.to_string()),
                }
                writeln!(self.out, "{}", line)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}
