// src/runner.rs
use std::io::Write;
use std::path::PathBuf;

use crate::client::{CallOutcome, EvalClient};
use crate::config::{ClientSettings, EndpointConfig};
use crate::errors::Result;
use crate::inspector::{self, TokenReport};
use crate::payload::EvaluationPayload;
use crate::reporter::Reporter;
use crate::tokens::TokenCounter;

/// Everything one run needs besides the endpoint.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub payload_path: PathBuf,
    pub encoding: String,
    pub client: ClientSettings,
    /// Stop after the token report; no configuration or network needed.
    pub count_only: bool,
}

#[derive(Debug)]
pub struct RunSummary {
    pub report: TokenReport,
    /// `None` when the run stopped after counting.
    pub outcome: Option<CallOutcome>,
}

impl RunSummary {
    pub fn call_failed(&self) -> bool {
        matches!(self.outcome, Some(CallOutcome::Failure { .. }))
    }
}

/// Loads the payload, reports its token counts, then calls the endpoint once
/// and reports the outcome.
///
/// The endpoint is resolved through `lookup` only after the token report has
/// been written. Input, encoding, configuration and output errors abort the
/// run; failures of the call itself are returned inside the summary.
pub async fn run<W, F>(
    options: &RunOptions,
    lookup: F,
    counter: &dyn TokenCounter,
    reporter: &mut Reporter<W>,
) -> Result<RunSummary>
where
    W: Write,
    F: Fn(&str) -> Option<String>,
{
    let payload = EvaluationPayload::load(&options.payload_path)?;
    log::debug!("Loaded payload from {}", options.payload_path.display());

    let report = inspector::inspect(&payload, counter, &options.encoding)?;
    reporter.render_report(&report)?;

    if options.count_only {
        log::info!("Count-only run, skipping the evaluation call");
        return Ok(RunSummary { report, outcome: None });
    }

    let endpoint = EndpointConfig::from_lookup(lookup)?;
    let client = EvalClient::new(endpoint, options.client.clone())?;

    let outcome = client.invoke(&payload).await;
    reporter.render_outcome(&outcome)?;

    Ok(RunSummary { report, outcome: Some(outcome) })
}
