// src/cli.rs
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{ClientSettings, DEFAULT_TIMEOUT};
use crate::reporter::OutputFormat;
use crate::runner::RunOptions;
use crate::tokens::DEFAULT_ENCODING;

#[derive(Parser, Debug)]
#[command(
    name = "eval-probe",
    version,
    about = "Count payload tokens, then send the payload to an evaluation endpoint",
    after_help = "The endpoint is read from EVAL_API_URL and EVAL_API_KEY (a .env file is loaded if present)."
)]
pub struct Cli {
    #[arg(default_value = "test_payload.json", help = "JSON payload to inspect and submit")]
    pub payload: PathBuf,

    #[arg(long, default_value = DEFAULT_ENCODING, help = "Token encoding (cl100k_base, o200k_base, p50k_base, p50k_edit, r50k_base, whitespace)")]
    pub encoding: String,

    #[arg(
        long,
        default_value_t = DEFAULT_TIMEOUT.as_secs(),
        help = "Give up on the evaluation call after this many seconds (0 waits indefinitely)"
    )]
    pub timeout_secs: u64,

    #[arg(long, default_value_t = false, help = "Only report token counts; skip the evaluation call")]
    pub count_only: bool,

    #[arg(long, default_value_t = false, help = "Exit with status 2 when the evaluation call fails")]
    pub fail_on_call_error: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl Cli {
    pub fn run_options(&self) -> RunOptions {
        let timeout = (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs));
        RunOptions {
            payload_path: self.payload.clone(),
            encoding: self.encoding.clone(),
            client: ClientSettings { timeout, ..ClientSettings::default() },
            count_only: self.count_only,
        }
    }
}
