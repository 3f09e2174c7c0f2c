use clap::Parser;
use std::process::ExitCode;

use eval_probe::cli::Cli;
use eval_probe::reporter::Reporter;
use eval_probe::runner;
use eval_probe::tokens;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let dotenv = dotenvy::dotenv();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // A missing .env is fine; the variables may come from the environment.
    match dotenv {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => log::debug!("No .env file found"),
        Err(e) => log::warn!("Could not load .env file: {}", e),
    }

    let options = cli.run_options();
    let counter = tokens::counter_for(&options.encoding);
    let mut reporter = Reporter::new(std::io::stdout().lock(), cli.format);

    let env = |name: &str| std::env::var(name).ok();
    let summary = match runner::run(&options, env, counter.as_ref(), &mut reporter).await {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    if summary.call_failed() && cli.fail_on_call_error {
        return ExitCode::from(2);
    }
    ExitCode::SUCCESS
}
