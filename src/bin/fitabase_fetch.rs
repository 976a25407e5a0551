use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use fitabase_fetch::app::App;
use fitabase_fetch::config::RunConfig;
use fitabase_fetch::error::FetchError;
use fitabase_fetch::kaggle::{KaggleCredentials, KaggleHttpClient};
use fitabase_fetch::output::ConsoleOutput;

#[derive(Parser)]
#[command(name = "fitabase-fetch")]
#[command(
    about = "Download the Fitabase Fitbit dataset from Kaggle and lay it out under ./data"
)]
#[command(version, author)]
struct Cli {}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<FetchError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &FetchError) -> u8 {
    match error {
        FetchError::MissingCredentials
        | FetchError::CredentialsRead(_)
        | FetchError::CredentialsParse(_) => 2,
        FetchError::KaggleHttp(_) | FetchError::KaggleStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let _cli = Cli::parse();

    let config = RunConfig::from_current_dir()?;
    let credentials = KaggleCredentials::resolve()?;
    let client = KaggleHttpClient::new(credentials)?;
    let output = ConsoleOutput::new(std::io::stdout().is_terminal());

    let report = App::new(client).run(&config, &output)?;
    output.print_summary(&report).into_diagnostic()?;
    Ok(())
}
