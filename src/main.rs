mod cli;

use std::io::Write;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use tfbackend::module::ModuleOutcome;
use tfbackend::output;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let (format, params) = cli.into_request();

    let outcome = match params {
        Ok(params) => ModuleOutcome::from_result(params.flavor, tfbackend::run(&params).await),
        Err(err) => ModuleOutcome::failure(err),
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", output::render(format, &outcome))?;
    stdout.flush()?;

    if outcome.is_failure() {
        std::process::exit(1);
    }

    Ok(())
}

