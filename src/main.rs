use anyhow::Result;
use auto_merge::cli::commands::{dispatch, CommandContext};
use auto_merge::cli::Cli;
use auto_merge::config::AutoMergeConfig;
use auto_merge::{init_telemetry, OrchestratorError};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e:#}");
            let code = match e.downcast_ref::<OrchestratorError>() {
                Some(err) => {
                    if let Some(hint) = err.hint() {
                        eprintln!("💡 {hint}");
                    }
                    err.exit_code()
                }
                None => 1,
            };
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let _ = AutoMergeConfig::load_env_file();
    let context = CommandContext::load(cli.config.as_deref(), cli.delay)?;
    init_telemetry(&context.config.observability)?;

    let command = cli.command.unwrap_or_default();
    tokio::runtime::Runtime::new()?.block_on(async { dispatch(command, context).await })
}
