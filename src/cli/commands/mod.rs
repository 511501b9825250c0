use crate::cli::Commands;
use crate::config::AutoMergeConfig;
use crate::external::ProcessCommandExecutor;
use crate::merge::MergeOrchestrator;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

pub mod cleanup;
pub mod merge;
pub mod open_pr;
pub mod run;
pub mod show_config;
pub mod validate;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Configuration and clients shared by every subcommand.
#[derive(Clone)]
pub struct CommandContext {
    pub config: Arc<AutoMergeConfig>,
}

impl CommandContext {
    pub fn load(config_path: Option<&Path>, delay: Option<u64>) -> Result<Self> {
        let mut config = AutoMergeConfig::load(config_path)?;
        if let Some(seconds) = delay {
            config.cleanup.delete_after_seconds = seconds;
        }
        Ok(Self::new(config))
    }

    pub fn new(config: AutoMergeConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn orchestrator(&self) -> MergeOrchestrator {
        MergeOrchestrator::with_executor(Arc::new(ProcessCommandExecutor), self.config.clone())
    }
}

pub async fn dispatch(command: Commands, context: CommandContext) -> Result<()> {
    match command {
        Commands::Run {
            validate,
            skip_validation,
            no_cleanup,
        } => {
            run::RunCommand::new(context)
                .with_validation(validate, skip_validation)
                .with_cleanup(!no_cleanup)
                .execute()
                .await
        }
        Commands::Validate => validate::ValidateCommand::new(context).execute().await,
        Commands::Merge => merge::MergeCommand::new(context).execute().await,
        Commands::OpenPr { branch, no_cleanup } => {
            open_pr::OpenPrCommand::new(context, branch)
                .with_cleanup(!no_cleanup)
                .execute()
                .await
        }
        Commands::Cleanup { branch } => cleanup::CleanupCommand::new(context, branch).execute().await,
        Commands::Config => show_config::ShowConfigCommand::new(context).execute().await,
    }
}
