use super::{Command, CommandContext};
use crate::shutdown::shutdown_signal;
use anyhow::Result;

pub struct OpenPrCommand {
    context: CommandContext,
    branch: String,
    cleanup: bool,
}

impl OpenPrCommand {
    pub fn new(context: CommandContext, branch: String) -> Self {
        let cleanup = context.config.cleanup.enabled;
        Self {
            context,
            branch,
            cleanup,
        }
    }

    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = self.cleanup && cleanup;
        self
    }
}

impl Command for OpenPrCommand {
    async fn execute(&self) -> Result<()> {
        let orchestrator = self.context.orchestrator();
        let opened = orchestrator.open_pull_request(&self.branch, self.cleanup).await?;

        if let Some(deletion) = opened.deletion {
            orchestrator
                .await_deletion(deletion, &self.branch, shutdown_signal())
                .await?;
        }
        Ok(())
    }
}
