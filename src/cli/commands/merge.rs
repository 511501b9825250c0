use super::{Command, CommandContext};
use anyhow::Result;

pub struct MergeCommand {
    context: CommandContext,
}

impl MergeCommand {
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }
}

impl Command for MergeCommand {
    async fn execute(&self) -> Result<()> {
        let branch = self.context.orchestrator().perform_merge().await?;
        println!("💡 Open the pull request with `auto-merge open-pr --branch {branch}`");
        Ok(())
    }
}
