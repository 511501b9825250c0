use super::{Command, CommandContext};
use anyhow::Result;

pub struct ValidateCommand {
    context: CommandContext,
}

impl ValidateCommand {
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }
}

impl Command for ValidateCommand {
    async fn execute(&self) -> Result<()> {
        let commit = self.context.orchestrator().validate_merge_eligibility().await?;
        println!("🔖 Latest merge commit on {}: {commit}", self.context.config.repository.source_branch);
        Ok(())
    }
}
