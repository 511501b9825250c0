use super::{Command, CommandContext};
use anyhow::Result;

pub struct CleanupCommand {
    context: CommandContext,
    branch: String,
}

impl CleanupCommand {
    pub fn new(context: CommandContext, branch: String) -> Self {
        Self { context, branch }
    }
}

impl Command for CleanupCommand {
    async fn execute(&self) -> Result<()> {
        let repo = &self.context.config.repository;
        if self.branch == repo.primary_branch || self.branch == repo.source_branch {
            anyhow::bail!("refusing to delete configured branch {}", self.branch);
        }

        self.context.orchestrator().delete_branch(&self.branch).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AutoMergeConfig;

    #[tokio::test]
    async fn test_refuses_to_delete_primary_branch() {
        let context = CommandContext::new(AutoMergeConfig::default());
        let err = CleanupCommand::new(context, "main".to_string())
            .execute()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("refusing to delete"));
    }
}
