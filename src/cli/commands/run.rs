use super::{Command, CommandContext};
use crate::merge::RunOptions;
use crate::shutdown::shutdown_signal;
use anyhow::Result;

pub struct RunCommand {
    context: CommandContext,
    options: RunOptions,
}

impl RunCommand {
    pub fn new(context: CommandContext) -> Self {
        let options = RunOptions::from_config(&context.config);
        Self { context, options }
    }

    /// `--validate` forces the check on, `--skip-validation` forces it off,
    /// otherwise the configured default applies.
    pub fn with_validation(mut self, validate: bool, skip_validation: bool) -> Self {
        if validate {
            self.options.validate = true;
        } else if skip_validation {
            self.options.validate = false;
        }
        self
    }

    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.options.cleanup = self.options.cleanup && cleanup;
        self
    }

    pub fn options(&self) -> RunOptions {
        self.options
    }
}

impl Command for RunCommand {
    async fn execute(&self) -> Result<()> {
        let report = self
            .context
            .orchestrator()
            .run(self.options, shutdown_signal())
            .await?;

        println!();
        println!("🎉 Auto-merge finished");
        if let Some(commit) = &report.merge_commit {
            println!("   Merge commit:  {commit}");
        }
        println!("   Branch:        {}", report.branch);
        println!("   Pull request:  {}", report.pull_request.url);
        if !report.branch_deleted {
            println!(
                "💡 Branch kept; remove it with `auto-merge cleanup --branch {}`",
                report.branch
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AutoMergeConfig;

    #[test]
    fn test_flags_override_configured_validation() {
        let mut config = AutoMergeConfig::default();
        config.merge.validate_before_merge = true;
        let context = CommandContext::new(config);

        assert!(RunCommand::new(context.clone()).options().validate);
        assert!(!RunCommand::new(context.clone()).with_validation(false, true).options().validate);

        let context = CommandContext::new(AutoMergeConfig::default());
        assert!(!RunCommand::new(context.clone()).options().validate);
        assert!(RunCommand::new(context).with_validation(true, false).options().validate);
    }

    #[test]
    fn test_cleanup_disabled_in_config_cannot_be_reenabled() {
        let mut config = AutoMergeConfig::default();
        config.cleanup.enabled = false;
        let command = RunCommand::new(CommandContext::new(config)).with_cleanup(true);
        assert!(!command.options().cleanup);

        let command = RunCommand::new(CommandContext::new(AutoMergeConfig::default())).with_cleanup(false);
        assert!(!command.options().cleanup);
    }
}
