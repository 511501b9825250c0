use super::{Command, CommandContext};
use anyhow::Result;

pub struct ShowConfigCommand {
    context: CommandContext,
}

impl ShowConfigCommand {
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }
}

impl Command for ShowConfigCommand {
    async fn execute(&self) -> Result<()> {
        print!("{}", self.context.config.to_toml()?);
        Ok(())
    }
}
