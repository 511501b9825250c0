//! Scripted command executor for tests of code built on [`CommandExecutor`].
//!
//! Responses are keyed by the full command line (`"git checkout main"`).
//! Every invocation is recorded; unscripted commands succeed with empty
//! output.

use super::command::{CommandError, CommandExecutor, CommandOutput};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Default)]
pub struct ScriptedExecutor {
    responses: HashMap<String, Result<CommandOutput, CommandError>>,
    calls: Mutex<Vec<String>>,
}

pub fn ok(stdout: &str) -> Result<CommandOutput, CommandError> {
    Ok(CommandOutput {
        status_code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    })
}

pub fn fail(stderr: &str) -> Result<CommandOutput, CommandError> {
    Ok(CommandOutput {
        status_code: 1,
        stdout: String::new(),
        stderr: stderr.to_string(),
    })
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_command(
        mut self,
        program: &str,
        args: &[&str],
        response: Result<CommandOutput, CommandError>,
    ) -> Self {
        self.responses.insert(command_line(program, args), response);
        self
    }

    /// Script `command` to exit 0 with `stdout`.
    pub fn succeed(mut self, command: &str, stdout: &str) -> Self {
        self.responses.insert(command.to_string(), ok(stdout));
        self
    }

    /// Script `command` to exit 1 with `stderr`.
    pub fn fail(mut self, command: &str, stderr: &str) -> Self {
        self.responses.insert(command.to_string(), fail(stderr));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.calls().iter().filter(|call| *call == command).count()
    }

    /// Temporary branch created by `git checkout -b`, if any.
    pub fn temp_branch(&self) -> Option<String> {
        self.calls()
            .iter()
            .find_map(|call| call.strip_prefix("git checkout -b ").map(str::to_string))
    }
}

fn command_line(program: &str, args: &[&str]) -> String {
    format!("{} {}", program, args.join(" "))
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn execute(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CommandError> {
        let line = command_line(program, args);
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.clone());
        self.responses.get(&line).cloned().unwrap_or_else(|| ok(""))
    }
}
