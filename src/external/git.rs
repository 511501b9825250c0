//! Git command abstractions
//!
//! Provides trait-based abstractions for the Git operations the merge flow
//! needs, enabling testable Git integrations through dependency injection.

use super::command::{CommandError, CommandExecutor, CommandOutput};
use crate::merge::files::ChangedFileSet;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub type BranchName = String;
pub type CommitHash = String;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Repository not found or not a git repository")]
    RepositoryNotFound,
    #[error("Branch not found: {branch}")]
    BranchNotFound { branch: BranchName },
    #[error("Merge conflict detected: {details}")]
    MergeConflict { details: String },
    #[error("Branch {branch} is not fully merged")]
    BranchNotFullyMerged { branch: BranchName },
    #[error("Remote ref does not exist: {reference}")]
    RemoteRefNotFound { reference: String },
    #[error("Command execution error: {source}")]
    CommandError {
        #[from]
        source: CommandError,
    },
    #[error("`git {command}` failed: {message}")]
    GitCommandFailed { command: String, message: String },
}

/// Trait for Git repository operations
///
/// This abstraction enables testing the merge flow without actual repository
/// manipulation, while preserving the exact interface used by the orchestrator.
#[async_trait]
pub trait GitRepository: Send + Sync {
    /// Fetch every configured remote
    async fn fetch_all(&self) -> Result<(), GitError>;

    /// Most recent merge commit reachable from `branch`, if any
    async fn latest_merge_commit(&self, branch: &str) -> Result<Option<CommitHash>, GitError>;

    /// Files a merge commit changed relative to its first parent
    async fn changed_files(&self, commit: &str) -> Result<ChangedFileSet, GitError>;

    /// Checkout an existing branch
    async fn checkout(&self, branch: &str) -> Result<(), GitError>;

    /// Pull the current branch from its upstream
    async fn pull(&self) -> Result<(), GitError>;

    /// Create a new branch from HEAD and switch to it
    async fn create_branch(&self, branch: &str) -> Result<(), GitError>;

    /// Merge `reference` into the current branch with the default message
    async fn merge(&self, reference: &str) -> Result<(), GitError>;

    /// Push a branch and record the remote branch as its upstream
    async fn push_upstream(&self, remote: &str, branch: &str) -> Result<(), GitError>;

    /// Delete a local branch
    async fn delete_branch(&self, branch: &str, force: bool) -> Result<(), GitError>;

    /// Delete a branch on a remote
    async fn delete_remote_branch(&self, remote: &str, branch: &str) -> Result<(), GitError>;
}

/// Real Git implementation
pub struct GitClient {
    executor: Arc<dyn CommandExecutor>,
    binary: String,
}

impl GitClient {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self::with_binary(executor, "git")
    }

    pub fn with_binary(executor: Arc<dyn CommandExecutor>, binary: impl Into<String>) -> Self {
        Self {
            executor,
            binary: binary.into(),
        }
    }

    async fn execute_git_command(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.executor.execute(&self.binary, args).await?;

        if !output.success() {
            return Err(classify_git_error(&output, args));
        }

        debug!(args = ?args, "git command succeeded");
        Ok(output.stdout)
    }
}

fn classify_git_error(output: &CommandOutput, args: &[&str]) -> GitError {
    let text = output.combined();
    let last_arg = args.last().copied().unwrap_or("unknown").to_string();

    if text.contains("not a git repository") {
        GitError::RepositoryNotFound
    } else if text.contains("CONFLICT") || text.contains("Automatic merge failed") {
        GitError::MergeConflict { details: text }
    } else if text.contains("not fully merged") {
        GitError::BranchNotFullyMerged { branch: last_arg }
    } else if text.contains("remote ref does not exist") {
        GitError::RemoteRefNotFound { reference: last_arg }
    } else if args.first() == Some(&"checkout")
        && (text.contains("did not match any") || text.contains("invalid reference"))
    {
        GitError::BranchNotFound { branch: last_arg }
    } else if args.first() == Some(&"branch") && text.contains("not found") {
        GitError::BranchNotFound { branch: last_arg }
    } else {
        GitError::GitCommandFailed {
            command: args.join(" "),
            message: text,
        }
    }
}

#[async_trait]
impl GitRepository for GitClient {
    async fn fetch_all(&self) -> Result<(), GitError> {
        self.execute_git_command(&["fetch", "--all"]).await?;
        Ok(())
    }

    async fn latest_merge_commit(&self, branch: &str) -> Result<Option<CommitHash>, GitError> {
        let output = self
            .execute_git_command(&["log", "--merges", branch, "--pretty=format:%H", "-1"])
            .await?;
        // Older scripts quoted the format; tolerate a quoted hash.
        let hash = output.trim().trim_matches('"');

        Ok((!hash.is_empty()).then(|| hash.to_string()))
    }

    async fn changed_files(&self, commit: &str) -> Result<ChangedFileSet, GitError> {
        let output = self
            .execute_git_command(&[
                "log",
                "-m",
                "--first-parent",
                "-1",
                "--name-only",
                "--pretty=format:commit %H",
                commit,
            ])
            .await?;

        Ok(ChangedFileSet::parse_log(&output))
    }

    async fn checkout(&self, branch: &str) -> Result<(), GitError> {
        self.execute_git_command(&["checkout", branch]).await?;
        Ok(())
    }

    async fn pull(&self) -> Result<(), GitError> {
        self.execute_git_command(&["pull"]).await?;
        Ok(())
    }

    async fn create_branch(&self, branch: &str) -> Result<(), GitError> {
        self.execute_git_command(&["checkout", "-b", branch]).await?;
        Ok(())
    }

    async fn merge(&self, reference: &str) -> Result<(), GitError> {
        self.execute_git_command(&["merge", "--no-edit", reference]).await?;
        Ok(())
    }

    async fn push_upstream(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.execute_git_command(&["push", "--set-upstream", remote, branch])
            .await?;
        Ok(())
    }

    async fn delete_branch(&self, branch: &str, force: bool) -> Result<(), GitError> {
        let flag = if force { "-D" } else { "-d" };
        self.execute_git_command(&["branch", flag, branch]).await?;
        Ok(())
    }

    async fn delete_remote_branch(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.execute_git_command(&["push", remote, "--delete", branch])
            .await?;
        Ok(())
    }
}
