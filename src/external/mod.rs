//! External tool abstractions
//!
//! This module provides trait-based abstractions for the `git` and `gh` CLIs,
//! keeping merge decisions testable through dependency injection and scripted
//! executors.

pub mod command;
pub mod git;
pub mod github;
pub mod testing;

pub use command::{CommandError, CommandExecutor, CommandOutput, ProcessCommandExecutor};
pub use git::{BranchName, CommitHash, GitClient, GitError, GitRepository};
pub use github::{GitHubClient, GitHubError, GitHubOperations, PrConfig, PullRequest};
