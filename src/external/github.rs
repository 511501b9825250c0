//! GitHub CLI abstractions
//!
//! Provides trait-based abstractions for the pull request operations the
//! merge flow needs, enabling testable GitHub integrations through dependency
//! injection.

use super::command::{CommandError, CommandExecutor};
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

pub type PrId = u64;

static PR_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(https?://\S+/pull/(\d+))").expect("valid pull request regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrConfig {
    pub base_branch: String,
    pub head_branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: Option<PrId>,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub authentication failed")]
    AuthenticationFailed,
    #[error("A pull request for {head_branch} already exists")]
    PullRequestExists { head_branch: String },
    #[error("Repository not found or access denied")]
    RepositoryNotFound,
    #[error("Command execution error: {source}")]
    CommandError {
        #[from]
        source: CommandError,
    },
    #[error("GitHub CLI failed: {message}")]
    CliFailed { message: String },
}

/// Trait for GitHub operations
///
/// This abstraction enables testing GitHub integrations without actual
/// GitHub API calls, while preserving the exact interface used by the
/// application code.
#[async_trait]
pub trait GitHubOperations: Send + Sync {
    /// Create a pull request whose title and body are filled from the commits
    async fn create_pr(&self, config: &PrConfig) -> Result<PullRequest, GitHubError>;
}

/// Real GitHub CLI implementation
pub struct GitHubClient {
    executor: Arc<dyn CommandExecutor>,
    binary: String,
}

impl GitHubClient {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self::with_binary(executor, "gh")
    }

    pub fn with_binary(executor: Arc<dyn CommandExecutor>, binary: impl Into<String>) -> Self {
        Self {
            executor,
            binary: binary.into(),
        }
    }

    async fn execute_gh_command(&self, args: &[&str]) -> Result<String, GitHubError> {
        let output = self.executor.execute(&self.binary, args).await?;

        if !output.success() {
            return Err(classify_gh_error(&output.combined(), args));
        }

        Ok(output.stdout)
    }
}

fn classify_gh_error(text: &str, args: &[&str]) -> GitHubError {
    if text.contains("authentication failed")
        || text.contains("not authenticated")
        || text.contains("gh auth login")
    {
        GitHubError::AuthenticationFailed
    } else if text.contains("already exists") {
        let head_branch = args
            .iter()
            .position(|a| *a == "--head")
            .and_then(|i| args.get(i + 1))
            .copied()
            .unwrap_or("unknown")
            .to_string();
        GitHubError::PullRequestExists { head_branch }
    } else if text.contains("Could not resolve to a Repository") || text.contains("not found") {
        GitHubError::RepositoryNotFound
    } else {
        GitHubError::CliFailed {
            message: text.to_string(),
        }
    }
}

/// `gh pr create` prints the new pull request's URL as its last line.
pub fn parse_pull_request(output: &str) -> PullRequest {
    match PR_URL.captures(output) {
        Some(caps) => PullRequest {
            number: caps.get(2).and_then(|n| n.as_str().parse().ok()),
            url: caps[1].to_string(),
        },
        None => PullRequest {
            number: None,
            url: output.trim().lines().last().unwrap_or_default().to_string(),
        },
    }
}

#[async_trait]
impl GitHubOperations for GitHubClient {
    async fn create_pr(&self, config: &PrConfig) -> Result<PullRequest, GitHubError> {
        let args = [
            "pr",
            "create",
            "--base",
            &config.base_branch,
            "--head",
            &config.head_branch,
            "--fill",
        ];

        let output = self.execute_gh_command(&args).await?;
        Ok(parse_pull_request(&output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::testing::{fail, ok, ScriptedExecutor};

    const CREATE: [&str; 7] = ["pr", "create", "--base", "main", "--head", "auto_merge_x", "--fill"];

    fn pr_config() -> PrConfig {
        PrConfig {
            base_branch: "main".to_string(),
            head_branch: "auto_merge_x".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_pr_success() {
        let executor = ScriptedExecutor::new().expect_command(
            "gh",
            &CREATE,
            ok("\nCreating pull request for auto_merge_x into main in owner/repo\n\nhttps://github.com/owner/repo/pull/42\n"),
        );
        let client = GitHubClient::new(Arc::new(executor));

        let pr = client.create_pr(&pr_config()).await.unwrap();
        assert_eq!(pr.number, Some(42));
        assert_eq!(pr.url, "https://github.com/owner/repo/pull/42");
    }

    #[tokio::test]
    async fn test_create_pr_authentication_error() {
        let executor = ScriptedExecutor::new().expect_command(
            "gh",
            &CREATE,
            fail("To get started with GitHub CLI, please run:  gh auth login"),
        );
        let client = GitHubClient::new(Arc::new(executor));

        let err = client.create_pr(&pr_config()).await.unwrap_err();
        assert!(matches!(err, GitHubError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn test_create_pr_already_exists() {
        let executor = ScriptedExecutor::new().expect_command(
            "gh",
            &CREATE,
            fail("a pull request for branch \"auto_merge_x\" into branch \"main\" already exists:\nhttps://github.com/owner/repo/pull/7"),
        );
        let client = GitHubClient::new(Arc::new(executor));

        let err = client.create_pr(&pr_config()).await.unwrap_err();
        assert!(matches!(err, GitHubError::PullRequestExists { head_branch } if head_branch == "auto_merge_x"));
    }

    #[test]
    fn test_parse_pull_request_without_url() {
        let pr = parse_pull_request("created\n");
        assert_eq!(pr.number, None);
        assert_eq!(pr.url, "created");
    }
}
