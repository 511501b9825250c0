use crate::external::{GitError, GitHubError};
use std::fmt;
use thiserror::Error;

/// Step of the merge flow a git failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStage {
    Validation,
    Merge,
    Cleanup,
}

impl fmt::Display for MergeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeStage::Validation => f.write_str("validating the merge"),
            MergeStage::Merge => f.write_str("merging changes"),
            MergeStage::Cleanup => f.write_str("deleting the branch"),
        }
    }
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("protected files changed in merge {commit}: {}", .files.join(", "))]
    ProtectedFilesChanged { commit: String, files: Vec<String> },
    #[error("no merge commit found on {branch}")]
    NoMergeCommit { branch: String },
    #[error("something went wrong while {stage}: {source}")]
    Git {
        stage: MergeStage,
        #[source]
        source: GitError,
    },
    #[error("something went wrong while creating the pull request: {0}")]
    PullRequest(#[from] GitHubError),
    #[error("deletion of branch {branch} was cancelled before it ran")]
    CleanupCancelled { branch: String },
    #[error("scheduled branch deletion did not finish: {0}")]
    CleanupTask(String),
}

impl OrchestratorError {
    pub fn git(stage: MergeStage) -> impl FnOnce(GitError) -> Self {
        move |source| OrchestratorError::Git { stage, source }
    }

    /// Every failure ends the process the same way.
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Follow-up instruction for the operator, if there is one.
    pub fn hint(&self) -> Option<String> {
        match self {
            OrchestratorError::ProtectedFilesChanged { .. } => {
                Some("Please resolve manually: protected files need review".to_string())
            }
            OrchestratorError::Git {
                stage: MergeStage::Merge,
                ..
            } => Some("Please resolve manually".to_string()),
            OrchestratorError::CleanupCancelled { branch } => Some(format!(
                "Delete it later with `auto-merge cleanup --branch {branch}`"
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_files_message_lists_files() {
        let err = OrchestratorError::ProtectedFilesChanged {
            commit: "abc123".to_string(),
            files: vec!["package.json".to_string(), "yarn.lock".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "protected files changed in merge abc123: package.json, yarn.lock"
        );
        assert_eq!(err.exit_code(), 1);
        assert!(err.hint().is_some());
    }

    #[test]
    fn test_merge_failures_ask_for_manual_resolution() {
        let err = OrchestratorError::git(MergeStage::Merge)(GitError::MergeConflict {
            details: "CONFLICT".to_string(),
        });
        assert!(err.to_string().starts_with("something went wrong while merging changes"));
        assert_eq!(err.hint().as_deref(), Some("Please resolve manually"));

        let err = OrchestratorError::git(MergeStage::Cleanup)(GitError::RepositoryNotFound);
        assert_eq!(err.hint(), None);
    }
}
