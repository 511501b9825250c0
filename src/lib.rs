// auto-merge library: stage a source branch on a temporary branch, open a
// pull request for it and clean the branch up afterwards.

pub mod cli;
pub mod config;
pub mod external;
pub mod merge;
pub mod shutdown;
pub mod telemetry;

// Re-export key types for easy access
pub use config::AutoMergeConfig;
pub use external::{
    CommandExecutor, GitClient, GitError, GitHubClient, GitHubError, GitHubOperations,
    GitRepository, ProcessCommandExecutor, PullRequest,
};
pub use merge::{
    ChangedFileSet, DelayedTask, MergeOrchestrator, OrchestratorError, ProtectedFileList,
    RunOptions, RunPhase, RunReport, TemporaryBranchName,
};
pub use telemetry::{generate_correlation_id, init_telemetry};
