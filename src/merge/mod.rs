//! Merge staging, validation and cleanup.

pub mod branch;
pub mod error;
pub mod files;
pub mod orchestrator;
pub mod scheduler;
pub mod state;

pub use branch::TemporaryBranchName;
pub use error::{MergeStage, OrchestratorError};
pub use files::{ChangedFileSet, ProtectedFileList};
pub use orchestrator::{MergeOrchestrator, OpenedPullRequest, RunOptions, RunReport};
pub use scheduler::{Canceller, DelayedTask, TaskOutcome};
pub use state::{MergeRun, RunEvent, RunPhase};
