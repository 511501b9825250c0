//! Merge orchestration
//!
//! Sequences the git and gh calls that stage the source branch on a
//! temporary branch, open a pull request for it, and remove the branch again
//! once the pull request exists. Every step either succeeds or ends the run;
//! nothing is retried or rolled back.

use super::branch::TemporaryBranchName;
use super::error::{MergeStage, OrchestratorError};
use super::scheduler::{describe_delay, DelayedTask, TaskOutcome};
use super::state::{MergeRun, RunEvent, RunPhase};
use crate::config::AutoMergeConfig;
use crate::external::{
    CommandExecutor, GitClient, GitHubClient, GitHubOperations, GitRepository, PrConfig,
    PullRequest,
};
use statig::prelude::*;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn, Instrument};

pub type DeletionResult = Result<(), OrchestratorError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub validate: bool,
    pub cleanup: bool,
}

impl RunOptions {
    pub fn from_config(config: &AutoMergeConfig) -> Self {
        Self {
            validate: config.merge.validate_before_merge,
            cleanup: config.cleanup.enabled,
        }
    }
}

/// Outcome of a run that reached its last step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub merge_commit: Option<String>,
    pub branch: String,
    pub pull_request: PullRequest,
    pub branch_deleted: bool,
    pub final_phase: RunPhase,
}

/// A pull request together with the pending deletion of its head branch.
pub struct OpenedPullRequest {
    pub pull_request: PullRequest,
    pub deletion: Option<DelayedTask<DeletionResult>>,
}

#[derive(Clone)]
pub struct MergeOrchestrator {
    git: Arc<dyn GitRepository>,
    github: Arc<dyn GitHubOperations>,
    config: Arc<AutoMergeConfig>,
    phases: Arc<watch::Sender<RunPhase>>,
}

impl MergeOrchestrator {
    pub fn new(
        git: Arc<dyn GitRepository>,
        github: Arc<dyn GitHubOperations>,
        config: Arc<AutoMergeConfig>,
    ) -> Self {
        Self {
            git,
            github,
            config,
            phases: Arc::new(watch::channel(RunPhase::Idle).0),
        }
    }

    /// Wire real `git` and `gh` clients over one executor.
    pub fn with_executor(executor: Arc<dyn CommandExecutor>, config: Arc<AutoMergeConfig>) -> Self {
        let git = GitClient::with_binary(executor.clone(), config.tools.git.clone());
        let github = GitHubClient::with_binary(executor, config.tools.gh.clone());
        Self::new(Arc::new(git), Arc::new(github), config)
    }

    pub fn config(&self) -> &AutoMergeConfig {
        &self.config
    }

    pub fn deletion_delay(&self) -> Duration {
        self.config.cleanup.delay()
    }

    /// Check the latest merge commit on the source branch against the
    /// protected file list. Returns the merge commit when nothing protected
    /// changed.
    pub async fn validate_merge_eligibility(&self) -> Result<String, OrchestratorError> {
        let source = &self.config.repository.source_branch;
        println!("🔍 Validating files ready for merge...");

        let git_err = OrchestratorError::git;
        self.git.fetch_all().await.map_err(git_err(MergeStage::Validation))?;

        let commit = self
            .git
            .latest_merge_commit(source)
            .await
            .map_err(git_err(MergeStage::Validation))?
            .ok_or_else(|| OrchestratorError::NoMergeCommit {
                branch: source.clone(),
            })?;

        let changed = self
            .git
            .changed_files(&commit)
            .await
            .map_err(git_err(MergeStage::Validation))?;

        let protected: Vec<String> = self
            .config
            .merge
            .protected_files
            .intersect(&changed)
            .into_iter()
            .map(str::to_string)
            .collect();

        if !protected.is_empty() {
            warn!(commit = %commit, files = ?protected, "Protected files changed in merge commit");
            return Err(OrchestratorError::ProtectedFilesChanged {
                commit,
                files: protected,
            });
        }

        info!(commit = %commit, changed = changed.len(), "Merge commit validated");
        println!("✅ Files validated successfully");
        Ok(commit)
    }

    /// Stage the source branch on a fresh temporary branch cut from the
    /// primary branch and push it.
    pub async fn perform_merge(&self) -> Result<String, OrchestratorError> {
        let repo = &self.config.repository;
        let branch = TemporaryBranchName::generate(&self.config.merge.branch_prefix).into_string();
        let git_err = OrchestratorError::git;

        println!("🔀 Attempting merge from {}...", repo.source_branch);

        self.git
            .checkout(&repo.primary_branch)
            .await
            .map_err(git_err(MergeStage::Merge))?;
        self.git.pull().await.map_err(git_err(MergeStage::Merge))?;

        println!(
            "🌱 Creating temporary branch \"{branch}\" from {}/{}...",
            repo.remote, repo.primary_branch
        );
        self.git
            .create_branch(&branch)
            .await
            .map_err(git_err(MergeStage::Merge))?;
        self.git.fetch_all().await.map_err(git_err(MergeStage::Merge))?;

        println!("🔀 Merging changes from {} to \"{branch}\"", repo.source_branch);
        self.git
            .merge(&repo.source_branch)
            .await
            .map_err(git_err(MergeStage::Merge))?;
        self.git
            .push_upstream(&repo.remote, &branch)
            .await
            .map_err(git_err(MergeStage::Merge))?;

        info!(branch = %branch, source = %repo.source_branch, "Temporary branch merged and pushed");
        match self.config.branch_url(&branch) {
            Some(url) => println!("✅ Merge completed and \"{branch}\" pushed to {url}"),
            None => println!("✅ Merge completed and \"{branch}\" pushed to {}", repo.remote),
        }
        Ok(branch)
    }

    /// Open a pull request for `branch` against the primary branch. When
    /// `schedule_cleanup` is set the branch is deleted once the configured
    /// delay has elapsed.
    pub async fn open_pull_request(
        &self,
        branch: &str,
        schedule_cleanup: bool,
    ) -> Result<OpenedPullRequest, OrchestratorError> {
        println!("📬 Creating pull request...");

        let pull_request = self
            .github
            .create_pr(&PrConfig {
                base_branch: self.config.repository.primary_branch.clone(),
                head_branch: branch.to_string(),
            })
            .await?;

        info!(branch, url = %pull_request.url, number = ?pull_request.number, "Pull request created");
        println!("✅ Pull request created successfully: {}", pull_request.url);
        if let Some(pulls) = self.config.pulls_url() {
            println!("👀 Verify changes at: {pulls}");
        }

        let deletion = schedule_cleanup.then(|| self.schedule_deletion(branch));
        Ok(OpenedPullRequest {
            pull_request,
            deletion,
        })
    }

    /// Delete `branch` after the configured delay.
    pub fn schedule_deletion(&self, branch: &str) -> DelayedTask<DeletionResult> {
        let delay = self.deletion_delay();
        println!("⏳ Deleting branch \"{branch}\" in {}...", describe_delay(delay));

        let this = self.clone();
        let branch = branch.to_string();
        DelayedTask::schedule(delay, async move { this.delete_branch(&branch).await })
    }

    /// Remove the temporary branch locally and on the remote.
    pub async fn delete_branch(&self, branch: &str) -> DeletionResult {
        let repo = &self.config.repository;
        let git_err = OrchestratorError::git;
        println!("🧹 Deleting branch...");

        self.git
            .checkout(&repo.primary_branch)
            .await
            .map_err(git_err(MergeStage::Cleanup))?;
        self.git
            .delete_branch(branch, false)
            .await
            .map_err(git_err(MergeStage::Cleanup))?;
        self.git
            .delete_remote_branch(&repo.remote, branch)
            .await
            .map_err(git_err(MergeStage::Cleanup))?;

        info!(branch, "Temporary branch deleted");
        println!("✅ Deleted branch \"{branch}\" successfully!");
        Ok(())
    }

    /// Phase of the latest [`run`](Self::run), updated as it advances.
    pub fn phases(&self) -> watch::Receiver<RunPhase> {
        self.phases.subscribe()
    }

    /// Run the whole flow. `shutdown` cancels a pending branch deletion if it
    /// resolves before the delay elapses.
    pub async fn run<S>(&self, options: RunOptions, shutdown: S) -> Result<RunReport, OrchestratorError>
    where
        S: Future<Output = ()>,
    {
        let correlation_id = crate::telemetry::generate_correlation_id();
        let span = crate::telemetry::create_merge_span("run", &correlation_id);
        let mut run = MergeRun::observed(self.phases.clone()).state_machine();

        let result = async {
            run.handle(&RunEvent::Begin {
                validate: options.validate,
            });

            if options.validate {
                let merge_commit = self.validate_merge_eligibility().await?;
                run.handle(&RunEvent::Validated { merge_commit });
            }

            let branch = self.perform_merge().await?;
            run.handle(&RunEvent::Merged {
                branch: branch.clone(),
            });

            let opened = self.open_pull_request(&branch, options.cleanup).await?;
            run.handle(&RunEvent::PullRequestOpened {
                url: opened.pull_request.url.clone(),
            });

            let branch_deleted = match opened.deletion {
                Some(task) => {
                    self.watch_deletion(task, &branch, shutdown, || {
                        run.handle(&RunEvent::DeletionDue);
                    })
                    .await?;
                    run.handle(&RunEvent::BranchDeleted);
                    true
                }
                None => {
                    run.handle(&RunEvent::CleanupSkipped);
                    false
                }
            };

            let context = run.inner();
            Ok::<_, OrchestratorError>(RunReport {
                merge_commit: context.merge_commit().map(str::to_string),
                branch,
                pull_request: opened.pull_request,
                branch_deleted,
                final_phase: context.phase(),
            })
        }
        .instrument(span)
        .await;

        if let Err(e) = &result {
            error!(correlation_id = %correlation_id, phase = %run.inner().phase(), error = %e, "Merge run failed");
            run.handle(&RunEvent::Abort {
                reason: e.to_string(),
            });
        }
        result
    }

    /// Wait for a scheduled deletion, cancelling it if `shutdown` fires first.
    pub async fn await_deletion<S>(
        &self,
        task: DelayedTask<DeletionResult>,
        branch: &str,
        shutdown: S,
    ) -> Result<(), OrchestratorError>
    where
        S: Future<Output = ()>,
    {
        self.watch_deletion(task, branch, shutdown, || {}).await
    }

    /// Like [`await_deletion`](Self::await_deletion), calling `on_due` once
    /// the delay has elapsed and git starts deleting.
    async fn watch_deletion<S, F>(
        &self,
        mut task: DelayedTask<DeletionResult>,
        branch: &str,
        shutdown: S,
        on_due: F,
    ) -> Result<(), OrchestratorError>
    where
        S: Future<Output = ()>,
        F: FnOnce(),
    {
        let canceller = task.canceller();
        let mut started = task.take_started();
        let mut on_due = Some(on_due);
        let join = task.join();
        tokio::pin!(join);
        tokio::pin!(shutdown);
        let mut shutdown_seen = false;

        let joined = loop {
            tokio::select! {
                joined = &mut join => break joined,
                due = async {
                    match started.as_mut() {
                        Some(rx) => rx.await.is_ok(),
                        None => false,
                    }
                }, if started.is_some() => {
                    started = None;
                    if due {
                        if let Some(on_due) = on_due.take() {
                            on_due();
                        }
                    }
                }
                _ = &mut shutdown, if !shutdown_seen => {
                    shutdown_seen = true;
                    warn!(branch, "Shutdown requested, cancelling scheduled branch deletion");
                    canceller.cancel();
                }
            }
        };

        // The job can finish in the same poll that its start is signalled.
        if let Ok(TaskOutcome::Completed(_)) = &joined {
            if let Some(on_due) = on_due.take() {
                on_due();
            }
        }

        match joined {
            Ok(TaskOutcome::Completed(result)) => result,
            Ok(TaskOutcome::Cancelled) => Err(OrchestratorError::CleanupCancelled {
                branch: branch.to_string(),
            }),
            Err(e) => Err(OrchestratorError::CleanupTask(e.to_string())),
        }
    }
}
