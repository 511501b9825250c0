use serde::{Deserialize, Serialize};
use statig::prelude::*;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEvent {
    Begin { validate: bool },
    Validated { merge_commit: String },
    Merged { branch: String },
    PullRequestOpened { url: String },
    DeletionDue,
    BranchDeleted,
    CleanupSkipped,
    Abort { reason: String },
}

/// Observable phase of a merge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Idle,
    Validating,
    Merging,
    OpeningPullRequest,
    AwaitingDeletion,
    Deleting,
    Completed,
    Aborted,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::Completed | RunPhase::Aborted)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Idle => "idle",
            RunPhase::Validating => "validating",
            RunPhase::Merging => "merging",
            RunPhase::OpeningPullRequest => "opening pull request",
            RunPhase::AwaitingDeletion => "awaiting deletion",
            RunPhase::Deleting => "deleting",
            RunPhase::Completed => "completed",
            RunPhase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Context of the run state machine. Every edge either advances to the next
/// phase or aborts; there are no compensating transitions.
#[derive(Debug)]
pub struct MergeRun {
    phase: RunPhase,
    merge_commit: Option<String>,
    branch: Option<String>,
    pull_request_url: Option<String>,
    failure: Option<String>,
    observer: Option<Arc<watch::Sender<RunPhase>>>,
}

impl Default for MergeRun {
    fn default() -> Self {
        Self {
            phase: RunPhase::Idle,
            merge_commit: None,
            branch: None,
            pull_request_url: None,
            failure: None,
            observer: None,
        }
    }
}

impl MergeRun {
    /// A run that publishes every phase it enters to `observer`.
    pub fn observed(observer: Arc<watch::Sender<RunPhase>>) -> Self {
        observer.send_replace(RunPhase::Idle);
        Self {
            observer: Some(observer),
            ..Self::default()
        }
    }

    fn enter(&mut self, phase: RunPhase) {
        tracing::info!(from = %self.phase, to = %phase, "Merge run transition");
        self.phase = phase;
        if let Some(observer) = &self.observer {
            observer.send_replace(phase);
        }
    }

    fn abort(&mut self, reason: &str) -> Outcome<State> {
        tracing::warn!(phase = %self.phase, reason, "Merge run aborted");
        self.failure = Some(reason.to_string());
        self.enter(RunPhase::Aborted);
        Transition(State::aborted())
    }

    fn ignore(&self, event: &RunEvent) -> Outcome<State> {
        tracing::debug!(phase = %self.phase, ?event, "Event ignored in current phase");
        Handled
    }
}

#[state_machine(initial = "State::idle()")]
impl MergeRun {
    #[state]
    fn idle(&mut self, event: &RunEvent) -> Outcome<State> {
        match event {
            RunEvent::Begin { validate: true } => {
                self.enter(RunPhase::Validating);
                Transition(State::validating())
            }
            RunEvent::Begin { validate: false } => {
                self.enter(RunPhase::Merging);
                Transition(State::merging())
            }
            RunEvent::Abort { reason } => self.abort(reason),
            _ => self.ignore(event),
        }
    }

    #[state]
    fn validating(&mut self, event: &RunEvent) -> Outcome<State> {
        match event {
            RunEvent::Validated { merge_commit } => {
                self.merge_commit = Some(merge_commit.clone());
                self.enter(RunPhase::Merging);
                Transition(State::merging())
            }
            RunEvent::Abort { reason } => self.abort(reason),
            _ => self.ignore(event),
        }
    }

    #[state]
    fn merging(&mut self, event: &RunEvent) -> Outcome<State> {
        match event {
            RunEvent::Merged { branch } => {
                self.branch = Some(branch.clone());
                self.enter(RunPhase::OpeningPullRequest);
                Transition(State::opening_pull_request())
            }
            RunEvent::Abort { reason } => self.abort(reason),
            _ => self.ignore(event),
        }
    }

    #[state]
    fn opening_pull_request(&mut self, event: &RunEvent) -> Outcome<State> {
        match event {
            RunEvent::PullRequestOpened { url } => {
                self.pull_request_url = Some(url.clone());
                self.enter(RunPhase::AwaitingDeletion);
                Transition(State::awaiting_deletion())
            }
            RunEvent::Abort { reason } => self.abort(reason),
            _ => self.ignore(event),
        }
    }

    #[state]
    fn awaiting_deletion(&mut self, event: &RunEvent) -> Outcome<State> {
        match event {
            RunEvent::DeletionDue => {
                self.enter(RunPhase::Deleting);
                Transition(State::deleting())
            }
            RunEvent::CleanupSkipped => {
                self.enter(RunPhase::Completed);
                Transition(State::completed())
            }
            RunEvent::Abort { reason } => self.abort(reason),
            _ => self.ignore(event),
        }
    }

    #[state]
    fn deleting(&mut self, event: &RunEvent) -> Outcome<State> {
        match event {
            RunEvent::BranchDeleted => {
                self.enter(RunPhase::Completed);
                Transition(State::completed())
            }
            RunEvent::Abort { reason } => self.abort(reason),
            _ => self.ignore(event),
        }
    }

    #[state]
    fn completed(&mut self, event: &RunEvent) -> Outcome<State> {
        self.ignore(event)
    }

    #[state]
    fn aborted(&mut self, event: &RunEvent) -> Outcome<State> {
        self.ignore(event)
    }
}

impl MergeRun {
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn merge_commit(&self) -> Option<&str> {
        self.merge_commit.as_deref()
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn pull_request_url(&self) -> Option<&str> {
        self.pull_request_url.as_deref()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_path_skips_validation() {
        let mut sm = MergeRun::default().state_machine();
        assert_eq!(sm.inner().phase(), RunPhase::Idle);

        sm.handle(&RunEvent::Begin { validate: false });
        assert_eq!(sm.inner().phase(), RunPhase::Merging);

        sm.handle(&RunEvent::Merged {
            branch: "auto_merge_x".to_string(),
        });
        sm.handle(&RunEvent::PullRequestOpened {
            url: "https://github.com/o/r/pull/1".to_string(),
        });
        assert_eq!(sm.inner().phase(), RunPhase::AwaitingDeletion);

        sm.handle(&RunEvent::DeletionDue);
        sm.handle(&RunEvent::BranchDeleted);

        assert_eq!(sm.inner().phase(), RunPhase::Completed);
        assert_eq!(sm.inner().branch(), Some("auto_merge_x"));
        assert_eq!(sm.inner().merge_commit(), None);
    }

    #[test]
    fn test_validated_path_records_commit() {
        let mut sm = MergeRun::default().state_machine();
        sm.handle(&RunEvent::Begin { validate: true });
        assert_eq!(sm.inner().phase(), RunPhase::Validating);

        sm.handle(&RunEvent::Validated {
            merge_commit: "abc123".to_string(),
        });
        assert_eq!(sm.inner().phase(), RunPhase::Merging);
        assert_eq!(sm.inner().merge_commit(), Some("abc123"));
    }

    #[test]
    fn test_abort_is_terminal() {
        let mut sm = MergeRun::default().state_machine();
        sm.handle(&RunEvent::Begin { validate: true });
        sm.handle(&RunEvent::Abort {
            reason: "package.json changed".to_string(),
        });
        assert_eq!(sm.inner().phase(), RunPhase::Aborted);
        assert!(sm.inner().phase().is_terminal());

        // Nothing moves an aborted run.
        sm.handle(&RunEvent::Validated {
            merge_commit: "abc123".to_string(),
        });
        sm.handle(&RunEvent::Merged {
            branch: "x".to_string(),
        });
        assert_eq!(sm.inner().phase(), RunPhase::Aborted);
        assert_eq!(sm.inner().failure(), Some("package.json changed"));
    }

    #[test]
    fn test_skipped_cleanup_completes_the_run() {
        let mut sm = MergeRun::default().state_machine();
        sm.handle(&RunEvent::Begin { validate: false });
        sm.handle(&RunEvent::CleanupSkipped);
        assert_eq!(sm.inner().phase(), RunPhase::Merging);

        sm.handle(&RunEvent::Merged {
            branch: "auto_merge_x".to_string(),
        });
        sm.handle(&RunEvent::PullRequestOpened {
            url: "https://github.com/o/r/pull/1".to_string(),
        });
        sm.handle(&RunEvent::CleanupSkipped);
        assert_eq!(sm.inner().phase(), RunPhase::Completed);
    }

    #[test]
    fn test_observer_sees_each_phase() {
        let observer = Arc::new(watch::channel(RunPhase::Aborted).0);
        let phases = observer.subscribe();
        assert_eq!(*phases.borrow(), RunPhase::Aborted);

        let mut sm = MergeRun::observed(observer).state_machine();
        assert_eq!(*phases.borrow(), RunPhase::Idle);

        sm.handle(&RunEvent::Begin { validate: true });
        assert_eq!(*phases.borrow(), RunPhase::Validating);
        sm.handle(&RunEvent::Abort {
            reason: "boom".to_string(),
        });
        assert_eq!(*phases.borrow(), RunPhase::Aborted);
    }

    #[test]
    fn test_out_of_order_events_are_ignored() {
        let mut sm = MergeRun::default().state_machine();
        sm.handle(&RunEvent::BranchDeleted);
        assert_eq!(sm.inner().phase(), RunPhase::Idle);

        sm.handle(&RunEvent::Begin { validate: false });
        sm.handle(&RunEvent::DeletionDue);
        assert_eq!(sm.inner().phase(), RunPhase::Merging);
    }
}
