use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Category of remote ledger operation, each with its own deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    /// Read-only transaction evaluation
    Evaluate,
    /// Endorsement collection
    Endorse,
    /// Submission to ordering
    Submit,
    /// Waiting for commit status
    CommitStatus,
}

impl OperationKind {
    /// All operation kinds in request order
    pub const ALL: [Self; 4] = [Self::Evaluate, Self::Endorse, Self::Submit, Self::CommitStatus];
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evaluate => write!(f, "evaluate"),
            Self::Endorse => write!(f, "endorse"),
            Self::Submit => write!(f, "submit"),
            Self::CommitStatus => write!(f, "commit-status"),
        }
    }
}

/// Per-call deadlines for the four operation categories.
///
/// These bound individual calls made over a session; they are not
/// connection-level timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    /// Deadline for evaluate calls
    pub evaluate: Duration,

    /// Deadline for endorse calls
    pub endorse: Duration,

    /// Deadline for submit calls
    pub submit: Duration,

    /// Deadline for commit status calls
    pub commit_status: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeoutPolicy {
    /// Baseline policy: evaluate 5s, endorse 15s, submit 5s, commit status 60s
    #[must_use]
    pub const fn new() -> Self {
        Self {
            evaluate: Duration::from_secs(5),
            endorse: Duration::from_secs(15),
            submit: Duration::from_secs(5),
            commit_status: Duration::from_secs(60),
        }
    }

    /// Set the evaluate deadline
    #[must_use]
    pub const fn evaluate(mut self, deadline: Duration) -> Self {
        self.evaluate = deadline;
        self
    }

    /// Set the endorse deadline
    #[must_use]
    pub const fn endorse(mut self, deadline: Duration) -> Self {
        self.endorse = deadline;
        self
    }

    /// Set the submit deadline
    #[must_use]
    pub const fn submit(mut self, deadline: Duration) -> Self {
        self.submit = deadline;
        self
    }

    /// Set the commit status deadline
    #[must_use]
    pub const fn commit_status(mut self, deadline: Duration) -> Self {
        self.commit_status = deadline;
        self
    }

    /// Deadline that applies to `kind`
    #[must_use]
    pub const fn deadline(&self, kind: OperationKind) -> Duration {
        match kind {
            OperationKind::Evaluate => self.evaluate,
            OperationKind::Endorse => self.endorse,
            OperationKind::Submit => self.submit,
            OperationKind::CommitStatus => self.commit_status,
        }
    }
}
