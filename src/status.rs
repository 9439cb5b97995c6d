//! Job lifecycle states as reported by the workbench service.
//!
//! The service is the sole authority on legal transitions; the client only
//! distinguishes terminal from non-terminal states to decide whether a
//! further status poll is worthwhile.

use thiserror::Error;

/// Lifecycle state of a remote job.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum JobStatus {
    /// The service reported a state outside its own vocabulary.
    StateUnspecified,
    /// Accepted and waiting for scheduling.
    Queued,
    /// Assigned to an execution slot but not yet running.
    Scheduled,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Succeeded,
    /// Finished with an error.
    Failed,
    /// The job record is being removed by the service.
    DeletionInProgress,
    /// The job record is not (yet) visible on the service.
    NotStarted,
}

/// All states, in wire-vocabulary order.
pub const ALL_STATUSES: [JobStatus; 8] = [
    JobStatus::StateUnspecified,
    JobStatus::Queued,
    JobStatus::Scheduled,
    JobStatus::Running,
    JobStatus::Succeeded,
    JobStatus::Failed,
    JobStatus::DeletionInProgress,
    JobStatus::NotStarted,
];

impl JobStatus {
    /// Parses a wire state string.
    ///
    /// Matching is case-insensitive and tolerates underscores in place of
    /// spaces, since the service has shipped both spellings.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStatusError`] when the value is outside the closed
    /// vocabulary.
    pub fn from_wire(value: &str) -> Result<Self, UnknownStatusError> {
        let normalised = value.trim().to_ascii_uppercase().replace('_', " ");
        match normalised.as_str() {
            "STATE UNSPECIFIED" => Ok(Self::StateUnspecified),
            "QUEUED" => Ok(Self::Queued),
            "SCHEDULED" => Ok(Self::Scheduled),
            "RUNNING" => Ok(Self::Running),
            "SUCCEEDED" => Ok(Self::Succeeded),
            "FAILED" => Ok(Self::Failed),
            "DELETION IN PROGRESS" => Ok(Self::DeletionInProgress),
            "NOT STARTED" => Ok(Self::NotStarted),
            _ => Err(UnknownStatusError {
                value: value.to_owned(),
            }),
        }
    }

    /// Returns the canonical wire spelling of this state.
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::StateUnspecified => "STATE UNSPECIFIED",
            Self::Queued => "QUEUED",
            Self::Scheduled => "SCHEDULED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::DeletionInProgress => "DELETION IN PROGRESS",
            Self::NotStarted => "NOT STARTED",
        }
    }

    /// Returns the stable human-readable label for this state.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::StateUnspecified => "State unspecified",
            Self::Queued => "Queued",
            Self::Scheduled => "Scheduled",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::DeletionInProgress => "Deletion in progress",
            Self::NotStarted => "Not started",
        }
    }

    /// Returns `true` when no further state transitions are expected.
    ///
    /// Once a terminal state has been cached for a job, the client never
    /// polls the service for that job again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::DeletionInProgress)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Raised when a wire state string is outside the closed vocabulary.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unrecognised job state '{value}'")]
pub struct UnknownStatusError {
    /// Offending wire value, verbatim.
    pub value: String,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{ALL_STATUSES, JobStatus};

    #[rstest]
    #[case("QUEUED", JobStatus::Queued)]
    #[case("queued", JobStatus::Queued)]
    #[case("DELETION IN PROGRESS", JobStatus::DeletionInProgress)]
    #[case("DELETION_IN_PROGRESS", JobStatus::DeletionInProgress)]
    #[case("NOT STARTED", JobStatus::NotStarted)]
    #[case(" running ", JobStatus::Running)]
    #[case("STATE UNSPECIFIED", JobStatus::StateUnspecified)]
    fn parses_wire_values(#[case] wire: &str, #[case] expected: JobStatus) {
        let parsed = JobStatus::from_wire(wire)
            .unwrap_or_else(|err| panic!("'{wire}' should parse: {err}"));
        assert_eq!(parsed, expected);
    }

    #[test]
    fn rejects_unknown_wire_value() {
        let err = JobStatus::from_wire("EXPLODED").expect_err("value is not in the vocabulary");
        assert_eq!(err.value, "EXPLODED");
    }

    #[test]
    fn wire_round_trip_is_lossless() {
        for status in ALL_STATUSES {
            let reparsed = JobStatus::from_wire(status.as_wire())
                .unwrap_or_else(|err| panic!("round trip for {status:?}: {err}"));
            assert_eq!(reparsed, status);
        }
    }

    #[test]
    fn labels_are_unique() {
        let labels: std::collections::BTreeSet<&str> =
            ALL_STATUSES.iter().map(|status| status.label()).collect();
        assert_eq!(labels.len(), ALL_STATUSES.len());
    }

    #[test]
    fn exactly_three_states_are_terminal() {
        let terminal: Vec<JobStatus> = ALL_STATUSES
            .into_iter()
            .filter(|status| status.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![
                JobStatus::Succeeded,
                JobStatus::Failed,
                JobStatus::DeletionInProgress
            ]
        );
    }

    #[test]
    fn display_matches_label() {
        assert_eq!(JobStatus::DeletionInProgress.to_string(), "Deletion in progress");
    }
}
