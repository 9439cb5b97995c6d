//! One remote execution unit tracked by the client.
//!
//! A [`Job`] caches the last observed lifecycle state. Refreshing a job
//! whose cached state is settled costs nothing: the cached value is
//! authoritative and immutable from the moment a terminal state is
//! observed, so polling loops converge without redundant remote calls.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::remote::{LogStream, NOT_SUBMITTED_ID, RemoteError, RemoteService};
use crate::render::JobRow;
use crate::status::JobStatus;

/// Client-side view of a job's last known state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum JobState {
    /// State reported by the service for a submitted job.
    Reported(JobStatus),
    /// The submission was rejected; the service never assigned an
    /// identifier. The carried text is the failure detail, reported as the
    /// job's status string.
    Rejected(String),
}

impl JobState {
    /// Returns `true` when refreshing can never change this state: either
    /// the service reported a terminal status, or the job was never
    /// submitted at all.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        match self {
            Self::Reported(status) => status.is_terminal(),
            Self::Rejected(_) => true,
        }
    }

    /// Returns the status label shown to users.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Reported(status) => status.label().to_owned(),
            Self::Rejected(detail) => detail.clone(),
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Handle to one submitted unit of work.
///
/// Identifier, tool, version, and command are fixed at construction; only
/// the cached state changes, and only through [`Job::refresh_status`].
/// Cloned handles share one state cell, so a refresh through any handle is
/// visible to all of them.
pub struct Job<R> {
    remote: Arc<R>,
    workbench: String,
    id: String,
    tool: String,
    version: String,
    command: String,
    state: Arc<Mutex<JobState>>,
}

impl<R> Clone for Job<R> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            workbench: self.workbench.clone(),
            id: self.id.clone(),
            tool: self.tool.clone(),
            version: self.version.clone(),
            command: self.command.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<R> std::fmt::Debug for Job<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("workbench", &self.workbench)
            .field("id", &self.id)
            .field("tool", &self.tool)
            .field("version", &self.version)
            .field("command", &self.command)
            .field("state", &self.state_snapshot())
            .finish_non_exhaustive()
    }
}

impl<R> Job<R> {
    pub(crate) fn accepted(
        remote: Arc<R>,
        workbench: &str,
        id: String,
        tool: String,
        version: String,
        command: String,
    ) -> Self {
        Self::with_state(
            remote,
            workbench,
            id,
            tool,
            version,
            command,
            JobState::Reported(JobStatus::Queued),
        )
    }

    pub(crate) fn rejected(
        remote: Arc<R>,
        workbench: &str,
        tool: &str,
        command: &str,
        detail: String,
    ) -> Self {
        Self::with_state(
            remote,
            workbench,
            NOT_SUBMITTED_ID.to_owned(),
            tool.to_owned(),
            String::new(),
            command.to_owned(),
            JobState::Rejected(detail),
        )
    }

    pub(crate) fn adopted(remote: Arc<R>, workbench: &str, id: &str) -> Self {
        Self::with_state(
            remote,
            workbench,
            id.to_owned(),
            String::new(),
            String::new(),
            String::new(),
            JobState::Reported(JobStatus::NotStarted),
        )
    }

    fn with_state(
        remote: Arc<R>,
        workbench: &str,
        id: String,
        tool: String,
        version: String,
        command: String,
        state: JobState,
    ) -> Self {
        Self {
            remote,
            workbench: workbench.to_owned(),
            id,
            tool,
            version,
            command,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Identifier assigned by the service, or `"N/A"` for rejected
    /// submissions.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Tool this job runs.
    #[must_use]
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Tool version resolved by the service.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Full invocation command.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Name of the owning workbench namespace.
    #[must_use]
    pub fn workbench(&self) -> &str {
        &self.workbench
    }

    /// Returns a snapshot of the cached state without touching the service.
    #[must_use]
    pub fn state_snapshot(&self) -> JobState {
        self.lock_state().clone()
    }

    /// Builds the presentation row for this job.
    #[must_use]
    pub fn row(&self) -> JobRow {
        JobRow {
            identifier: self.id.clone(),
            tool: self.tool.clone(),
            version: self.version.clone(),
            status: self.state_snapshot().label(),
            command: self.command.clone(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, JobState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: RemoteService> Job<R> {
    /// Refreshes the cached state from the service.
    ///
    /// A settled cache is returned unchanged with zero remote calls. A job
    /// record that is not visible on the service yet is normalised to
    /// `NotStarted`, which stays eligible for future refreshes. A settled
    /// state observed concurrently is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::ExecutionQuery`] when the status query fails
    /// for a reason other than the record being absent.
    pub async fn refresh_status(&self) -> Result<JobState, RemoteError> {
        let cached = self.state_snapshot();
        if cached.is_settled() {
            return Ok(cached);
        }
        let observed = self
            .remote
            .job_status(&self.id)
            .await?
            .unwrap_or(JobStatus::NotStarted);
        let mut guard = self.lock_state();
        if !guard.is_settled() {
            *guard = JobState::Reported(observed);
        }
        Ok(guard.clone())
    }

    /// Fetches the full log payload. Results are never cached; every call
    /// re-fetches.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::LogRetrieval`] on any non-success response,
    /// and locally for jobs that were never submitted.
    pub async fn fetch_logs(&self) -> Result<String, RemoteError> {
        self.require_submitted()?;
        self.remote.job_logs(&self.id).await
    }

    /// Opens a long-lived log stream.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::LogRetrieval`] when the stream cannot be
    /// opened, and locally for jobs that were never submitted.
    pub async fn stream_logs(&self) -> Result<Box<dyn LogStream>, RemoteError> {
        self.require_submitted()?;
        self.remote.stream_job_logs(&self.id).await
    }

    fn require_submitted(&self) -> Result<(), RemoteError> {
        if matches!(self.state_snapshot(), JobState::Rejected(_)) {
            return Err(RemoteError::LogRetrieval {
                id: self.id.clone(),
                detail: String::from("the job was never submitted"),
            });
        }
        Ok(())
    }
}
