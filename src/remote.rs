//! Seam between the workbench abstractions and the remote service.
//!
//! The trait mirrors the wire operations one-to-one so tests can substitute
//! a scripted fake, while [`crate::http::HttpRemoteService`] provides the
//! production implementation. All methods return boxed `Send` futures so
//! the trait stays object-safe and free of async-trait machinery.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::status::{JobStatus, UnknownStatusError};

/// Identifier reported for a job that the service never accepted.
pub const NOT_SUBMITTED_ID: &str = "N/A";

/// Future returned by remote operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RemoteError>> + Send + 'a>>;

/// Payload for the job submission endpoint.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SubmitRequest {
    /// Tool to execute (for example `salmon`).
    pub tool: String,
    /// Full invocation command line.
    pub full_command: String,
}

/// Response from the job submission endpoint.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct JobReceipt {
    /// Identifier assigned by the service.
    pub id: String,
    /// Tool echoed back by the service.
    pub tool: String,
    /// Tool version resolved by the service.
    #[serde(default)]
    pub version: String,
    /// Command echoed back by the service.
    #[serde(default)]
    pub full_command: String,
}

/// Payload for the fetch-by-URL endpoint.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FetchRequest {
    /// Source URL the service should pull from.
    pub input_url: String,
    /// Destination path inside the workbench namespace.
    pub output_path: String,
    /// Transfer method (for example `download`).
    pub method: String,
}

/// Response from the fetch-by-URL endpoint.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FetchReceipt {
    /// Identifier of the transfer job created by the service.
    pub id: String,
    /// Source the service recorded for the transfer.
    #[serde(default)]
    pub input: String,
}

/// One entry in a workbench file listing.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FileEntry {
    /// Path of the file relative to the namespace root.
    pub name: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}

/// One entry in the caller's workbench listing.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct WorkbenchEntry {
    /// Namespace name.
    pub name: String,
    /// Total stored bytes.
    #[serde(default)]
    pub size: u64,
    /// Last-modified timestamp as reported by the service.
    #[serde(default)]
    pub updated_at: String,
}

/// Acknowledgement returned when a workbench is created.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct WorkbenchReceipt {
    /// Name of the namespace the service provisioned.
    pub workbench_name: String,
}

/// Acknowledgement returned for a completed upload.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct UploadReceipt {
    /// Human-readable acknowledgement, when the service provides one.
    #[serde(default)]
    pub message: String,
}

/// Descriptor returned by the download endpoint.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DownloadDescriptor {
    /// Path that was requested.
    #[serde(default)]
    pub file_path: String,
    /// Service-issued link the caller can retrieve the bytes from.
    #[serde(default)]
    pub download_url: String,
}

/// Payload for the move-file endpoint.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MoveRequest {
    /// Current path of the file.
    pub source_file_name: String,
    /// Requested new path.
    pub destination_file_name: String,
}

/// Outcome of a move-file request.
///
/// The move endpoint is deliberately soft: a non-success response carries
/// its detail here instead of raising, so batch reorganisation scripts can
/// keep going.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MoveOutcome {
    /// Acknowledgement or failure detail from the service.
    pub message: String,
}

/// Acknowledgement returned when a directory is created.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DirectoryReceipt {
    /// Path of the created directory.
    pub path: String,
}

/// Acknowledgement returned when a path is deleted.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DeletionReceipt {
    /// Path that was deleted.
    pub path: String,
    /// Deletion status reported by the service.
    #[serde(default)]
    pub status: String,
}

/// Incremental handle over a long-lived log stream.
///
/// Chunks arrive until the remote side closes the stream. A mid-stream
/// transport failure surfaces as [`RemoteError::LogStreamInterrupted`] so
/// callers can distinguish it from normal completion; presentation layers
/// that prefer the historical behaviour simply treat it as end-of-logs.
pub trait LogStream: Send {
    /// Returns the next chunk of log bytes, or `None` once the stream ends.
    fn next_chunk(&mut self) -> ApiFuture<'_, Option<Bytes>>;
}

/// Operations exposed by the workbench service.
///
/// One method per wire endpoint; see the endpoint table in the service
/// documentation. Implementations perform no retries: every failure is
/// surfaced to the caller exactly once.
pub trait RemoteService {
    /// Provisions a new workbench namespace.
    fn create_workbench<'a>(&'a self, name: &'a str) -> ApiFuture<'a, WorkbenchReceipt>;

    /// Lists the caller's workbenches.
    fn list_workbenches(&self) -> ApiFuture<'_, Vec<WorkbenchEntry>>;

    /// Lists files in a workbench, optionally below a path prefix.
    fn list_files<'a>(
        &'a self,
        workbench: &'a str,
        path: Option<&'a str>,
    ) -> ApiFuture<'a, Vec<FileEntry>>;

    /// Uploads one file's bytes to a destination path in the namespace.
    fn upload_file<'a>(
        &'a self,
        workbench: &'a str,
        destination: &'a str,
        payload: Vec<u8>,
    ) -> ApiFuture<'a, UploadReceipt>;

    /// Asks the service to pull a URL into the namespace.
    fn fetch_by_url<'a>(
        &'a self,
        workbench: &'a str,
        request: &'a FetchRequest,
    ) -> ApiFuture<'a, FetchReceipt>;

    /// Requests a download descriptor for a stored file.
    fn download_file<'a>(
        &'a self,
        workbench: &'a str,
        file_path: &'a str,
    ) -> ApiFuture<'a, DownloadDescriptor>;

    /// Moves a file inside the namespace. Soft failure: see [`MoveOutcome`].
    fn move_file<'a>(
        &'a self,
        workbench: &'a str,
        request: &'a MoveRequest,
    ) -> ApiFuture<'a, MoveOutcome>;

    /// Creates a directory inside the namespace.
    fn create_directory<'a>(
        &'a self,
        workbench: &'a str,
        path: &'a str,
    ) -> ApiFuture<'a, DirectoryReceipt>;

    /// Deletes a file or directory inside the namespace.
    fn delete_path<'a>(
        &'a self,
        workbench: &'a str,
        path: &'a str,
    ) -> ApiFuture<'a, DeletionReceipt>;

    /// Submits a job for execution.
    fn submit_job<'a>(
        &'a self,
        workbench: &'a str,
        request: &'a SubmitRequest,
    ) -> ApiFuture<'a, JobReceipt>;

    /// Queries the current status of a job. `Ok(None)` means the job record
    /// is not visible on the service (yet).
    fn job_status<'a>(&'a self, id: &'a str) -> ApiFuture<'a, Option<JobStatus>>;

    /// Fetches the full log payload of a job.
    fn job_logs<'a>(&'a self, id: &'a str) -> ApiFuture<'a, String>;

    /// Opens a long-lived log stream for a job.
    fn stream_job_logs<'a>(&'a self, id: &'a str) -> ApiFuture<'a, Box<dyn LogStream>>;
}

/// Errors raised by the remote service seam.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RemoteError {
    /// Raised when a workbench cannot be provisioned.
    #[error("failed to create workbench '{workbench}': {detail}")]
    Provisioning {
        /// Namespace that could not be created.
        workbench: String,
        /// Failure detail from the service.
        detail: String,
    },
    /// Raised when a file or workbench listing fails.
    #[error("failed to list {scope}: {detail}")]
    Listing {
        /// What was being listed (a namespace, or `workbenches`).
        scope: String,
        /// Failure detail from the service.
        detail: String,
    },
    /// Raised when an upload is rejected or a local file cannot be read.
    #[error("failed to upload to '{destination}': {detail}")]
    Upload {
        /// Destination path inside the namespace.
        destination: String,
        /// Failure detail.
        detail: String,
    },
    /// Raised when a download descriptor cannot be obtained.
    #[error("failed to download '{file_path}': {detail}")]
    Download {
        /// Requested file path.
        file_path: String,
        /// Failure detail from the service.
        detail: String,
    },
    /// Raised when the service rejects a job or transfer submission.
    #[error("failed to submit to workbench '{workbench}': {detail}")]
    Submission {
        /// Namespace the submission targeted.
        workbench: String,
        /// Failure detail from the service.
        detail: String,
    },
    /// Raised when a status query fails for a reason other than the job
    /// record being absent.
    #[error("failed to query status of job '{id}': {detail}")]
    ExecutionQuery {
        /// Job identifier.
        id: String,
        /// Failure detail from the service.
        detail: String,
    },
    /// Raised when a log payload cannot be retrieved.
    #[error("failed to retrieve logs for job '{id}': {detail}")]
    LogRetrieval {
        /// Job identifier.
        id: String,
        /// Failure detail from the service.
        detail: String,
    },
    /// Raised when an open log stream dies before the remote side closes it.
    #[error("log stream for job '{id}' was interrupted: {detail}")]
    LogStreamInterrupted {
        /// Job identifier.
        id: String,
        /// Transport-level detail.
        detail: String,
    },
    /// Raised when a directory cannot be created.
    #[error("failed to create directory '{path}': {detail}")]
    Directory {
        /// Requested directory path.
        path: String,
        /// Failure detail from the service.
        detail: String,
    },
    /// Raised when a path cannot be deleted.
    #[error("failed to delete '{path}': {detail}")]
    Deletion {
        /// Requested path.
        path: String,
        /// Failure detail from the service.
        detail: String,
    },
    /// Transport-level or auth-style failure on any operation.
    #[error("remote operation '{operation}' failed: {detail}")]
    RemoteOperation {
        /// Operation that failed (for example `submit_job`).
        operation: String,
        /// Failure detail.
        detail: String,
    },
    /// Raised when the service reports a state outside the closed status
    /// vocabulary.
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatusError),
}

#[cfg(test)]
mod tests {
    use super::{FileEntry, JobReceipt, MoveOutcome, WorkbenchEntry};

    #[test]
    fn job_receipt_tolerates_missing_optional_fields() {
        let receipt: JobReceipt = serde_json::from_str(r#"{"id":"job-9","tool":"salmon"}"#)
            .unwrap_or_else(|err| panic!("receipt should decode: {err}"));
        assert_eq!(receipt.id, "job-9");
        assert!(receipt.version.is_empty());
        assert!(receipt.full_command.is_empty());
    }

    #[test]
    fn file_entry_defaults_size_to_zero() {
        let entry: FileEntry = serde_json::from_str(r#"{"name":"input/reads.fastq"}"#)
            .unwrap_or_else(|err| panic!("entry should decode: {err}"));
        assert_eq!(entry.size, 0);
    }

    #[test]
    fn workbench_entry_decodes_listing_payload() {
        let entry: WorkbenchEntry = serde_json::from_str(
            r#"{"name":"rnaseq","size":123456,"updated_at":"2024-07-01T12:00:00Z"}"#,
        )
        .unwrap_or_else(|err| panic!("entry should decode: {err}"));
        assert_eq!(entry.name, "rnaseq");
        assert_eq!(entry.size, 123_456);
    }

    #[test]
    fn move_outcome_carries_the_detail_message() {
        let outcome: MoveOutcome = serde_json::from_str(r#"{"message":"moved"}"#)
            .unwrap_or_else(|err| panic!("outcome should decode: {err}"));
        assert_eq!(outcome.message, "moved");
    }
}
