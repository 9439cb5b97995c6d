//! Core library for the Skiff workbench client.
//!
//! The crate wraps a remote "workbench" service (a cloud storage namespace
//! plus a compute execution environment) behind a small set of
//! abstractions: a [`Workbench`] handle owning a collection of [`Job`]s,
//! each caching its last observed lifecycle state so that polling stops the
//! moment a terminal state is seen. All real work happens on the remote
//! service; this client only submits, transfers, and polls.

pub mod auth;
pub mod config;
pub mod http;
pub mod job;
pub mod remote;
pub mod render;
pub mod status;
pub mod test_support;
pub mod workbench;

pub use auth::{AUTH_TOKEN_ENV, AuthenticationMissing, Credential};
pub use config::{ConfigError, ServiceConfig};
pub use http::HttpRemoteService;
pub use job::{Job, JobState};
pub use remote::{
    ApiFuture, DeletionReceipt, DirectoryReceipt, DownloadDescriptor, FetchReceipt, FetchRequest,
    FileEntry, JobReceipt, LogStream, MoveOutcome, MoveRequest, NOT_SUBMITTED_ID, RemoteError,
    RemoteService, SubmitRequest, UploadReceipt, WorkbenchEntry, WorkbenchReceipt,
};
pub use status::{ALL_STATUSES, JobStatus, UnknownStatusError};
pub use workbench::Workbench;
