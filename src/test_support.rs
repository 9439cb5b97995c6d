//! Test support utilities shared across unit and integration tests.

use std::collections::VecDeque;
use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;

use crate::remote::{
    ApiFuture, DeletionReceipt, DirectoryReceipt, DownloadDescriptor, FetchReceipt, FetchRequest,
    FileEntry, JobReceipt, LogStream, MoveOutcome, MoveRequest, RemoteError, RemoteService,
    SubmitRequest, UploadReceipt, WorkbenchEntry, WorkbenchReceipt,
};
use crate::status::JobStatus;

type Scripted<T> = Mutex<VecDeque<Result<T, RemoteError>>>;

/// Records a single upload made through [`FakeRemote`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UploadRecord {
    /// Namespace the upload targeted.
    pub workbench: String,
    /// Destination path inside the namespace.
    pub destination: String,
    /// Uploaded bytes, verbatim.
    pub payload: Vec<u8>,
}

/// Scripted remote service double that returns pre-seeded responses in FIFO
/// order and records every invocation.
///
/// Unscripted calls fail loudly with a `RemoteOperation` error, except for
/// operations with an obvious acknowledgement (workbench creation echoes
/// the requested name, uploads acknowledge silently).
#[derive(Debug, Default)]
pub struct FakeRemote {
    statuses: Scripted<Option<JobStatus>>,
    submit_results: Scripted<JobReceipt>,
    fetch_results: Scripted<FetchReceipt>,
    move_results: Scripted<MoveOutcome>,
    log_results: Scripted<String>,
    file_listings: Scripted<Vec<FileEntry>>,
    workbench_listings: Scripted<Vec<WorkbenchEntry>>,
    create_results: Scripted<WorkbenchReceipt>,
    directory_results: Scripted<DirectoryReceipt>,
    deletion_results: Scripted<DeletionReceipt>,
    download_results: Scripted<DownloadDescriptor>,
    upload_results: Scripted<UploadReceipt>,
    chunks: Mutex<VecDeque<Result<Bytes, RemoteError>>>,
    stream_open_errors: Mutex<VecDeque<RemoteError>>,
    status_queries: Mutex<Vec<String>>,
    uploads: Mutex<Vec<UploadRecord>>,
    submissions: Mutex<Vec<SubmitRequest>>,
    fetches: Mutex<Vec<FetchRequest>>,
    moves: Mutex<Vec<MoveRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn unscripted(operation: &str) -> RemoteError {
    RemoteError::RemoteOperation {
        operation: operation.to_owned(),
        detail: String::from("no scripted response available"),
    }
}

fn pop<T>(queue: &Scripted<T>, operation: &str) -> Result<T, RemoteError> {
    lock(queue)
        .pop_front()
        .unwrap_or_else(|| Err(unscripted(operation)))
}

impl FakeRemote {
    /// Creates a fake with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a status answer; `None` simulates an absent job record.
    pub fn push_status(&self, status: Option<JobStatus>) {
        lock(&self.statuses).push_back(Ok(status));
    }

    /// Queues a status query failure.
    pub fn push_status_error(&self, error: RemoteError) {
        lock(&self.statuses).push_back(Err(error));
    }

    /// Queues a submission outcome.
    pub fn push_submit(&self, result: Result<JobReceipt, RemoteError>) {
        lock(&self.submit_results).push_back(result);
    }

    /// Queues a fetch-by-URL outcome.
    pub fn push_fetch(&self, result: Result<FetchReceipt, RemoteError>) {
        lock(&self.fetch_results).push_back(result);
    }

    /// Queues a move outcome.
    pub fn push_move(&self, result: Result<MoveOutcome, RemoteError>) {
        lock(&self.move_results).push_back(result);
    }

    /// Queues a log payload outcome.
    pub fn push_logs(&self, result: Result<String, RemoteError>) {
        lock(&self.log_results).push_back(result);
    }

    /// Queues a file listing outcome.
    pub fn push_files(&self, result: Result<Vec<FileEntry>, RemoteError>) {
        lock(&self.file_listings).push_back(result);
    }

    /// Queues a workbench listing outcome.
    pub fn push_workbenches(&self, result: Result<Vec<WorkbenchEntry>, RemoteError>) {
        lock(&self.workbench_listings).push_back(result);
    }

    /// Queues a workbench creation outcome.
    pub fn push_create(&self, result: Result<WorkbenchReceipt, RemoteError>) {
        lock(&self.create_results).push_back(result);
    }

    /// Queues a directory creation outcome.
    pub fn push_directory(&self, result: Result<DirectoryReceipt, RemoteError>) {
        lock(&self.directory_results).push_back(result);
    }

    /// Queues a deletion outcome.
    pub fn push_deletion(&self, result: Result<DeletionReceipt, RemoteError>) {
        lock(&self.deletion_results).push_back(result);
    }

    /// Queues a download descriptor outcome.
    pub fn push_download(&self, result: Result<DownloadDescriptor, RemoteError>) {
        lock(&self.download_results).push_back(result);
    }

    /// Queues an upload outcome.
    pub fn push_upload(&self, result: Result<UploadReceipt, RemoteError>) {
        lock(&self.upload_results).push_back(result);
    }

    /// Queues a log chunk for the next opened stream.
    pub fn push_log_chunk(&self, chunk: &[u8]) {
        lock(&self.chunks).push_back(Ok(Bytes::copy_from_slice(chunk)));
    }

    /// Queues a mid-stream interruption for the next opened stream.
    pub fn push_log_interruption(&self, error: RemoteError) {
        lock(&self.chunks).push_back(Err(error));
    }

    /// Queues a failure for the next attempt to open a log stream.
    pub fn push_stream_open_error(&self, error: RemoteError) {
        lock(&self.stream_open_errors).push_back(error);
    }

    /// Returns every job identifier queried for status, in order.
    #[must_use]
    pub fn status_queries(&self) -> Vec<String> {
        lock(&self.status_queries).clone()
    }

    /// Returns every upload made, in order.
    #[must_use]
    pub fn uploads(&self) -> Vec<UploadRecord> {
        lock(&self.uploads).clone()
    }

    /// Returns every submission payload sent, in order.
    #[must_use]
    pub fn submissions(&self) -> Vec<SubmitRequest> {
        lock(&self.submissions).clone()
    }

    /// Returns every fetch-by-URL payload sent, in order.
    #[must_use]
    pub fn fetches(&self) -> Vec<FetchRequest> {
        lock(&self.fetches).clone()
    }

    /// Returns every move payload sent, in order.
    #[must_use]
    pub fn moves(&self) -> Vec<MoveRequest> {
        lock(&self.moves).clone()
    }
}

/// Log stream double that yields pre-seeded chunks in FIFO order.
#[derive(Debug, Default)]
pub struct FakeLogStream {
    chunks: VecDeque<Result<Bytes, RemoteError>>,
}

impl FakeLogStream {
    /// Creates a stream over the given chunk outcomes.
    #[must_use]
    pub fn new(chunks: VecDeque<Result<Bytes, RemoteError>>) -> Self {
        Self { chunks }
    }
}

impl LogStream for FakeLogStream {
    fn next_chunk(&mut self) -> ApiFuture<'_, Option<Bytes>> {
        let next = self.chunks.pop_front();
        Box::pin(async move {
            match next {
                Some(Ok(chunk)) => Ok(Some(chunk)),
                Some(Err(err)) => Err(err),
                None => Ok(None),
            }
        })
    }
}

impl RemoteService for FakeRemote {
    fn create_workbench<'a>(&'a self, name: &'a str) -> ApiFuture<'a, WorkbenchReceipt> {
        let result = lock(&self.create_results).pop_front().unwrap_or_else(|| {
            Ok(WorkbenchReceipt {
                workbench_name: name.to_owned(),
            })
        });
        Box::pin(async move { result })
    }

    fn list_workbenches(&self) -> ApiFuture<'_, Vec<WorkbenchEntry>> {
        let result = pop(&self.workbench_listings, "list_workbenches");
        Box::pin(async move { result })
    }

    fn list_files<'a>(
        &'a self,
        _workbench: &'a str,
        _path: Option<&'a str>,
    ) -> ApiFuture<'a, Vec<FileEntry>> {
        let result = pop(&self.file_listings, "list_files");
        Box::pin(async move { result })
    }

    fn upload_file<'a>(
        &'a self,
        workbench: &'a str,
        destination: &'a str,
        payload: Vec<u8>,
    ) -> ApiFuture<'a, UploadReceipt> {
        lock(&self.uploads).push(UploadRecord {
            workbench: workbench.to_owned(),
            destination: destination.to_owned(),
            payload,
        });
        let result = lock(&self.upload_results)
            .pop_front()
            .unwrap_or_else(|| Ok(UploadReceipt::default()));
        Box::pin(async move { result })
    }

    fn fetch_by_url<'a>(
        &'a self,
        _workbench: &'a str,
        request: &'a FetchRequest,
    ) -> ApiFuture<'a, FetchReceipt> {
        lock(&self.fetches).push(request.clone());
        let result = pop(&self.fetch_results, "fetch_by_url");
        Box::pin(async move { result })
    }

    fn download_file<'a>(
        &'a self,
        _workbench: &'a str,
        _file_path: &'a str,
    ) -> ApiFuture<'a, DownloadDescriptor> {
        let result = pop(&self.download_results, "download_file");
        Box::pin(async move { result })
    }

    fn move_file<'a>(
        &'a self,
        _workbench: &'a str,
        request: &'a MoveRequest,
    ) -> ApiFuture<'a, MoveOutcome> {
        lock(&self.moves).push(request.clone());
        let result = pop(&self.move_results, "move_file");
        Box::pin(async move { result })
    }

    fn create_directory<'a>(
        &'a self,
        _workbench: &'a str,
        _path: &'a str,
    ) -> ApiFuture<'a, DirectoryReceipt> {
        let result = pop(&self.directory_results, "create_directory");
        Box::pin(async move { result })
    }

    fn delete_path<'a>(
        &'a self,
        _workbench: &'a str,
        _path: &'a str,
    ) -> ApiFuture<'a, DeletionReceipt> {
        let result = pop(&self.deletion_results, "delete_path");
        Box::pin(async move { result })
    }

    fn submit_job<'a>(
        &'a self,
        _workbench: &'a str,
        request: &'a SubmitRequest,
    ) -> ApiFuture<'a, JobReceipt> {
        lock(&self.submissions).push(request.clone());
        let result = pop(&self.submit_results, "submit_job");
        Box::pin(async move { result })
    }

    fn job_status<'a>(&'a self, id: &'a str) -> ApiFuture<'a, Option<JobStatus>> {
        lock(&self.status_queries).push(id.to_owned());
        let result = pop(&self.statuses, "job_status");
        Box::pin(async move { result })
    }

    fn job_logs<'a>(&'a self, _id: &'a str) -> ApiFuture<'a, String> {
        let result = pop(&self.log_results, "job_logs");
        Box::pin(async move { result })
    }

    fn stream_job_logs<'a>(&'a self, _id: &'a str) -> ApiFuture<'a, Box<dyn LogStream>> {
        let open_error = lock(&self.stream_open_errors).pop_front();
        let queued: VecDeque<Result<Bytes, RemoteError>> = lock(&self.chunks).drain(..).collect();
        Box::pin(async move {
            if let Some(err) = open_error {
                return Err(err);
            }
            Ok(Box::new(FakeLogStream::new(queued)) as Box<dyn LogStream>)
        })
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: tokio::sync::MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets one environment variable while holding the global env mutex.
    pub async fn set_var(key: &str, value: &str) -> Self {
        Self::set_vars(&[(key, value)]).await
    }

    /// Sets multiple environment variables while holding the global env
    /// mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
