//! A provisioned remote namespace and its tracked jobs.
//!
//! The in-memory job collection is a purely local cache: it is populated by
//! submissions made through this handle and dies with the process. The
//! service keeps the authoritative records, reachable by identifier via
//! [`Workbench::job_handle`].

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use uuid::Uuid;

use crate::job::Job;
use crate::remote::{
    DeletionReceipt, DirectoryReceipt, DownloadDescriptor, FetchRequest, FileEntry, MoveOutcome,
    MoveRequest, RemoteError, RemoteService, SubmitRequest, WorkbenchEntry,
};
use crate::render::JobRow;

/// Prefix under which uploaded files land in the namespace.
const INPUT_PREFIX: &str = "input";

/// Tool name recorded for fetch-by-URL transfer jobs.
const FETCH_TOOL: &str = "fetch";

/// Handle to one workbench namespace.
///
/// Owns the canonical job collection; jobs themselves hold only a
/// back-reference to the namespace and the remote service, never the
/// collection. All collection mutation goes through `&mut self`.
pub struct Workbench<R> {
    name: String,
    remote: Arc<R>,
    jobs: IndexMap<String, Job<R>>,
}

impl<R> std::fmt::Debug for Workbench<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbench")
            .field("name", &self.name)
            .field("jobs", &self.jobs.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl<R> Workbench<R> {
    /// Binds to an existing namespace without touching the service.
    #[must_use]
    pub fn attach(remote: Arc<R>, name: &str) -> Self {
        Self {
            name: name.to_owned(),
            remote,
            jobs: IndexMap::new(),
        }
    }

    /// Namespace name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks a job up in the local collection. Never queries the service;
    /// use [`Job::refresh_status`] for that.
    #[must_use]
    pub fn get_job(&self, id: &str) -> Option<&Job<R>> {
        self.jobs.get(id)
    }

    /// Iterates tracked jobs in insertion order.
    #[must_use]
    pub fn jobs(&self) -> impl Iterator<Item = &Job<R>> {
        self.jobs.values()
    }

    /// Number of tracked jobs.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Removes a job from the local collection, preserving the insertion
    /// order of the remaining entries. The remote record is unaffected.
    pub fn remove_job(&mut self, id: &str) -> Option<Job<R>> {
        self.jobs.shift_remove(id)
    }

    /// Builds an untracked handle for a job identifier learned out of band
    /// (for example from a previous process). The handle starts as
    /// `NotStarted` and refreshes like any other job.
    #[must_use]
    pub fn job_handle(&self, id: &str) -> Job<R> {
        Job::adopted(Arc::clone(&self.remote), &self.name, id)
    }
}

impl<R: RemoteService> Workbench<R> {
    /// Provisions a new namespace on the service and binds to it.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Provisioning`] when the service rejects the
    /// request.
    pub async fn provision(remote: Arc<R>, name: &str) -> Result<Self, RemoteError> {
        let receipt = remote.create_workbench(name).await?;
        Ok(Self::attach(remote, &receipt.workbench_name))
    }

    /// Provisions a namespace with a collision-free generated name.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Provisioning`] when the service rejects the
    /// request.
    pub async fn provision_unique(remote: Arc<R>, prefix: &str) -> Result<Self, RemoteError> {
        let name = format!("{prefix}-{}", Uuid::new_v4().simple());
        Self::provision(remote, &name).await
    }

    /// Lists the caller's workbenches.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Listing`] when the service rejects the
    /// request.
    pub async fn list(remote: &R) -> Result<Vec<WorkbenchEntry>, RemoteError> {
        remote.list_workbenches().await
    }

    /// Submits a job for execution.
    ///
    /// On success the returned job starts as `Queued` and is tracked in the
    /// collection under its identifier; the returned handle shares its
    /// state cell with the tracked entry. On failure the returned job
    /// carries the sentinel identifier `"N/A"`, echoes the requested
    /// tool/command, reports the failure text as its status, and is NOT
    /// tracked. Submission failures are deliberately soft so batch
    /// workflows can continue; nothing is retried.
    pub async fn submit(&mut self, tool: &str, full_command: &str) -> Job<R> {
        let request = SubmitRequest {
            tool: tool.to_owned(),
            full_command: full_command.to_owned(),
        };
        match self.remote.submit_job(&self.name, &request).await {
            Ok(receipt) => {
                let command = if receipt.full_command.is_empty() {
                    request.full_command
                } else {
                    receipt.full_command
                };
                let job = Job::accepted(
                    Arc::clone(&self.remote),
                    &self.name,
                    receipt.id.clone(),
                    receipt.tool,
                    receipt.version,
                    command,
                );
                self.jobs.insert(receipt.id, job.clone());
                job
            }
            Err(err) => Job::rejected(
                Arc::clone(&self.remote),
                &self.name,
                tool,
                full_command,
                err.to_string(),
            ),
        }
    }

    /// Asks the service to pull each `(source_url, destination_path)` pair
    /// into the namespace, producing one tracked transfer job per pair.
    /// Each job defaults to `Queued` with version `"latest"`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Submission`] for the first rejected pair;
    /// previously accepted pairs stay tracked.
    pub async fn submit_remote_fetch(
        &mut self,
        sources: &[(String, String)],
        method: &str,
    ) -> Result<Vec<Job<R>>, RemoteError> {
        let mut submitted = Vec::with_capacity(sources.len());
        for (input_url, output_path) in sources {
            let request = FetchRequest {
                input_url: input_url.clone(),
                output_path: output_path.clone(),
                method: method.to_owned(),
            };
            let receipt = self.remote.fetch_by_url(&self.name, &request).await?;
            let command = format!("{method} {input_url} {output_path}");
            let job = Job::accepted(
                Arc::clone(&self.remote),
                &self.name,
                receipt.id.clone(),
                FETCH_TOOL.to_owned(),
                String::from("latest"),
                command,
            );
            self.jobs.insert(receipt.id, job.clone());
            submitted.push(job);
        }
        Ok(submitted)
    }

    /// Refreshes every tracked job in place and returns summary rows in
    /// insertion order, skipping rows whose refreshed status label appears
    /// in `exclude`. Jobs with a cached terminal state cost zero remote
    /// calls.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::ExecutionQuery`] when a status refresh fails.
    pub async fn list_jobs(&self, exclude: &[&str]) -> Result<Vec<JobRow>, RemoteError> {
        let mut rows = Vec::with_capacity(self.jobs.len());
        for job in self.jobs.values() {
            let state = job.refresh_status().await?;
            let label = state.label();
            if exclude.iter().any(|skip| *skip == label) {
                continue;
            }
            rows.push(job.row());
        }
        Ok(rows)
    }

    /// Uploads a local file, or every file directly inside a local
    /// directory, into the namespace's `input/` area. Returns the mapping
    /// from local path to remote path.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Upload`] when a local path cannot be read or
    /// the service rejects an upload.
    pub async fn upload(
        &self,
        local: &Utf8Path,
    ) -> Result<IndexMap<Utf8PathBuf, String>, RemoteError> {
        let metadata = tokio::fs::metadata(local.as_std_path())
            .await
            .map_err(|err| upload_error(local.as_str(), &err.to_string()))?;
        let base = local
            .file_name()
            .ok_or_else(|| upload_error(local.as_str(), "path has no file name"))?;

        let mut mapping = IndexMap::new();
        if metadata.is_dir() {
            self.upload_directory(local, base, &mut mapping).await?;
        } else {
            let destination = format!("{INPUT_PREFIX}/{base}");
            self.upload_one(local, &destination).await?;
            mapping.insert(local.to_owned(), destination);
        }
        Ok(mapping)
    }

    async fn upload_directory(
        &self,
        local: &Utf8Path,
        base: &str,
        mapping: &mut IndexMap<Utf8PathBuf, String>,
    ) -> Result<(), RemoteError> {
        let mut entries = tokio::fs::read_dir(local.as_std_path())
            .await
            .map_err(|err| upload_error(local.as_str(), &err.to_string()))?;
        loop {
            let next = entries
                .next_entry()
                .await
                .map_err(|err| upload_error(local.as_str(), &err.to_string()))?;
            let Some(entry) = next else { break };
            let file_type = entry
                .file_type()
                .await
                .map_err(|err| upload_error(local.as_str(), &err.to_string()))?;
            if !file_type.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let source = local.join(&file_name);
            let destination = format!("{INPUT_PREFIX}/{base}/{file_name}");
            self.upload_one(&source, &destination).await?;
            mapping.insert(source, destination);
        }
        Ok(())
    }

    async fn upload_one(&self, source: &Utf8Path, destination: &str) -> Result<(), RemoteError> {
        let payload = tokio::fs::read(source.as_std_path())
            .await
            .map_err(|err| upload_error(destination, &err.to_string()))?;
        self.remote
            .upload_file(&self.name, destination, payload)
            .await?;
        Ok(())
    }

    /// Requests a download descriptor for a stored file.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Download`] when the service rejects the
    /// request.
    pub async fn download(&self, file_path: &str) -> Result<DownloadDescriptor, RemoteError> {
        self.remote.download_file(&self.name, file_path).await
    }

    /// Lists files in the namespace, optionally below a path prefix.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Listing`] when the service rejects the
    /// request.
    pub async fn list_files(&self, path: Option<&str>) -> Result<Vec<FileEntry>, RemoteError> {
        self.remote.list_files(&self.name, path).await
    }

    /// Moves a file inside the namespace. A refused move is reported in the
    /// returned [`MoveOutcome`] rather than raised.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::RemoteOperation`] only on transport-level
    /// failures.
    pub async fn move_file(
        &self,
        source: &str,
        destination: &str,
    ) -> Result<MoveOutcome, RemoteError> {
        let request = MoveRequest {
            source_file_name: source.to_owned(),
            destination_file_name: destination.to_owned(),
        };
        self.remote.move_file(&self.name, &request).await
    }

    /// Creates a directory inside the namespace.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Directory`] when the service rejects the
    /// request.
    pub async fn create_directory(&self, path: &str) -> Result<DirectoryReceipt, RemoteError> {
        self.remote.create_directory(&self.name, path).await
    }

    /// Deletes a file or directory inside the namespace.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Deletion`] when the service rejects the
    /// request.
    pub async fn delete_path(&self, path: &str) -> Result<DeletionReceipt, RemoteError> {
        self.remote.delete_path(&self.name, path).await
    }
}

fn upload_error(destination: &str, detail: &str) -> RemoteError {
    RemoteError::Upload {
        destination: destination.to_owned(),
        detail: detail.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use camino::Utf8PathBuf;

    use super::Workbench;
    use crate::job::JobState;
    use crate::remote::{FetchReceipt, JobReceipt, MoveOutcome, RemoteError};
    use crate::status::JobStatus;
    use crate::test_support::FakeRemote;

    fn receipt(id: &str) -> JobReceipt {
        JobReceipt {
            id: id.to_owned(),
            tool: String::from("salmon"),
            version: String::from("1.10.1"),
            full_command: String::from("salmon quant -i index"),
        }
    }

    #[tokio::test]
    async fn accepted_submission_is_tracked_as_queued() {
        let remote = Arc::new(FakeRemote::new());
        remote.push_submit(Ok(receipt("job-123")));
        let mut bench = Workbench::attach(Arc::clone(&remote), "demo");

        let job = bench.submit("salmon", "salmon quant -i index").await;

        assert_eq!(job.id(), "job-123");
        assert_eq!(
            job.state_snapshot(),
            JobState::Reported(JobStatus::Queued)
        );
        let tracked = bench
            .get_job("job-123")
            .unwrap_or_else(|| panic!("job should be tracked"));
        assert_eq!(tracked.command(), "salmon quant -i index");
    }

    #[tokio::test]
    async fn rejected_submission_is_soft_and_untracked() {
        let remote = Arc::new(FakeRemote::new());
        remote.push_submit(Err(RemoteError::Submission {
            workbench: String::from("demo"),
            detail: String::from("HTTP 500: scheduler offline"),
        }));
        let mut bench = Workbench::attach(Arc::clone(&remote), "demo");

        let job = bench.submit("salmon", "salmon quant -i index").await;

        assert_eq!(job.id(), "N/A");
        assert_eq!(job.tool(), "salmon");
        assert_eq!(job.command(), "salmon quant -i index");
        assert!(job.state_snapshot().label().contains("scheduler offline"));
        assert!(bench.get_job("N/A").is_none(), "collection stays unchanged");
        assert_eq!(bench.job_count(), 0);
    }

    #[tokio::test]
    async fn list_jobs_excludes_by_label_and_keeps_insertion_order() {
        let remote = Arc::new(FakeRemote::new());
        remote.push_submit(Ok(receipt("job-1")));
        remote.push_submit(Ok(receipt("job-2")));
        remote.push_submit(Ok(receipt("job-3")));
        let mut bench = Workbench::attach(Arc::clone(&remote), "demo");
        bench.submit("salmon", "a").await;
        bench.submit("salmon", "b").await;
        bench.submit("salmon", "c").await;

        remote.push_status(Some(JobStatus::Running));
        remote.push_status(Some(JobStatus::Failed));
        remote.push_status(Some(JobStatus::Succeeded));

        let rows = bench
            .list_jobs(&["Failed"])
            .await
            .unwrap_or_else(|err| panic!("listing should succeed: {err}"));

        let ids: Vec<&str> = rows.iter().map(|row| row.identifier.as_str()).collect();
        assert_eq!(ids, vec!["job-1", "job-3"]);
        let statuses: Vec<&str> = rows.iter().map(|row| row.status.as_str()).collect();
        assert_eq!(statuses, vec!["Running", "Succeeded"]);
    }

    #[tokio::test]
    async fn list_jobs_skips_remote_calls_for_settled_jobs() {
        let remote = Arc::new(FakeRemote::new());
        remote.push_submit(Ok(receipt("job-1")));
        let mut bench = Workbench::attach(Arc::clone(&remote), "demo");
        bench.submit("salmon", "a").await;

        remote.push_status(Some(JobStatus::Succeeded));
        bench
            .list_jobs(&[])
            .await
            .unwrap_or_else(|err| panic!("first listing: {err}"));
        bench
            .list_jobs(&[])
            .await
            .unwrap_or_else(|err| panic!("second listing: {err}"));

        assert_eq!(
            remote.status_queries().len(),
            1,
            "terminal job must not be re-queried"
        );
    }

    #[tokio::test]
    async fn remote_fetch_tracks_one_job_per_pair() {
        let remote = Arc::new(FakeRemote::new());
        remote.push_fetch(Ok(FetchReceipt {
            id: String::from("job-a"),
            input: String::from("https://example.test/reads.fastq"),
        }));
        remote.push_fetch(Ok(FetchReceipt {
            id: String::from("job-b"),
            input: String::from("https://example.test/ref.fa"),
        }));
        let mut bench = Workbench::attach(Arc::clone(&remote), "demo");

        let sources = vec![
            (
                String::from("https://example.test/reads.fastq"),
                String::from("input/reads.fastq"),
            ),
            (
                String::from("https://example.test/ref.fa"),
                String::from("input/ref.fa"),
            ),
        ];
        let jobs = bench
            .submit_remote_fetch(&sources, "download")
            .await
            .unwrap_or_else(|err| panic!("fetch should succeed: {err}"));

        assert_eq!(jobs.len(), 2);
        let first = jobs
            .first()
            .unwrap_or_else(|| panic!("first fetch job missing"));
        assert_eq!(first.version(), "latest");
        assert_eq!(
            first.state_snapshot(),
            JobState::Reported(JobStatus::Queued)
        );
        assert_eq!(bench.job_count(), 2);
        assert!(bench.get_job("job-b").is_some());
    }

    #[tokio::test]
    async fn move_refusal_is_reported_not_raised() {
        let remote = Arc::new(FakeRemote::new());
        remote.push_move(Ok(MoveOutcome {
            message: String::from("HTTP 409: destination exists"),
        }));
        let bench = Workbench::attach(Arc::clone(&remote), "demo");

        let outcome = bench
            .move_file("input/a.txt", "input/b.txt")
            .await
            .unwrap_or_else(|err| panic!("soft failure should not raise: {err}"));

        assert_eq!(outcome.message, "HTTP 409: destination exists");
    }

    #[tokio::test]
    async fn upload_maps_local_paths_to_input_prefix() {
        let dir = tempfile::tempdir().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .unwrap_or_else(|path| panic!("tempdir is not UTF-8: {}", path.display()));
        let data_dir = root.join("reads");
        std::fs::create_dir(&data_dir).unwrap_or_else(|err| panic!("create dir: {err}"));
        std::fs::write(data_dir.join("r1.fastq"), b"@read1")
            .unwrap_or_else(|err| panic!("write fixture: {err}"));
        std::fs::write(data_dir.join("r2.fastq"), b"@read2")
            .unwrap_or_else(|err| panic!("write fixture: {err}"));

        let remote = Arc::new(FakeRemote::new());
        let bench = Workbench::attach(Arc::clone(&remote), "demo");

        let mapping = bench
            .upload(&data_dir)
            .await
            .unwrap_or_else(|err| panic!("upload should succeed: {err}"));

        let mut destinations: Vec<&str> = mapping.values().map(String::as_str).collect();
        destinations.sort_unstable();
        assert_eq!(destinations, vec!["input/reads/r1.fastq", "input/reads/r2.fastq"]);
        assert_eq!(remote.uploads().len(), 2);
    }

    #[tokio::test]
    async fn removed_job_is_forgotten_locally() {
        let remote = Arc::new(FakeRemote::new());
        remote.push_submit(Ok(receipt("job-1")));
        let mut bench = Workbench::attach(Arc::clone(&remote), "demo");
        bench.submit("salmon", "a").await;

        let removed = bench.remove_job("job-1");
        assert!(removed.is_some());
        assert!(bench.get_job("job-1").is_none());
    }
}
