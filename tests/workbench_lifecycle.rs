//! End-to-end lifecycle scenarios against a scripted remote.

use std::sync::Arc;

use skiff::test_support::FakeRemote;
use skiff::{
    FetchReceipt, JobReceipt, JobState, JobStatus, MoveOutcome, RemoteError, Workbench,
    WorkbenchReceipt,
};

fn receipt(id: &str, tool: &str, command: &str) -> JobReceipt {
    JobReceipt {
        id: id.to_owned(),
        tool: tool.to_owned(),
        version: String::from("1.10.1"),
        full_command: command.to_owned(),
    }
}

#[tokio::test]
async fn submitted_job_is_polled_until_terminal_then_cached() {
    let remote = Arc::new(FakeRemote::new());
    remote.push_submit(Ok(receipt("job-123", "salmon", "salmon quant -i index")));
    let mut bench = Workbench::attach(Arc::clone(&remote), "rnaseq");

    let job = bench.submit("salmon", "salmon quant -i index").await;
    assert_eq!(job.id(), "job-123");
    assert_eq!(job.state_snapshot(), JobState::Reported(JobStatus::Queued));

    remote.push_status(Some(JobStatus::Scheduled));
    remote.push_status(Some(JobStatus::Running));
    remote.push_status(Some(JobStatus::Succeeded));

    let mut observed = Vec::new();
    for _ in 0..5 {
        let state = job
            .refresh_status()
            .await
            .unwrap_or_else(|err| panic!("refresh: {err}"));
        observed.push(state.label());
        if state.is_settled() {
            break;
        }
    }

    assert_eq!(observed, vec!["Scheduled", "Running", "Succeeded"]);
    assert_eq!(
        remote.status_queries().len(),
        3,
        "polling must stop at the terminal state"
    );

    // Further refreshes answer from the cache.
    let cached = job
        .refresh_status()
        .await
        .unwrap_or_else(|err| panic!("cached refresh: {err}"));
    assert_eq!(cached, JobState::Reported(JobStatus::Succeeded));
    assert_eq!(remote.status_queries().len(), 3);
}

#[tokio::test]
async fn rejected_submission_leaves_the_collection_untouched() {
    let remote = Arc::new(FakeRemote::new());
    remote.push_submit(Ok(receipt("job-1", "salmon", "salmon quant")));
    remote.push_submit(Err(RemoteError::Submission {
        workbench: String::from("rnaseq"),
        detail: String::from("HTTP 503: scheduler offline"),
    }));
    let mut bench = Workbench::attach(Arc::clone(&remote), "rnaseq");

    let accepted = bench.submit("salmon", "salmon quant").await;
    let rejected = bench.submit("bwa", "bwa mem ref.fa reads.fq").await;

    assert_eq!(accepted.id(), "job-1");
    assert_eq!(rejected.id(), "N/A");
    assert_eq!(rejected.tool(), "bwa");
    assert_eq!(rejected.command(), "bwa mem ref.fa reads.fq");
    assert!(rejected.state_snapshot().label().contains("scheduler offline"));

    assert_eq!(bench.job_count(), 1);
    assert!(bench.get_job("N/A").is_none());

    // The second submission attempt reached the service; nothing was retried.
    assert_eq!(remote.submissions().len(), 2);
}

#[tokio::test]
async fn list_jobs_refreshes_in_insertion_order_and_excludes_labels() {
    let remote = Arc::new(FakeRemote::new());
    remote.push_submit(Ok(receipt("job-1", "salmon", "a")));
    remote.push_submit(Ok(receipt("job-2", "salmon", "b")));
    remote.push_submit(Ok(receipt("job-3", "salmon", "c")));
    let mut bench = Workbench::attach(Arc::clone(&remote), "rnaseq");
    bench.submit("salmon", "a").await;
    bench.submit("salmon", "b").await;
    bench.submit("salmon", "c").await;

    remote.push_status(Some(JobStatus::Succeeded));
    remote.push_status(Some(JobStatus::Failed));
    remote.push_status(Some(JobStatus::Running));

    let rows = bench
        .list_jobs(&["Failed"])
        .await
        .unwrap_or_else(|err| panic!("list_jobs: {err}"));

    let ids: Vec<&str> = rows.iter().map(|row| row.identifier.as_str()).collect();
    assert_eq!(ids, vec!["job-1", "job-3"]);
    assert_eq!(
        remote.status_queries(),
        vec![
            String::from("job-1"),
            String::from("job-2"),
            String::from("job-3"),
        ],
        "refreshes happen in insertion order"
    );
}

#[tokio::test]
async fn absent_record_stays_eligible_for_polling() {
    let remote = Arc::new(FakeRemote::new());
    let bench = Workbench::attach(Arc::clone(&remote), "rnaseq");
    let job = bench.job_handle("job-from-last-week");

    remote.push_status(None);
    let first = job
        .refresh_status()
        .await
        .unwrap_or_else(|err| panic!("first refresh: {err}"));
    assert_eq!(first, JobState::Reported(JobStatus::NotStarted));

    remote.push_status(Some(JobStatus::Running));
    let second = job
        .refresh_status()
        .await
        .unwrap_or_else(|err| panic!("second refresh: {err}"));
    assert_eq!(second, JobState::Reported(JobStatus::Running));
    assert_eq!(remote.status_queries().len(), 2);
}

#[tokio::test]
async fn provisioning_echoes_the_service_assigned_name() {
    let remote = Arc::new(FakeRemote::new());
    remote.push_create(Ok(WorkbenchReceipt {
        workbench_name: String::from("rnaseq-2024"),
    }));

    let bench = Workbench::provision(Arc::clone(&remote), "rnaseq-2024")
        .await
        .unwrap_or_else(|err| panic!("provision: {err}"));
    assert_eq!(bench.name(), "rnaseq-2024");
}

#[tokio::test]
async fn provisioning_failure_propagates() {
    let remote = Arc::new(FakeRemote::new());
    remote.push_create(Err(RemoteError::Provisioning {
        workbench: String::from("taken"),
        detail: String::from("HTTP 409: name already in use"),
    }));

    let err = Workbench::provision(Arc::clone(&remote), "taken")
        .await
        .err()
        .unwrap_or_else(|| panic!("conflict should propagate"));
    assert!(matches!(err, RemoteError::Provisioning { .. }));
}

#[tokio::test]
async fn remote_fetch_jobs_default_to_queued_latest() {
    let remote = Arc::new(FakeRemote::new());
    remote.push_fetch(Ok(FetchReceipt {
        id: String::from("job-dl-1"),
        input: String::from("https://refs.example.test/grch38.fa"),
    }));
    let mut bench = Workbench::attach(Arc::clone(&remote), "rnaseq");

    let sources = vec![(
        String::from("https://refs.example.test/grch38.fa"),
        String::from("input/grch38.fa"),
    )];
    let jobs = bench
        .submit_remote_fetch(&sources, "download")
        .await
        .unwrap_or_else(|err| panic!("fetch: {err}"));

    let job = jobs.first().unwrap_or_else(|| panic!("one job expected"));
    assert_eq!(job.version(), "latest");
    assert_eq!(job.state_snapshot(), JobState::Reported(JobStatus::Queued));
    assert!(bench.get_job("job-dl-1").is_some());

    let sent = remote.fetches();
    let request = sent.first().unwrap_or_else(|| panic!("one request expected"));
    assert_eq!(request.method, "download");
    assert_eq!(request.output_path, "input/grch38.fa");
}

#[tokio::test]
async fn move_refusal_returns_the_detail_message() {
    let remote = Arc::new(FakeRemote::new());
    remote.push_move(Ok(MoveOutcome {
        message: String::from("HTTP 404: no such file"),
    }));
    let bench = Workbench::attach(Arc::clone(&remote), "rnaseq");

    let outcome = bench
        .move_file("input/missing.txt", "input/renamed.txt")
        .await
        .unwrap_or_else(|err| panic!("soft move: {err}"));
    assert_eq!(outcome.message, "HTTP 404: no such file");
}

#[tokio::test]
async fn log_fetching_never_caches() {
    let remote = Arc::new(FakeRemote::new());
    remote.push_submit(Ok(receipt("job-1", "salmon", "salmon quant")));
    remote.push_logs(Ok(String::from("first payload")));
    remote.push_logs(Ok(String::from("second payload")));
    let mut bench = Workbench::attach(Arc::clone(&remote), "rnaseq");
    let job = bench.submit("salmon", "salmon quant").await;

    let first = job
        .fetch_logs()
        .await
        .unwrap_or_else(|err| panic!("first logs: {err}"));
    let second = job
        .fetch_logs()
        .await
        .unwrap_or_else(|err| panic!("second logs: {err}"));

    assert_eq!(first, "first payload");
    assert_eq!(second, "second payload");
}

#[tokio::test]
async fn interrupted_stream_is_distinguishable_from_completion() {
    let remote = Arc::new(FakeRemote::new());
    remote.push_submit(Ok(receipt("job-1", "salmon", "salmon quant")));
    remote.push_log_chunk(b"partial output\n");
    remote.push_log_interruption(RemoteError::LogStreamInterrupted {
        id: String::from("job-1"),
        detail: String::from("connection reset by peer"),
    });
    let mut bench = Workbench::attach(Arc::clone(&remote), "rnaseq");
    let job = bench.submit("salmon", "salmon quant").await;

    let mut stream = job
        .stream_logs()
        .await
        .unwrap_or_else(|err| panic!("open stream: {err}"));

    let chunk = stream
        .next_chunk()
        .await
        .unwrap_or_else(|err| panic!("first chunk: {err}"));
    assert_eq!(chunk.as_deref(), Some(b"partial output\n".as_slice()));

    let err = stream
        .next_chunk()
        .await
        .expect_err("interruption should surface");
    assert!(matches!(err, RemoteError::LogStreamInterrupted { .. }));
}
