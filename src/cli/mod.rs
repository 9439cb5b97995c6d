//! Command-line interface definitions for the `skiff` binary.
//!
//! This module centralises the clap parser structures so both the main
//! binary and the build script can reuse them when generating the manual
//! page.

use clap::Parser;

/// Top-level CLI for the `skiff` binary.
#[derive(Debug, Parser)]
#[command(
    name = "skiff",
    about = "Run your analysis tools against a cloud workbench from the terminal",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Provision a new workbench namespace.
    #[command(name = "create", about = "Provision a new workbench namespace")]
    Create(CreateCommand),
    /// List your workbenches.
    #[command(name = "workbenches", about = "List your workbenches")]
    Workbenches,
    /// Submit a tool invocation as a job.
    #[command(name = "run", about = "Submit a tool invocation as a job")]
    Run(RunCommand),
    /// Show (and optionally watch) a job's status.
    #[command(name = "status", about = "Show (and optionally watch) a job's status")]
    Status(StatusCommand),
    /// Print a job's logs.
    #[command(name = "logs", about = "Print a job's logs")]
    Logs(LogsCommand),
    /// Upload a local file or directory into a workbench.
    #[command(name = "upload", about = "Upload a local file or directory into a workbench")]
    Upload(UploadCommand),
    /// Request a download descriptor for a stored file.
    #[command(name = "download", about = "Request a download descriptor for a stored file")]
    Download(DownloadCommand),
    /// Ask the service to pull a URL into a workbench.
    #[command(name = "fetch", about = "Ask the service to pull a URL into a workbench")]
    Fetch(FetchCommand),
    /// List files in a workbench.
    #[command(name = "files", about = "List files in a workbench")]
    Files(FilesCommand),
    /// Move a file inside a workbench.
    #[command(name = "mv", about = "Move a file inside a workbench")]
    Move(MoveCommand),
    /// Create a directory inside a workbench.
    #[command(name = "mkdir", about = "Create a directory inside a workbench")]
    Mkdir(MkdirCommand),
    /// Delete a file or directory inside a workbench.
    #[command(name = "rm", about = "Delete a file or directory inside a workbench")]
    Remove(RemoveCommand),
}

/// Arguments for the `skiff create` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct CreateCommand {
    /// Name of the namespace to provision.
    pub(crate) name: String,
}

/// Arguments for the `skiff run` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct RunCommand {
    /// Workbench namespace to run against.
    pub(crate) workbench: String,
    /// Tool to execute (for example `salmon`).
    #[arg(long, value_name = "TOOL")]
    pub(crate) tool: String,
    /// Command to submit (use -- to separate flags).
    #[arg(required = true, trailing_var_arg = true)]
    pub(crate) command: Vec<String>,
}

/// Arguments for the `skiff status` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct StatusCommand {
    /// Workbench namespace the job belongs to.
    pub(crate) workbench: String,
    /// Job identifier as reported at submission.
    pub(crate) job_id: String,
    /// Poll until the job reaches a terminal state.
    #[arg(long)]
    pub(crate) watch: bool,
    /// Seconds between polls when watching.
    #[arg(long, value_name = "SECONDS", default_value_t = 5)]
    pub(crate) poll_interval_secs: u64,
}

/// Arguments for the `skiff logs` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct LogsCommand {
    /// Workbench namespace the job belongs to.
    pub(crate) workbench: String,
    /// Job identifier as reported at submission.
    pub(crate) job_id: String,
    /// Follow the live log stream instead of fetching a snapshot.
    #[arg(long)]
    pub(crate) stream: bool,
}

/// Arguments for the `skiff upload` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct UploadCommand {
    /// Workbench namespace to upload into.
    pub(crate) workbench: String,
    /// Local file or directory to upload.
    pub(crate) path: String,
}

/// Arguments for the `skiff download` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct DownloadCommand {
    /// Workbench namespace to download from.
    pub(crate) workbench: String,
    /// Path of the stored file.
    pub(crate) file_path: String,
}

/// Arguments for the `skiff fetch` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct FetchCommand {
    /// Workbench namespace to fetch into.
    pub(crate) workbench: String,
    /// Source URL the service should pull from.
    pub(crate) url: String,
    /// Destination path inside the namespace.
    pub(crate) destination: String,
    /// Transfer method the service should use.
    #[arg(long, value_name = "METHOD", default_value = "download")]
    pub(crate) method: String,
}

/// Arguments for the `skiff files` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct FilesCommand {
    /// Workbench namespace to list.
    pub(crate) workbench: String,
    /// Only list files below this path prefix.
    #[arg(long, value_name = "PATH")]
    pub(crate) path: Option<String>,
    /// Render the listing as a nested tree instead of a table.
    #[arg(long)]
    pub(crate) tree: bool,
}

/// Arguments for the `skiff mv` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct MoveCommand {
    /// Workbench namespace to operate on.
    pub(crate) workbench: String,
    /// Current path of the file.
    pub(crate) source: String,
    /// Requested new path.
    pub(crate) destination: String,
}

/// Arguments for the `skiff mkdir` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct MkdirCommand {
    /// Workbench namespace to operate on.
    pub(crate) workbench: String,
    /// Directory path to create.
    pub(crate) path: String,
}

/// Arguments for the `skiff rm` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct RemoveCommand {
    /// Workbench namespace to operate on.
    pub(crate) workbench: String,
    /// File or directory path to delete.
    pub(crate) path: String,
}
