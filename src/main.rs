//! Binary entry point for the Skiff CLI.

use std::io::{self, Write};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8Path;
use clap::Parser;
use shell_escape::unix::escape;
use thiserror::Error;
use tokio::time::sleep;

use skiff::{
    ConfigError, Credential, HttpRemoteService, JobState, RemoteError, ServiceConfig, Workbench,
    render,
};

use cli::{
    Cli, CreateCommand, DownloadCommand, FetchCommand, FilesCommand, LogsCommand, MkdirCommand,
    MoveCommand, RemoveCommand, RunCommand, StatusCommand, UploadCommand,
};

mod cli;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("invalid command argument: {0}")]
    InvalidCommand(String),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    match cli {
        Cli::Create(args) => create_command(args).await,
        Cli::Workbenches => workbenches_command().await,
        Cli::Run(args) => run_command(args).await,
        Cli::Status(args) => status_command(args).await,
        Cli::Logs(args) => logs_command(args).await,
        Cli::Upload(args) => upload_command(args).await,
        Cli::Download(args) => download_command(args).await,
        Cli::Fetch(args) => fetch_command(args).await,
        Cli::Files(args) => files_command(args).await,
        Cli::Move(args) => move_command(args).await,
        Cli::Mkdir(args) => mkdir_command(args).await,
        Cli::Remove(args) => remove_command(args).await,
    }
}

/// Builds the remote service client, reporting a missing credential to the
/// user without aborting.
fn connect() -> Result<Arc<HttpRemoteService>, CliError> {
    let config = ServiceConfig::load_without_cli_args()?;
    let credential = Credential::from_env();
    if let Some(advisory) = credential.advisory() {
        writeln!(io::stderr(), "{advisory}").ok();
    }
    let remote = HttpRemoteService::new(&config, credential)?;
    Ok(Arc::new(remote))
}

async fn create_command(args: CreateCommand) -> Result<i32, CliError> {
    let remote = connect()?;
    let bench = Workbench::provision(remote, &args.name).await?;
    writeln!(io::stdout(), "Created workbench '{}'", bench.name()).ok();
    Ok(0)
}

async fn workbenches_command() -> Result<i32, CliError> {
    let remote = connect()?;
    let entries = Workbench::list(remote.as_ref()).await?;
    write!(io::stdout(), "{}", render::workbench_table(&entries)).ok();
    Ok(0)
}

async fn run_command(args: RunCommand) -> Result<i32, CliError> {
    validate_command_args(&args.command)?;
    let remote = connect()?;
    let mut bench = Workbench::attach(remote, &args.workbench);
    let full_command = render_submitted_command(&args.command);
    let job = bench.submit(&args.tool, &full_command).await;
    let rejected = matches!(job.state_snapshot(), JobState::Rejected(_));
    write!(io::stdout(), "{}", render::job_table(&[job.row()])).ok();
    Ok(i32::from(rejected))
}

async fn status_command(args: StatusCommand) -> Result<i32, CliError> {
    let remote = connect()?;
    let bench = Workbench::attach(remote, &args.workbench);
    let job = bench.job_handle(&args.job_id);
    let mut stdout = io::stdout();

    if !args.watch {
        let state = job.refresh_status().await?;
        writeln!(stdout, "{state}").ok();
        return Ok(0);
    }

    let interval = Duration::from_secs(args.poll_interval_secs.max(1));
    loop {
        let state = job.refresh_status().await?;
        writeln!(stdout, "{state}").ok();
        if state.is_settled() {
            return Ok(0);
        }
        sleep(interval).await;
    }
}

async fn logs_command(args: LogsCommand) -> Result<i32, CliError> {
    let remote = connect()?;
    let bench = Workbench::attach(remote, &args.workbench);
    let job = bench.job_handle(&args.job_id);
    let mut stdout = io::stdout();

    if !args.stream {
        let payload = job.fetch_logs().await?;
        writeln!(stdout, "{payload}").ok();
        return Ok(0);
    }

    let mut stream = job.stream_logs().await?;
    loop {
        match stream.next_chunk().await {
            Ok(Some(chunk)) => {
                stdout.write_all(&chunk).ok();
            }
            Ok(None) => break,
            Err(RemoteError::LogStreamInterrupted { .. }) => {
                writeln!(io::stderr(), "Stream ended: no more logs to stream.").ok();
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(0)
}

async fn upload_command(args: UploadCommand) -> Result<i32, CliError> {
    let remote = connect()?;
    let bench = Workbench::attach(remote, &args.workbench);
    let mapping = bench.upload(Utf8Path::new(&args.path)).await?;
    let mut stdout = io::stdout();
    for (local, destination) in &mapping {
        writeln!(stdout, "{local} -> {destination}").ok();
    }
    Ok(0)
}

async fn download_command(args: DownloadCommand) -> Result<i32, CliError> {
    let remote = connect()?;
    let bench = Workbench::attach(remote, &args.workbench);
    let descriptor = bench.download(&args.file_path).await?;
    writeln!(io::stdout(), "{}", descriptor.download_url).ok();
    Ok(0)
}

async fn fetch_command(args: FetchCommand) -> Result<i32, CliError> {
    let remote = connect()?;
    let mut bench = Workbench::attach(remote, &args.workbench);
    let sources = vec![(args.url, args.destination)];
    let jobs = bench.submit_remote_fetch(&sources, &args.method).await?;
    let rows: Vec<render::JobRow> = jobs.iter().map(skiff::Job::row).collect();
    write!(io::stdout(), "{}", render::job_table(&rows)).ok();
    Ok(0)
}

async fn files_command(args: FilesCommand) -> Result<i32, CliError> {
    let remote = connect()?;
    let bench = Workbench::attach(remote, &args.workbench);
    let entries = bench.list_files(args.path.as_deref()).await?;
    let rendered = if args.tree {
        render::file_tree(&entries)
    } else {
        render::file_table(&entries)
    };
    write!(io::stdout(), "{rendered}").ok();
    Ok(0)
}

async fn move_command(args: MoveCommand) -> Result<i32, CliError> {
    let remote = connect()?;
    let bench = Workbench::attach(remote, &args.workbench);
    let outcome = bench.move_file(&args.source, &args.destination).await?;
    writeln!(io::stdout(), "{}", outcome.message).ok();
    Ok(0)
}

async fn mkdir_command(args: MkdirCommand) -> Result<i32, CliError> {
    let remote = connect()?;
    let bench = Workbench::attach(remote, &args.workbench);
    let receipt = bench.create_directory(&args.path).await?;
    writeln!(io::stdout(), "Created '{}'", receipt.path).ok();
    Ok(0)
}

async fn remove_command(args: RemoveCommand) -> Result<i32, CliError> {
    let remote = connect()?;
    let bench = Workbench::attach(remote, &args.workbench);
    let receipt = bench.delete_path(&args.path).await?;
    writeln!(io::stdout(), "Deleted '{}' ({})", receipt.path, receipt.status).ok();
    Ok(0)
}

/// Joins trailing CLI arguments into the submitted command string, quoting
/// anything the shell would mangle.
fn render_submitted_command(args: &[String]) -> String {
    let mut result = String::new();
    let mut first = true;

    for arg in args {
        if first {
            first = false;
        } else {
            result.push(' ');
        }

        let escaped = escape(arg.as_str().into());
        result.push_str(escaped.as_ref());
    }

    result
}

fn validate_command_args(args: &[String]) -> Result<(), CliError> {
    for arg in args {
        if arg
            .chars()
            .any(|ch| matches!(ch, '\n' | '\r' | '\u{0000}'..='\u{001F}' | '\u{007F}'))
        {
            return Err(CliError::InvalidCommand(String::from(concat!(
                "command arguments must not contain control characters (ASCII ",
                "0x00-0x1F or 0x7F, e.g. newline, carriage return, tab, NUL)"
            ))));
        }
    }
    Ok(())
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_command_args_rejects_control_characters() {
        let err = validate_command_args(&[String::from("salmon\tquant")])
            .expect_err("tab should be rejected");

        assert!(
            matches!(err, CliError::InvalidCommand(ref message) if message.contains("control characters")),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn validate_command_args_accepts_safe_arguments() {
        assert!(
            validate_command_args(&[String::from("salmon"), String::from("quant")]).is_ok()
        );
    }

    #[test]
    fn render_submitted_command_escapes_arguments() {
        let args = vec![
            String::from("salmon"),
            String::from("a b"),
            String::from("c'd"),
        ];
        let rendered = render_submitted_command(&args);

        assert_eq!(rendered, "salmon 'a b' 'c'\\''d'");
    }

    #[test]
    fn write_error_writes_cli_error() {
        let mut buf = Vec::new();
        let err = CliError::InvalidCommand(String::from("bad"));
        write_error(&mut buf, &err);
        let rendered = String::from_utf8(buf).unwrap_or_else(|err2| panic!("utf8: {err2}"));
        assert!(
            rendered.contains("invalid command argument: bad"),
            "rendered: {rendered}"
        );
    }
}
