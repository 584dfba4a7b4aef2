//! Converge CLI entrypoint.
//!
//! Logs go to stderr; the structured result goes to stdout.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use converge_units::cli::{Cli, Commands, LogFormat, OutputFormatter};
use converge_units::config::{DesiredFileState, InputValidator, TaskArgs, TaskParser};
use converge_units::error::Result;
use converge_units::filesystem::{FileStore, LocalFileStore};
use converge_units::planner::ExecutionMode;
use converge_units::reconciler::{TaskOutcome, reconcile_task};
use converge_units::yc::{ProvisionerClient, YcProvisioner};

use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose, cli.log_format);

    let formatter = OutputFormatter::new(cli.output);

    // One invocation, one resource: a single-threaded runtime is enough.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli.command, &formatter)) {
        Ok(rendered) => {
            emit(&rendered);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            emit(&formatter.format_failure(&e));
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system on stderr.
///
/// `RUST_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool, format: LogFormat) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// Writes a rendered result to stdout.
fn emit(rendered: &str) {
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{}", rendered.trim_end()) {
        eprintln!("Failed to write result: {e}");
    }
}

/// Main async entry point.
async fn run(command: Commands, formatter: &OutputFormatter) -> Result<String> {
    match command {
        Commands::File {
            path,
            content,
            check,
        } => {
            let task = TaskArgs::File(DesiredFileState { path, content });
            let outcome = execute(&task, ExecutionMode::from_check_flag(check), 0).await?;
            formatter.format_outcome(&outcome)
        }
        Commands::Instance {
            spec,
            check,
            wait_address_secs,
        } => {
            let task = TaskArgs::Instance(spec.into_spec());
            let outcome =
                execute(&task, ExecutionMode::from_check_flag(check), wait_address_secs).await?;
            formatter.format_outcome(&outcome)
        }
        Commands::Run {
            task,
            check,
            wait_address_secs,
        } => cmd_run(&task, check, wait_address_secs, formatter).await,
        Commands::Validate { task } => cmd_validate(&task, formatter),
    }
}

/// Reconcile the task of a task document.
async fn cmd_run(
    path: &Path,
    force_check: bool,
    wait_address_secs: u64,
    formatter: &OutputFormatter,
) -> Result<String> {
    let parser = task_parser(path)?;
    let invocation = parser.load_with_env(path)?;

    let mode = ExecutionMode::from_check_flag(force_check || invocation.check_mode);
    let outcome = execute(&invocation.task, mode, wait_address_secs).await?;
    formatter.format_outcome(&outcome)
}

/// Validate a task document.
fn cmd_validate(path: &Path, formatter: &OutputFormatter) -> Result<String> {
    let parser = task_parser(path)?;
    let invocation = parser.load_with_env(path)?;

    let validator = InputValidator::new();
    let result = match &invocation.task {
        TaskArgs::File(desired) => validator.validate_file(desired)?,
        TaskArgs::Instance(spec) => validator.validate_instance(spec)?,
    };

    info!("Task document is valid: {}", path.display());
    Ok(formatter.format_validation(invocation.task.module_name(), &result))
}

/// Creates a parser rooted at the task's directory and loads its `.env`.
fn task_parser(path: &Path) -> Result<TaskParser> {
    let parser = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => TaskParser::new().with_base_path(dir),
        None => TaskParser::new(),
    };
    parser.load_dotenv()?;
    Ok(parser)
}

/// Runs one reconcile call against the real filesystem and `yc` CLI.
async fn execute(task: &TaskArgs, mode: ExecutionMode, wait_address_secs: u64) -> Result<TaskOutcome> {
    let mut config = TaskParser::provisioner_config();
    config.address_wait_secs = wait_address_secs;

    info!(
        "Reconciling {} task{}",
        task.module_name(),
        if mode.is_check() { " (check mode)" } else { "" }
    );
    debug!("Provisioner binary: {}", config.binary.display());

    let store = LocalFileStore::new();
    let provisioner = YcProvisioner::from_config(&config);
    debug!(
        "Backends: filesystem={}, provisioner={}",
        store.backend_type(),
        provisioner.backend_type()
    );

    let outcome = reconcile_task(
        task,
        mode,
        &store,
        &provisioner,
        Duration::from_secs(config.address_wait_secs),
    )
    .await?;

    info!("Done: changed={}", outcome.changed());
    Ok(outcome)
}
