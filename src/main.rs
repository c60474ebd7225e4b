// Mirror Sync
// Runs the jobs defined in a YAML jobs file

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use mirror_sync::core::{
    AppConfig, FileExclusionStore, FileLogSink, JobDefinition, JobsFile, LogCategory, SyncJob,
};
use mirror_sync::logging::init_tracing;

/// Mirror directory trees as described by a jobs file
#[derive(Debug, Parser)]
#[command(name = "mirror-sync", version, about)]
struct Cli {
    /// Path to the jobs file (YAML)
    jobs_file: PathBuf,

    /// Run only the named job(s); defaults to every enabled job
    #[arg(short, long = "job")]
    jobs: Vec<String>,

    /// Save each job's effective exclusions to the exclusion store after loading
    #[arg(long)]
    save_exclusions: bool,

    /// Debug-level diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let jobs_file = JobsFile::load(&cli.jobs_file)?;
    let app_config = AppConfig::default();
    let store = jobs_file.settings.exclusion_store.clone().map(FileExclusionStore::new);
    let log_sink = match &jobs_file.settings.log_file {
        Some(path) => Some(FileLogSink::open(path)?),
        None => None,
    };

    let selected: Vec<&JobDefinition> = if cli.jobs.is_empty() {
        jobs_file.enabled_jobs().collect()
    } else {
        cli.jobs
            .iter()
            .map(|name| {
                jobs_file
                    .get_job(name)
                    .with_context(|| format!("No job named '{}' in {}", name, cli.jobs_file.display()))
            })
            .collect::<Result<Vec<_>>>()?
    };
    if selected.is_empty() {
        bail!("No enabled jobs in {}", cli.jobs_file.display());
    }

    let mut failed = 0;
    for definition in selected {
        let mut job = definition.build(&app_config, &jobs_file.settings.exclude)?;

        if let Some(store) = &store {
            job.load_exclusions(store)?;
            if cli.save_exclusions {
                job.save_exclusions(store)?;
            }
        }
        if let Some(sink) = &log_sink {
            sink.attach(&mut job);
        }
        attach_console(&mut job);

        if !run_job(job).await? {
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{} job(s) reported errors", failed);
    }
    Ok(())
}

/// Print every enabled event to stdout
fn attach_console(job: &mut SyncJob) {
    job.subscribe_all(|event| match event.category {
        LogCategory::Error => eprintln!("[{}] error: {}", event.job, event.message),
        category => println!("[{}] {}: {}", event.job, category, event.message),
    });
}

/// Run one job in the background, cancelling it on Ctrl-C
///
/// Returns false when the run finished with entry errors.
async fn run_job(job: SyncJob) -> Result<bool> {
    let task = job.start_async();
    let cancel = task.cancel_handle();
    let name = task.name().to_string();

    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(job = %name, "cancellation requested");
            cancel.cancel();
        }
    });

    let outcome = task.wait().await?;
    ctrl_c.abort();

    let summary = match outcome.result {
        Ok(summary) => summary,
        Err(e) => {
            error!(job = outcome.job.name(), error = %e, "synchronization failed");
            return Ok(false);
        }
    };

    info!(
        job = outcome.job.name(),
        copied = summary.files_copied,
        updated = summary.files_updated,
        deleted = summary.files_deleted + summary.directories_deleted,
        errors = summary.errors,
        "job complete"
    );
    Ok(summary.errors == 0 && !summary.cancelled)
}
