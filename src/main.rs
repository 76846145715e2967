// ABOUTME: CLI entry point for watching media-service jobs
// ABOUTME: Parses arguments, loads configuration and drives the poller

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::oneshot;

use job_poller::cache::LookupCache;
use job_poller::config::Config;
use job_poller::presenter::{status_line, Outcome, ProgressPresenter};
use job_poller::remote::{JobStatusClient, ProjectClient};
use job_poller::{JobSnapshot, PollScheduler, PollUpdate, ProgressFractions};

#[derive(Parser)]
#[command(name = "job-poller")]
#[command(about = "Watch ingest and transcode jobs for deliverable bundles", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll a job until it finishes, showing step progress
    Watch {
        /// Media service job identifier, e.g. VX-1234
        job_id: String,
        #[command(flatten)]
        connection: ConnectionArgs,
        /// Print one line per update instead of drawing a progress bar
        #[arg(long)]
        plain: bool,
    },
    /// Validate a saved job document and show its derived progress
    Inspect {
        /// Path to a JSON job document
        file: PathBuf,
    },
}

#[derive(Args)]
struct ConnectionArgs {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Base URL of the media service
    #[arg(long)]
    vidispine_url: Option<String>,
    /// Base URL of the core project service, used to label jobs
    #[arg(long)]
    project_service_url: Option<String>,
    /// HTTP request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

impl ConnectionArgs {
    fn resolve(self) -> Result<Config> {
        let from_file = Config::load_optional(self.config.as_deref())?;
        Ok(from_file.merge(Config {
            vidispine_url: self.vidispine_url,
            project_service_url: self.project_service_url,
            request_timeout_secs: self.timeout,
        }))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let ok = match cli.command {
        Commands::Watch {
            job_id,
            connection,
            plain,
        } => watch(job_id, connection.resolve()?, plain).await? == Outcome::Succeeded,
        Commands::Inspect { file } => inspect(&file)? != Outcome::NotUnderstood,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

async fn watch(job_id: String, config: Config, plain: bool) -> Result<Outcome> {
    let timeout = config.request_timeout();
    let client = JobStatusClient::new(config.vidispine_url()?.to_string(), timeout)?;
    let project_titles: Arc<LookupCache<i64, String>> = Arc::new(LookupCache::new());
    let projects = match config.project_service_url.clone() {
        Some(url) => Some(Arc::new(ProjectClient::new(url, timeout, project_titles)?)),
        None => None,
    };

    let mut scheduler = PollScheduler::new(job_id.clone(), Arc::new(client));
    let mut updates = scheduler.subscribe();
    let mut presenter = if plain {
        ProgressPresenter::hidden(job_id.clone())
    } else {
        ProgressPresenter::new(job_id.clone())
    };
    let mut labelled = false;
    let mut title_rx: Option<oneshot::Receiver<Option<String>>> = None;

    scheduler.start();

    let outcome = loop {
        let update = updates.borrow_and_update().clone();

        if !labelled {
            if let (Some(projects), PollUpdate::Progress { snapshot, .. }) =
                (projects.as_ref(), &update)
            {
                labelled = true;
                title_rx = spawn_title_lookup(Arc::clone(projects), snapshot);
            }
        }

        presenter.render(&update);
        if plain {
            if let PollUpdate::Progress { snapshot, fractions } = &update {
                println!("{}", status_line(&job_id, snapshot, fractions));
            }
        }

        if update.is_terminal() {
            scheduler.stop();
            break presenter.finish(&update);
        }

        tokio::select! {
            title = next_title(&mut title_rx) => {
                title_rx = None;
                if let Some(title) = title {
                    presenter.set_label(format!("{} ({})", job_id, title));
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break presenter.finish(&scheduler.latest());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(%job_id, "Interrupted, stopping poller");
                scheduler.stop();
                break presenter.finish(&scheduler.latest());
            }
        }
    };

    if plain {
        println!("{}: {:?}", job_id, outcome);
    }
    Ok(outcome)
}

/// Resolves the project title off the render loop so a slow project service
/// never delays progress updates or Ctrl-C.
fn spawn_title_lookup(
    projects: Arc<ProjectClient>,
    snapshot: &JobSnapshot,
) -> Option<oneshot::Receiver<Option<String>>> {
    let project_id = snapshot.metadata("projectId")?.parse::<i64>().ok()?;
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let title = match projects.project_title(project_id).await {
            Ok(title) => Some(title),
            Err(e) => {
                tracing::warn!(project_id, error = %e, "Could not resolve project title");
                None
            }
        };
        let _ = tx.send(title);
    });
    Some(rx)
}

async fn next_title(
    title_rx: &mut Option<oneshot::Receiver<Option<String>>>,
) -> Option<String> {
    match title_rx {
        Some(rx) => rx.await.ok().flatten(),
        None => std::future::pending().await,
    }
}

fn inspect(file: &Path) -> Result<Outcome> {
    let body = std::fs::read(file)
        .with_context(|| format!("Failed to read job document {}", file.display()))?;

    let snapshot = match JobSnapshot::from_slice(&body) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            println!("{}: {}", file.display(), e);
            return Ok(Outcome::NotUnderstood);
        }
    };
    let fractions = ProgressFractions::from_snapshot(&snapshot);

    println!("Job:        {}", snapshot.job_id);
    println!("Status:     {:?}", snapshot.status);
    if let Some(job_type) = snapshot.job_type {
        println!("Type:       {:?}", job_type);
    }
    println!("Finished:   {}", snapshot.did_finish());
    println!("Successful: {}", snapshot.was_success());
    println!("Progress:   {}", fractions.describe());
    if let Some(item_id) = snapshot.metadata("itemId") {
        println!("Item:       {}", item_id);
    }

    let update = PollUpdate::Progress {
        snapshot: Arc::new(snapshot),
        fractions,
    };
    Ok(Outcome::from_update(&update))
}
