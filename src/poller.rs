// ABOUTME: Recurring fetch-and-recompute loop for a single remote job
// ABOUTME: Publishes snapshots and progress until the job reaches a terminal state

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::PollerError;
use crate::progress::ProgressFractions;
use crate::remote::models::JobSnapshot;

pub const POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Anything that can produce the current state of a job.
#[async_trait]
pub trait JobSource: Send + Sync + 'static {
    async fn fetch_job(&self, job_id: &str) -> Result<JobSnapshot, PollerError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollUpdate {
    /// Nothing fetched successfully yet.
    Pending,
    Progress {
        snapshot: Arc<JobSnapshot>,
        fractions: ProgressFractions,
    },
    /// The service answered with something that is not a job document.
    Unparseable { message: String },
}

impl PollUpdate {
    pub fn is_terminal(&self) -> bool {
        match self {
            PollUpdate::Pending => false,
            PollUpdate::Progress { snapshot, .. } => snapshot.did_finish(),
            PollUpdate::Unparseable { .. } => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
    Terminal,
}

pub struct PollScheduler {
    job_id: String,
    source: Arc<dyn JobSource>,
    updates_tx: Option<watch::Sender<PollUpdate>>,
    updates_rx: watch::Receiver<PollUpdate>,
    task: Option<JoinHandle<()>>,
}

impl PollScheduler {
    pub fn new(job_id: impl Into<String>, source: Arc<dyn JobSource>) -> Self {
        let (updates_tx, updates_rx) = watch::channel(PollUpdate::Pending);
        Self {
            job_id: job_id.into(),
            source,
            updates_tx: Some(updates_tx),
            updates_rx,
            task: None,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Fetches immediately, then once per `POLL_INTERVAL` until the job is terminal.
    ///
    /// A scheduler runs at most once; later calls are ignored.
    pub fn start(&mut self) {
        let Some(updates_tx) = self.updates_tx.take() else {
            tracing::debug!(job_id = %self.job_id, "Poller already started");
            return;
        };

        tracing::info!(job_id = %self.job_id, "Starting job poller");
        let job_id = self.job_id.clone();
        let source = Arc::clone(&self.source);
        self.task = Some(tokio::spawn(run_poll_loop(job_id, source, updates_tx)));
    }

    /// Cancels polling. Safe to call repeatedly or after the job finished.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            tracing::debug!(job_id = %self.job_id, "Stopping job poller");
            task.abort();
        }
    }

    pub fn state(&self) -> PollState {
        if self.updates_rx.borrow().is_terminal() {
            PollState::Terminal
        } else if self.task.is_some() {
            PollState::Polling
        } else {
            PollState::Idle
        }
    }

    pub fn latest(&self) -> PollUpdate {
        self.updates_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollUpdate> {
        self.updates_rx.clone()
    }

    /// Waits until a terminal update is published, or until polling is torn down.
    pub async fn wait_for_terminal(&self) -> PollUpdate {
        let mut updates = self.updates_rx.clone();
        loop {
            if updates.borrow_and_update().is_terminal() {
                break;
            }
            if updates.changed().await.is_err() {
                break;
            }
        }
        let latest = updates.borrow().clone();
        latest
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_poll_loop(
    job_id: String,
    source: Arc<dyn JobSource>,
    updates_tx: watch::Sender<PollUpdate>,
) {
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match source.fetch_job(&job_id).await {
            Ok(snapshot) => {
                let fractions = ProgressFractions::from_snapshot(&snapshot);
                let finished = snapshot.did_finish();
                tracing::debug!(
                    %job_id,
                    status = ?snapshot.status,
                    progress = %fractions.describe(),
                    "Job status updated"
                );
                updates_tx.send_replace(PollUpdate::Progress {
                    snapshot: Arc::new(snapshot),
                    fractions,
                });
                if finished {
                    tracing::info!(%job_id, "Job reached a terminal state");
                    break;
                }
            }
            Err(PollerError::Validation(message)) => {
                tracing::error!(%job_id, %message, "Job status response was not understood");
                updates_tx.send_replace(PollUpdate::Unparseable { message });
                break;
            }
            Err(e) => {
                tracing::warn!(%job_id, error = %e, "Job status fetch failed, retrying next tick");
            }
        }
    }
}
