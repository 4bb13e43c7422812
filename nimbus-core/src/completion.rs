//! Completion path: provider job id in, reconciled job and resource out.
//!
//! A completion may arrive any number of times and in any order. The
//! dispatcher never fails; everything it cannot apply is logged and
//! reported as [`CompletionOutcome::NotApplied`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::job::JobManager;
use crate::model::{Job, JobState, ResourceKind};

/// What a completion did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The job and its resource moved to their terminal state.
    Applied { state: JobState },
    /// The job was already terminal; nothing changed.
    AlreadyApplied { state: JobState },
    /// The provider still reports the job as running.
    Pending,
    /// Unknown job, unknown resource, or a failure while applying.
    NotApplied,
}

/// Applies the completion table for one resource kind.
#[async_trait]
pub trait JobReconciler: Send + Sync {
    fn kind(&self) -> ResourceKind;

    /// Reconcile a running job whose target is of this reconciler's kind.
    async fn reconcile(&self, job: Job) -> Result<CompletionOutcome>;
}

/// Routes completions to the reconciler registered for the target's kind.
pub struct CompletionDispatcher {
    jobs: JobManager,
    reconcilers: HashMap<ResourceKind, Arc<dyn JobReconciler>>,
}

impl CompletionDispatcher {
    pub fn new(jobs: JobManager) -> Self {
        Self {
            jobs,
            reconcilers: HashMap::new(),
        }
    }

    pub fn register(&mut self, reconciler: Arc<dyn JobReconciler>) {
        self.reconcilers.insert(reconciler.kind(), reconciler);
    }

    /// Reconcile the job tracking `provider_job_id`.
    pub async fn complete(&self, provider_job_id: &str) -> CompletionOutcome {
        let job = match self.jobs.find_by_provider_id(provider_job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                warn!(provider_job_id = %provider_job_id, "Completion for unknown provider job");
                return CompletionOutcome::NotApplied;
            }
            Err(e) => {
                error!(provider_job_id = %provider_job_id, "Failed to look up job: {}", e);
                return CompletionOutcome::NotApplied;
            }
        };

        if job.state.is_terminal() {
            debug!(
                job_id = %job.id,
                state = job.state.as_str(),
                "Duplicate completion ignored"
            );
            return CompletionOutcome::AlreadyApplied { state: job.state };
        }

        let kind = job.target_resource.kind;
        let Some(reconciler) = self.reconcilers.get(&kind) else {
            warn!(job_id = %job.id, kind = %kind, "No reconciler for resource kind");
            return CompletionOutcome::NotApplied;
        };

        let job_id = job.id.clone();
        match reconciler.reconcile(job).await {
            Ok(outcome) => {
                if let CompletionOutcome::Applied { state } = outcome {
                    info!(job_id = %job_id, state = state.as_str(), "Completed job");
                }
                outcome
            }
            Err(e) => {
                error!(job_id = %job_id, "Failed to reconcile job: {}", e);
                CompletionOutcome::NotApplied
            }
        }
    }
}

/// Errors raised while arming a completion.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("completion listener is gone")]
    Closed,

    #[error("{0}")]
    Rejected(String),
}

/// Out-of-band transport that later redelivers a provider job id.
#[async_trait]
pub trait CompletionNotifier: Send + Sync {
    /// Register interest in `provider_job_id`. Failure is never fatal to
    /// the submission that triggered it.
    async fn arm(&self, provider_job_id: &str) -> std::result::Result<(), NotifierError>;
}

/// Notifier for deployments where completions arrive only over HTTP.
pub struct NoopNotifier;

#[async_trait]
impl CompletionNotifier for NoopNotifier {
    async fn arm(&self, _provider_job_id: &str) -> std::result::Result<(), NotifierError> {
        Ok(())
    }
}

/// Hands armed ids to a [`CompletionListener`] over a channel.
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl CompletionNotifier for ChannelNotifier {
    async fn arm(&self, provider_job_id: &str) -> std::result::Result<(), NotifierError> {
        self.tx
            .send(provider_job_id.to_string())
            .map_err(|_| NotifierError::Closed)
    }
}

/// Feeds armed ids to the dispatcher, re-polling pending ones.
///
/// There is no timeout: a job the provider never finishes is polled for
/// as long as the listener runs.
pub struct CompletionListener {
    dispatcher: Arc<CompletionDispatcher>,
    rx: mpsc::UnboundedReceiver<String>,
    poll_interval: Duration,
    pending: HashSet<String>,
}

impl CompletionListener {
    pub fn new(
        dispatcher: Arc<CompletionDispatcher>,
        rx: mpsc::UnboundedReceiver<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            dispatcher,
            rx,
            poll_interval,
            pending: HashSet::new(),
        }
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Completion listener started"
        );
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                received = self.rx.recv() => {
                    match received {
                        Some(provider_job_id) => self.deliver(provider_job_id).await,
                        None => {
                            debug!("Notifier channel closed");
                            break;
                        }
                    }
                }
                _ = ticker.tick() => self.poll().await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(pending = self.pending.len(), "Completion listener stopped");
    }

    async fn deliver(&mut self, provider_job_id: String) {
        if self.dispatcher.complete(&provider_job_id).await == CompletionOutcome::Pending {
            self.pending.insert(provider_job_id);
        }
    }

    async fn poll(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let ids: Vec<String> = self.pending.iter().cloned().collect();
        for id in ids {
            if self.dispatcher.complete(&id).await != CompletionOutcome::Pending {
                self.pending.remove(&id);
            }
        }
    }
}
