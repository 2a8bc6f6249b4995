//! Batch orchestration.
//!
//! Drives one run through `Discovering -> Confirming -> Transferring(n) ->
//! Done`. Items are transferred strictly one at a time, and each success is
//! persisted before the next item starts, so an interrupted run resumes
//! where it stopped.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, info};
use vimeops_ledger::{ProgressRecord, ProgressStore};

use crate::error::BatchError;
use crate::executor::TransferExecutor;
use crate::remote::RemoteStore;
use crate::types::{BatchConfig, BatchEvent, BatchSummary, Direction};
use crate::workset::{WorkItem, WorkSet, discover_local, discover_remote};

/// Operator confirmation step.
pub trait Confirm: Send + Sync {
    /// Shown the pending keys; returns `false` to cancel the run.
    fn confirm(&self, direction: Direction, pending: &[String]) -> bool;
}

/// Confirms unconditionally (unattended runs).
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&self, _direction: Direction, _pending: &[String]) -> bool {
        true
    }
}

/// Stage of a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Discovering,
    Confirming,
    Transferring { position: usize, key: String },
    Done,
}

/// Runs one batch: discover, merge, confirm, transfer.
pub struct BatchRunner {
    config: BatchConfig,
    events_tx: mpsc::UnboundedSender<BatchEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<BatchEvent>>,
    state: Mutex<RunState>,
}

impl BatchRunner {
    pub fn new(config: BatchConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            config,
            events_tx,
            events_rx: Some(events_rx),
            state: Mutex::new(RunState::Idle),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<BatchEvent>> {
        self.events_rx.take()
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Stage the current or last run reached.
    pub fn state(&self) -> RunState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs the batch to completion.
    ///
    /// Returns an error only for conditions that abort the whole run:
    /// preconditions, a failed remote listing, cancellation at the prompt,
    /// or a completion that could not be persisted. Individual transfer
    /// failures are counted in the summary and leave their items pending.
    pub async fn run(
        &self,
        remote: &dyn RemoteStore,
        confirm: &dyn Confirm,
    ) -> Result<BatchSummary, BatchError> {
        self.check_preconditions()?;

        self.enter(RunState::Discovering);
        let fresh = match self.config.direction {
            Direction::Outbound => discover_local(&self.config.root)?,
            Direction::Inbound => discover_remote(remote, self.config.only.as_deref()).await?,
        };
        let fresh_record = fresh.fresh_record();

        let mut store = ProgressStore::load(&self.config.record_path);
        store.persist_if_empty(&fresh_record)?;
        let merged = store.merge_fresh(&fresh_record).clone();
        let scope = self.scope(&merged, &fresh);

        let pending: Vec<String> = scope
            .iter()
            .filter(|(_, done)| !done)
            .map(|(k, _)| k.clone())
            .collect();
        self.emit(BatchEvent::Discovered {
            total: scope.len(),
            pending: pending.clone(),
        });

        self.enter(RunState::Confirming);
        if !pending.is_empty()
            && !self.config.auto_confirm
            && !confirm.confirm(self.config.direction, &pending)
        {
            info!(direction = self.config.direction.verb(), "run cancelled by operator");
            return Err(BatchError::Cancelled);
        }

        let executor = TransferExecutor::new(remote, &self.config.root, self.config.chunk_size)
            .with_events(&self.events_tx);
        let mut summary = BatchSummary {
            total: scope.len(),
            ..Default::default()
        };
        let mut position = 0;

        for (key, done) in scope {
            if done {
                summary.already_done += 1;
                self.emit(BatchEvent::AlreadyDone { key });
                continue;
            }

            position += 1;
            self.enter(RunState::Transferring {
                position,
                key: key.clone(),
            });
            self.emit(BatchEvent::Started {
                key: key.clone(),
                position,
                pending: pending.len(),
            });

            let Some(item) = self.resolve(&fresh, &key) else {
                self.emit(BatchEvent::Failed {
                    key: key.clone(),
                    error: BatchError::Unavailable(key.clone()).to_string(),
                });
                summary.failed.push(key);
                continue;
            };

            if executor.transfer(&item).await {
                store.mark_done(&key)?;
                summary.transferred += 1;
                self.emit(BatchEvent::Completed { key });
            } else {
                summary.failed.push(key);
            }
        }

        self.enter(RunState::Done);
        info!(
            direction = self.config.direction.verb(),
            total = summary.total,
            transferred = summary.transferred,
            already_done = summary.already_done,
            failed = summary.failed.len(),
            "batch finished"
        );
        Ok(summary)
    }

    fn check_preconditions(&self) -> Result<(), BatchError> {
        let root = &self.config.root;
        if root.as_os_str().is_empty() {
            return Err(BatchError::Precondition("path is empty".into()));
        }
        if !root.exists() {
            return Err(BatchError::Precondition(format!(
                "path does not exist: {}",
                root.display()
            )));
        }
        if !root.is_dir() {
            return Err(BatchError::Precondition(format!(
                "path is not a directory: {}",
                root.display()
            )));
        }
        Ok(())
    }

    /// Entries this run iterates over, in key order.
    ///
    /// A run restricted to a single remote item only touches the freshly
    /// discovered keys; other recorded keys are kept on disk untouched.
    fn scope(&self, merged: &ProgressRecord, fresh: &WorkSet) -> Vec<(String, bool)> {
        merged
            .iter()
            .filter(|(key, _)| self.config.only.is_none() || fresh.get(key).is_some())
            .map(|(key, done)| (key.to_string(), done))
            .collect()
    }

    /// Finds the work item for a key of the merged set.
    ///
    /// Recorded upload keys are file paths and can be retried without
    /// rediscovery; recorded download keys need the listing metadata.
    fn resolve(&self, fresh: &WorkSet, key: &str) -> Option<WorkItem> {
        if let Some(item) = fresh.get(key) {
            return Some(item.clone());
        }
        match self.config.direction {
            Direction::Outbound => Some(WorkItem::local(PathBuf::from(key))),
            Direction::Inbound => None,
        }
    }

    fn enter(&self, state: RunState) {
        debug!(state = ?state, "batch state");
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn emit(&self, event: BatchEvent) {
        let _ = self.events_tx.send(event);
    }
}
