//! Background process manager.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use jiff::Timestamp;
use tokio::sync::{RwLock, mpsc, watch};

use super::{
    ProcessEvent, ProcessId, ProcessProgress, ProcessResult, ProcessSnapshot, ProcessState,
    ProcessUpdate,
};

/// Tracing target for process lifecycle events.
pub const TRACING_TARGET: &str = "tandem_tools::process";

/// Capacity of the update channel shared by all process tasks.
const UPDATE_BUFFER: usize = 256;

/// Default number of processes kept in the table.
pub const DEFAULT_MAX_RETAINED_PROCESSES: usize = 1024;

struct ProcessEntry {
    snapshot: ProcessSnapshot,
    state: watch::Sender<ProcessState>,
}

struct ProcessTable {
    entries: HashMap<ProcessId, ProcessEntry>,
    max_retained: usize,
}

impl ProcessTable {
    fn new(max_retained: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_retained,
        }
    }

    /// Evicts the least recently updated terminal processes while the
    /// table is over its limit. Pending and running processes are kept.
    fn evict_terminal(&mut self) {
        while self.entries.len() > self.max_retained {
            let oldest = self
                .entries
                .iter()
                .filter(|(_, entry)| entry.snapshot.state.is_terminal())
                .min_by_key(|(_, entry)| entry.snapshot.updated_at)
                .map(|(id, _)| *id);

            let Some(id) = oldest else {
                break;
            };

            self.entries.remove(&id);
            tracing::debug!(
                target: TRACING_TARGET,
                process_id = %id,
                "Evicted finished process"
            );
        }
    }
}

type SharedProcessTable = Arc<RwLock<ProcessTable>>;

struct ProcessManagerInner {
    processes: SharedProcessTable,
    updates: mpsc::Sender<ProcessUpdate>,
}

/// Spawns background processes and tracks their state.
///
/// Each process runs on its own Tokio task and reports through a shared
/// mpsc channel; a collector task applies the updates to the process table.
/// Clones share the same table. Finished processes are evicted, oldest
/// first, once the table holds more than its retention limit.
#[derive(Clone)]
pub struct ProcessManager {
    inner: Arc<ProcessManagerInner>,
}

impl ProcessManager {
    /// Creates a manager retaining [`DEFAULT_MAX_RETAINED_PROCESSES`] and
    /// starts its collector task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_MAX_RETAINED_PROCESSES)
    }

    /// Creates a manager keeping at most `max_retained` processes, unless
    /// more than that are still pending or running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_retention(max_retained: usize) -> Self {
        let processes = Arc::new(RwLock::new(ProcessTable::new(max_retained)));
        let (updates, receiver) = mpsc::channel(UPDATE_BUFFER);

        tokio::spawn(collect_updates(processes.clone(), receiver));

        Self {
            inner: Arc::new(ProcessManagerInner { processes, updates }),
        }
    }

    /// Registers a `pending` process and runs `work` on a new task.
    ///
    /// The returned handle observes the state as updates are applied.
    pub async fn spawn<F, Fut, E>(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        work: F,
    ) -> ProcessHandle
    where
        F: FnOnce(ProcessReporter) -> Fut + Send + 'static,
        Fut: Future<Output = Result<ProcessResult, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let id = ProcessId::new();
        let now = Timestamp::now();
        let (state, receiver) = watch::channel(ProcessState::Pending);

        let snapshot = ProcessSnapshot {
            id,
            name: name.into(),
            description: description.into(),
            state: ProcessState::Pending,
            progress: Vec::new(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        };

        tracing::info!(
            target: TRACING_TARGET,
            process_id = %id,
            name = %snapshot.name,
            "Process registered"
        );

        {
            let mut processes = self.inner.processes.write().await;
            processes.entries.insert(id, ProcessEntry { snapshot, state });
            processes.evict_terminal();
        }

        let reporter = ProcessReporter {
            id,
            updates: self.inner.updates.clone(),
        };

        tokio::spawn(async move {
            reporter.send(ProcessEvent::Started).await;

            let outcome = AssertUnwindSafe(work(reporter.clone()))
                .catch_unwind()
                .await;

            let event = match outcome {
                Ok(Ok(result)) => ProcessEvent::Succeeded(result),
                Ok(Err(error)) => ProcessEvent::Failed(error.to_string()),
                Err(_) => ProcessEvent::Failed("process panicked".to_owned()),
            };

            reporter.send(event).await;
        });

        ProcessHandle {
            id,
            state: receiver,
        }
    }

    /// Returns a snapshot of a process.
    pub async fn get(&self, id: ProcessId) -> Option<ProcessSnapshot> {
        let processes = self.inner.processes.read().await;
        processes.entries.get(&id).map(|entry| entry.snapshot.clone())
    }

    /// Returns a handle observing an existing process.
    pub async fn subscribe(&self, id: ProcessId) -> Option<ProcessHandle> {
        let processes = self.inner.processes.read().await;
        processes.entries.get(&id).map(|entry| ProcessHandle {
            id,
            state: entry.state.subscribe(),
        })
    }

    /// Number of tracked processes.
    pub async fn len(&self) -> usize {
        self.inner.processes.read().await.entries.len()
    }

    /// Returns whether no process has been spawned.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for ProcessManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProcessManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessManager").finish_non_exhaustive()
    }
}

/// Sends updates for one process; handed to the process work.
#[derive(Debug, Clone)]
pub struct ProcessReporter {
    id: ProcessId,
    updates: mpsc::Sender<ProcessUpdate>,
}

impl ProcessReporter {
    /// Id of the process being reported on.
    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// Reports progress; `percentage` is clamped to 100.
    pub async fn progress(&self, percentage: u8, text: impl Into<String>) {
        self.send(ProcessEvent::Progress {
            percentage: percentage.min(100),
            text: text.into(),
        })
        .await;
    }

    async fn send(&self, event: ProcessEvent) {
        let update = ProcessUpdate { id: self.id, event };
        if self.updates.send(update).await.is_err() {
            tracing::warn!(
                target: TRACING_TARGET,
                process_id = %self.id,
                "Process manager stopped, update dropped"
            );
        }
    }
}

/// Observes the state of one process.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    id: ProcessId,
    state: watch::Receiver<ProcessState>,
}

impl ProcessHandle {
    /// Process id.
    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// Latest applied state.
    pub fn state(&self) -> ProcessState {
        *self.state.borrow()
    }

    /// Waits until the state satisfies `predicate` and returns it.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&ProcessState) -> bool,
    ) -> ProcessState {
        let observed = self.state.wait_for(predicate).await.map(|state| *state);
        observed.unwrap_or_else(|_| *self.state.borrow())
    }

    /// Waits until the process succeeds or fails.
    pub async fn wait(&mut self) -> ProcessState {
        self.wait_for(ProcessState::is_terminal).await
    }
}

async fn collect_updates(
    processes: SharedProcessTable,
    mut receiver: mpsc::Receiver<ProcessUpdate>,
) {
    while let Some(update) = receiver.recv().await {
        apply_update(&processes, update).await;
    }

    tracing::debug!(target: TRACING_TARGET, "Process update channel closed");
}

async fn apply_update(processes: &RwLock<ProcessTable>, update: ProcessUpdate) {
    let mut processes = processes.write().await;
    let Some(entry) = processes.entries.get_mut(&update.id) else {
        tracing::warn!(
            target: TRACING_TARGET,
            process_id = %update.id,
            "Update for unknown process"
        );
        return;
    };

    let current = entry.snapshot.state;
    let next = match &update.event {
        ProcessEvent::Started => ProcessState::Running,
        ProcessEvent::Progress { .. } => current,
        ProcessEvent::Succeeded(_) => ProcessState::Succeeded,
        ProcessEvent::Failed(_) => ProcessState::Failed,
    };

    let valid = match &update.event {
        ProcessEvent::Progress { .. } => current == ProcessState::Running,
        _ => current.can_transition_to(next),
    };

    if !valid {
        tracing::warn!(
            target: TRACING_TARGET,
            process_id = %update.id,
            from = %current,
            to = %next,
            "Ignoring invalid process transition"
        );
        return;
    }

    let now = Timestamp::now();
    let snapshot = &mut entry.snapshot;
    match update.event {
        ProcessEvent::Started => {}
        ProcessEvent::Progress { percentage, text } => {
            snapshot.progress.push(ProcessProgress {
                percentage,
                text,
                reported_at: now,
            });
        }
        ProcessEvent::Succeeded(result) => snapshot.result = Some(result),
        ProcessEvent::Failed(error) => {
            tracing::warn!(
                target: TRACING_TARGET,
                process_id = %update.id,
                error = %error,
                "Process failed"
            );
            snapshot.error = Some(error);
        }
    }

    snapshot.state = next;
    snapshot.updated_at = now;

    if next != current {
        tracing::debug!(
            target: TRACING_TARGET,
            process_id = %update.id,
            from = %current,
            to = %next,
            "Process state changed"
        );
        entry.state.send_replace(next);
    }

    if next.is_terminal() {
        processes.evict_terminal();
    }
}
