//! Dependency-gated task scheduler.
//!
//! A [`TaskScheduler`] owns two maps keyed by task id: tasks still pending and
//! tasks already completed. [`tick`](TaskScheduler::tick) runs every pending
//! task whose dependencies have all completed and whose `not_before` time has
//! passed. A task that fails stays pending with its error recorded and is
//! retried on the next tick.
//!
//! Time comes from an injected [`Clock`], so tests drive the scheduler with a
//! [`ManualClock`] instead of sleeping. [`TaskScheduler::start`] moves the
//! scheduler onto a tokio task that ticks on an interval until
//! [`SchedulerHandle::stop`] is called.
//!
//! ```rust
//! use devstack_cli::scheduler::{Task, TaskScheduler};
//!
//! let mut scheduler = TaskScheduler::new();
//! scheduler.schedule(Task::new("network", || Ok(()))).unwrap();
//! scheduler.schedule(Task::new("db", || Ok(())).depends_on(["network"])).unwrap();
//!
//! assert_eq!(scheduler.tick(), vec!["network", "db"]);
//! assert!(scheduler.is_idle());
//! ```

use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::DevstackError;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(PoisonError::into_inner);
        *elapsed += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

type Action = Box<dyn FnMut() -> Result<()> + Send>;

/// A unit of work with the ids it waits on.
pub struct Task {
    id: String,
    dependencies: Vec<String>,
    delay: Duration,
    action: Action,
}

impl Task {
    pub fn new<F>(id: impl Into<String>, action: F) -> Self
    where
        F: FnMut() -> Result<()> + Send + 'static,
    {
        Self {
            id: id.into(),
            dependencies: Vec::new(),
            delay: Duration::ZERO,
            action: Box::new(action),
        }
    }

    #[must_use]
    pub fn depends_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Hold the task back until `delay` after it is scheduled.
    #[must_use]
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

struct PendingTask {
    task: Task,
    not_before: Instant,
    attempts: u32,
    last_error: Option<String>,
}

/// Owned scheduler state; see the module docs.
pub struct TaskScheduler {
    clock: Arc<dyn Clock>,
    pending: BTreeMap<String, PendingTask>,
    completed: BTreeMap<String, Instant>,
}

impl TaskScheduler {
    /// A scheduler on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            pending: BTreeMap::new(),
            completed: BTreeMap::new(),
        }
    }

    /// Queue a task. Ids must be unique across pending and completed tasks.
    pub fn schedule(&mut self, task: Task) -> Result<(), DevstackError> {
        if self.pending.contains_key(&task.id) || self.completed.contains_key(&task.id) {
            return Err(DevstackError::Other {
                message: format!("Task '{}' is already scheduled", task.id),
            });
        }

        let not_before = self.clock.now() + task.delay;
        tracing::debug!("Scheduled task '{}' waiting on {:?}", task.id, task.dependencies);
        self.pending.insert(
            task.id.clone(),
            PendingTask {
                task,
                not_before,
                attempts: 0,
                last_error: None,
            },
        );
        Ok(())
    }

    fn is_ready(&self, pending: &PendingTask, now: Instant) -> bool {
        now >= pending.not_before
            && pending.task.dependencies.iter().all(|dep| self.completed.contains_key(dep))
    }

    /// Run every ready task; returns the ids completed by this tick, in run order.
    ///
    /// Tasks unblocked by a completion earlier in the same tick also run.
    /// Each task is attempted at most once per tick.
    pub fn tick(&mut self) -> Vec<String> {
        let now = self.clock.now();
        let mut finished = Vec::new();
        let mut attempted: Vec<String> = Vec::new();

        loop {
            let ready: Vec<String> = self
                .pending
                .iter()
                .filter(|(id, pending)| !attempted.contains(id) && self.is_ready(pending, now))
                .map(|(id, _)| id.clone())
                .collect();

            if ready.is_empty() {
                break;
            }

            for id in ready {
                attempted.push(id.clone());
                let Some(pending) = self.pending.get_mut(&id) else {
                    continue;
                };
                pending.attempts += 1;

                match (pending.task.action)() {
                    Ok(()) => {
                        self.pending.remove(&id);
                        self.completed.insert(id.clone(), now);
                        tracing::debug!("Task '{id}' completed");
                        finished.push(id);
                    }
                    Err(e) => {
                        tracing::warn!("Task '{id}' failed (attempt {}): {e}", pending.attempts);
                        pending.last_error = Some(e.to_string());
                    }
                }
            }
        }

        finished
    }

    #[must_use]
    pub fn is_completed(&self, id: &str) -> bool {
        self.completed.contains_key(id)
    }

    #[must_use]
    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    /// Error from the most recent failed attempt of a pending task.
    #[must_use]
    pub fn last_error(&self, id: &str) -> Option<&str> {
        self.pending.get(id)?.last_error.as_deref()
    }

    #[must_use]
    pub fn attempts(&self, id: &str) -> u32 {
        self.pending.get(id).map_or(0, |p| p.attempts)
    }

    /// Pending ids in id order.
    pub fn pending_ids(&self) -> impl Iterator<Item = &str> {
        self.pending.keys().map(String::as_str)
    }

    /// Completed ids in id order.
    pub fn completed_ids(&self) -> impl Iterator<Item = &str> {
        self.completed.keys().map(String::as_str)
    }

    /// No task left to run.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Move the scheduler onto a tokio task that ticks every `period`.
    pub fn start(self, period: Duration) -> SchedulerHandle {
        let shared = Arc::new(tokio::sync::Mutex::new(self));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let worker = Arc::clone(&shared);
        let join = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        worker.lock().await.tick();
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::debug!("Scheduler loop stopping");
                        break;
                    }
                }
            }
        });

        SchedulerHandle {
            scheduler: shared,
            shutdown_tx,
            join,
        }
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// A running scheduler loop.
pub struct SchedulerHandle {
    scheduler: Arc<tokio::sync::Mutex<TaskScheduler>>,
    shutdown_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Shared access to the scheduler while it runs, e.g. to add tasks.
    #[must_use]
    pub fn scheduler(&self) -> Arc<tokio::sync::Mutex<TaskScheduler>> {
        Arc::clone(&self.scheduler)
    }

    /// Stop the loop and wait for it to exit.
    pub async fn stop(self) -> Result<()> {
        // The loop may already be gone; a closed channel is fine
        let _ = self.shutdown_tx.send(()).await;
        self.join.await?;
        Ok(())
    }
}
