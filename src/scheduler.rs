//! Periodic timers
//!
//! The dashboard runs two independent periodic schedules: the one-second
//! retry tick and the auto-refresh. Both go through [`Scheduler`] so tests
//! can drive them with [`ManualScheduler`] instead of real time.

use crate::error::{MonitorError, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Callback fired on every period
pub type PeriodicTask = Box<dyn FnMut() + Send + 'static>;

pub trait Scheduler: Send + Sync {
    /// Run `task` every `period`, first after one full period has elapsed
    fn schedule_periodic(&self, period: Duration, task: PeriodicTask) -> TaskHandle;
}

/// Cancels its schedule when cancelled explicitly or dropped
#[derive(Debug)]
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
    abort: Option<tokio::task::AbortHandle>,
}

impl TaskHandle {
    fn new(cancelled: Arc<AtomicBool>, abort: Option<tokio::task::AbortHandle>) -> Self {
        Self { cancelled, abort }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Real-time scheduler backed by tokio intervals
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: tokio::runtime::Handle,
}

impl TokioScheduler {
    pub fn new(runtime: tokio::runtime::Handle) -> Self {
        Self { runtime }
    }

    /// Scheduler on the runtime the caller is running in
    pub fn from_current() -> Result<Self> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|e| MonitorError::config(format!("No tokio runtime available: {}", e)))
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_periodic(&self, period: Duration, mut task: PeriodicTask) -> TaskHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let join = self.runtime.spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                task();
            }
        });
        TaskHandle::new(cancelled, Some(join.abort_handle()))
    }
}

struct ManualEntry {
    id: u64,
    period: Duration,
    next_due: Duration,
    cancelled: Arc<AtomicBool>,
    task: Option<PeriodicTask>,
}

#[derive(Default)]
struct ManualClock {
    now: Duration,
    entries: Vec<ManualEntry>,
}

/// Deterministic scheduler; time only moves through [`ManualScheduler::advance`]
#[derive(Clone, Default)]
pub struct ManualScheduler {
    clock: Arc<Mutex<ManualClock>>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("now", &self.now())
            .field("active", &self.active_count())
            .finish()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since creation
    pub fn now(&self) -> Duration {
        self.clock.lock().map(|c| c.now).unwrap_or_default()
    }

    /// Schedules that have not been cancelled
    pub fn active_count(&self) -> usize {
        self.clock
            .lock()
            .map(|c| {
                c.entries
                    .iter()
                    .filter(|e| !e.cancelled.load(Ordering::SeqCst))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Move time forward, firing every due task in time order
    ///
    /// Returns how many callbacks ran. Tasks run without the clock locked so
    /// they may schedule or cancel other tasks.
    pub fn advance(&self, by: Duration) -> usize {
        let target = match self.clock.lock() {
            Ok(clock) => clock.now + by,
            Err(_) => return 0,
        };
        let mut fired = 0;
        loop {
            let (id, mut task) = {
                let Ok(mut guard) = self.clock.lock() else {
                    return fired;
                };
                let clock = &mut *guard;
                clock
                    .entries
                    .retain(|e| !e.cancelled.load(Ordering::SeqCst));
                let due = clock
                    .entries
                    .iter_mut()
                    .filter(|e| e.next_due <= target)
                    .min_by_key(|e| (e.next_due, e.id));
                let Some(entry) = due else {
                    clock.now = target;
                    return fired;
                };
                let at = entry.next_due;
                entry.next_due += entry.period;
                let id = entry.id;
                let Some(task) = entry.task.take() else {
                    return fired;
                };
                clock.now = at;
                (id, task)
            };

            task();
            fired += 1;

            if let Ok(mut clock) = self.clock.lock()
                && let Some(entry) = clock.entries.iter_mut().find(|e| e.id == id)
            {
                entry.task = Some(task);
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_periodic(&self, period: Duration, task: PeriodicTask) -> TaskHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        // A zero period would fire forever within one advance
        let period = period.max(Duration::from_millis(1));
        if let Ok(mut clock) = self.clock.lock() {
            let next_due = clock.now + period;
            clock.entries.push(ManualEntry {
                id,
                period,
                next_due,
                cancelled: cancelled.clone(),
                task: Some(task),
            });
        }
        TaskHandle::new(cancelled, None)
    }
}
