//! View controller for the interactive dashboard
//!
//! One operation is active at a time. Navigation, the auto-refresh timer and
//! the retry countdown all funnel into a single task that stamps each fetch
//! with a generation; a result whose generation is no longer current is
//! dropped. The latest view is published through a `watch` channel.
//!
//! The one-second retry tick only runs while a countdown does; it is started
//! by the rate-limited result so the first decrement lands a full second
//! after the failure. A terminal failure stops auto-refresh until the next
//! navigation.

use crate::amber::{CurrentPriceOptions, PricingApi};
use crate::config::LiveConfig;
use crate::error::{MonitorError, Result};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::report::{
    DetailReport, LiveRange, LiveReport, OverviewReport, PriceOutlook, ReportOptions, fetch_detail,
    fetch_live, fetch_outlook, fetch_overview,
};
use crate::retry::{RetryCountdown, RetryState, TickOutcome};
use crate::scheduler::{PeriodicTask, Scheduler, TaskHandle};
use crate::store::SessionStore;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// What the dashboard is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Operation {
    Overview,
    Detail { date: NaiveDate },
    Live { range: LiveRange },
    Prices { options: CurrentPriceOptions },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overview => f.write_str("overview"),
            Self::Detail { date } => write!(f, "day {}", date),
            Self::Live { range } => write!(f, "live {}", range),
            Self::Prices { .. } => f.write_str("prices"),
        }
    }
}

/// Result of one operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Overview(OverviewReport),
    Detail(DetailReport),
    Live(LiveReport),
    Prices(PriceOutlook),
}

/// Run one operation against the API for the stored site
pub async fn fetch_operation(
    api: &dyn PricingApi,
    store: &dyn SessionStore,
    operation: Operation,
    options: &ReportOptions,
) -> Result<Report> {
    let session = store.load()?;
    let site_id = session.require_site_id()?;
    let now = Utc::now();
    match operation {
        Operation::Overview => {
            fetch_overview(api, site_id, options.zone.date_of(now), options)
                .await
                .map(Report::Overview)
        }
        Operation::Detail { date } => fetch_detail(api, site_id, date, options)
            .await
            .map(Report::Detail),
        Operation::Live { range } => fetch_live(api, site_id, range, now, options)
            .await
            .map(Report::Live),
        Operation::Prices { options: window } => fetch_outlook(api, site_id, window, now)
            .await
            .map(Report::Prices),
    }
}

/// Published view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewState {
    /// Nothing requested yet
    Idle,
    Loading {
        generation: u64,
        operation: Operation,
    },
    Ready {
        generation: u64,
        operation: Operation,
        report: Report,
    },
    /// The whole view is replaced by the error banner
    Failed {
        generation: u64,
        operation: Operation,
        message: String,
        /// The session must log in again
        terminal: bool,
        retry: RetryState,
    },
}

impl ViewState {
    pub fn generation(&self) -> Option<u64> {
        match self {
            Self::Idle => None,
            Self::Loading { generation, .. }
            | Self::Ready { generation, .. }
            | Self::Failed { generation, .. } => Some(*generation),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// Timer periods
#[derive(Debug, Clone, Copy)]
pub struct DashboardSettings {
    pub refresh_interval: Duration,
    pub retry_tick: Duration,
}

impl DashboardSettings {
    pub fn from_config(config: &LiveConfig) -> Self {
        Self {
            refresh_interval: Duration::from_secs(config.refresh_interval_seconds),
            retry_tick: Duration::from_millis(config.retry_tick_ms),
        }
    }
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(300),
            retry_tick: Duration::from_secs(1),
        }
    }
}

#[derive(Debug)]
enum DashboardCommand {
    Show(Operation),
    Refresh,
    /// Countdown tick for the countdown started by this generation
    Tick(u64),
}

struct FetchOutcome {
    generation: u64,
    operation: Operation,
    result: Result<Report>,
}

struct Dashboard {
    api: Arc<dyn PricingApi>,
    store: Arc<dyn SessionStore>,
    options: ReportOptions,
    logger: StructuredLogger,
    generation: u64,
    current: Option<Operation>,
    in_flight: bool,
    retry: RetryCountdown,
    state_tx: watch::Sender<ViewState>,
    results_tx: mpsc::UnboundedSender<FetchOutcome>,
    commands_tx: mpsc::WeakUnboundedSender<DashboardCommand>,
    stale_discarded: Arc<AtomicU64>,
    scheduler: Arc<dyn Scheduler>,
    retry_tick: Duration,
    retry_timer: Option<TaskHandle>,
    refresh_timer: TaskHandle,
}

/// Owner side of a running dashboard
///
/// Dropping the handle stops the controller and cancels its timers.
pub struct DashboardHandle {
    commands: mpsc::UnboundedSender<DashboardCommand>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    state: watch::Receiver<ViewState>,
    stale_discarded: Arc<AtomicU64>,
    join: Option<JoinHandle<()>>,
}

impl DashboardHandle {
    /// Navigate to an operation, superseding whatever is in flight
    pub fn show(&self, operation: Operation) -> Result<()> {
        self.send(DashboardCommand::Show(operation))
    }

    /// Re-run the current operation now
    pub fn refresh(&self) -> Result<()> {
        self.send(DashboardCommand::Refresh)
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.clone()
    }

    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Results dropped because a newer request had started
    pub fn stale_discarded(&self) -> u64 {
        self.stale_discarded.load(Ordering::SeqCst)
    }

    /// Stop the controller and wait for it to finish
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            join.await
                .map_err(|e| MonitorError::io(format!("Dashboard task failed: {}", e)))?;
        }
        Ok(())
    }

    fn send(&self, command: DashboardCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| MonitorError::config("Dashboard has stopped"))
    }
}

/// Start the controller on the current runtime
pub fn spawn_dashboard(
    api: Arc<dyn PricingApi>,
    store: Arc<dyn SessionStore>,
    options: ReportOptions,
    settings: DashboardSettings,
    scheduler: Arc<dyn Scheduler>,
) -> DashboardHandle {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let (state_tx, state_rx) = watch::channel(ViewState::Idle);
    let (results_tx, results_rx) = mpsc::unbounded_channel();
    let stale_discarded = Arc::new(AtomicU64::new(0));

    // Timers hold weak senders so they never keep the controller alive
    let refresh_timer = scheduler.schedule_periodic(
        settings.refresh_interval,
        command_task(commands_tx.downgrade(), || DashboardCommand::Refresh),
    );

    let dashboard = Dashboard {
        api,
        store,
        options,
        logger: get_logger_with_context(LogContext::new("dashboard")),
        generation: 0,
        current: None,
        in_flight: false,
        retry: RetryCountdown::new(),
        state_tx,
        results_tx,
        commands_tx: commands_tx.downgrade(),
        stale_discarded: stale_discarded.clone(),
        scheduler,
        retry_tick: settings.retry_tick,
        retry_timer: None,
        refresh_timer,
    };
    let join = tokio::spawn(dashboard.run(commands_rx, results_rx, shutdown_rx));

    DashboardHandle {
        commands: commands_tx,
        shutdown_tx: Some(shutdown_tx),
        state: state_rx,
        stale_discarded,
        join: Some(join),
    }
}

fn command_task<F>(tx: mpsc::WeakUnboundedSender<DashboardCommand>, command: F) -> PeriodicTask
where
    F: Fn() -> DashboardCommand + Send + 'static,
{
    Box::new(move || {
        if let Some(tx) = tx.upgrade() {
            let _ = tx.send(command());
        }
    })
}

impl Dashboard {
    async fn run(
        mut self,
        mut commands_rx: mpsc::UnboundedReceiver<DashboardCommand>,
        mut results_rx: mpsc::UnboundedReceiver<FetchOutcome>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        self.logger.debug("Dashboard started");
        loop {
            tokio::select! {
                command = commands_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(outcome) = results_rx.recv() => self.handle_outcome(outcome),
                _ = &mut shutdown_rx => break,
            }
        }

        self.stop_countdown();
        self.refresh_timer.cancel();
        self.logger.info("Dashboard stopped");
    }

    fn handle_command(&mut self, command: DashboardCommand) {
        match command {
            DashboardCommand::Show(operation) => {
                self.stop_countdown();
                self.current = Some(operation);
                self.start(operation);
            }
            DashboardCommand::Refresh => {
                let Some(operation) = self.current else {
                    return;
                };
                if self.in_flight || self.retry.is_counting() {
                    self.logger.debug("Refresh skipped; request pending");
                    return;
                }
                self.logger.debug(&format!("Refreshing {}", operation));
                self.start(operation);
            }
            DashboardCommand::Tick(generation) if generation != self.generation => {
                self.logger.trace("Ignoring tick from an earlier countdown");
            }
            DashboardCommand::Tick(_) => match self.retry.tick() {
                TickOutcome::Idle => self.retry_timer = None,
                TickOutcome::Waiting(_) => {
                    let retry = self.retry.state();
                    self.state_tx.send_modify(|state| {
                        if let ViewState::Failed { retry: shown, .. } = state {
                            *shown = retry;
                        }
                    });
                }
                TickOutcome::Retry => {
                    self.retry_timer = None;
                    if let Some(operation) = self.current {
                        self.logger.info(&format!("Retrying {}", operation));
                        self.start(operation);
                    }
                }
            },
        }
    }

    /// Begin ticking a fresh countdown for the current generation
    fn start_countdown(&mut self) {
        let generation = self.generation;
        self.retry_timer = Some(self.scheduler.schedule_periodic(
            self.retry_tick,
            command_task(self.commands_tx.clone(), move || {
                DashboardCommand::Tick(generation)
            }),
        ));
    }

    fn stop_countdown(&mut self) {
        self.retry.cancel();
        self.retry_timer = None;
    }

    fn start(&mut self, operation: Operation) {
        self.generation += 1;
        let generation = self.generation;
        self.in_flight = true;
        self.state_tx.send_replace(ViewState::Loading {
            generation,
            operation,
        });

        let api = self.api.clone();
        let store = self.store.clone();
        let options = self.options;
        let results_tx = self.results_tx.clone();
        tokio::spawn(async move {
            let result = fetch_operation(api.as_ref(), store.as_ref(), operation, &options).await;
            let _ = results_tx.send(FetchOutcome {
                generation,
                operation,
                result,
            });
        });
    }

    fn handle_outcome(&mut self, outcome: FetchOutcome) {
        let logger = self.logger.for_generation(outcome.generation);
        if outcome.generation != self.generation {
            self.stale_discarded.fetch_add(1, Ordering::SeqCst);
            logger.debug(&format!(
                "Discarding stale {} result (current generation {})",
                outcome.operation, self.generation
            ));
            return;
        }

        self.in_flight = false;
        let generation = outcome.generation;
        let operation = outcome.operation;
        match outcome.result {
            Ok(report) => {
                self.retry.on_success();
                self.retry_timer = None;
                logger.debug(&format!("{} ready", operation));
                self.state_tx.send_replace(ViewState::Ready {
                    generation,
                    operation,
                    report,
                });
            }
            Err(e) => {
                if self.retry.on_failure(&e) {
                    self.start_countdown();
                    logger.warn(&format!(
                        "{} rate limited; retrying in {} seconds",
                        operation,
                        self.retry.seconds_remaining().unwrap_or_default()
                    ));
                } else {
                    self.retry_timer = None;
                    logger.error(&format!("{} failed: {}", operation, e));
                }
                if e.is_terminal() {
                    // Nothing refreshes until the user navigates again
                    self.current = None;
                }
                self.state_tx.send_replace(ViewState::Failed {
                    generation,
                    operation,
                    message: e.to_string(),
                    terminal: e.is_terminal(),
                    retry: self.retry.state(),
                });
            }
        }
    }
}
