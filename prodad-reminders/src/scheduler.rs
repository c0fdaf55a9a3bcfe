//! Reminder notification scheduler.
//!
//! Main loop that keeps tracker rows and in-memory timers in line with
//! the reminder list:
//! - re-evaluates the due-window policy whenever the reminders collection
//!   changes (create, update, completion toggle)
//! - runs a fixed-interval fallback sweep that catches up on anything a
//!   timer missed
//! - processes commands (stop, force sweep)
//!
//! Follows the same architecture as the store-facing engines elsewhere in
//! the workspace: a command handle plus a `tokio::select!` loop.

use crate::error::{SchedulerError, SchedulerResult};
use crate::notify::NotificationSink;
use crate::policy::{DueAction, DuePolicy};

use prodad_model::{now_ms, Collection, Reminder, ReminderNotification};
use prodad_storage::ProDadStore;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Scheduler tuning. The 60 s sweep is the foreground fallback poll for
/// platforms without background periodic scheduling.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub policy: DuePolicy,
    pub sweep_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            policy: DuePolicy::default(),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Commands accepted by a running scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    Stop,
    Sweep,
    Complete { id: i64, completed: bool },
    Remove { id: i64 },
}

/// Handle for sending commands to a running scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    pub async fn stop(&self) -> SchedulerResult<()> {
        self.send(SchedulerCommand::Stop).await
    }

    /// Forces an immediate due-reminder sweep.
    pub async fn sweep(&self) -> SchedulerResult<()> {
        self.send(SchedulerCommand::Sweep).await
    }

    /// Toggles completion with the timer and delivery bookkeeping.
    pub async fn mark_complete(&self, id: i64, completed: bool) -> SchedulerResult<()> {
        self.send(SchedulerCommand::Complete { id, completed }).await
    }

    /// Deletes a reminder, cancelling its timer and cascading the tracker.
    pub async fn remove(&self, id: i64) -> SchedulerResult<()> {
        self.send(SchedulerCommand::Remove { id }).await
    }

    async fn send(&self, command: SchedulerCommand) -> SchedulerResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| SchedulerError::NotRunning)
    }
}

/// Creates a scheduler and its command handle.
pub fn create_scheduler(
    store: ProDadStore,
    sink: Arc<dyn NotificationSink>,
    config: SchedulerConfig,
) -> (SchedulerHandle, ReminderScheduler) {
    let (command_tx, command_rx) = mpsc::channel(16);
    let handle = SchedulerHandle { command_tx };
    let scheduler = ReminderScheduler {
        store,
        sink,
        policy: config.policy,
        sweep_interval: config.sweep_interval,
        command_rx,
        timers: Arc::new(Mutex::new(HashMap::new())),
    };
    (handle, scheduler)
}

/// Keeps each active reminder's notification state in line with the
/// due-window policy. Timer handles live only in this struct; restarts
/// re-derive everything from the store.
pub struct ReminderScheduler {
    store: ProDadStore,
    sink: Arc<dyn NotificationSink>,
    policy: DuePolicy,
    sweep_interval: Duration,
    command_rx: mpsc::Receiver<SchedulerCommand>,
    /// Pending timers by reminder id. Session-local by design.
    timers: Arc<Mutex<HashMap<i64, JoinHandle<()>>>>,
}

impl ReminderScheduler {
    /// Runs the scheduler loop until stopped. Evaluates once up front so a
    /// fresh session immediately re-schedules persisted reminders.
    pub async fn run(mut self) {
        info!("reminder scheduler started");

        if let Err(e) = self.evaluate() {
            warn!("initial reminder evaluation failed: {e}");
        }

        let mut sweep = tokio::time::interval(self.sweep_interval);
        sweep.tick().await; // skip the immediate first tick
        let mut changes = self.store.subscribe();

        loop {
            tokio::select! {
                _ = sweep.tick() => {
                    if let Err(e) = self.sweep() {
                        warn!("due-reminder sweep failed: {e}");
                    }
                }
                change = changes.recv() => {
                    match change {
                        Ok(event) if event.touches(Collection::Reminders) => {
                            if let Err(e) = self.evaluate() {
                                warn!("reminder evaluation failed: {e}");
                            }
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            debug!(missed, "change bus lagged, re-evaluating");
                            if let Err(e) = self.evaluate() {
                                warn!("reminder evaluation failed: {e}");
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => {}
                    }
                }
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::Sweep) => {
                            if let Err(e) = self.sweep() {
                                warn!("forced sweep failed: {e}");
                            }
                        }
                        Some(SchedulerCommand::Complete { id, completed }) => {
                            if let Err(e) = self.mark_complete(id, completed) {
                                warn!(reminder_id = id, "completion toggle failed: {e}");
                            }
                        }
                        Some(SchedulerCommand::Remove { id }) => {
                            if let Err(e) = self.remove(id) {
                                warn!(reminder_id = id, "reminder removal failed: {e}");
                            }
                        }
                        Some(SchedulerCommand::Stop) | None => break,
                    }
                }
            }
        }

        self.cancel_all_timers();
        info!("reminder scheduler stopped");
    }

    /// Applies the due-window policy to every active reminder.
    ///
    /// Tracker rows are created/refreshed for anything inside the schedule
    /// horizon even without notification permission; only the timer and
    /// the OS notification are suppressed in that case.
    pub fn evaluate(&self) -> SchedulerResult<()> {
        let now = now_ms();
        let active = self.store.active_reminders()?;
        self.prune_timers(&active);
        for reminder in active {
            let Some(id) = reminder.id else { continue };
            let delivered = self
                .store
                .tracker_for_reminder(id)?
                .map(|t| t.delivered)
                .unwrap_or(false);

            match self.policy.decide(reminder.date - now, delivered) {
                DueAction::Schedule { delay } => self.schedule(&reminder, delay)?,
                DueAction::FireNow => self.fire_now(&reminder)?,
                DueAction::Leave => {}
            }
        }
        Ok(())
    }

    /// Catch-up pass only: fires undelivered, currently-due reminders.
    /// This is what the fallback interval runs.
    pub fn sweep(&self) -> SchedulerResult<()> {
        let now = now_ms();
        for reminder in self.store.active_reminders()? {
            let Some(id) = reminder.id else { continue };
            let delivered = self
                .store
                .tracker_for_reminder(id)?
                .map(|t| t.delivered)
                .unwrap_or(false);
            if self.policy.decide(reminder.date - now, delivered) == DueAction::FireNow {
                self.fire_now(&reminder)?;
            }
        }
        Ok(())
    }

    /// Clears any previous timer for the reminder and re-applies the
    /// policy with its current date. Call after a date update.
    pub fn reschedule(&self, id: i64) -> SchedulerResult<()> {
        self.cancel_timer(id);
        let Some(reminder) = self.store.get_reminder(id)? else {
            return Ok(());
        };
        if reminder.completed {
            return Ok(());
        }
        let delivered = self
            .store
            .tracker_for_reminder(id)?
            .map(|t| t.delivered)
            .unwrap_or(false);
        match self.policy.decide(reminder.date - now_ms(), delivered) {
            DueAction::Schedule { delay } => self.schedule(&reminder, delay),
            DueAction::FireNow => self.fire_now(&reminder),
            DueAction::Leave => Ok(()),
        }
    }

    /// Toggles completion with the notification bookkeeping: completing
    /// cancels the pending timer and suppresses further firing;
    /// un-completing resets delivery so a still-due reminder may re-fire
    /// on the next evaluation.
    pub fn mark_complete(&self, id: i64, completed: bool) -> SchedulerResult<()> {
        self.store.complete_reminder(id, completed)?;
        if completed {
            self.cancel_timer(id);
            self.store.mark_tracker_delivered(id, true)?;
        } else {
            self.store.mark_tracker_delivered(id, false)?;
        }
        Ok(())
    }

    /// Deletes a reminder: cancels its timer, then the store cascade
    /// removes the reminder and its tracker row.
    pub fn remove(&self, id: i64) -> SchedulerResult<()> {
        self.cancel_timer(id);
        self.store.delete_reminder(id)?;
        Ok(())
    }

    // ── internals ────────────────────────────────────────────────

    fn schedule(&self, reminder: &Reminder, delay: Duration) -> SchedulerResult<()> {
        let Some(id) = reminder.id else {
            return Ok(());
        };

        self.store.upsert_tracker(&ReminderNotification {
            id: None,
            reminder_id: id,
            title: reminder.title.clone(),
            description: reminder.description.clone(),
            date: reminder.date,
            scheduled: true,
            delivered: false,
        })?;

        if !self.sink.has_permission() {
            debug!(reminder_id = id, "notification permission missing, timer skipped");
            return Ok(());
        }

        let store = self.store.clone();
        let sink = Arc::clone(&self.sink);
        let timers = Arc::clone(&self.timers);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            deliver(&store, sink.as_ref(), id);
            if let Ok(mut map) = timers.lock() {
                map.remove(&id);
            }
        });

        if let Ok(mut map) = self.timers.lock() {
            if let Some(old) = map.insert(id, handle) {
                old.abort();
            }
        }
        debug!(reminder_id = id, delay_ms = delay.as_millis() as u64, "timer set");
        Ok(())
    }

    fn fire_now(&self, reminder: &Reminder) -> SchedulerResult<()> {
        if !self.sink.has_permission() {
            debug!("notification permission missing, catch-up fire skipped");
            return Ok(());
        }
        if let Some(id) = reminder.id {
            deliver(&self.store, self.sink.as_ref(), id);
        }
        Ok(())
    }

    /// Aborts timers whose reminder is no longer active. Completion and
    /// deletion usually arrive through the store, so the change-bus
    /// re-evaluation is where their pending timers get cancelled.
    fn prune_timers(&self, active: &[Reminder]) {
        let keep: HashSet<i64> = active.iter().filter_map(|r| r.id).collect();
        if let Ok(mut map) = self.timers.lock() {
            map.retain(|id, handle| {
                let stale = !keep.contains(id);
                if stale {
                    handle.abort();
                    debug!(reminder_id = *id, "stale timer cancelled");
                }
                !stale
            });
        }
    }

    fn cancel_timer(&self, id: i64) {
        if let Ok(mut map) = self.timers.lock() {
            if let Some(handle) = map.remove(&id) {
                handle.abort();
            }
        }
    }

    fn cancel_all_timers(&self) {
        if let Ok(mut map) = self.timers.lock() {
            for (_, handle) in map.drain() {
                handle.abort();
            }
        }
    }
}

/// Notification side effect plus delivery bookkeeping. Creates the tracker
/// row delivered=true when the catch-up path reaches a reminder that never
/// got one.
///
/// The reminder is re-read at fire time: a timer set minutes ago may
/// outlive its reminder, and a completed or deleted reminder must not
/// notify (nor get its tracker row resurrected).
fn deliver(store: &ProDadStore, sink: &dyn NotificationSink, id: i64) {
    let reminder = match store.get_reminder(id) {
        Ok(Some(r)) if !r.completed => r,
        Ok(_) => {
            debug!(reminder_id = id, "due reminder gone or completed, delivery skipped");
            return;
        }
        Err(e) => {
            warn!(reminder_id = id, "failed to load due reminder: {e}");
            return;
        }
    };

    sink.notify(
        &format!("ProDad Reminder: {}", reminder.title),
        reminder.description.as_deref().unwrap_or(""),
    );

    let result = store.mark_tracker_delivered(id, true).and_then(|affected| {
        if affected == 0 {
            store
                .upsert_tracker(&ReminderNotification {
                    id: None,
                    reminder_id: id,
                    title: reminder.title.clone(),
                    description: reminder.description.clone(),
                    date: reminder.date,
                    scheduled: false,
                    delivered: true,
                })
                .map(|_| ())
        } else {
            Ok(())
        }
    });
    if let Err(e) = result {
        warn!(reminder_id = id, "failed to record notification delivery: {e}");
    }
}
