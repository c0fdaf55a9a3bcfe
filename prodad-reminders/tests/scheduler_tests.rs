use prodad_model::{now_ms, Reminder, ReminderType};
use prodad_reminders::{create_scheduler, NotificationSink, SchedulerConfig};
use prodad_storage::ProDadStore;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Test sink: records every delivery, permission is switchable.
#[derive(Default)]
struct RecordingSink {
    denied: AtomicBool,
    fired: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn deny(&self) {
        self.denied.store(true, Ordering::SeqCst);
    }

    fn fired_titles(&self) -> Vec<String> {
        self.fired.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn has_permission(&self) -> bool {
        !self.denied.load(Ordering::SeqCst)
    }

    fn notify(&self, title: &str, _body: &str) {
        self.fired.lock().unwrap().push(title.to_string());
    }
}

fn reminder_due_in(title: &str, delta_ms: i64) -> Reminder {
    Reminder {
        id: None,
        title: title.into(),
        description: Some("with breakfast".into()),
        date: now_ms() + delta_ms,
        reminder_type: ReminderType::Medication,
        priority: None,
        completed: false,
        synced: false,
        created_at: 0,
        updated_at: 0,
        notify_before: None,
        recurring: None,
        recurrence_pattern: None,
        assigned_to: None,
    }
}

fn setup() -> (ProDadStore, Arc<RecordingSink>, prodad_reminders::ReminderScheduler) {
    let store = ProDadStore::open_in_memory().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let (_handle, scheduler) =
        create_scheduler(store.clone(), sink.clone(), SchedulerConfig::default());
    (store, sink, scheduler)
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..100 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition was never reached");
}

const MINUTE: i64 = 60_000;
const HOUR: i64 = 60 * MINUTE;

// ── Policy application ───────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn future_reminder_gets_scheduled_tracker() {
    let (store, sink, scheduler) = setup();
    let id = store.add_reminder(reminder_due_in("Meds", 30 * MINUTE)).unwrap();

    scheduler.evaluate().unwrap();

    let tracker = store.tracker_for_reminder(id).unwrap().unwrap();
    assert!(tracker.scheduled);
    assert!(!tracker.delivered);
    assert!(sink.fired_titles().is_empty()); // not due yet
}

#[tokio::test(start_paused = true)]
async fn recently_missed_reminder_fires_immediately_once() {
    let (store, sink, scheduler) = setup();
    let id = store.add_reminder(reminder_due_in("Meds", -10 * MINUTE)).unwrap();

    scheduler.evaluate().unwrap();

    let tracker = store.tracker_for_reminder(id).unwrap().unwrap();
    assert!(tracker.delivered);
    assert_eq!(sink.fired_titles(), vec!["ProDad Reminder: Meds"]);

    // Re-running the policy (or the fallback sweep) does not fire again
    scheduler.evaluate().unwrap();
    scheduler.sweep().unwrap();
    assert_eq!(sink.fired_titles().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn far_future_and_long_overdue_are_left_alone() {
    let (store, sink, scheduler) = setup();
    let far = store.add_reminder(reminder_due_in("far", 25 * HOUR)).unwrap();
    let stale = store.add_reminder(reminder_due_in("stale", -2 * HOUR)).unwrap();

    scheduler.evaluate().unwrap();

    assert!(store.tracker_for_reminder(far).unwrap().is_none());
    assert!(store.tracker_for_reminder(stale).unwrap().is_none());
    assert!(sink.fired_titles().is_empty());
}

#[tokio::test(start_paused = true)]
async fn timer_fires_at_due_time() {
    let (store, sink, scheduler) = setup();
    let id = store.add_reminder(reminder_due_in("Meds", 5 * MINUTE)).unwrap();

    scheduler.evaluate().unwrap();
    assert!(sink.fired_titles().is_empty());

    tokio::time::sleep(Duration::from_secs(5 * 60 + 1)).await;
    wait_until(|| !sink.fired_titles().is_empty()).await;

    assert_eq!(sink.fired_titles(), vec!["ProDad Reminder: Meds"]);
    let tracker = store.tracker_for_reminder(id).unwrap().unwrap();
    assert!(tracker.delivered);
}

// ── Permission handling ──────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn permission_denial_suppresses_notifications_only() {
    let (store, sink, scheduler) = setup();
    sink.deny();

    let future = store.add_reminder(reminder_due_in("future", 30 * MINUTE)).unwrap();
    let due = store.add_reminder(reminder_due_in("due", -5 * MINUTE)).unwrap();

    scheduler.evaluate().unwrap();

    // Bookkeeping still happens for the scheduled window, no timer though
    let tracker = store.tracker_for_reminder(future).unwrap().unwrap();
    assert!(tracker.scheduled);
    // The due reminder is left undelivered so it can fire once permission
    // arrives while still inside the catch-up window
    assert!(store.tracker_for_reminder(due).unwrap().is_none());
    assert!(sink.fired_titles().is_empty());

    // CRUD kept working the whole time
    assert_eq!(store.all_reminders().unwrap().len(), 2);
}

// ── Completion & removal bookkeeping ─────────────────────────────

#[tokio::test(start_paused = true)]
async fn completing_suppresses_and_uncompleting_rearms() {
    let (store, sink, scheduler) = setup();
    let id = store.add_reminder(reminder_due_in("Meds", -5 * MINUTE)).unwrap();
    scheduler.evaluate().unwrap();
    assert_eq!(sink.fired_titles().len(), 1);

    // Completing twice in a row: completed stays true, nothing throws
    scheduler.mark_complete(id, true).unwrap();
    scheduler.mark_complete(id, true).unwrap();
    assert!(store.get_reminder(id).unwrap().unwrap().completed);
    assert!(store.tracker_for_reminder(id).unwrap().unwrap().delivered);

    // Un-completing resets delivery, so the next evaluation re-fires
    scheduler.mark_complete(id, false).unwrap();
    assert!(!store.get_reminder(id).unwrap().unwrap().completed);
    assert!(!store.tracker_for_reminder(id).unwrap().unwrap().delivered);

    scheduler.evaluate().unwrap();
    assert_eq!(sink.fired_titles().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn completing_cancels_pending_timer() {
    let (store, sink, scheduler) = setup();
    let id = store.add_reminder(reminder_due_in("Meds", 5 * MINUTE)).unwrap();
    scheduler.evaluate().unwrap();

    scheduler.mark_complete(id, true).unwrap();
    tokio::time::sleep(Duration::from_secs(10 * 60)).await;
    tokio::task::yield_now().await;

    assert!(sink.fired_titles().is_empty());
}

#[tokio::test(start_paused = true)]
async fn remove_cancels_timer_and_cascades() {
    let (store, sink, scheduler) = setup();
    let id = store.add_reminder(reminder_due_in("Meds", 5 * MINUTE)).unwrap();
    scheduler.evaluate().unwrap();
    assert!(store.tracker_for_reminder(id).unwrap().is_some());

    scheduler.remove(id).unwrap();
    assert!(store.get_reminder(id).unwrap().is_none());
    assert!(store.tracker_for_reminder(id).unwrap().is_none());

    tokio::time::sleep(Duration::from_secs(10 * 60)).await;
    tokio::task::yield_now().await;
    assert!(sink.fired_titles().is_empty());
}

#[tokio::test(start_paused = true)]
async fn reschedule_replaces_the_timer_window() {
    let (store, sink, scheduler) = setup();
    let id = store.add_reminder(reminder_due_in("Meds", 5 * MINUTE)).unwrap();
    scheduler.evaluate().unwrap();

    // Push the due date outside the horizon, then re-apply the policy
    store
        .update_reminder(id, &json!({ "date": now_ms() + 48 * HOUR }))
        .unwrap();
    scheduler.reschedule(id).unwrap();

    tokio::time::sleep(Duration::from_secs(10 * 60)).await;
    tokio::task::yield_now().await;
    assert!(sink.fired_titles().is_empty());
}

// ── Run loop ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn run_loop_reacts_to_store_changes_and_stops() {
    let store = ProDadStore::open_in_memory().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let (handle, scheduler) =
        create_scheduler(store.clone(), sink.clone(), SchedulerConfig::default());
    let running = tokio::spawn(scheduler.run());
    tokio::task::yield_now().await;

    // Creating a reminder triggers re-evaluation through the change bus
    let id = store.add_reminder(reminder_due_in("Meds", 5 * MINUTE)).unwrap();
    wait_until(|| store.tracker_for_reminder(id).unwrap().is_some()).await;

    tokio::time::sleep(Duration::from_secs(5 * 60 + 1)).await;
    wait_until(|| !sink.fired_titles().is_empty()).await;
    assert_eq!(sink.fired_titles(), vec!["ProDad Reminder: Meds"]);
    assert!(store.tracker_for_reminder(id).unwrap().unwrap().delivered);

    // Deleting cascades the tracker away
    store.delete_reminder(id).unwrap();
    assert!(store.tracker_for_reminder(id).unwrap().is_none());

    handle.stop().await.unwrap();
    running.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn deleting_through_the_store_cancels_a_running_timer() {
    let store = ProDadStore::open_in_memory().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let (handle, scheduler) =
        create_scheduler(store.clone(), sink.clone(), SchedulerConfig::default());
    let running = tokio::spawn(scheduler.run());
    tokio::task::yield_now().await;

    let id = store.add_reminder(reminder_due_in("Meds", 2 * MINUTE)).unwrap();
    wait_until(|| store.tracker_for_reminder(id).unwrap().is_some()).await;

    // The app only holds the store once the loop owns the scheduler, so
    // deletion arrives as a store mutation, not a scheduler call
    store.delete_reminder(id).unwrap();

    tokio::time::sleep(Duration::from_secs(3 * 60)).await;
    tokio::task::yield_now().await;
    assert!(sink.fired_titles().is_empty());
    // The fire path must not resurrect the cascaded tracker row
    assert!(store.tracker_for_reminder(id).unwrap().is_none());

    handle.stop().await.unwrap();
    running.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn completing_through_the_store_cancels_a_running_timer() {
    let store = ProDadStore::open_in_memory().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let (handle, scheduler) =
        create_scheduler(store.clone(), sink.clone(), SchedulerConfig::default());
    let running = tokio::spawn(scheduler.run());
    tokio::task::yield_now().await;

    let id = store.add_reminder(reminder_due_in("Meds", 2 * MINUTE)).unwrap();
    wait_until(|| store.tracker_for_reminder(id).unwrap().is_some()).await;

    store.complete_reminder(id, true).unwrap();

    tokio::time::sleep(Duration::from_secs(3 * 60)).await;
    tokio::task::yield_now().await;
    assert!(sink.fired_titles().is_empty());

    handle.stop().await.unwrap();
    running.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn handle_commands_toggle_and_remove_while_running() {
    let store = ProDadStore::open_in_memory().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let (handle, scheduler) =
        create_scheduler(store.clone(), sink.clone(), SchedulerConfig::default());
    let running = tokio::spawn(scheduler.run());
    tokio::task::yield_now().await;

    let completed = store.add_reminder(reminder_due_in("quiet", 2 * MINUTE)).unwrap();
    let removed = store.add_reminder(reminder_due_in("gone", 2 * MINUTE)).unwrap();
    wait_until(|| store.tracker_for_reminder(removed).unwrap().is_some()).await;

    handle.mark_complete(completed, true).await.unwrap();
    handle.remove(removed).await.unwrap();
    wait_until(|| store.get_reminder(removed).unwrap().is_none()).await;

    assert!(store.get_reminder(completed).unwrap().unwrap().completed);
    assert!(store.tracker_for_reminder(removed).unwrap().is_none());

    tokio::time::sleep(Duration::from_secs(3 * 60)).await;
    tokio::task::yield_now().await;
    assert!(sink.fired_titles().is_empty());

    handle.stop().await.unwrap();
    running.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn fallback_sweep_catches_missed_reminders() {
    let store = ProDadStore::open_in_memory().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let (handle, scheduler) =
        create_scheduler(store.clone(), sink.clone(), SchedulerConfig::default());

    // Already due, but permission is missing when the scheduler first
    // sees it, so the initial evaluation cannot deliver
    sink.deny();
    let id = store.add_reminder(reminder_due_in("Meds", -5 * MINUTE)).unwrap();
    let running = tokio::spawn(scheduler.run());
    tokio::task::yield_now().await;
    assert!(sink.fired_titles().is_empty());

    // Permission arrives later. The next fallback sweep catches up.
    sink.denied.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(61)).await;
    wait_until(|| !sink.fired_titles().is_empty()).await;

    assert!(store.tracker_for_reminder(id).unwrap().unwrap().delivered);
    handle.stop().await.unwrap();
    running.await.unwrap();
}
