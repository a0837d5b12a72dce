use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use notification_cell::services::{MessageSource, NotificationSource, ReminderSource, TaskSource};
use notification_cell::{FeedError, FeedFilter, FeedItem, FeedItemType, FeedSource, MarkReadOutcome, NotificationHub};
use shared_database::{StoreError, StoreResult};
use shared_models::inbox::{InboxMessage, InboxNotification};
use shared_models::staff::{Priority, ReminderStatus, StaffReminder, StaffTask, TaskStatus};
use shared_utils::test_utils::{default_now, test_state};
use shared_utils::AppState;

fn notification(clinic_id: Uuid, to: &str, priority: Priority, at: DateTime<Utc>) -> InboxNotification {
    InboxNotification {
        id: Uuid::new_v4(),
        clinic_id,
        recipient_staff_id: to.to_string(),
        title: "Lab results received".to_string(),
        body: None,
        priority,
        read: false,
        created_at: at,
    }
}

fn message(clinic_id: Uuid, to: &str, at: DateTime<Utc>) -> InboxMessage {
    InboxMessage {
        id: Uuid::new_v4(),
        clinic_id,
        from_staff_id: "dr_walsh".to_string(),
        to_staff_id: to.to_string(),
        subject: "Running late".to_string(),
        body: None,
        read: false,
        sent_at: at,
    }
}

fn task(clinic_id: Uuid, to: &str, status: TaskStatus, at: DateTime<Utc>) -> StaffTask {
    StaffTask {
        id: Uuid::new_v4(),
        clinic_id,
        from_staff_id: "dr_walsh".to_string(),
        to_staff_id: to.to_string(),
        title: "Prepare surgery 2".to_string(),
        description: None,
        priority: Priority::High,
        status,
        task_type: "general".to_string(),
        related_entity_id: None,
        related_entity_type: None,
        due_date: None,
        created_at: at,
        updated_at: at,
        completed_at: None,
    }
}

fn reminder(clinic_id: Uuid, to: &str, at: DateTime<Utc>) -> StaffReminder {
    StaffReminder {
        id: Uuid::new_v4(),
        clinic_id,
        from_staff_id: "dr_walsh".to_string(),
        to_staff_id: to.to_string(),
        title: "Patient recall list".to_string(),
        message: None,
        reminder_time: at,
        reminder_type: "general".to_string(),
        status: ReminderStatus::Pending,
        snoozed_until: None,
        created_at: default_now() - Duration::days(1),
        updated_at: default_now() - Duration::days(1),
    }
}

struct Seeded {
    notification: Uuid,
    message: Uuid,
    task: Uuid,
    reminder: Uuid,
}

/// One item per source for `nurse_kelly`, at distinct times, plus noise for `front_desk`.
async fn seed(state: &AppState, clinic_id: Uuid) -> Seeded {
    let now = default_now();
    let stores = &state.stores;

    let n = stores
        .inbox
        .insert_notification(notification(clinic_id, "nurse_kelly", Priority::Low, now - Duration::hours(3)))
        .await
        .unwrap();
    let m = stores
        .inbox
        .insert_message(message(clinic_id, "nurse_kelly", now - Duration::hours(1)))
        .await
        .unwrap();
    let t = stores
        .tasks
        .upsert_task(task(clinic_id, "nurse_kelly", TaskStatus::Pending, now - Duration::hours(2)))
        .await
        .unwrap();
    let r = stores
        .reminders
        .upsert_reminder(reminder(clinic_id, "nurse_kelly", now + Duration::minutes(30)))
        .await
        .unwrap();

    stores
        .inbox
        .insert_message(message(clinic_id, "front_desk", now))
        .await
        .unwrap();

    Seeded {
        notification: n.id,
        message: m.id,
        task: t.id,
        reminder: r.id,
    }
}

fn for_staff(staff_id: &str) -> FeedFilter {
    FeedFilter {
        staff_id: Some(staff_id.to_string()),
        ..Default::default()
    }
}

fn ids(items: &[FeedItem]) -> Vec<Uuid> {
    items.iter().map(|item| item.id).collect()
}

#[tokio::test]
async fn test_feed_merges_every_source_newest_first() {
    let (state, _clock) = test_state();
    let clinic_id = Uuid::new_v4();
    let seeded = seed(&state, clinic_id).await;

    let feed = NotificationHub::new(&state)
        .list_items(clinic_id, &for_staff("nurse_kelly"))
        .await
        .unwrap();

    assert!(feed.degraded_sources.is_empty());
    assert_eq!(
        ids(&feed.items),
        vec![seeded.reminder, seeded.message, seeded.task, seeded.notification]
    );
    assert!(feed.items.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
}

#[tokio::test]
async fn test_equal_timestamps_keep_source_order() {
    let (state, _clock) = test_state();
    let clinic_id = Uuid::new_v4();
    let at = default_now() - Duration::minutes(10);

    let m = state
        .stores
        .inbox
        .insert_message(message(clinic_id, "nurse_kelly", at))
        .await
        .unwrap();
    let n = state
        .stores
        .inbox
        .insert_notification(notification(clinic_id, "nurse_kelly", Priority::Medium, at))
        .await
        .unwrap();

    let feed = NotificationHub::new(&state)
        .list_items(clinic_id, &FeedFilter::default())
        .await
        .unwrap();

    assert_eq!(ids(&feed.items), vec![n.id, m.id]);
}

#[tokio::test]
async fn test_feed_filters() {
    let (state, _clock) = test_state();
    let clinic_id = Uuid::new_v4();
    let seeded = seed(&state, clinic_id).await;
    let hub = NotificationHub::new(&state);

    let everyone = hub.list_items(clinic_id, &FeedFilter::default()).await.unwrap();
    assert_eq!(everyone.items.len(), 5);

    let types = FeedFilter {
        types: Some(vec![FeedItemType::Task, FeedItemType::Reminder]),
        ..for_staff("nurse_kelly")
    };
    let feed = hub.list_items(clinic_id, &types).await.unwrap();
    assert_eq!(ids(&feed.items), vec![seeded.reminder, seeded.task]);

    let important = FeedFilter {
        min_priority: Some(Priority::Medium),
        ..for_staff("nurse_kelly")
    };
    let feed = hub.list_items(clinic_id, &important).await.unwrap();
    assert!(!ids(&feed.items).contains(&seeded.notification));
    assert_eq!(feed.items.len(), 3);

    let limited = FeedFilter {
        limit: Some(2),
        ..for_staff("nurse_kelly")
    };
    let feed = hub.list_items(clinic_id, &limited).await.unwrap();
    assert_eq!(ids(&feed.items), vec![seeded.reminder, seeded.message]);

    let other_clinic = hub.list_items(Uuid::new_v4(), &FeedFilter::default()).await.unwrap();
    assert!(other_clinic.items.is_empty());
}

#[tokio::test]
async fn test_unread_only_hides_handled_items() {
    let (state, _clock) = test_state();
    let clinic_id = Uuid::new_v4();
    let seeded = seed(&state, clinic_id).await;
    let accepted = state
        .stores
        .tasks
        .upsert_task(task(clinic_id, "nurse_kelly", TaskStatus::Accepted, default_now()))
        .await
        .unwrap();
    let hub = NotificationHub::new(&state);

    hub.mark_as_read(FeedItemType::Message, seeded.message).await.unwrap();

    let filter = FeedFilter {
        unread_only: true,
        ..for_staff("nurse_kelly")
    };
    let feed = hub.list_items(clinic_id, &filter).await.unwrap();

    let unread = ids(&feed.items);
    assert!(!unread.contains(&seeded.message));
    assert!(!unread.contains(&accepted.id));
    assert_eq!(unread, vec![seeded.reminder, seeded.task, seeded.notification]);
}

#[tokio::test]
async fn test_mark_as_read_outcomes() {
    let (state, _clock) = test_state();
    let clinic_id = Uuid::new_v4();
    let seeded = seed(&state, clinic_id).await;
    let hub = NotificationHub::new(&state);

    let outcome = hub.mark_as_read(FeedItemType::Notification, seeded.notification).await.unwrap();
    assert_eq!(outcome, MarkReadOutcome::Marked);

    let outcome = hub.mark_as_read(FeedItemType::Task, seeded.task).await.unwrap();
    assert_eq!(outcome, MarkReadOutcome::RequiresAction);

    let outcome = hub.mark_as_read(FeedItemType::Reminder, seeded.reminder).await.unwrap();
    assert_eq!(outcome, MarkReadOutcome::RequiresAction);

    let feed = hub.list_items(clinic_id, &for_staff("nurse_kelly")).await.unwrap();
    let read = |id: Uuid| feed.items.iter().find(|item| item.id == id).map(|item| item.read);
    assert_eq!(read(seeded.notification), Some(true));
    assert_eq!(read(seeded.task), Some(false));
    assert_eq!(read(seeded.reminder), Some(false));

    let missing = Uuid::new_v4();
    let err = hub.mark_as_read(FeedItemType::Task, missing).await.unwrap_err();
    assert_matches!(err, FeedError::NotFound { item_type: FeedItemType::Task, id } if id == missing);
}

#[tokio::test]
async fn test_unread_counts_per_type() {
    let (state, _clock) = test_state();
    let clinic_id = Uuid::new_v4();
    let seeded = seed(&state, clinic_id).await;
    let hub = NotificationHub::new(&state);

    hub.mark_as_read(FeedItemType::Notification, seeded.notification).await.unwrap();

    let counts = hub.unread_counts(clinic_id, &for_staff("nurse_kelly")).await.unwrap();

    assert_eq!(counts.notification, 0);
    assert_eq!(counts.message, 1);
    assert_eq!(counts.task, 1);
    assert_eq!(counts.reminder, 1);
    assert_eq!(counts.total, 3);

    let everyone = hub.unread_counts(clinic_id, &FeedFilter::default()).await.unwrap();
    assert_eq!(everyone.message, 2);
    assert_eq!(everyone.total, 4);
}

// ==============================================================================
// DEGRADED SOURCES
// ==============================================================================

/// Fails every fetch for the first `failures` calls.
struct FlakySource {
    item_type: FeedItemType,
    failures: u32,
    calls: AtomicU32,
}

impl FlakySource {
    fn new(item_type: FeedItemType, failures: u32) -> Self {
        Self {
            item_type,
            failures,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl FeedSource for FlakySource {
    fn item_type(&self) -> FeedItemType {
        self.item_type
    }

    async fn fetch(&self, _clinic_id: Uuid, _staff_id: Option<&str>, now: DateTime<Utc>) -> StoreResult<Vec<FeedItem>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        Ok(vec![FeedItem {
            id: Uuid::new_v4(),
            item_type: self.item_type,
            title: "Recovered".to_string(),
            body: None,
            timestamp: now,
            read: false,
            priority: Priority::Medium,
            from_staff_id: None,
            status: None,
        }])
    }

    async fn mark_read(&self, _id: Uuid) -> StoreResult<MarkReadOutcome> {
        Err(StoreError::Unavailable("connection reset".to_string()))
    }
}

#[tokio::test]
async fn test_failing_source_degrades_feed_without_failing_it() {
    let (state, _clock) = test_state();
    let clinic_id = Uuid::new_v4();
    let seeded = seed(&state, clinic_id).await;

    let hub = NotificationHub::with_sources(
        &state,
        vec![
            Arc::new(NotificationSource::new(state.stores.inbox.clone())),
            Arc::new(FlakySource::new(FeedItemType::Message, u32::MAX)),
            Arc::new(TaskSource::new(state.stores.tasks.clone())),
            Arc::new(ReminderSource::new(state.stores.reminders.clone())),
        ],
    );

    let feed = hub.list_items(clinic_id, &for_staff("nurse_kelly")).await.unwrap();

    assert_eq!(feed.degraded_sources, vec![FeedItemType::Message]);
    assert_eq!(ids(&feed.items), vec![seeded.reminder, seeded.task, seeded.notification]);

    let counts = hub.unread_counts(clinic_id, &for_staff("nurse_kelly")).await.unwrap();
    assert_eq!(counts.degraded_sources, vec![FeedItemType::Message]);
    assert_eq!(counts.total, 3);

    let err = hub.mark_as_read(FeedItemType::Message, seeded.message).await.unwrap_err();
    assert_matches!(err, FeedError::StoreUnavailable(_));
}

#[tokio::test]
async fn test_transient_source_failure_is_retried() {
    let (state, _clock) = test_state();
    let clinic_id = Uuid::new_v4();

    let hub = NotificationHub::with_sources(&state, vec![Arc::new(FlakySource::new(FeedItemType::Notification, 1))]);

    let feed = hub.list_items(clinic_id, &FeedFilter::default()).await.unwrap();

    assert!(feed.degraded_sources.is_empty());
    assert_eq!(feed.items.len(), 1);
}

#[tokio::test]
async fn test_feed_fails_only_when_every_source_fails() {
    let (state, _clock) = test_state();
    let clinic_id = Uuid::new_v4();

    let hub = NotificationHub::with_sources(
        &state,
        vec![
            Arc::new(FlakySource::new(FeedItemType::Notification, u32::MAX)),
            Arc::new(FlakySource::new(FeedItemType::Message, u32::MAX)),
            Arc::new(MessageSource::new(state.stores.inbox.clone())),
        ],
    );

    let only_failing = FeedFilter {
        types: Some(vec![FeedItemType::Notification]),
        ..Default::default()
    };
    let err = hub.list_items(clinic_id, &only_failing).await.unwrap_err();
    assert_matches!(err, FeedError::StoreUnavailable(_));

    let feed = hub.list_items(clinic_id, &FeedFilter::default()).await.unwrap();
    assert_eq!(
        feed.degraded_sources,
        vec![FeedItemType::Notification, FeedItemType::Message]
    );
}
