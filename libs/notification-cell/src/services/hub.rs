use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{with_retry, RetryPolicy, StoreError};
use shared_utils::{AppState, Clock};

use crate::models::{FeedError, FeedFilter, FeedItem, FeedItemType, FeedResponse, MarkReadOutcome, UnreadCounts};
use crate::services::sources::{FeedSource, MessageSource, NotificationSource, ReminderSource, TaskSource};

/// Merges every feed source into one time-ordered view.
pub struct NotificationHub {
    sources: Vec<Arc<dyn FeedSource>>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

struct Collected {
    items: Vec<FeedItem>,
    degraded: Vec<FeedItemType>,
}

impl NotificationHub {
    pub fn new(state: &AppState) -> Self {
        let sources: Vec<Arc<dyn FeedSource>> = vec![
            Arc::new(NotificationSource::new(state.stores.inbox.clone())),
            Arc::new(MessageSource::new(state.stores.inbox.clone())),
            Arc::new(TaskSource::new(state.stores.tasks.clone())),
            Arc::new(ReminderSource::new(state.stores.reminders.clone())),
        ];
        Self::with_sources(state, sources)
    }

    pub fn with_sources(state: &AppState, sources: Vec<Arc<dyn FeedSource>>) -> Self {
        Self {
            sources,
            clock: state.clock.clone(),
            retry: state.retry_policy(),
        }
    }

    pub async fn list_items(&self, clinic_id: Uuid, filter: &FeedFilter) -> Result<FeedResponse, FeedError> {
        let Collected { items, degraded } = self.collect(clinic_id, filter).await?;

        let mut items: Vec<FeedItem> = items.into_iter().filter(|item| filter.admits(item)).collect();
        // sort_by is stable: equal timestamps keep source order
        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = filter.limit {
            items.truncate(limit);
        }

        debug!(
            "Feed for clinic {} has {} items ({} degraded sources)",
            clinic_id,
            items.len(),
            degraded.len()
        );

        Ok(FeedResponse {
            items,
            degraded_sources: degraded,
        })
    }

    pub async fn unread_counts(&self, clinic_id: Uuid, filter: &FeedFilter) -> Result<UnreadCounts, FeedError> {
        let Collected { items, degraded } = self.collect(clinic_id, filter).await?;

        let unread = FeedFilter {
            unread_only: true,
            limit: None,
            ..filter.clone()
        };

        let mut counts = UnreadCounts {
            degraded_sources: degraded,
            ..Default::default()
        };
        for item in items.iter().filter(|item| unread.admits(item)) {
            match item.item_type {
                FeedItemType::Notification => counts.notification += 1,
                FeedItemType::Message => counts.message += 1,
                FeedItemType::Task => counts.task += 1,
                FeedItemType::Reminder => counts.reminder += 1,
            }
            counts.total += 1;
        }

        Ok(counts)
    }

    pub async fn mark_as_read(&self, item_type: FeedItemType, id: Uuid) -> Result<MarkReadOutcome, FeedError> {
        let source = self
            .sources
            .iter()
            .find(|source| source.item_type() == item_type)
            .ok_or_else(|| FeedError::Validation(format!("No {} source is configured", item_type)))?;
        let source: &dyn FeedSource = source.as_ref();

        let outcome = with_retry(self.retry, "mark feed item read", move || source.mark_read(id))
            .await
            .map_err(|e| FeedError::from_store(item_type, id, e))?;

        match outcome {
            MarkReadOutcome::Marked => info!("Marked {} {} as read", item_type, id),
            MarkReadOutcome::RequiresAction => {
                debug!("{} {} stays unread until it is actioned", item_type, id)
            }
        }

        Ok(outcome)
    }

    /// Fetches every selected source concurrently. Failing sources are
    /// reported as degraded; the call only fails when none could be read.
    async fn collect(&self, clinic_id: Uuid, filter: &FeedFilter) -> Result<Collected, FeedError> {
        let now = self.clock.now();
        let staff_id = filter.staff_id.as_deref();
        let retry = self.retry;

        let selected: Vec<&dyn FeedSource> = self
            .sources
            .iter()
            .map(|source| source.as_ref())
            .filter(|source| filter.includes(source.item_type()))
            .collect();

        let results = join_all(selected.iter().map(|&source| async move {
            let result = with_retry(retry, "fetch feed source", move || source.fetch(clinic_id, staff_id, now)).await;
            (source.item_type(), result)
        }))
        .await;

        let mut items = Vec::new();
        let mut degraded = Vec::new();
        let mut last_error: Option<StoreError> = None;
        for (item_type, result) in results {
            match result {
                Ok(mut fetched) => items.append(&mut fetched),
                Err(err) => {
                    warn!("Feed source {} failed for clinic {}: {}", item_type, clinic_id, err);
                    degraded.push(item_type);
                    last_error = Some(err);
                }
            }
        }

        if !selected.is_empty() && degraded.len() == selected.len() {
            if let Some(err) = last_error {
                return Err(FeedError::StoreUnavailable(err.to_string()));
            }
        }

        Ok(Collected { items, degraded })
    }
}
