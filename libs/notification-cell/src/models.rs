use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::staff::Priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedItemType {
    Notification,
    Message,
    Task,
    Reminder,
}

impl FeedItemType {
    pub const ALL: [FeedItemType; 4] = [
        FeedItemType::Notification,
        FeedItemType::Message,
        FeedItemType::Task,
        FeedItemType::Reminder,
    ];
}

impl fmt::Display for FeedItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedItemType::Notification => write!(f, "notification"),
            FeedItemType::Message => write!(f, "message"),
            FeedItemType::Task => write!(f, "task"),
            FeedItemType::Reminder => write!(f, "reminder"),
        }
    }
}

impl FromStr for FeedItemType {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "notification" => Ok(FeedItemType::Notification),
            "message" => Ok(FeedItemType::Message),
            "task" => Ok(FeedItemType::Task),
            "reminder" => Ok(FeedItemType::Reminder),
            other => Err(FeedError::Validation(format!("Unknown feed item type '{}'", other))),
        }
    }
}

/// One entry of the unified staff feed, whatever its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: Uuid,
    pub item_type: FeedItemType,
    pub title: String,
    pub body: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    pub priority: Priority,
    pub from_staff_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedFilter {
    pub staff_id: Option<String>,
    /// `None` selects every source.
    pub types: Option<Vec<FeedItemType>>,
    pub unread_only: bool,
    pub min_priority: Option<Priority>,
    pub limit: Option<usize>,
}

impl FeedFilter {
    pub fn includes(&self, item_type: FeedItemType) -> bool {
        self.types.as_ref().map_or(true, |types| types.contains(&item_type))
    }

    pub fn admits(&self, item: &FeedItem) -> bool {
        (!self.unread_only || !item.read) && self.min_priority.map_or(true, |min| item.priority >= min)
    }
}

/// Query string form of [`FeedFilter`]; `types` is comma separated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedQuery {
    pub staff_id: Option<String>,
    pub types: Option<String>,
    #[serde(default)]
    pub unread_only: bool,
    pub min_priority: Option<Priority>,
    pub limit: Option<usize>,
}

impl TryFrom<FeedQuery> for FeedFilter {
    type Error = FeedError;

    fn try_from(query: FeedQuery) -> Result<Self, Self::Error> {
        let types = match query.types.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(
                raw.split(',')
                    .map(FeedItemType::from_str)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            _ => None,
        };

        Ok(FeedFilter {
            staff_id: query.staff_id,
            types,
            unread_only: query.unread_only,
            min_priority: query.min_priority,
            limit: query.limit,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedResponse {
    pub items: Vec<FeedItem>,
    /// Sources that could not be read; their items are missing from `items`.
    pub degraded_sources: Vec<FeedItemType>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCounts {
    pub notification: usize,
    pub message: usize,
    pub task: usize,
    pub reminder: usize,
    pub total: usize,
    pub degraded_sources: Vec<FeedItemType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkReadOutcome {
    Marked,
    /// Tasks and reminders leave the unread set only once acted on.
    RequiresAction,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("{item_type} {id} not found")]
    NotFound { item_type: FeedItemType, id: Uuid },

    #[error("{0}")]
    Validation(String),

    #[error("No feed source could be read: {0}")]
    StoreUnavailable(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl FeedError {
    pub(crate) fn from_store(item_type: FeedItemType, id: Uuid, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => FeedError::NotFound { item_type, id },
            StoreError::Unavailable(msg) => FeedError::StoreUnavailable(msg),
            other => FeedError::Store(other.to_string()),
        }
    }
}

impl From<FeedError> for AppError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::NotFound { .. } => AppError::NotFound(err.to_string()),
            FeedError::Validation(msg) => AppError::BadRequest(msg),
            FeedError::StoreUnavailable(_) => AppError::StoreUnavailable(err.to_string()),
            FeedError::Store(msg) => AppError::Internal(msg),
        }
    }
}
