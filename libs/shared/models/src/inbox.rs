use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::staff::Priority;

/// System notification addressed to one staff member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxNotification {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub recipient_staff_id: String,
    pub title: String,
    pub body: Option<String>,
    pub priority: Priority,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Staff-to-staff direct message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxMessage {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub from_staff_id: String,
    pub to_staff_id: String,
    pub subject: String,
    pub body: Option<String>,
    pub read: bool,
    pub sent_at: DateTime<Utc>,
}
