use std::sync::Arc;

use chrono::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use shared_models::events::DomainEvent;
use shared_models::staff::{Priority, StaffTask, TaskFilter};
use shared_utils::{AppState, Clock, EventReceiver};

use crate::models::{CreateTaskRequest, TaskError};
use crate::services::tasks::TaskService;

pub const FOLLOW_UP_TASK_TYPE: &str = "booking_approval";
pub const FOLLOW_UP_TITLE: &str = "New booking pending approval";
const SYSTEM_SENDER: &str = "system";

/// Turns new bookings into approval tasks for the front desk.
pub struct BookingFollowUp {
    tasks: TaskService,
    clock: Arc<dyn Clock>,
    assignee: String,
    due_after: Duration,
}

impl BookingFollowUp {
    pub fn new(state: &AppState) -> Self {
        Self {
            tasks: TaskService::new(state),
            clock: state.clock.clone(),
            assignee: state.config.follow_up_assignee.clone(),
            due_after: Duration::hours(state.config.follow_up_due_hours),
        }
    }

    /// Creates the follow-up task for a `BookingCreated` event. Other events,
    /// and bookings that already have one, are ignored.
    pub async fn handle(&self, event: &DomainEvent) -> Result<Option<StaffTask>, TaskError> {
        let DomainEvent::BookingCreated {
            appointment_id,
            clinic_id,
            date,
            time,
            ..
        } = event
        else {
            return Ok(None);
        };

        let filter = TaskFilter {
            task_type: Some(FOLLOW_UP_TASK_TYPE.to_string()),
            ..Default::default()
        };
        let existing = self.tasks.list_tasks(*clinic_id, &filter).await?;
        if existing.iter().any(|t| t.related_entity_id == Some(*appointment_id)) {
            return Ok(None);
        }

        let request = CreateTaskRequest {
            from_staff_id: SYSTEM_SENDER.to_string(),
            to_staff_id: self.assignee.clone(),
            title: FOLLOW_UP_TITLE.to_string(),
            description: Some(format!(
                "Appointment on {} at {} is waiting for confirmation",
                date,
                time.format("%H:%M")
            )),
            priority: Priority::Medium,
            task_type: Some(FOLLOW_UP_TASK_TYPE.to_string()),
            related_entity_id: Some(*appointment_id),
            related_entity_type: Some("appointment".to_string()),
            due_date: Some(self.clock.now() + self.due_after),
        };

        self.tasks.create_task(*clinic_id, request).await.map(Some)
    }

    pub async fn run(self, mut events: EventReceiver) {
        loop {
            match events.recv().await {
                Ok(event) => match self.handle(&event).await {
                    Ok(Some(task)) => info!("Follow-up task {} created for {}", task.id, event.name()),
                    Ok(None) => {}
                    Err(e) => error!("Failed to create follow-up for {}: {}", event.name(), e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Booking follow-up lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => {
                    info!("Event bus closed, booking follow-up stopping");
                    break;
                }
            }
        }
    }
}

/// Subscribes before spawning so no event published after this returns is missed.
pub fn spawn_booking_follow_up(state: &AppState) -> JoinHandle<()> {
    let events = state.events.subscribe();
    let follow_up = BookingFollowUp::new(state);
    tokio::spawn(follow_up.run(events))
}
