use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::appointment::{Appointment, Patient, PatientInfo};
use shared_models::inbox::{InboxMessage, InboxNotification};
use shared_models::schedule::ClinicScheduleConfig;
use shared_models::staff::{ReminderFilter, StaffReminder, StaffTask, TaskFilter};

use crate::error::{StoreError, StoreResult};
use crate::store::{
    AppointmentStore, InboxStore, PatientStore, ReminderStore, ScheduleStore, TaskStore,
};

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_token: Option<String>,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            service_token: Some(config.supabase_service_token.clone()).filter(|t| !t.is_empty()),
        }
    }

    fn get_headers(&self, extra: Option<HeaderMap>) -> StoreResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key)
                .map_err(|e| StoreError::Rejected(format!("Invalid API key header: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let bearer = self.service_token.as_deref().unwrap_or(&self.anon_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", bearer))
                .map_err(|e| StoreError::Rejected(format!("Invalid authorization header: {}", e)))?,
        );

        if let Some(extra) = extra {
            headers.extend(extra);
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> StoreResult<T>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> StoreResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.get_headers(extra_headers)?);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::NOT_FOUND => StoreError::NotFound(error_text),
                StatusCode::CONFLICT => StoreError::Conflict(error_text),
                StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
                    StoreError::Unavailable(format!("{}: {}", status, error_text))
                }
                s if s.is_server_error() => StoreError::Unavailable(format!("{}: {}", s, error_text)),
                s => StoreError::Rejected(format!("{}: {}", s, error_text)),
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

fn representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

fn upsert_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Prefer",
        HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
    );
    headers
}

fn first_row<T: DeserializeOwned>(rows: Vec<Value>, what: impl Into<String>) -> StoreResult<T> {
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::NotFound(what.into()))?;
    Ok(serde_json::from_value(row)?)
}

fn all_rows<T: DeserializeOwned>(rows: Vec<Value>) -> StoreResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(StoreError::from))
        .collect()
}

fn eq(value: &str) -> String {
    format!("eq.{}", urlencoding::encode(value))
}

/// PostgREST-backed store. Slot exclusivity relies on the partial unique
/// index `appointments_active_slot_key` (see `supabase/migrations`).
pub struct SupabaseStore {
    supabase: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn upsert_row<T: DeserializeOwned>(&self, table: &str, body: Value, what: String) -> StoreResult<T> {
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                &format!("/rest/v1/{}", table),
                Some(body),
                Some(upsert_representation()),
            )
            .await?;
        first_row(rows, what)
    }

    async fn delete_row(&self, table: &str, id: Uuid, what: String) -> StoreResult<()> {
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &format!("/rest/v1/{}?id=eq.{}", table, id),
                None,
                Some(representation()),
            )
            .await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(what));
        }
        Ok(())
    }

    async fn patch_row<T: DeserializeOwned>(&self, table: &str, id: Uuid, body: Value, what: String) -> StoreResult<T> {
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &format!("/rest/v1/{}?id=eq.{}", table, id),
                Some(body),
                Some(representation()),
            )
            .await?;
        first_row(rows, what)
    }
}

#[async_trait]
impl ScheduleStore for SupabaseStore {
    async fn get_clinic_schedule(&self, clinic_id: Uuid) -> StoreResult<ClinicScheduleConfig> {
        let path = format!("/rest/v1/clinic_schedules?clinic_id=eq.{}", clinic_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        first_row(rows, format!("Clinic {}", clinic_id))
    }

    async fn upsert_clinic_schedule(
        &self,
        schedule: ClinicScheduleConfig,
    ) -> StoreResult<ClinicScheduleConfig> {
        let what = format!("Clinic {}", schedule.clinic_id);
        self.upsert_row("clinic_schedules", serde_json::to_value(&schedule)?, what).await
    }
}

#[async_trait]
impl AppointmentStore for SupabaseStore {
    async fn list_appointments(&self, clinic_id: Uuid, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        let path = format!(
            "/rest/v1/appointments?clinic_id=eq.{}&date=eq.{}&status=neq.cancelled&order=time.asc",
            clinic_id,
            date.format("%Y-%m-%d")
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        all_rows(rows)
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> StoreResult<Appointment> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        first_row(rows, format!("Appointment {}", appointment_id))
    }

    async fn insert_appointment_if_slot_free(&self, appointment: Appointment) -> StoreResult<Appointment> {
        // A plain insert: the unique index turns a taken slot into HTTP 409.
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(serde_json::to_value(&appointment)?),
                Some(representation()),
            )
            .await?;
        first_row(rows, format!("Appointment {}", appointment.id))
    }

    async fn update_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        let what = format!("Appointment {}", appointment.id);
        self.patch_row("appointments", appointment.id, serde_json::to_value(&appointment)?, what)
            .await
    }
}

#[async_trait]
impl PatientStore for SupabaseStore {
    async fn find_or_create_patient(&self, clinic_id: Uuid, info: &PatientInfo) -> StoreResult<Patient> {
        let lookups = [
            info.phone.as_deref().map(|phone| ("phone", phone)),
            info.email.as_deref().map(|email| ("email", email)),
        ];

        for (column, value) in lookups.into_iter().flatten() {
            if value.trim().is_empty() {
                continue;
            }
            let path = format!(
                "/rest/v1/patients?clinic_id=eq.{}&{}={}&limit=1",
                clinic_id,
                column,
                eq(value.trim())
            );
            let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
            if !rows.is_empty() {
                return first_row(rows, "Patient");
            }
        }

        let patient = json!({
            "id": Uuid::new_v4(),
            "clinic_id": clinic_id,
            "name": info.name.trim(),
            "phone": info.phone,
            "email": info.email,
            "created_at": Utc::now().to_rfc3339()
        });

        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::POST, "/rest/v1/patients", Some(patient), Some(representation()))
            .await?;
        first_row(rows, "Patient")
    }
}

#[async_trait]
impl TaskStore for SupabaseStore {
    async fn list_tasks(&self, clinic_id: Uuid, filter: &TaskFilter) -> StoreResult<Vec<StaffTask>> {
        let mut path = format!("/rest/v1/staff_tasks?clinic_id=eq.{}", clinic_id);
        if let Some(to) = &filter.to_staff_id {
            path.push_str(&format!("&to_staff_id={}", eq(to)));
        }
        if let Some(from) = &filter.from_staff_id {
            path.push_str(&format!("&from_staff_id={}", eq(from)));
        }
        if let Some(status) = filter.status {
            path.push_str(&format!("&status=eq.{}", status));
        }
        if let Some(task_type) = &filter.task_type {
            path.push_str(&format!("&task_type={}", eq(task_type)));
        }
        if let Some(priority) = filter.priority {
            path.push_str(&format!("&priority=eq.{}", priority));
        }
        path.push_str("&order=created_at.asc");

        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        all_rows(rows)
    }

    async fn get_task(&self, task_id: Uuid) -> StoreResult<StaffTask> {
        let path = format!("/rest/v1/staff_tasks?id=eq.{}", task_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        first_row(rows, format!("Task {}", task_id))
    }

    async fn upsert_task(&self, task: StaffTask) -> StoreResult<StaffTask> {
        let what = format!("Task {}", task.id);
        self.upsert_row("staff_tasks", serde_json::to_value(&task)?, what).await
    }

    async fn delete_task(&self, task_id: Uuid) -> StoreResult<()> {
        self.delete_row("staff_tasks", task_id, format!("Task {}", task_id)).await
    }
}

#[async_trait]
impl ReminderStore for SupabaseStore {
    async fn list_reminders(&self, clinic_id: Uuid, filter: &ReminderFilter) -> StoreResult<Vec<StaffReminder>> {
        let mut path = format!("/rest/v1/staff_reminders?clinic_id=eq.{}", clinic_id);
        if let Some(to) = &filter.to_staff_id {
            path.push_str(&format!("&to_staff_id={}", eq(to)));
        }
        if let Some(from) = &filter.from_staff_id {
            path.push_str(&format!("&from_staff_id={}", eq(from)));
        }
        if let Some(reminder_type) = &filter.reminder_type {
            path.push_str(&format!("&reminder_type={}", eq(reminder_type)));
        }
        path.push_str("&order=reminder_time.asc");

        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        all_rows(rows)
    }

    async fn get_reminder(&self, reminder_id: Uuid) -> StoreResult<StaffReminder> {
        let path = format!("/rest/v1/staff_reminders?id=eq.{}", reminder_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        first_row(rows, format!("Reminder {}", reminder_id))
    }

    async fn upsert_reminder(&self, reminder: StaffReminder) -> StoreResult<StaffReminder> {
        let what = format!("Reminder {}", reminder.id);
        self.upsert_row("staff_reminders", serde_json::to_value(&reminder)?, what).await
    }

    async fn delete_reminder(&self, reminder_id: Uuid) -> StoreResult<()> {
        self.delete_row("staff_reminders", reminder_id, format!("Reminder {}", reminder_id))
            .await
    }
}

#[async_trait]
impl InboxStore for SupabaseStore {
    async fn list_notifications(
        &self,
        clinic_id: Uuid,
        recipient_staff_id: Option<&str>,
    ) -> StoreResult<Vec<InboxNotification>> {
        let mut path = format!("/rest/v1/notifications?clinic_id=eq.{}", clinic_id);
        if let Some(recipient) = recipient_staff_id {
            path.push_str(&format!("&recipient_staff_id={}", eq(recipient)));
        }
        path.push_str("&order=created_at.asc");

        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        all_rows(rows)
    }

    async fn insert_notification(&self, notification: InboxNotification) -> StoreResult<InboxNotification> {
        let what = format!("Notification {}", notification.id);
        self.upsert_row("notifications", serde_json::to_value(&notification)?, what).await
    }

    async fn mark_notification_read(&self, notification_id: Uuid) -> StoreResult<InboxNotification> {
        self.patch_row(
            "notifications",
            notification_id,
            json!({ "read": true }),
            format!("Notification {}", notification_id),
        )
        .await
    }

    async fn list_messages(
        &self,
        clinic_id: Uuid,
        recipient_staff_id: Option<&str>,
    ) -> StoreResult<Vec<InboxMessage>> {
        let mut path = format!("/rest/v1/messages?clinic_id=eq.{}", clinic_id);
        if let Some(recipient) = recipient_staff_id {
            path.push_str(&format!("&to_staff_id={}", eq(recipient)));
        }
        path.push_str("&order=sent_at.asc");

        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        all_rows(rows)
    }

    async fn insert_message(&self, message: InboxMessage) -> StoreResult<InboxMessage> {
        let what = format!("Message {}", message.id);
        self.upsert_row("messages", serde_json::to_value(&message)?, what).await
    }

    async fn mark_message_read(&self, message_id: Uuid) -> StoreResult<InboxMessage> {
        self.patch_row(
            "messages",
            message_id,
            json!({ "read": true }),
            format!("Message {}", message_id),
        )
        .await
    }
}
