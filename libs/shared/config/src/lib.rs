use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_token: String,
    pub server_port: u16,
    pub store_retry_attempts: u32,
    pub store_retry_backoff_ms: u64,
    pub booking_timeout_ms: u64,
    pub allow_past_manual_bookings: bool,
    pub follow_up_assignee: String,
    pub follow_up_due_hours: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_token: String::new(),
            server_port: 3000,
            store_retry_attempts: 1,
            store_retry_backoff_ms: 100,
            booking_timeout_ms: 5000,
            allow_past_manual_bookings: true,
            follow_up_assignee: "front_desk".to_string(),
            follow_up_due_hours: 24,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, falling back to in-memory store");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_token: env::var("SUPABASE_SERVICE_TOKEN")
                .unwrap_or_default(),
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            store_retry_attempts: parse_var("STORE_RETRY_ATTEMPTS", defaults.store_retry_attempts),
            store_retry_backoff_ms: parse_var("STORE_RETRY_BACKOFF_MS", defaults.store_retry_backoff_ms),
            booking_timeout_ms: parse_var("BOOKING_TIMEOUT_MS", defaults.booking_timeout_ms),
            allow_past_manual_bookings: parse_var(
                "ALLOW_PAST_MANUAL_BOOKINGS",
                defaults.allow_past_manual_bookings,
            ),
            follow_up_assignee: env::var("FOLLOW_UP_ASSIGNEE")
                .unwrap_or(defaults.follow_up_assignee),
            follow_up_due_hours: parse_var("FOLLOW_UP_DUE_HOURS", defaults.follow_up_due_hours),
        };

        if !config.is_supabase_configured() {
            warn!("Supabase not configured - data will not survive a restart");
        }

        config
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }
}

fn parse_var<T: FromStr + Copy + std::fmt::Debug>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {:?}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
