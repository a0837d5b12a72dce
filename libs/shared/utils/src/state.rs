use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{RetryPolicy, Stores, SupabaseStore};

use crate::clock::{Clock, SystemClock};
use crate::event_bus::EventBus;
use crate::locks::{KeyedLocks, SlotKey};

/// Shared handles every cell router receives.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub stores: Stores,
    pub events: EventBus,
    pub clock: Arc<dyn Clock>,
    pub booking_locks: Arc<KeyedLocks<SlotKey>>,
    /// Serializes read-check-write status changes per task, reminder or appointment id.
    pub entity_locks: Arc<KeyedLocks<Uuid>>,
}

impl AppState {
    pub fn new(config: AppConfig, stores: Stores) -> Self {
        Self {
            config: Arc::new(config),
            stores,
            events: EventBus::default(),
            clock: Arc::new(SystemClock),
            booking_locks: Arc::new(KeyedLocks::new()),
            entity_locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Picks the Supabase backend when configured, the in-memory one otherwise.
    pub fn from_config(config: AppConfig) -> Self {
        let stores = if config.is_supabase_configured() {
            info!("Using Supabase store at {}", config.supabase_url);
            Stores::from_backend(Arc::new(SupabaseStore::new(&config)))
        } else {
            info!("Using in-memory store");
            Stores::in_memory()
        };
        Self::new(config, stores)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_config(&self.config)
    }
}
