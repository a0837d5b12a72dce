pub mod error;
pub mod memory;
pub mod retry;
pub mod store;
pub mod supabase;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use retry::{with_retry, RetryPolicy};
pub use store::*;
pub use supabase::{SupabaseClient, SupabaseStore};
