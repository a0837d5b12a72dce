pub mod clock;
pub mod event_bus;
pub mod locks;
pub mod state;
pub mod test_utils;

pub use clock::{Clock, FixedClock, SystemClock};
pub use event_bus::{EventBus, EventReceiver};
pub use locks::{KeyedLocks, SlotKey};
pub use state::AppState;
