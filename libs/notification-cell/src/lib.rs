pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{FeedError, FeedFilter, FeedItem, FeedItemType, FeedResponse, MarkReadOutcome, UnreadCounts};
pub use router::notification_routes;
pub use services::{FeedSource, NotificationHub};
