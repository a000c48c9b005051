// Service exports
pub mod matchmaking;
pub mod notifier;
pub mod search;

pub use matchmaking::MatchService;
pub use notifier::{LogNotifier, Notifier, NotifyError, RecordingNotifier, RedisNotifier};
pub use search::{SearchLimits, SearchService};
