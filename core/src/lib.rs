pub mod api;
pub mod clock;
pub mod config;
pub mod events;
pub mod export;
pub mod fetch;
pub mod rank;
pub mod schedule;
pub mod sink;
pub mod sources;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use api::{AccountApi, ApiError, GrantedPermissions, Permission, PermissionCheck};
pub use clock::{Clock, ClockStore, JsonClockStore, MemoryClockStore, PersistentClock, SystemClock};
pub use events::GameEvent;
pub use export::{Exporter, TickOutcome};
pub use fetch::{Fetcher, RetryPolicy, Unavailable};
pub use schedule::ResetScheduler;
pub use sink::{FileSink, OutputSink, Payload};
pub use sources::{OverlayAssets, SourceContext, StatSource, standard_sources};
