pub mod formatting;

mod config;

pub use config::{
    MIN_POLL_INTERVAL_SECS, ResetWeekday, RetrySettings, SinkRetrySettings, StreamOutConfig,
    UnicodeSigning, WeeklyReset,
};
