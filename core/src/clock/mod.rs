//! Time and durable state
//!
//! - **Clock**: source of "now", injected so reset boundaries are testable
//! - **ClockStore**: typed key-value storage that survives restarts
//! - **PersistentClock**: a store view namespaced to one stat source

mod persistent;
mod store;

pub use persistent::PersistentClock;
pub use store::{ClockStore, ClockValue, JsonClockStore, MemoryClockStore, StoreError};

use chrono::{DateTime, Utc};

/// Port for wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
