use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{ClockStore, ClockValue};

/// View of a [`ClockStore`] scoped to one owner.
///
/// Keys are stored as `<namespace>_<field>` so two stat sources can use the same
/// field names without colliding. `define_*` mirrors a settings entry with a
/// default: the first read writes the default, later reads return what is stored.
#[derive(Clone)]
pub struct PersistentClock {
    store: Arc<dyn ClockStore>,
    namespace: String,
}

impl PersistentClock {
    pub fn new(store: Arc<dyn ClockStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn key(&self, field: &str) -> String {
        format!("{}_{}", self.namespace, field)
    }

    fn read<T>(&self, field: &str, extract: impl FnOnce(&ClockValue) -> Option<T>) -> Option<T> {
        let key = self.key(field);
        let value = self.store.get(&key)?;
        let extracted = extract(&value);
        if extracted.is_none() {
            tracing::warn!(key = %key, found = value.type_name(), "Stored value has unexpected type, ignoring");
        }
        extracted
    }

    fn write(&self, field: &str, value: ClockValue) {
        let key = self.key(field);
        if let Err(e) = self.store.set(&key, value) {
            tracing::warn!(key = %key, error = %e, "Failed to persist state");
        }
    }

    fn define<T: Clone>(
        &self,
        field: &str,
        default: T,
        extract: impl FnOnce(&ClockValue) -> Option<T>,
        wrap: impl FnOnce(T) -> ClockValue,
    ) -> T {
        match self.read(field, extract) {
            Some(value) => value,
            None => {
                self.write(field, wrap(default.clone()));
                default
            }
        }
    }

    // --- Timestamps ---

    pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.read(field, ClockValue::as_timestamp)
    }

    pub fn define_timestamp(&self, field: &str, default: DateTime<Utc>) -> DateTime<Utc> {
        self.define(field, default, ClockValue::as_timestamp, ClockValue::Timestamp)
    }

    pub fn set_timestamp(&self, field: &str, value: DateTime<Utc>) {
        self.write(field, ClockValue::Timestamp(value));
    }

    // --- Integers ---

    pub fn integer(&self, field: &str) -> Option<i64> {
        self.read(field, ClockValue::as_integer)
    }

    pub fn define_integer(&self, field: &str, default: i64) -> i64 {
        self.define(field, default, ClockValue::as_integer, ClockValue::Integer)
    }

    pub fn set_integer(&self, field: &str, value: i64) {
        self.write(field, ClockValue::Integer(value));
    }

    // --- Text ---

    pub fn text(&self, field: &str) -> Option<String> {
        self.read(field, |v| v.as_text().map(str::to_string))
    }

    pub fn set_text(&self, field: &str, value: &str) {
        self.write(field, ClockValue::Text(value.to_string()));
    }

    // --- Guids ---

    pub fn guid(&self, field: &str) -> Option<Uuid> {
        self.read(field, ClockValue::as_guid)
    }

    pub fn set_guid(&self, field: &str, value: Uuid) {
        self.write(field, ClockValue::Guid(value));
    }
}
