//! Storage is organized through the [KeyValueStore] contract.
//! The basic idea is:
//!   - Every piece of state lives in its own string slot, addressed by a key.
//!   - Slots are read once at startup and rewritten after every mutation.
//!   - [file_store::FileStore] keeps each slot as a file inside the store directory.

pub mod file_store;
pub mod memory;

use std::ops::DerefMut;

use anyhow::Result;

/// Slot holding the JSON encoded item list.
pub const ITEMS_KEY: &str = "checklist-items";
/// Slot holding the streak as decimal text.
pub const STREAK_KEY: &str = "streak";
/// Slot holding the calendar day of the last completion, or an empty string.
pub const LAST_COMPLETED_KEY: &str = "lastCompleted";
/// Slot holding the notification permission decision.
pub const NOTIFICATION_PERMISSION_KEY: &str = "notificationPermission";

/// Interface for abstracting a synchronous string-keyed store.
pub trait KeyValueStore {
    /// Retrieves the value stored under `key`. Missing slots are not an error.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the value stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<T: DerefMut> KeyValueStore for T
where
    T::Target: KeyValueStore,
{
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.deref().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.deref_mut().set(key, value)
    }
}
