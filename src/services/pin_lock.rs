use std::collections::HashMap;
use std::sync::Mutex;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{Result, SaverlyError};
use crate::models::PIN_LENGTH;

pub const PIN_STORAGE_KEY: &str = "app_pin";

/// Persistence boundary of the gate: one string value under one fixed key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    /// Writes only if the stored value still equals `expected`, so two
    /// sessions changing the PIN cannot silently overwrite each other.
    fn compare_and_swap(&self, key: &str, expected: Option<&str>, value: &str) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinState {
    Disabled,
    Locked,
    Unlocked,
}

/// Session gate behind a short numeric PIN.
///
/// The gate starts `Locked` when a PIN is already persisted and `Disabled`
/// otherwise. A wrong PIN on unlock or change is a normal outcome reported
/// as `Ok(false)`; only storage failures and malformed input are errors.
/// There is deliberately no attempt limit or backoff on unlock.
pub struct PinLockGate<S: KeyValueStore> {
    store: S,
    state: PinState,
}

impl<S: KeyValueStore> PinLockGate<S> {
    pub fn new(store: S) -> Result<Self> {
        let state = match store.get(PIN_STORAGE_KEY)? {
            Some(_) => PinState::Locked,
            None => PinState::Disabled,
        };
        debug!(?state, "pin gate initialized");
        Ok(PinLockGate { store, state })
    }

    pub fn state(&self) -> PinState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state != PinState::Disabled
    }

    pub fn is_locked(&self) -> bool {
        self.state == PinState::Locked
    }

    /// Sets (or replaces) the PIN and leaves the session unlocked.
    pub fn enable(&mut self, pin: &str) -> Result<()> {
        validate_pin(pin)?;
        self.store.set(PIN_STORAGE_KEY, &pin_digest(pin))?;
        self.state = PinState::Unlocked;
        info!("pin lock enabled");
        Ok(())
    }

    /// Erases the persisted PIN; a disabled gate is always unlocked.
    pub fn disable(&mut self) -> Result<()> {
        self.store.remove(PIN_STORAGE_KEY)?;
        self.state = PinState::Disabled;
        info!("pin lock disabled");
        Ok(())
    }

    /// No-op when no PIN is set.
    pub fn lock(&mut self) {
        if self.state != PinState::Disabled {
            self.state = PinState::Locked;
        }
    }

    /// Returns whether the candidate matched. On a mismatch the gate stays
    /// locked; the caller decides how often to re-prompt.
    pub fn attempt_unlock(&mut self, candidate: &str) -> Result<bool> {
        let stored = match self.store.get(PIN_STORAGE_KEY)? {
            Some(digest) => digest,
            None => return Ok(false),
        };

        if stored == pin_digest(candidate) {
            self.state = PinState::Unlocked;
            Ok(true)
        } else {
            debug!("pin unlock attempt failed");
            Ok(false)
        }
    }

    /// Swaps the PIN only when `old_pin` matches the persisted one. The
    /// comparison and write happen as a single compare-and-swap against
    /// the store. Lock state is unchanged either way.
    pub fn change_pin(&mut self, old_pin: &str, new_pin: &str) -> Result<bool> {
        validate_pin(new_pin)?;
        let swapped = self.store.compare_and_swap(
            PIN_STORAGE_KEY,
            Some(&pin_digest(old_pin)),
            &pin_digest(new_pin),
        )?;
        if swapped {
            info!("pin changed");
        }
        Ok(swapped)
    }
}

fn validate_pin(pin: &str) -> Result<()> {
    if pin.len() != PIN_LENGTH || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(SaverlyError::validation(
            "pin",
            format!("must be exactly {} digits", PIN_LENGTH),
        ));
    }
    Ok(())
}

fn pin_digest(pin: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pin.as_bytes());
    hex::encode(hasher.finalize())
}

/// In-memory store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().map_err(|_| SaverlyError::Lock("memory store"))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| SaverlyError::Lock("memory store"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| SaverlyError::Lock("memory store"))?;
        values.remove(key);
        Ok(())
    }

    fn compare_and_swap(&self, key: &str, expected: Option<&str>, value: &str) -> Result<bool> {
        let mut values = self.values.lock().map_err(|_| SaverlyError::Lock("memory store"))?;
        let current = values.get(key).map(String::as_str);
        if current == expected {
            values.insert(key.to_string(), value.to_string());
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
