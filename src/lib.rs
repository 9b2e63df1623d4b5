//! Core services for the Saverly personal finance tracker.
//!
//! The crate owns the domain logic a UI surface calls into: invoice
//! computation and storage, the income/expense ledger with reminders and
//! notes, user settings, and the PIN session gate. Rendering, auth
//! providers and AI prompt flows live outside this crate.

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{Result, SaverlyError};
pub use services::pin_lock::{KeyValueStore, MemoryStore, PinLockGate, PinState};
pub use services::state::{AppState, SettingsPayload, SettingsStore};
