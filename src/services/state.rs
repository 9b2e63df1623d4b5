use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Deserialize;

use crate::db::Database;
use crate::error::{Result, SaverlyError};
use crate::models::Settings;
use crate::services::pin_lock::{KeyValueStore, PinLockGate};

/// `KeyValueStore` over the SQLite settings table. This is the production
/// backing for the PIN gate; tests use the in-memory store instead.
pub struct SettingsStore {
    db: Arc<Mutex<Database>>,
}

impl SettingsStore {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        SettingsStore { db }
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| SaverlyError::Lock("database"))
    }
}

impl KeyValueStore for SettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.db()?.get_setting(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db()?.set_setting(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db()?.remove_setting(key)
    }

    fn compare_and_swap(&self, key: &str, expected: Option<&str>, value: &str) -> Result<bool> {
        self.db()?.swap_setting(key, expected, value)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPayload {
    pub currency: Option<String>,
    pub language: Option<String>,
    pub reminder_notifications: Option<bool>,
    pub summary_notifications: Option<bool>,
}

/// One shared handle over the database and the PIN gate. UI layers hold
/// this and pass it down instead of reaching for globals.
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub pin: Mutex<PinLockGate<SettingsStore>>,
}

impl AppState {
    pub fn open(db_path: PathBuf) -> Result<Self> {
        let db = Arc::new(Mutex::new(Database::new(db_path)?));
        Self::with_database(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Arc::new(Mutex::new(Database::open_in_memory()?));
        Self::with_database(db)
    }

    fn with_database(db: Arc<Mutex<Database>>) -> Result<Self> {
        let gate = PinLockGate::new(SettingsStore::new(db.clone()))?;
        Ok(AppState {
            db,
            pin: Mutex::new(gate),
        })
    }

    pub fn db(&self) -> Result<MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| SaverlyError::Lock("database"))
    }

    pub fn pin(&self) -> Result<MutexGuard<'_, PinLockGate<SettingsStore>>> {
        self.pin.lock().map_err(|_| SaverlyError::Lock("pin gate"))
    }

    pub fn load_settings(&self) -> Result<Settings> {
        let db = self.db()?;
        let defaults = Settings::default();
        let currency = db.get_setting("currency")?.unwrap_or(defaults.currency);
        let language = db.get_setting("language")?.unwrap_or(defaults.language);
        let reminder_notifications = db
            .get_setting("reminder_notifications")?
            .map(|v| v == "true")
            .unwrap_or(defaults.reminder_notifications);
        let summary_notifications = db
            .get_setting("summary_notifications")?
            .map(|v| v == "true")
            .unwrap_or(defaults.summary_notifications);
        Ok(Settings {
            currency,
            language,
            reminder_notifications,
            summary_notifications,
        })
    }

    /// Persists only the fields present in the payload.
    pub fn save_settings(&self, payload: SettingsPayload) -> Result<Settings> {
        {
            let db = self.db()?;
            if let Some(value) = payload.currency {
                db.set_setting("currency", &value)?;
            }
            if let Some(value) = payload.language {
                db.set_setting("language", &value)?;
            }
            if let Some(value) = payload.reminder_notifications {
                db.set_setting("reminder_notifications", if value { "true" } else { "false" })?;
            }
            if let Some(value) = payload.summary_notifications {
                db.set_setting("summary_notifications", if value { "true" } else { "false" })?;
            }
        }
        self.load_settings()
    }
}
