//! The scalar settings document.

use crate::error::Result;
use crate::models::AppSettings;
use crate::store::Store;

impl Store {
    /// The current settings, or defaults if the file is missing or corrupt.
    pub fn settings(&self) -> AppSettings {
        self.read_json_or_default(&self.settings_path())
    }

    /// Replace the whole settings document.
    pub fn update_settings(&self, settings: &AppSettings) -> Result<()> {
        self.write_json(&self.settings_path(), settings)
    }

    /// Read one open-ended key, or the supplied default if unknown.
    pub fn get_extra(&self, key: &str, default: serde_json::Value) -> serde_json::Value {
        self.settings()
            .extra
            .get(key)
            .cloned()
            .unwrap_or(default)
    }

    /// Write one open-ended key, preserving everything else.
    pub fn set_extra(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let mut settings = self.settings();
        settings.extra.insert(key.to_string(), value);
        self.update_settings(&settings)
    }
}
