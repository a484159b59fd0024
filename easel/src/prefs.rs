//! Client preferences persisted across reloads.
//!
//! Only tool preferences survive a restart: username, color, brush size,
//! drawing mode, and brush type. Session membership and the drawing log are
//! deliberately not persisted — a restarted client rejoins with an empty log.
//!
//! Preferences are loaded once at startup and injected into the engine;
//! nothing reads them ambiently.

#[cfg(test)]
#[path = "prefs_test.rs"]
mod tests;

use std::fs;
use std::io;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::action::{BrushType, Tool};

/// Per-client tool preferences. Missing fields in a stored file fall back to
/// defaults individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientPreferences {
    pub username: String,
    pub color: String,
    pub brush_size: f64,
    pub drawing_mode: Tool,
    pub brush_type: BrushType,
}

impl Default for ClientPreferences {
    fn default() -> Self {
        let n: u16 = rand::rng().random_range(0..1000);
        Self {
            username: format!("User-{n}"),
            color: "#000000".into(),
            brush_size: 3.0,
            drawing_mode: Tool::Brush,
            brush_type: BrushType::Pencil,
        }
    }
}

impl ClientPreferences {
    /// Load preferences from a JSON file. A missing or corrupt file yields
    /// defaults rather than an error.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let Ok(raw) = fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&raw).unwrap_or_default()
    }

    /// Persist preferences as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let raw = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, raw)
    }
}
