/// Application configuration: load, save, and sanitize.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "LETTERPRESS_DATA_DIR";

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the database, media and outbox live. Empty = platform data dir.
    pub data_dir: String,
    /// Public root of the site, used in confirmation and unsubscribe links.
    pub site_url: String,
    /// Public root under which uploaded media is served.
    pub media_base_url: String,
    /// From address for outgoing mail.
    pub sender_email: String,
    /// Recipients per outgoing message (1..=1000).
    pub send_batch_size: usize,
    /// Maximum undo snapshots per editing session. `None` = unbounded.
    pub history_max_depth: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            site_url: "http://localhost:3000".to_string(),
            media_base_url: "http://localhost:3000/media".to_string(),
            sender_email: "noreply@your-domain.com".to_string(),
            send_batch_size: 100,
            history_max_depth: None,
        }
    }
}

impl AppConfig {
    /// Returns the config file path: exe directory + `letterpress.json`.
    pub fn config_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.join("letterpress.json")))
            .unwrap_or_else(|| PathBuf::from("letterpress.json"))
    }

    /// Loads config from `path`, creating a default file if it doesn't exist.
    /// Returns defaults on any error (unreadable file, parse error, etc.).
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                    Ok(mut config) => {
                        config.sanitize();
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {}: {e}", path.display());
                }
            }
            // Return defaults on error (don't overwrite broken file)
            Self::default()
        } else {
            let config = Self::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Failed to create default config at {}: {e}", path.display());
            }
            config
        }
    }

    /// Saves config to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Clamps values to valid ranges and normalizes URLs.
    pub fn sanitize(&mut self) {
        self.send_batch_size = self.send_batch_size.clamp(1, 1000);
        if self.history_max_depth == Some(0) {
            self.history_max_depth = None;
        }
        for url in [&mut self.site_url, &mut self.media_base_url] {
            let trimmed = url.trim().trim_end_matches('/').to_string();
            *url = trimmed;
        }
        self.sender_email = self.sender_email.trim().to_string();
        if self.sender_email.is_empty() {
            self.sender_email = Self::default().sender_email;
        }
    }

    /// Returns the directory holding the database, media and outbox.
    ///
    /// Resolution order:
    /// 1. `LETTERPRESS_DATA_DIR` environment variable
    /// 2. `data_dir` from the config (if non-empty)
    /// 3. Platform data directory + `letterpress`
    /// 4. `.data/` in the working directory
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                return PathBuf::from(dir);
            }
        }
        if !self.data_dir.trim().is_empty() {
            return PathBuf::from(self.data_dir.trim());
        }
        dirs::data_dir()
            .map(|d| d.join("letterpress"))
            .unwrap_or_else(|| PathBuf::from(".data"))
    }

    pub fn database_path(&self) -> PathBuf {
        self.resolve_data_dir().join("letterpress.redb")
    }

    pub fn media_dir(&self) -> PathBuf {
        self.resolve_data_dir().join("media")
    }

    pub fn outbox_dir(&self) -> PathBuf {
        self.resolve_data_dir().join("outbox")
    }
}
