use crate::error::{ClientError, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DEFAULT_API_BASE: &str = "http://localhost:8080/api";
pub const API_BASE_ENV: &str = "BLOGDESK_API_BASE";

fn default_base_url() -> String {
    DEFAULT_API_BASE.to_string()
}

/// Settings persisted between runs: where the API lives and the session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self { base_url: default_base_url(), token: None }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("blogdesk.toml"))
    }

    /// Loads from the user config dir, then applies the environment override.
    pub fn load() -> Self {
        let mut state = Self::config_path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default();
        if let Ok(base) = std::env::var(API_BASE_ENV) {
            let base = crate::utils::normalize_url(&base);
            if !base.is_empty() {
                state.base_url = base;
            }
        }
        state
    }

    /// Missing or malformed files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(text) = fs::read_to_string(path) else {
            return Self::new();
        };
        match toml::from_str::<AppState>(&text) {
            Ok(state) => state,
            Err(e) => {
                log::warn!("ignoring malformed settings at {}: {e}", path.display());
                Self::new()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| ClientError::Storage("No config dir".into()))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(self).map_err(|e| ClientError::Storage(e.to_string()))?;
        fs::write(path, text)?;
        Ok(())
    }
}

/// Durable storage for the bearer token.
pub trait TokenStore: Send + Sync {
    fn token(&self) -> Option<String>;
    fn set_token(&self, token: &str) -> Result<()>;
    fn clear_token(&self) -> Result<()>;
}

/// Keeps the token inside the settings file.
pub struct FileTokenStore {
    path: PathBuf,
    state: Mutex<AppState>,
}

impl FileTokenStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = AppState::load_from(&path);
        Self { path, state: Mutex::new(state) }
    }

    pub fn open_default() -> Result<Self> {
        let path = AppState::config_path()
            .ok_or_else(|| ClientError::Storage("No config dir".into()))?;
        Ok(Self::open(path))
    }

    fn update(&self, token: Option<String>) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ClientError::Storage("settings lock poisoned".into()))?;
        // the base URL may have been changed on disk since we opened
        let mut fresh = AppState::load_from(&self.path);
        fresh.token = token;
        fresh.save_to(&self.path)?;
        *state = fresh;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn token(&self) -> Option<String> {
        self.state.lock().ok().and_then(|s| s.token.clone())
    }

    fn set_token(&self, token: &str) -> Result<()> {
        self.update(Some(token.to_string()))
    }

    fn clear_token(&self) -> Result<()> {
        self.update(None)
    }
}

#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self { token: Mutex::new(Some(token.to_string())) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        self.token.lock().ok().and_then(|t| t.clone())
    }

    fn set_token(&self, token: &str) -> Result<()> {
        if let Ok(mut t) = self.token.lock() {
            *t = Some(token.to_string());
        }
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        if let Ok(mut t) = self.token.lock() {
            *t = None;
        }
        Ok(())
    }
}
