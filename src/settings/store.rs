use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::info;

use super::Settings;
use crate::error::SettingsError;

/// Partial settings change submitted through the web interface.
///
/// Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsUpdate {
    pub github_token: Option<String>,
    pub github_username: Option<String>,
    pub monitored_repositories: Option<Vec<String>>,
    pub wifi_ssid: Option<String>,
    pub wifi_password: Option<String>,
    pub led_brightness: Option<i64>,
    pub commit_update_interval: Option<u64>,
    pub review_update_interval: Option<u64>,
    pub review_update_interval_off: Option<u64>,
    pub work_start_hour: Option<u32>,
    pub work_end_hour: Option<u32>,
    pub web_port: Option<u16>,
}

impl SettingsUpdate {
    /// Applies the patch to `settings`, rejecting out-of-range values before touching it.
    pub fn apply(self, settings: &mut Settings) -> Result<(), SettingsError> {
        for hour in [self.work_start_hour, self.work_end_hour].into_iter().flatten() {
            if hour > 23 {
                return Err(SettingsError::Invalid(format!("hour {hour} is outside 0-23")));
            }
        }
        let intervals = [
            self.commit_update_interval,
            self.review_update_interval,
            self.review_update_interval_off,
        ];
        if intervals.into_iter().flatten().any(|secs| secs == 0) {
            return Err(SettingsError::Invalid("intervals must be positive".into()));
        }
        if self.web_port == Some(0) {
            return Err(SettingsError::Invalid("web_port must be non-zero".into()));
        }

        fn set<T>(field: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *field = v;
            }
        }
        set(&mut settings.github_token, self.github_token);
        set(&mut settings.github_username, self.github_username);
        set(&mut settings.wifi_ssid, self.wifi_ssid);
        set(&mut settings.wifi_password, self.wifi_password);
        set(&mut settings.commit_update_interval, self.commit_update_interval);
        set(&mut settings.review_update_interval, self.review_update_interval);
        set(
            &mut settings.review_update_interval_off,
            self.review_update_interval_off,
        );
        set(&mut settings.work_start_hour, self.work_start_hour);
        set(&mut settings.work_end_hour, self.work_end_hour);
        set(&mut settings.web_port, self.web_port);
        if let Some(repos) = self.monitored_repositories {
            settings.monitored_repositories = repos
                .into_iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect();
        }
        if let Some(b) = self.led_brightness {
            settings.led_brightness = b.clamp(0, 255) as u8;
        }
        Ok(())
    }
}

/// File-backed settings with serialized writers.
///
/// The lock is held across apply and persist, so `update` returns only after the file holds
/// the new document and concurrent updates never interleave.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    current: Mutex<Settings>,
}

impl SettingsStore {
    /// Wraps already-loaded settings stored at `path`.
    pub fn new(path: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            path: path.into(),
            current: Mutex::new(settings),
        }
    }

    /// Reads `path` (defaults if missing or unreadable).
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = Settings::load_or_default(&path);
        Self::new(path, settings)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current settings.
    pub async fn load(&self) -> Settings {
        self.current.lock().await.clone()
    }

    /// Replaces the whole document and persists it.
    pub async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let mut current = self.current.lock().await;
        self.persist(settings).await?;
        *current = settings.clone();
        info!(path = %self.path.display(), "settings saved");
        Ok(())
    }

    /// Applies `patch`, persists, and returns the new settings.
    ///
    /// On error neither memory nor file is changed.
    pub async fn update(&self, patch: SettingsUpdate) -> Result<Settings, SettingsError> {
        let mut current = self.current.lock().await;
        let mut next = current.clone();
        patch.apply(&mut next)?;
        self.persist(&next).await?;
        *current = next.clone();
        info!(path = %self.path.display(), "settings saved");
        Ok(next)
    }

    /// Writes `settings` on the blocking pool. Callers hold the lock.
    async fn persist(&self, settings: &Settings) -> Result<(), SettingsError> {
        let path = self.path.clone();
        let doc = settings.clone();
        tokio::task::spawn_blocking(move || doc.save_to_file(&path))
            .await
            .map_err(|e| SettingsError::Io {
                path: self.path.clone(),
                source: std::io::Error::other(e),
            })?
    }
}
