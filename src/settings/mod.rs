//! # Persisted appliance settings.
//!
//! [`Settings`] is the TOML document at [`Settings::default_config_path`]. Every field has a
//! default, so a partial (or missing) file is valid. `GITGLOW_*` environment variables
//! override file values at startup; the web interface patches it through
//! [`SettingsStore::update`].
//!
//! ```toml
//! github_token = "ghp_…"
//! github_username = "octocat"
//! monitored_repositories = ["octocat/hello-world"]
//! wifi_ssid = "home"
//! work_start_hour = 8
//! ```

mod store;

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::core::SupervisorConfig;
use crate::error::SettingsError;
use crate::policies::{BackoffPolicy, IntervalPolicy, JitterPolicy};

pub use store::{SettingsStore, SettingsUpdate};

const REDACTED: &str = "********";

/// Appliance configuration. Intervals are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // GitHub
    pub github_token: String,
    pub github_username: String,
    /// `owner/name` entries.
    pub monitored_repositories: Vec<String>,

    // Wi-Fi client credentials; an empty password means an open network.
    pub wifi_ssid: String,
    pub wifi_password: String,

    // LED matrix
    #[serde(deserialize_with = "clamped_brightness")]
    pub led_brightness: u8,
    pub matrix_width: usize,
    pub matrix_height: usize,
    /// Rows visible below the notification bar.
    pub display_height: usize,
    pub contribution_weeks: u32,

    // Polling cadence
    pub commit_update_interval: u64,
    pub review_update_interval: u64,
    pub review_update_interval_off: u64,
    pub work_start_hour: u32,
    pub work_end_hour: u32,
    pub retry_backoff: u64,
    pub retry_jitter: JitterPolicy,
    /// Bound on one poll iteration; 0 disables it.
    pub fetch_timeout: u64,
    pub shutdown_grace: u64,

    // Web interface and setup access point
    pub web_port: u16,
    pub setup_port: u16,
    pub setup_ssid: String,
    pub setup_password: String,

    // Logging
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            github_token: String::new(),
            github_username: String::new(),
            monitored_repositories: Vec::new(),
            wifi_ssid: String::new(),
            wifi_password: String::new(),
            led_brightness: 128,
            matrix_width: 32,
            matrix_height: 8,
            display_height: 7,
            contribution_weeks: 32,
            commit_update_interval: 900,
            review_update_interval: 60,
            review_update_interval_off: 300,
            work_start_hour: 9,
            work_end_hour: 18,
            retry_backoff: 60,
            retry_jitter: JitterPolicy::None,
            fetch_timeout: 30,
            shutdown_grace: 5,
            web_port: 8080,
            setup_port: 80,
            setup_ssid: "GitGlow-Setup".to_string(),
            setup_password: String::new(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

fn clamped_brightness<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
    let raw = i64::deserialize(d)?;
    Ok(raw.clamp(0, 255) as u8)
}

fn present(s: &str) -> bool {
    !s.trim().is_empty()
}

impl Settings {
    /// Loads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Loads settings, falling back to defaults when the file is missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
                Self::default()
            }
        }
    }

    /// Writes settings to `path`, creating parent directories.
    ///
    /// The file is written next to its destination and renamed into place, so readers see
    /// either the old or the new document.
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        let io = |source: std::io::Error| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io)?;
        }
        let content = toml::to_string_pretty(self)?;
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, content).map_err(io)?;
        std::fs::rename(&tmp, path).map_err(io)?;
        Ok(())
    }

    /// `<config dir>/gitglow/config.toml`, using the platform config directory
    /// (`$XDG_CONFIG_HOME` or `~/.config` on Linux).
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("gitglow")
            .join("config.toml")
    }

    /// Replaces values that would break the runtime with their defaults.
    ///
    /// Zero intervals would make a poll loop spin, and hours past 23 never match the clock.
    /// Returns the names of the fields that were reset.
    pub fn sanitize(&mut self) -> Vec<&'static str> {
        let defaults = Settings::default();
        let mut reset = Vec::new();

        let intervals: [(&'static str, &mut u64, u64); 4] = [
            (
                "commit_update_interval",
                &mut self.commit_update_interval,
                defaults.commit_update_interval,
            ),
            (
                "review_update_interval",
                &mut self.review_update_interval,
                defaults.review_update_interval,
            ),
            (
                "review_update_interval_off",
                &mut self.review_update_interval_off,
                defaults.review_update_interval_off,
            ),
            ("retry_backoff", &mut self.retry_backoff, defaults.retry_backoff),
        ];
        for (name, value, default) in intervals {
            if *value == 0 {
                warn!(field = name, default, "interval must be at least 1s; using default");
                *value = default;
                reset.push(name);
            }
        }

        let hours: [(&'static str, &mut u32, u32); 2] = [
            ("work_start_hour", &mut self.work_start_hour, defaults.work_start_hour),
            ("work_end_hour", &mut self.work_end_hour, defaults.work_end_hour),
        ];
        for (name, value, default) in hours {
            if *value > 23 {
                warn!(field = name, value = *value, default, "hour out of range; using default");
                *value = default;
                reset.push(name);
            }
        }
        reset
    }

    /// Applies `GITGLOW_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Applies `GITGLOW_*` overrides read through `lookup`. Unparsable numbers are ignored
    /// with a warning.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let strings: [(&str, &mut String); 4] = [
            ("GITGLOW_GITHUB_TOKEN", &mut self.github_token),
            ("GITGLOW_GITHUB_USERNAME", &mut self.github_username),
            ("GITGLOW_WIFI_SSID", &mut self.wifi_ssid),
            ("GITGLOW_WIFI_PASSWORD", &mut self.wifi_password),
        ];
        for (key, field) in strings {
            if let Some(v) = lookup(key) {
                *field = v;
            }
        }

        if let Some(repos) = lookup("GITGLOW_REPOSITORIES") {
            self.monitored_repositories = split_repositories(&repos);
        }
        if let Some(level) = lookup("GITGLOW_LOG_LEVEL") {
            self.log_level = level.to_lowercase();
        }
        if let Some(raw) = lookup("GITGLOW_WEB_PORT") {
            match raw.trim().parse() {
                Ok(port) => self.web_port = port,
                Err(e) => warn!(value = %raw, error = %e, "ignoring GITGLOW_WEB_PORT"),
            }
        }
        if let Some(raw) = lookup("GITGLOW_LED_BRIGHTNESS") {
            match raw.trim().parse::<i64>() {
                Ok(v) => self.led_brightness = v.clamp(0, 255) as u8,
                Err(e) => warn!(value = %raw, error = %e, "ignoring GITGLOW_LED_BRIGHTNESS"),
            }
        }
    }

    /// Non-empty, trimmed repository names.
    pub fn repositories(&self) -> Vec<String> {
        self.monitored_repositories
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// True when token, account, Wi-Fi SSID and at least one repository are present.
    pub fn is_configured(&self) -> bool {
        present(&self.github_token)
            && present(&self.github_username)
            && present(&self.wifi_ssid)
            && !self.repositories().is_empty()
    }

    /// Polling cadence derived from these settings.
    pub fn interval_policy(&self) -> IntervalPolicy {
        IntervalPolicy {
            work_start_hour: self.work_start_hour,
            work_end_hour: self.work_end_hour,
            work_hours_interval: Duration::from_secs(self.review_update_interval),
            off_hours_interval: Duration::from_secs(self.review_update_interval_off),
            contributions_interval: Duration::from_secs(self.commit_update_interval),
        }
    }

    /// Runtime knobs derived from these settings.
    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            grace: Duration::from_secs(self.shutdown_grace),
            backoff: BackoffPolicy::fixed(Duration::from_secs(self.retry_backoff))
                .with_jitter(self.retry_jitter),
            fetch_timeout: Duration::from_secs(self.fetch_timeout),
            ..SupervisorConfig::default()
        }
    }

    /// Address of the normal-mode web server.
    pub fn web_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.web_port))
    }

    /// Address of the setup-mode web server.
    pub fn setup_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.setup_port))
    }

    /// Copy safe to show over the web interface: secrets are masked.
    pub fn redacted(&self) -> Settings {
        let mask = |s: &str| {
            if s.is_empty() {
                String::new()
            } else {
                REDACTED.to_string()
            }
        };
        Settings {
            github_token: mask(&self.github_token),
            wifi_password: mask(&self.wifi_password),
            setup_password: mask(&self.setup_password),
            ..self.clone()
        }
    }
}

fn split_repositories(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn configured() -> Settings {
        Settings {
            github_token: "ghp_x".into(),
            github_username: "octocat".into(),
            wifi_ssid: "home".into(),
            monitored_repositories: vec!["octocat/hello".into()],
            ..Settings::default()
        }
    }

    #[test]
    fn defaults_match_appliance() {
        let s = Settings::default();
        assert_eq!(s.led_brightness, 128);
        assert_eq!((s.matrix_width, s.matrix_height, s.display_height), (32, 8, 7));
        assert_eq!(s.interval_policy(), IntervalPolicy::default());
        assert_eq!(s.web_port, 8080);
        assert_eq!(s.setup_ssid, "GitGlow-Setup");
        assert!(!s.is_configured());
    }

    #[test]
    fn configured_requires_all_four() {
        assert!(configured().is_configured());

        let mut s = configured();
        s.github_token = "   ".into();
        assert!(!s.is_configured());

        let mut s = configured();
        s.monitored_repositories = vec![" ".into()];
        assert!(!s.is_configured());

        let mut s = configured();
        s.wifi_password = String::new();
        assert!(s.is_configured());
    }

    #[test]
    fn partial_toml_uses_defaults_and_clamps_brightness() {
        let s: Settings = toml::from_str(
            r#"
            github_username = "octocat"
            led_brightness = 900
            work_start_hour = 8
            retry_jitter = "full"
            "#,
        )
        .unwrap();
        assert_eq!(s.github_username, "octocat");
        assert_eq!(s.led_brightness, 255);
        assert_eq!(s.work_start_hour, 8);
        assert_eq!(s.work_end_hour, 18);
        assert_eq!(s.retry_jitter, JitterPolicy::Full);
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("GITGLOW_GITHUB_TOKEN", "tok"),
            ("GITGLOW_REPOSITORIES", " a/b, ,c/d "),
            ("GITGLOW_WEB_PORT", "not-a-port"),
            ("GITGLOW_LED_BRIGHTNESS", "-4"),
            ("GITGLOW_LOG_LEVEL", "DEBUG"),
        ]);
        let mut s = Settings::default();
        s.apply_env_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(s.github_token, "tok");
        assert_eq!(s.monitored_repositories, vec!["a/b", "c/d"]);
        assert_eq!(s.web_port, 8080);
        assert_eq!(s.led_brightness, 0);
        assert_eq!(s.log_level, "debug");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        configured().save_to_file(&path).unwrap();
        assert_eq!(Settings::from_file(&path).unwrap(), configured());
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "github_token = [").unwrap();

        assert!(matches!(Settings::from_file(&path), Err(SettingsError::Parse(_))));
        assert_eq!(Settings::load_or_default(&path), Settings::default());
        assert_eq!(
            Settings::load_or_default(&dir.path().join("missing.toml")),
            Settings::default()
        );
    }

    #[test]
    fn redaction_masks_secrets_only() {
        let r = configured().redacted();
        assert_eq!(r.github_token, REDACTED);
        assert_eq!(r.wifi_password, "");
        assert_eq!(r.github_username, "octocat");
    }

    #[test]
    fn supervisor_config_follows_settings() {
        let s = Settings {
            retry_backoff: 10,
            fetch_timeout: 0,
            shutdown_grace: 2,
            ..Settings::default()
        };
        let cfg = s.supervisor_config();
        assert_eq!(cfg.grace, Duration::from_secs(2));
        assert_eq!(cfg.backoff.next(3), Duration::from_secs(10));
        assert_eq!(cfg.iteration_timeout(), None);
    }

    #[test]
    fn default_path_ends_in_gitglow_dir() {
        let path = Settings::default_config_path();
        assert!(path.ends_with("gitglow/config.toml"));
        assert!(path.is_absolute());
    }

    #[test]
    fn zero_intervals_are_reset_before_use() {
        let mut s: Settings = toml::from_str(
            r#"
            commit_update_interval = 0
            review_update_interval = 0
            review_update_interval_off = 0
            retry_backoff = 0
            work_end_hour = 30
            "#,
        )
        .unwrap();

        let reset = s.sanitize();
        assert_eq!(reset.len(), 5);
        assert!(reset.contains(&"retry_backoff"));

        let policy = s.interval_policy();
        assert_eq!(policy.contributions_interval, Duration::from_secs(900));
        assert_eq!(policy.work_hours_interval, Duration::from_secs(60));
        assert_eq!(policy.off_hours_interval, Duration::from_secs(300));
        assert_eq!(policy.work_end_hour, 18);
        assert_eq!(s.supervisor_config().backoff.next(1), Duration::from_secs(60));

        assert!(s.sanitize().is_empty());
        assert!(Settings::default().sanitize().is_empty());
    }
}
