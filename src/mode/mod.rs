//! # Operating mode.
//!
//! The appliance runs in exactly one mode per process:
//!
//! ```text
//! Settings ──► select_mode ──► Setup  ──► hotspot up ──► [setup web server]
//!                         └──► Normal ──────────────────► [contributions loop,
//!                                                          pr-events loop,
//!                                                          web server]
//! ```
//!
//! Switching modes requires a restart.

mod adapters;
mod controller;
mod task_set;

use std::fmt;

use serde::Serialize;

use crate::settings::Settings;

pub use adapters::{ContributionsFetch, NotificationSink, PrEventsFetch, RenderSink};
pub use controller::ModeController;
pub use task_set::{TaskContext, TaskSet};

/// Mutually exclusive operating modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    /// Unconfigured: access point plus configuration server.
    Setup,
    /// Configured: pollers plus web interface.
    Normal,
}

impl OperatingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatingMode::Setup => "setup",
            OperatingMode::Normal => "normal",
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normal iff token, account, Wi-Fi SSID and at least one repository are present.
pub fn select_mode(settings: &Settings) -> OperatingMode {
    if settings.is_configured() {
        OperatingMode::Normal
    } else {
        OperatingMode::Setup
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_iff_all_required_fields() {
        let full = Settings {
            github_token: "t".into(),
            github_username: "u".into(),
            wifi_ssid: "s".into(),
            monitored_repositories: vec!["a/b".into()],
            ..Settings::default()
        };
        assert_eq!(select_mode(&full), OperatingMode::Normal);

        let drops: [fn(&mut Settings); 4] = [
            |s| s.github_token.clear(),
            |s| s.github_username.clear(),
            |s| s.wifi_ssid.clear(),
            |s| s.monitored_repositories.clear(),
        ];
        for drop in drops {
            let mut s = full.clone();
            drop(&mut s);
            assert_eq!(select_mode(&s), OperatingMode::Setup);
        }
    }
}
