use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::NetworkManager;
use crate::error::ServiceError;

const DEFAULT_INTERFACE: &str = "wlan0";
const DEFAULT_CONNECTION: &str = "gitglow-hotspot";

/// Hotspot backed by `nmcli device wifi hotspot`.
#[derive(Debug)]
pub struct NmcliHotspot {
    program: String,
    interface: String,
    connection: String,
    active: AtomicBool,
}

impl Default for NmcliHotspot {
    fn default() -> Self {
        Self::new("nmcli", DEFAULT_INTERFACE)
    }
}

impl NmcliHotspot {
    /// Uses `program` (normally `nmcli`) on the given wireless interface.
    pub fn new(program: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            interface: interface.into(),
            connection: DEFAULT_CONNECTION.to_string(),
            active: AtomicBool::new(false),
        }
    }

    /// True between a successful start and the next stop.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    async fn exec(&self, args: &[&str]) -> Result<(), ServiceError> {
        debug!(program = %self.program, ?args, "running network command");
        let out = Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;
        if out.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&out.stderr);
        Err(ServiceError::Network(format!(
            "{} exited with {}: {}",
            self.program,
            out.status,
            stderr.trim()
        )))
    }
}

#[async_trait]
impl NetworkManager for NmcliHotspot {
    async fn start_hotspot(&self, ssid: &str, password: &str) -> Result<(), ServiceError> {
        let mut args = vec![
            "device",
            "wifi",
            "hotspot",
            "ifname",
            self.interface.as_str(),
            "con-name",
            self.connection.as_str(),
            "ssid",
            ssid,
        ];
        if !password.is_empty() {
            args.extend(["password", password]);
        }
        self.exec(&args).await?;
        self.active.store(true, Ordering::Release);
        info!(ssid, interface = %self.interface, "hotspot started");
        Ok(())
    }

    async fn stop_hotspot(&self) -> Result<(), ServiceError> {
        if !self.active.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        if let Err(e) = self.exec(&["connection", "down", &self.connection]).await {
            self.active.store(true, Ordering::Release);
            return Err(e);
        }
        info!("hotspot stopped");
        Ok(())
    }
}
