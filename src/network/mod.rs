//! # Setup access point.
//!
//! In setup mode the appliance raises its own Wi-Fi hotspot so a phone can reach the
//! configuration server. [`NetworkManager`] is the seam; [`NmcliHotspot`] drives NetworkManager
//! through the `nmcli` command line.

mod nmcli;

use async_trait::async_trait;

use crate::error::ServiceError;

pub use nmcli::NmcliHotspot;

/// Hotspot control.
#[async_trait]
pub trait NetworkManager: Send + Sync + 'static {
    /// Raises an access point named `ssid`. An empty `password` means an open network.
    async fn start_hotspot(&self, ssid: &str, password: &str) -> Result<(), ServiceError>;

    /// Drops the access point. Calling it when no hotspot is up is a no-op.
    async fn stop_hotspot(&self) -> Result<(), ServiceError>;
}
