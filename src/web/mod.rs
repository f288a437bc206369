//! # Local web interface.
//!
//! JSON endpoints served by axum:
//!
//! | Route               | Setup | Normal | Purpose                                  |
//! |---------------------|:-----:|:------:|------------------------------------------|
//! | `GET /health`       |   ✓   |   ✓    | liveness                                 |
//! | `GET /`             |   ✓   |   ✓    | mode and whether settings are complete   |
//! | `GET /api/status`   |   ✓   |   ✓    | per-task health from the status board    |
//! | `GET /api/settings` |   ✓   |   ✓    | current settings, secrets masked         |
//! | `POST /api/settings`|   ✓   |   ✓    | partial update, persisted before reply   |
//! | `GET /api/display`  |       |   ✓    | current LED frame                        |
//!
//! [`WebServerTask`] runs the router as a supervised task.

mod routes;
mod server;

use std::sync::Arc;

use crate::display::DisplayRenderer;
use crate::mode::OperatingMode;
use crate::settings::SettingsStore;
use crate::subscribers::StatusBoard;

pub use routes::router;
pub use server::WebServerTask;

/// Shared state of every handler.
#[derive(Clone)]
pub struct WebState {
    pub mode: OperatingMode,
    pub settings: Arc<SettingsStore>,
    pub status: Arc<StatusBoard>,
    /// Present in normal mode.
    pub display: Option<Arc<dyn DisplayRenderer>>,
}
