use std::net::SocketAddr;

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::core::ShutdownSignal;
use crate::error::TaskError;
use crate::tasks::Task;

/// Serves a router until the shutdown signal fires.
///
/// Failing to bind is fatal: without the web interface the appliance cannot be configured.
pub struct WebServerTask {
    addr: SocketAddr,
    router: Router,
}

impl WebServerTask {
    pub fn new(addr: SocketAddr, router: Router) -> Self {
        Self { addr, router }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

#[async_trait]
impl Task for WebServerTask {
    fn name(&self) -> &str {
        "web"
    }

    async fn run(&self, shutdown: ShutdownSignal) -> Result<(), TaskError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| TaskError::fatal(format!("bind {}: {e}", self.addr)))?;
        let local = listener
            .local_addr()
            .map_err(|e| TaskError::fatal(format!("local address: {e}")))?;
        info!(addr = %local, "web interface listening");

        axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(shutdown.fired_owned())
            .await
            .map_err(|e| TaskError::fatal(format!("serve: {e}")))?;

        info!("web interface stopped");
        Ok(())
    }
}
