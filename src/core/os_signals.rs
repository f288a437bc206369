//! # Cross-platform OS signal handling.
//!
//! [`shutdown_signals`] installs the listeners immediately and returns a stream that yields
//! the name of every termination signal received afterwards. Signals that arrive before the
//! stream is polled are kept, so installing it early covers startup work. It only observes;
//! turning a signal into a shutdown is the supervisor's job.
//!
//! **Unix:** `SIGINT`, `SIGTERM` (systemd stop), `SIGQUIT`.
//! **Windows:** Ctrl-C.

use std::pin::Pin;

use futures::stream::{self, Stream};

use crate::error::RuntimeError;

/// Termination signals by name. A registration failure is yielded once, then the stream ends.
pub type SignalStream = Pin<Box<dyn Stream<Item = Result<&'static str, RuntimeError>> + Send>>;

/// Installs termination signal listeners. Must be called within a tokio runtime.
#[cfg(unix)]
pub fn shutdown_signals() -> SignalStream {
    use tokio::signal::unix::{SignalKind, signal};

    let install = || -> Result<_, RuntimeError> {
        Ok((
            signal(SignalKind::interrupt())?,
            signal(SignalKind::terminate())?,
            signal(SignalKind::quit())?,
        ))
    };

    match install() {
        Ok(listeners) => Box::pin(stream::unfold(
            listeners,
            |(mut sigint, mut sigterm, mut sigquit)| async move {
                let name = tokio::select! {
                    _ = sigint.recv()  => "SIGINT",
                    _ = sigterm.recv() => "SIGTERM",
                    _ = sigquit.recv() => "SIGQUIT",
                };
                Some((Ok(name), (sigint, sigterm, sigquit)))
            },
        )),
        Err(e) => Box::pin(stream::once(async move { Err(e) })),
    }
}

/// Installs termination signal listeners. Must be called within a tokio runtime.
#[cfg(windows)]
pub fn shutdown_signals() -> SignalStream {
    match tokio::signal::windows::ctrl_c() {
        Ok(listener) => Box::pin(stream::unfold(listener, |mut ctrl_c| async move {
            ctrl_c.recv().await?;
            Some((Ok("ctrl-c"), ctrl_c))
        })),
        Err(e) => Box::pin(stream::once(async move {
            Err(RuntimeError::SignalRegistration(e))
        })),
    }
}
