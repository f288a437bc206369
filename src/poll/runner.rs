//! # One poll iteration.
//!
//! Runs fetch then sink for a [`PollStream`], bounded by the stream's timeout and abortable by
//! the [`ShutdownSignal`].
//!
//! ```text
//! Success:   fetch → Ok(item) → sink(item) → Ok(())
//! Failure:   fetch/sink → Err(e)           → Err(Fail("fetch: …" | "sink: …"))
//! Timeout:   bound elapsed → publish TimeoutHit → Err(Timeout)
//! Shutdown:  signal fired  → in-flight work dropped → Err(Canceled)
//! ```
//!
//! The caller publishes the outcome; only `TimeoutHit` is emitted here.

use tokio::sync::watch;
use tokio::time;

use super::poller::PollState;
use super::stream::PollStream;
use crate::core::ShutdownSignal;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};

pub(crate) async fn run_iteration<T: Send + 'static>(
    stream: &PollStream<T>,
    shutdown: &ShutdownSignal,
    state: &watch::Sender<PollState>,
    attempt: u64,
    bus: &Bus,
) -> Result<(), TaskError> {
    let work = async {
        state.send_replace(PollState::Fetching);
        let item = stream
            .fetch
            .fetch()
            .await
            .map_err(|e| TaskError::fail(format!("fetch: {e}")))?;

        state.send_replace(PollState::Sinking);
        stream
            .sink
            .sink(item)
            .await
            .map_err(|e| TaskError::fail(format!("sink: {e}")))
    };

    let bounded = async {
        match stream.timeout {
            Some(dur) => match time::timeout(dur, work).await {
                Ok(res) => res,
                Err(_elapsed) => {
                    bus.publish(
                        Event::new(EventKind::TimeoutHit)
                            .with_task(stream.id.as_str())
                            .with_attempt(attempt)
                            .with_timeout(dur),
                    );
                    Err(TaskError::Timeout { timeout: dur })
                }
            },
            None => work.await,
        }
    };

    tokio::select! {
        biased;
        _ = shutdown.fired() => Err(TaskError::Canceled),
        res = bounded => res,
    }
}
