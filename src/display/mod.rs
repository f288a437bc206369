//! # LED matrix display.
//!
//! [`DisplayRenderer`] is what the poll loops sink into and what the shutdown coordinator
//! clears. [`MatrixDisplay`] keeps the frame in memory behind a mutex; every operation composes
//! a whole frame under the lock, so readers never observe a half-painted frame.

mod matrix;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::remote::{ContributionData, PrEvent};

pub use matrix::{Frame, MatrixDisplay, Rgb};

/// Output device for contribution calendars and pull-request notifications.
#[async_trait]
pub trait DisplayRenderer: Send + Sync + 'static {
    /// Paints the contribution calendar.
    async fn render(&self, data: &ContributionData) -> Result<(), ServiceError>;

    /// Shows a short notification for one pull-request event.
    async fn overlay_notification(&self, event: &PrEvent) -> Result<(), ServiceError>;

    /// Turns every pixel off.
    async fn clear(&self) -> Result<(), ServiceError>;

    /// Copy of the current frame, for renderers that keep one.
    async fn frame(&self) -> Option<Frame> {
        None
    }
}
