use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;

use super::DisplayRenderer;
use crate::error::ServiceError;
use crate::remote::{ContributionData, PrAction, PrEvent};

/// Intensity levels above "no contributions".
const LEVELS: u32 = 4;

/// One pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const OFF: Rgb = Rgb { r: 0, g: 0, b: 0 };

    const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    fn scaled(self, brightness: u8) -> Rgb {
        let s = |c: u8| ((u16::from(c) * u16::from(brightness)) / 255) as u8;
        Rgb::new(s(self.r), s(self.g), s(self.b))
    }
}

/// Full frame, row-major, origin top-left.
///
/// The top `height - visible_rows` rows form the notification bar; the bottom rows hold one
/// weekday each (Sunday first) and one column per week, newest week on the right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Rgb>,
    /// Text of the notification currently shown in the bar.
    pub notification: Option<String>,
}

impl Frame {
    fn blank(width: usize, height: usize) -> Self {
        Frame {
            width,
            height,
            pixels: vec![Rgb::OFF; width * height],
            notification: None,
        }
    }

    /// Pixel at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    fn set(&mut self, x: usize, y: usize, px: Rgb) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = px;
        }
    }

    /// True when every pixel is off and no notification is shown.
    pub fn is_dark(&self) -> bool {
        self.notification.is_none() && self.pixels.iter().all(|p| *p == Rgb::OFF)
    }
}

/// In-memory LED matrix.
#[derive(Debug)]
pub struct MatrixDisplay {
    frame: Mutex<Frame>,
    visible_rows: usize,
    brightness: u8,
}

impl MatrixDisplay {
    /// `visible_rows` is clamped to `height`.
    pub fn new(width: usize, height: usize, visible_rows: usize, brightness: u8) -> Self {
        Self {
            frame: Mutex::new(Frame::blank(width, height)),
            visible_rows: visible_rows.min(height),
            brightness,
        }
    }

    /// Copy of the current frame.
    pub async fn snapshot(&self) -> Frame {
        self.frame.lock().await.clone()
    }

    fn bar_rows(&self, frame: &Frame) -> usize {
        frame.height - self.visible_rows
    }

    fn level_color(&self, count: u32, max: u32) -> Rgb {
        if count == 0 || max == 0 {
            return Rgb::OFF;
        }
        let level = (count * LEVELS).div_ceil(max).clamp(1, LEVELS);
        let g = (level * 255 / LEVELS) as u8;
        Rgb::new(0, g, 0).scaled(self.brightness)
    }

    fn action_color(action: PrAction) -> Rgb {
        match action {
            PrAction::Opened | PrAction::Reopened => Rgb::new(0, 0, 255),
            PrAction::Merged => Rgb::new(128, 0, 255),
            PrAction::Closed => Rgb::new(255, 0, 0),
            PrAction::Reviewed | PrAction::ReviewRequested => Rgb::new(255, 200, 0),
            PrAction::Other => Rgb::new(255, 255, 255),
        }
    }
}

#[async_trait]
impl DisplayRenderer for MatrixDisplay {
    async fn render(&self, data: &ContributionData) -> Result<(), ServiceError> {
        let max = data.max_count();
        let mut frame = self.frame.lock().await;
        let top = self.bar_rows(&frame);
        let rows = self.visible_rows.min(7);

        for y in top..frame.height {
            for x in 0..frame.width {
                frame.set(x, y, Rgb::OFF);
            }
        }

        let shown = data.weeks.len().min(frame.width);
        let skip = data.weeks.len() - shown;
        let offset = frame.width - shown;
        for (col, week) in data.weeks.iter().skip(skip).enumerate() {
            for (row, day) in week.iter().take(rows).enumerate() {
                let px = self.level_color(day.count, max);
                frame.set(offset + col, top + row, px);
            }
        }
        Ok(())
    }

    async fn overlay_notification(&self, event: &PrEvent) -> Result<(), ServiceError> {
        let color = Self::action_color(event.action).scaled(self.brightness);
        let mut frame = self.frame.lock().await;
        let bar = self.bar_rows(&frame);
        for y in 0..bar {
            for x in 0..frame.width {
                frame.set(x, y, color);
            }
        }
        frame.notification = Some(format!(
            "{} #{} {:?} by {}",
            event.repo, event.number, event.action, event.actor
        ));
        Ok(())
    }

    async fn clear(&self) -> Result<(), ServiceError> {
        let mut frame = self.frame.lock().await;
        let (w, h) = (frame.width, frame.height);
        *frame = Frame::blank(w, h);
        Ok(())
    }

    async fn frame(&self) -> Option<Frame> {
        Some(self.snapshot().await)
    }
}
