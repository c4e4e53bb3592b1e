//! Render primitives and the exclusive drawing lock.
//!
//! Text layout and buffer management belong to the host system's drawing
//! layer; the menus only need `clear`, `draw_text`, and `flush`. [`Screen`]
//! enforces the one rule the host imposes on everything that draws: acquire
//! the surface lock, draw, flush, release, with no interleaving between
//! components.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Left margin for all menu text.
pub const MARGIN_X: i32 = 10;
/// Y coordinate of a screen title.
pub const TITLE_Y: i32 = 10;
/// X coordinate of the status value column.
pub const STATUS_X: i32 = 90;
const LINE_HEIGHT: i32 = 20;

/// Y coordinate of body line `n` (line 0 sits below the title).
pub fn line_y(n: i32) -> i32 {
    TITLE_Y + LINE_HEIGHT * (n + 1)
}

/// Palette understood by the host drawing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColor {
    Title,
    White,
    Red,
    Green,
}

/// Drawing surface supplied by the host system.
pub trait RenderSurface {
    fn clear(&mut self);
    fn draw_text(&mut self, x: i32, y: i32, color: TextColor, text: &str);
    /// Push everything drawn since the last flush to the physical display.
    fn flush(&mut self);
}

/// Exclusive-access wrapper around the drawing surface.
///
/// Every drawing pass goes through [`Screen::frame`]: the surface lock is
/// held for the whole acquire-draw-flush sequence, so no two components can
/// interleave draw calls.
pub struct Screen<S> {
    surface: Mutex<S>,
}

impl<S: RenderSurface> Screen<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface: Mutex::new(surface),
        }
    }

    /// Run one locked draw pass and flush it.
    pub fn frame<R>(&self, draw: impl FnOnce(&mut S) -> R) -> R {
        let mut surface = self.lock();
        let out = draw(&mut surface);
        surface.flush();
        out
    }

    /// Clear and flush, the reset performed when a screen is entered.
    pub fn wipe(&self) {
        let mut surface = self.lock();
        surface.clear();
        surface.flush();
    }

    /// Recover the surface, e.g. for inspection after a simulated run.
    pub fn into_inner(self) -> S {
        self.surface
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        // A panic mid-draw leaves at worst a stale frame; the surface data
        // itself stays valid, so a poisoned lock is safe to reclaim.
        self.surface.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sim::RecordingSurface;

    #[test]
    fn test_frame_locks_draws_and_flushes() {
        let screen = Screen::new(RecordingSurface::default());
        screen.frame(|surface| {
            surface.draw_text(MARGIN_X, TITLE_Y, TextColor::Title, "hello");
        });
        let surface = screen.into_inner();
        assert_eq!(surface.flushes(), 1);
        assert!(surface.contains("hello"));
    }

    #[test]
    fn test_wipe_clears_previous_frame() {
        let screen = Screen::new(RecordingSurface::default());
        screen.frame(|surface| {
            surface.draw_text(MARGIN_X, TITLE_Y, TextColor::White, "stale");
        });
        screen.wipe();
        let surface = screen.into_inner();
        assert!(!surface.contains("stale"));
        assert_eq!(surface.flushes(), 2);
    }

    #[test]
    fn test_line_y_spacing() {
        assert_eq!(line_y(0), 30);
        assert_eq!(line_y(1), 50);
        assert_eq!(line_y(4), 110);
    }
}
