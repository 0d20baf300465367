//! # Frame display

use crate::frame::RgbImage;
use anyhow::Result;

/// On-screen frame sink with keyboard polling.
pub trait Display {
    /// Present a frame.
    fn show(&mut self, frame: &RgbImage) -> Result<()>;

    /// Wait up to `timeout_ms` milliseconds for a key press.
    ///
    /// Returns the key code, or `None` if no key was pressed in time.
    fn poll_key(&mut self, timeout_ms: i32) -> Result<Option<i32>>;
}

impl<T: Display + ?Sized> Display for Box<T> {
    fn show(&mut self, frame: &RgbImage) -> Result<()> {
        (**self).show(frame)
    }

    fn poll_key(&mut self, timeout_ms: i32) -> Result<Option<i32>> {
        (**self).poll_key(timeout_ms)
    }
}
