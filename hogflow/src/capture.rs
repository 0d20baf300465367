//! # Frame capture

use crate::frame::RgbImage;
use anyhow::Result;
use log::*;

/// Open capture handle.
pub trait FrameSource {
    /// Check whether the underlying device or file is usable.
    fn is_open(&self) -> bool;

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` once the stream is exhausted, and `Err` on read failures.
    fn read_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Release the underlying resource.
    fn release(&mut self);
}

/// What a capture input string refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureTarget<'a> {
    /// Camera by index, given as a plain integer.
    Device(i32),
    /// Video file or stream URL.
    File(&'a str),
}

impl<'a> CaptureTarget<'a> {
    pub fn parse(input: &'a str) -> Self {
        match input.trim().parse() {
            Ok(index) => Self::Device(index),
            Err(_) => Self::File(input),
        }
    }
}

/// Opens capture handles from a path or device string.
pub trait SourceOpener {
    type Source: FrameSource;

    fn open(&mut self, path: &str) -> Result<Self::Source>;
}

impl<S: FrameSource, F: FnMut(&str) -> Result<S>> SourceOpener for F {
    type Source = S;

    fn open(&mut self, path: &str) -> Result<S> {
        self(path)
    }
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        (**self).read_frame()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Exclusive owner of a capture handle.
///
/// The handle is released exactly once: either explicitly through [`CaptureSession::release`], or
/// when the session is dropped, whichever comes first.
pub struct CaptureSession<S: FrameSource> {
    source: Option<S>,
}

impl<S: FrameSource> CaptureSession<S> {
    /// Take ownership of an opened handle.
    pub fn new(source: S) -> Self {
        Self {
            source: Some(source),
        }
    }

    pub fn is_open(&self) -> bool {
        self.source.as_ref().map(S::is_open).unwrap_or(false)
    }

    /// Read the next frame.
    ///
    /// A released session behaves like an exhausted stream.
    pub fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        match &mut self.source {
            Some(source) => source.read_frame(),
            None => Ok(None),
        }
    }

    /// Release the handle. Subsequent calls do nothing.
    pub fn release(&mut self) {
        if let Some(mut source) = self.source.take() {
            debug!("Releasing capture source");
            source.release();
        }
    }
}

impl<S: FrameSource> Drop for CaptureSession<S> {
    fn drop(&mut self) {
        self.release();
    }
}
