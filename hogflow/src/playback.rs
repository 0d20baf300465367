//! # Video playback loop
//!
//! Drives capture, geometry correction, processing and display, one frame at a time.

use crate::capture::{CaptureSession, FrameSource, SourceOpener};
use crate::config::PlayerConfig;
use crate::display::Display;
use crate::error::Error;
use crate::geometry::GeometryCorrector;
use crate::processor::FrameProcessor;
use anyhow::Result;
use log::*;

/// Lifecycle of a playback loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    /// Not started yet.
    Idle,
    Opening,
    Playing,
    /// The stream ran out of frames.
    Ended,
    /// The quit key was pressed.
    UserQuit,
    /// The capture source could not be opened.
    OpenFailed,
    /// Playback stopped on an error.
    Failed,
}

/// How a successful playback run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Ended,
    UserQuit,
}

impl From<PlaybackOutcome> for PlaybackState {
    fn from(outcome: PlaybackOutcome) -> Self {
        match outcome {
            PlaybackOutcome::Ended => Self::Ended,
            PlaybackOutcome::UserQuit => Self::UserQuit,
        }
    }
}

/// Result of a playback run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackSummary {
    pub outcome: PlaybackOutcome,
    /// Number of frames that were processed and displayed.
    pub frames: usize,
}

/// Single threaded video player.
pub struct PlaybackLoop<P, D> {
    input: Option<String>,
    processor: P,
    display: D,
    corrector: GeometryCorrector,
    skip_every: usize,
    quit_key: char,
    key_wait_ms: i32,
    state: PlaybackState,
}

impl<P: FrameProcessor, D: Display> PlaybackLoop<P, D> {
    /// Create a new playback loop without an input.
    pub fn new(processor: P, display: D) -> Self {
        Self {
            input: None,
            processor,
            display,
            corrector: Default::default(),
            skip_every: 1,
            quit_key: 'q',
            key_wait_ms: 1,
            state: PlaybackState::Idle,
        }
    }

    /// Create a playback loop with input, geometry and display settings from `config`.
    pub fn from_config(config: &PlayerConfig, processor: P, display: D) -> Self {
        let mut this = Self::new(processor, display)
            .with_corrector(GeometryCorrector::new(config.prescale))
            .with_skip_every(config.skip_every)
            .with_quit_key(config.quit_key)
            .with_key_wait(config.key_wait_ms);
        this.set_input(config.input.clone());
        this
    }

    pub fn with_corrector(mut self, corrector: GeometryCorrector) -> Self {
        self.corrector = corrector;
        self
    }

    pub fn with_skip_every(mut self, skip_every: usize) -> Self {
        self.skip_every = skip_every;
        self
    }

    pub fn with_quit_key(mut self, quit_key: char) -> Self {
        self.quit_key = quit_key;
        self
    }

    pub fn with_key_wait(mut self, key_wait_ms: i32) -> Self {
        self.key_wait_ms = key_wait_ms;
        self
    }

    /// Set path to the video file or device to play.
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = Some(input.into());
    }

    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }

    /// Swap the frame processor, returning the previous one.
    pub fn set_processor(&mut self, processor: P) -> P {
        std::mem::replace(&mut self.processor, processor)
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Play the input until it ends, the user quits, or an error occurs.
    ///
    /// The capture source is opened through `opener` and released before this function returns,
    /// on every path.
    pub fn run<O: SourceOpener>(&mut self, opener: &mut O) -> Result<PlaybackSummary> {
        let path = match &self.input {
            Some(path) => path.clone(),
            None => return Err(Error::NoInputPath.into()),
        };

        self.state = PlaybackState::Opening;
        info!("Opening {path}");

        let source = match opener.open(&path) {
            Ok(source) => source,
            Err(e) => {
                warn!("Could not open {path}: {e}");
                self.state = PlaybackState::OpenFailed;
                return Err(e.context(Error::OpenFailed(path)));
            }
        };

        let mut session = CaptureSession::new(source);

        if !session.is_open() {
            warn!("Capture source at {path} is not open");
            self.state = PlaybackState::OpenFailed;
            session.release();
            return Err(Error::OpenFailed(path).into());
        }

        self.state = PlaybackState::Playing;

        let ret = self.play(&mut session);
        session.release();

        match &ret {
            Ok(summary) => {
                info!("Playback stopped: {:?} after {} frames", summary.outcome, summary.frames);
                self.state = summary.outcome.into();
            }
            Err(e) => {
                error!("Playback failed: {e}");
                self.state = PlaybackState::Failed;
            }
        }

        ret
    }

    fn play<S: FrameSource>(&mut self, session: &mut CaptureSession<S>) -> Result<PlaybackSummary> {
        let mut frames = 0;

        let outcome = loop {
            if !session.is_open() {
                break PlaybackOutcome::Ended;
            }

            let frame = match session.read_frame()? {
                Some(frame) => frame,
                None => {
                    info!("Reached end of stream");
                    break PlaybackOutcome::Ended;
                }
            };

            let frame = self.corrector.correct(&frame);

            self.processor.set_input(&frame);
            let descriptor = self.processor.compute()?;
            let vis = self.processor.visualize(self.skip_every)?;

            debug!(
                "Frame {frames}: {}x{}, {} descriptor values",
                frame.width(),
                frame.height(),
                descriptor.len()
            );

            self.display.show(&vis)?;
            frames += 1;

            if let Some(key) = self.display.poll_key(self.key_wait_ms)? {
                if key & 0xff == self.quit_key as i32 {
                    info!("User quit playback");
                    break PlaybackOutcome::UserQuit;
                }
            }
        };

        Ok(PlaybackSummary { outcome, frames })
    }
}
