//! # Player configuration
//!
//! By default incoming frames are halved and rotated, and HOG histograms are drawn on every second
//! grid position.

use crate::descriptor::HogParams;
use crate::kernel::FarnebackParams;
use crate::processor::FlowView;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Default video played when no input is given.
pub const DEFAULT_INPUT: &str = "dataset/IMG_0687.MOV";

/// Which processor the player runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ProcessorMode {
    Hog,
    Flow,
    None,
}

impl FromStr for ProcessorMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hog" => Ok(Self::Hog),
            "flow" => Ok(Self::Flow),
            "none" => Ok(Self::None),
            _ => Err(anyhow!("unknown processor mode {s}")),
        }
    }
}

/// Complete player configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlayerConfig {
    /// Video file or device to play.
    pub input: String,
    /// Resize factor applied to frames before geometry correction.
    pub prescale: f32,
    pub mode: ProcessorMode,
    pub hog: HogParams,
    /// Render every n-th HOG grid position.
    pub skip_every: usize,
    /// Multiplier from normalized bin value to spoke half-length.
    pub hog_scale: f32,
    /// Normalized bin values at or below this are not drawn.
    pub hog_noise_floor: f32,
    pub flow: FarnebackParams,
    pub flow_view: FlowView,
    /// Key that stops playback.
    pub quit_key: char,
    /// Milliseconds to wait for a key press after each frame.
    pub key_wait_ms: i32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            input: DEFAULT_INPUT.into(),
            prescale: 0.5,
            mode: ProcessorMode::Hog,
            hog: HogParams {
                win_size: (384, 480),
                ..Default::default()
            },
            skip_every: 2,
            hog_scale: 50.0,
            hog_noise_floor: 0.1,
            flow: Default::default(),
            flow_view: Default::default(),
            quit_key: 'q',
            key_wait_ms: 1,
        }
    }
}

impl PlayerConfig {
    /// Check the configuration for values that can not work.
    pub fn validate(&self) -> Result<()> {
        if self.skip_every == 0 {
            return Err(anyhow!("skip_every must be at least 1"));
        }
        if !self.prescale.is_finite() || self.prescale <= 0.0 {
            return Err(anyhow!("prescale must be positive, got {}", self.prescale));
        }
        if !self.hog_scale.is_finite() || self.hog_scale <= 0.0 {
            return Err(anyhow!("hog_scale must be positive, got {}", self.hog_scale));
        }
        if !self.hog_noise_floor.is_finite() {
            return Err(anyhow!("hog_noise_floor must be finite"));
        }
        if let FlowView::Arrows { step: 0 } | FlowView::SideBySide { step: 0 } = self.flow_view {
            return Err(anyhow!("flow arrow step must be at least 1"));
        }
        if self.mode == ProcessorMode::Hog {
            self.hog.validate()?;
        }
        Ok(())
    }
}
