//! # HOG and Optical Flow Visualisation Library
//!
//! This library interprets dense descriptors computed over video frames and renders them as
//! overlays. Two descriptor kinds are supported: histograms of oriented gradients laid out in
//! overlapping strided blocks, and dense per-pixel optical flow fields.
//!
//! The numerical kernels, video capture and on-screen display are collaborators, accessed through
//! the traits in [`kernel`], [`capture`] and [`display`].
//!
//! The easiest way to use the library is to import its prelude:
//!
//! ```
//! use hogflow::prelude::v1::*;
//! ```

pub mod capture;
pub mod config;
pub mod descriptor;
pub mod display;
pub mod error;
pub mod flow_field;
pub mod frame;
pub mod geometry;
pub mod kernel;
pub mod playback;
pub mod processor;
pub mod render;

pub mod prelude {
    pub mod v1 {
        pub use crate::{
            capture::{CaptureSession, CaptureTarget, FrameSource, SourceOpener},
            config::{PlayerConfig, ProcessorMode},
            descriptor::{CellGrid, HogParams},
            display::Display,
            error::Error as HogflowError,
            flow_field::FlowField,
            frame::{GrayImage, RgbImage},
            geometry::GeometryCorrector,
            kernel::{DenseFlowKernel, FarnebackParams, GradientHistogramKernel},
            playback::{PlaybackLoop, PlaybackOutcome, PlaybackState, PlaybackSummary},
            processor::{
                Descriptor, FlowProcessor, FlowView, FrameProcessor, HogProcessor, PassThrough,
            },
            render::HistogramRenderer,
        };
        pub use anyhow::{anyhow, Error, Result};
    }
}
