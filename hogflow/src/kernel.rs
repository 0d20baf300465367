//! # Numerical kernels
//!
//! Gradient histograms and dense flow are computed by external kernels. This crate only relies on
//! the layout of their output.

use crate::descriptor::HogParams;
use crate::flow_field::FlowField;
use crate::frame::{GrayImage, RgbImage};
use anyhow::Result;

/// Computes HOG descriptors.
pub trait GradientHistogramKernel {
    /// Compute the descriptor of a single window.
    ///
    /// `frame` is already resized to `params.win_size`. The returned vector is expected to be
    /// `params.descriptor_len()` long, ordered block column, block row, cell, bin.
    fn compute(&mut self, frame: &RgbImage, params: &HogParams) -> Result<Vec<f32>>;
}

/// Computes dense optical flow between two frames.
pub trait DenseFlowKernel {
    /// Compute per-pixel flow from `prev` to `next`.
    ///
    /// Both frames have identical dimensions, and so must the returned field.
    fn compute(
        &mut self,
        prev: &GrayImage,
        next: &GrayImage,
        params: &FarnebackParams,
    ) -> Result<FlowField>;
}

/// Parameters of polynomial expansion based dense flow.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct FarnebackParams {
    /// Image scale between pyramid layers, `< 1`.
    pub pyr_scale: f64,
    /// Number of pyramid layers, including the initial image.
    pub levels: i32,
    /// Averaging window size.
    pub winsize: i32,
    /// Iterations at each pyramid level.
    pub iterations: i32,
    /// Pixel neighbourhood used for polynomial expansion.
    pub poly_n: i32,
    /// Gaussian standard deviation used to smooth derivatives for the expansion.
    pub poly_sigma: f64,
    pub flags: i32,
}

impl Default for FarnebackParams {
    fn default() -> Self {
        Self {
            pyr_scale: 0.5,
            levels: 3,
            winsize: 15,
            iterations: 3,
            poly_n: 5,
            poly_sigma: 1.2,
            flags: 0,
        }
    }
}
