//! # Frame processors
//!
//! A frame processor turns a frame into a descriptor and an annotated copy of the frame. The
//! playback loop only sees the [`FrameProcessor`] trait.

use crate::descriptor::{CellGrid, HogParams};
use crate::error::Error;
use crate::flow_field::FlowField;
use crate::frame::{self, GrayImage, RgbImage};
use crate::kernel::{DenseFlowKernel, FarnebackParams, GradientHistogramKernel};
use crate::render::HistogramRenderer;
use anyhow::Result;

/// Output of a single `compute` call.
#[derive(Clone, Debug, PartialEq)]
pub enum Descriptor {
    Hog(Vec<f32>),
    Flow(FlowField),
    /// Nothing was computed for this frame.
    None,
}

impl Descriptor {
    /// Number of scalar values in the descriptor.
    pub fn len(&self) -> usize {
        match self {
            Self::Hog(h) => h.len(),
            Self::Flow(f) => f.as_slice().len(),
            Self::None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Generic frame processor.
pub trait FrameProcessor {
    /// Set the frame to be processed next.
    fn set_input(&mut self, frame: &RgbImage);

    /// Compute the descriptor of the current input.
    fn compute(&mut self) -> Result<Descriptor>;

    /// Draw the last computed descriptor over a copy of the input.
    ///
    /// # Arguments
    ///
    /// * `skip_every` - draw only every n-th descriptor position along each axis.
    fn visualize(&self, skip_every: usize) -> Result<RgbImage>;
}

impl<T: FrameProcessor + ?Sized> FrameProcessor for Box<T> {
    fn set_input(&mut self, frame: &RgbImage) {
        (**self).set_input(frame)
    }

    fn compute(&mut self) -> Result<Descriptor> {
        (**self).compute()
    }

    fn visualize(&self, skip_every: usize) -> Result<RgbImage> {
        (**self).visualize(skip_every)
    }
}

/// Histogram of oriented gradients processor.
pub struct HogProcessor<K> {
    kernel: K,
    params: HogParams,
    renderer: HistogramRenderer,
    img: Option<RgbImage>,
    descriptor: Option<Vec<f32>>,
}

impl<K: GradientHistogramKernel> HogProcessor<K> {
    /// Create a new HOG processor.
    ///
    /// # Arguments
    ///
    /// * `kernel` - kernel computing the raw descriptor.
    /// * `params` - HOG geometry. Input frames are resized to `params.win_size`.
    pub fn new(kernel: K, params: HogParams) -> Result<Self> {
        params.validate()?;

        Ok(Self {
            kernel,
            params,
            renderer: HistogramRenderer::new(params.nbins, params.signed_gradient),
            img: None,
            descriptor: None,
        })
    }

    /// Replace the histogram renderer.
    pub fn with_renderer(mut self, renderer: HistogramRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn params(&self) -> &HogParams {
        &self.params
    }

    /// Last computed descriptor.
    pub fn descriptor(&self) -> Option<&[f32]> {
        self.descriptor.as_deref()
    }

    /// Aggregated grid of the last computed descriptor.
    pub fn grid(&self) -> Result<CellGrid> {
        let descriptor = self.descriptor.as_ref().ok_or(Error::NoDescriptorComputed)?;
        CellGrid::reconstruct(descriptor, &self.params)
    }
}

impl<K: GradientHistogramKernel> FrameProcessor for HogProcessor<K> {
    fn set_input(&mut self, frame: &RgbImage) {
        self.img = Some(frame.clone());
        self.descriptor = None;
    }

    fn compute(&mut self) -> Result<Descriptor> {
        let img = self.img.as_ref().ok_or(Error::NoImageSet)?;

        let (w, h) = self.params.win_size;
        let img = frame::resize(img, w as u32, h as u32);

        let descriptor = self.kernel.compute(&img, &self.params)?;

        let expected = self.params.descriptor_len();
        if descriptor.len() != expected {
            return Err(Error::ShapeMismatch {
                expected,
                actual: descriptor.len(),
            }
            .into());
        }

        self.img = Some(img);
        self.descriptor = Some(descriptor.clone());

        Ok(Descriptor::Hog(descriptor))
    }

    fn visualize(&self, skip_every: usize) -> Result<RgbImage> {
        if skip_every == 0 {
            return Err(Error::InvalidGeometry("skip_every must be non-zero".into()).into());
        }

        let grid = self.grid()?;
        let mut out = self.img.clone().ok_or(Error::NoImageSet)?;

        let (cols, rows) = grid.dim();

        for y in (0..rows).step_by(skip_every) {
            for x in (0..cols).step_by(skip_every) {
                self.renderer.render(&mut out, grid.center(x, y), grid.get(x, y))?;
            }
        }

        Ok(out)
    }
}

/// How flow is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub enum FlowView {
    /// Arrows sampled every `step` pixels over the input frame.
    Arrows { step: usize },
    /// Direction as hue, magnitude as brightness.
    Color,
    /// Arrows and colour next to each other.
    SideBySide { step: usize },
}

impl Default for FlowView {
    fn default() -> Self {
        Self::Arrows { step: 16 }
    }
}

/// Dense optical flow processor.
///
/// Flow is computed between the previous and the current input. Only the previous frame is kept.
pub struct FlowProcessor<K> {
    kernel: K,
    params: FarnebackParams,
    view: FlowView,
    frame: Option<RgbImage>,
    gray: Option<GrayImage>,
    old_gray: Option<GrayImage>,
    flow: Option<FlowField>,
}

impl<K: DenseFlowKernel> FlowProcessor<K> {
    pub fn new(kernel: K, params: FarnebackParams, view: FlowView) -> Self {
        Self {
            kernel,
            params,
            view,
            frame: None,
            gray: None,
            old_gray: None,
            flow: None,
        }
    }

    /// Last computed flow field.
    pub fn flow(&self) -> Option<&FlowField> {
        self.flow.as_ref()
    }

    /// Compute flow between two single channel frames.
    pub fn compute_pair(&mut self, prev: &GrayImage, next: &GrayImage) -> Result<&FlowField> {
        if prev.dimensions() != next.dimensions() {
            return Err(Error::FrameSizeMismatch(prev.dimensions(), next.dimensions()).into());
        }

        let flow = self.kernel.compute(prev, next, &self.params)?;

        let (w, h) = next.dimensions();
        if flow.dim() != (w as usize, h as usize) {
            return Err(Error::ShapeMismatch {
                expected: (w * h) as usize,
                actual: flow.size(),
            }
            .into());
        }

        Ok(self.flow.insert(flow))
    }
}

impl<K: DenseFlowKernel> FrameProcessor for FlowProcessor<K> {
    fn set_input(&mut self, frame: &RgbImage) {
        self.old_gray = self.gray.replace(frame::to_gray(frame));
        self.frame = Some(frame.clone());
        self.flow = None;
    }

    fn compute(&mut self) -> Result<Descriptor> {
        let gray = self.gray.take().ok_or(Error::NoImageSet)?;

        let ret = match self.old_gray.take() {
            Some(old_gray) => {
                let ret = self.compute_pair(&old_gray, &gray).map(|f| f.clone());
                self.old_gray = Some(old_gray);
                ret.map(Descriptor::Flow)
            }
            None => Ok(Descriptor::None),
        };

        self.gray = Some(gray);

        ret
    }

    fn visualize(&self, _skip_every: usize) -> Result<RgbImage> {
        let frame = self.frame.as_ref().ok_or(Error::NoImageSet)?;

        match (&self.flow, self.view) {
            (None, _) => Ok(frame.clone()),
            (Some(flow), FlowView::Arrows { step }) => flow.draw_arrows(frame, step),
            (Some(flow), FlowView::Color) => Ok(flow.to_color_field()),
            (Some(flow), FlowView::SideBySide { step }) => flow.side_by_side(frame, step),
        }
    }
}

/// Processor that computes nothing and displays frames unchanged.
#[derive(Default)]
pub struct PassThrough {
    frame: Option<RgbImage>,
}

impl FrameProcessor for PassThrough {
    fn set_input(&mut self, frame: &RgbImage) {
        self.frame = Some(frame.clone());
    }

    fn compute(&mut self) -> Result<Descriptor> {
        self.frame
            .as_ref()
            .map(|_| Descriptor::None)
            .ok_or_else(|| Error::NoImageSet.into())
    }

    fn visualize(&self, _skip_every: usize) -> Result<RgbImage> {
        self.frame.clone().ok_or_else(|| Error::NoImageSet.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::HOG_COLOR;
    use assert_approx_eq::assert_approx_eq;
    use image::Rgb;
    use nalgebra as na;

    /// Unsigned gradient histograms laid out like a block based HOG kernel, without block
    /// normalization.
    struct GradientKernel;

    impl GradientHistogramKernel for GradientKernel {
        fn compute(&mut self, frame: &RgbImage, params: &HogParams) -> Result<Vec<f32>> {
            let gray = frame::to_gray(frame);
            let (w, h) = gray.dimensions();
            let at = |x: i64, y: i64| {
                let x = x.clamp(0, w as i64 - 1) as u32;
                let y = y.clamp(0, h as i64 - 1) as u32;
                gray.get_pixel(x, y)[0] as f32
            };

            let cell_hist = |cx: usize, cy: usize| {
                let mut hist = vec![0f32; params.nbins];
                for y in cy * params.cell_size.1..(cy + 1) * params.cell_size.1 {
                    for x in cx * params.cell_size.0..(cx + 1) * params.cell_size.0 {
                        let (x, y) = (x as i64, y as i64);
                        let gx = at(x + 1, y) - at(x - 1, y);
                        let gy = at(x, y + 1) - at(x, y - 1);
                        let mag = (gx * gx + gy * gy).sqrt();
                        let angle = gy.atan2(gx).to_degrees().rem_euclid(180.0);
                        let bin = (angle / params.bin_width()) as usize % params.nbins;
                        hist[bin] += mag;
                    }
                }
                hist
            };

            let (bx, by) = params.blocks_per_window();
            let (kx, ky) = params.cells_per_block();
            let step = (
                params.block_stride.0 / params.cell_size.0,
                params.block_stride.1 / params.cell_size.1,
            );

            let mut out = vec![];
            for x in 0..bx {
                for y in 0..by {
                    for i in 0..kx {
                        for j in 0..ky {
                            out.extend(cell_hist(x * step.0 + i, y * step.1 + j));
                        }
                    }
                }
            }

            Ok(out)
        }
    }

    /// Returns a fixed descriptor regardless of input.
    struct FixedKernel(Vec<f32>);

    impl GradientHistogramKernel for FixedKernel {
        fn compute(&mut self, _: &RgbImage, _: &HogParams) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    /// Returns a constant flow field of the input size.
    struct ConstantFlow(na::Vector2<f32>);

    impl DenseFlowKernel for ConstantFlow {
        fn compute(
            &mut self,
            _: &GrayImage,
            next: &GrayImage,
            _: &FarnebackParams,
        ) -> Result<FlowField> {
            let (w, h) = next.dimensions();
            let mut field = FlowField::new(w as usize, h as usize);
            for y in 0..h as usize {
                for x in 0..w as usize {
                    field.set_flow(x, y, self.0);
                }
            }
            Ok(field)
        }
    }

    #[test]
    fn hog_flat_frame_is_all_zero() {
        let params = HogParams::default();
        let mut hog = HogProcessor::new(GradientKernel, params).unwrap();

        hog.set_input(&RgbImage::from_pixel(224, 320, Rgb([90, 140, 30])));
        let descriptor = hog.compute().unwrap();

        assert_eq!(descriptor.len(), 8892);
        assert_eq!(
            descriptor.len(),
            (224 / 16 - 1) * (320 / 16 - 1) * 4 * 9
        );

        let grid = hog.grid().unwrap();
        assert_eq!(grid.dim(), (13, 19));
        assert!(grid.iter().all(|(_, _, h)| h.iter().all(|&v| v == 0.0)));

        // Nothing rises above the noise floor, the overlay is the plain frame.
        let vis = hog.visualize(1).unwrap();
        assert!(vis.pixels().all(|p| *p == Rgb([90, 140, 30])));
    }

    #[test]
    fn hog_resizes_to_window() {
        let mut hog = HogProcessor::new(GradientKernel, HogParams::default()).unwrap();
        hog.set_input(&RgbImage::new(480, 480));
        hog.compute().unwrap();
        assert_eq!(hog.visualize(2).unwrap().dimensions(), (224, 320));
    }

    #[test]
    fn hog_vertical_edge() {
        let params = HogParams::default();
        let mut hog = HogProcessor::new(GradientKernel, params).unwrap();

        let mut img = RgbImage::new(224, 320);
        for (x, _, px) in img.enumerate_pixels_mut() {
            if x >= 112 {
                *px = Rgb([255, 255, 255]);
            }
        }

        hog.set_input(&img);
        hog.compute().unwrap();
        let grid = hog.grid().unwrap();

        // Blocks spanning x = 96..128 straddle the edge, the gradient points along +x.
        let hist = grid.get(6, 9);
        assert_approx_eq!(hist.iter().sum::<f32>(), 1.0, 1e-5);
        assert_approx_eq!(hist[0], 1.0, 1e-5);

        assert!(grid.get(0, 9).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn hog_call_order() {
        let mut hog = HogProcessor::new(GradientKernel, HogParams::default()).unwrap();

        let err = hog.compute().unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::NoImageSet));

        hog.set_input(&RgbImage::new(224, 320));
        let err = hog.visualize(1).unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::NoDescriptorComputed));

        hog.compute().unwrap();
        assert!(hog.visualize(1).is_ok());

        // New input invalidates the old descriptor.
        hog.set_input(&RgbImage::new(224, 320));
        assert!(hog.visualize(1).is_err());
    }

    #[test]
    fn hog_rejects_wrong_kernel_output() {
        let kernel = FixedKernel(vec![0.0; 100]);
        let mut hog = HogProcessor::new(kernel, HogParams::default()).unwrap();
        hog.set_input(&RgbImage::new(224, 320));

        let err = hog.compute().unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::ShapeMismatch {
                expected: 8892,
                actual: 100
            })
        );
        assert!(hog.descriptor().is_none());
    }

    #[test]
    fn hog_skip_every() {
        let params = HogParams::default();
        let kernel = FixedKernel(vec![1.0; params.descriptor_len()]);
        let mut hog = HogProcessor::new(kernel, params).unwrap();

        hog.set_input(&RgbImage::new(224, 320));
        hog.compute().unwrap();

        let all = hog.visualize(1).unwrap();
        let sparse = hog.visualize(2).unwrap();

        assert_eq!(*all.get_pixel(16, 16), HOG_COLOR);
        assert_eq!(*all.get_pixel(32, 16), HOG_COLOR);
        assert_eq!(*sparse.get_pixel(16, 16), HOG_COLOR);
        assert_eq!(*sparse.get_pixel(48, 16), HOG_COLOR);
        assert_eq!(*sparse.get_pixel(32, 16), Rgb([0, 0, 0]));

        assert!(hog.visualize(0).is_err());
    }

    #[test]
    fn flow_needs_two_frames() {
        let mut flow = FlowProcessor::new(
            ConstantFlow(na::Vector2::new(3.0, 0.0)),
            Default::default(),
            FlowView::Arrows { step: 16 },
        );

        let frame = RgbImage::new(64, 48);

        flow.set_input(&frame);
        assert_eq!(flow.compute().unwrap(), Descriptor::None);
        assert_eq!(flow.visualize(1).unwrap(), frame);

        flow.set_input(&frame);
        let descriptor = flow.compute().unwrap();
        assert_eq!(descriptor.len(), 64 * 48 * 2);

        let field = flow.flow().unwrap();
        assert_eq!(field.get_flow(8, 8), na::Vector2::new(3.0, 0.0));

        let vis = flow.visualize(1).unwrap();
        assert_eq!(*vis.get_pixel(11, 8), Rgb([0, 255, 0]));
    }

    #[test]
    fn flow_views() {
        let frame = RgbImage::new(32, 32);

        for (view, dim) in [
            (FlowView::Arrows { step: 8 }, (32, 32)),
            (FlowView::Color, (32, 32)),
            (FlowView::SideBySide { step: 8 }, (64, 32)),
        ] {
            let mut flow = FlowProcessor::new(
                ConstantFlow(na::Vector2::new(1.0, 1.0)),
                Default::default(),
                view,
            );
            flow.set_input(&frame);
            flow.compute().unwrap();
            flow.set_input(&frame);
            flow.compute().unwrap();

            assert_eq!(flow.visualize(1).unwrap().dimensions(), dim);
        }
    }

    #[test]
    fn flow_frame_size_mismatch() {
        let mut flow = FlowProcessor::new(
            ConstantFlow(na::Vector2::zeros()),
            Default::default(),
            FlowView::Color,
        );

        let err = flow
            .compute_pair(&GrayImage::new(10, 10), &GrayImage::new(12, 10))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::FrameSizeMismatch((10, 10), (12, 10)))
        );

        flow.set_input(&RgbImage::new(10, 10));
        flow.compute().unwrap();
        flow.set_input(&RgbImage::new(12, 10));
        assert!(flow.compute().is_err());

        let mut fresh = FlowProcessor::new(
            ConstantFlow(na::Vector2::zeros()),
            Default::default(),
            FlowView::Color,
        );
        let err = fresh.compute().unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::NoImageSet));
    }

    #[test]
    fn pass_through() {
        let mut p = PassThrough::default();
        assert!(p.compute().is_err());
        assert!(p.visualize(1).is_err());

        let frame = RgbImage::from_pixel(3, 3, Rgb([1, 2, 3]));
        p.set_input(&frame);
        assert_eq!(p.compute().unwrap(), Descriptor::None);
        assert_eq!(p.visualize(1).unwrap(), frame);
    }
}
