//! OpenCV implementations of hogflow collaborators.
//!
//! Frames cross the boundary as `image` buffers. OpenCV matrices are BGR, so channels are swapped
//! on every conversion.

use hogflow::prelude::v1::{Result, *};
use log::*;
use opencv::core::{Mat, Point, Point2f, Scalar, Size, Vec3b, Vector, CV_8UC1, CV_8UC3};
use opencv::objdetect::{HOGDescriptor, HOGDescriptor_HistogramNormType};
use opencv::prelude::*;
use opencv::videoio::*;
use opencv::{highgui, video};

/// Convert an RGB frame to a BGR matrix.
pub fn rgb_to_mat(frame: &RgbImage) -> Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(
        frame.height() as _,
        frame.width() as _,
        CV_8UC3,
        Scalar::all(0.0),
    )?;

    for (x, y, px) in frame.enumerate_pixels() {
        let [r, g, b] = px.0;
        let bgr = mat.at_2d_mut::<Vec3b>(y as _, x as _)?;
        bgr[0] = b;
        bgr[1] = g;
        bgr[2] = r;
    }

    Ok(mat)
}

/// Convert a BGR matrix to an RGB frame.
pub fn mat_to_rgb(mat: &Mat) -> Result<RgbImage> {
    let mut frame = RgbImage::new(mat.cols() as _, mat.rows() as _);

    for (x, y, px) in frame.enumerate_pixels_mut() {
        let bgr: &Vec3b = mat.at_2d(y as _, x as _)?;
        px.0 = [bgr[2], bgr[1], bgr[0]];
    }

    Ok(frame)
}

fn gray_to_mat(frame: &GrayImage) -> Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(
        frame.height() as _,
        frame.width() as _,
        CV_8UC1,
        Scalar::all(0.0),
    )?;

    for (x, y, px) in frame.enumerate_pixels() {
        *mat.at_2d_mut::<u8>(y as _, x as _)? = px.0[0];
    }

    Ok(mat)
}

fn size((width, height): (usize, usize)) -> Size {
    Size::new(width as _, height as _)
}

/// Video file or device opened through `VideoCapture`.
pub struct CvCapture {
    capture: VideoCapture,
    frame: Mat,
}

impl CvCapture {
    /// Open a video file, or a camera when `path` is a device index.
    pub fn open(path: &str) -> Result<Self> {
        let capture = match CaptureTarget::parse(path) {
            CaptureTarget::Device(index) => VideoCapture::new(index, CAP_ANY)?,
            CaptureTarget::File(file) => VideoCapture::from_file(file, CAP_ANY)?,
        };

        if let Ok(fps) = capture.get(CAP_PROP_FPS) {
            debug!("Opened {path} at {fps} fps");
        }

        Ok(Self {
            capture,
            frame: Default::default(),
        })
    }
}

impl FrameSource for CvCapture {
    fn is_open(&self) -> bool {
        self.capture.is_opened().unwrap_or(false)
    }

    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        if !self.capture.read(&mut self.frame)? || self.frame.empty()? {
            return Ok(None);
        }

        mat_to_rgb(&self.frame).map(Some)
    }

    fn release(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("Failed to release capture: {e}");
        }
    }
}

/// HighGUI window.
///
/// All windows are destroyed when this is dropped.
pub struct HighGui {
    window: String,
}

impl HighGui {
    pub fn new(window: &str) -> Result<Self> {
        highgui::named_window(window, highgui::WINDOW_AUTOSIZE)?;
        Ok(Self {
            window: window.into(),
        })
    }
}

impl Display for HighGui {
    fn show(&mut self, frame: &RgbImage) -> Result<()> {
        highgui::imshow(&self.window, &rgb_to_mat(frame)?)?;
        Ok(())
    }

    fn poll_key(&mut self, timeout_ms: i32) -> Result<Option<i32>> {
        let key = highgui::wait_key(timeout_ms)?;
        Ok(Some(key).filter(|&k| k >= 0))
    }
}

impl Drop for HighGui {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_all_windows() {
            warn!("Failed to destroy windows: {e}");
        }
    }
}

/// HOG descriptors through `HOGDescriptor`.
///
/// The descriptor object is rebuilt whenever the parameters change.
pub struct CvHog {
    params: Option<HogParams>,
    hog: HOGDescriptor,
}

impl CvHog {
    pub fn new() -> Result<Self> {
        Ok(Self {
            params: None,
            hog: HOGDescriptor::default()?,
        })
    }

    fn configure(&mut self, params: &HogParams) -> Result<()> {
        if self.params.as_ref() == Some(params) {
            return Ok(());
        }

        debug!("Creating HOG descriptor for {params:?}");

        self.hog = HOGDescriptor::new(
            size(params.win_size),
            size(params.block_size),
            size(params.block_stride),
            size(params.cell_size),
            params.nbins as _,
            1,
            -1.0,
            HOGDescriptor_HistogramNormType::L2Hys,
            0.2,
            false,
            // Default number of detection window increases.
            64,
            params.signed_gradient,
        )?;
        self.params = Some(*params);

        Ok(())
    }
}

impl GradientHistogramKernel for CvHog {
    fn compute(&mut self, frame: &RgbImage, params: &HogParams) -> Result<Vec<f32>> {
        let mat = rgb_to_mat(frame)?;
        self.configure(params)?;

        let mut descriptors = Vector::<f32>::new();
        self.hog.compute(
            &mat,
            &mut descriptors,
            Size::default(),
            Size::default(),
            &Vector::<Point>::new(),
        )?;

        Ok(descriptors.to_vec())
    }
}

/// Farneback dense optical flow.
#[derive(Default)]
pub struct CvFarneback {
    flow: Mat,
}

impl DenseFlowKernel for CvFarneback {
    fn compute(
        &mut self,
        prev: &GrayImage,
        next: &GrayImage,
        params: &FarnebackParams,
    ) -> Result<FlowField> {
        let (prev, next) = (gray_to_mat(prev)?, gray_to_mat(next)?);

        video::calc_optical_flow_farneback(
            &prev,
            &next,
            &mut self.flow,
            params.pyr_scale,
            params.levels,
            params.winsize,
            params.iterations,
            params.poly_n,
            params.poly_sigma,
            params.flags,
        )?;

        let (width, height) = (self.flow.cols() as usize, self.flow.rows() as usize);
        let mut field = FlowField::new(width, height);

        for y in 0..height {
            for x in 0..width {
                let dir: &Point2f = self.flow.at_2d(y as _, x as _)?;
                field.set_flow(x, y, [dir.x, dir.y].into());
            }
        }

        Ok(field)
    }
}
