//! # Frame geometry correction
//!
//! Raw captures arrive rotated by a quarter turn. Rotating a landscape frame in place leaves black
//! bands on both sides, which are cropped off using the same transform that moves the pixels.

use crate::frame::{self, RgbImage};
use image::{ImageBuffer, Pixel};
use nalgebra as na;
use std::ops::Range;

/// Rotates frames clockwise by 90 degrees and crops the empty border.
#[derive(Clone, Copy, Debug)]
pub struct GeometryCorrector {
    prescale: f32,
}

impl Default for GeometryCorrector {
    fn default() -> Self {
        Self { prescale: 1.0 }
    }
}

impl GeometryCorrector {
    /// Create a new corrector.
    ///
    /// # Arguments
    ///
    /// * `prescale` - resize factor applied before rotating.
    pub fn new(prescale: f32) -> Self {
        Self { prescale }
    }

    pub fn prescale(&self) -> f32 {
        self.prescale
    }

    /// Rotation matrix for a frame of the given size.
    ///
    /// Rotates clockwise (in image coordinates, y pointing down) around the centre of the frame's
    /// pixel grid, `((W - 1) / 2, (H - 1) / 2)`. Maps source pixel coordinates to destination
    /// pixel coordinates.
    pub fn transform(width: u32, height: u32) -> na::Matrix2x3<f64> {
        let (cx, cy) = ((width as f64 - 1.0) / 2.0, (height as f64 - 1.0) / 2.0);
        let (sin, cos) = (-90f64).to_radians().sin_cos();

        na::Matrix2x3::new(
            cos,
            sin,
            (1.0 - cos) * cx - sin * cy,
            -sin,
            cos,
            sin * cx + (1.0 - cos) * cy,
        )
    }

    /// Apply an affine transform to a point.
    pub fn apply(m: &na::Matrix2x3<f64>, p: na::Point2<f64>) -> na::Point2<f64> {
        (m * na::Vector3::new(p.x, p.y, 1.0)).into()
    }

    /// Columns of the rotated frame that carry image content.
    ///
    /// The bottom-left pixel is pushed through `m`; its new x coordinate is where content starts.
    /// The rotation is centred, so content ends the same distance from the right edge.
    pub fn crop_columns(m: &na::Matrix2x3<f64>, width: u32, height: u32) -> Range<u32> {
        let bl = Self::apply(m, na::Point2::new(0.0, height as f64 - 1.0));
        let left = (bl.x.round().max(0.0) as u32).min(width / 2);
        left..width - left
    }

    /// Rotate and crop a frame.
    pub fn correct(&self, input: &RgbImage) -> RgbImage {
        let scaled;
        let input = if (self.prescale - 1.0).abs() > f32::EPSILON {
            let w = ((input.width() as f32 * self.prescale).round() as u32).max(1);
            let h = ((input.height() as f32 * self.prescale).round() as u32).max(1);
            scaled = frame::resize(input, w, h);
            &scaled
        } else {
            input
        };

        let (width, height) = input.dimensions();
        let m = Self::transform(width, height);

        let cols = Self::crop_columns(&m, width, height);

        warp_affine(input, &m, cols)
    }
}

/// Warp an image with an affine transform, keeping only the destination columns in `cols`.
///
/// Every destination pixel is mapped back through the inverse transform and sampled at the
/// nearest source pixel. Destination pixels whose source falls outside the image are left zeroed.
pub fn warp_affine<P>(
    src: &ImageBuffer<P, Vec<P::Subpixel>>,
    m: &na::Matrix2x3<f64>,
    cols: Range<u32>,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + 'static,
{
    let (width, height) = src.dimensions();
    let mut out = ImageBuffer::new(cols.end - cols.start, height);

    #[rustfmt::skip]
    let full = na::Matrix3::new(
        m[(0, 0)], m[(0, 1)], m[(0, 2)],
        m[(1, 0)], m[(1, 1)], m[(1, 2)],
        0.0, 0.0, 1.0,
    );

    let inv = match full.try_inverse() {
        Some(inv) => inv,
        None => return out,
    };

    for (x, y, px) in out.enumerate_pixels_mut() {
        let dst = na::Vector3::new((x + cols.start) as f64, y as f64, 1.0);
        let s = inv * dst;
        let (sx, sy) = (s.x.round(), s.y.round());

        if sx >= 0.0 && sy >= 0.0 && sx < width as f64 && sy < height as f64 {
            *px = *src.get_pixel(sx as u32, sy as u32);
        }
    }

    out
}
