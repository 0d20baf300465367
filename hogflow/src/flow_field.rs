//! # Dense optical flow field

use crate::error::Error;
use crate::frame::{self, RgbImage, FLOW_COLOR};
use anyhow::Result;
use image::imageops;
use nalgebra::*;

/// Per-pixel optical flow field.
///
/// Holds one `(dx, dy)` displacement for every pixel of the frame pair it was computed from.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowField {
    vf: Matrix2xX<f32>,
    width: usize,
}

impl FlowField {
    /// Create a new, motionless flow field.
    ///
    /// # Arguments
    ///
    /// * `width` - width of the field.
    /// * `height` - height of the field.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            vf: Matrix2xX::repeat(width * height, 0f32),
            width,
        }
    }

    /// Create a flow field from interleaved `dx, dy` pairs in row-major order.
    ///
    /// This is the layout dense flow kernels typically output (2-channel float images).
    pub fn from_interleaved(width: usize, height: usize, data: &[f32]) -> Result<Self> {
        let expected = width * height * 2;
        if data.len() != expected {
            return Err(Error::ShapeMismatch {
                expected,
                actual: data.len(),
            }
            .into());
        }

        Ok(Self {
            vf: Matrix2xX::from_column_slice(data),
            width,
        })
    }

    /// Get width and height of the flow field.
    pub fn dim(&self) -> (usize, usize) {
        if self.width == 0 {
            (0, 0)
        } else {
            (self.width, self.vf.ncols() / self.width)
        }
    }

    /// Get size of the flow field.
    ///
    /// This is the same as `width * height`
    pub fn size(&self) -> usize {
        self.vf.ncols()
    }

    /// Get the flow field in row-major order.
    ///
    /// The elements returned are in the following order:
    ///
    /// `field[0,0].x, field[0,0].y, field[0,1].x, ... field[0,N].y, field[1,0].x, ... field[N,N].y`
    pub fn as_slice(&self) -> &[f32] {
        self.vf.as_slice()
    }

    /// Set flow at given position.
    pub fn set_flow(&mut self, x: usize, y: usize, flow: Vector2<f32>) {
        self.vf.set_column(self.width * y + x, &flow);
    }

    /// Get flow at coordinates.
    pub fn get_flow(&self, x: usize, y: usize) -> Vector2<f32> {
        self.vf.column(self.width * y + x).into()
    }

    /// Iterate every element of the flow field.
    ///
    /// The resulting iterator yields `(x, y, flow)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Vector2<f32>)> + '_ {
        let (width, height) = self.dim();
        (0..height).flat_map(move |y| (0..width).map(move |x| (x, y, self.get_flow(x, y))))
    }

    /// Sample flow arrows on a regular lattice.
    ///
    /// The lattice starts at `step / 2` on both axes and advances by `step`, in row-major order.
    /// Each entry is the lattice point and the point it is displaced to, rounded to the nearest
    /// pixel.
    pub fn sample_arrows(&self, step: usize) -> Result<Vec<(Point2<i32>, Point2<i32>)>> {
        if step == 0 {
            return Err(Error::InvalidGeometry("arrow step must be non-zero".into()).into());
        }

        let (width, height) = self.dim();

        Ok((step / 2..height)
            .step_by(step)
            .flat_map(|y| (step / 2..width).step_by(step).map(move |x| (x, y)))
            .map(|(x, y)| {
                let flow = self.get_flow(x, y);
                let end = Point2::new(
                    (x as f32 + flow.x + 0.5).floor() as i32,
                    (y as f32 + flow.y + 0.5).floor() as i32,
                );
                (Point2::new(x as i32, y as i32), end)
            })
            .collect())
    }

    /// Draw sampled flow arrows over a copy of `base`.
    ///
    /// Every arrow is a line from its lattice point to the displaced point, with a dot marking the
    /// lattice point.
    pub fn draw_arrows(&self, base: &RgbImage, step: usize) -> Result<RgbImage> {
        let mut out = base.clone();

        for (start, end) in self.sample_arrows(step)? {
            frame::draw_line(&mut out, start, end, FLOW_COLOR);
            frame::draw_dot(&mut out, start, 1, FLOW_COLOR);
        }

        Ok(out)
    }

    /// Render the field as a colour image.
    ///
    /// Direction maps to hue and magnitude maps to brightness, at full saturation. Magnitudes are
    /// min-max normalized over this field alone, so brightness is relative to the fastest motion in
    /// the frame and can not be compared between independently rendered fields. A field where
    /// every vector has the same magnitude renders black.
    pub fn to_color_field(&self) -> RgbImage {
        let (width, height) = self.dim();

        let polar = self
            .iter()
            .map(|(_, _, f)| {
                let angle = f.y.atan2(f.x).to_degrees().rem_euclid(360.0);
                (f.magnitude(), angle)
            })
            .collect::<Vec<_>>();

        let (min, max) = polar
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &(m, _)| {
                (lo.min(m), hi.max(m))
            });

        let range = max - min;
        let norm = if range > f32::EPSILON { 1.0 / range } else { 0.0 };

        let mut out = RgbImage::new(width as u32, height as u32);

        for (px, &(mag, angle)) in out.pixels_mut().zip(&polar) {
            *px = frame::hsv_to_rgb(angle, 1.0, (mag - min) * norm);
        }

        out
    }

    /// Draw arrows over `base` and place the colour rendering next to it.
    pub fn side_by_side(&self, base: &RgbImage, step: usize) -> Result<RgbImage> {
        let arrows = self.draw_arrows(base, step)?;
        let color = self.to_color_field();

        let mut out = RgbImage::new(
            arrows.width() + color.width(),
            arrows.height().max(color.height()),
        );
        imageops::replace(&mut out, &arrows, 0, 0);
        imageops::replace(&mut out, &color, arrows.width() as i64, 0);

        Ok(out)
    }
}
