//! # Histogram rendering

use crate::error::Error;
use crate::frame::{self, RgbImage, HOG_COLOR};
use anyhow::Result;
use image::Rgb;
use nalgebra as na;

/// Spoke offsets are clamped to this many pixels along each axis.
const MAX_SPOKE: f32 = i16::MAX as f32;

/// Draws orientation histograms as two-sided starbursts.
///
/// Every bin becomes one line through the centre, its half-length proportional to the bin value.
/// Orientation histograms do not distinguish `a` from `a + 180`, so the line extends equally in
/// both directions.
#[derive(Clone, Debug)]
pub struct HistogramRenderer {
    nbins: usize,
    bin_width: f32,
    /// Multiplier from bin value to spoke half-length in pixels.
    pub scale: f32,
    /// Bins at or below this value are not drawn.
    pub noise_floor: f32,
    pub color: Rgb<u8>,
}

impl HistogramRenderer {
    /// Create a new renderer.
    ///
    /// # Arguments
    ///
    /// * `nbins` - number of bins in the rendered histograms.
    /// * `signed` - whether bins span 360 degrees rather than 180.
    pub fn new(nbins: usize, signed: bool) -> Self {
        let range = if signed { 360.0 } else { 180.0 };
        Self {
            nbins,
            bin_width: range / nbins.max(1) as f32,
            scale: 50.0,
            noise_floor: 0.1,
            color: HOG_COLOR,
        }
    }

    /// Set the value to spoke length multiplier.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the denoising threshold.
    pub fn with_noise_floor(mut self, noise_floor: f32) -> Self {
        self.noise_floor = noise_floor;
        self
    }

    /// Compute the spoke segments of a histogram.
    ///
    /// Returns `(center - d, center + d)` pairs, one per visible bin. Bins that end up with a zero
    /// or non-finite offset are skipped.
    pub fn spokes(
        &self,
        center: na::Point2<i32>,
        histogram: &[f32],
    ) -> Result<Vec<(na::Point2<i32>, na::Point2<i32>)>> {
        if histogram.len() != self.nbins {
            return Err(Error::ShapeMismatch {
                expected: self.nbins,
                actual: histogram.len(),
            }
            .into());
        }

        Ok(histogram
            .iter()
            .enumerate()
            .filter(|(_, &b)| b > self.noise_floor)
            .filter_map(|(i, &b)| {
                let angle = (i as f32 * self.bin_width).to_radians();
                let len = b * self.scale;
                if !len.is_finite() {
                    return None;
                }
                let d = na::Vector2::new(len * angle.cos(), len * angle.sin())
                    .map(|v| v.round().clamp(-MAX_SPOKE, MAX_SPOKE) as i32);
                (d != na::Vector2::zeros()).then(|| (center - d, center + d))
            })
            .collect())
    }

    /// Draw a histogram onto a frame.
    ///
    /// # Arguments
    ///
    /// * `onto` - frame to draw on.
    /// * `center` - pixel position of the starburst centre.
    /// * `histogram` - normalized histogram with `nbins` entries.
    pub fn render(
        &self,
        onto: &mut RgbImage,
        center: na::Point2<i32>,
        histogram: &[f32],
    ) -> Result<()> {
        for (start, end) in self.spokes(center, histogram)? {
            frame::draw_line(onto, start, end, self.color);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spokes_are_symmetric() {
        let renderer = HistogramRenderer::new(9, false);
        let center = na::Point2::new(40, 30);
        let hist = [0.3, 0.0, 0.2, 0.05, 0.15, 0.0, 0.0, 0.2, 0.1];

        let spokes = renderer.spokes(center, &hist).unwrap();
        // Bins 3 (0.05) and 8 (0.1) are at or below the noise floor.
        assert_eq!(spokes.len(), 4);

        for (a, b) in spokes {
            assert_eq!(a - center, center - b);
        }
    }

    #[test]
    fn spoke_direction_follows_bin_angle() {
        let renderer = HistogramRenderer::new(9, false);
        let center = na::Point2::new(20, 20);

        let mut hist = [0.0; 9];
        hist[0] = 0.2;
        let spokes = renderer.spokes(center, &hist).unwrap();
        assert_eq!(
            spokes,
            vec![(na::Point2::new(10, 20), na::Point2::new(30, 20))]
        );

        // Bin 3 sits at 60 degrees.
        let mut hist = [0.0; 9];
        hist[3] = 1.0;
        let spokes = renderer.spokes(center, &hist).unwrap();
        assert_eq!(
            spokes,
            vec![(na::Point2::new(-5, -23), na::Point2::new(45, 63))]
        );
    }

    #[test]
    fn render_draws_both_endpoints() {
        let renderer = HistogramRenderer::new(4, false).with_scale(10.0);
        let mut frame = RgbImage::new(40, 40);
        let center = na::Point2::new(20, 20);

        let hist = [0.0, 0.0, 1.0, 0.0];
        renderer.render(&mut frame, center, &hist).unwrap();

        // Bin 2 of 4 is vertical.
        assert_eq!(*frame.get_pixel(20, 10), HOG_COLOR);
        assert_eq!(*frame.get_pixel(20, 30), HOG_COLOR);
        assert_eq!(*frame.get_pixel(20, 20), HOG_COLOR);
        assert_eq!(*frame.get_pixel(10, 20), Rgb([0, 0, 0]));
    }

    #[test]
    fn empty_histogram_draws_nothing() {
        let renderer = HistogramRenderer::new(9, false);
        let mut frame = RgbImage::new(32, 32);
        renderer
            .render(&mut frame, na::Point2::new(16, 16), &[0.0; 9])
            .unwrap();
        assert!(frame.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn wrong_bin_count() {
        let renderer = HistogramRenderer::new(9, false);
        let err = renderer
            .spokes(na::Point2::new(0, 0), &[0.5; 8])
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::ShapeMismatch {
                expected: 9,
                actual: 8
            })
        );
    }

    #[test]
    fn oversized_spokes_are_clamped() {
        let center = na::Point2::new(32, 32);
        let mut hist = [0.0; 9];
        hist[0] = f32::INFINITY;

        let mut frame = RgbImage::new(64, 64);
        let renderer = HistogramRenderer::new(9, false);
        assert!(renderer.spokes(center, &hist).unwrap().is_empty());
        renderer.render(&mut frame, center, &hist).unwrap();
        assert!(frame.pixels().all(|p| p.0 == [0, 0, 0]));

        hist[0] = 1.0;
        let renderer = renderer.with_scale(1e10);
        let spokes = renderer.spokes(center, &hist).unwrap();
        let d = i16::MAX as i32;
        assert_eq!(
            spokes,
            vec![(center - na::Vector2::new(d, 0), center + na::Vector2::new(d, 0))]
        );

        renderer.render(&mut frame, center, &hist).unwrap();
        assert_eq!(frame.get_pixel(0, 32), &HOG_COLOR);
        assert_eq!(frame.get_pixel(63, 32), &HOG_COLOR);
    }
}
