//! # Frame buffers and drawing helpers

use image::{imageops, Rgb};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use nalgebra as na;

pub use image::{GrayImage, RgbImage};

/// Colour used for HOG spokes.
pub const HOG_COLOR: Rgb<u8> = Rgb([180, 0, 0]);
/// Colour used for flow arrows.
pub const FLOW_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Convert a colour frame to single channel intensity.
pub fn to_gray(frame: &RgbImage) -> GrayImage {
    imageops::grayscale(frame)
}

/// Resize a frame with bilinear filtering.
///
/// Returns a plain copy when the frame already has the requested size.
pub fn resize(frame: &RgbImage, width: u32, height: u32) -> RgbImage {
    if frame.dimensions() == (width, height) {
        frame.clone()
    } else {
        imageops::resize(frame, width, height, imageops::FilterType::Triangle)
    }
}

/// Draw a line segment between two integer points.
pub fn draw_line(
    frame: &mut RgbImage,
    start: na::Point2<i32>,
    end: na::Point2<i32>,
    color: Rgb<u8>,
) {
    draw_line_segment_mut(
        frame,
        (start.x as f32, start.y as f32),
        (end.x as f32, end.y as f32),
        color,
    );
}

/// Draw a filled dot.
pub fn draw_dot(frame: &mut RgbImage, center: na::Point2<i32>, radius: i32, color: Rgb<u8>) {
    draw_filled_circle_mut(frame, (center.x, center.y), radius, color);
}

/// Convert a HSV triple to RGB.
///
/// # Arguments
///
/// * `hue` - hue in degrees, wrapped into `[0; 360)`.
/// * `saturation` - saturation in `[0; 1]` range.
/// * `value` - value in `[0; 1]` range.
pub fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> Rgb<u8> {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = value * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = value - c;

    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let q = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;

    Rgb([q(r), q(g), q(b)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsv_primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), Rgb([255, 0, 0]));
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), Rgb([0, 255, 0]));
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), Rgb([0, 0, 255]));
        assert_eq!(hsv_to_rgb(360.0, 1.0, 1.0), Rgb([255, 0, 0]));
        assert_eq!(hsv_to_rgb(77.0, 1.0, 0.0), Rgb([0, 0, 0]));
    }

    #[test]
    fn resize_same_size_is_copy() {
        let frame = RgbImage::from_pixel(4, 3, Rgb([1, 2, 3]));
        assert_eq!(resize(&frame, 4, 3), frame);
        assert_eq!(resize(&frame, 8, 6).dimensions(), (8, 6));
    }
}
