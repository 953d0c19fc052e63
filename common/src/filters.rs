//! Live-view frame adjustments: brightness, contrast, saturation, and a
//! fixed smoothing blur, matching the stream-tab sliders.

use crate::error::Result;
use crate::video::Frame;
use opencv::core::{self, AlgorithmHint, Mat, Scalar, Size, Vector};
use opencv::imgproc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSettings {
    /// Added to every channel (-255..=255).
    pub brightness: i32,
    /// Slider value; gain is `value / 255 + 1` (0..=255).
    pub contrast: i32,
    /// Added to the HSV saturation channel (-255..=255).
    pub saturation: i32,
}

impl FilterSettings {
    pub fn clamped(self) -> Self {
        Self {
            brightness: self.brightness.clamp(-255, 255),
            contrast: self.contrast.clamp(0, 255),
            saturation: self.saturation.clamp(-255, 255),
        }
    }

    pub fn contrast_gain(&self) -> f64 {
        self.contrast as f64 / 255.0 + 1.0
    }

    /// Apply in place: gain/offset, saturation shift in HSV, then a 3x3
    /// Gaussian blur. The blur runs even at identity settings.
    pub fn apply(&self, frame: &mut Frame) -> Result<()> {
        let settings = self.clamped();

        let mut adjusted = Mat::default();
        core::convert_scale_abs(
            &frame.mat,
            &mut adjusted,
            settings.contrast_gain(),
            settings.brightness as f64,
        )?;

        if settings.saturation != 0 {
            adjusted = shift_saturation(&adjusted, settings.saturation)?;
        }

        let mut blurred = Mat::default();
        imgproc::gaussian_blur(
            &adjusted,
            &mut blurred,
            Size::new(3, 3),
            0.0,
            0.0,
            core::BORDER_DEFAULT,
            AlgorithmHint::ALGO_HINT_DEFAULT,
        )?;

        frame.mat = blurred;
        Ok(())
    }
}

fn shift_saturation(bgr: &Mat, amount: i32) -> Result<Mat> {
    let mut hsv = Mat::default();
    imgproc::cvt_color(
        bgr,
        &mut hsv,
        imgproc::COLOR_BGR2HSV,
        0,
        AlgorithmHint::ALGO_HINT_DEFAULT,
    )?;

    let mut channels = Vector::<Mat>::new();
    core::split(&hsv, &mut channels)?;

    // Saturating add on the S channel only.
    let s = channels.get(1)?;
    let mut shifted = Mat::default();
    core::add(
        &s,
        &Scalar::all(amount as f64),
        &mut shifted,
        &core::no_array(),
        -1,
    )?;
    channels.set(1, shifted)?;

    let mut merged = Mat::default();
    core::merge(&channels, &mut merged)?;

    let mut out = Mat::default();
    imgproc::cvt_color(
        &merged,
        &mut out,
        imgproc::COLOR_HSV2BGR,
        0,
        AlgorithmHint::ALGO_HINT_DEFAULT,
    )?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn uniform_frame(color: [u8; 3]) -> Frame {
        let image = RgbImage::from_pixel(8, 8, Rgb(color));
        Frame::from_rgb_image(&image).unwrap()
    }

    #[test]
    fn clamping_bounds_slider_values() {
        let s = FilterSettings {
            brightness: 999,
            contrast: -10,
            saturation: -400,
        }
        .clamped();
        assert_eq!(s.brightness, 255);
        assert_eq!(s.contrast, 0);
        assert_eq!(s.saturation, -255);
    }

    #[test]
    fn contrast_gain_mapping() {
        assert!((FilterSettings::default().contrast_gain() - 1.0).abs() < 1e-9);
        let full = FilterSettings {
            contrast: 255,
            ..Default::default()
        };
        assert!((full.contrast_gain() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn brightness_raises_uniform_frame() {
        let mut frame = uniform_frame([100, 100, 100]);
        FilterSettings {
            brightness: 50,
            ..Default::default()
        }
        .apply(&mut frame)
        .unwrap();

        // Uniform input stays uniform through the blur.
        let out = frame.to_rgb_image().unwrap();
        assert_eq!(out.get_pixel(4, 4), &Rgb([150, 150, 150]));
    }

    #[test]
    fn identity_settings_keep_uniform_color() {
        let mut frame = uniform_frame([37, 90, 200]);
        FilterSettings::default().apply(&mut frame).unwrap();
        let out = frame.to_rgb_image().unwrap();
        assert_eq!(out.get_pixel(2, 2), &Rgb([37, 90, 200]));
    }

    #[test]
    fn negative_saturation_grays_out() {
        let mut frame = uniform_frame([200, 40, 40]);
        FilterSettings {
            saturation: -255,
            ..Default::default()
        }
        .apply(&mut frame)
        .unwrap();

        let out = frame.to_rgb_image().unwrap();
        let p = out.get_pixel(4, 4);
        // Fully desaturated: channels equalize.
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
    }
}
