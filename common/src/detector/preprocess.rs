//! Letterbox resize and tensor layout for the model input.

use image::{imageops, Rgb, RgbImage};
use rayon::prelude::*;

/// Geometry of a letterbox transform, needed to map boxes back to the
/// source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxInfo {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_w: u32,
    pub orig_h: u32,
}

pub struct PreprocessedImage {
    /// CHW, normalized to `[0, 1]`.
    pub tensor: Vec<f32>,
    pub letterbox: LetterboxInfo,
}

const PAD_GRAY: u8 = 114;

/// Fit the image into an `input_size` square, preserving aspect ratio,
/// padding the rest with gray.
pub fn letterbox(image: &RgbImage, input_size: u32) -> (RgbImage, LetterboxInfo) {
    let (orig_w, orig_h) = image.dimensions();
    let scale = (input_size as f32 / orig_w as f32).min(input_size as f32 / orig_h as f32);
    let new_w = ((orig_w as f32 * scale) as u32).max(1);
    let new_h = ((orig_h as f32 * scale) as u32).max(1);

    let resized = imageops::resize(image, new_w, new_h, imageops::FilterType::Triangle);

    let mut boxed = RgbImage::from_pixel(input_size, input_size, Rgb([PAD_GRAY; 3]));
    let pad_x = (input_size - new_w) / 2;
    let pad_y = (input_size - new_h) / 2;
    imageops::overlay(&mut boxed, &resized, pad_x as i64, pad_y as i64);

    let info = LetterboxInfo {
        scale,
        pad_x: pad_x as f32,
        pad_y: pad_y as f32,
        orig_w,
        orig_h,
    };
    (boxed, info)
}

/// HWC u8 to CHW f32 in `[0, 1]`.
pub fn to_chw_tensor(image: &RgbImage) -> Vec<f32> {
    let (w, h) = image.dimensions();
    let (w, h) = (w as usize, h as usize);
    let plane = w * h;

    let mut tensor = vec![0.0f32; 3 * plane];
    tensor.par_iter_mut().enumerate().for_each(|(i, v)| {
        let channel = i / plane;
        let rem = i % plane;
        let (x, y) = ((rem % w) as u32, (rem / w) as u32);
        *v = image.get_pixel(x, y)[channel] as f32 / 255.0;
    });
    tensor
}

pub fn prepare(image: &RgbImage, input_size: u32) -> PreprocessedImage {
    let (boxed, letterbox) = letterbox(image, input_size);
    PreprocessedImage {
        tensor: to_chw_tensor(&boxed),
        letterbox,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_input_has_no_padding() {
        let image = RgbImage::new(100, 100);
        let (boxed, info) = letterbox(&image, 416);
        assert_eq!(boxed.dimensions(), (416, 416));
        assert_eq!(info.pad_x, 0.0);
        assert_eq!(info.pad_y, 0.0);
        assert!((info.scale - 4.16).abs() < 1e-5);
    }

    #[test]
    fn wide_input_pads_vertically() {
        let image = RgbImage::new(800, 400);
        let (_, info) = letterbox(&image, 416);
        assert!((info.scale - 0.52).abs() < 1e-5);
        assert_eq!(info.pad_x, 0.0);
        // scaled height 208, pad (416-208)/2
        assert_eq!(info.pad_y, 104.0);
    }

    #[test]
    fn tall_input_pads_horizontally() {
        let image = RgbImage::new(300, 600);
        let (_, info) = letterbox(&image, 416);
        assert_eq!(info.pad_y, 0.0);
        assert!(info.pad_x > 0.0);
    }

    #[test]
    fn padding_is_gray() {
        let image = RgbImage::from_pixel(100, 50, Rgb([255, 0, 0]));
        let (boxed, _) = letterbox(&image, 416);
        // top row is padding
        assert_eq!(boxed.get_pixel(0, 0), &Rgb([PAD_GRAY; 3]));
    }

    #[test]
    fn tensor_is_chw_normalized() {
        let mut image = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        image.put_pixel(1, 0, Rgb([255, 51, 102]));

        let tensor = to_chw_tensor(&image);
        assert_eq!(tensor.len(), 12);
        // R plane, pixel (1,0) is index 1
        assert!((tensor[1] - 1.0).abs() < 1e-6);
        // G plane
        assert!((tensor[4 + 1] - 0.2).abs() < 1e-6);
        // B plane
        assert!((tensor[8 + 1] - 0.4).abs() < 1e-6);
    }
}
