//! OpenCV-backed video I/O and frame conversions.
//!
//! Binaries never touch OpenCV types directly; frames cross the API as
//! [`Frame`] (BGR Mat behind the scenes), `image::RgbImage`, or raw RGBA
//! pixels for UI textures.

use crate::error::{Result, SkyscopeError};
use image::RgbImage;
use opencv::core::{AlgorithmHint, Mat, Size};
use opencv::prelude::*;
use opencv::{imgproc, videoio};
use std::path::Path;

/// One decoded video frame (BGR).
pub struct Frame {
    pub(crate) mat: Mat,
}

/// Raw RGBA pixels ready for a UI texture upload.
#[derive(Debug, Clone)]
pub struct RgbaFrame {
    pub size: [usize; 2],
    pub pixels: Vec<u8>,
}

impl Frame {
    pub(crate) fn from_mat(mat: Mat) -> Self {
        Self { mat }
    }

    pub fn width(&self) -> u32 {
        self.mat.cols() as u32
    }

    pub fn height(&self) -> u32 {
        self.mat.rows() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.mat.empty()
    }

    pub fn try_clone(&self) -> Result<Frame> {
        Ok(Frame::from_mat(self.mat.try_clone()?))
    }

    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        let mut rgb = Mat::default();
        imgproc::cvt_color(
            &self.mat,
            &mut rgb,
            imgproc::COLOR_BGR2RGB,
            0,
            AlgorithmHint::ALGO_HINT_DEFAULT,
        )?;

        let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
        let data = rgb.data_bytes()?.to_vec();
        RgbImage::from_raw(width, height, data)
            .ok_or_else(|| SkyscopeError::ImageLoad("frame buffer size mismatch".into()))
    }

    pub fn from_rgb_image(image: &RgbImage) -> Result<Frame> {
        let (width, height) = image.dimensions();
        let flat = Mat::from_slice(image.as_raw())?;
        let reshaped = flat.reshape(3, height as i32)?;

        let mut bgr = Mat::default();
        imgproc::cvt_color(
            &reshaped,
            &mut bgr,
            imgproc::COLOR_RGB2BGR,
            0,
            AlgorithmHint::ALGO_HINT_DEFAULT,
        )?;
        debug_assert_eq!(bgr.cols() as u32, width);
        Ok(Frame::from_mat(bgr))
    }

    /// Expand to RGBA for egui texture upload.
    pub fn to_rgba_frame(&self) -> Result<RgbaFrame> {
        let (width, height) = (self.mat.cols() as usize, self.mat.rows() as usize);
        let data = self.mat.data_bytes()?;

        let mut pixels = Vec::with_capacity(width * height * 4);
        for chunk in data.chunks_exact(3) {
            pixels.push(chunk[2]); // R
            pixels.push(chunk[1]); // G
            pixels.push(chunk[0]); // B
            pixels.push(255);
        }

        Ok(RgbaFrame {
            size: [width, height],
            pixels,
        })
    }

    /// Save as PNG/JPEG via the image crate.
    pub fn save(&self, path: &Path) -> Result<()> {
        let rgb = self.to_rgb_image()?;
        rgb.save(path)
            .map_err(|e| SkyscopeError::ImageLoad(format!("{}: {e}", path.display())))
    }
}

/// Where a live view pulls frames from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSource {
    /// Local device camera by index.
    Device(i32),
    /// Network stream (RTMP/RTSP) address.
    Url(String),
}

impl std::str::FromStr for StreamSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.parse::<i32>() {
            Ok(index) => Ok(StreamSource::Device(index)),
            Err(_) => Ok(StreamSource::Url(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VideoMeta {
    pub fps: f64,
    pub frame_count: u64,
    pub width: u32,
    pub height: u32,
}

pub struct VideoReader {
    cap: videoio::VideoCapture,
    meta: VideoMeta,
}

impl VideoReader {
    pub fn open_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SkyscopeError::FileNotFound(path.display().to_string()));
        }
        let cap = videoio::VideoCapture::from_file(
            path.to_string_lossy().as_ref(),
            videoio::CAP_ANY,
        )?;
        Self::wrap(cap, &path.display().to_string())
    }

    pub fn open_source(source: &StreamSource) -> Result<Self> {
        let cap = match source {
            StreamSource::Device(index) => videoio::VideoCapture::new(*index, videoio::CAP_ANY)?,
            StreamSource::Url(url) => videoio::VideoCapture::from_file(url, videoio::CAP_ANY)?,
        };
        let label = match source {
            StreamSource::Device(index) => format!("camera {index}"),
            StreamSource::Url(url) => url.clone(),
        };
        Self::wrap(cap, &label)
    }

    fn wrap(cap: videoio::VideoCapture, label: &str) -> Result<Self> {
        if !cap.is_opened()? {
            return Err(SkyscopeError::VideoOpen(label.to_string()));
        }

        let meta = VideoMeta {
            fps: cap.get(videoio::CAP_PROP_FPS).unwrap_or(0.0),
            frame_count: cap.get(videoio::CAP_PROP_FRAME_COUNT).unwrap_or(0.0).max(0.0) as u64,
            width: cap.get(videoio::CAP_PROP_FRAME_WIDTH).unwrap_or(0.0) as u32,
            height: cap.get(videoio::CAP_PROP_FRAME_HEIGHT).unwrap_or(0.0) as u32,
        };

        Ok(Self { cap, meta })
    }

    pub fn meta(&self) -> VideoMeta {
        self.meta
    }

    /// Next frame, or `None` at end of stream.
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut mat = Mat::default();
        if !self.cap.read(&mut mat)? || mat.empty() {
            return Ok(None);
        }
        Ok(Some(Frame::from_mat(mat)))
    }

    pub fn seek(&mut self, frame_index: u64) -> Result<()> {
        self.cap
            .set(videoio::CAP_PROP_POS_FRAMES, frame_index as f64)?;
        Ok(())
    }

    pub fn read_frame_at(&mut self, frame_index: u64) -> Result<Option<Frame>> {
        self.seek(frame_index)?;
        self.read_frame()
    }

    pub fn release(&mut self) {
        let _ = self.cap.release();
    }
}

pub struct VideoSink {
    writer: videoio::VideoWriter,
}

impl VideoSink {
    /// mp4v writer at the given geometry.
    pub fn create(path: &Path, fps: f64, width: u32, height: u32) -> Result<Self> {
        let fourcc = videoio::VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = videoio::VideoWriter::new(
            path.to_string_lossy().as_ref(),
            fourcc,
            fps,
            Size::new(width as i32, height as i32),
            true,
        )?;
        if !writer.is_opened()? {
            return Err(SkyscopeError::VideoWrite(path.display().to_string()));
        }
        Ok(Self { writer })
    }

    pub fn write(&mut self, frame: &Frame) -> Result<()> {
        self.writer.write(&frame.mat)?;
        Ok(())
    }

    pub fn release(&mut self) {
        let _ = self.writer.release();
    }
}

/// Load a still image as RGB.
pub fn load_rgb_image(path: &Path) -> Result<RgbImage> {
    if !path.exists() {
        return Err(SkyscopeError::FileNotFound(path.display().to_string()));
    }
    let image = image::open(path)
        .map_err(|e| SkyscopeError::ImageLoad(format!("{}: {e}", path.display())))?;
    Ok(image.into_rgb8())
}

pub fn is_video_extension(path: &Path) -> bool {
    matches!(
        path.extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .as_deref(),
        Some("mp4") | Some("avi") | Some("wmv") | Some("mov")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn stream_source_parsing() {
        assert_eq!("0".parse::<StreamSource>().unwrap(), StreamSource::Device(0));
        assert_eq!(
            "rtmp://10.0.0.5/live/stream".parse::<StreamSource>().unwrap(),
            StreamSource::Url("rtmp://10.0.0.5/live/stream".into())
        );
    }

    #[test]
    fn video_extension_check() {
        assert!(is_video_extension(Path::new("a/clip.MP4")));
        assert!(is_video_extension(Path::new("clip.wmv")));
        assert!(!is_video_extension(Path::new("photo.png")));
    }

    #[test]
    fn rgb_round_trip_through_mat() {
        let mut image = RgbImage::new(4, 2);
        image.put_pixel(0, 0, Rgb([255, 0, 0]));
        image.put_pixel(3, 1, Rgb([0, 128, 255]));

        let frame = Frame::from_rgb_image(&image).unwrap();
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 2);

        let back = frame.to_rgb_image().unwrap();
        assert_eq!(back.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(back.get_pixel(3, 1), &Rgb([0, 128, 255]));
    }

    #[test]
    fn rgba_frame_has_alpha() {
        let image = RgbImage::from_pixel(2, 2, Rgb([10, 20, 30]));
        let frame = Frame::from_rgb_image(&image).unwrap();
        let rgba = frame.to_rgba_frame().unwrap();
        assert_eq!(rgba.size, [2, 2]);
        assert_eq!(&rgba.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn missing_video_file_errors() {
        let err = VideoReader::open_file(Path::new("/no/such/clip.mp4")).unwrap_err();
        assert!(matches!(err, SkyscopeError::FileNotFound(_)));
    }
}
