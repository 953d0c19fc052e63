//! Drawing detections and capture tallies onto frames.

use crate::error::Result;
use crate::labels::class_color;
use crate::types::{CaptureTally, Detection};
use crate::video::Frame;
use opencv::core::{Point, Rect, Scalar};
use opencv::imgproc;

#[derive(Debug, Clone, Copy)]
pub struct LabelStyle {
    pub hide_labels: bool,
    pub hide_conf: bool,
    /// Bounding-box line width in pixels.
    pub thickness: i32,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            hide_labels: false,
            hide_conf: false,
            thickness: 1,
        }
    }
}

pub fn draw_detections(
    frame: &mut Frame,
    detections: &[Detection],
    style: &LabelStyle,
) -> Result<()> {
    for det in detections {
        let rect = Rect::new(
            det.bbox.x1 as i32,
            det.bbox.y1 as i32,
            det.bbox.width().max(2.0) as i32,
            det.bbox.height().max(2.0) as i32,
        );

        let (b, g, r) = class_color(det.class_id);
        let color = Scalar::new(b, g, r, 0.0);
        imgproc::rectangle(&mut frame.mat, rect, color, style.thickness, imgproc::LINE_AA, 0)?;

        if style.hide_labels {
            continue;
        }
        let label = if style.hide_conf {
            det.class_name.clone()
        } else {
            format!("{} {:.2}", det.class_name, det.confidence)
        };
        imgproc::put_text(
            &mut frame.mat,
            &label,
            Point::new(rect.x, (rect.y - 4).max(0)),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.4,
            color,
            1,
            imgproc::LINE_AA,
            false,
        )?;
    }
    Ok(())
}

/// Burn the operator tally into the top-left corner of a captured frame.
pub fn stamp_tally(frame: &mut Frame, tally: &CaptureTally) -> Result<()> {
    for (i, line) in tally.lines().iter().enumerate() {
        imgproc::put_text(
            &mut frame.mat,
            line,
            Point::new(10, 18 + (i as i32) * 16),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.45,
            Scalar::new(0.0, 0.0, 0.0, 0.0),
            1,
            imgproc::LINE_AA,
            false,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BBox;
    use image::{Rgb, RgbImage};

    #[test]
    fn drawing_changes_pixels_inside_box() {
        let image = RgbImage::from_pixel(64, 64, Rgb([0, 0, 0]));
        let mut frame = Frame::from_rgb_image(&image).unwrap();

        let det = Detection {
            bbox: BBox { x1: 10.0, y1: 10.0, x2: 40.0, y2: 40.0 },
            confidence: 0.8,
            class_id: 0,
            class_name: "mahogany leaves".into(),
        };
        draw_detections(&mut frame, &[det], &LabelStyle::default()).unwrap();

        let out = frame.to_rgb_image().unwrap();
        let changed = out.pixels().any(|p| *p != Rgb([0, 0, 0]));
        assert!(changed);
    }

    #[test]
    fn tally_stamp_changes_corner() {
        let image = RgbImage::from_pixel(120, 80, Rgb([255, 255, 255]));
        let mut frame = Frame::from_rgb_image(&image).unwrap();
        stamp_tally(
            &mut frame,
            &CaptureTally { leaves: 3, fruit: 1, branches: 2 },
        )
        .unwrap();

        let out = frame.to_rgb_image().unwrap();
        let corner_changed = (0..60u32)
            .flat_map(|x| (0..60u32).map(move |y| (x, y)))
            .any(|(x, y)| *out.get_pixel(x, y) != Rgb([255, 255, 255]));
        assert!(corner_changed);
    }
}
