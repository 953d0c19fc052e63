//! Detection result types shared by the CLI and the desktop app.

use serde::{Deserialize, Serialize};

/// Axis-aligned box in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn from_xywh(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn iou(&self, other: &BBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            return 0.0;
        }
        inter / union
    }

    /// Clamp the box to `[0, w] x [0, h]`.
    pub fn clamp(&self, w: f32, h: f32) -> BBox {
        BBox {
            x1: self.x1.clamp(0.0, w),
            y1: self.y1.clamp(0.0, h),
            x2: self.x2.clamp(0.0, w),
            y2: self.y2.clamp(0.0, h),
        }
    }
}

/// A single detection in source-image pixel coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BBox,
    pub confidence: f32,
    pub class_id: usize,
    pub class_name: String,
}

/// Operator tally stamped onto captured frames.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CaptureTally {
    pub leaves: u32,
    pub fruit: u32,
    pub branches: u32,
}

impl CaptureTally {
    pub fn lines(&self) -> [String; 3] {
        [
            format!("Mahogany Leaves: {}", self.leaves),
            format!("Mahogany Fruit: {}", self.fruit),
            format!("Mahogany Branches: {}", self.branches),
        ]
    }
}

/// Summary written next to annotated detection output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    pub source: String,
    pub model: String,
    pub frames_processed: u64,
    pub total_detections: u64,
    /// Detections per class name over the whole run.
    pub class_counts: std::collections::BTreeMap<String, u64>,
}

impl DetectionReport {
    pub fn new(source: &str, model: &str) -> Self {
        Self {
            source: source.to_string(),
            model: model.to_string(),
            ..Default::default()
        }
    }

    pub fn record_frame(&mut self, detections: &[Detection]) {
        self.frames_processed += 1;
        self.total_detections += detections.len() as u64;
        for det in detections {
            *self.class_counts.entry(det.class_name.clone()).or_insert(0) += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xywh_round_trip() {
        let b = BBox::from_xywh(50.0, 40.0, 20.0, 10.0);
        assert_eq!(b.x1, 40.0);
        assert_eq!(b.y1, 35.0);
        assert_eq!(b.x2, 60.0);
        assert_eq!(b.y2, 45.0);
        assert_eq!(b.width(), 20.0);
        assert_eq!(b.height(), 10.0);
    }

    #[test]
    fn iou_disjoint_is_zero() {
        let a = BBox { x1: 0.0, y1: 0.0, x2: 10.0, y2: 10.0 };
        let b = BBox { x1: 20.0, y1: 20.0, x2: 30.0, y2: 30.0 };
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn iou_identical_is_one() {
        let a = BBox { x1: 0.0, y1: 0.0, x2: 10.0, y2: 10.0 };
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_half_overlap() {
        let a = BBox { x1: 0.0, y1: 0.0, x2: 10.0, y2: 10.0 };
        let b = BBox { x1: 5.0, y1: 0.0, x2: 15.0, y2: 10.0 };
        // intersection 50, union 150
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn clamp_to_image() {
        let b = BBox { x1: -5.0, y1: -5.0, x2: 120.0, y2: 90.0 };
        let c = b.clamp(100.0, 80.0);
        assert_eq!(c, BBox { x1: 0.0, y1: 0.0, x2: 100.0, y2: 80.0 });
    }

    #[test]
    fn report_counts_per_class() {
        let mut report = DetectionReport::new("clip.mp4", "best.onnx");
        let det = |name: &str| Detection {
            bbox: BBox::default(),
            confidence: 0.9,
            class_id: 0,
            class_name: name.to_string(),
        };
        report.record_frame(&[det("mahogany leaves"), det("mahogany fruit")]);
        report.record_frame(&[det("mahogany leaves")]);

        assert_eq!(report.frames_processed, 2);
        assert_eq!(report.total_detections, 3);
        assert_eq!(report.class_counts["mahogany leaves"], 2);
        assert_eq!(report.class_counts["mahogany fruit"], 1);
    }
}
