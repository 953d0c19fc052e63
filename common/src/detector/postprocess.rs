//! Decoding, non-max suppression, and box rescaling for YOLOv5 output.
//!
//! The model emits `[1, N, 5 + nc]` rows: center-x, center-y, width,
//! height (letterbox pixel space), objectness, then per-class scores.

use super::preprocess::LetterboxInfo;
use super::DetectorConfig;
use crate::types::{BBox, Detection};

#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub bbox: BBox,
    pub confidence: f32,
    pub class_id: usize,
}

/// Class offset used to keep per-class NMS independent without sorting
/// candidates into buckets.
const CLASS_OFFSET: f32 = 4096.0;

pub(crate) fn decode_candidates(
    data: &[f32],
    num_attrs: usize,
    cfg: &DetectorConfig,
) -> Vec<Candidate> {
    debug_assert!(num_attrs > 5);
    let num_classes = num_attrs - 5;

    let mut candidates = Vec::new();
    for row in data.chunks_exact(num_attrs) {
        let objectness = row[4];
        if objectness < cfg.confidence_threshold {
            continue;
        }

        let (mut best_class, mut best_score) = (0usize, 0.0f32);
        for class_id in 0..num_classes {
            let score = row[5 + class_id];
            if score > best_score {
                best_score = score;
                best_class = class_id;
            }
        }

        let confidence = objectness * best_score;
        if confidence < cfg.confidence_threshold {
            continue;
        }
        if let Some(filter) = &cfg.class_filter {
            if !filter.contains(&best_class) {
                continue;
            }
        }

        let bbox = BBox::from_xywh(row[0], row[1], row[2], row[3]);
        if bbox.area() <= 0.0 {
            continue;
        }

        candidates.push(Candidate {
            bbox,
            confidence,
            class_id: best_class,
        });
    }
    candidates
}

/// Greedy IoU suppression over confidence-sorted candidates. Unless
/// `agnostic`, boxes of different classes never suppress each other.
pub(crate) fn nms(mut candidates: Vec<Candidate>, iou_threshold: f32, agnostic: bool) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let offset_box = |c: &Candidate| {
        if agnostic {
            c.bbox
        } else {
            let shift = c.class_id as f32 * CLASS_OFFSET;
            BBox {
                x1: c.bbox.x1 + shift,
                y1: c.bbox.y1 + shift,
                x2: c.bbox.x2 + shift,
                y2: c.bbox.y2 + shift,
            }
        }
    };

    let mut kept: Vec<Candidate> = Vec::new();
    'outer: for cand in candidates {
        let shifted = offset_box(&cand);
        for keep in &kept {
            if offset_box(keep).iou(&shifted) > iou_threshold {
                continue 'outer;
            }
        }
        kept.push(cand);
    }
    kept
}

/// Undo the letterbox transform and clamp to the source image.
pub(crate) fn scale_to_original(bbox: BBox, lb: &LetterboxInfo) -> BBox {
    let unpad = BBox {
        x1: (bbox.x1 - lb.pad_x) / lb.scale,
        y1: (bbox.y1 - lb.pad_y) / lb.scale,
        x2: (bbox.x2 - lb.pad_x) / lb.scale,
        y2: (bbox.y2 - lb.pad_y) / lb.scale,
    };
    unpad.clamp(lb.orig_w as f32, lb.orig_h as f32)
}

pub(crate) fn postprocess(
    data: &[f32],
    num_attrs: usize,
    cfg: &DetectorConfig,
    lb: &LetterboxInfo,
    names: &[String],
) -> Vec<Detection> {
    let candidates = decode_candidates(data, num_attrs, cfg);
    let mut kept = nms(candidates, cfg.iou_threshold, cfg.agnostic_nms);
    kept.truncate(cfg.max_detections);

    kept.into_iter()
        .map(|c| Detection {
            bbox: scale_to_original(c.bbox, lb),
            confidence: c.confidence,
            class_id: c.class_id,
            class_name: names
                .get(c.class_id)
                .cloned()
                .unwrap_or_else(|| "object".to_string()),
        })
        .collect()
}
