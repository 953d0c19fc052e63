//! The per-source detection runs shared by the CLI and the desktop app:
//! load frames, detect, annotate, write annotated output and a JSON
//! report. Video runs poll a stop flag between frames so the caller can
//! cancel without tearing the writer down mid-frame.

use crate::annotate::{self, LabelStyle};
use crate::detector::Detector;
use crate::error::{Result, SkyscopeError};
use crate::types::DetectionReport;
use crate::video::{self, Frame, VideoReader, VideoSink};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// What a run produced.
#[derive(Debug)]
pub struct DetectOutcome {
    pub report: DetectionReport,
    pub cancelled: bool,
}

pub fn detect_image(
    detector: &mut Detector,
    input: &Path,
    output: &Path,
    style: &LabelStyle,
) -> Result<DetectOutcome> {
    let rgb = video::load_rgb_image(input)?;
    let detections = detector.detect(&rgb)?;

    let mut frame = Frame::from_rgb_image(&rgb)?;
    annotate::draw_detections(&mut frame, &detections, style)?;
    frame.save(output)?;

    let mut report = DetectionReport::new(
        &input.display().to_string(),
        &detector.model_name(),
    );
    report.record_frame(&detections);
    log::info!("{}: {} detections", input.display(), detections.len());

    Ok(DetectOutcome {
        report,
        cancelled: false,
    })
}

/// Run detection over every frame of `input`, writing the annotated video
/// to `output`. `progress(done, total)` fires after each frame; `total`
/// is 0 for streams that do not report a frame count.
pub fn detect_video(
    detector: &mut Detector,
    input: &Path,
    output: &Path,
    style: &LabelStyle,
    stop: &AtomicBool,
    mut progress: impl FnMut(u64, u64),
) -> Result<DetectOutcome> {
    let mut reader = VideoReader::open_file(input)?;
    let meta = reader.meta();
    let fps = if meta.fps > 0.0 { meta.fps } else { 30.0 };
    let mut sink = VideoSink::create(output, fps, meta.width, meta.height)?;

    let mut report = DetectionReport::new(
        &input.display().to_string(),
        &detector.model_name(),
    );

    let mut done = 0u64;
    while !stop.load(Ordering::Relaxed) {
        let Some(mut frame) = reader.read_frame()? else {
            break;
        };

        let rgb = frame.to_rgb_image()?;
        let detections = detector.detect(&rgb)?;
        annotate::draw_detections(&mut frame, &detections, style)?;
        sink.write(&frame)?;

        report.record_frame(&detections);
        done += 1;
        progress(done, meta.frame_count);
    }

    let cancelled = stop.load(Ordering::Relaxed);
    reader.release();
    sink.release();
    if cancelled {
        log::warn!("detection cancelled after {done} frames");
    }

    Ok(DetectOutcome { report, cancelled })
}

pub fn write_report(report: &DetectionReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Still images directly under `folder`, sorted by file name.
pub fn scan_images(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.exists() {
        return Err(SkyscopeError::FolderNotFound(folder.display().to_string()));
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(ext) = path.extension() {
            let ext = ext.to_string_lossy().to_lowercase();
            if IMAGE_EXTENSIONS.iter().any(|&e| e == ext) {
                images.push(path.to_path_buf());
            }
        }
    }

    images.sort();
    Ok(images)
}

/// `clip.mp4` -> `clip_detection.mp4` / `pole.jpg` -> `pole_detection.png`
/// under `output_dir`, for headless runs with no inspection session.
pub fn default_output_path(input: &Path, output_dir: &Path, is_video: bool) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = if is_video { "mp4" } else { "png" };
    output_dir.join(format!("{stem}_detection.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn scan_missing_folder_fails() {
        assert!(matches!(
            scan_images(Path::new("/nonexistent/images")),
            Err(SkyscopeError::FolderNotFound(_))
        ));
    }

    #[test]
    fn scan_filters_and_sorts_images() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("a.png"), b"x").unwrap();
        std::fs::write(dir.path().join("clip.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let images = scan_images(dir.path()).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.jpg"]);
    }

    #[test]
    fn default_output_naming() {
        let out = default_output_path(Path::new("/in/clip.mp4"), Path::new("/out"), true);
        assert_eq!(out, Path::new("/out/clip_detection.mp4"));

        let out = default_output_path(Path::new("/in/pole.jpg"), Path::new("/out"), false);
        assert_eq!(out, Path::new("/out/pole_detection.png"));
    }

    #[test]
    fn report_writes_json() {
        let dir = tempdir().unwrap();
        let report = DetectionReport::new("clip.mp4", "best.onnx");
        let path = dir.path().join("report.json");
        write_report(&report, &path).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["source"], "clip.mp4");
        assert_eq!(parsed["model"], "best.onnx");
    }
}
