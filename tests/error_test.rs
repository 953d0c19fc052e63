//! Error-path checks across the shared library.

use skyscope_common::pipeline;
use skyscope_common::{SkyscopeError, VideoReader};
use std::path::Path;
use tempfile::tempdir;

#[test]
fn scan_nonexistent_folder() {
    let result = pipeline::scan_images(Path::new("/nonexistent/path/12345"));
    assert!(result.is_err());

    let err = result.unwrap_err();
    assert!(matches!(err, SkyscopeError::FolderNotFound(_)));
}

#[test]
fn scan_empty_folder_is_ok() {
    let dir = tempdir().expect("failed to create temp dir");
    let result = pipeline::scan_images(dir.path());

    // An empty folder is not an error, just an empty list.
    assert!(result.is_ok());
    assert!(result.unwrap().is_empty());
}

#[test]
fn scan_folder_without_images() {
    let dir = tempdir().expect("failed to create temp dir");

    std::fs::write(dir.path().join("test.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("data.json"), "{}").unwrap();

    let result = pipeline::scan_images(dir.path());
    assert!(result.is_ok());
    assert!(result.unwrap().is_empty());
}

#[test]
fn missing_video_is_file_not_found() {
    let err = VideoReader::open_file(Path::new("/nonexistent/clip.mp4")).unwrap_err();
    assert!(matches!(err, SkyscopeError::FileNotFound(_)));
}

#[test]
fn error_display_strings() {
    let errors = vec![
        SkyscopeError::Config("bad threshold".to_string()),
        SkyscopeError::FileNotFound("clip.mp4".to_string()),
        SkyscopeError::FolderNotFound("/path/to/folder".to_string()),
        SkyscopeError::NoImagesFound("/path/to/folder".to_string()),
        SkyscopeError::VideoOpen("rtmp://10.0.0.5/live/stream".to_string()),
        SkyscopeError::InvalidDetails("Location or Serial Number is empty".to_string()),
        SkyscopeError::ControlServer("connection refused".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty());
    }
}

#[test]
fn missing_model_mentions_the_fix() {
    let display = format!("{}", SkyscopeError::MissingModel);
    assert!(display.contains("--set-model"));
}
