//! End-to-end inspection-session flow: project layout, session
//! directories, info file, and output naming.

use skyscope_common::session::{self, InspectionDetails, InspectionSession, ProjectLayout};
use std::path::Path;
use tempfile::tempdir;

fn details() -> InspectionDetails {
    InspectionDetails {
        location: "Ormoc".into(),
        inspector: "A Reyes".into(),
        serial_number: "7734".into(),
        rated_voltage: "23kV".into(),
        height: "12m".into(),
    }
}

#[test]
fn full_session_flow() {
    let base = tempdir().unwrap();

    // Picking a plain directory creates the project tree inside it.
    let layout = ProjectLayout::from_chosen_dir(base.path()).unwrap();
    assert!(layout.root.ends_with("SkyScope Projects"));
    assert!(layout.recordings_dir().is_dir());

    let session = InspectionSession::create(&layout.root, details(), "2024-07-15").unwrap();
    assert!(session.directory.starts_with(&layout.root));
    assert!(session.info_file.exists());

    let text = std::fs::read_to_string(&session.info_file).unwrap();
    for line in [
        "Location: Ormoc",
        "Inspector: A Reyes",
        "Serial Number: 7734",
        "Rated Voltage: 23kV",
        "Height: 12m",
    ] {
        assert!(text.contains(line), "missing line: {line}");
    }

    // Detection and capture outputs land in the session directory.
    let out = session.detection_output_path(Path::new("flight.mp4"), true);
    assert_eq!(out.parent().unwrap(), session.directory);
    assert_eq!(
        out.file_name().unwrap().to_str().unwrap(),
        "Ormoc_7734_flight_detection.mp4"
    );
    let report = session.report_path(Path::new("flight.mp4"));
    assert_eq!(
        report.file_name().unwrap().to_str().unwrap(),
        "Ormoc_7734_flight_detection.json"
    );
}

#[test]
fn captures_listed_after_saving() {
    let base = tempdir().unwrap();
    let layout = ProjectLayout::from_chosen_dir(base.path()).unwrap();
    let session = InspectionSession::create(&layout.root, details(), "2024-07-15").unwrap();

    let capture_a = session.capture_path("101500");
    let capture_b = session.capture_path("101730");
    std::fs::write(&capture_a, b"png").unwrap();
    std::fs::write(&capture_b, b"png").unwrap();

    let media = session::list_media(&session.directory).unwrap();
    assert_eq!(media.len(), 2);
    assert_eq!(media[0], capture_a);
    assert_eq!(media[1], capture_b);
}

#[test]
fn date_and_time_stamps_are_well_formed() {
    let date = session::today_string();
    assert_eq!(date.len(), 10);
    assert_eq!(&date[4..5], "-");

    let stamp = session::time_stamp();
    assert_eq!(stamp.len(), 6);
    assert!(stamp.chars().all(|c| c.is_ascii_digit()));
}
