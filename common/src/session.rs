//! Inspection metadata and on-disk project bookkeeping.
//!
//! An inspection session pins footage, captures, and detection output to
//! one pole: everything lands under
//! `<root>/<location>_<serial>/<inspector>_<date>/` next to the info file.

use crate::error::{Result, SkyscopeError};
use chrono::Local;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const PROJECTS_DIR_NAME: &str = "SkyScope Projects";
pub const RECORDINGS_DIR_NAME: &str = "Recordings and Captures";

const MEDIA_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "mp4", "avi", "wmv"];

#[derive(Debug, Clone, Default)]
pub struct InspectionDetails {
    pub location: String,
    pub inspector: String,
    pub serial_number: String,
    pub rated_voltage: String,
    pub height: String,
}

impl InspectionDetails {
    /// Location and serial number are required; an unnamed inspector gets
    /// a placeholder so the directory name stays well-formed.
    pub fn validate(&mut self) -> Result<()> {
        if self.location.trim().is_empty() || self.serial_number.trim().is_empty() {
            return Err(SkyscopeError::InvalidDetails(
                "Location or Serial Number is empty".into(),
            ));
        }
        if self.inspector.trim().is_empty() {
            self.inspector = "UnnamedInspector".to_string();
        }
        Ok(())
    }
}

/// A saved inspection: validated details plus the directory they resolve to.
#[derive(Debug, Clone)]
pub struct InspectionSession {
    pub details: InspectionDetails,
    pub date: String,
    pub directory: PathBuf,
    pub info_file: PathBuf,
}

impl InspectionSession {
    /// Create (or re-enter) the session directory under `root` and write
    /// the info text file. Re-saving overwrites the previous file.
    pub fn create(root: &Path, mut details: InspectionDetails, date: &str) -> Result<Self> {
        details.validate()?;
        if !root.exists() {
            return Err(SkyscopeError::FolderNotFound(root.display().to_string()));
        }

        let pole_dir = root.join(format!("{}_{}", details.location, details.serial_number));
        if !pole_dir.exists() {
            std::fs::create_dir(&pole_dir)?;
        }
        let directory = pole_dir.join(format!("{}_{}", details.inspector, date));
        if !directory.exists() {
            std::fs::create_dir(&directory)?;
        }

        let info_name = format!(
            "{}_{}_info_{}.txt",
            details.serial_number, details.inspector, date
        );
        let info_file = directory.join(info_name);
        std::fs::write(&info_file, Self::info_text(&details))?;

        Ok(Self {
            details,
            date: date.to_string(),
            directory,
            info_file,
        })
    }

    fn info_text(details: &InspectionDetails) -> String {
        format!(
            "Location: {}\nInspector: {}\nSerial Number: {}\nRated Voltage: {}\nHeight: {}\n",
            details.location,
            details.inspector,
            details.serial_number,
            details.rated_voltage,
            details.height
        )
    }

    /// `{location}_{serial}_capture{HHMMSS}.png`
    pub fn capture_path(&self, time_stamp: &str) -> PathBuf {
        self.directory.join(format!(
            "{}_{}_capture{}.png",
            self.details.location, self.details.serial_number, time_stamp
        ))
    }

    /// `{location}_{serial}_{stem}_detection.{png|mp4}` depending on source.
    pub fn detection_output_path(&self, source: &Path, is_video: bool) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let ext = if is_video { "mp4" } else { "png" };
        self.directory.join(format!(
            "{}_{}_{}_detection.{}",
            self.details.location, self.details.serial_number, stem, ext
        ))
    }

    pub fn report_path(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        self.directory.join(format!(
            "{}_{}_{}_detection.json",
            self.details.location, self.details.serial_number, stem
        ))
    }
}

/// Resolution of the top-level project folder and the shared stream
/// output folder.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    pub root: PathBuf,
}

impl ProjectLayout {
    /// Default root next to the executable's working base, as the
    /// original tool kept it: `<base>/SkyScope Projects`.
    pub fn default_under(base: &Path) -> Result<Self> {
        let root = base.join(PROJECTS_DIR_NAME);
        std::fs::create_dir_all(&root)?;
        let layout = Self { root };
        std::fs::create_dir_all(layout.recordings_dir())?;
        Ok(layout)
    }

    /// A user-picked directory. Anything not already named
    /// `SkyScope Projects` gets the project folder created inside it.
    pub fn from_chosen_dir(chosen: &Path) -> Result<Self> {
        if !chosen.is_dir() {
            return Err(SkyscopeError::FolderNotFound(chosen.display().to_string()));
        }
        let root = if chosen.file_name().map(|n| n == PROJECTS_DIR_NAME) == Some(true) {
            chosen.to_path_buf()
        } else {
            let root = chosen.join(PROJECTS_DIR_NAME);
            std::fs::create_dir_all(&root)?;
            root
        };
        let layout = Self { root };
        std::fs::create_dir_all(layout.recordings_dir())?;
        Ok(layout)
    }

    pub fn recordings_dir(&self) -> PathBuf {
        self.root.join(RECORDINGS_DIR_NAME)
    }
}

/// Today as `YYYY-MM-DD`, the session-directory date component.
pub fn today_string() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Now as `HHMMSS`, the capture-filename component.
pub fn time_stamp() -> String {
    Local::now().format("%H%M%S").to_string()
}

/// List media files directly under `dir`, sorted by file name.
pub fn list_media(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(SkyscopeError::FolderNotFound(dir.display().to_string()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
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
            if MEDIA_EXTENSIONS.iter().any(|&e| e == ext) {
                files.push(path.to_path_buf());
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn details() -> InspectionDetails {
        InspectionDetails {
            location: "Tacloban".into(),
            inspector: "J Cruz".into(),
            serial_number: "P-0042".into(),
            rated_voltage: "13.8kV".into(),
            height: "11m".into(),
        }
    }

    #[test]
    fn empty_serial_rejected() {
        let mut d = details();
        d.serial_number.clear();
        assert!(matches!(
            d.validate(),
            Err(SkyscopeError::InvalidDetails(_))
        ));
    }

    #[test]
    fn empty_location_rejected() {
        let mut d = details();
        d.location = "  ".into();
        assert!(d.validate().is_err());
    }

    #[test]
    fn unnamed_inspector_defaulted() {
        let mut d = details();
        d.inspector.clear();
        d.validate().unwrap();
        assert_eq!(d.inspector, "UnnamedInspector");
    }

    #[test]
    fn session_creates_tree_and_info_file() {
        let dir = tempdir().unwrap();
        let session = InspectionSession::create(dir.path(), details(), "2024-06-01").unwrap();

        assert_eq!(
            session.directory,
            dir.path().join("Tacloban_P-0042").join("J Cruz_2024-06-01")
        );
        assert!(session.directory.is_dir());

        let text = std::fs::read_to_string(&session.info_file).unwrap();
        assert_eq!(
            text,
            "Location: Tacloban\nInspector: J Cruz\nSerial Number: P-0042\nRated Voltage: 13.8kV\nHeight: 11m\n"
        );
        assert_eq!(
            session.info_file.file_name().unwrap().to_str().unwrap(),
            "P-0042_J Cruz_info_2024-06-01.txt"
        );
    }

    #[test]
    fn resave_overwrites_info_file() {
        let dir = tempdir().unwrap();
        InspectionSession::create(dir.path(), details(), "2024-06-01").unwrap();

        let mut changed = details();
        changed.rated_voltage = "23kV".into();
        let session = InspectionSession::create(dir.path(), changed, "2024-06-01").unwrap();

        let text = std::fs::read_to_string(&session.info_file).unwrap();
        assert!(text.contains("Rated Voltage: 23kV"));
    }

    #[test]
    fn session_under_missing_root_fails() {
        let result = InspectionSession::create(
            Path::new("/nonexistent/projects/123"),
            details(),
            "2024-06-01",
        );
        assert!(matches!(result, Err(SkyscopeError::FolderNotFound(_))));
    }

    #[test]
    fn output_names_follow_session() {
        let dir = tempdir().unwrap();
        let session = InspectionSession::create(dir.path(), details(), "2024-06-01").unwrap();

        let video_out = session.detection_output_path(Path::new("/media/flight3.mp4"), true);
        assert_eq!(
            video_out.file_name().unwrap().to_str().unwrap(),
            "Tacloban_P-0042_flight3_detection.mp4"
        );

        let image_out = session.detection_output_path(Path::new("/media/pole.jpg"), false);
        assert_eq!(
            image_out.file_name().unwrap().to_str().unwrap(),
            "Tacloban_P-0042_pole_detection.png"
        );

        let capture = session.capture_path("142301");
        assert_eq!(
            capture.file_name().unwrap().to_str().unwrap(),
            "Tacloban_P-0042_capture142301.png"
        );
    }

    #[test]
    fn chosen_dir_gets_project_folder() {
        let dir = tempdir().unwrap();
        let layout = ProjectLayout::from_chosen_dir(dir.path()).unwrap();
        assert_eq!(layout.root, dir.path().join(PROJECTS_DIR_NAME));
        assert!(layout.recordings_dir().is_dir());

        // Picking the project folder itself does not nest another one.
        let again = ProjectLayout::from_chosen_dir(&layout.root).unwrap();
        assert_eq!(again.root, layout.root);
    }

    #[test]
    fn list_media_filters_and_sorts() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("a.png"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let files = list_media(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.mp4"]);
    }
}
