//! SkyScope Common Library
//!
//! Shared between the CLI and the desktop app: inspection-session
//! bookkeeping, the detection pipeline, video I/O, and the
//! camera-control client.

pub mod annotate;
pub mod config;
pub mod control;
pub mod detector;
pub mod error;
pub mod filters;
pub mod labels;
pub mod pipeline;
pub mod session;
pub mod types;
pub mod video;

pub use config::Config;
pub use control::{ControlAck, ControlClient};
pub use detector::{Detector, DetectorConfig};
pub use error::{Result, SkyscopeError};
pub use filters::FilterSettings;
pub use session::{InspectionDetails, InspectionSession, ProjectLayout};
pub use types::{BBox, CaptureTally, Detection, DetectionReport};
pub use video::{Frame, RgbaFrame, StreamSource, VideoMeta, VideoReader, VideoSink};
