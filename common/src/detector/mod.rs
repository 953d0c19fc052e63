//! YOLOv5 detector over ONNX Runtime.

mod postprocess;
pub mod preprocess;

use crate::config::Config;
use crate::error::{Result, SkyscopeError};
use crate::labels;
use crate::types::Detection;
use image::RgbImage;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use std::path::{Path, PathBuf};

pub use preprocess::LetterboxInfo;

/// Model stride; input sizes are rounded up to a multiple of this.
const STRIDE: u32 = 32;

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    pub class_filter: Option<Vec<usize>>,
    pub agnostic_nms: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            input_size: 416,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 1000,
            class_filter: None,
            agnostic_nms: false,
        }
    }
}

impl DetectorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            input_size: config.input_size,
            confidence_threshold: config.confidence_threshold,
            iou_threshold: config.iou_threshold,
            max_detections: config.max_detections,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(SkyscopeError::Config(format!(
                "confidence threshold {} outside [0, 1]",
                self.confidence_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(SkyscopeError::Config(format!(
                "IoU threshold {} outside [0, 1]",
                self.iou_threshold
            )));
        }
        if self.input_size == 0 {
            return Err(SkyscopeError::Config("input size must be positive".into()));
        }
        Ok(())
    }
}

/// Round `size` up to the model stride.
pub fn check_input_size(size: u32) -> u32 {
    size.div_ceil(STRIDE) * STRIDE
}

pub struct Detector {
    session: Session,
    names: Vec<String>,
    config: DetectorConfig,
    model_path: PathBuf,
}

impl Detector {
    pub fn load(model_path: &Path, mut config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        if !model_path.exists() {
            return Err(SkyscopeError::FileNotFound(model_path.display().to_string()));
        }

        let checked = check_input_size(config.input_size);
        if checked != config.input_size {
            log::warn!(
                "input size {} is not a multiple of {STRIDE}, using {checked}",
                config.input_size
            );
            config.input_size = checked;
        }

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(4))
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| {
                SkyscopeError::ModelLoad(model_path.display().to_string(), e.to_string())
            })?;

        let names = session
            .metadata()
            .ok()
            .and_then(|meta| meta.custom("names").ok().flatten())
            .and_then(|raw| parse_names(&raw))
            .unwrap_or_else(|| labels::CLASS_NAMES.iter().map(|s| s.to_string()).collect());

        log::info!(
            "model {} loaded ({} classes, input {})",
            model_path.display(),
            names.len(),
            config.input_size
        );

        Ok(Self {
            session,
            names,
            config,
            model_path: model_path.to_path_buf(),
        })
    }

    pub fn class_names(&self) -> &[String] {
        &self.names
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn model_name(&self) -> String {
        self.model_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Full pipeline: letterbox, forward pass, NMS, rescale to source.
    pub fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>> {
        let size = self.config.input_size;
        let pre = preprocess::prepare(image, size);

        let shape = [1i64, 3, size as i64, size as i64];
        let input = Value::from_array((shape, pre.tensor))?;
        let outputs = self.session.run(ort::inputs!["images" => input]?)?;

        let output = outputs["output0"].try_extract_tensor::<f32>()?;
        let dims = output.shape().to_vec();
        if dims.len() != 3 || dims[2] <= 5 {
            return Err(SkyscopeError::ModelLoad(
                self.model_path.display().to_string(),
                format!("unexpected output shape {dims:?}"),
            ));
        }

        let flat: Vec<f32> = output.iter().copied().collect();
        Ok(postprocess::postprocess(
            &flat,
            dims[2],
            &self.config,
            &pre.letterbox,
            &self.names,
        ))
    }
}

/// Class names from model metadata. YOLOv5 exports store them as a
/// Python-dict repr (`{0: 'leaves', 1: 'fruit'}`); newer exporters use
/// JSON. Accept both.
fn parse_names(raw: &str) -> Option<Vec<String>> {
    if let Ok(serde_json::Value::Array(items)) = serde_json::from_str(raw) {
        let names: Vec<String> = items
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect();
        if !names.is_empty() {
            return Some(names);
        }
    }

    let inner = raw.trim().strip_prefix('{')?.strip_suffix('}')?;
    let mut entries: Vec<(usize, String)> = Vec::new();
    for part in inner.split(',') {
        let (key, value) = part.split_once(':')?;
        let index: usize = key.trim().parse().ok()?;
        let name = value.trim().trim_matches(|c| c == '\'' || c == '"').to_string();
        entries.push((index, name));
    }
    entries.sort_by_key(|(i, _)| *i);
    Some(entries.into_iter().map(|(_, n)| n).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_size_rounds_up_to_stride() {
        assert_eq!(check_input_size(416), 416);
        assert_eq!(check_input_size(400), 416);
        assert_eq!(check_input_size(417), 448);
    }

    #[test]
    fn bad_thresholds_rejected() {
        let config = DetectorConfig {
            confidence_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DetectorConfig {
            iou_threshold: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_python_dict_names() {
        let names = parse_names("{0: 'mahogany leaves', 1: 'mahogany fruit', 2: 'mahogany branches'}")
            .unwrap();
        assert_eq!(
            names,
            vec!["mahogany leaves", "mahogany fruit", "mahogany branches"]
        );
    }

    #[test]
    fn parse_json_array_names() {
        let names = parse_names(r#"["a", "b"]"#).unwrap();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn parse_garbage_names_fails() {
        assert!(parse_names("not a dict").is_none());
    }

    #[test]
    fn missing_model_file_errors() {
        let err = Detector::load(Path::new("/no/model.onnx"), DetectorConfig::default())
            .unwrap_err();
        assert!(matches!(err, SkyscopeError::FileNotFound(_)));
    }
}
