use crate::error::{Result, SkyscopeError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// IP of the DJI camera-control server.
    pub control_ip: String,
    pub control_port: u16,
    /// Default detection model (.onnx), used when the CLI gets no --model.
    pub model_path: Option<PathBuf>,
    /// Overrides the default `SkyScope Projects` location.
    pub project_root: Option<PathBuf>,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub input_size: u32,
    pub max_detections: usize,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            control_ip: "192.168.43.1".into(),
            control_port: 8080,
            model_path: None,
            project_root: None,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            input_size: 416,
            max_detections: 1000,
            request_timeout_secs: 5,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SkyscopeError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("skyscope").join("config.json"))
    }

    pub fn set_control_ip(&mut self, ip: String) -> Result<()> {
        self.control_ip = ip;
        self.save()
    }

    pub fn set_model_path(&mut self, path: PathBuf) -> Result<()> {
        self.model_path = Some(path);
        self.save()
    }

    pub fn set_project_root(&mut self, path: PathBuf) -> Result<()> {
        self.project_root = Some(path);
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_field_hardware() {
        let config = Config::default();
        assert_eq!(config.control_ip, "192.168.43.1");
        assert_eq!(config.control_port, 8080);
        assert_eq!(config.input_size, 416);
        assert!((config.confidence_threshold - 0.25).abs() < f32::EPSILON);
        assert!((config.iou_threshold - 0.45).abs() < f32::EPSILON);
        assert_eq!(config.max_detections, 1000);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"control_ip": "10.0.0.2"}"#).unwrap();
        assert_eq!(config.control_ip, "10.0.0.2");
        assert_eq!(config.control_port, 8080);
        assert_eq!(config.input_size, 416);
    }
}
