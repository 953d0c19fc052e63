use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkyscopeError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("no model loaded. Pass --model or set one with `skyscope config --set-model PATH`")]
    MissingModel,

    #[error("failed to load model {0}: {1}")]
    ModelLoad(String, String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("folder not found: {0}")]
    FolderNotFound(String),

    #[error("no images found in: {0}")]
    NoImagesFound(String),

    #[error("failed to load image: {0}")]
    ImageLoad(String),

    #[error("could not open video source: {0}")]
    VideoOpen(String),

    #[error("could not create video writer for: {0}")]
    VideoWrite(String),

    #[error("incomplete inspection details: {0}")]
    InvalidDetails(String),

    #[error("control server error: {0}")]
    ControlServer(String),

    #[error("inference error: {0}")]
    Inference(#[from] ort::Error),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),
}

pub type Result<T> = std::result::Result<T, SkyscopeError>;
