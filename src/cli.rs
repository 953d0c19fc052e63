use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skyscope")]
#[command(about = "Drone inspection toolkit: detection over drone footage and live-stream control", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run detection over an image, a video, or a folder of images
    Detect {
        /// Input image/video file or image folder
        #[arg(required = true)]
        input: PathBuf,

        /// Detection model (.onnx); defaults to the configured model
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Output directory (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Confidence threshold
        #[arg(long)]
        conf: Option<f32>,

        /// NMS IoU threshold
        #[arg(long)]
        iou: Option<f32>,

        /// Inference size (rounded up to a multiple of 32)
        #[arg(long)]
        img_size: Option<u32>,

        /// Maximum detections per frame
        #[arg(long)]
        max_det: Option<usize>,

        /// Keep only these class ids (comma separated)
        #[arg(long, value_delimiter = ',')]
        classes: Option<Vec<usize>>,

        /// Class-agnostic NMS
        #[arg(long)]
        agnostic_nms: bool,

        /// Draw boxes without labels
        #[arg(long)]
        hide_labels: bool,

        /// Draw labels without confidences
        #[arg(long)]
        hide_conf: bool,
    },

    /// Drive the drone camera-control server
    Stream {
        #[command(subcommand)]
        action: StreamAction,
    },

    /// Show or edit the configuration
    Config {
        /// Set the control-server IP
        #[arg(long)]
        set_ip: Option<String>,

        /// Set the default detection model
        #[arg(long)]
        set_model: Option<PathBuf>,

        /// Set the projects root directory
        #[arg(long)]
        set_root: Option<PathBuf>,

        /// Print the current configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
pub enum StreamAction {
    /// Ask the control server to start pushing the live stream
    Start {
        /// Control-server IP (default: configured IP)
        #[arg(long)]
        ip: Option<String>,

        /// Stream target host (default: this machine's address)
        #[arg(long)]
        target: Option<String>,
    },

    /// Ask the control server to stop the live stream
    Stop {
        /// Control-server IP (default: configured IP)
        #[arg(long)]
        ip: Option<String>,
    },
}
