mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Commands, StreamAction};
use indicatif::{ProgressBar, ProgressStyle};
use skyscope_common::annotate::LabelStyle;
use skyscope_common::control;
use skyscope_common::pipeline;
use skyscope_common::video::is_video_extension;
use skyscope_common::{Config, ControlClient, Detector, DetectorConfig};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = Config::load().context("failed to load configuration")?;

    match cli.command {
        Commands::Detect {
            input,
            model,
            output,
            conf,
            iou,
            img_size,
            max_det,
            classes,
            agnostic_nms,
            hide_labels,
            hide_conf,
        } => {
            println!("🔍 skyscope - detection\n");

            let model_path = model
                .or_else(|| config.model_path.clone())
                .ok_or(skyscope_common::SkyscopeError::MissingModel)?;

            let mut detector_config = DetectorConfig::from_config(&config);
            if let Some(conf) = conf {
                detector_config.confidence_threshold = conf;
            }
            if let Some(iou) = iou {
                detector_config.iou_threshold = iou;
            }
            if let Some(size) = img_size {
                detector_config.input_size = size;
            }
            if let Some(max_det) = max_det {
                detector_config.max_detections = max_det;
            }
            detector_config.class_filter = classes;
            detector_config.agnostic_nms = agnostic_nms;

            let style = LabelStyle {
                hide_labels,
                hide_conf,
                ..Default::default()
            };

            println!("[1/2] Loading model...");
            let mut detector = Detector::load(&model_path, detector_config)?;
            println!(
                "✔ Model loaded: {} ({} classes)\n",
                detector.model_name(),
                detector.class_names().len()
            );

            println!("[2/2] Running detection...");
            if input.is_dir() {
                detect_folder(&mut detector, &input, output.as_deref(), &style)?;
            } else if is_video_extension(&input) {
                detect_video(&mut detector, &input, output.as_deref(), &style)?;
            } else {
                detect_image(&mut detector, &input, output.as_deref(), &style)?;
            }

            println!("\n✅ Detection complete");
        }

        Commands::Stream { action } => match action {
            StreamAction::Start { ip, target } => {
                let ip = ip.unwrap_or_else(|| config.control_ip.clone());
                println!("📡 Connecting to control server at {ip}...");

                let client = ControlClient::connect(
                    &ip,
                    config.control_port,
                    Duration::from_secs(config.request_timeout_secs),
                )?;
                let target = target.unwrap_or_else(control::local_ipv4);
                let ack = client.start_live_stream(&target)?;
                log::debug!("start ack: {ack:?}");

                println!("✔ Live stream started towards {target}");
                println!("  Pull it from rtmp://{target}/live/stream");
            }
            StreamAction::Stop { ip } => {
                let ip = ip.unwrap_or_else(|| config.control_ip.clone());
                println!("📡 Connecting to control server at {ip}...");

                let client = ControlClient::connect(
                    &ip,
                    config.control_port,
                    Duration::from_secs(config.request_timeout_secs),
                )?;
                let ack = client.stop_live_stream()?;
                log::debug!("stop ack: {ack:?}");

                println!("✔ Live stream stopped");
            }
        },

        Commands::Config {
            set_ip,
            set_model,
            set_root,
            show,
        } => {
            let mut config = config;

            if let Some(ip) = set_ip {
                config.set_control_ip(ip)?;
                println!("✔ Control-server IP saved");
            }
            if let Some(model) = set_model {
                config.set_model_path(model)?;
                println!("✔ Default model saved");
            }
            if let Some(root) = set_root {
                config.set_project_root(root)?;
                println!("✔ Projects root saved");
            }

            if show {
                println!("Configuration:");
                println!("  Control server: {}:{}", config.control_ip, config.control_port);
                println!(
                    "  Model: {}",
                    config
                        .model_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "not set".into())
                );
                println!(
                    "  Projects root: {}",
                    config
                        .project_root
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "default".into())
                );
                println!("  Confidence: {}", config.confidence_threshold);
                println!("  IoU: {}", config.iou_threshold);
                println!("  Input size: {}", config.input_size);
            }
        }
    }

    Ok(())
}

fn output_dir_for(input: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let dir = match output {
        Some(dir) => dir.to_path_buf(),
        None => {
            if input.is_dir() {
                input.to_path_buf()
            } else {
                input
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| PathBuf::from("."))
            }
        }
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create output directory {}", dir.display()))?;
    Ok(dir)
}

fn detect_image(
    detector: &mut Detector,
    input: &Path,
    output: Option<&Path>,
    style: &LabelStyle,
) -> Result<()> {
    let out_dir = output_dir_for(input, output)?;
    let out_path = pipeline::default_output_path(input, &out_dir, false);

    let outcome = pipeline::detect_image(detector, input, &out_path, style)?;
    pipeline::write_report(&outcome.report, &out_path.with_extension("json"))?;

    println!("✔ Saved: {}", out_path.display());
    println!("  {} detections", outcome.report.total_detections);
    Ok(())
}

fn detect_video(
    detector: &mut Detector,
    input: &Path,
    output: Option<&Path>,
    style: &LabelStyle,
) -> Result<()> {
    let out_dir = output_dir_for(input, output)?;
    let out_path = pipeline::default_output_path(input, &out_dir, true);

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} frames {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let stop = AtomicBool::new(false);
    let outcome = pipeline::detect_video(detector, input, &out_path, style, &stop, |done, total| {
        if bar.length() != Some(total) {
            bar.set_length(total);
        }
        bar.set_position(done);
    })?;
    bar.finish_and_clear();

    pipeline::write_report(&outcome.report, &out_path.with_extension("json"))?;

    println!("✔ Saved: {}", out_path.display());
    println!(
        "  {} frames, {} detections",
        outcome.report.frames_processed, outcome.report.total_detections
    );
    Ok(())
}

fn detect_folder(
    detector: &mut Detector,
    input: &Path,
    output: Option<&Path>,
    style: &LabelStyle,
) -> Result<()> {
    let images = pipeline::scan_images(input)?;
    if images.is_empty() {
        bail!(skyscope_common::SkyscopeError::NoImagesFound(
            input.display().to_string()
        ));
    }
    println!("✔ {} images found", images.len());

    let out_dir = output_dir_for(input, output)?;
    let bar = ProgressBar::new(images.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} images")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut combined = skyscope_common::DetectionReport::new(
        &input.display().to_string(),
        &detector.model_name(),
    );
    for image in &images {
        let out_path = pipeline::default_output_path(image, &out_dir, false);
        let outcome = pipeline::detect_image(detector, image, &out_path, style)?;

        combined.frames_processed += outcome.report.frames_processed;
        combined.total_detections += outcome.report.total_detections;
        for (name, count) in outcome.report.class_counts {
            *combined.class_counts.entry(name).or_insert(0) += count;
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    pipeline::write_report(&combined, &out_dir.join("detection_report.json"))?;
    println!("✔ Outputs in: {}", out_dir.display());
    println!("  {} detections total", combined.total_detections);
    Ok(())
}
