use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use eframe::egui::{self, Color32, RichText, TextureHandle};

use crate::player::VideoPlayer;
use crate::predict::{self, PredictJob, PredictMsg, PredictSource};
use crate::stream::{self, StreamCommand, StreamEvent, StreamWorker};
use skyscope_common::annotate::{self, LabelStyle};
use skyscope_common::control::{self, ControlClient};
use skyscope_common::session::{self, InspectionDetails, InspectionSession, ProjectLayout};
use skyscope_common::video::{self, Frame, RgbaFrame, StreamSource};
use skyscope_common::{CaptureTally, Config, Detector, DetectorConfig, FilterSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Import,
    Stream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileType {
    Video,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamMode {
    DeviceCamera,
    DroneRtmp,
}

struct CaptureState {
    frame: Frame,
    texture: TextureHandle,
    tally: CaptureTally,
}

pub struct InspectorApp {
    config: Config,
    tab: Tab,
    status: String,

    // inspection details form
    location: String,
    inspector: String,
    serial_number: String,
    rated_voltage: String,
    height: String,
    details_saved: bool,
    layout: Option<ProjectLayout>,
    session: Option<InspectionSession>,

    // imported media
    file_type: FileType,
    image_path: Option<PathBuf>,
    player: Option<VideoPlayer>,
    media_texture: Option<TextureHandle>,
    capture: Option<CaptureState>,

    // detection
    detector: Option<Arc<Mutex<Detector>>>,
    model_status: String,
    predict: Option<PredictJob>,
    predict_progress: Option<(u64, u64)>,

    // live stream
    stream_mode: StreamMode,
    camera_index: i32,
    control_ip: String,
    stream: Option<StreamWorker>,
    stream_texture: Option<TextureHandle>,
    filters_ui: FilterSettings,
    recording: bool,
    record_started: Option<Instant>,
    record_name: String,
    capture_name: String,
    client: Option<ControlClient>,
}

impl InspectorApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let config = Config::load().unwrap_or_else(|err| {
            log::warn!("config load failed, using defaults: {err}");
            Config::default()
        });

        let base = config
            .project_root
            .clone()
            .or_else(|| {
                std::env::current_exe()
                    .ok()
                    .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            })
            .unwrap_or_else(|| PathBuf::from("."));

        let mut status = String::new();
        let layout = match ProjectLayout::default_under(&base) {
            Ok(layout) => Some(layout),
            Err(err) => {
                status = format!("Project folder unavailable: {err}");
                None
            }
        };

        let control_ip = config.control_ip.clone();
        Self {
            config,
            tab: Tab::Import,
            status,
            location: String::new(),
            inspector: String::new(),
            serial_number: String::new(),
            rated_voltage: String::new(),
            height: String::new(),
            details_saved: false,
            layout,
            session: None,
            file_type: FileType::Video,
            image_path: None,
            player: None,
            media_texture: None,
            capture: None,
            detector: None,
            model_status: String::new(),
            predict: None,
            predict_progress: None,
            stream_mode: StreamMode::DeviceCamera,
            camera_index: 0,
            control_ip,
            stream: None,
            stream_texture: None,
            filters_ui: FilterSettings::default(),
            recording: false,
            record_started: None,
            record_name: String::new(),
            capture_name: String::new(),
            client: None,
        }
    }

    // ----- inspection details -----

    fn save_details(&mut self) {
        let Some(layout) = &self.layout else {
            self.status = "No project folder available".to_string();
            return;
        };

        let details = InspectionDetails {
            location: self.location.trim().to_string(),
            inspector: self.inspector.trim().to_string(),
            serial_number: self.serial_number.trim().to_string(),
            rated_voltage: self.rated_voltage.trim().to_string(),
            height: self.height.trim().to_string(),
        };

        match InspectionSession::create(&layout.root, details, &session::today_string()) {
            Ok(inspection) => {
                // Reflect the defaulted inspector back into the form.
                self.inspector = inspection.details.inspector.clone();
                self.status = format!(
                    "{} saved",
                    inspection
                        .info_file
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default()
                );
                self.session = Some(inspection);
                self.details_saved = true;
            }
            Err(err) => {
                self.status = format!("Incomplete Information: {err}");
            }
        }
    }

    fn new_file(&mut self) {
        self.details_saved = false;
        self.session = None;
        self.location.clear();
        self.inspector.clear();
        self.serial_number.clear();
        self.rated_voltage.clear();
        self.height.clear();
        self.clear_media();
        self.status.clear();
    }

    fn pick_project_dir(&mut self) {
        if let Some(dir) = rfd::FileDialog::new().pick_folder() {
            match ProjectLayout::from_chosen_dir(&dir) {
                Ok(layout) => {
                    self.status = format!("Project folder: {}", layout.root.display());
                    self.layout = Some(layout);
                }
                Err(err) => {
                    self.status = format!("Invalid project folder: {err}");
                }
            }
        }
    }

    // ----- media import and playback -----

    fn clear_media(&mut self) {
        if let Some(mut player) = self.player.take() {
            player.release();
        }
        self.image_path = None;
        self.media_texture = None;
        self.capture = None;
    }

    fn import_media(&mut self, ctx: &egui::Context) {
        if !self.details_saved {
            self.status = "Missing: Inspection Details".to_string();
            return;
        }

        match self.file_type {
            FileType::Video => {
                let Some(path) = rfd::FileDialog::new()
                    .add_filter("Video Files", &["mp4", "avi", "wmv"])
                    .pick_file()
                else {
                    return;
                };
                self.clear_media();
                match VideoPlayer::open(&path) {
                    Ok(mut player) => {
                        match player.show_current() {
                            Ok(Some(rgba)) => {
                                self.media_texture = Some(upload(ctx, "media", &rgba));
                            }
                            Ok(None) => {}
                            Err(err) => log::warn!("first frame failed: {err}"),
                        }
                        self.status = format!("Imported {}", path.display());
                        self.player = Some(player);
                    }
                    Err(err) => {
                        self.status = format!("Import failed: {err}");
                    }
                }
            }
            FileType::Image => {
                let Some(path) = rfd::FileDialog::new()
                    .add_filter("Image Files", &["jpg", "jpeg", "png"])
                    .pick_file()
                else {
                    return;
                };
                self.clear_media();
                let loaded = image::ImageReader::open(&path)
                    .map_err(|e| e.to_string())
                    .and_then(|r| r.decode().map_err(|e| e.to_string()));
                match loaded {
                    Ok(img) => {
                        let rgb = img.into_rgb8();
                        let size = [rgb.width() as usize, rgb.height() as usize];
                        let color = egui::ColorImage::from_rgb(size, rgb.as_raw());
                        self.media_texture =
                            Some(ctx.load_texture("media", color, egui::TextureOptions::LINEAR));
                        self.status = format!("Imported {}", path.display());
                        self.image_path = Some(path);
                    }
                    Err(err) => {
                        self.status = format!("Import failed: {err}");
                    }
                }
            }
        }
    }

    fn tick_player(&mut self, ctx: &egui::Context) {
        let mut next_frame = None;
        if let Some(player) = &mut self.player {
            match player.tick() {
                Ok(Some(rgba)) => next_frame = Some(rgba),
                Ok(None) => {}
                Err(err) => {
                    self.status = format!("Playback error: {err}");
                }
            }
        }
        if let Some(rgba) = next_frame {
            self.media_texture = Some(upload(ctx, "media", &rgba));
        }
    }

    // ----- frame capture -----

    fn open_capture_dialog(&mut self, ctx: &egui::Context) {
        let frame = match self.file_type {
            FileType::Image => match &self.image_path {
                Some(path) => video::load_rgb_image(path)
                    .and_then(|rgb| Frame::from_rgb_image(&rgb))
                    .map(Some),
                None => {
                    self.status = "Invalid Action: missing media file".to_string();
                    return;
                }
            },
            FileType::Video => match &mut self.player {
                Some(player) => {
                    if !player.paused {
                        player.toggle_pause();
                    }
                    player.current_frame_image()
                }
                None => {
                    self.status = "Invalid Action: missing media file".to_string();
                    return;
                }
            },
        };

        match frame {
            Ok(Some(frame)) => match frame.to_rgba_frame() {
                Ok(rgba) => {
                    let texture = upload(ctx, "capture", &rgba);
                    self.capture = Some(CaptureState {
                        frame,
                        texture,
                        tally: CaptureTally::default(),
                    });
                }
                Err(err) => self.status = format!("Capture failed: {err}"),
            },
            Ok(None) => self.status = "Capture failed: no frame".to_string(),
            Err(err) => self.status = format!("Capture failed: {err}"),
        }
    }

    fn save_capture(&mut self, mut capture: CaptureState) {
        let Some(session) = &self.session else {
            self.status = "Missing: Inspection Details".to_string();
            return;
        };

        let result = annotate::stamp_tally(&mut capture.frame, &capture.tally).and_then(|_| {
            let path = session.capture_path(&session::time_stamp());
            capture.frame.save(&path).map(|_| path)
        });
        match result {
            Ok(path) => self.status = format!("Captured frame saved: {}", path.display()),
            Err(err) => self.status = format!("Capture save failed: {err}"),
        }
    }

    // ----- detection -----

    fn load_model(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("ONNX model", &["onnx"])
            .pick_file()
        else {
            return;
        };

        match Detector::load(&path, DetectorConfig::from_config(&self.config)) {
            Ok(detector) => {
                self.model_status = format!("Model Loaded: {}", detector.model_name());
                self.detector = Some(Arc::new(Mutex::new(detector)));
            }
            Err(err) => {
                self.model_status.clear();
                self.status = format!("Model load failed: {err}");
            }
        }
    }

    fn toggle_detection(&mut self) {
        if let Some(job) = &self.predict {
            job.request_stop();
            self.status = "Stopping detection...".to_string();
            return;
        }

        let Some(detector) = self.detector.clone() else {
            self.status = "Model not loaded".to_string();
            return;
        };
        let Some(session) = self.session.clone() else {
            self.status = "Missing: Inspection Details".to_string();
            return;
        };

        let source = match self.file_type {
            FileType::Video => match &self.player {
                Some(player) => PredictSource::Video(player.path.clone()),
                None => {
                    self.status = "No Video Available".to_string();
                    return;
                }
            },
            FileType::Image => match &self.image_path {
                Some(path) => PredictSource::Image(path.clone()),
                None => {
                    self.status = "No Image Available".to_string();
                    return;
                }
            },
        };

        if let Some(player) = &mut self.player {
            if !player.paused {
                player.toggle_pause();
            }
        }

        self.predict = Some(predict::spawn(
            detector,
            source,
            session,
            LabelStyle::default(),
        ));
        self.status = "Running detection...".to_string();
    }

    fn poll_predict(&mut self) {
        let mut messages = Vec::new();
        if let Some(job) = &self.predict {
            while let Ok(msg) = job.rx.try_recv() {
                messages.push(msg);
            }
        }

        for msg in messages {
            match msg {
                PredictMsg::Progress { done, total } => {
                    self.predict_progress = Some((done, total));
                }
                PredictMsg::Done { message, output } => {
                    self.status = format!("{message} → {}", output.display());
                    self.predict = None;
                    self.predict_progress = None;
                }
                PredictMsg::Failed { message } => {
                    self.status = message;
                    self.predict = None;
                    self.predict_progress = None;
                }
            }
        }
    }

    // ----- live stream -----

    fn start_stream(&mut self) {
        if self.stream.is_some() {
            return;
        }

        let source = match self.stream_mode {
            StreamMode::DeviceCamera => StreamSource::Device(self.camera_index),
            StreamMode::DroneRtmp => {
                let ip = if self.control_ip.trim().is_empty() {
                    self.config.control_ip.clone()
                } else {
                    self.control_ip.trim().to_string()
                };
                let local = control::local_ipv4();

                match ControlClient::connect(
                    &ip,
                    self.config.control_port,
                    Duration::from_secs(self.config.request_timeout_secs),
                ) {
                    Ok(client) => {
                        if let Err(err) = client.start_live_stream(&local) {
                            self.status = format!("Control server rejected start: {err}");
                        }
                        self.client = Some(client);
                    }
                    Err(err) => {
                        // Keep going: streams already pushed into the relay
                        // are still viewable.
                        log::warn!("control server unreachable: {err}");
                        self.status =
                            "Control server unreachable, trying streams already connected to the relay"
                                .to_string();
                    }
                }
                StreamSource::Url(control::local_rtmp_url())
            }
        };

        self.stream = Some(stream::spawn(source, self.filters_ui));
    }

    fn stop_stream(&mut self) {
        if self.recording {
            if let Some(worker) = &self.stream {
                let _ = worker.commands.send(StreamCommand::StopRecord);
            }
        }
        if let Some(worker) = &self.stream {
            worker.request_stop();
        }
        if let Some(client) = self.client.take() {
            if let Err(err) = client.stop_live_stream() {
                log::warn!("stop live stream failed: {err}");
            }
        }
    }

    fn poll_stream(&mut self, ctx: &egui::Context) {
        let mut latest_frame: Option<RgbaFrame> = None;
        let mut events = Vec::new();
        if let Some(worker) = &self.stream {
            while let Ok(frame) = worker.frames.try_recv() {
                latest_frame = Some(frame);
            }
            while let Ok(event) = worker.events.try_recv() {
                events.push(event);
            }
        }

        if let Some(rgba) = latest_frame {
            self.stream_texture = Some(upload(ctx, "stream", &rgba));
        }

        for event in events {
            match event {
                StreamEvent::Started => {
                    self.status = "Stream running".to_string();
                }
                StreamEvent::RecordingStarted => {
                    self.recording = true;
                    self.record_started = Some(Instant::now());
                }
                StreamEvent::RecordingSaved(path) => {
                    self.recording = false;
                    self.record_started = None;
                    self.status = format!("Recording saved: {}", path.display());
                }
                StreamEvent::CaptureSaved(path) => {
                    self.status = format!("Saved capture: {}", path.display());
                }
                StreamEvent::Error(message) => {
                    self.status = format!("Stream: {message}");
                }
                StreamEvent::Stopped => {
                    self.stream = None;
                    self.stream_texture = None;
                    self.recording = false;
                    self.record_started = None;
                    if let Some(client) = self.client.take() {
                        if let Err(err) = client.stop_live_stream() {
                            log::warn!("stop live stream failed: {err}");
                        }
                    }
                }
            }
        }
    }

    // ----- UI -----

    fn import_tab(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("import_panel")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.heading("Inspection Details");
                ui.add_space(4.0);

                let editable = !self.details_saved;
                egui::Grid::new("details_grid")
                    .num_columns(2)
                    .striped(true)
                    .show(ui, |ui| {
                        ui.label("Location");
                        ui.add_enabled(
                            editable,
                            egui::TextEdit::singleline(&mut self.location)
                                .hint_text("Street, City, Zip"),
                        );
                        ui.end_row();

                        ui.label("Inspector");
                        ui.add_enabled(
                            editable,
                            egui::TextEdit::singleline(&mut self.inspector)
                                .hint_text("Firstname MI Lastname"),
                        );
                        ui.end_row();

                        ui.label("Serial Number");
                        ui.add_enabled(
                            editable,
                            egui::TextEdit::singleline(&mut self.serial_number)
                                .hint_text("**********"),
                        );
                        ui.end_row();

                        ui.label("Rated Voltage");
                        ui.add_enabled(
                            editable,
                            egui::TextEdit::singleline(&mut self.rated_voltage),
                        );
                        ui.end_row();

                        ui.label("Height");
                        ui.add_enabled(editable, egui::TextEdit::singleline(&mut self.height));
                        ui.end_row();
                    });

                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(
                            editable,
                            egui::Button::new(if editable { "Save" } else { "Saved" }),
                        )
                        .clicked()
                    {
                        self.save_details();
                    }
                    if ui
                        .add_enabled(self.details_saved, egui::Button::new("New File"))
                        .clicked()
                    {
                        self.new_file();
                    }
                });

                ui.separator();
                if let Some(layout) = &self.layout {
                    ui.label(
                        RichText::new(layout.root.display().to_string())
                            .color(Color32::from_gray(170))
                            .size(11.0),
                    );
                }
                if ui.button("Change Project Folder...").clicked() {
                    self.pick_project_dir();
                }

                ui.separator();
                ui.heading("Footage");
                ui.horizontal(|ui| {
                    let previous = self.file_type;
                    egui::ComboBox::from_id_source("file_type")
                        .selected_text(match self.file_type {
                            FileType::Video => "Video",
                            FileType::Image => "Image",
                        })
                        .show_ui(ui, |ui| {
                            ui.selectable_value(&mut self.file_type, FileType::Video, "Video");
                            ui.selectable_value(&mut self.file_type, FileType::Image, "Image");
                        });
                    if previous != self.file_type {
                        self.clear_media();
                    }
                    if ui.button("Import").clicked() {
                        self.import_media(ctx);
                    }
                });

                ui.separator();
                ui.heading("Detection");
                if ui.button("Load Model...").clicked() {
                    self.load_model();
                }
                if !self.model_status.is_empty() {
                    ui.label(
                        RichText::new(&self.model_status).color(Color32::from_rgb(120, 200, 120)),
                    );
                }

                let run_label = if self.predict.is_some() {
                    "Stop Processing"
                } else {
                    "Run Detection"
                };
                if ui.button(run_label).clicked() {
                    self.toggle_detection();
                }
                if let Some((done, total)) = self.predict_progress {
                    let fraction = if total > 0 {
                        done as f32 / total as f32
                    } else {
                        0.0
                    };
                    ui.add(
                        egui::ProgressBar::new(fraction)
                            .text(format!("{done}/{total} frames")),
                    );
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(texture) = &self.media_texture {
                ui.add(
                    egui::Image::new(texture)
                        .max_size(ui.available_size() - egui::vec2(0.0, 60.0))
                        .maintain_aspect_ratio(true),
                );
            } else {
                ui.centered_and_justified(|ui| {
                    ui.label("Import footage to review it here.");
                });
            }

            let mut seek_target: Option<u64> = None;
            let mut skip: Option<f64> = None;
            let mut toggle_play = false;
            let mut capture_clicked = false;

            if let Some(player) = &mut self.player {
                ui.horizontal(|ui| {
                    if ui
                        .button(if player.paused { "▶" } else { "⏸" })
                        .clicked()
                    {
                        toggle_play = true;
                    }
                    if ui.button("−10 s").clicked() {
                        skip = Some(-10.0);
                    }
                    if ui.button("+10 s").clicked() {
                        skip = Some(10.0);
                    }

                    let last = player.total_frames.saturating_sub(1);
                    let mut position = player.current_frame;
                    if ui
                        .add(
                            egui::Slider::new(&mut position, 0..=last.max(1))
                                .show_value(false),
                        )
                        .changed()
                    {
                        seek_target = Some(position);
                    }

                    ui.label("Speed");
                    ui.add(
                        egui::Slider::new(&mut player.speed, 0.25..=2.0)
                            .show_value(false),
                    );

                    if ui.button("Capture Frame").clicked() {
                        capture_clicked = true;
                    }
                });
            } else if self.image_path.is_some() {
                ui.horizontal(|ui| {
                    if ui.button("Capture Frame").clicked() {
                        capture_clicked = true;
                    }
                });
            }

            let mut shown: Option<RgbaFrame> = None;
            if let Some(player) = &mut self.player {
                if toggle_play {
                    player.toggle_pause();
                }
                let result = if let Some(target) = seek_target {
                    player.seek_to(target)
                } else if let Some(seconds) = skip {
                    player.skip_seconds(seconds)
                } else {
                    Ok(None)
                };
                match result {
                    Ok(frame) => shown = frame,
                    Err(err) => self.status = format!("Playback error: {err}"),
                }
            }
            if let Some(rgba) = shown {
                self.media_texture = Some(upload(ctx, "media", &rgba));
            }
            if capture_clicked {
                self.open_capture_dialog(ctx);
            }
        });

        self.capture_window(ctx);
    }

    fn capture_window(&mut self, ctx: &egui::Context) {
        let mut open = true;
        let mut save_clicked = false;

        if let Some(capture) = &mut self.capture {
            egui::Window::new("Captured Frame")
                .open(&mut open)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.add(
                        egui::Image::new(&capture.texture)
                            .max_size(egui::vec2(820.0, 460.0))
                            .maintain_aspect_ratio(true),
                    );
                    ui.horizontal(|ui| {
                        ui.label("Mahogany Leaves");
                        ui.add(egui::DragValue::new(&mut capture.tally.leaves).clamp_range(0..=999));
                        ui.label("Mahogany Fruit");
                        ui.add(egui::DragValue::new(&mut capture.tally.fruit).clamp_range(0..=999));
                        ui.label("Mahogany Branches");
                        ui.add(
                            egui::DragValue::new(&mut capture.tally.branches).clamp_range(0..=999),
                        );
                    });
                    if ui.button("Save Frame").clicked() {
                        save_clicked = true;
                    }
                });
        }

        if save_clicked {
            if let Some(capture) = self.capture.take() {
                self.save_capture(capture);
            }
        } else if !open {
            self.capture = None;
        }
    }

    fn stream_tab(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("stream_panel")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.heading("Live View");
                ui.add_space(4.0);

                let streaming = self.stream.is_some();
                ui.add_enabled_ui(!streaming, |ui| {
                    egui::ComboBox::from_label("Source")
                        .selected_text(match self.stream_mode {
                            StreamMode::DeviceCamera => "Device Camera",
                            StreamMode::DroneRtmp => "DJI Drone (RTMP)",
                        })
                        .show_ui(ui, |ui| {
                            ui.selectable_value(
                                &mut self.stream_mode,
                                StreamMode::DeviceCamera,
                                "Device Camera",
                            );
                            ui.selectable_value(
                                &mut self.stream_mode,
                                StreamMode::DroneRtmp,
                                "DJI Drone (RTMP)",
                            );
                        });

                    match self.stream_mode {
                        StreamMode::DeviceCamera => {
                            ui.horizontal(|ui| {
                                ui.label("Camera index");
                                ui.add(egui::DragValue::new(&mut self.camera_index).clamp_range(0..=8));
                            });
                        }
                        StreamMode::DroneRtmp => {
                            ui.label("IP Address of DJI Mini 2 Control Server");
                            ui.add(
                                egui::TextEdit::singleline(&mut self.control_ip)
                                    .hint_text(&self.config.control_ip),
                            );
                        }
                    }
                });

                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(!streaming, egui::Button::new("Start Stream"))
                        .clicked()
                    {
                        self.start_stream();
                    }
                    if ui
                        .add_enabled(streaming, egui::Button::new("Stop Stream"))
                        .clicked()
                    {
                        self.stop_stream();
                    }
                });

                ui.separator();
                ui.heading("Filters");
                let mut changed = false;
                changed |= ui
                    .add(egui::Slider::new(&mut self.filters_ui.brightness, -255..=255).text("Brightness"))
                    .changed();
                changed |= ui
                    .add(egui::Slider::new(&mut self.filters_ui.contrast, 0..=255).text("Contrast"))
                    .changed();
                changed |= ui
                    .add(egui::Slider::new(&mut self.filters_ui.saturation, -255..=255).text("Saturation"))
                    .changed();
                if changed {
                    if let Some(worker) = &self.stream {
                        if let Ok(mut filters) = worker.filters.lock() {
                            *filters = self.filters_ui;
                        }
                    }
                }

                ui.separator();
                ui.heading("Recording");
                ui.horizontal(|ui| {
                    ui.label("File name");
                    ui.add_enabled(
                        !self.recording,
                        egui::TextEdit::singleline(&mut self.record_name).desired_width(140.0),
                    );
                });
                let record_label = if self.recording {
                    "■ Stop Recording"
                } else {
                    "● Record"
                };
                if ui.add_enabled(streaming, egui::Button::new(record_label)).clicked() {
                    self.toggle_recording();
                }
                if let Some(started) = self.record_started {
                    ui.label(
                        RichText::new(format!(
                            "Recording time: {}",
                            format_elapsed(started.elapsed())
                        ))
                        .color(Color32::from_rgb(230, 90, 90)),
                    );
                }

                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    ui.label("Capture name");
                    ui.add(egui::TextEdit::singleline(&mut self.capture_name).desired_width(140.0));
                });
                if ui
                    .add_enabled(streaming, egui::Button::new("Capture Frame"))
                    .clicked()
                {
                    self.capture_stream_frame();
                }

                if let Some(layout) = &self.layout {
                    ui.separator();
                    ui.label(
                        RichText::new(layout.recordings_dir().display().to_string())
                            .color(Color32::from_gray(170))
                            .size(11.0),
                    );
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(texture) = &self.stream_texture {
                ui.add(
                    egui::Image::new(texture)
                        .max_size(ui.available_size())
                        .maintain_aspect_ratio(true),
                );
            } else {
                ui.centered_and_justified(|ui| {
                    ui.label("Start a stream to see the live view.");
                });
            }
        });
    }

    fn toggle_recording(&mut self) {
        let Some(worker) = &self.stream else {
            self.status = "Start stream first".to_string();
            return;
        };

        if self.recording {
            let _ = worker.commands.send(StreamCommand::StopRecord);
            return;
        }

        let name = self.record_name.trim();
        if name.is_empty() {
            self.status = "Enter a file name for the recording".to_string();
            return;
        }
        let Some(layout) = &self.layout else {
            self.status = "No project folder available".to_string();
            return;
        };
        let path = layout.recordings_dir().join(format!("{name}.mp4"));
        let _ = worker.commands.send(StreamCommand::StartRecord(path));
    }

    fn capture_stream_frame(&mut self) {
        let Some(worker) = &self.stream else {
            self.status = "Start stream first".to_string();
            return;
        };
        let name = self.capture_name.trim();
        if name.is_empty() {
            self.status = "Enter a file name for the capture".to_string();
            return;
        }
        let Some(layout) = &self.layout else {
            self.status = "No project folder available".to_string();
            return;
        };
        let path = layout.recordings_dir().join(format!("{name}.png"));
        let _ = worker.commands.send(StreamCommand::Capture(path));
    }
}

impl eframe::App for InspectorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_predict();
        self.poll_stream(ctx);
        self.tick_player(ctx);

        let previous_tab = self.tab;
        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("SkyScope");
                ui.separator();
                ui.selectable_value(&mut self.tab, Tab::Import, "Import Footage");
                ui.selectable_value(&mut self.tab, Tab::Stream, "Start Live View");
                ui.separator();
                if !self.status.is_empty() {
                    ui.label(RichText::new(&self.status).color(Color32::from_gray(180)));
                }
            });
        });

        // Leaving the stream tab shuts the live view down.
        if previous_tab == Tab::Stream && self.tab != Tab::Stream && self.stream.is_some() {
            self.stop_stream();
        }

        match self.tab {
            Tab::Import => self.import_tab(ctx),
            Tab::Stream => self.stream_tab(ctx),
        }

        if self.stream.is_some() || self.predict.is_some() {
            ctx.request_repaint();
        } else if let Some(player) = &self.player {
            if !player.paused {
                ctx.request_repaint_after(player.frame_interval() / 2);
            }
        }
    }
}

fn upload(ctx: &egui::Context, name: &str, rgba: &RgbaFrame) -> TextureHandle {
    let image = egui::ColorImage::from_rgba_unmultiplied(rgba.size, &rgba.pixels);
    ctx.load_texture(name, image, egui::TextureOptions::LINEAR)
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_formats_as_hms() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_elapsed(Duration::from_secs(61)), "00:01:01");
        assert_eq!(format_elapsed(Duration::from_secs(3723)), "01:02:03");
    }
}
