//! Live-view worker. Owns the capture handle and any active recorder;
//! the UI talks to it only through channels and the shared filter
//! settings, and frames come back as raw RGBA for texture upload.

use skyscope_common::video::{RgbaFrame, StreamSource, VideoReader, VideoSink};
use skyscope_common::FilterSettings;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};

pub enum StreamEvent {
    Started,
    RecordingStarted,
    RecordingSaved(PathBuf),
    CaptureSaved(PathBuf),
    Error(String),
    Stopped,
}

pub enum StreamCommand {
    StartRecord(PathBuf),
    StopRecord,
    Capture(PathBuf),
}

pub struct StreamWorker {
    pub frames: Receiver<RgbaFrame>,
    pub events: Receiver<StreamEvent>,
    pub commands: Sender<StreamCommand>,
    pub filters: Arc<Mutex<FilterSettings>>,
    running: Arc<AtomicBool>,
}

impl StreamWorker {
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

pub fn spawn(source: StreamSource, filters: FilterSettings) -> StreamWorker {
    // Frames ride a small bounded queue and get dropped when the UI lags;
    // events must all arrive.
    let (frame_tx, frame_rx) = mpsc::sync_channel::<RgbaFrame>(2);
    let (event_tx, event_rx) = mpsc::channel::<StreamEvent>();
    let (cmd_tx, cmd_rx) = mpsc::channel::<StreamCommand>();

    let filters = Arc::new(Mutex::new(filters));
    let running = Arc::new(AtomicBool::new(true));

    let worker_filters = Arc::clone(&filters);
    let worker_running = Arc::clone(&running);

    std::thread::spawn(move || {
        run_stream(source, frame_tx, event_tx, cmd_rx, worker_filters, worker_running);
    });

    StreamWorker {
        frames: frame_rx,
        events: event_rx,
        commands: cmd_tx,
        filters,
        running,
    }
}

fn run_stream(
    source: StreamSource,
    frame_tx: SyncSender<RgbaFrame>,
    event_tx: Sender<StreamEvent>,
    cmd_rx: Receiver<StreamCommand>,
    filters: Arc<Mutex<FilterSettings>>,
    running: Arc<AtomicBool>,
) {
    let mut reader = match VideoReader::open_source(&source) {
        Ok(reader) => reader,
        Err(err) => {
            let _ = event_tx.send(StreamEvent::Error(format!("{err}")));
            let _ = event_tx.send(StreamEvent::Stopped);
            return;
        }
    };
    let _ = event_tx.send(StreamEvent::Started);

    let mut recorder: Option<VideoSink> = None;
    let mut recording_path: Option<PathBuf> = None;
    let mut pending_capture: Option<PathBuf> = None;

    while running.load(Ordering::Relaxed) {
        while let Ok(cmd) = cmd_rx.try_recv() {
            match cmd {
                StreamCommand::StartRecord(path) => {
                    let meta = reader.meta();
                    let fps = if meta.fps > 0.0 { meta.fps } else { 30.0 };
                    match VideoSink::create(&path, fps, meta.width, meta.height) {
                        Ok(sink) => {
                            recorder = Some(sink);
                            recording_path = Some(path);
                            let _ = event_tx.send(StreamEvent::RecordingStarted);
                        }
                        Err(err) => {
                            let _ = event_tx.send(StreamEvent::Error(format!("{err}")));
                        }
                    }
                }
                StreamCommand::StopRecord => {
                    if let Some(mut sink) = recorder.take() {
                        sink.release();
                        if let Some(path) = recording_path.take() {
                            let _ = event_tx.send(StreamEvent::RecordingSaved(path));
                        }
                    }
                }
                StreamCommand::Capture(path) => {
                    pending_capture = Some(path);
                }
            }
        }

        let mut frame = match reader.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                let _ = event_tx.send(StreamEvent::Error("stream interrupted".to_string()));
                break;
            }
            Err(err) => {
                let _ = event_tx.send(StreamEvent::Error(format!("stream interrupted: {err}")));
                break;
            }
        };

        let settings = filters.lock().map(|s| *s).unwrap_or_default();
        if let Err(err) = settings.apply(&mut frame) {
            log::warn!("filter failed: {err}");
        }

        let mut record_failed = false;
        if let Some(sink) = recorder.as_mut() {
            if let Err(err) = sink.write(&frame) {
                let _ = event_tx.send(StreamEvent::Error(format!("recording failed: {err}")));
                record_failed = true;
            }
        }
        if record_failed {
            // Close out the partial file so the UI leaves recording state.
            if let Some(mut sink) = recorder.take() {
                sink.release();
            }
            if let Some(path) = recording_path.take() {
                let _ = event_tx.send(StreamEvent::RecordingSaved(path));
            }
        }

        if let Some(path) = pending_capture.take() {
            match frame.save(&path) {
                Ok(()) => {
                    let _ = event_tx.send(StreamEvent::CaptureSaved(path));
                }
                Err(err) => {
                    let _ = event_tx.send(StreamEvent::Error(format!("capture failed: {err}")));
                }
            }
        }

        match frame.to_rgba_frame() {
            Ok(rgba) => match frame_tx.try_send(rgba) {
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => break,
            },
            Err(err) => log::warn!("frame conversion failed: {err}"),
        }
    }

    // An interrupted stream still finishes the recording cleanly.
    if let Some(mut sink) = recorder.take() {
        sink.release();
        if let Some(path) = recording_path.take() {
            let _ = event_tx.send(StreamEvent::RecordingSaved(path));
        }
    }
    reader.release();
    let _ = event_tx.send(StreamEvent::Stopped);
    log::debug!("stream worker finished");
}
