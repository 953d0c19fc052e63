//! Background detection runs. One worker at a time; the Run button's
//! stop flag is polled between frames.

use skyscope_common::annotate::LabelStyle;
use skyscope_common::pipeline;
use skyscope_common::{Detector, InspectionSession};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};

pub enum PredictMsg {
    Progress { done: u64, total: u64 },
    Done { message: String, output: PathBuf },
    Failed { message: String },
}

pub enum PredictSource {
    Image(PathBuf),
    Video(PathBuf),
}

pub struct PredictJob {
    pub rx: Receiver<PredictMsg>,
    stop: Arc<AtomicBool>,
}

impl PredictJob {
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

pub fn spawn(
    detector: Arc<Mutex<Detector>>,
    source: PredictSource,
    session: InspectionSession,
    style: LabelStyle,
) -> PredictJob {
    let (tx, rx) = mpsc::channel();
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);

    std::thread::spawn(move || {
        let Ok(mut detector) = detector.lock() else {
            let _ = tx.send(PredictMsg::Failed {
                message: "detector is unavailable".to_string(),
            });
            return;
        };

        let result = match &source {
            PredictSource::Image(path) => {
                let output = session.detection_output_path(path, false);
                pipeline::detect_image(&mut detector, path, &output, &style)
                    .and_then(|outcome| {
                        pipeline::write_report(&outcome.report, &session.report_path(path))?;
                        Ok((outcome, output))
                    })
            }
            PredictSource::Video(path) => {
                let output = session.detection_output_path(path, true);
                let progress_tx = tx.clone();
                pipeline::detect_video(
                    &mut detector,
                    path,
                    &output,
                    &style,
                    &stop_flag,
                    move |done, total| {
                        let _ = progress_tx.send(PredictMsg::Progress { done, total });
                    },
                )
                .and_then(|outcome| {
                    pipeline::write_report(&outcome.report, &session.report_path(path))?;
                    Ok((outcome, output))
                })
            }
        };

        let msg = match result {
            Ok((outcome, output)) => {
                let message = if outcome.cancelled {
                    format!(
                        "Detection stopped after {} frames",
                        outcome.report.frames_processed
                    )
                } else {
                    format!(
                        "Detection complete: {} detections",
                        outcome.report.total_detections
                    )
                };
                PredictMsg::Done { message, output }
            }
            Err(err) => PredictMsg::Failed {
                message: format!("Detection failed: {err}"),
            },
        };
        let _ = tx.send(msg);
        log::debug!("prediction worker finished");
    });

    PredictJob { rx, stop }
}
