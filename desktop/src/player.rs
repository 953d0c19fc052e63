//! UI-thread video playback over the shared video reader: the frame
//! clock lives here, decoding happens on demand per tick.

use skyscope_common::video::{Frame, RgbaFrame, VideoReader};
use skyscope_common::Result;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub struct VideoPlayer {
    reader: VideoReader,
    pub path: PathBuf,
    pub fps: f64,
    pub total_frames: u64,
    pub current_frame: u64,
    pub paused: bool,
    /// Playback-speed multiplier driven by the speed slider.
    pub speed: f32,
    last_advance: Instant,
}

impl VideoPlayer {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = VideoReader::open_file(path)?;
        let meta = reader.meta();
        Ok(Self {
            reader,
            path: path.to_path_buf(),
            fps: if meta.fps > 0.0 { meta.fps } else { 30.0 },
            total_frames: meta.frame_count,
            current_frame: 0,
            paused: false,
            speed: 1.0,
            last_advance: Instant::now(),
        })
    }

    pub fn frame_interval(&self) -> Duration {
        let fps = self.fps * self.speed.max(0.05) as f64;
        Duration::from_secs_f64(1.0 / fps.max(1.0))
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        self.last_advance = Instant::now();
    }

    /// Advance the clock; returns a frame only when it is time for one.
    /// At the end of the clip the player rewinds and pauses.
    pub fn tick(&mut self) -> Result<Option<RgbaFrame>> {
        if self.paused {
            return Ok(None);
        }
        if self.last_advance.elapsed() < self.frame_interval() {
            return Ok(None);
        }

        let next = self.current_frame + 1;
        if self.total_frames > 0 && next >= self.total_frames {
            self.current_frame = 0;
            self.paused = true;
            return self.show_current();
        }
        self.current_frame = next;
        self.last_advance = Instant::now();
        self.show_current()
    }

    /// Jump to an absolute frame (scrubber).
    pub fn seek_to(&mut self, frame_index: u64) -> Result<Option<RgbaFrame>> {
        let last = self.total_frames.saturating_sub(1);
        self.current_frame = frame_index.min(last);
        self.show_current()
    }

    /// Skip forwards/backwards by seconds (the +/-10 s buttons).
    pub fn skip_seconds(&mut self, seconds: f64) -> Result<Option<RgbaFrame>> {
        let delta = (self.fps * seconds) as i64;
        let target = self.current_frame as i64 + delta;
        let last = self.total_frames.saturating_sub(1) as i64;
        self.seek_to(target.clamp(0, last.max(0)) as u64)
    }

    /// Decode the frame at the current position for display.
    pub fn show_current(&mut self) -> Result<Option<RgbaFrame>> {
        match self.reader.read_frame_at(self.current_frame)? {
            Some(frame) => Ok(Some(frame.to_rgba_frame()?)),
            None => Ok(None),
        }
    }

    /// The raw frame at the current position (capture dialog).
    pub fn current_frame_image(&mut self) -> Result<Option<Frame>> {
        self.reader.read_frame_at(self.current_frame)
    }

    pub fn release(&mut self) {
        self.reader.release();
    }
}
