//! The frame loop and the device lifecycle.
//!
//! One synchronous loop per process: read a frame, run inference, rank the
//! results, paint the display. Failure policy is layered:
//!
//! - Transient capture errors are retried a bounded number of times with a
//!   short backoff, then escalate to fatal.
//! - Inference errors never reach this module (`Detector::infer` degrades
//!   them to an empty set).
//! - A failed render is retried once, then the cycle's visual update is
//!   skipped; the loop keeps running.
//!
//! Teardown is unconditional: whatever path ends the loop, the display is
//! blanked and both devices are closed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::Context;

use crate::capture::{CameraSource, CaptureError};
use crate::detect::Detector;
use crate::display::DisplayRenderer;
use crate::fps::FpsEstimator;
use crate::frame::Frame;
use crate::labels::{self, Locale};
use crate::rank;

const READ_RETRIES: u32 = 3;
const READ_RETRY_BACKOFF: Duration = Duration::from_millis(50);

pub struct Pipeline {
    camera: Box<dyn CameraSource>,
    detector: Detector,
    display: Box<dyn DisplayRenderer>,
    fps: FpsEstimator,
    max_labels: usize,
    locale: Locale,
}

impl Pipeline {
    pub fn new(
        camera: Box<dyn CameraSource>,
        detector: Detector,
        display: Box<dyn DisplayRenderer>,
        nominal_fps: u32,
        max_labels: usize,
        locale: Locale,
    ) -> Self {
        Self {
            camera,
            detector,
            display,
            fps: FpsEstimator::new(f64::from(nominal_fps)),
            max_labels,
            locale,
        }
    }

    /// Run until `cancel` is set or a fatal error ends the loop.
    ///
    /// Devices are opened here and are guaranteed to be closed (and the
    /// display blanked) on every exit path, error or not.
    pub fn run(&mut self, cancel: &AtomicBool) -> anyhow::Result<()> {
        self.camera
            .open()
            .with_context(|| format!("open camera {}", self.camera.device()))?;
        if let Err(err) = self.display.open() {
            self.camera.close();
            return Err(err).context("open display");
        }
        log::info!(
            "pipeline up: camera {}, {} backend",
            self.camera.device(),
            self.detector.backend_name()
        );

        let result = self.frame_loop(cancel);
        self.shutdown();
        result
    }

    fn frame_loop(&mut self, cancel: &AtomicBool) -> anyhow::Result<()> {
        loop {
            if cancel.load(Ordering::SeqCst) {
                log::info!("shutdown requested");
                return Ok(());
            }

            let frame = self.read_with_retry()?;
            let detections = self.detector.infer(&frame);
            let lines = rank::rank(
                &detections,
                self.max_labels,
                &self.display.geometry(),
                self.locale,
            );
            let fps = self.fps.update(frame.captured_at);

            if let Some(top) = detections.iter().next() {
                log::info!(
                    "{} detection(s), top: {} {}%",
                    detections.len(),
                    labels::resolve(top.class_id, self.locale),
                    rank::confidence_percent(top.confidence)
                );
            } else {
                log::debug!("no detections");
            }

            if let Err(err) = self.display.render(&lines, fps) {
                log::warn!("render failed ({err}), retrying once");
                if let Err(err) = self.display.render(&lines, fps) {
                    log::warn!("render retry failed ({err}), skipping this cycle");
                }
            }
        }
    }

    /// Read one frame, absorbing up to `READ_RETRIES` transient failures.
    fn read_with_retry(&mut self) -> anyhow::Result<Frame> {
        let mut attempt = 0;
        loop {
            match self.camera.read_frame() {
                Ok(frame) => return Ok(frame),
                Err(CaptureError::Transient(reason)) if attempt < READ_RETRIES => {
                    attempt += 1;
                    log::warn!(
                        "transient capture failure on {} (attempt {attempt}/{READ_RETRIES}): {reason}",
                        self.camera.device()
                    );
                    thread::sleep(READ_RETRY_BACKOFF);
                }
                Err(CaptureError::Transient(reason)) => {
                    return Err(CaptureError::Fatal(format!(
                        "capture still failing after {READ_RETRIES} retries: {reason}"
                    ))
                    .into());
                }
                Err(err) => return Err(err).context("capture"),
            }
        }
    }

    fn shutdown(&mut self) {
        if self.display.is_open() {
            if let Err(err) = self.display.blank() {
                log::warn!("failed to blank display at shutdown: {err}");
            }
        }
        self.display.close();
        self.camera.close();
        log::info!("pipeline down");
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        // Backstop for panics and early returns outside `run`.
        if self.display.is_open() || self.camera.state() != crate::capture::SourceState::Closed {
            self.shutdown();
        }
    }
}
