//! End-to-end frame-loop lifecycle tests over scripted devices.
//!
//! The camera replays a fixed script of capture outcomes; the display
//! records every call it receives. Together they pin down the loop's
//! failure policy: transient reads retried, fatal reads terminal, render
//! failures skipped, and devices always released.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use sightline::capture::{CameraSource, CaptureError, SourceState};
use sightline::detect::{Detector, StubBackend};
use sightline::display::{DisplayError, DisplayGeometry, DisplayRenderer};
use sightline::frame::Frame;
use sightline::labels::Locale;
use sightline::pipeline::Pipeline;
use sightline::rank::RankedLine;

// ----------------------------------------------------------------------------
// Scripted camera
// ----------------------------------------------------------------------------

enum Capture {
    Frame,
    Transient,
    Fatal,
}

struct ScriptedCamera {
    script: Vec<Capture>,
    cursor: usize,
    state: SourceState,
}

impl ScriptedCamera {
    fn new(script: Vec<Capture>) -> Self {
        Self {
            script,
            cursor: 0,
            state: SourceState::Closed,
        }
    }
}

impl CameraSource for ScriptedCamera {
    fn device(&self) -> &str {
        "stub://scripted"
    }

    fn open(&mut self) -> Result<(), CaptureError> {
        self.state = SourceState::Open;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let step = self.script.get(self.cursor);
        self.cursor += 1;
        match step {
            Some(Capture::Frame) => {
                self.state = SourceState::Open;
                Ok(Frame::from_rgb(vec![0u8; 4 * 4 * 3], 4, 4).unwrap())
            }
            Some(Capture::Transient) => {
                self.state = SourceState::Faulted;
                Err(CaptureError::Transient("scripted drop".into()))
            }
            Some(Capture::Fatal) | None => {
                self.state = SourceState::Faulted;
                Err(CaptureError::Fatal("scripted device loss".into()))
            }
        }
    }

    fn close(&mut self) {
        self.state = SourceState::Closed;
    }

    fn state(&self) -> SourceState {
        self.state
    }
}

// ----------------------------------------------------------------------------
// Recording display
// ----------------------------------------------------------------------------

#[derive(Default)]
struct DisplayLog {
    renders: u32,
    failed_renders: u32,
    blanks: u32,
    fail_next_renders: u32,
}

#[derive(Clone, Default)]
struct RecordingDisplay {
    log: Arc<Mutex<DisplayLog>>,
    open: Arc<AtomicBool>,
}

impl RecordingDisplay {
    fn new() -> Self {
        Self::default()
    }
}

impl DisplayRenderer for RecordingDisplay {
    fn geometry(&self) -> DisplayGeometry {
        DisplayGeometry::Character { cols: 16, rows: 2 }
    }

    fn open(&mut self) -> Result<(), DisplayError> {
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn render(&mut self, _lines: &[RankedLine], _fps: f64) -> Result<(), DisplayError> {
        let mut log = self.log.lock().unwrap();
        if log.fail_next_renders > 0 {
            log.fail_next_renders -= 1;
            log.failed_renders += 1;
            return Err(DisplayError::Transient("scripted render failure".into()));
        }
        log.renders += 1;
        Ok(())
    }

    fn blank(&mut self) -> Result<(), DisplayError> {
        self.log.lock().unwrap().blanks += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

// ----------------------------------------------------------------------------

fn pipeline(camera: ScriptedCamera, display: RecordingDisplay) -> Pipeline {
    let detector = Detector::new(Box::new(StubBackend::quiet()), 0.5, 0.45);
    Pipeline::new(Box::new(camera), detector, Box::new(display), 20, 2, Locale::En)
}

#[test]
fn fatal_capture_error_tears_down_both_devices() {
    let display = RecordingDisplay::new();
    let camera = ScriptedCamera::new(vec![Capture::Frame, Capture::Fatal]);
    let mut pipe = pipeline(camera, display.clone());

    let cancel = AtomicBool::new(false);
    let result = pipe.run(&cancel);
    assert!(result.is_err());

    let log = display.log.lock().unwrap();
    assert_eq!(log.renders, 1);
    assert_eq!(log.blanks, 1, "display must be blanked at teardown");
    assert!(!display.is_open(), "display must be released");
}

#[test]
fn transient_capture_failures_are_absorbed() {
    let display = RecordingDisplay::new();
    let camera = ScriptedCamera::new(vec![
        Capture::Frame,
        Capture::Transient,
        Capture::Frame,
        Capture::Fatal,
    ]);
    let mut pipe = pipeline(camera, display.clone());

    let cancel = AtomicBool::new(false);
    assert!(pipe.run(&cancel).is_err());

    // Both good frames rendered; the dropped read cost nothing visible.
    assert_eq!(display.log.lock().unwrap().renders, 2);
}

#[test]
fn exhausted_capture_retries_escalate_to_fatal() {
    let display = RecordingDisplay::new();
    // Initial read plus three retries all fail.
    let camera = ScriptedCamera::new(vec![
        Capture::Transient,
        Capture::Transient,
        Capture::Transient,
        Capture::Transient,
    ]);
    let mut pipe = pipeline(camera, display.clone());

    let cancel = AtomicBool::new(false);
    let err = pipe.run(&cancel).unwrap_err();
    assert!(err.to_string().contains("still failing"), "{err}");
    assert_eq!(display.log.lock().unwrap().renders, 0);
}

#[test]
fn render_failures_skip_the_cycle_but_keep_the_loop_alive() {
    let display = RecordingDisplay::new();
    // First cycle: the render and its retry both fail. Loop must continue.
    display.log.lock().unwrap().fail_next_renders = 2;
    let camera = ScriptedCamera::new(vec![Capture::Frame, Capture::Frame, Capture::Fatal]);
    let mut pipe = pipeline(camera, display.clone());

    let cancel = AtomicBool::new(false);
    assert!(pipe.run(&cancel).is_err());

    let log = display.log.lock().unwrap();
    assert_eq!(log.failed_renders, 2);
    assert_eq!(log.renders, 1, "second frame still rendered");
}

#[test]
fn cancellation_exits_cleanly_with_teardown() {
    let display = RecordingDisplay::new();
    let camera = ScriptedCamera::new(vec![Capture::Frame]);
    let mut pipe = pipeline(camera, display.clone());

    let cancel = AtomicBool::new(true);
    let result = pipe.run(&cancel);
    assert!(result.is_ok());

    let log = display.log.lock().unwrap();
    assert_eq!(log.renders, 0);
    assert_eq!(log.blanks, 1);
    assert!(!display.is_open());
}
