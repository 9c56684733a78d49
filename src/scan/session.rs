//! Scan session state machine
//!
//! One user-initiated scan, from capture to confirmation:
//!
//! ```text
//! Idle -> Capturing -> Preprocessing -> Recognizing(p)
//!      -> AwaitingConfirmation(resolution)
//!      -> Confirmed(value) | Cancelled | Failed(reason)
//! ```
//!
//! The session owns its image buffers for the scan's lifetime and is the
//! only stateful part of the subsystem. A scan in flight cannot be
//! dismissed; it must reach a terminal recognition outcome first.

use std::sync::Arc;
use tracing::{debug, warn};

use super::extract::extract_candidates;
use super::normalize::normalize_text;
use super::preprocess::{prepare_image, PreparedImage};
use super::recognize::{spawn_recognition, RecognitionEngine, RecognitionEvent};
use super::resolve::{resolve_reading, ReadingResolution};
use super::ScanError;
use crate::capture::CapturedImage;

/// Current phase of a scan session
#[derive(Debug, Clone, PartialEq)]
pub enum ScanState {
    /// No capture yet
    Idle,
    /// A photo has been captured
    Capturing,
    /// The photo has been prepared for recognition
    Preprocessing,
    /// Recognition in flight, with last observed progress
    Recognizing(u8),
    /// A reading was resolved and awaits user confirmation
    AwaitingConfirmation(ReadingResolution),
    /// Terminal: the user accepted a value
    Confirmed(f64),
    /// Terminal: the user dismissed the scan
    Cancelled,
    /// Terminal: the scan failed
    Failed(ScanError),
}

/// State for one user-initiated scan
pub struct ScanSession {
    state: ScanState,
    captured: Option<CapturedImage>,
    prepared: Option<PreparedImage>,
    reference: Option<f64>,
    resolution: Option<ReadingResolution>,
}

impl ScanSession {
    /// Start a session, optionally biased by the previously recorded
    /// odometer reading
    pub fn new(reference: Option<f64>) -> Self {
        Self {
            state: ScanState::Idle,
            captured: None,
            prepared: None,
            reference,
            resolution: None,
        }
    }

    /// Current state
    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// The reference reading this session was created with
    pub fn reference(&self) -> Option<f64> {
        self.reference
    }

    /// The last resolution, once recognition has completed
    pub fn resolution(&self) -> Option<&ReadingResolution> {
        self.resolution.as_ref()
    }

    /// The accepted reading; set only in `Confirmed`
    pub fn confirmed_value(&self) -> Option<f64> {
        match self.state {
            ScanState::Confirmed(value) => Some(value),
            _ => None,
        }
    }

    /// Hand a captured photo to the session (`Idle -> Capturing`)
    pub fn capture(&mut self, image: CapturedImage) -> bool {
        if self.state != ScanState::Idle {
            warn!("capture rejected in state {:?}", self.state);
            return false;
        }
        debug!("Captured {}x{} photo", image.width, image.height);
        self.captured = Some(image);
        self.state = ScanState::Capturing;
        true
    }

    /// Prepare the captured photo (`Capturing -> Preprocessing`)
    ///
    /// A decode failure moves the session to `Failed(Decode)`.
    pub fn preprocess(&mut self) -> bool {
        if self.state != ScanState::Capturing {
            warn!("preprocess rejected in state {:?}", self.state);
            return false;
        }
        let Some(captured) = self.captured.as_ref() else {
            warn!("preprocess without a captured image");
            return false;
        };

        match prepare_image(captured) {
            Ok(prepared) => {
                self.prepared = Some(prepared);
                self.state = ScanState::Preprocessing;
                true
            }
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    /// Take the prepared image for recognition (`Preprocessing ->
    /// Recognizing(0)`)
    ///
    /// The prepared buffer is consumed; recognition cannot be restarted on
    /// the same session.
    pub fn submit(&mut self) -> Option<PreparedImage> {
        if self.state != ScanState::Preprocessing {
            warn!("submit rejected in state {:?}", self.state);
            return None;
        }
        let prepared = self.prepared.take()?;
        self.state = ScanState::Recognizing(0);
        Some(prepared)
    }

    /// Record a progress update; regressions are ignored
    pub fn progress(&mut self, percent: u8) -> bool {
        match self.state {
            ScanState::Recognizing(current) if percent >= current => {
                self.state = ScanState::Recognizing(percent.min(100));
                true
            }
            ScanState::Recognizing(_) => false,
            _ => {
                warn!("progress rejected in state {:?}", self.state);
                false
            }
        }
    }

    /// Feed the terminal recognition text into the session
    ///
    /// Resolves a reading from the text; moves to `AwaitingConfirmation`
    /// when a best candidate exists, `Failed(NoReadingFound)` otherwise.
    pub fn complete_recognition(&mut self, raw_text: &str) -> bool {
        if !matches!(self.state, ScanState::Recognizing(_)) {
            warn!("recognition result rejected in state {:?}", self.state);
            return false;
        }

        let normalized = normalize_text(raw_text);
        let candidates = extract_candidates(&normalized);
        debug!(
            "Recognition text {:?} -> {} candidates",
            normalized,
            candidates.len()
        );

        let resolution = resolve_reading(&candidates, self.reference);
        self.resolution = Some(resolution.clone());

        if resolution.best.is_some() {
            self.state = ScanState::AwaitingConfirmation(resolution);
            true
        } else {
            self.fail(ScanError::NoReadingFound);
            false
        }
    }

    /// Feed a terminal recognition error into the session
    pub fn fail_recognition(&mut self, reason: String) -> bool {
        if !matches!(self.state, ScanState::Recognizing(_)) {
            warn!("recognition error rejected in state {:?}", self.state);
            return false;
        }
        self.fail(ScanError::Recognition(reason));
        true
    }

    /// Accept the best candidate or one of the alternatives
    /// (`AwaitingConfirmation -> Confirmed`)
    pub fn accept(&mut self, value: f64) -> bool {
        match &self.state {
            ScanState::AwaitingConfirmation(resolution) if resolution.offers(value) => {
                debug!("Reading {} confirmed", value);
                self.state = ScanState::Confirmed(value);
                self.release_buffers();
                true
            }
            ScanState::AwaitingConfirmation(_) => {
                warn!("accept rejected: {} was not offered", value);
                false
            }
            _ => {
                warn!("accept rejected in state {:?}", self.state);
                false
            }
        }
    }

    /// Dismiss the session (`-> Cancelled`)
    ///
    /// Allowed before recognition starts and after it terminates. While
    /// `Recognizing` this is an explicit no-op: an in-flight scan must
    /// reach a terminal recognition outcome first.
    pub fn dismiss(&mut self) -> bool {
        match self.state {
            ScanState::Idle
            | ScanState::Capturing
            | ScanState::Preprocessing
            | ScanState::AwaitingConfirmation(_)
            | ScanState::Failed(_) => {
                self.state = ScanState::Cancelled;
                self.release_buffers();
                true
            }
            ScanState::Recognizing(_) => {
                warn!("dismiss rejected: recognition in flight");
                false
            }
            ScanState::Confirmed(_) | ScanState::Cancelled => false,
        }
    }

    /// Run the full recognition leg on this session
    ///
    /// Submits the prepared image to the engine and pumps the event stream
    /// until the terminal event, invoking `on_progress` for each accepted
    /// update. Returns true when a reading awaits confirmation.
    pub fn recognize_with<F>(
        &mut self,
        engine: Arc<dyn RecognitionEngine>,
        language: &str,
        mut on_progress: F,
    ) -> bool
    where
        F: FnMut(u8),
    {
        let Some(prepared) = self.submit() else {
            return false;
        };

        let events = spawn_recognition(engine, prepared, language.to_string());
        for event in events {
            match event {
                RecognitionEvent::Progress(p) => {
                    if self.progress(p) {
                        on_progress(p);
                    }
                }
                RecognitionEvent::Finished(text) => {
                    self.complete_recognition(&text);
                }
                RecognitionEvent::Failed(reason) => {
                    self.fail_recognition(reason);
                }
            }
        }

        matches!(self.state, ScanState::AwaitingConfirmation(_))
    }

    fn fail(&mut self, error: ScanError) {
        debug!("Scan failed: {error}");
        self.state = ScanState::Failed(error);
        self.release_buffers();
    }

    // Image buffers are owned for the scan's lifetime only
    fn release_buffers(&mut self) {
        self.captured = None;
        self.prepared = None;
    }
}
