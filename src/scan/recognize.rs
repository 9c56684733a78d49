//! Recognition adapter
//!
//! Thin wrapper around an external OCR engine. One recognition call yields
//! a finite, non-restartable stream of progress events terminated by
//! exactly one text or error event, delivered over a channel so the caller
//! stays responsive while the engine runs (typically hundreds of
//! milliseconds to several seconds).

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver};
use std::sync::Arc;
use std::thread;
use tracing::debug;

use super::preprocess::PreparedImage;

/// Recognition completion percentage, 0-100
pub type RecognitionProgress = u8;

/// Event emitted during one recognition call
///
/// Progress values are weakly increasing; the stream always ends with
/// exactly one of `Finished` or `Failed`.
#[derive(Debug, Clone)]
pub enum RecognitionEvent {
    /// Completion percentage update
    Progress(RecognitionProgress),
    /// Terminal: raw engine output, untrusted and possibly empty
    Finished(String),
    /// Terminal: the engine failed
    Failed(String),
}

/// External OCR engine contract
///
/// Implementations run synchronously on the adapter's worker thread and
/// report best-effort progress through the callback. Progress is display
/// only; engines that never call it are fine.
pub trait RecognitionEngine: Send + Sync {
    /// Recognize text in a prepared image
    fn recognize(
        &self,
        image: &PreparedImage,
        language: &str,
        progress: &mut dyn FnMut(RecognitionProgress),
    ) -> Result<String>;
}

/// Run one recognition call on a worker thread
///
/// The returned channel yields weakly increasing progress events followed
/// by a single terminal event, after which the channel closes. Uneven or
/// regressing engine progress is smoothed here so observers never see a
/// value go down.
pub fn spawn_recognition(
    engine: Arc<dyn RecognitionEngine>,
    image: PreparedImage,
    language: String,
) -> Receiver<RecognitionEvent> {
    let (tx, rx) = unbounded();

    thread::spawn(move || {
        let mut last: RecognitionProgress = 0;
        let mut emit = |p: RecognitionProgress| {
            let p = p.min(100);
            if p >= last {
                last = p;
                let _ = tx.send(RecognitionEvent::Progress(p));
            }
        };

        let started = std::time::Instant::now();
        match engine.recognize(&image, &language, &mut emit) {
            Ok(text) => {
                debug!(
                    "Recognition finished in {:?} ({} chars)",
                    started.elapsed(),
                    text.len()
                );
                let _ = tx.send(RecognitionEvent::Finished(text));
            }
            Err(e) => {
                debug!("Recognition failed after {:?}: {e:#}", started.elapsed());
                let _ = tx.send(RecognitionEvent::Failed(format!("{e:#}")));
            }
        }
    });

    rx
}

/// Tesseract-backed engine via leptess
///
/// Requires the system Tesseract and Leptonica libraries; enabled with the
/// `tesseract` cargo feature. Leptess exposes no incremental progress, so
/// only coarse milestones are reported.
#[cfg(feature = "tesseract")]
pub struct TesseractEngine;

#[cfg(feature = "tesseract")]
impl RecognitionEngine for TesseractEngine {
    fn recognize(
        &self,
        image: &PreparedImage,
        language: &str,
        progress: &mut dyn FnMut(RecognitionProgress),
    ) -> Result<String> {
        use anyhow::Context;
        use leptess::{LepTess, Variable};

        progress(0);

        let mut tess = LepTess::new(None, language)
            .context("Failed to initialize Tesseract. Is Tesseract installed?")?;
        tess.set_variable(Variable::TesseditCharWhitelist, "0123456789.,oOlIsSbB|")
            .context("Failed to set character whitelist")?;

        let png = image.to_png_bytes()?;
        tess.set_image_from_mem(&png)
            .context("Failed to load image into Tesseract")?;
        progress(40);

        let text = tess
            .get_utf8_text()
            .context("Failed to extract text from image")?;
        progress(100);

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    fn prepared_1x1() -> PreparedImage {
        PreparedImage {
            data: vec![128],
            width: 1,
            height: 1,
        }
    }

    /// Engine with scripted progress and output
    struct ScriptedEngine {
        progress: Vec<u8>,
        result: std::result::Result<String, String>,
    }

    impl RecognitionEngine for ScriptedEngine {
        fn recognize(
            &self,
            _image: &PreparedImage,
            _language: &str,
            progress: &mut dyn FnMut(u8),
        ) -> Result<String> {
            for &p in &self.progress {
                progress(p);
            }
            match &self.result {
                Ok(text) => Ok(text.clone()),
                Err(e) => bail!("{e}"),
            }
        }
    }

    fn collect(rx: Receiver<RecognitionEvent>) -> Vec<RecognitionEvent> {
        rx.iter().collect()
    }

    #[test]
    fn test_progress_then_single_terminal() {
        let engine = Arc::new(ScriptedEngine {
            progress: vec![10, 60, 100],
            result: Ok("12345".to_string()),
        });

        let events = collect(spawn_recognition(engine, prepared_1x1(), "eng".into()));

        let terminal_count = events
            .iter()
            .filter(|e| matches!(e, RecognitionEvent::Finished(_) | RecognitionEvent::Failed(_)))
            .count();
        assert_eq!(terminal_count, 1);
        assert!(matches!(
            events.last(),
            Some(RecognitionEvent::Finished(text)) if text == "12345"
        ));
    }

    #[test]
    fn test_regressing_progress_dropped() {
        let engine = Arc::new(ScriptedEngine {
            progress: vec![30, 10, 50, 20, 120],
            result: Ok(String::new()),
        });

        let events = collect(spawn_recognition(engine, prepared_1x1(), "eng".into()));

        let seen: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                RecognitionEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(seen, vec![30, 50, 100]);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_silent_engine_still_terminates() {
        let engine = Arc::new(ScriptedEngine {
            progress: vec![],
            result: Ok("odo 4800".to_string()),
        });

        let events = collect(spawn_recognition(engine, prepared_1x1(), "eng".into()));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RecognitionEvent::Finished(_)));
    }

    #[test]
    fn test_engine_error_becomes_failed_event() {
        let engine = Arc::new(ScriptedEngine {
            progress: vec![15],
            result: Err("engine exploded".to_string()),
        });

        let events = collect(spawn_recognition(engine, prepared_1x1(), "eng".into()));
        assert!(matches!(
            events.last(),
            Some(RecognitionEvent::Failed(reason)) if reason.contains("engine exploded")
        ));
    }

    #[test]
    fn test_channel_closes_after_terminal() {
        let engine = Arc::new(ScriptedEngine {
            progress: vec![],
            result: Ok(String::new()),
        });

        let rx = spawn_recognition(engine, prepared_1x1(), "eng".into());
        let _ = collect(rx);
        // collect() only returns once the sender is dropped
    }
}
