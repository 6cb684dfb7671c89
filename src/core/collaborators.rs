//! External collaborators: tone/vibration output and the shake gesture
//!
//! The communicator only ever fires requests at these. Failures and panics
//! stay on this side of the boundary.

use std::io::Write;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use crate::error::SinkError;

/// Fire-and-forget tone/vibration output
pub trait ToneSink: Send + Sync {
    fn play_letter_beep(&self) -> Result<(), SinkError>;
    fn play_dot(&self) -> Result<(), SinkError>;
    fn play_dash(&self) -> Result<(), SinkError>;
    fn play_corruption_sound(&self) -> Result<(), SinkError>;
}

/// Tone requests the communicator makes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    LetterBeep,
    Dot,
    Dash,
    Corruption,
}

impl Tone {
    fn name(&self) -> &'static str {
        match self {
            Tone::LetterBeep => "letter_beep",
            Tone::Dot => "dot",
            Tone::Dash => "dash",
            Tone::Corruption => "corruption",
        }
    }
}

/// Send one tone request, swallowing both errors and panics
pub(crate) fn fire(sink: &dyn ToneSink, tone: Tone) {
    let outcome = catch_unwind(AssertUnwindSafe(|| match tone {
        Tone::LetterBeep => sink.play_letter_beep(),
        Tone::Dot => sink.play_dot(),
        Tone::Dash => sink.play_dash(),
        Tone::Corruption => sink.play_corruption_sound(),
    }));
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(tone = tone.name(), error = %e, "tone sink failed"),
        Err(_) => warn!(tone = tone.name(), "tone sink panicked"),
    }
}

/// Rings the terminal bell for every request
#[derive(Debug, Default)]
pub struct TerminalBell;

impl TerminalBell {
    fn ring(&self, times: usize) -> Result<(), SinkError> {
        let mut out = std::io::stdout();
        out.write_all("\x07".repeat(times).as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| SinkError::Unavailable(e.to_string()))
    }
}

impl ToneSink for TerminalBell {
    fn play_letter_beep(&self) -> Result<(), SinkError> {
        self.ring(1)
    }

    fn play_dot(&self) -> Result<(), SinkError> {
        self.ring(1)
    }

    fn play_dash(&self) -> Result<(), SinkError> {
        self.ring(1)
    }

    fn play_corruption_sound(&self) -> Result<(), SinkError> {
        self.ring(3)
    }
}

/// Discards every request
#[derive(Debug, Default)]
pub struct SilentTone;

impl ToneSink for SilentTone {
    fn play_letter_beep(&self) -> Result<(), SinkError> {
        Ok(())
    }

    fn play_dot(&self) -> Result<(), SinkError> {
        Ok(())
    }

    fn play_dash(&self) -> Result<(), SinkError> {
        Ok(())
    }

    fn play_corruption_sound(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

// =============================================================================
// SHAKE
// =============================================================================

/// Debounced shake gesture: raw shake events in, at most one callback per
/// cooldown window out. Events are ignored while stopped.
pub struct ShakeDetector {
    cooldown: Duration,
    running: AtomicBool,
    last_shake: Mutex<Option<Instant>>,
    on_shake: Box<dyn Fn() + Send + Sync>,
}

impl ShakeDetector {
    pub fn new(cooldown: Duration, on_shake: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            cooldown,
            running: AtomicBool::new(false),
            last_shake: Mutex::new(None),
            on_shake: Box::new(on_shake),
        }
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Feed one raw shake event. Returns whether the callback fired.
    pub fn shake(&self, at: Instant) -> bool {
        if !self.is_running() {
            debug!("shake ignored, detector stopped");
            return false;
        }

        {
            let mut last = self.last_shake.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(prev) = *last {
                if at.saturating_duration_since(prev) <= self.cooldown {
                    debug!("shake ignored, inside cooldown");
                    return false;
                }
            }
            *last = Some(at);
        }

        if catch_unwind(AssertUnwindSafe(|| (self.on_shake)())).is_err() {
            warn!("shake callback panicked");
        }
        true
    }

    pub fn shake_now(&self) -> bool {
        self.shake(Instant::now())
    }
}

impl std::fmt::Debug for ShakeDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShakeDetector")
            .field("cooldown", &self.cooldown)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn counting_detector() -> (ShakeDetector, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let detector = ShakeDetector::new(Duration::from_millis(500), move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (detector, count)
    }

    #[test]
    fn test_ignored_until_started() {
        let (detector, count) = counting_detector();
        assert!(!detector.shake(Instant::now()));
        detector.start();
        assert!(detector.shake(Instant::now()));
        detector.stop();
        assert!(!detector.shake(Instant::now() + Duration::from_secs(5)));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cooldown_debounces() {
        let (detector, count) = counting_detector();
        detector.start();
        let t0 = Instant::now();
        assert!(detector.shake(t0));
        assert!(!detector.shake(t0 + Duration::from_millis(100)));
        assert!(!detector.shake(t0 + Duration::from_millis(500)));
        assert!(detector.shake(t0 + Duration::from_millis(501)));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    struct BrokenSink;

    impl ToneSink for BrokenSink {
        fn play_letter_beep(&self) -> Result<(), SinkError> {
            Err(SinkError::Unavailable("no speaker".into()))
        }
        fn play_dot(&self) -> Result<(), SinkError> {
            panic!("driver crashed")
        }
        fn play_dash(&self) -> Result<(), SinkError> {
            Ok(())
        }
        fn play_corruption_sound(&self) -> Result<(), SinkError> {
            Ok(())
        }
    }

    #[test]
    fn test_fire_swallows_errors_and_panics() {
        fire(&BrokenSink, Tone::LetterBeep);
        fire(&BrokenSink, Tone::Dot);
        fire(&BrokenSink, Tone::Dash);
    }
}
