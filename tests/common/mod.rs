//! Shared helpers for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use upsidedown::config::CommunicatorConfig;
use upsidedown::core::{Communicator, Tone, ToneSink};
use upsidedown::error::SinkError;

/// Tone sink that records every request in order
#[derive(Debug, Default)]
pub struct RecordingTone {
    tones: Mutex<Vec<Tone>>,
}

impl RecordingTone {
    pub fn tones(&self) -> Vec<Tone> {
        self.tones.lock().unwrap().clone()
    }

    pub fn count(&self, tone: Tone) -> usize {
        self.tones().iter().filter(|&&t| t == tone).count()
    }

    fn push(&self, tone: Tone) -> Result<(), SinkError> {
        self.tones.lock().unwrap().push(tone);
        Ok(())
    }
}

impl ToneSink for RecordingTone {
    fn play_letter_beep(&self) -> Result<(), SinkError> {
        self.push(Tone::LetterBeep)
    }

    fn play_dot(&self) -> Result<(), SinkError> {
        self.push(Tone::Dot)
    }

    fn play_dash(&self) -> Result<(), SinkError> {
        self.push(Tone::Dash)
    }

    fn play_corruption_sound(&self) -> Result<(), SinkError> {
        self.push(Tone::Corruption)
    }
}

/// Tone sink that fails every request
#[derive(Debug, Default)]
pub struct FailingTone;

impl ToneSink for FailingTone {
    fn play_letter_beep(&self) -> Result<(), SinkError> {
        Err(SinkError::Unavailable("no speaker".into()))
    }

    fn play_dot(&self) -> Result<(), SinkError> {
        panic!("audio driver crashed")
    }

    fn play_dash(&self) -> Result<(), SinkError> {
        Err(SinkError::Playback("buffer underrun".into()))
    }

    fn play_corruption_sound(&self) -> Result<(), SinkError> {
        panic!("audio driver crashed")
    }
}

pub fn start_with(config: CommunicatorConfig) -> (Communicator, Arc<RecordingTone>) {
    let tone = Arc::new(RecordingTone::default());
    let comm = Communicator::start(config, tone.clone());
    (comm, tone)
}

pub fn start() -> (Communicator, Arc<RecordingTone>) {
    start_with(CommunicatorConfig::default())
}

/// Advance paused time
pub async fn advance_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
