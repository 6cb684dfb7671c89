//! Communicator: sanity drain, possession and playback over one owned state
//!
//! Phases (derived from state fields):
//! - IDLE → TRANSMITTING: `encode_and_transmit()` with a non-blank, encodable message
//! - TRANSMITTING → IDLE: sequence exhausted, or `stop_transmission()`
//! - IDLE/TRANSMITTING → POSSESSED: sanity drains to 0 (playback is cut off)
//! - POSSESSED → IDLE: `restore_sanity()` by shake, or the recovery timer
//!
//! Three timer tasks run against the state: the drain (repeating), the
//! recovery (one-shot, only while possessed) and the playback (one per
//! transmission). Each lives in a `TaskSlot` that aborts its predecessor on
//! replace and its task on drop. Playback and recovery also carry a
//! generation number so a task that lost a race can never write.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, trace};

use crate::SANITY_MAX;
use crate::config::CommunicatorConfig;
use crate::core::collaborators::{fire, Tone, ToneSink};
use crate::core::{LetterSequencer, MorseEncoder};
use crate::types::{
    CommunicatorState, LetterEvent, PulseKind, SignalUnit, StateUpdate, StatusLabel, TransmitMode,
};

/// Buffered updates per subscriber before it starts lagging
const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// Owned handle to a timer task, aborted when replaced, cancelled or dropped
#[derive(Debug, Default)]
struct TaskSlot(Option<JoinHandle<()>>);

impl TaskSlot {
    fn replace(&mut self, handle: JoinHandle<()>) {
        if let Some(old) = self.0.replace(handle) {
            old.abort();
        }
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.abort();
        }
    }

    fn is_active(&self) -> bool {
        self.0.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Which timer tasks are currently alive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerStatus {
    pub drain: bool,
    pub recovery: bool,
    pub playback: bool,
}

/// What a playback task plays
enum Playback {
    Morse(Vec<SignalUnit>),
    Letters(Vec<LetterEvent>),
}

#[derive(Debug)]
struct Inner {
    state: CommunicatorState,
    revision: u64,
    /// TRANSMISSION COMPLETE banner is up
    completing: bool,
    transmission_gen: u64,
    recovery_gen: u64,
    closed: bool,
    drain: TaskSlot,
    recovery: TaskSlot,
    playback: TaskSlot,
}

impl Inner {
    /// Playback task `gen` may still write
    fn owns_playback(&self, gen: u64) -> bool {
        !self.closed && self.transmission_gen == gen && self.state.transmitting && !self.state.possessed
    }

    /// Clear every transmission field and orphan the running playback
    fn end_transmission(&mut self) {
        self.transmission_gen += 1;
        self.playback.cancel();
        self.state.transmitting = false;
        self.state.flashing = false;
        self.state.active_letter = None;
        self.completing = false;
    }
}

struct Shared {
    config: CommunicatorConfig,
    tone: Arc<dyn ToneSink>,
    encoder: MorseEncoder,
    sequencer: LetterSequencer,
    inner: Mutex<Inner>,
    updates: broadcast::Sender<StateUpdate>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Recompute the status and publish. Runs under the lock so readers
    /// see changes in commit order.
    fn commit(&self, inner: &mut Inner) {
        let s = &inner.state;
        let status = StatusLabel::derive(s.sanity, s.possessed, s.transmitting, inner.completing);
        inner.state.status = status;
        inner.revision += 1;
        // No subscribers is fine
        let _ = self.updates.send(StateUpdate::new(inner.revision, inner.state.clone()));
    }

    fn drain_tick(self: &Arc<Self>) {
        let entered = {
            let mut inner = self.lock();
            if inner.closed || inner.state.possessed || inner.state.sanity == 0 {
                return;
            }
            inner.state.sanity -= 1;
            trace!(sanity = inner.state.sanity, "sanity drained");
            let entered = inner.state.sanity == 0;
            if entered {
                self.enter_possession(&mut inner);
            }
            self.commit(&mut inner);
            entered
        };
        if entered {
            fire(self.tone.as_ref(), Tone::Corruption);
        }
    }

    fn enter_possession(self: &Arc<Self>, inner: &mut Inner) {
        if inner.state.transmitting {
            info!("transmission interrupted by possession");
        }
        inner.end_transmission();
        inner.state.possessed = true;
        inner.state.possessions += 1;

        inner.recovery_gen += 1;
        let gen = inner.recovery_gen;
        let shared = Arc::clone(self);
        let after = self.config.possession_duration();
        inner.recovery.replace(tokio::spawn(async move {
            sleep(after).await;
            shared.restore(Some(gen));
        }));
        info!(possessions = inner.state.possessions, "SYSTEM CORRUPTED");
    }

    /// `timer` carries the recovery generation when the auto-recovery fires
    fn restore(&self, timer: Option<u64>) {
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        if let Some(gen) = timer {
            if gen != inner.recovery_gen || !inner.state.possessed {
                return;
            }
        }
        inner.recovery_gen += 1;
        inner.recovery.cancel();

        if !inner.state.possessed && inner.state.sanity == SANITY_MAX {
            debug!("restore ignored, sanity already full");
            return;
        }
        let was_possessed = inner.state.possessed;
        inner.state.possessed = false;
        inner.state.sanity = SANITY_MAX;
        self.commit(&mut inner);
        if was_possessed {
            info!(by_timer = timer.is_some(), "sanity restored");
        } else {
            debug!("sanity topped up");
        }
    }

    /// Set light/letter for playback `gen`. False once the task no longer owns playback.
    fn set_light(&self, gen: u64, flashing: bool, letter: Option<char>) -> bool {
        let mut inner = self.lock();
        if !inner.owns_playback(gen) {
            return false;
        }
        if inner.state.flashing != flashing || inner.state.active_letter != letter {
            inner.state.flashing = flashing;
            inner.state.active_letter = letter;
            self.commit(&mut inner);
        }
        true
    }

    fn still_playing(&self, gen: u64) -> bool {
        self.lock().owns_playback(gen)
    }

    async fn play(self: Arc<Self>, gen: u64, playback: Playback) {
        let finished = match playback {
            Playback::Morse(signals) => self.play_morse(gen, signals).await,
            Playback::Letters(events) => self.play_letters(gen, events).await,
        };
        if finished {
            self.complete(gen).await;
        }
    }

    async fn play_morse(&self, gen: u64, signals: Vec<SignalUnit>) -> bool {
        for unit in signals {
            match unit {
                SignalUnit::Pulse { kind, duration_ms } => {
                    if !self.set_light(gen, true, None) {
                        return false;
                    }
                    trace!(?kind, duration_ms, "pulse");
                    fire(self.tone.as_ref(), match kind {
                        PulseKind::Dot => Tone::Dot,
                        PulseKind::Dash => Tone::Dash,
                    });
                    sleep(Duration::from_millis(duration_ms)).await;
                    if !self.set_light(gen, false, None) {
                        return false;
                    }
                }
                SignalUnit::Gap { kind, duration_ms } => {
                    if !self.still_playing(gen) {
                        return false;
                    }
                    trace!(?kind, duration_ms, "gap");
                    sleep(Duration::from_millis(duration_ms)).await;
                }
            }
        }
        true
    }

    async fn play_letters(&self, gen: u64, events: Vec<LetterEvent>) -> bool {
        for event in events {
            match event.ch.active() {
                Some(c) => {
                    if !self.set_light(gen, true, Some(c)) {
                        return false;
                    }
                    trace!(letter = %c, "letter");
                    fire(self.tone.as_ref(), Tone::LetterBeep);
                    sleep(Duration::from_millis(event.hold_ms)).await;
                    if !self.set_light(gen, false, None) {
                        return false;
                    }
                }
                None => {
                    if !self.still_playing(gen) {
                        return false;
                    }
                    sleep(Duration::from_millis(event.hold_ms)).await;
                }
            }
            if event.gap_ms > 0 {
                sleep(Duration::from_millis(event.gap_ms)).await;
            }
        }
        true
    }

    /// Show TRANSMISSION COMPLETE, then revert unless something else began meanwhile
    async fn complete(&self, gen: u64) {
        {
            let mut inner = self.lock();
            if !inner.owns_playback(gen) {
                return;
            }
            inner.state.transmitting = false;
            inner.state.flashing = false;
            inner.state.active_letter = None;
            inner.completing = true;
            self.commit(&mut inner);
            info!("transmission complete");
        }

        sleep(self.config.complete_hold()).await;

        let mut inner = self.lock();
        let untouched = inner.transmission_gen == gen
            && inner.completing
            && !inner.state.transmitting
            && !inner.state.possessed;
        if untouched && !inner.closed {
            inner.completing = false;
            self.commit(&mut inner);
        }
    }
}

/// The communicator session. Starts draining on creation; dropping it
/// cancels every timer.
pub struct Communicator {
    shared: Arc<Shared>,
}

impl Communicator {
    /// Start a session at full sanity.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: CommunicatorConfig, tone: Arc<dyn ToneSink>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                state: CommunicatorState::new(config.mode),
                revision: 0,
                completing: false,
                transmission_gen: 0,
                recovery_gen: 0,
                closed: false,
                drain: TaskSlot::default(),
                recovery: TaskSlot::default(),
                playback: TaskSlot::default(),
            }),
            config,
            tone,
            encoder: MorseEncoder::new(),
            sequencer: LetterSequencer::new(),
            updates,
        });

        let ticker = Arc::clone(&shared);
        let interval = shared.config.drain_interval();
        let drain = tokio::spawn(async move {
            loop {
                sleep(interval).await;
                ticker.drain_tick();
            }
        });
        shared.lock().drain.replace(drain);
        info!(mode = ?shared.config.mode, "communicator started");

        Self { shared }
    }

    /// Current state by value
    pub fn snapshot(&self) -> CommunicatorState {
        self.shared.lock().state.clone()
    }

    /// Current state with its revision
    pub fn current(&self) -> StateUpdate {
        let inner = self.shared.lock();
        StateUpdate::new(inner.revision, inner.state.clone())
    }

    /// Number of committed changes so far
    pub fn revision(&self) -> u64 {
        self.shared.lock().revision
    }

    /// Every change from now on, in commit order
    pub fn subscribe(&self) -> broadcast::Receiver<StateUpdate> {
        self.shared.updates.subscribe()
    }

    pub fn config(&self) -> &CommunicatorConfig {
        &self.shared.config
    }

    pub fn timers(&self) -> TimerStatus {
        let inner = self.shared.lock();
        TimerStatus {
            drain: inner.drain.is_active(),
            recovery: inner.recovery.is_active(),
            playback: inner.playback.is_active(),
        }
    }

    pub fn update_message(&self, text: impl Into<String>) {
        let text = text.into();
        let mut inner = self.shared.lock();
        if inner.closed || inner.state.message == text {
            return;
        }
        inner.state.message = text;
        self.shared.commit(&mut inner);
    }

    /// Switch playback variant for the next transmission
    pub fn set_mode(&self, mode: TransmitMode) {
        let mut inner = self.shared.lock();
        if inner.closed || inner.state.mode == mode {
            return;
        }
        inner.state.mode = mode;
        self.shared.commit(&mut inner);
    }

    /// Encode the message and schedule playback. Ignored when possessed,
    /// already transmitting, or the message encodes to nothing.
    pub fn encode_and_transmit(&self) {
        let mut inner = self.shared.lock();
        if inner.closed {
            return;
        }
        if inner.state.possessed {
            debug!("transmit ignored, possessed");
            return;
        }
        if inner.state.transmitting {
            debug!("transmit ignored, already transmitting");
            return;
        }
        if inner.state.message.trim().is_empty() {
            debug!("transmit ignored, blank message");
            return;
        }

        let message = inner.state.message.clone();
        let playback = match inner.state.mode {
            TransmitMode::Morse => {
                let signals = self.shared.encoder.encode(&message);
                if signals.is_empty() {
                    debug!("transmit ignored, nothing encodable");
                    return;
                }
                inner.state.signal_output = signals.clone();
                Playback::Morse(signals)
            }
            TransmitMode::Letters => {
                let events = self.shared.sequencer.sequence(&message);
                if events.iter().all(|e| e.ch.active().is_none()) {
                    debug!("transmit ignored, no letters");
                    return;
                }
                Playback::Letters(events)
            }
        };

        inner.end_transmission();
        inner.state.transmitting = true;
        let gen = inner.transmission_gen;
        self.shared.commit(&mut inner);

        let shared = Arc::clone(&self.shared);
        inner.playback.replace(tokio::spawn(shared.play(gen, playback)));
        info!(mode = ?inner.state.mode, chars = message.chars().count(), "transmission started");
    }

    /// Cut playback off now. No completion banner.
    pub fn stop_transmission(&self) {
        let mut inner = self.shared.lock();
        if inner.closed || !(inner.state.transmitting || inner.completing) {
            return;
        }
        let was_transmitting = inner.state.transmitting;
        inner.end_transmission();
        self.shared.commit(&mut inner);
        if was_transmitting {
            info!("transmission stopped");
        }
    }

    /// Clear possession and refill sanity. Cancels the pending auto-recovery.
    pub fn restore_sanity(&self) {
        self.shared.restore(None);
    }

    /// Cancel every timer. Later operations are ignored.
    pub fn shutdown(&self) {
        let mut inner = self.shared.lock();
        if inner.closed {
            return;
        }
        let dirty = inner.state.transmitting || inner.completing;
        inner.end_transmission();
        inner.recovery.cancel();
        inner.drain.cancel();
        if dirty {
            self.shared.commit(&mut inner);
        }
        inner.closed = true;
        info!("communicator shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}

impl Drop for Communicator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Communicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Communicator")
            .field("state", &self.snapshot())
            .field("timers", &self.timers())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collaborators::SilentTone;
    use crate::types::Phase;

    fn start() -> Communicator {
        Communicator::start(CommunicatorConfig::default(), Arc::new(SilentTone))
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_state() {
        let comm = start();
        let state = comm.snapshot();
        assert_eq!(state.sanity, 100);
        assert!(!state.possessed);
        assert_eq!(state.phase(), Phase::Idle);
        assert!(comm.timers().drain);
        assert!(!comm.timers().recovery);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_point_per_interval() {
        let comm = start();
        sleep(Duration::from_millis(3500)).await;
        assert_eq!(comm.snapshot().sanity, 97);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_message_same_text_is_noop() {
        let comm = start();
        comm.update_message("HELLO");
        let rev = comm.revision();
        comm.update_message("HELLO");
        assert_eq!(comm.revision(), rev);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flash_follows_pulses() {
        let comm = start();
        comm.update_message("E");
        comm.encode_and_transmit();
        sleep(Duration::from_millis(100)).await;
        let state = comm.snapshot();
        assert!(state.transmitting);
        assert!(state.flashing);
        assert_eq!(state.status, StatusLabel::Transmitting);

        sleep(Duration::from_millis(200)).await;
        let state = comm.snapshot();
        assert!(!state.transmitting);
        assert!(!state.flashing);
        assert_eq!(state.status, StatusLabel::Complete);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_clears_without_banner() {
        let comm = start();
        comm.update_message("TTT");
        comm.encode_and_transmit();
        sleep(Duration::from_millis(300)).await;
        comm.stop_transmission();
        let state = comm.snapshot();
        assert!(!state.transmitting);
        assert!(!state.flashing);
        assert_eq!(state.status, StatusLabel::Ready);
        assert!(!comm.timers().playback);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_all_timers() {
        let comm = start();
        comm.update_message("SOS");
        comm.encode_and_transmit();
        sleep(Duration::from_millis(100)).await;
        comm.shutdown();
        assert_eq!(comm.timers(), TimerStatus { drain: false, recovery: false, playback: false });

        sleep(Duration::from_secs(5)).await;
        assert_eq!(comm.snapshot().sanity, 100);
        assert!(comm.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_during_banner_clears_status() {
        let comm = start();
        comm.update_message("E");
        comm.encode_and_transmit();
        sleep(Duration::from_millis(500)).await;
        assert_eq!(comm.snapshot().status, StatusLabel::Complete);

        comm.shutdown();
        assert_eq!(comm.snapshot().status, StatusLabel::Ready);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(comm.snapshot().status, StatusLabel::Ready);
    }
}
