use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::audio::{AudioSink, Cue};
use crate::countdown::{lock, Countdown, SharedSession, DEFAULT_TICK_INTERVAL};
use crate::session::{GameSession, SessionConfig, SessionSnapshot};
use crate::target::{SlotId, TargetKind};

/// Pushed to every subscriber after a change to the session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub snapshot: SessionSnapshot,
    pub cue: Option<Cue>,
}

/// Fans cues out to the audio sink and snapshots out to subscribers
#[derive(Clone)]
struct Notifier {
    audio: Arc<dyn AudioSink>,
    subscribers: Arc<Mutex<Vec<Sender<SessionEvent>>>>,
}

impl Notifier {
    fn emit(&self, session: &GameSession, cue: Option<Cue>) {
        if let Some(cue) = cue {
            self.audio.play(cue);
        }
        let event = SessionEvent {
            snapshot: session.snapshot(),
            cue,
        };
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Owns the session, its countdown and its observers.
///
/// Commands and countdown steps are serialized through one lock. A command
/// that changes nothing (tapping while inactive) notifies nobody.
pub struct SessionController {
    session: SharedSession,
    notifier: Notifier,
    tick_interval: Duration,
    countdown: Option<Countdown>,
}

impl SessionController {
    pub fn new(config: SessionConfig, audio: Arc<dyn AudioSink>) -> Self {
        Self::with_session(GameSession::new(config), audio)
    }

    pub fn with_session(session: GameSession, audio: Arc<dyn AudioSink>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            notifier: Notifier {
                audio,
                subscribers: Arc::new(Mutex::new(Vec::new())),
            },
            tick_interval: DEFAULT_TICK_INTERVAL,
            countdown: None,
        }
    }

    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Receive a `SessionEvent` for every state change from now on.
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        self.notifier
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx);
        rx
    }

    pub fn start(&mut self) -> Cue {
        let (cue, round) = {
            let mut session = lock(&self.session);
            let cue = session.start();
            self.notifier.emit(&session, Some(cue));
            (cue, session.round())
        };

        let notifier = self.notifier.clone();
        let previous = self.countdown.replace(Countdown::spawn(
            self.session.clone(),
            round,
            self.tick_interval,
            move |session, outcome| notifier.emit(session, outcome.cue()),
        ));
        // The old round was superseded above, so its thread exits on its next wake.
        drop(previous);
        cue
    }

    pub fn tap_regular(&self, slot: SlotId) -> Option<Cue> {
        self.command(|s| s.tap_regular(slot))
    }

    pub fn tap_special(&self) -> Option<Cue> {
        self.command(GameSession::tap_special)
    }

    pub fn tap_penalty(&self) -> Option<Cue> {
        self.command(GameSession::tap_penalty)
    }

    pub fn tap(&self, kind: TargetKind) -> Option<Cue> {
        self.command(|s| s.tap(kind))
    }

    /// End the running round early, if any.
    pub fn stop(&self) -> Option<Cue> {
        self.command(GameSession::stop)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        lock(&self.session).snapshot()
    }

    pub fn config(&self) -> SessionConfig {
        lock(&self.session).config().clone()
    }

    /// Block until the current countdown thread exits.
    pub fn wait_for_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.join();
        }
    }

    fn command<F>(&self, f: F) -> Option<Cue>
    where
        F: FnOnce(&mut GameSession) -> Option<Cue>,
    {
        let mut session = lock(&self.session);
        let cue = f(&mut session)?;
        self.notifier.emit(&session, Some(cue));
        Some(cue)
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        let mut session = lock(&self.session);
        if let Some(cue) = session.stop() {
            self.notifier.emit(&session, Some(cue));
        }
    }
}
