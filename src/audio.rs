use std::io::{self, Write};
use std::sync::Mutex;

/// Signals the game hands to whoever owns playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Cue {
    PlayRegular,
    PlayBonus,
    PlayPenalty,
    StartMusic,
    StopMusic,
}

impl Cue {
    pub fn is_music(&self) -> bool {
        matches!(self, Cue::StartMusic | Cue::StopMusic)
    }
}

/// Playback collaborator.
///
/// Implementations own the actual sound. A tap cue must restart from the
/// beginning every time it is signaled, even if a previous trigger is still
/// playing.
pub trait AudioSink: Send + Sync + 'static {
    fn play(&self, cue: Cue);
}

/// Muted output
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&self, _cue: Cue) {}
}

/// Rings the terminal bell on tap cues. Music has no terminal equivalent and
/// is ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct BellAudio;

impl AudioSink for BellAudio {
    fn play(&self, cue: Cue) {
        if cue.is_music() {
            return;
        }
        let mut out = io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }
}

/// Keeps every cue it receives, in order
#[derive(Debug, Default)]
pub struct RecordingAudio {
    cues: Mutex<Vec<Cue>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<Cue> {
        self.cues
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AudioSink for RecordingAudio {
    fn play(&self, cue: Cue) {
        self.cues
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(cue);
    }
}
