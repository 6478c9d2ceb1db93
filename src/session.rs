use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info, trace};

use crate::audio::Cue;
use crate::target::{Position, SlotId, Target, TargetKind};

pub const DEFAULT_BUTTON_COUNT: usize = 5;
pub const DEFAULT_GAME_DURATION_SECS: u32 = 20;
pub const DEFAULT_SPECIAL_PROBABILITY: f64 = 0.3;
pub const DEFAULT_PENALTY_PROBABILITY: f64 = 0.2;

pub const REGULAR_POINTS: u32 = 1;
pub const SPECIAL_POINTS: u32 = 3;
pub const PENALTY_POINTS: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub button_count: usize,
    pub game_duration_secs: u32,
    pub special_probability: f64,
    pub penalty_probability: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            button_count: DEFAULT_BUTTON_COUNT,
            game_duration_secs: DEFAULT_GAME_DURATION_SECS,
            special_probability: DEFAULT_SPECIAL_PROBABILITY,
            penalty_probability: DEFAULT_PENALTY_PROBABILITY,
        }
    }
}

/// What a single countdown step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The round is no longer running; nothing was decremented
    Stopped,
    /// One second was taken off the clock and time is left
    Running { time_remaining: u32 },
    /// The clock hit zero on this step and the session went inactive
    Finished,
}

impl TickOutcome {
    pub fn cue(&self) -> Option<Cue> {
        match self {
            TickOutcome::Finished => Some(Cue::StopMusic),
            _ => None,
        }
    }

    pub fn keeps_running(&self) -> bool {
        matches!(self, TickOutcome::Running { .. })
    }
}

/// Read-only copy of everything a renderer needs
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub buttons: Vec<Target>,
    pub special_button: Target,
    pub penalty_button: Target,
    pub score: u32,
    pub time_remaining: u32,
    pub active: bool,
    pub round: u64,
}

impl SessionSnapshot {
    /// Session ran out of time (as opposed to never having started)
    pub fn is_over(&self) -> bool {
        !self.active && self.time_remaining == 0
    }
}

/// Authoritative state of one tap game.
///
/// All mutation goes through `start`, the `tap_*` commands, `tick_round` and
/// `stop`. Commands never fail: tapping while inactive is a silent no-op.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: SessionConfig,
    buttons: Vec<Target>,
    special_button: Target,
    penalty_button: Target,
    score: u32,
    time_remaining: u32,
    active: bool,
    round: u64,
    rng: StdRng,
}

impl GameSession {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_seed(config: SessionConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(config: SessionConfig, rng: StdRng) -> Self {
        Self {
            buttons: vec![Target::hidden(); config.button_count],
            special_button: Target::hidden(),
            penalty_button: Target::hidden(),
            score: 0,
            time_remaining: config.game_duration_secs,
            active: false,
            round: 0,
            rng,
            config,
        }
    }

    /// Reset and begin a new round, overwriting whatever was going on.
    pub fn start(&mut self) -> Cue {
        self.score = 0;
        self.time_remaining = self.config.game_duration_secs;
        self.active = true;
        self.round += 1;
        self.randomize();
        debug!(
            round = self.round,
            duration = self.time_remaining,
            "session started"
        );
        Cue::StartMusic
    }

    pub fn tap_regular(&mut self, slot: SlotId) -> Option<Cue> {
        if !self.active {
            return None;
        }
        let button = self.buttons.get_mut(slot)?;
        button.visible = false;
        self.score += REGULAR_POINTS;

        if self.buttons.iter().all(|b| !b.visible) {
            self.randomize();
        }
        Some(Cue::PlayRegular)
    }

    pub fn tap_special(&mut self) -> Option<Cue> {
        if !self.active {
            return None;
        }
        self.special_button.visible = false;
        self.score += SPECIAL_POINTS;
        Some(Cue::PlayBonus)
    }

    pub fn tap_penalty(&mut self) -> Option<Cue> {
        if !self.active {
            return None;
        }
        self.penalty_button.visible = false;
        self.score = self.score.saturating_sub(PENALTY_POINTS);
        Some(Cue::PlayPenalty)
    }

    pub fn tap(&mut self, kind: TargetKind) -> Option<Cue> {
        match kind {
            TargetKind::Regular(slot) => self.tap_regular(slot),
            TargetKind::Special => self.tap_special(),
            TargetKind::Penalty => self.tap_penalty(),
        }
    }

    /// One countdown step for the current round.
    pub fn tick(&mut self) -> TickOutcome {
        self.tick_round(self.round)
    }

    /// One countdown step on behalf of `round`.
    ///
    /// Checks the session is still active and still on `round` before touching
    /// the clock, so a countdown left over from a restarted or stopped round
    /// never decrements.
    pub fn tick_round(&mut self, round: u64) -> TickOutcome {
        if !self.active || round != self.round {
            return TickOutcome::Stopped;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining > 0 {
            return TickOutcome::Running {
                time_remaining: self.time_remaining,
            };
        }
        self.active = false;
        info!(round = self.round, score = self.score, "session finished");
        TickOutcome::Finished
    }

    /// End the round early. Returns `StopMusic` if a round was running.
    pub fn stop(&mut self) -> Option<Cue> {
        if !self.active {
            return None;
        }
        self.active = false;
        debug!(
            round = self.round,
            time_remaining = self.time_remaining,
            "session stopped"
        );
        Some(Cue::StopMusic)
    }

    fn randomize(&mut self) {
        for button in self.buttons.iter_mut() {
            *button = Target::shown_at(Position::random(&mut self.rng));
        }
        self.special_button = Self::roll_target(
            &mut self.rng,
            self.special_button,
            self.config.special_probability,
        );
        self.penalty_button = Self::roll_target(
            &mut self.rng,
            self.penalty_button,
            self.config.penalty_probability,
        );
        trace!(
            special = self.special_button.visible,
            penalty = self.penalty_button.visible,
            "targets randomized"
        );
    }

    // A failed roll hides the target but keeps its last position. NaN never shows.
    fn roll_target(rng: &mut StdRng, current: Target, probability: f64) -> Target {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        if rng.gen_bool(probability) {
            Target::shown_at(Position::random(rng))
        } else {
            Target {
                visible: false,
                ..current
            }
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn buttons(&self) -> &[Target] {
        &self.buttons
    }

    pub fn special_button(&self) -> Target {
        self.special_button
    }

    pub fn penalty_button(&self) -> Target {
        self.penalty_button
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            buttons: self.buttons.clone(),
            special_button: self.special_button,
            penalty_button: self.penalty_button,
            score: self.score,
            time_remaining: self.time_remaining,
            active: self.active,
            round: self.round,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_score(&mut self, score: u32) {
        self.score = score;
    }

    #[cfg(test)]
    pub(crate) fn force_penalty_visible(&mut self) {
        self.penalty_button.visible = true;
    }

    #[cfg(test)]
    pub(crate) fn force_special_visible(&mut self) {
        self.special_button.visible = true;
    }
}
