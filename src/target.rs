use rand::Rng;

/// Lowest percentage a randomized coordinate can take
pub const POSITION_MIN: u8 = 10;
/// Highest percentage a randomized coordinate can take
pub const POSITION_MAX: u8 = 90;

/// Identifier of a regular slot, `0..button_count`
pub type SlotId = usize;

/// Placement of a target as a percentage of the play area.
///
/// `top` is measured from the top edge against the area height, `left` from
/// the left edge against the area width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub top: u8,
    pub left: u8,
}

impl Position {
    pub fn new(top: u8, left: u8) -> Self {
        Self { top, left }
    }

    /// Draw both coordinates independently and uniformly from
    /// `POSITION_MIN..=POSITION_MAX`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            top: rng.gen_range(POSITION_MIN..=POSITION_MAX),
            left: rng.gen_range(POSITION_MIN..=POSITION_MAX),
        }
    }

    pub fn in_bounds(&self) -> bool {
        (POSITION_MIN..=POSITION_MAX).contains(&self.top)
            && (POSITION_MIN..=POSITION_MAX).contains(&self.left)
    }
}

/// A tappable target: visibility plus where it sits.
///
/// `position` is `None` until the first randomization places it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Target {
    pub visible: bool,
    pub position: Option<Position>,
}

impl Target {
    pub fn hidden() -> Self {
        Self::default()
    }

    pub fn shown_at(position: Position) -> Self {
        Self {
            visible: true,
            position: Some(position),
        }
    }
}

/// Which kind of target a tap landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TargetKind {
    Regular(SlotId),
    Special,
    Penalty,
}
