//! The pet's animation state machine.
//!
//! What the pet looks like is a pure function of its [`AnimationState`] and
//! how long it has been in it: the pose table in [`pose`] picks sprites,
//! frame timing, and transform targets. [`Animator`] owns the transitions
//! (auto-revert, blink, heart spawning) and advances them from a single
//! [`Animator::tick`]. Randomness comes in through [`Dice`].

mod animator;
mod hearts;
mod pose;

use rand::Rng;

use crate::model::ActionKind;

pub use animator::{Animator, Frame};
pub use pose::{BodyKind, SLOT_COUNT, Transform, body_asset, head_asset};

/// Energy below this puts the pet to sleep on load.
pub const LOW_ENERGY: u8 = 5;

/// How long an action animation plays before the pet settles back to idle.
pub const ACTION_DISPLAY_MS: i64 = 3000;

/// The discrete display modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationState {
    Idle,
    Happy,
    Eating,
    PlayingToy,
    HavingTreat,
    Sleeping,
}

impl AnimationState {
    /// The animation an action plays.
    pub fn for_action(action: ActionKind) -> Self {
        match action {
            ActionKind::Feed => Self::Eating,
            ActionKind::Pet => Self::Happy,
            ActionKind::Toy => Self::PlayingToy,
            ActionKind::Treat => Self::HavingTreat,
        }
    }

    /// The resting state for a given energy reading.
    pub fn for_energy(energy: u8) -> Self {
        if energy < LOW_ENERGY {
            Self::Sleeping
        } else {
            Self::Idle
        }
    }

    /// States that revert to idle on their own.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Happy | Self::Eating | Self::PlayingToy | Self::HavingTreat
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Happy => "happy",
            Self::Eating => "eating",
            Self::PlayingToy => "playingToy",
            Self::HavingTreat => "havingTreat",
            Self::Sleeping => "sleeping",
        }
    }
}

/// Source of chance for blinks and heart placement.
pub trait Dice {
    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool;

    /// Uniform integer in `low..high`.
    fn between(&mut self, low: i32, high: i32) -> i32;
}

/// [`Dice`] backed by any `rand` generator.
pub struct RandomDice<R>(pub R);

impl<R: Rng> Dice for RandomDice<R> {
    fn chance(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    fn between(&mut self, low: i32, high: i32) -> i32 {
        if low >= high {
            return low;
        }
        self.0.gen_range(low..high)
    }
}
