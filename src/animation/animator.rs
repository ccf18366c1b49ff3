//! The animator: one tick source driving every timed transition.

use jiff::Timestamp;

use super::hearts::{HEART_SPAWN_MS, Heart, HeartView};
use super::pose::{BodyKind, SLOT_COUNT, Transform, pose};
use super::{ACTION_DISPLAY_MS, AnimationState, Dice};

/// How often idle rolls for a blink.
pub const BLINK_CHECK_MS: i64 = 500;

/// Chance of a blink on each check.
pub const BLINK_CHANCE: f64 = 0.3;

/// How long a blink shows the alternate head.
pub const BLINK_MS: i64 = 300;

/// Head sprite shown mid-blink.
const BLINK_HEAD: u8 = 2;

/// Whole milliseconds from `from` to `to` (negative if `to` is earlier).
pub(super) fn millis_between(from: Timestamp, to: Timestamp) -> i64 {
    to.as_millisecond() - from.as_millisecond()
}

fn plus_ms(t: Timestamp, ms: i64) -> Timestamp {
    Timestamp::from_millisecond(t.as_millisecond().saturating_add(ms)).unwrap_or(t)
}

/// Drives the pet's display state.
#[derive(Debug, Clone)]
pub struct Animator {
    state: AnimationState,
    entered_at: Timestamp,
    revert_at: Option<Timestamp>,
    next_blink_check: Timestamp,
    blink_until: Option<Timestamp>,
    next_heart_at: Option<Timestamp>,
    hearts: Vec<Heart>,
    next_heart_id: u64,
}

impl Animator {
    /// Starts idle, or asleep when energy is low.
    pub fn new(energy: u8, now: Timestamp) -> Self {
        Self {
            state: AnimationState::for_energy(energy),
            entered_at: now,
            revert_at: None,
            next_blink_check: plus_ms(now, BLINK_CHECK_MS),
            blink_until: None,
            next_heart_at: None,
            hearts: Vec::new(),
            next_heart_id: 0,
        }
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// Re-applies the energy threshold after a (re)load.
    ///
    /// Low energy puts the pet to sleep; enough energy wakes a sleeping pet.
    /// Other states are left alone.
    pub fn refresh(&mut self, energy: u8, now: Timestamp) {
        let resting = AnimationState::for_energy(energy);
        if resting == AnimationState::Sleeping {
            self.enter(AnimationState::Sleeping, now);
        } else if self.state == AnimationState::Sleeping {
            self.enter(AnimationState::Idle, now);
        }
    }

    /// Plays a transient animation, restarting its timeout.
    pub fn trigger(&mut self, state: AnimationState, now: Timestamp) {
        if !state.is_transient() {
            return;
        }
        self.enter(state, now);
        self.revert_at = Some(plus_ms(now, ACTION_DISPLAY_MS));
        if state == AnimationState::Happy {
            self.next_heart_at = Some(now);
        }
    }

    /// Advances every timer to `now`.
    pub fn tick(&mut self, now: Timestamp, dice: &mut impl Dice) {
        // Hearts spawn only up to the moment the happy state ends.
        let happy_until = self.revert_at.map_or(now, |r| r.min(now));
        if self.state == AnimationState::Happy {
            while let Some(at) = self.next_heart_at {
                if at > happy_until {
                    break;
                }
                let id = self.next_heart_id;
                self.next_heart_id += 1;
                self.hearts.push(Heart::spawn(id, at, dice));
                self.next_heart_at = Some(plus_ms(at, HEART_SPAWN_MS));
            }
        }
        self.hearts.retain(|h| !h.is_done(now));

        if let Some(revert_at) = self.revert_at
            && now >= revert_at
        {
            self.enter(AnimationState::Idle, revert_at);
        }

        if self.blink_until.is_some_and(|until| now >= until) {
            self.blink_until = None;
        }
        while self.next_blink_check <= now {
            let at = self.next_blink_check;
            let idle = self.state == AnimationState::Idle && at >= self.entered_at;
            if idle && self.blink_until.is_none() && dice.chance(BLINK_CHANCE) {
                let until = plus_ms(at, BLINK_MS);
                self.blink_until = (until > now).then_some(until);
            }
            self.next_blink_check = plus_ms(at, BLINK_CHECK_MS);
        }
    }

    /// Stops every timer. The state stays where it is.
    pub fn stop(&mut self) {
        self.revert_at = None;
        self.blink_until = None;
        self.next_heart_at = None;
        self.hearts.clear();
    }

    pub fn is_blinking(&self) -> bool {
        self.blink_until.is_some()
    }

    /// What to draw at `now`.
    pub fn frame(&self, now: Timestamp) -> Frame {
        let pose = pose(self.state);
        let elapsed = millis_between(self.entered_at, now).max(0);

        let frames = pose.body.frames();
        let step = elapsed / i64::from(pose.frame_ms.max(1));
        let idx = usize::try_from(step).unwrap_or(0) % frames.len();

        let head_sprite = if self.state == AnimationState::Idle && self.is_blinking() {
            BLINK_HEAD
        } else {
            pose.head_sprite
        };

        let mut slots = [Transform::default(); SLOT_COUNT];
        for (slot, target) in slots.iter_mut().zip(pose.slots) {
            *slot = target.sample(elapsed);
        }

        Frame {
            state: self.state,
            head_sprite,
            body: pose.body,
            body_sprite: frames[idx],
            head: pose.head.sample(elapsed),
            slots,
            show_goodies: pose.show_goodies,
            show_food: pose.show_food,
            hearts: self.hearts.iter().map(|h| h.view(now)).collect(),
        }
    }

    fn enter(&mut self, state: AnimationState, at: Timestamp) {
        self.state = state;
        self.entered_at = at;
        self.revert_at = None;
        self.blink_until = None;
        if state != AnimationState::Happy {
            self.next_heart_at = None;
        }
    }
}

/// A snapshot of the pet at one instant, ready for any renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub state: AnimationState,
    pub head_sprite: u8,
    pub body: BodyKind,
    pub body_sprite: u8,
    pub head: Transform,
    pub slots: [Transform; SLOT_COUNT],
    pub show_goodies: bool,
    pub show_food: bool,
    pub hearts: Vec<HeartView>,
}
