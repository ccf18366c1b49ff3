//! The pose table: per-state sprites, frame timing, and transform targets.
//!
//! Offsets are in points relative to the 250×300 pet box; rotations in degrees.

use super::AnimationState;

/// Number of accessory slots.
pub const SLOT_COUNT: usize = 5;

/// Which body sprite sheet a state cycles through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Normal,
    Sleep,
}

impl BodyKind {
    /// Sprite numbers in cycle order.
    pub fn frames(self) -> &'static [u8] {
        match self {
            Self::Normal => &[2, 3],
            Self::Sleep => &[1, 2, 3],
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Sleep => "sleep",
        }
    }
}

/// Asset name of a head sprite.
pub fn head_asset(breed: u32, index: u8) -> String {
    format!("breed{breed}-head-{index}.png")
}

/// Asset name of a body sprite.
pub fn body_asset(breed: u32, kind: BodyKind, index: u8) -> String {
    format!("breed{breed}-{}-{index}.png", kind.prefix())
}

/// A scalar target: either held still or bouncing between two values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    Fixed(f32),

    /// Moves `from → to` over `leg_ms`, then back, forever.
    Oscillate { from: f32, to: f32, leg_ms: u32 },
}

impl Motion {
    /// Value after `elapsed_ms` in the current state.
    // Legs are at most a few seconds, so the phase fits f32 exactly.
    #[allow(clippy::cast_precision_loss)]
    pub fn sample(self, elapsed_ms: i64) -> f32 {
        match self {
            Self::Fixed(v) => v,
            Self::Oscillate { from, to, leg_ms } => {
                let leg = i64::from(leg_ms.max(1));
                let phase = elapsed_ms.max(0) % (2 * leg);
                let t = if phase < leg {
                    phase as f32 / leg as f32
                } else {
                    (2 * leg - phase) as f32 / leg as f32
                };
                from + (to - from) * t
            }
        }
    }
}

/// Where a layer is headed: translation and rotation targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub x: Motion,
    pub y: Motion,
    pub rotate: Motion,
}

impl Target {
    const REST: Self = Self::fixed(0.0, 0.0, 0.0);

    const fn fixed(x: f32, y: f32, rotate: f32) -> Self {
        Self {
            x: Motion::Fixed(x),
            y: Motion::Fixed(y),
            rotate: Motion::Fixed(rotate),
        }
    }

    pub fn sample(self, elapsed_ms: i64) -> Transform {
        Transform {
            x: self.x.sample(elapsed_ms),
            y: self.y.sample(elapsed_ms),
            rotate: self.rotate.sample(elapsed_ms),
        }
    }
}

/// A concrete transform at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub rotate: f32,
}

/// Everything a state decides about the picture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub head_sprite: u8,
    pub body: BodyKind,
    pub frame_ms: u32,
    pub head: Target,
    /// Targets for the five accessory slots.
    pub slots: [Target; SLOT_COUNT],
    pub show_goodies: bool,
    pub show_food: bool,
}

const fn osc(from: f32, to: f32, leg_ms: u32) -> Motion {
    Motion::Oscillate { from, to, leg_ms }
}

const fn target(x: Motion, y: Motion, rotate: Motion) -> Target {
    Target { x, y, rotate }
}

const fn fixed(v: f32) -> Motion {
    Motion::Fixed(v)
}

/// Looks up the pose for a state.
pub fn pose(state: AnimationState) -> Pose {
    let rest = [Target::REST; SLOT_COUNT];
    match state {
        AnimationState::Idle => Pose {
            head_sprite: 1,
            body: BodyKind::Normal,
            frame_ms: 100,
            head: Target::fixed(0.0, 0.0, -15.0),
            slots: rest,
            show_goodies: true,
            show_food: false,
        },
        AnimationState::Happy => Pose {
            head_sprite: 3,
            body: BodyKind::Normal,
            frame_ms: 70,
            head: target(fixed(0.0), fixed(0.0), osc(-15.0, -5.0, 300)),
            slots: swaying_slots(),
            show_goodies: true,
            show_food: false,
        },
        AnimationState::Eating => Pose {
            head_sprite: 2,
            body: BodyKind::Normal,
            frame_ms: 150,
            head: target(fixed(-5.0), osc(40.0, 50.0, 100), fixed(13.0)),
            slots: with_face_and_hat(
                target(fixed(-2.0), osc(40.0, 45.0, 100), fixed(28.0)),
                target(fixed(15.0), osc(40.0, 45.0, 100), fixed(28.0)),
            ),
            show_goodies: true,
            show_food: true,
        },
        AnimationState::PlayingToy => Pose {
            head_sprite: 5,
            body: BodyKind::Normal,
            frame_ms: 100,
            head: target(fixed(-5.0), fixed(40.0), osc(5.0, 20.0, 100)),
            slots: with_face_and_hat(
                target(fixed(-2.0), fixed(40.0), osc(20.0, 35.0, 100)),
                target(fixed(15.0), fixed(40.0), osc(20.0, 35.0, 100)),
            ),
            show_goodies: true,
            show_food: false,
        },
        AnimationState::HavingTreat => Pose {
            head_sprite: 4,
            body: BodyKind::Normal,
            frame_ms: 100,
            head: target(fixed(0.0), fixed(0.0), osc(-15.0, -5.0, 300)),
            slots: swaying_slots(),
            show_goodies: true,
            show_food: false,
        },
        AnimationState::Sleeping => Pose {
            head_sprite: 2,
            body: BodyKind::Sleep,
            frame_ms: 700,
            head: Target::fixed(-10.0, 80.0, 65.0),
            slots: rest,
            show_goodies: false,
            show_food: false,
        },
    }
}

/// Face and hat sway gently; the rest stay put.
fn swaying_slots() -> [Target; SLOT_COUNT] {
    with_face_and_hat(
        target(fixed(0.0), fixed(0.0), osc(0.0, 10.0, 300)),
        target(fixed(0.0), fixed(0.0), osc(0.0, 5.0, 300)),
    )
}

fn with_face_and_hat(face: Target, hat: Target) -> [Target; SLOT_COUNT] {
    let mut slots = [Target::REST; SLOT_COUNT];
    slots[0] = face;
    slots[1] = hat;
    slots
}
