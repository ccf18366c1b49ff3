//! Floating hearts shown while the pet is happy.
//!
//! Each heart pops in, drifts sideways, rises, fades, and is gone after
//! [`HEART_LIFE_MS`].

use jiff::Timestamp;

use super::Dice;
use super::animator::millis_between;

/// One heart every this many milliseconds while happy.
pub const HEART_SPAWN_MS: i64 = 100;

/// How long a heart lives.
pub const HEART_LIFE_MS: i64 = 1500;

const RISE: f32 = 150.0;
const POP_MS: i64 = 300;

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Heart {
    pub id: u64,
    pub born: Timestamp,
    start_x: i32,
    start_y: i32,
    drift_x: i32,
    spin: i32,
}

impl Heart {
    pub fn spawn(id: u64, born: Timestamp, dice: &mut impl Dice) -> Self {
        Self {
            id,
            born,
            start_x: dice.between(-50, 100),
            start_y: dice.between(-40, 80),
            drift_x: dice.between(-30, 30),
            spin: dice.between(-10, 10),
        }
    }

    pub fn is_done(&self, now: Timestamp) -> bool {
        millis_between(self.born, now) >= HEART_LIFE_MS
    }

    // Ages stay under HEART_LIFE_MS and offsets are small, so f32 is exact here.
    #[allow(clippy::cast_precision_loss)]
    pub fn view(&self, now: Timestamp) -> HeartView {
        let age = millis_between(self.born, now).clamp(0, HEART_LIFE_MS);
        let t = age as f32 / HEART_LIFE_MS as f32;
        let pop = (age as f32 / POP_MS as f32).min(1.0);
        HeartView {
            id: self.id,
            x: self.start_x as f32 + self.drift_x as f32 * t,
            y: self.start_y as f32 - RISE * t,
            opacity: 1.0 - t,
            scale: 0.5 + 0.5 * pop,
            rotate: self.spin as f32,
        }
    }
}

/// A heart as drawn at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeartView {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub opacity: f32,
    pub scale: f32,
    pub rotate: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::animation::tests::ScriptedDice;

    fn ms(n: i64) -> Timestamp {
        Timestamp::from_millisecond(1_700_000_000_000 + n).unwrap()
    }

    #[test]
    fn heart_rises_and_fades() {
        let heart = Heart::spawn(1, ms(0), &mut ScriptedDice::never());

        let start = heart.view(ms(0));
        let mid = heart.view(ms(750));

        assert!((start.opacity - 1.0).abs() < f32::EPSILON);
        assert!((mid.opacity - 0.5).abs() < 1e-4);
        assert!(mid.y < start.y);
        assert!((start.scale - 0.5).abs() < f32::EPSILON);
        assert!((heart.view(ms(300)).scale - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn heart_is_done_after_its_life() {
        let heart = Heart::spawn(1, ms(0), &mut ScriptedDice::never());
        assert!(!heart.is_done(ms(1_499)));
        assert!(heart.is_done(ms(1_500)));
    }
}
