//! Pet state: stats, coins, and the shared activity log.

use serde::{Deserialize, Serialize};

/// Upper bound for every stat.
pub const STAT_MAX: u8 = 100;

/// The four bounded stats. Each stays in `0..=STAT_MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub mood: u8,
    pub stomach: u8,
    pub energy: u8,
    pub health: u8,
}

impl Stats {
    /// Builds stats from raw integers, clamping each into range.
    pub fn clamped(mood: i64, stomach: i64, energy: i64, health: i64) -> Self {
        Self {
            mood: clamp_stat(mood),
            stomach: clamp_stat(stomach),
            energy: clamp_stat(energy),
            health: clamp_stat(health),
        }
    }
}

/// Clamps a raw value into `0..=STAT_MAX`.
pub fn clamp_stat(value: i64) -> u8 {
    // Lossless: the clamp bounds the value to 0..=100.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let v = value.clamp(0, i64::from(STAT_MAX)) as u8;
    v
}

/// Applies a signed delta to a stat and clamps the result.
pub fn apply_delta(value: u8, delta: i16) -> u8 {
    clamp_stat(i64::from(value) + i64::from(delta))
}

/// Who did what, and when. Newest entry first.
///
/// The three lists are kept the same length: `prepend` is the only
/// mutator, and construction truncates to the shortest input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityLog {
    activity: Vec<String>,
    time: Vec<String>,
    by_user: Vec<String>,
}

impl ActivityLog {
    /// Builds a log from parallel lists, dropping any unmatched tail.
    pub fn from_parts(
        mut activity: Vec<String>,
        mut time: Vec<String>,
        mut by_user: Vec<String>,
    ) -> Self {
        let len = activity.len().min(time.len()).min(by_user.len());
        activity.truncate(len);
        time.truncate(len);
        by_user.truncate(len);
        Self {
            activity,
            time,
            by_user,
        }
    }

    /// Records a new entry at the front of all three lists.
    pub fn prepend(&mut self, activity: &str, time: &str, by_user: &str) {
        self.activity.insert(0, activity.to_string());
        self.time.insert(0, time.to_string());
        self.by_user.insert(0, by_user.to_string());
    }

    pub fn len(&self) -> usize {
        self.activity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activity.is_empty()
    }

    /// Iterates `(activity, time, by_user)` newest first.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.activity
            .iter()
            .zip(&self.time)
            .zip(&self.by_user)
            .map(|((a, t), u)| (a.as_str(), t.as_str(), u.as_str()))
    }
}

/// A pet as the home screen sees it.
///
/// Owned by the active session; replaced wholesale on reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetState {
    pub id: Option<String>,
    pub pet: String,
    pub space: String,
    pub breed: u32,
    pub stats: Stats,
    pub coin: u64,
    pub log: ActivityLog,
    pub boarding: bool,
    pub created_by_client_id: Option<String>,
    pub owner_id: Option<String>,
}

/// The fields a batch update may send back. Absent fields keep their local value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialPetState {
    pub mood: Option<u8>,
    pub stomach: Option<u8>,
    pub energy: Option<u8>,
    pub health: Option<u8>,
    pub coin: Option<u64>,
    pub log: Option<ActivityLog>,
    pub boarding: Option<bool>,
}
