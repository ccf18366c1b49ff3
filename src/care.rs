//! Care logic: what each action does to a pet, and how server answers fold back in.
//!
//! Both functions are pure. The session applies [`apply_action`] the moment
//! the user acts, before anything reaches the network, and [`reconcile`]
//! once a batch flush comes back.

use jiff::Timestamp;

use crate::model::{ActionKind, PartialPetState, PetState, apply_delta};

/// Stat changes for one action. Coin always moves by exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deltas {
    pub stomach: i16,
    pub mood: i16,
    pub energy: i16,
}

/// The fixed delta table.
pub fn deltas(action: ActionKind) -> Deltas {
    match action {
        ActionKind::Feed => Deltas {
            stomach: 50,
            mood: 0,
            energy: -1,
        },
        ActionKind::Pet => Deltas {
            stomach: 0,
            mood: 5,
            energy: -1,
        },
        ActionKind::Treat => Deltas {
            stomach: 2,
            mood: 5,
            energy: -1,
        },
        ActionKind::Toy => Deltas {
            stomach: 0,
            mood: 20,
            energy: -5,
        },
    }
}

/// Returns the state after `user` performs `action` at `at`.
///
/// Stats are clamped independently; health is untouched. The action is
/// recorded at the front of the activity log.
pub fn apply_action(state: &PetState, action: ActionKind, user: &str, at: Timestamp) -> PetState {
    let d = deltas(action);
    let mut next = state.clone();
    next.stats.stomach = apply_delta(next.stats.stomach, d.stomach);
    next.stats.mood = apply_delta(next.stats.mood, d.mood);
    next.stats.energy = apply_delta(next.stats.energy, d.energy);
    next.coin = next.coin.saturating_add(1);
    next.log.prepend(action.as_str(), &at.to_string(), user);
    next
}

/// Shallow-merges a server response over the local state. Server fields win.
pub fn reconcile(state: &PetState, update: PartialPetState) -> PetState {
    let mut next = state.clone();
    if let Some(v) = update.mood {
        next.stats.mood = v;
    }
    if let Some(v) = update.stomach {
        next.stats.stomach = v;
    }
    if let Some(v) = update.energy {
        next.stats.energy = v;
    }
    if let Some(v) = update.health {
        next.stats.health = v;
    }
    if let Some(v) = update.coin {
        next.coin = v;
    }
    if let Some(log) = update.log {
        next.log = log;
    }
    if let Some(v) = update.boarding {
        next.boarding = v;
    }
    next
}
