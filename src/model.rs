//! Core data model for petsync.
//!
//! These types represent what the home screen works with:
//! the pet and its stats, care actions, the session, and goodies.

mod action;
mod goodie;
mod pet;
mod session;

pub use action::ActionKind;
pub use goodie::{Goodie, starter_equipped, starter_goodies, worn};
pub use pet::{ActivityLog, PartialPetState, PetState, STAT_MAX, Stats, apply_delta, clamp_stat};
pub use session::{PetIdentity, Session};
