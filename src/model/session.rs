//! Who is playing, where, and with which pet.

use serde::{Deserialize, Serialize};

/// The signed-in user and the space they are in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: String,
    pub space: String,
}

/// The pet the session is looking after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetIdentity {
    pub name: String,
    pub breed: u32,
}
