//! JSON shapes on the wire and their conversion into the model.

use serde::Deserialize;

use crate::model::{ActivityLog, PartialPetState, PetIdentity, PetState, Stats, clamp_stat};

use super::CreatedPet;

#[derive(Debug, Deserialize)]
pub(super) struct RegisterResponse {
    pub client_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreatePetResponse {
    pub space: String,
    pub pet: String,
    pub breed: u32,
}

impl From<CreatePetResponse> for CreatedPet {
    fn from(r: CreatePetResponse) -> Self {
        Self {
            space: r.space,
            pet: r.pet,
            breed: r.breed,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PetInfo {
    pub name: String,
    pub breed: u32,
}

impl From<PetInfo> for PetIdentity {
    fn from(p: PetInfo) -> Self {
        Self {
            name: p.name,
            breed: p.breed,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CoinResponse {
    pub coins: Option<i64>,
}

/// Full pet state as `getState` returns it.
#[derive(Debug, Deserialize)]
pub(super) struct WirePetState {
    pub id: Option<String>,
    pub pet: String,
    pub space: String,
    pub breed: u32,
    pub state_mood: i64,
    pub state_stomach: i64,
    pub state_energy: i64,
    pub state_health: i64,
    #[serde(default)]
    pub coin: i64,
    #[serde(default)]
    pub activity: Vec<String>,
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub by_user: Vec<String>,
    #[serde(default)]
    pub boarding: bool,
    #[serde(rename = "created_by_clientId")]
    pub created_by_client_id: Option<String>,
    #[serde(rename = "ownerId")]
    pub owner_id: Option<String>,
}

impl From<WirePetState> for PetState {
    fn from(w: WirePetState) -> Self {
        Self {
            id: w.id,
            pet: w.pet,
            space: w.space,
            breed: w.breed,
            stats: Stats::clamped(w.state_mood, w.state_stomach, w.state_energy, w.state_health),
            coin: w.coin.max(0).unsigned_abs(),
            log: ActivityLog::from_parts(w.activity, w.time, w.by_user),
            boarding: w.boarding,
            created_by_client_id: w.created_by_client_id,
            owner_id: w.owner_id,
        }
    }
}

/// Whatever subset of the state `batch_action_update` sends back.
#[derive(Debug, Default, Deserialize)]
pub(super) struct WirePartialState {
    pub state_mood: Option<i64>,
    pub state_stomach: Option<i64>,
    pub state_energy: Option<i64>,
    pub state_health: Option<i64>,
    pub coin: Option<i64>,
    pub activity: Option<Vec<String>>,
    pub time: Option<Vec<String>>,
    pub by_user: Option<Vec<String>>,
    pub boarding: Option<bool>,
}

impl From<WirePartialState> for PartialPetState {
    fn from(w: WirePartialState) -> Self {
        // The log is replaced only as a whole, so the lists stay parallel.
        let log = match (w.activity, w.time, w.by_user) {
            (Some(a), Some(t), Some(u)) => Some(ActivityLog::from_parts(a, t, u)),
            _ => None,
        };
        Self {
            mood: w.state_mood.map(clamp_stat),
            stomach: w.state_stomach.map(clamp_stat),
            energy: w.state_energy.map(clamp_stat),
            health: w.state_health.map(clamp_stat),
            coin: w.coin.map(|c| c.max(0).unsigned_abs()),
            log,
            boarding: w.boarding,
        }
    }
}
