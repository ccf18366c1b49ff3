//! Remote sync client: the pet service's JSON endpoints.
//!
//! Every endpoint is a `POST` with a JSON body. [`SyncClient`] is the seam
//! the rest of the crate talks to; [`HttpClient`] is the real thing.
//! Not-found on `get_state` is `Ok(None)`, not an error.

mod http;
mod wire;

use serde::Serialize;

use crate::model::{ActionKind, Goodie, PartialPetState, PetIdentity, PetState};

pub use http::HttpClient;

/// Errors from the remote service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned HTTP {0}")]
    Status(u16),

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response is missing `{0}`")]
    MissingField(&'static str),
}

pub type Result<T> = core::result::Result<T, ApiError>;

/// What `create_pet` hands back: the new space and the pet in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPet {
    pub space: String,
    pub pet: String,
    pub breed: u32,
}

/// Identifies a pet and the user asking about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PetScope {
    pub pet: String,
    pub space: String,
    pub user: String,
}

/// One batched flush: the whole ordered buffer in a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchRequest {
    pub pet: String,
    pub space: String,
    pub user: String,
    pub actions: Vec<ActionKind>,
}

/// Operations against the remote pet service.
pub trait SyncClient {
    /// Registers this install and returns its client id.
    fn register_install(&self) -> Result<String>;

    /// Creates a pet in a fresh space.
    fn create_pet(&self, name: &str, breed: u32, client_id: &str) -> Result<CreatedPet>;

    /// Lists the pets living in a space.
    fn pets_in_space(&self, space: &str) -> Result<Vec<PetIdentity>>;

    /// Fetches a pet's full state. `None` when the service doesn't know it.
    fn get_state(&self, pet: &str, space: &str) -> Result<Option<PetState>>;

    /// Sends buffered actions, in order. Returns the fields the server changed.
    fn batch_action_update(&self, request: &BatchRequest) -> Result<PartialPetState>;

    fn goodies(&self, scope: &PetScope) -> Result<Vec<Goodie>>;

    fn coin_count(&self, client_id: &str) -> Result<u64>;

    fn favorite_users(&self, scope: &PetScope) -> Result<Vec<serde_json::Value>>;

    fn recent_activity(&self, scope: &PetScope) -> Result<Vec<serde_json::Value>>;
}

impl<C: SyncClient + ?Sized> SyncClient for &C {
    fn register_install(&self) -> Result<String> {
        (**self).register_install()
    }

    fn create_pet(&self, name: &str, breed: u32, client_id: &str) -> Result<CreatedPet> {
        (**self).create_pet(name, breed, client_id)
    }

    fn pets_in_space(&self, space: &str) -> Result<Vec<PetIdentity>> {
        (**self).pets_in_space(space)
    }

    fn get_state(&self, pet: &str, space: &str) -> Result<Option<PetState>> {
        (**self).get_state(pet, space)
    }

    fn batch_action_update(&self, request: &BatchRequest) -> Result<PartialPetState> {
        (**self).batch_action_update(request)
    }

    fn goodies(&self, scope: &PetScope) -> Result<Vec<Goodie>> {
        (**self).goodies(scope)
    }

    fn coin_count(&self, client_id: &str) -> Result<u64> {
        (**self).coin_count(client_id)
    }

    fn favorite_users(&self, scope: &PetScope) -> Result<Vec<serde_json::Value>> {
        (**self).favorite_users(scope)
    }

    fn recent_activity(&self, scope: &PetScope) -> Result<Vec<serde_json::Value>> {
        (**self).recent_activity(scope)
    }
}
