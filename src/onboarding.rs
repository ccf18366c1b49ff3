//! Getting a user to a pet: registering the install, adopting a new pet,
//! or joining a space someone else already made.
//!
//! Each flow validates its input, talks to the service, and writes the
//! resulting session to the store. Nothing here keeps state of its own.

use tracing::info;

use crate::api::{ApiError, SyncClient};
use crate::model::{PetIdentity, Session};
use crate::store::{KeyValueStore, LocalStore, StoreError};

/// Number of breeds; breeds are numbered from zero.
pub const BREED_COUNT: u32 = 14;

/// Longest pet name accepted, in characters.
pub const NAME_MAX: usize = 24;

#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("please enter a name for your pet")]
    EmptyName,

    #[error("pet names can be at most {NAME_MAX} characters")]
    NameTooLong,

    #[error("breed must be between 0 and {}", BREED_COUNT - 1)]
    UnknownBreed(u32),

    #[error("please enter a space name")]
    MissingSpace,

    #[error("please enter a nickname")]
    MissingNickname,

    #[error("space `{0}` has no pets")]
    EmptySpace(String),

    #[error("no pet named `{pet}` in space `{space}`")]
    PetNotInSpace { pet: String, space: String },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = core::result::Result<T, OnboardingError>;

/// Returns the stored client id, registering the install first if needed.
pub fn register_install<S: KeyValueStore, C: SyncClient>(
    store: &LocalStore<S>,
    client: &C,
) -> Result<String> {
    if let Some(id) = store.client_id()? {
        return Ok(id);
    }
    let id = client.register_install()?;
    store.set_client_id(&id)?;
    info!(client_id = %id, "registered install");
    Ok(id)
}

/// Checks a pet name and returns it trimmed.
pub fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(OnboardingError::EmptyName);
    }
    if name.chars().count() > NAME_MAX {
        return Err(OnboardingError::NameTooLong);
    }
    Ok(name)
}

pub fn validate_breed(breed: u32) -> Result<u32> {
    if breed < BREED_COUNT {
        Ok(breed)
    } else {
        Err(OnboardingError::UnknownBreed(breed))
    }
}

/// Adopts a new pet in a fresh space and signs in as this install.
pub fn adopt<S: KeyValueStore, C: SyncClient>(
    store: &LocalStore<S>,
    client: &C,
    name: &str,
    breed: u32,
) -> Result<Session> {
    let name = validate_name(name)?;
    let breed = validate_breed(breed)?;
    let client_id = register_install(store, client)?;

    let created = client.create_pet(name, breed, &client_id)?;
    let session = Session {
        user: client_id,
        space: created.space,
    };
    sign_in(
        store,
        &session,
        &PetIdentity {
            name: created.pet,
            breed: created.breed,
        },
    )?;
    info!(pet = %name, space = %session.space, "adopted pet");
    Ok(session)
}

/// Joins an existing space under a nickname.
///
/// Picks the pet called `pet` when given, otherwise the space's first pet.
pub fn join<S: KeyValueStore, C: SyncClient>(
    store: &LocalStore<S>,
    client: &C,
    space: &str,
    nickname: &str,
    pet: Option<&str>,
) -> Result<(Session, PetIdentity)> {
    let space = space.trim();
    if space.is_empty() {
        return Err(OnboardingError::MissingSpace);
    }
    let nickname = nickname.trim();
    if nickname.is_empty() {
        return Err(OnboardingError::MissingNickname);
    }

    let pets = client.pets_in_space(space)?;
    let chosen = match pet.map(str::trim) {
        Some(wanted) => pets
            .into_iter()
            .find(|p| p.name == wanted)
            .ok_or_else(|| OnboardingError::PetNotInSpace {
                pet: wanted.to_string(),
                space: space.to_string(),
            })?,
        None => pets
            .into_iter()
            .next()
            .ok_or_else(|| OnboardingError::EmptySpace(space.to_string()))?,
    };

    let session = Session {
        user: nickname.to_string(),
        space: space.to_string(),
    };
    sign_in(store, &session, &chosen)?;
    info!(pet = %chosen.name, space, user = nickname, "joined space");
    Ok((session, chosen))
}

/// Forgets the session. The client id and recent spaces are kept.
pub fn sign_out<S: KeyValueStore>(store: &LocalStore<S>) -> Result<()> {
    store.clear_all()?;
    info!("signed out");
    Ok(())
}

fn sign_in<S: KeyValueStore>(
    store: &LocalStore<S>,
    session: &Session,
    pet: &PetIdentity,
) -> Result<()> {
    store.set_session(session)?;
    store.set_pet(pet)?;
    store.remember_space(&session.space)?;
    Ok(())
}
