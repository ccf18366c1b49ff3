//! Typed access to the fixed key set.
//!
//! Values that fail to parse are treated as absent: a garbled session is no
//! session, a garbled buffer entry is skipped. Backend failures still
//! propagate.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::model::{
    ActionKind, Goodie, PetIdentity, Session, starter_equipped, starter_goodies,
};

use super::{KeyValueStore, Result};

const SESSION: &str = "session";
const PET: &str = "pet";
const CLIENT_ID: &str = "client_id";
const GOODIES_OWNED: &str = "goodies_owned";
const PUT_ON_GOODIES: &str = "put_on_goodies";
const RECENT_SPACES: &str = "recent_spaces";
const CACHED_ACTIONS: &str = "cached_actions";

/// How many recently visited spaces are remembered.
pub const RECENT_SPACES_MAX: usize = 3;

/// Typed facade over a [`KeyValueStore`].
pub struct LocalStore<S> {
    kv: S,
}

impl<S: KeyValueStore> LocalStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    // ── Session ──

    pub fn session(&self) -> Result<Option<Session>> {
        self.read_json(SESSION)
    }

    pub fn set_session(&self, session: &Session) -> Result<()> {
        self.write_json(SESSION, session)
    }

    // ── Pet identity ──

    pub fn pet(&self) -> Result<Option<PetIdentity>> {
        self.read_json(PET)
    }

    pub fn set_pet(&self, pet: &PetIdentity) -> Result<()> {
        self.write_json(PET, pet)
    }

    // ── Client id ──

    /// The install's client id. Stored as a plain string, not JSON.
    pub fn client_id(&self) -> Result<Option<String>> {
        Ok(self.kv.get(CLIENT_ID)?.filter(|s| !s.is_empty()))
    }

    pub fn set_client_id(&self, client_id: &str) -> Result<()> {
        self.kv.set(CLIENT_ID, client_id)
    }

    // ── Goodies ──

    /// Owned goodies; the starter set when nothing is stored.
    pub fn goodies_owned(&self) -> Result<Vec<Goodie>> {
        Ok(self.read_json(GOODIES_OWNED)?.unwrap_or_else(starter_goodies))
    }

    pub fn set_goodies_owned(&self, goodies: &[Goodie]) -> Result<()> {
        self.write_json(GOODIES_OWNED, goodies)
    }

    /// Equipped flags, parallel to [`Self::goodies_owned`].
    pub fn equipped(&self) -> Result<Vec<bool>> {
        Ok(self.read_json(PUT_ON_GOODIES)?.unwrap_or_else(starter_equipped))
    }

    pub fn set_equipped(&self, flags: &[bool]) -> Result<()> {
        self.write_json(PUT_ON_GOODIES, flags)
    }

    // ── Recent spaces ──

    /// Recently visited spaces, most recent last.
    pub fn recent_spaces(&self) -> Result<Vec<String>> {
        Ok(self.read_json(RECENT_SPACES)?.unwrap_or_default())
    }

    /// Moves `space` to the end of the recent list, keeping the last three.
    pub fn remember_space(&self, space: &str) -> Result<()> {
        let mut spaces = self.recent_spaces()?;
        spaces.retain(|s| s != space);
        spaces.push(space.to_string());
        let overflow = spaces.len().saturating_sub(RECENT_SPACES_MAX);
        spaces.drain(..overflow);
        self.write_json(RECENT_SPACES, &spaces)
    }

    // ── Pending actions ──

    /// The persisted action buffer, in recorded order.
    ///
    /// Entries that no longer parse are dropped one by one; the rest survive.
    pub fn pending_actions(&self) -> Result<Vec<ActionKind>> {
        let raw: Vec<serde_json::Value> = self.read_json(CACHED_ACTIONS)?.unwrap_or_default();
        Ok(raw
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry.clone()) {
                Ok(action) => Some(action),
                Err(e) => {
                    warn!(%entry, error = %e, "dropping unknown buffered action");
                    None
                }
            })
            .collect())
    }

    pub fn set_pending_actions(&self, actions: &[ActionKind]) -> Result<()> {
        self.write_json(CACHED_ACTIONS, actions)
    }

    // ── Sign out ──

    /// Forgets the session, pet, goodies, and buffer.
    ///
    /// The client id and recent spaces survive.
    pub fn clear_all(&self) -> Result<()> {
        for key in [SESSION, PET, GOODIES_OWNED, PUT_ON_GOODIES, CACHED_ACTIONS] {
            self.kv.delete(key)?;
        }
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.kv.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                warn!(key, error = %e, "ignoring malformed stored value");
                Ok(None)
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.kv.set(key, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::store::{MemoryStore, SqliteStore};

    fn test_store() -> LocalStore<MemoryStore> {
        LocalStore::new(MemoryStore::new())
    }

    #[test]
    fn session_round_trip() {
        let store = test_store();
        assert_eq!(store.session().unwrap(), None);

        let session = Session {
            user: "ann".into(),
            space: "blue-otter".into(),
        };
        store.set_session(&session).unwrap();
        assert_eq!(store.session().unwrap(), Some(session));

        store.clear_all().unwrap();
        assert_eq!(store.session().unwrap(), None);
    }

    #[test]
    fn malformed_session_is_no_session() {
        let kv = MemoryStore::new();
        kv.set(SESSION, "{not json").unwrap();
        let store = LocalStore::new(kv);

        assert_eq!(store.session().unwrap(), None);
    }

    #[test]
    fn unknown_buffered_action_does_not_lose_the_rest() {
        let kv = MemoryStore::new();
        kv.set(CACHED_ACTIONS, r#"["feed","dance",7,"treat"]"#).unwrap();
        let store = LocalStore::new(kv);

        assert_eq!(
            store.pending_actions().unwrap(),
            vec![ActionKind::Feed, ActionKind::Treat]
        );
    }

    #[test]
    fn goodies_default_to_starter_set() {
        let store = test_store();
        assert_eq!(store.goodies_owned().unwrap(), starter_goodies());
        assert_eq!(store.equipped().unwrap(), vec![false, true, false]);
    }

    #[test]
    fn remember_space_dedups_and_keeps_last_three() {
        let store = test_store();
        for space in ["a", "b", "c", "a", "d"] {
            store.remember_space(space).unwrap();
        }

        assert_eq!(store.recent_spaces().unwrap(), vec!["c", "a", "d"]);
    }

    #[test]
    fn remember_existing_space_moves_it_last() {
        let store = test_store();
        for space in ["a", "b", "a"] {
            store.remember_space(space).unwrap();
        }

        assert_eq!(store.recent_spaces().unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn pending_actions_survive_reopen_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.sqlite");
        let actions = vec![ActionKind::Feed, ActionKind::Toy, ActionKind::Treat];
        {
            let store = LocalStore::new(SqliteStore::open(&path).unwrap());
            store.set_pending_actions(&actions).unwrap();
        }

        let store = LocalStore::new(SqliteStore::open(&path).unwrap());
        assert_eq!(store.pending_actions().unwrap(), actions);
    }

    #[test]
    fn clear_all_keeps_client_id_and_recent_spaces() {
        let store = test_store();
        store.set_client_id("cid").unwrap();
        store.remember_space("a").unwrap();
        store
            .set_session(&Session {
                user: "cid".into(),
                space: "a".into(),
            })
            .unwrap();
        store.set_pending_actions(&[ActionKind::Feed]).unwrap();

        store.clear_all().unwrap();

        assert_eq!(store.session().unwrap(), None);
        assert!(store.pending_actions().unwrap().is_empty());
        assert_eq!(store.client_id().unwrap().as_deref(), Some("cid"));
        assert_eq!(store.recent_spaces().unwrap(), vec!["a"]);
    }
}
