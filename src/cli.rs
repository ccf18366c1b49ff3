//! CLI interface for Petsync.
//!
//! Each subcommand is one short visit with the pet: load it, do the thing,
//! sync whatever is pending on the way out. `petsync play` stays on the home
//! screen until you quit.
//!
//! Commands split into two groups:
//!
//! - `register`, `adopt`, `join`, `recent`, `sign-out`: getting to a pet.
//! - everything else: operating on the signed-in pet.

mod format;
mod play;

use std::time::Duration;

use clap::{Parser, Subcommand};
use jiff::Timestamp;

use crate::api::{HttpClient, PetScope, SyncClient};
use crate::config::Config;
use crate::model::{ActionKind, Goodie, PetIdentity, Session, worn};
use crate::onboarding;
use crate::session::{ActionOutcome, FlushOutcome, LoadOutcome, PetSession};
use crate::store::{KeyValueStore, LocalStore, SqliteStore, StoreError};

use format::{format_flush, format_goodies, format_log, format_status};

/// Petsync: look after a shared pet from the terminal.
#[derive(Debug, Parser)]
#[command(name = "petsync", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Getting started
  petsync adopt Biscuit --breed 3        → prints the new space name
  petsync join blue-otter --as ann       → join a friend's space instead

Looking after your pet
  petsync status
  petsync feed | toy | treat | pet
  petsync play                           → live session; type feed, toy, treat, pet, quit"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register this install with the pet service. Prints the client id.
    Register,

    /// Adopt a new pet in a fresh space.
    Adopt {
        /// The pet's name (at most 24 characters).
        name: String,

        /// Breed number, 0 to 13.
        #[arg(long, default_value_t = 0)]
        breed: u32,
    },

    /// Join an existing space.
    Join {
        /// The space to join.
        space: String,

        /// Your nickname in the space.
        #[arg(long = "as")]
        nickname: String,

        /// Which pet to look after. Defaults to the space's first pet.
        #[arg(long)]
        pet: Option<String>,
    },

    /// Show the pet's stats and recent activity.
    Status {
        /// How many log entries to show.
        #[arg(long, default_value_t = 5)]
        log: usize,
    },

    /// Feed the pet.
    Feed,

    /// Play with a toy.
    Toy,

    /// Give a treat.
    Treat,

    /// Pet the pet.
    Pet,

    /// Send buffered actions now.
    Flush,

    /// Stay with the pet: live animation, actions from stdin.
    Play {
        /// Milliseconds between ticks.
        #[arg(long, default_value_t = 100)]
        tick_ms: u64,
    },

    /// Refresh and list the pet's goodies. `*` marks worn ones.
    Goodies,

    /// Put a goodie on, or take it off.
    Wear {
        /// Goodie id.
        id: u32,

        /// Take it off instead.
        #[arg(long)]
        off: bool,
    },

    /// Show this install's coin count.
    Coins,

    /// Show the space's favorite users.
    Leaderboard,

    /// Show the space's recent activity.
    Activity,

    /// List recently visited spaces.
    Recent,

    /// Forget the current session. Keeps this install's registration.
    SignOut,
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config, kv: &SqliteStore, client: &HttpClient) -> Result<(), String> {
    let cli = Cli::parse();
    let store = LocalStore::new(kv);

    match cli.command {
        Command::Register => {
            let id = onboarding::register_install(&store, client)
                .map_err(|e| format!("failed to register: {e}"))?;
            println!("{id}");
            Ok(())
        }
        Command::Adopt { name, breed } => {
            let session = onboarding::adopt(&store, client, &name, breed)
                .map_err(|e| format!("failed to adopt: {e}"))?;
            println!("{}", session.space);
            eprintln!("Share the space name so others can join.");
            Ok(())
        }
        Command::Join {
            space,
            nickname,
            pet,
        } => {
            let (session, pet) =
                onboarding::join(&store, client, &space, &nickname, pet.as_deref())
                    .map_err(|e| format!("failed to join: {e}"))?;
            eprintln!(
                "Joined {} as {}, looking after {}",
                session.space, session.user, pet.name
            );
            Ok(())
        }
        Command::Status { log } => cmd_status(config, kv, client, &store, log),
        Command::Feed => cmd_action(config, kv, client, ActionKind::Feed),
        Command::Toy => cmd_action(config, kv, client, ActionKind::Toy),
        Command::Treat => cmd_action(config, kv, client, ActionKind::Treat),
        Command::Pet => cmd_action(config, kv, client, ActionKind::Pet),
        Command::Flush => cmd_flush(config, kv, client),
        Command::Play { tick_ms } => {
            let worn = worn_goodies(&store)?;
            play::run(
                open_session(config, kv, client)?,
                client,
                &worn,
                Duration::from_millis(tick_ms.max(1)),
            )
        }
        Command::Goodies => cmd_goodies(&store, client),
        Command::Wear { id, off } => cmd_wear(&store, id, !off),
        Command::Coins => {
            let client_id = store
                .client_id()
                .map_err(|e| format!("failed to read store: {e}"))?
                .ok_or("this install isn't registered yet: run `petsync register`")?;
            let coins = client
                .coin_count(&client_id)
                .map_err(|e| format!("failed to fetch coins: {e}"))?;
            println!("{coins}");
            Ok(())
        }
        Command::Leaderboard => {
            let scope = require_scope(&store)?;
            let users = client
                .favorite_users(&scope)
                .map_err(|e| format!("failed to fetch favorite users: {e}"))?;
            print_json(&users)
        }
        Command::Activity => {
            let scope = require_scope(&store)?;
            let activity = client
                .recent_activity(&scope)
                .map_err(|e| format!("failed to fetch recent activity: {e}"))?;
            print_json(&activity)
        }
        Command::Recent => {
            let spaces = store
                .recent_spaces()
                .map_err(|e| format!("failed to read store: {e}"))?;
            if spaces.is_empty() {
                println!("No recent spaces");
            }
            for space in spaces.iter().rev() {
                println!("{space}");
            }
            Ok(())
        }
        Command::SignOut => {
            onboarding::sign_out(&store).map_err(|e| format!("failed to sign out: {e}"))?;
            eprintln!("Signed out");
            Ok(())
        }
    }
}

type CliSession<'a> = PetSession<&'a SqliteStore, &'a HttpClient>;

/// Loads the signed-in pet, turning every non-ready outcome into a message.
fn open_session<'a>(
    config: &Config,
    kv: &'a SqliteStore,
    client: &'a HttpClient,
) -> Result<CliSession<'a>, String> {
    let loaded = PetSession::load(LocalStore::new(kv), client, config.timing(), Timestamp::now())
        .map_err(|e| format!("failed to load your pet: {e}\nCheck your connection and try again."))?;

    match loaded {
        LoadOutcome::Ready(session) => Ok(session),
        LoadOutcome::NoSession => Err("no pet yet: run `petsync adopt <name>` or \
             `petsync join <space> --as <nickname>`"
            .to_string()),
        LoadOutcome::NotFound => Err("pet not found: it may have been removed. \
             Run `petsync sign-out` and join again."
            .to_string()),
    }
}

fn cmd_status(
    config: &Config,
    kv: &SqliteStore,
    client: &HttpClient,
    store: &LocalStore<&SqliteStore>,
    log_limit: usize,
) -> Result<(), String> {
    let session = open_session(config, kv, client)?;
    println!("{}", format_status(session.state(), session.animation()));

    let worn = worn_goodies(store)?;
    if !worn.is_empty() {
        let ids: Vec<String> = worn.iter().map(|g| g.id.to_string()).collect();
        println!("wearing  {}", ids.join(", "));
    }

    let log = &session.state().log;
    if !log.is_empty() {
        println!("\nactivity ({} total)", log.len());
        for line in format_log(log, log_limit) {
            println!("{line}");
        }
    }
    if !session.pending().is_empty() {
        eprintln!("{} action(s) waiting to sync", session.pending().len());
    }

    report_flush(session.leave());
    Ok(())
}

fn cmd_action(
    config: &Config,
    kv: &SqliteStore,
    client: &HttpClient,
    action: ActionKind,
) -> Result<(), String> {
    let session = open_session(config, kv, client)?;

    let (recorded, flushed) =
        act_then_leave(session, action, Timestamp::now(), |session, outcome| match outcome {
            ActionOutcome::Applied => {
                println!("{}", format_status(session.state(), session.animation()));
            }
            ActionOutcome::Locked => {
                eprintln!("{} is busy, try again in a moment", session.state().pet);
            }
        });

    report_flush(flushed);
    recorded.map_err(|e| format!("failed to record {action}: {e}"))
}

/// Performs one action, shows the result, then leaves.
///
/// The leave flush runs even when recording the action failed, so actions
/// buffered by earlier runs still go out.
fn act_then_leave<S: KeyValueStore, C: SyncClient>(
    mut session: PetSession<S, C>,
    action: ActionKind,
    now: Timestamp,
    show: impl FnOnce(&PetSession<S, C>, ActionOutcome),
) -> (Result<(), StoreError>, FlushOutcome) {
    let recorded = session
        .perform_action(action, now)
        .map(|outcome| show(&session, outcome));
    (recorded, session.leave())
}

fn cmd_flush(config: &Config, kv: &SqliteStore, client: &HttpClient) -> Result<(), String> {
    let session = open_session(config, kv, client)?;
    match format_flush(session.leave()) {
        Some(message) => eprintln!("{message}"),
        None => eprintln!("Nothing to sync"),
    }
    Ok(())
}

fn cmd_goodies(store: &LocalStore<&SqliteStore>, client: &HttpClient) -> Result<(), String> {
    let scope = require_scope(store)?;
    let owned = client
        .goodies(&scope)
        .map_err(|e| format!("failed to fetch goodies: {e}"))?;
    store
        .set_goodies_owned(&owned)
        .map_err(|e| format!("failed to save goodies: {e}"))?;

    let equipped = store
        .equipped()
        .map_err(|e| format!("failed to read store: {e}"))?;
    if owned.is_empty() {
        println!("No goodies");
    }
    for line in format_goodies(&owned, &equipped) {
        println!("{line}");
    }
    Ok(())
}

fn cmd_wear(store: &LocalStore<&SqliteStore>, id: u32, on: bool) -> Result<(), String> {
    let owned = store
        .goodies_owned()
        .map_err(|e| format!("failed to read store: {e}"))?;
    let index = owned
        .iter()
        .position(|g| g.id == id)
        .ok_or_else(|| format!("you don't own goodie {id}; run `petsync goodies` to refresh"))?;

    let mut equipped = store
        .equipped()
        .map_err(|e| format!("failed to read store: {e}"))?;
    if equipped.len() < owned.len() {
        equipped.resize(owned.len(), false);
    }
    equipped[index] = on;
    store
        .set_equipped(&equipped)
        .map_err(|e| format!("failed to save goodies: {e}"))?;

    let verb = if on { "Wearing" } else { "Took off" };
    eprintln!("{verb} goodie {id}");
    Ok(())
}

fn worn_goodies(store: &LocalStore<&SqliteStore>) -> Result<Vec<Goodie>, String> {
    let owned = store
        .goodies_owned()
        .map_err(|e| format!("failed to read store: {e}"))?;
    let equipped = store
        .equipped()
        .map_err(|e| format!("failed to read store: {e}"))?;
    Ok(worn(&owned, &equipped).collect())
}

/// The stored session and pet, or a message telling the user to onboard.
fn require_scope(store: &LocalStore<&SqliteStore>) -> Result<PetScope, String> {
    let session: Option<Session> = store
        .session()
        .map_err(|e| format!("failed to read store: {e}"))?;
    let pet: Option<PetIdentity> = store
        .pet()
        .map_err(|e| format!("failed to read store: {e}"))?;
    match (session, pet) {
        (Some(session), Some(pet)) => Ok(PetScope {
            pet: pet.name,
            space: session.space,
            user: session.user,
        }),
        _ => Err("no pet yet: run `petsync adopt <name>` or `petsync join <space> --as <nickname>`"
            .to_string()),
    }
}

fn print_json(values: &[serde_json::Value]) -> Result<(), String> {
    let json = serde_json::to_string_pretty(values)
        .map_err(|e| format!("failed to format response: {e}"))?;
    println!("{json}");
    Ok(())
}

fn report_flush(outcome: FlushOutcome) {
    if let Some(message) = format_flush(outcome) {
        eprintln!("{message}");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::io;

    use super::*;

    use crate::api::fake::FakeClient;
    use crate::care::tests::sample_state;
    use crate::session::Timing;
    use crate::store::MemoryStore;

    /// Reads through to memory; writes fail once `failing` is set.
    struct WritesFail<'a> {
        inner: &'a MemoryStore,
        failing: Cell<bool>,
    }

    impl KeyValueStore for WritesFail<'_> {
        fn get(&self, key: &str) -> crate::store::Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> crate::store::Result<()> {
            if self.failing.get() {
                return Err(StoreError::Io(io::Error::other("disk full")));
            }
            self.inner.set(key, value)
        }

        fn delete(&self, key: &str) -> crate::store::Result<()> {
            self.inner.delete(key)
        }
    }

    #[test]
    fn failed_action_still_flushes_earlier_buffer() {
        let kv = MemoryStore::new();
        let local = LocalStore::new(&kv);
        local
            .set_session(&Session {
                user: "ann".into(),
                space: "blue-otter".into(),
            })
            .unwrap();
        local
            .set_pet(&PetIdentity {
                name: "Biscuit".into(),
                breed: 3,
            })
            .unwrap();
        local.set_pending_actions(&[ActionKind::Feed]).unwrap();

        let store = WritesFail {
            inner: &kv,
            failing: Cell::new(false),
        };
        let client = FakeClient::with_state(sample_state());
        let now = Timestamp::now();
        let LoadOutcome::Ready(session) =
            PetSession::load(LocalStore::new(&store), &client, Timing::default(), now).unwrap()
        else {
            panic!("expected a ready session");
        };

        store.failing.set(true);
        let mut shown = false;
        let (recorded, flushed) =
            act_then_leave(session, ActionKind::Toy, now, |_, _| shown = true);

        assert!(recorded.is_err());
        assert!(!shown);
        assert_eq!(flushed, FlushOutcome::Sent(1));
        assert_eq!(client.sent(), vec![vec![ActionKind::Feed]]);
    }
}
