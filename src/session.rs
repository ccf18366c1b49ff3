//! The home-screen session: one pet, one user, live.
//!
//! A [`PetSession`] is where the pieces meet. User actions mutate the local
//! pet immediately, start an animation, take the action lock, and land in
//! the pending buffer (memory and store). Ticks drive the animator and,
//! every flush interval, ship the buffer to the service and fold the answer
//! back in. [`PetSession::leave`] makes one last attempt on the way out.
//!
//! Flushing is single-flight. [`PetSession::tick`] only starts a flush and
//! hands back the request, so the network call can run off the tick path;
//! its result goes to [`PetSession::complete_flush`]. [`PetSession::flush`]
//! does the whole round trip in one go.

use std::time::Duration;

use jiff::Timestamp;
use tracing::{debug, info, warn};

use crate::animation::{AnimationState, Animator, Dice, Frame};
use crate::api::{ApiError, BatchRequest, SyncClient};
use crate::buffer::{
    ActionLock, DEFAULT_ACTION_LOCK, DEFAULT_FLUSH_INTERVAL, FlushScheduler, PendingActions,
};
use crate::care::{apply_action, reconcile};
use crate::model::{ActionKind, PartialPetState, PetIdentity, PetState, Session};
use crate::store::{KeyValueStore, LocalStore, StoreError};

/// Errors that end a load.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Timer settings for a session.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    pub flush_interval: Duration,
    pub action_lock: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            action_lock: DEFAULT_ACTION_LOCK,
        }
    }
}

/// How a load went.
pub enum LoadOutcome<S, C> {
    Ready(PetSession<S, C>),

    /// No stored session or pet: the user needs onboarding.
    NoSession,

    /// The service doesn't know the stored pet.
    NotFound,
}

/// What a user action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,

    /// The previous action is still playing; nothing changed.
    Locked,
}

/// What a flush attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The buffer was empty.
    Nothing,

    /// Another flush is still outstanding; this one was skipped.
    InFlight,

    /// The service accepted this many actions.
    Sent(usize),

    /// The request failed; the buffer is intact for the next attempt.
    Failed,
}

/// A live session with one pet.
pub struct PetSession<S, C> {
    store: LocalStore<S>,
    client: C,
    session: Session,
    identity: PetIdentity,
    state: PetState,
    pending: PendingActions,
    animator: Animator,
    lock: ActionLock,
    scheduler: FlushScheduler,
}

impl<S: KeyValueStore, C: SyncClient> PetSession<S, C> {
    /// Loads the stored session's pet from the service and starts the timers.
    ///
    /// Transport and server failures are errors; a missing session or an
    /// unknown pet are outcomes.
    pub fn load(
        store: LocalStore<S>,
        client: C,
        timing: Timing,
        now: Timestamp,
    ) -> Result<LoadOutcome<S, C>, SessionError> {
        let (Some(session), Some(identity)) = (store.session()?, store.pet()?) else {
            debug!("no stored session");
            return Ok(LoadOutcome::NoSession);
        };

        let Some(state) = client.get_state(&identity.name, &session.space)? else {
            info!(pet = %identity.name, space = %session.space, "pet not found");
            return Ok(LoadOutcome::NotFound);
        };

        let pending = PendingActions::new(store.pending_actions()?);
        let animator = Animator::new(state.stats.energy, now);
        let mut scheduler = FlushScheduler::new(timing.flush_interval);
        scheduler.start(now);

        info!(
            pet = %state.pet,
            space = %state.space,
            pending = pending.len(),
            animation = animator.state().as_str(),
            "session loaded"
        );

        Ok(LoadOutcome::Ready(Self {
            store,
            client,
            session,
            identity,
            state,
            pending,
            animator,
            lock: ActionLock::new(timing.action_lock),
            scheduler,
        }))
    }

    pub fn state(&self) -> &PetState {
        &self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Actions recorded but not yet confirmed by the service.
    pub fn pending(&self) -> &[ActionKind] {
        self.pending.actions()
    }

    pub fn is_flushing(&self) -> bool {
        self.pending.is_flushing()
    }

    pub fn animation(&self) -> AnimationState {
        self.animator.state()
    }

    pub fn frame(&self, now: Timestamp) -> Frame {
        self.animator.frame(now)
    }

    /// Performs a care action.
    ///
    /// Applied locally at once, recorded for the next flush, and animated.
    /// A no-op while the previous action's animation holds the lock.
    pub fn perform_action(
        &mut self,
        action: ActionKind,
        now: Timestamp,
    ) -> Result<ActionOutcome, StoreError> {
        if !self.lock.try_acquire(now) {
            debug!(%action, "action ignored while locked");
            return Ok(ActionOutcome::Locked);
        }

        self.state = apply_action(&self.state, action, &self.session.user, now);
        self.pending.push(action);
        self.animator.trigger(AnimationState::for_action(action), now);
        debug!(%action, pending = self.pending.len(), "action applied");

        self.store.set_pending_actions(self.pending.actions())?;
        Ok(ActionOutcome::Applied)
    }

    /// Taps the pet: the `pet` action, shown as happy.
    pub fn tap(&mut self, now: Timestamp) -> Result<ActionOutcome, StoreError> {
        self.perform_action(ActionKind::Pet, now)
    }

    /// Advances animations. When the flush timer fires, marks the buffer in
    /// flight and returns the request to send; hand its result to
    /// [`Self::complete_flush`].
    pub fn tick(&mut self, now: Timestamp, dice: &mut impl Dice) -> Option<BatchRequest> {
        self.animator.tick(now, dice);
        if self.scheduler.due(now) {
            return self.begin_flush();
        }
        None
    }

    /// Marks the buffer in flight and returns the request to send.
    ///
    /// `None` when nothing is pending or a flush is already outstanding.
    pub fn begin_flush(&mut self) -> Option<BatchRequest> {
        let actions = self.pending.begin_flush()?;
        Some(BatchRequest {
            pet: self.identity.name.clone(),
            space: self.session.space.clone(),
            user: self.session.user.clone(),
            actions,
        })
    }

    /// Applies the result of the request from [`Self::begin_flush`].
    pub fn complete_flush(&mut self, result: Result<PartialPetState, ApiError>) -> FlushOutcome {
        match result {
            Ok(update) => {
                let sent = self.pending.finish_flush(true);
                self.state = reconcile(&self.state, update);
                if let Err(e) = self.store.set_pending_actions(self.pending.actions()) {
                    warn!(error = %e, "failed to persist action buffer after flush");
                }
                if self.pending.is_empty() {
                    info!(sent, "flushed actions");
                } else {
                    info!(
                        sent,
                        remaining = self.pending.len(),
                        "flushed actions, more recorded meanwhile"
                    );
                }
                FlushOutcome::Sent(sent)
            }
            Err(e) => {
                self.pending.finish_flush(false);
                warn!(error = %e, pending = self.pending.len(), "flush failed, will retry");
                FlushOutcome::Failed
            }
        }
    }

    /// Sends the buffer now and waits for the answer.
    pub fn flush(&mut self) -> FlushOutcome {
        if self.pending.is_flushing() {
            debug!(state = ?self.pending.state(), "flush already in flight");
            return FlushOutcome::InFlight;
        }
        let Some(request) = self.begin_flush() else {
            return FlushOutcome::Nothing;
        };
        let result = self.client.batch_action_update(&request);
        self.complete_flush(result)
    }

    /// Fetches the pet again and replaces the local copy wholesale.
    ///
    /// Returns false when the service no longer knows the pet.
    pub fn reload(&mut self, now: Timestamp) -> Result<bool, SessionError> {
        let Some(state) = self
            .client
            .get_state(&self.identity.name, &self.session.space)?
        else {
            return Ok(false);
        };
        self.animator.refresh(state.stats.energy, now);
        self.state = state;
        Ok(true)
    }

    /// Ends the session.
    ///
    /// Stops every timer, then flushes whatever the store holds at this
    /// instant, unless a flush is still outstanding.
    pub fn leave(mut self) -> FlushOutcome {
        self.scheduler.stop();
        self.animator.stop();

        if self.pending.is_flushing() {
            warn!("leaving with a flush in flight; buffer stays for next session");
            return FlushOutcome::InFlight;
        }

        match self.store.pending_actions() {
            Ok(stored) => self.pending.reset(stored),
            Err(e) => warn!(error = %e, "could not read stored buffer, using memory copy"),
        }
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::animation::tests::ScriptedDice;
    use crate::api::fake::FakeClient;
    use crate::care::tests::sample_state;
    use crate::store::MemoryStore;

    use ActionKind::{Feed, Toy, Treat};

    fn ms(n: i64) -> Timestamp {
        Timestamp::from_millisecond(1_700_000_000_000 + n).unwrap()
    }

    fn stored(kv: &MemoryStore) -> LocalStore<&MemoryStore> {
        let store = LocalStore::new(kv);
        store
            .set_session(&Session {
                user: "ann".into(),
                space: "blue-otter".into(),
            })
            .unwrap();
        store
            .set_pet(&PetIdentity {
                name: "Biscuit".into(),
                breed: 3,
            })
            .unwrap();
        store
    }

    fn no_lock() -> Timing {
        Timing {
            flush_interval: Duration::from_secs(15),
            action_lock: Duration::ZERO,
        }
    }

    fn ready<'a>(
        kv: &'a MemoryStore,
        client: &'a FakeClient,
        timing: Timing,
    ) -> PetSession<&'a MemoryStore, &'a FakeClient> {
        match PetSession::load(stored(kv), client, timing, ms(0)).unwrap() {
            LoadOutcome::Ready(s) => s,
            _ => panic!("expected a ready session"),
        }
    }

    #[test]
    fn load_without_session_is_no_session() {
        let kv = MemoryStore::new();
        let client = FakeClient::with_state(sample_state());

        let outcome = PetSession::load(LocalStore::new(&kv), &client, no_lock(), ms(0)).unwrap();
        assert!(matches!(outcome, LoadOutcome::NoSession));
    }

    #[test]
    fn load_unknown_pet_is_not_found() {
        let kv = MemoryStore::new();
        let client = FakeClient::default();

        let outcome = PetSession::load(stored(&kv), &client, no_lock(), ms(0)).unwrap();
        assert!(matches!(outcome, LoadOutcome::NotFound));
    }

    #[test]
    fn load_transport_failure_is_error() {
        let kv = MemoryStore::new();
        let client = FakeClient::with_state(sample_state());
        *client.state_fails.borrow_mut() = true;

        let err = PetSession::load(stored(&kv), &client, no_lock(), ms(0))
            .err()
            .unwrap();
        assert!(matches!(err, SessionError::Api(ApiError::Status(503))));
    }

    #[test]
    fn low_energy_loads_asleep() {
        let kv = MemoryStore::new();
        let mut state = sample_state();
        state.stats.energy = 3;
        let client = FakeClient::with_state(state);

        let session = ready(&kv, &client, no_lock());
        assert_eq!(session.animation(), AnimationState::Sleeping);
    }

    #[test]
    fn normal_energy_loads_idle() {
        let kv = MemoryStore::new();
        let client = FakeClient::with_state(sample_state());

        let session = ready(&kv, &client, no_lock());
        assert_eq!(session.animation(), AnimationState::Idle);
    }

    #[test]
    fn action_applies_buffers_and_animates() {
        let kv = MemoryStore::new();
        let client = FakeClient::with_state(sample_state());
        let mut session = ready(&kv, &client, no_lock());

        let outcome = session.perform_action(Feed, ms(10)).unwrap();

        assert_eq!(outcome, ActionOutcome::Applied);
        assert_eq!(session.state().stats.stomach, 100);
        assert_eq!(session.state().coin, 11);
        assert_eq!(session.pending(), &[Feed]);
        assert_eq!(session.animation(), AnimationState::Eating);
        assert_eq!(LocalStore::new(&kv).pending_actions().unwrap(), vec![Feed]);
        // Nothing reaches the network until a flush.
        assert!(client.sent().is_empty());
    }

    #[test]
    fn locked_action_is_noop() {
        let kv = MemoryStore::new();
        let client = FakeClient::with_state(sample_state());
        let mut session = ready(&kv, &client, Timing::default());

        session.perform_action(Feed, ms(0)).unwrap();
        let before = session.state().clone();

        let outcome = session.perform_action(Toy, ms(1_000)).unwrap();

        assert_eq!(outcome, ActionOutcome::Locked);
        assert_eq!(session.state(), &before);
        assert_eq!(session.pending(), &[Feed]);
        assert_eq!(session.animation(), AnimationState::Eating);

        let outcome = session.perform_action(Toy, ms(3_000)).unwrap();
        assert_eq!(outcome, ActionOutcome::Applied);
        assert_eq!(session.pending(), &[Feed, Toy]);
    }

    #[test]
    fn tap_makes_pet_happy() {
        let kv = MemoryStore::new();
        let client = FakeClient::with_state(sample_state());
        let mut session = ready(&kv, &client, no_lock());

        session.tap(ms(0)).unwrap();

        assert_eq!(session.animation(), AnimationState::Happy);
        assert_eq!(session.pending(), &[ActionKind::Pet]);
    }

    #[test]
    fn animation_reverts_independently_of_sync() {
        let kv = MemoryStore::new();
        let client = FakeClient::with_state(sample_state());
        let mut session = ready(&kv, &client, no_lock());
        let mut dice = ScriptedDice::never();

        session.perform_action(Feed, ms(0)).unwrap();
        assert_eq!(session.tick(ms(3_000), &mut dice), None);

        assert_eq!(session.animation(), AnimationState::Idle);
        assert_eq!(session.pending(), &[Feed]);
    }

    #[test]
    fn timer_flush_sends_in_order_and_reconciles() {
        let kv = MemoryStore::new();
        let client = FakeClient::with_state(sample_state());
        let mut session = ready(&kv, &client, no_lock());
        let mut dice = ScriptedDice::never();

        for (i, action) in [Feed, Toy, Treat].into_iter().enumerate() {
            session.perform_action(action, ms(i as i64)).unwrap();
        }
        client.reply(Ok(PartialPetState {
            coin: Some(99),
            ..PartialPetState::default()
        }));

        assert_eq!(session.tick(ms(14_000), &mut dice), None);
        let request = session.tick(ms(15_000), &mut dice).unwrap();
        assert!(session.is_flushing());
        let outcome = session.complete_flush(client.batch_action_update(&request));

        assert_eq!(outcome, FlushOutcome::Sent(3));
        assert_eq!(client.sent(), vec![vec![Feed, Toy, Treat]]);
        assert_eq!(client.batches.borrow()[0].user, "ann");
        assert!(session.pending().is_empty());
        assert!(LocalStore::new(&kv).pending_actions().unwrap().is_empty());
        assert_eq!(session.state().coin, 99);
    }

    #[test]
    fn failed_flush_keeps_buffer_for_retry() {
        let kv = MemoryStore::new();
        let client = FakeClient::with_state(sample_state());
        let mut session = ready(&kv, &client, no_lock());

        session.perform_action(Feed, ms(0)).unwrap();
        session.perform_action(Toy, ms(1)).unwrap();
        let before = LocalStore::new(&kv).pending_actions().unwrap();
        client.reply(Err(ApiError::Status(500)));

        assert_eq!(session.flush(), FlushOutcome::Failed);
        assert_eq!(session.pending(), before.as_slice());
        assert_eq!(LocalStore::new(&kv).pending_actions().unwrap(), before);

        session.perform_action(Treat, ms(2)).unwrap();
        assert_eq!(session.flush(), FlushOutcome::Sent(3));
        assert_eq!(client.sent()[1], vec![Feed, Toy, Treat]);
        assert!(session.pending().is_empty());
    }

    #[test]
    fn empty_buffer_sends_nothing() {
        let kv = MemoryStore::new();
        let client = FakeClient::with_state(sample_state());
        let mut session = ready(&kv, &client, no_lock());

        assert_eq!(session.flush(), FlushOutcome::Nothing);
        assert!(client.sent().is_empty());
    }

    #[test]
    fn tick_with_empty_buffer_starts_nothing() {
        let kv = MemoryStore::new();
        let client = FakeClient::with_state(sample_state());
        let mut session = ready(&kv, &client, no_lock());

        assert_eq!(session.tick(ms(15_000), &mut ScriptedDice::never()), None);
        assert!(!session.is_flushing());
    }

    #[test]
    fn single_flight_flush() {
        let kv = MemoryStore::new();
        let client = FakeClient::with_state(sample_state());
        let mut session = ready(&kv, &client, no_lock());

        session.perform_action(Feed, ms(0)).unwrap();
        let request = session.begin_flush().unwrap();
        session.perform_action(Toy, ms(1)).unwrap();

        // A tick while the first batch is out must not send another.
        assert_eq!(session.flush(), FlushOutcome::InFlight);
        assert!(session.begin_flush().is_none());
        assert_eq!(session.tick(ms(15_000), &mut ScriptedDice::never()), None);
        assert!(client.sent().is_empty());

        assert_eq!(request.actions, vec![Feed]);
        let outcome = session.complete_flush(Ok(PartialPetState::default()));

        assert_eq!(outcome, FlushOutcome::Sent(1));
        assert_eq!(session.pending(), &[Toy]);
        assert_eq!(LocalStore::new(&kv).pending_actions().unwrap(), vec![Toy]);
    }

    #[test]
    fn buffer_survives_restart() {
        let kv = MemoryStore::new();
        let client = FakeClient::with_state(sample_state());
        {
            let mut session = ready(&kv, &client, no_lock());
            session.perform_action(Feed, ms(0)).unwrap();
            session.perform_action(Toy, ms(1)).unwrap();
        }

        let session = ready(&kv, &client, no_lock());
        assert_eq!(session.pending(), &[Feed, Toy]);
    }

    #[test]
    fn leave_flushes_what_the_store_holds() {
        let kv = MemoryStore::new();
        let client = FakeClient::with_state(sample_state());
        let mut session = ready(&kv, &client, no_lock());

        session.perform_action(Feed, ms(0)).unwrap();
        // Recorded by another path just before teardown.
        LocalStore::new(&kv)
            .set_pending_actions(&[Feed, Treat])
            .unwrap();

        assert_eq!(session.leave(), FlushOutcome::Sent(2));
        assert_eq!(client.sent(), vec![vec![Feed, Treat]]);
        assert!(LocalStore::new(&kv).pending_actions().unwrap().is_empty());
    }

    #[test]
    fn leave_with_flush_in_flight_does_not_send() {
        let kv = MemoryStore::new();
        let client = FakeClient::with_state(sample_state());
        let mut session = ready(&kv, &client, no_lock());

        session.perform_action(Feed, ms(0)).unwrap();
        session.begin_flush().unwrap();

        assert_eq!(session.leave(), FlushOutcome::InFlight);
        assert!(client.sent().is_empty());
        assert_eq!(LocalStore::new(&kv).pending_actions().unwrap(), vec![Feed]);
    }

    #[test]
    fn reload_replaces_state_and_wakes() {
        let kv = MemoryStore::new();
        let mut tired = sample_state();
        tired.stats.energy = 2;
        let client = FakeClient::with_state(tired);
        let mut session = ready(&kv, &client, no_lock());
        assert_eq!(session.animation(), AnimationState::Sleeping);

        let mut rested = sample_state();
        rested.stats.energy = 80;
        *client.state.borrow_mut() = Some(rested.clone());

        assert!(session.reload(ms(100)).unwrap());
        assert_eq!(session.state(), &rested);
        assert_eq!(session.animation(), AnimationState::Idle);
    }
}
