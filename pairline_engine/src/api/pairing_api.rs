use std::{fmt::Debug, sync::Arc};

use chrono::{Duration, Utc};
use log::*;
use pls_common::Coins;
use tokio::sync::Mutex;

use crate::{
    api::errors::PairingError,
    db_types::{Gender, MessagePayload, UserId, WaitingEntry},
    events::{EventProducers, SessionEndedEvent, SessionStartedEvent},
    matching::{SessionRegistry, WaitingPool},
    traits::{MessageSink, UserAccountError, UserManagement},
};

/// The tagged result of a match request. "No partner available" and "not enough coins" are normal
/// outcomes here, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A partner was found, both fees are debited and the session is live.
    Paired { partner: UserId },
    /// No compatible partner was waiting; the request has been parked in the pool.
    Queued,
    /// One of the two balance checks failed. Nothing was debited and no session exists.
    InsufficientFunds,
}

/// The tagged result of a relay call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Delivered { to: UserId },
    /// The partner could not be reached. The session stays up; the sender should be warned.
    DeliveryFailed { to: UserId },
    NotInSession,
}

/// Both shared structures live under one lock: the pool scan-and-remove, the fee debit and the
/// session install form a single critical section per candidate pair, which is what rules out
/// double-pairing and keeps "a user is in at most one of pool/registry" true at all times.
#[derive(Debug, Default)]
struct PairingState {
    pool: WaitingPool,
    sessions: SessionRegistry,
}

/// `PairingApi` is the match engine and session registry rolled into one public surface: it takes
/// match requests, pairs or parks them, relays messages across live sessions and tears sessions
/// down.
pub struct PairingApi<B, S> {
    db: B,
    sink: S,
    state: Arc<Mutex<PairingState>>,
    producers: EventProducers,
    fee: Coins,
}

impl<B, S> Debug for PairingApi<B, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PairingApi")
    }
}

impl<B: Clone, S: Clone> Clone for PairingApi<B, S> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            sink: self.sink.clone(),
            state: Arc::clone(&self.state),
            producers: self.producers.clone(),
            fee: self.fee,
        }
    }
}

impl<B, S> PairingApi<B, S> {
    pub fn new(db: B, sink: S, fee: Coins, producers: EventProducers) -> Self {
        Self { db, sink, state: Arc::new(Mutex::new(PairingState::default())), producers, fee }
    }

    pub fn fee(&self) -> Coins {
        self.fee
    }
}

impl<B, S> PairingApi<B, S>
where
    B: UserManagement,
    S: MessageSink,
{
    /// Handles a match request from `user_id`.
    ///
    /// The pool scan, the fee debit and the session install all happen while holding the engine
    /// lock, so no other request can pair with either of the two involved users mid-transition.
    /// A requester that is already waiting has their old entry replaced by this request.
    pub async fn request_match(
        &self,
        user_id: UserId,
        gender: Gender,
        desired_gender: Gender,
    ) -> Result<MatchOutcome, PairingError> {
        let request = WaitingEntry::new(user_id, gender, desired_gender);
        let mut state = self.state.lock().await;
        if state.sessions.is_active(user_id) {
            return Err(PairingError::AlreadyInSession(user_id));
        }
        // whatever happens next, the requester's previous pool slot is void
        state.pool.remove(user_id);

        let balance = self.db.coin_balance(user_id).await?;
        if balance < self.fee {
            debug!("🔍️ {user_id} requested a match but has {balance}; the fee is {}", self.fee);
            return Ok(MatchOutcome::InsufficientFunds);
        }

        let candidate = match state.pool.find_and_remove(&request) {
            None => {
                state.pool.enqueue(request);
                debug!("🔍️ No partner for {user_id}; parked. Pool size is {}", state.pool.len());
                return Ok(MatchOutcome::Queued);
            },
            Some(c) => c,
        };

        // the candidate is out of the pool now. Every failure path below must put them back.
        match self.db.debit_pairing_fee(user_id, candidate.user_id, self.fee).await {
            Ok(()) => {},
            Err(UserAccountError::InsufficientFunds(who)) => {
                debug!("🔍️ Pairing {user_id}↔{} fell through: {who} cannot pay the fee", candidate.user_id);
                state.pool.restore(candidate);
                return Ok(MatchOutcome::InsufficientFunds);
            },
            Err(e) => {
                state.pool.restore(candidate);
                return Err(e.into());
            },
        }

        if let Err(e) = state.sessions.start(user_id, candidate.user_id) {
            // cannot happen while the lock is held, but if it ever does the debit must not stick
            error!("🔍️ Session install failed after debit for {user_id}↔{}: {e}", candidate.user_id);
            self.db.refund_pairing_fee(user_id, candidate.user_id, self.fee).await?;
            state.pool.restore(candidate);
            return Err(e.into());
        }
        let partner = candidate.user_id;
        drop(state);

        info!("🔍️ Paired {user_id}↔{partner} for {} each", self.fee);
        self.call_session_started_hook(user_id, partner).await;
        Ok(MatchOutcome::Paired { partner })
    }

    /// Forwards `payload` to the sender's partner. Delivery happens outside the engine lock, and a
    /// delivery failure leaves the session untouched.
    pub async fn relay(&self, sender: UserId, payload: MessagePayload) -> Result<RelayOutcome, PairingError> {
        let partner = {
            let state = self.state.lock().await;
            state.sessions.partner_of(sender)
        };
        let Some(partner) = partner else {
            return Ok(RelayOutcome::NotInSession);
        };
        match self.sink.send(partner, &payload).await {
            Ok(()) => {
                trace!("💬️ Relayed a message {sender} → {partner}");
                Ok(RelayOutcome::Delivered { to: partner })
            },
            Err(e) => {
                warn!("💬️ Could not deliver a message {sender} → {partner}: {e}. The session stays up.");
                Ok(RelayOutcome::DeliveryFailed { to: partner })
            },
        }
    }

    /// Ends the user's session, if any, and returns the former partner so the caller can notify
    /// them.
    pub async fn end_session(&self, user_id: UserId) -> Option<UserId> {
        let partner = {
            let mut state = self.state.lock().await;
            state.sessions.end(user_id)
        };
        if let Some(partner) = partner {
            info!("💬️ {user_id} ended their session with {partner}");
            self.call_session_ended_hook(user_id, partner).await;
        }
        partner
    }

    /// Resolves the session partner of `user_id`, if they have one. Read-only.
    pub async fn partner_of(&self, user_id: UserId) -> Option<UserId> {
        self.state.lock().await.sessions.partner_of(user_id)
    }

    pub async fn is_active(&self, user_id: UserId) -> bool {
        self.state.lock().await.sessions.is_active(user_id)
    }

    pub async fn is_waiting(&self, user_id: UserId) -> bool {
        self.state.lock().await.pool.contains(user_id)
    }

    /// Withdraws the user's waiting entry. Returns whether one existed.
    pub async fn cancel_waiting(&self, user_id: UserId) -> bool {
        self.state.lock().await.pool.remove(user_id).is_some()
    }

    /// Removes every entry that has been waiting longer than `max_dwell` and returns them so the
    /// caller can notify the evicted users.
    pub async fn evict_stale(&self, max_dwell: Duration) -> Vec<WaitingEntry> {
        let evicted = {
            let mut state = self.state.lock().await;
            state.pool.evict_stale(Utc::now(), max_dwell)
        };
        if !evicted.is_empty() {
            info!("🕰️ Evicted {} stale waiting entr(ies)", evicted.len());
        }
        evicted
    }

    pub async fn pool_size(&self) -> usize {
        self.state.lock().await.pool.len()
    }

    pub async fn session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }

    async fn call_session_started_hook(&self, user_a: UserId, user_b: UserId) {
        for emitter in &self.producers.session_started_producer {
            let event = SessionStartedEvent { user_a, user_b };
            emitter.publish_event(event).await;
        }
    }

    async fn call_session_ended_hook(&self, ended_by: UserId, partner: UserId) {
        for emitter in &self.producers.session_ended_producer {
            let event = SessionEndedEvent { ended_by, partner };
            emitter.publish_event(event).await;
        }
    }
}
