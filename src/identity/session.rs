use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::role::{has_role, Action, Capabilities, Role};
use super::storage::{SlotStorage, TOKEN_SLOT, USER_SLOT};
use crate::error::{ClientError, ClientResult};
use crate::forms::FieldErrors;

pub type SessionToken = String;
pub type SubscriptionId = u64;

/// Token slot value marking a session that was ended but whose slot could not be removed.
const TOMBSTONE: &str = "";

/// Identity record persisted in the user slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub token: SessionToken,
}

impl Session {
    pub fn new(token: SessionToken, user: User) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            token,
        }
    }

    pub fn user(&self) -> User {
        User {
            id: self.user_id.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
        }
    }

    pub fn display_name(&self) -> String { format!("{} {}", self.first_name, self.last_name) }
}

/// Credential as seen at request send time. `epoch` identifies which session it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSnapshot {
    pub token: Option<SessionToken>,
    pub epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { user_id: String, role: Role },
    LoggedOut,
    /// Forced logout after the API rejected the credential.
    Invalidated,
}

type Observer = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

#[derive(Debug, Default)]
struct State {
    session: Option<Session>,
    epoch: u64,
}

/// Process-wide source of truth for who is logged in.
///
/// The durable slots and the in-memory state are only ever written together while
/// holding the state write lock, so no reader can observe one without the other.
/// Observers run after the lock is released and may read the store freely.
pub struct SessionStore {
    storage: Arc<dyn SlotStorage>,
    state: RwLock<State>,
    observers: Mutex<Vec<(SubscriptionId, Observer)>>,
    next_subscription: AtomicU64,
}

impl SessionStore {
    /// Rehydrate from the persisted slots. Anything missing or corrupt degrades to logged out.
    pub fn open(storage: Arc<dyn SlotStorage>) -> Self {
        let session = rehydrate(storage.as_ref());
        match &session {
            Some(s) => info!(target: "ghcs::session", user_id = %s.user_id, role = %s.role, "session restored"),
            None => debug!(target: "ghcs::session", "no persisted session"),
        }
        Self {
            storage,
            state: RwLock::new(State { session, epoch: 0 }),
            observers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    pub fn current(&self) -> Option<Session> { self.state.read().session.clone() }

    pub fn is_authenticated(&self) -> bool { self.state.read().session.is_some() }

    pub fn has_role(&self, roles: &[Role]) -> bool {
        let st = self.state.read();
        has_role(st.session.as_ref(), roles)
    }

    pub fn can(&self, action: Action) -> bool { self.has_role(action.allowed_roles()) }

    /// Refuse a role-gated action: `Unauthorized` when logged out, `Forbidden` for the wrong role.
    pub fn authorize(&self, action: Action) -> ClientResult<()> {
        if !self.is_authenticated() {
            return Err(ClientError::Unauthorized { message: "login required".into() });
        }
        if !self.can(action) {
            debug!(target: "ghcs::session", action = %action, "action refused for role");
            return Err(ClientError::Forbidden { target: action.to_string() });
        }
        Ok(())
    }

    pub fn capabilities(&self) -> Capabilities {
        let st = self.state.read();
        Capabilities::for_session(st.session.as_ref())
    }

    pub fn snapshot(&self) -> CredentialSnapshot {
        let st = self.state.read();
        CredentialSnapshot {
            token: st.session.as_ref().map(|s| s.token.clone()),
            epoch: st.epoch,
        }
    }

    pub fn login<T: Into<SessionToken>>(&self, token: T, user: User) -> ClientResult<()> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ClientError::Validation(FieldErrors::single("token", "must not be empty")));
        }
        let user_json = serde_json::to_string(&user)?;
        let event = SessionEvent::LoggedIn { user_id: user.id.clone(), role: user.role };
        let user_id = user.id.clone();
        {
            let mut st = self.state.write();
            if let Err(e) = self.write_slots(&token, &user_json) {
                warn!(target: "ghcs::session", error = %e, "persisting session failed; rolling back");
                self.restore_slots(&mut st);
                return Err(e.into());
            }
            st.session = Some(Session::new(token, user));
            st.epoch += 1;
            info!(target: "ghcs::session", user_id = %user_id, epoch = st.epoch, "logged in");
        }
        self.notify(&event);
        Ok(())
    }

    /// Idempotent: on a logged-out store the slot removals are no-ops and no event fires.
    ///
    /// If the slots cannot be cleared the session stays in memory and on disk and the
    /// storage error is returned.
    pub fn logout(&self) -> ClientResult<()> {
        let (ended, result) = {
            let mut st = self.state.write();
            let had_session = st.session.is_some();
            let result = self.end_session(&mut st);
            let ended = had_session && st.session.is_none();
            if ended {
                info!(target: "ghcs::session", epoch = st.epoch, "logged out");
            }
            (ended, result)
        };
        if ended {
            self.notify(&SessionEvent::LoggedOut);
        }
        result.map_err(ClientError::from)
    }

    /// Forced logout for a credential rejected by the API.
    ///
    /// Only applies while `epoch` is still current: a rejection for a request sent under an
    /// older session must not clear a session established after it. Returns whether it applied.
    pub fn invalidate(&self, epoch: u64) -> bool {
        {
            let mut st = self.state.write();
            if st.epoch != epoch {
                debug!(target: "ghcs::session", sent_epoch = epoch, current_epoch = st.epoch, "stale rejection ignored");
                return false;
            }
            if let Err(e) = self.end_session(&mut st) {
                warn!(target: "ghcs::session", error = %e, "clearing rejected session failed");
                if st.session.is_some() {
                    return false;
                }
            }
            warn!(target: "ghcs::session", epoch = st.epoch, "session invalidated by server");
        }
        self.notify(&SessionEvent::Invalidated);
        true
    }

    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let id = self.next_subscription.fetch_add(1, Ordering::SeqCst);
        self.observers.lock().push((id, Arc::new(observer)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut obs = self.observers.lock();
        let before = obs.len();
        obs.retain(|(sid, _)| *sid != id);
        obs.len() != before
    }

    fn notify(&self, event: &SessionEvent) {
        let observers: Vec<Observer> = self.observers.lock().iter().map(|(_, o)| o.clone()).collect();
        for o in observers {
            o(event);
        }
    }

    fn write_slots(&self, token: &str, user_json: &str) -> std::io::Result<()> {
        self.storage.set(TOKEN_SLOT, token)?;
        self.storage.set(USER_SLOT, user_json)
    }

    // Ok once the persisted pair reads as logged out. A token slot that cannot be removed is
    // overwritten with the tombstone, which rehydration treats as no session.
    fn clear_slots(&self) -> std::io::Result<()> {
        let token = self.storage.remove(TOKEN_SLOT).or_else(|e| {
            warn!(target: "ghcs::session", error = %e, "removing token slot failed; writing tombstone");
            self.storage.set(TOKEN_SLOT, TOMBSTONE).map_err(|_| e)
        });
        if let Err(e) = self.storage.remove(USER_SLOT) {
            warn!(target: "ghcs::session", error = %e, "removing user slot failed; discarded on next start");
        }
        token
    }

    // Drop the session from both copies. When the slots cannot be cleared and no longer hold
    // the session, it is written back so memory and storage still agree.
    fn end_session(&self, st: &mut State) -> std::io::Result<()> {
        if let Err(e) = self.clear_slots() {
            if !self.persisted_matches(st) {
                self.restore_slots(st);
            }
            return Err(e);
        }
        if st.session.take().is_some() {
            st.epoch += 1;
        }
        Ok(())
    }

    fn persisted_matches(&self, st: &State) -> bool {
        let token = self.storage.get(TOKEN_SLOT).ok().flatten().filter(|t| !t.trim().is_empty());
        let user = self
            .storage
            .get(USER_SLOT)
            .ok()
            .flatten()
            .and_then(|u| serde_json::from_str::<User>(&u).ok());
        match (&st.session, token, user) {
            (Some(s), Some(t), Some(u)) => t == s.token && u == s.user(),
            (None, None, _) | (None, _, None) => true,
            _ => false,
        }
    }

    // Put the slots back in line with `st` after a failed write. If that fails too the
    // store drops to logged out so memory and storage still agree.
    fn restore_slots(&self, st: &mut State) {
        let restored = match &st.session {
            Some(prev) => serde_json::to_string(&prev.user())
                .map_err(std::io::Error::from)
                .and_then(|json| self.write_slots(&prev.token, &json)),
            None => self.clear_slots(),
        };
        if let Err(e) = restored {
            warn!(target: "ghcs::session", error = %e, "restoring persisted session failed; dropping it");
            if let Err(e) = self.clear_slots() {
                warn!(target: "ghcs::session", error = %e, "clearing persisted session failed");
            }
            if st.session.take().is_some() {
                st.epoch += 1;
            }
        }
    }
}

fn rehydrate(storage: &dyn SlotStorage) -> Option<Session> {
    let token = storage.get(TOKEN_SLOT);
    let user = storage.get(USER_SLOT);
    let parsed = match (&token, &user) {
        (Ok(Some(t)), Ok(Some(u))) if !t.trim().is_empty() && u.trim() != "undefined" => {
            match serde_json::from_str::<User>(u) {
                Ok(user) => Some(Session::new(t.clone(), user)),
                Err(e) => {
                    warn!(target: "ghcs::session", error = %e, "persisted user record is malformed");
                    None
                }
            }
        }
        _ => None,
    };
    if parsed.is_none() {
        let stray = matches!(token, Ok(Some(_))) || matches!(user, Ok(Some(_)));
        if let Err(e) = token.as_ref().and(user.as_ref()) {
            warn!(target: "ghcs::session", error = %e, "reading persisted session failed");
        }
        if stray {
            warn!(target: "ghcs::session", "discarding incomplete persisted session");
            for slot in [TOKEN_SLOT, USER_SLOT] {
                if let Err(e) = storage.remove(slot) {
                    warn!(target: "ghcs::session", slot, error = %e, "removing stray slot failed");
                }
            }
        }
    }
    parsed
}
