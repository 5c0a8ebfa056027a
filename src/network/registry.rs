//! Session Registry
//!
//! Mints sessions and routes requests to them. Each session sits behind its
//! own mutex so requests to one session run one at a time from validation
//! through notification delivery; different sessions never contend.
//!
//! Notifications go to per-player bounded mailboxes with `try_send`. A full,
//! closed, or missing mailbox drops the message; the session state stays as
//! the handler left it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::config::ArenaConfig;
use crate::core::hash::{StateHash, StateHasher};
use crate::game::error::RejectReason;
use crate::game::events::{GameEvent, Outbox};
use crate::game::state::{GamePhase, GameSession, PlayerId, SessionId, SessionSnapshot};
use crate::network::auth::{resolve_identity, AuthError};
use crate::network::protocol::{ClientMessage, ErrorCode, ServerError, ServerMessage};

/// Deterministic handle derived from (session id, creator).
pub type SessionAddress = [u8; 32];

/// Derive a session's address.
pub fn derive_session_address(id: SessionId, creator: &PlayerId) -> SessionAddress {
    let mut hasher = StateHasher::for_session_address();
    hasher.update_u32(id);
    hasher.update_id(creator.as_bytes());
    hasher.finalize()
}

// =============================================================================
// ID COUNTER
// =============================================================================

/// Sequential session id source.
///
/// Ids start at 1 and are never reused. The counter is wider than
/// `SessionId` so exhaustion is reported instead of wrapping.
#[derive(Debug)]
pub struct SessionCounter {
    next: AtomicU64,
}

impl SessionCounter {
    /// Counter whose first id is 1.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Counter whose first id is `first`.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Id the next allocation will return.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }

    /// Atomically take the next id.
    pub fn allocate(&self) -> Result<SessionId, RegistryError> {
        let id = self.next.fetch_add(1, Ordering::SeqCst);
        SessionId::try_from(id).map_err(|_| RegistryError::IdsExhausted)
    }
}

impl Default for SessionCounter {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No session with this id.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// Every 32-bit id has been handed out.
    #[error("session id space exhausted")]
    IdsExhausted,

    /// The session refused the request.
    #[error("request rejected: {0}")]
    Rejected(#[from] RejectReason),

    /// The sender's identity could not be resolved.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
}

impl RegistryError {
    /// Wire error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            RegistryError::SessionNotFound(_) => ErrorCode::SessionNotFound,
            RegistryError::IdsExhausted => ErrorCode::InternalError,
            RegistryError::Rejected(reason) => ErrorCode::from(*reason),
            RegistryError::Auth(_) => ErrorCode::NotAuthenticated,
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// A registered session.
#[derive(Debug)]
struct SessionSlot {
    address: SessionAddress,
    session: Mutex<GameSession>,
}

/// Result of an accepted request.
#[derive(Debug, Clone)]
pub struct Dispatched {
    /// Phase after the request.
    pub phase: GamePhase,
    /// Notifications emitted, in order.
    pub events: Vec<GameEvent>,
    /// How many of them could not be delivered.
    pub dropped: usize,
}

/// Owns every session and every player mailbox.
pub struct SessionRegistry {
    /// Id allocation.
    counter: SessionCounter,
    /// Sessions by id.
    sessions: RwLock<BTreeMap<SessionId, Arc<SessionSlot>>>,
    /// Notification channels by player.
    mailboxes: RwLock<BTreeMap<PlayerId, mpsc::Sender<ServerMessage>>>,
    /// Settings.
    config: ArenaConfig,
}

impl SessionRegistry {
    /// Create a registry with default settings.
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::default())
    }

    /// Create a registry with the given settings.
    pub fn with_config(config: ArenaConfig) -> Self {
        Self::with_counter(SessionCounter::new(), config)
    }

    /// Create a registry around an existing id counter.
    ///
    /// A mailbox capacity of 0 is raised to 1.
    pub fn with_counter(counter: SessionCounter, mut config: ArenaConfig) -> Self {
        config.mailbox_capacity = config.mailbox_capacity.max(1);
        Self {
            counter,
            sessions: RwLock::new(BTreeMap::new()),
            mailboxes: RwLock::new(BTreeMap::new()),
            config,
        }
    }

    /// Create a session with `creator` as X.
    #[instrument(skip(self), fields(creator = %creator.short()))]
    pub async fn create_session(&self, creator: PlayerId) -> Result<SessionId, RegistryError> {
        let id = self.counter.allocate()?;
        let slot = SessionSlot {
            address: derive_session_address(id, &creator),
            session: Mutex::new(GameSession::new(id, creator)),
        };

        self.sessions.write().await.insert(id, Arc::new(slot));

        info!(session_id = id, "Session created");
        Ok(id)
    }

    /// Open (or replace) a player's mailbox and return its receiving end.
    pub async fn register_mailbox(&self, player: PlayerId) -> mpsc::Receiver<ServerMessage> {
        let (tx, rx) = mpsc::channel(self.config.mailbox_capacity);
        self.mailboxes.write().await.insert(player, tx);
        debug!(player = %player.short(), "Mailbox registered");
        rx
    }

    /// Close a player's mailbox.
    pub async fn unregister_mailbox(&self, player: &PlayerId) {
        self.mailboxes.write().await.remove(player);
    }

    /// Route a request from an already-identified sender.
    ///
    /// On rejection an `Error` message is also sent to the sender's mailbox.
    #[instrument(skip(self, msg), fields(sender = %sender.short(), session_id = msg.session_id()))]
    pub async fn dispatch(
        &self,
        sender: PlayerId,
        msg: ClientMessage,
    ) -> Result<Dispatched, RegistryError> {
        let session_id = msg.session_id();
        let slot = match self.get_slot(session_id).await {
            Some(slot) => slot,
            None => {
                let err = RegistryError::SessionNotFound(session_id);
                self.notify_error(&sender, &err).await;
                return Err(err);
            }
        };

        let mut session = slot.session.lock().await;
        let mut outbox = Outbox::new();

        let result = session.apply(sender, msg.to_action(), &mut outbox);

        match result {
            Ok(phase) => {
                let events = outbox.drain();
                let dropped = self.deliver(&events).await;
                Ok(Dispatched { phase, events, dropped })
            }
            Err(reason) => {
                drop(session);
                let err = RegistryError::Rejected(reason);
                self.notify_error(&sender, &err).await;
                Err(err)
            }
        }
    }

    /// Resolve the sender from a JWT, then dispatch.
    pub async fn dispatch_with_token(
        &self,
        token: &str,
        msg: ClientMessage,
    ) -> Result<Dispatched, RegistryError> {
        let sender = resolve_identity(token, &self.config.auth).map_err(|e| {
            warn!(error = %e, "Token rejected");
            RegistryError::Auth(e)
        })?;
        self.dispatch(sender, msg).await
    }

    /// Current state of a session.
    pub async fn snapshot(&self, id: SessionId) -> Option<SessionSnapshot> {
        let slot = self.get_slot(id).await?;
        let session = slot.session.lock().await;
        Some(session.snapshot())
    }

    /// State hash of a session.
    pub async fn state_hash(&self, id: SessionId) -> Option<StateHash> {
        let slot = self.get_slot(id).await?;
        let session = slot.session.lock().await;
        Some(session.compute_hash())
    }

    /// Board grid of a session, for logs.
    pub async fn render(&self, id: SessionId) -> Option<String> {
        let slot = self.get_slot(id).await?;
        let session = slot.session.lock().await;
        Some(session.to_string())
    }

    /// Address derived at creation.
    pub async fn session_address(&self, id: SessionId) -> Option<SessionAddress> {
        self.get_slot(id).await.map(|slot| slot.address)
    }

    /// Number of sessions created and still held.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Id the next `create_session` will assign.
    pub fn next_id(&self) -> u64 {
        self.counter.peek()
    }

    async fn get_slot(&self, id: SessionId) -> Option<Arc<SessionSlot>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Push events to mailboxes. Returns how many were dropped.
    async fn deliver(&self, events: &[GameEvent]) -> usize {
        let mailboxes = self.mailboxes.read().await;
        let mut dropped = 0;

        for event in events {
            let delivered = match mailboxes.get(&event.recipient) {
                Some(tx) => tx.try_send(ServerMessage::from(event)).is_ok(),
                None => false,
            };
            if !delivered {
                debug!(
                    recipient = %event.recipient.short(),
                    session_id = event.session_id,
                    "Notification dropped"
                );
                dropped += 1;
            }
        }

        dropped
    }

    async fn notify_error(&self, recipient: &PlayerId, err: &RegistryError) {
        let msg = ServerMessage::Error(ServerError {
            code: err.code(),
            message: err.to_string(),
        });
        let delivered = match self.mailboxes.read().await.get(recipient) {
            Some(tx) => tx.try_send(msg).is_ok(),
            None => false,
        };
        if !delivered {
            debug!(recipient = %recipient.short(), error = %err, "Error notification dropped");
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
