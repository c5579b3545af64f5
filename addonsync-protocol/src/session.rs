//! Per-session handle passed to packet handlers.

use crate::packets::Packet;
use addonsync_types::{RuntimeId, SessionId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What the host exposes about one connected session.
pub trait SessionLink: Send + Sync {
    fn session_id(&self) -> SessionId;

    /// Runtime id of the session's player once it has spawned.
    fn player_runtime_id(&self) -> Option<RuntimeId>;

    /// Queues a packet for this session. The host must dispatch it later
    /// through the pipeline, never inline from inside a handler: the
    /// session's dispatch lock is held while handlers run.
    fn send_packet(&self, packet: Packet);
}

/// A session as seen by the pipeline: the host link plus the lock that
/// serializes dispatch for this session.
pub struct SessionContext {
    link: Arc<dyn SessionLink>,
    dispatch: Mutex<()>,
}

impl SessionContext {
    pub fn new(link: Arc<dyn SessionLink>) -> Self {
        Self {
            link,
            dispatch: Mutex::new(()),
        }
    }

    pub fn id(&self) -> SessionId {
        self.link.session_id()
    }

    pub fn player(&self) -> Option<RuntimeId> {
        self.link.player_runtime_id()
    }

    pub fn send(&self, packet: Packet) {
        self.link.send_packet(packet);
    }

    /// Holds the session's dispatch slot. A handler that panicked while
    /// holding it does not wedge the session.
    pub(crate) fn serialize(&self) -> MutexGuard<'_, ()> {
        self.dispatch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("id", &self.id())
            .field("player", &self.player())
            .finish()
    }
}
