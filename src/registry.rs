use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::events::OutboundEvent;

/// Outbound half of one live websocket session. Events sent here are picked up
/// by the session's forwarding task and written to the socket.
#[derive(Clone)]
pub struct SessionHandle {
    session_id: Uuid,
    tx: mpsc::UnboundedSender<OutboundEvent>,
}

impl SessionHandle {
    pub fn new(tx: mpsc::UnboundedSender<OutboundEvent>) -> Self {
        Self {
            session_id: Uuid::now_v7(),
            tx,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Best-effort: a session whose receiver is already gone drops the event.
    pub fn send(&self, event: OutboundEvent) {
        let _ = self.tx.send(event);
    }
}

/// Process-wide map of user identity to their live session. In-memory only;
/// everyone appears disconnected after a restart until they reconnect.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A previous session for the same user is silently replaced, so a
    /// reconnect never needs an explicit logout first.
    pub async fn register(&self, user_id: Uuid, handle: SessionHandle) {
        let session_id = handle.session_id();
        if let Some(old) = self.inner.write().await.insert(user_id, handle) {
            tracing::debug!(%user_id, old = %old.session_id(), new = %session_id, "session replaced");
        }
    }

    /// Idempotent; removing an absent user is a no-op.
    pub async fn unregister(&self, user_id: Uuid) {
        self.inner.write().await.remove(&user_id);
    }

    /// Removes the user only while they are still bound to this session.
    /// A stale socket tearing down after a reconnect must not evict the
    /// newer session.
    pub async fn unregister_if(&self, user_id: Uuid, session_id: Uuid) {
        let mut inner = self.inner.write().await;
        if inner
            .get(&user_id)
            .is_some_and(|handle| handle.session_id() == session_id)
        {
            inner.remove(&user_id);
        }
    }

    /// Absence means "not currently reachable", never an error.
    pub async fn resolve(&self, user_id: Uuid) -> Option<SessionHandle> {
        self.inner.read().await.get(&user_id).cloned()
    }

    pub async fn push(&self, user_id: Uuid, event: OutboundEvent) {
        if let Some(handle) = self.resolve(user_id).await {
            handle.send(event);
        }
    }
}
