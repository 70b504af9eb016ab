//! Session management
//!
//! Live WebSocket streaming conversations. The registry is a concurrency-safe
//! map keyed by session id; removal is total (a duplicate remove is a no-op)
//! and a periodic sweep reaps sessions idle past the open-connection timeout.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::Message;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use murmur_audio::AudioRing;

/// One streaming conversation.
pub struct Session {
    /// Stable identity
    pub id: Uuid,

    /// Sliding-window sample ring, mutated only by the surface task
    /// delivering this session's frames
    pub ring: Mutex<AudioRing>,

    /// Last activity
    last_activity: RwLock<Instant>,

    /// Is active
    active: RwLock<bool>,

    /// Send handle into the surface's writer task
    outbound: mpsc::UnboundedSender<Message>,
}

impl Session {
    fn new(outbound: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ring: Mutex::new(AudioRing::new()),
            last_activity: RwLock::new(Instant::now()),
            active: RwLock::new(true),
            outbound,
        }
    }

    /// Update last activity
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    /// Check if the session has been idle past `timeout`
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout
    }

    pub fn is_active(&self) -> bool {
        *self.active.read()
    }

    /// Queue a text frame to the peer. Errors (peer gone) are ignored; the
    /// surface task notices the closed socket and deregisters.
    pub fn send_text(&self, body: String) {
        let _ = self.outbound.send(Message::Text(body));
    }

    /// Mark the session closed and queue a close frame. The writer task
    /// stops after flushing it, so no lock is ever held across the write.
    pub fn close(&self) {
        *self.active.write() = false;
        let _ = self.outbound.send(Message::Close(None));
    }
}

/// Concurrency-safe set of live sessions.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
    max_sessions: usize,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize, idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            idle_timeout,
        }
    }

    /// Register a new session on a successful handshake. Fails when the
    /// server is at its connection bound.
    pub fn insert(&self, outbound: mpsc::UnboundedSender<Message>) -> Option<Arc<Session>> {
        let mut sessions = self.sessions.write();
        if sessions.len() >= self.max_sessions {
            return None;
        }
        let session = Arc::new(Session::new(outbound));
        sessions.insert(session.id, session.clone());
        tracing::info!(session = %session.id, live = sessions.len(), "session registered");
        Some(session)
    }

    /// Remove by identity; a no-op if the session is already gone.
    pub fn remove(&self, id: Uuid) {
        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.remove(&id) {
            session.close();
            tracing::info!(session = %id, live = sessions.len(), "session removed");
        }
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether a new handshake can be admitted right now.
    pub fn has_capacity(&self) -> bool {
        self.sessions.read().len() < self.max_sessions
    }

    /// Close and remove every session idle past the timeout.
    pub fn reap_idle(&self) -> usize {
        let mut sessions = self.sessions.write();
        let expired: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, s)| s.is_expired(self.idle_timeout))
            .map(|(id, _)| *id)
            .collect();

        for id in &expired {
            if let Some(session) = sessions.remove(id) {
                session.close();
                tracing::info!(session = %id, "reaped idle session");
            }
        }
        expired.len()
    }

    /// Start the periodic idle sweep. Returns a shutdown sender that stops
    /// the task.
    pub fn start_reaper(self: &Arc<Self>, interval: Duration) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let registry = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let reaped = registry.reap_idle();
                        if reaped > 0 {
                            tracing::info!(reaped, remaining = registry.count(), "idle sweep");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("session reaper shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(max: usize) -> SessionRegistry {
        SessionRegistry::new(max, Duration::from_secs(60))
    }

    #[test]
    fn test_insert_and_remove() {
        let reg = registry(10);
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = reg.insert(tx).unwrap();
        assert!(session.is_active());
        assert_eq!(reg.count(), 1);

        reg.remove(session.id);
        assert_eq!(reg.count(), 0);
        assert!(!session.is_active());
    }

    #[test]
    fn test_duplicate_remove_is_noop() {
        let reg = registry(10);
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = reg.insert(tx).unwrap();
        reg.remove(session.id);
        reg.remove(session.id);
        assert_eq!(reg.count(), 0);
    }

    #[test]
    fn test_capacity_bound() {
        let reg = registry(2);
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(reg.insert(tx.clone()).is_some());
        assert!(reg.insert(tx.clone()).is_some());
        assert!(reg.insert(tx).is_none());
        assert_eq!(reg.count(), 2);
    }

    #[test]
    fn test_reap_idle_closes_expired() {
        let reg = SessionRegistry::new(10, Duration::from_millis(0));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = reg.insert(tx).unwrap();

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(reg.reap_idle(), 1);
        assert_eq!(reg.count(), 0);
        assert!(!session.is_active());
        // a close frame was queued for the writer task
        assert!(matches!(rx.try_recv(), Ok(Message::Close(_))));
    }

    #[test]
    fn test_touch_defers_reaping() {
        let reg = SessionRegistry::new(10, Duration::from_secs(60));
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = reg.insert(tx).unwrap();
        session.touch();
        assert_eq!(reg.reap_idle(), 0);
        assert_eq!(reg.count(), 1);
    }
}
