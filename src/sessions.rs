use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::confetti::{ConfettiController, ConfettiView};
use crate::errors::{AppError, Result};
use crate::models::WishState;

/// One open page: the wish being edited plus its confetti and generation status.
pub struct WishSession {
    pub id: Uuid,
    pub wish: WishState,
    pub confetti: ConfettiController,
    pub generating: bool,
    pub created_at: DateTime<Utc>,
    last_accessed: Instant,
}

impl WishSession {
    fn new(wish: WishState) -> Self {
        Self {
            id: Uuid::new_v4(),
            wish,
            confetti: ConfettiController::new(),
            generating: false,
            created_at: Utc::now(),
            last_accessed: Instant::now(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            wish: self.wish.clone(),
            confetti: self.confetti.view(),
            generating: self.generating,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub wish: WishState,
    pub confetti: ConfettiView,
    pub generating: bool,
    pub created_at: DateTime<Utc>,
}

/// In-memory session table with idle expiry and LRU eviction.
///
/// Each entry is only ever touched under its shard lock, so a session is
/// never mutated from two requests at once. Removing an entry drops its
/// confetti controller, which cancels any pending auto-clear.
pub struct SessionStore {
    sessions: DashMap<Uuid, WishSession>,
    ttl: Duration,
    max_entries: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
            max_entries,
        }
    }

    pub fn create(&self, wish: WishState) -> SessionSnapshot {
        if self.sessions.len() >= self.max_entries {
            self.evict_lru_entries();
        }

        let session = WishSession::new(wish);
        let snapshot = session.snapshot();
        self.sessions.insert(session.id, session);
        snapshot
    }

    /// Run `f` against a live session, refreshing its idle timer.
    /// Returns `None` when the session is unknown or has expired.
    pub fn with_session<R>(&self, id: &Uuid, f: impl FnOnce(&mut WishSession) -> R) -> Option<R> {
        let mut entry = self.sessions.get_mut(id)?;

        let now = Instant::now();
        if now.duration_since(entry.last_accessed) >= self.ttl {
            // Remove expired entry
            drop(entry);
            self.sessions.remove(id);
            return None;
        }

        entry.last_accessed = now;
        Some(f(&mut entry))
    }

    pub fn snapshot(&self, id: &Uuid) -> Option<SessionSnapshot> {
        self.with_session(id, |session| session.snapshot())
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Claim the session's single generation slot.
    ///
    /// Fails with `Conflict` while another generation for the same session
    /// is still running. The slot is released when the ticket is finished
    /// or dropped, including when the request future is cancelled.
    pub fn begin_generation(&self, id: &Uuid) -> Result<GenerationTicket<'_>> {
        let recipient = self
            .with_session(id, |session| {
                if session.generating {
                    None
                } else {
                    session.generating = true;
                    Some(session.wish.recipient_or_default().to_string())
                }
            })
            .ok_or_else(|| session_not_found(id))?
            .ok_or_else(|| AppError::Conflict("A message is already being generated".to_string()))?;

        Ok(GenerationTicket {
            store: self,
            id: *id,
            recipient,
            released: false,
        })
    }

    /// Evict least recently used entries to free up space.
    /// Removes 20% of entries, and always at least one.
    fn evict_lru_entries(&self) {
        let current_size = self.sessions.len();
        let target_remove = (current_size / 5).max(1);

        let mut entries: Vec<(Uuid, Instant)> = self
            .sessions
            .iter()
            .map(|entry| (*entry.key(), entry.value().last_accessed))
            .collect();

        // Sort by last accessed (oldest first)
        entries.sort_by_key(|(_, last_accessed)| *last_accessed);

        for (id, _) in entries.iter().take(target_remove) {
            self.sessions.remove(id);
        }

        tracing::info!(
            "🗑️  Session eviction: removed {} LRU sessions (table size: {} -> {})",
            target_remove,
            current_size,
            self.sessions.len()
        );
    }

    /// Drop every session idle for longer than the TTL.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let ttl = self.ttl;

        let before_count = self.sessions.len();
        self.sessions
            .retain(|_, session| now.duration_since(session.last_accessed) < ttl);
        let removed = before_count.saturating_sub(self.sessions.len());

        if removed > 0 {
            tracing::info!("🧹 Cleaned up {} expired sessions", removed);
        }
        removed
    }
}

/// Exclusive right to run one text generation for a session.
pub struct GenerationTicket<'a> {
    store: &'a SessionStore,
    id: Uuid,
    pub recipient: String,
    released: bool,
}

impl GenerationTicket<'_> {
    /// Store the generated message, celebrate, and release the slot.
    pub fn finish(mut self, message: String) -> Option<SessionSnapshot> {
        self.released = true;
        self.store.with_session(&self.id, |session| {
            session.wish.message = message;
            session.generating = false;
            session.confetti.activate();
            session.snapshot()
        })
    }
}

impl Drop for GenerationTicket<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.store
                .with_session(&self.id, |session| session.generating = false);
        }
    }
}

pub fn session_not_found(id: &Uuid) -> AppError {
    AppError::NotFound(format!("Session {} not found or expired", id))
}
