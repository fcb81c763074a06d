use crate::chat::Transcript;
use axum::http::{HeaderMap, HeaderValue, header};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "mindhaven_session";

pub type SharedTranscript = Arc<Mutex<Transcript>>;

#[derive(Clone, Default)]
struct Slot {
    transcript: SharedTranscript,
    // Held for a whole relayed turn so a session's turns never interleave.
    turn: Arc<Mutex<()>>,
}

/// In-memory chat transcripts keyed by the session cookie. Lost on restart.
///
/// Entries are only created when a chat turn is relayed; reading never
/// allocates a session.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, Slot>>>,
}

pub struct Session {
    pub id: Uuid,
    pub transcript: SharedTranscript,
    pub is_new: bool,
    turn: Arc<Mutex<()>>,
}

impl Session {
    /// `Set-Cookie` value for a session the client does not know about yet.
    pub fn set_cookie(&self) -> Option<HeaderValue> {
        if !self.is_new {
            return None;
        }
        HeaderValue::from_str(&format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            self.id
        ))
        .ok()
    }

    /// Waits for any turn already in flight in this session to finish.
    pub async fn begin_turn(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.turn).lock_owned().await
    }
}

impl SessionRegistry {
    /// The transcript for the caller's cookie, if that session exists.
    pub async fn find(&self, headers: &HeaderMap) -> Option<SharedTranscript> {
        let id = session_id(headers)?;
        let sessions = self.sessions.lock().await;
        sessions.get(&id).map(|slot| Arc::clone(&slot.transcript))
    }

    /// The caller's session, created when the cookie is missing or unknown.
    pub async fn resolve(&self, headers: &HeaderMap) -> Session {
        let mut sessions = self.sessions.lock().await;
        if let Some(id) = session_id(headers) {
            if let Some(slot) = sessions.get(&id) {
                return Session {
                    id,
                    transcript: Arc::clone(&slot.transcript),
                    is_new: false,
                    turn: Arc::clone(&slot.turn),
                };
            }
        }

        let id = Uuid::new_v4();
        let slot = Slot::default();
        sessions.insert(id, slot.clone());
        Session {
            id,
            transcript: slot.transcript,
            is_new: true,
            turn: slot.turn,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}
