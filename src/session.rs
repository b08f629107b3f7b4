use std::{collections::HashMap, time::Duration};

use base64::{engine::general_purpose, Engine};
use ring::rand::{SecureRandom, SystemRandom};
use tokio::{sync::RwLock, time::Instant};

use crate::error::AppError;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy)]
struct Session {
    user_id: i64,
    created_at: Instant,
}

/// Server-side sessions: opaque token -> user id.
///
/// A session is valid for `max_age` after login. Expired entries are dropped
/// when looked up and swept on every new login, so the map only holds live
/// sessions plus whatever expired since the last login.
pub struct SessionStore {
    rng: SystemRandom,
    max_age: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(max_age: Duration) -> Self {
        Self {
            rng: SystemRandom::new(),
            max_age,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn is_live(&self, session: &Session) -> bool {
        session.created_at.elapsed() < self.max_age
    }

    /// Starts a session for `user_id` and returns its token.
    pub async fn create(&self, user_id: i64) -> Result<String, AppError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal("system randomness unavailable".into()))?;
        let token = general_purpose::URL_SAFE_NO_PAD.encode(bytes);

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, session| self.is_live(session));
        sessions.insert(
            token.clone(),
            Session {
                user_id,
                created_at: Instant::now(),
            },
        );
        Ok(token)
    }

    pub async fn resolve(&self, token: &str) -> Option<i64> {
        let session = self.sessions.read().await.get(token).copied()?;
        if self.is_live(&session) {
            return Some(session.user_id);
        }
        self.sessions.write().await.remove(token);
        None
    }

    /// Ends the session. Returns false if the token was not active.
    pub async fn revoke(&self, token: &str) -> bool {
        match self.sessions.write().await.remove(token) {
            Some(session) => self.is_live(&session),
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
