//! A small multi-user todo service: users register, log in with a cookie
//! session, and manage their own private list of todo items.

use std::time::Duration;

use sqlx::{Pool, Sqlite};

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod route;
pub mod schema;
pub mod session;
pub mod todo;

use session::SessionStore;

// Struct representing the application state
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(db: Pool<Sqlite>, session_max_age: Duration) -> Self {
        Self {
            db,
            sessions: SessionStore::new(session_max_age),
        }
    }
}
