use serde::Serialize;

// Row of the `user` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

// Row of the `todo` table; the owner never leaves the server
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub completed: bool,
    #[serde(skip_serializing)]
    pub user_id: i64,
}

/// The authenticated caller, resolved once per request by the auth guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// Token of the session that authenticated the current request.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);
