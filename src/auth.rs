use argon2::{
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use sqlx::{query_as, Pool, Sqlite};
use tracing::{info, instrument, warn};

use crate::{error::AppError, model::User};

/// Produces an Argon2id PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

// Verified against when the username is unknown, so both login failures cost
// one Argon2 run.
static DUMMY_HASH: Lazy<String> = Lazy::new(|| {
    hash_password("no user has this password").unwrap_or_default()
});

/// Checks `password` against a stored PHC string. A malformed hash never matches.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!(error = %e, "stored password hash is malformed");
            false
        }
    }
}

// Argon2 is deliberately slow, keep it off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {e}")))
}

pub async fn find_user_by_username(
    db: &Pool<Sqlite>,
    username: &str,
) -> Result<Option<User>, AppError> {
    let user = query_as::<_, User>("SELECT id, username, password_hash FROM user WHERE username = ?")
        .bind(username)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn find_user_by_id(db: &Pool<Sqlite>, id: i64) -> Result<Option<User>, AppError> {
    let user = query_as::<_, User>("SELECT id, username, password_hash FROM user WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

/// Creates a user unless the username (exact, case-sensitive) is already taken.
#[instrument(skip(db, password))]
pub async fn register(db: &Pool<Sqlite>, username: &str, password: &str) -> Result<User, AppError> {
    if username.is_empty() {
        return Err(AppError::Validation("Username must not be empty".into()));
    }
    if password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    if find_user_by_username(db, username).await?.is_some() {
        return Err(AppError::DuplicateUsername);
    }

    let password = password.to_owned();
    let password_hash = blocking(move || hash_password(&password)).await??;

    let user = query_as::<_, User>(
        "INSERT INTO user (username, password_hash) VALUES (?, ?) RETURNING id, username, password_hash",
    )
    .bind(username)
    .bind(password_hash)
    .fetch_one(db)
    .await
    .map_err(|e| match e {
        // lost a race against a concurrent registration of the same name
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::DuplicateUsername
        }
        other => AppError::Database(other),
    })?;

    info!(user_id = user.id, "user registered");
    Ok(user)
}

/// Verifies credentials. Unknown user and wrong password fail identically.
#[instrument(skip(db, password))]
pub async fn login(db: &Pool<Sqlite>, username: &str, password: &str) -> Result<User, AppError> {
    let Some(user) = find_user_by_username(db, username).await? else {
        let password = password.to_owned();
        blocking(move || verify_password(&password, &DUMMY_HASH)).await?;
        return Err(AppError::InvalidCredentials);
    };

    let password = password.to_owned();
    let password_hash = user.password_hash.clone();
    if !blocking(move || verify_password(&password, &password_hash)).await? {
        return Err(AppError::InvalidCredentials);
    }

    info!(user_id = user.id, "user logged in");
    Ok(user)
}
