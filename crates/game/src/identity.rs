//! Sign-up, login and session tokens

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::models::{Account, AuthSession};
use common::{Error, Result};
use rand::RngCore;
use sqlx::PgPool;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 6;
const MAX_USERNAME_LEN: usize = 32;

/// Login state changes, for anything tied to a player's session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Account),
    SignedOut(Uuid),
}

/// Fan-out of [`SessionEvent`]s
#[derive(Debug, Clone)]
pub struct SessionWatch {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionWatch {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: SessionEvent) {
        // no subscribers is fine
        let _ = self.tx.send(event);
    }
}

impl Default for SessionWatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity provider used by the API
#[async_trait]
pub trait Identity: Send + Sync {
    async fn signup(&self, email: &str, password: &str, username: &str) -> Result<AuthSession>;
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession>;
    async fn logout(&self, token: &str) -> Result<()>;
    /// Resolve a bearer token; `None` when unknown or expired
    async fn current(&self, token: &str) -> Result<Option<AuthSession>>;
}

/// Check sign-up fields before touching the database
pub fn validate_signup(email: &str, password: &str, username: &str) -> Result<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => return Err(Error::InvalidInput("invalid email address".to_string())),
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::InvalidInput(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    let username = username.trim();
    if username.len() < 3 || username.len() > MAX_USERNAME_LEN {
        return Err(Error::InvalidInput(format!(
            "username must be 3 to {} characters",
            MAX_USERNAME_LEN
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(Error::InvalidInput(
            "username may only contain letters, digits, '_' and '-'".to_string(),
        ));
    }
    Ok(())
}

/// Random hex string of `bytes` bytes
pub fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Argon2id keyed with the server secret as pepper
fn hasher(secret: &str) -> Result<Argon2<'_>> {
    Argon2::new_with_secret(
        secret.as_bytes(),
        Algorithm::Argon2id,
        Version::V0x13,
        Params::default(),
    )
    .map_err(|e| Error::Config(format!("unusable auth secret: {}", e)))
}

/// Hash a password with a fresh random salt. Returns a PHC string.
pub fn hash_password(secret: &str, password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    hasher(secret)?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal(format!("password hashing failed: {}", e)))
}

/// Check a password against a stored PHC string
pub fn verify_password(secret: &str, password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    let Ok(argon) = hasher(secret) else {
        return false;
    };
    argon.verify_password(password.as_bytes(), &parsed).is_ok()
}

/// Accounts and sessions stored in Postgres
pub struct PgIdentity {
    pool: PgPool,
    secret: String,
    session_ttl: Duration,
    watch: SessionWatch,
}

impl PgIdentity {
    pub fn new(pool: PgPool, secret: String, session_ttl_hours: i64, watch: SessionWatch) -> Self {
        Self {
            pool,
            secret,
            session_ttl: Duration::hours(session_ttl_hours.max(1)),
            watch,
        }
    }

    async fn open_session(&self, account: Account) -> Result<AuthSession> {
        let token = random_hex(32);
        let expires_at = Utc::now() + self.session_ttl;
        let session = db::sessions::create(&self.pool, &token, &account, expires_at)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        db::profiles::touch_login(&self.pool, account.id)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;
        if let Err(e) = db::sessions::purge_expired(&self.pool, account.id).await {
            warn!("Failed to purge expired sessions for {}: {}", account.username, e);
        }

        self.watch.publish(SessionEvent::SignedIn(account));
        Ok(session)
    }
}

#[async_trait]
impl Identity for PgIdentity {
    async fn signup(&self, email: &str, password: &str, username: &str) -> Result<AuthSession> {
        validate_signup(email, password, username)?;
        let email = email.trim();
        let username = username.trim();

        let taken = db::accounts::exists(&self.pool, email, username)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;
        if taken {
            return Err(Error::Conflict(
                "email or username already registered".to_string(),
            ));
        }

        let hash = hash_password(&self.secret, password)?;
        let account = db::accounts::create(&self.pool, email, username, None, &hash)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Error::Conflict(
                    "email or username already registered".to_string(),
                ),
                other => Error::Database(other.to_string()),
            })?;

        info!("🆕 New operative registered: {}", account.username);
        self.open_session(account).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let credentials = db::accounts::get_credentials(&self.pool, email.trim())
            .await
            .map_err(|e| Error::Database(e.to_string()))?
            .ok_or(Error::InvalidCredentials)?;

        if !verify_password(&self.secret, password, &credentials.password_hash) {
            debug!("Rejected login for {}", credentials.account.username);
            return Err(Error::InvalidCredentials);
        }

        info!("🔑 {} logged in", credentials.account.username);
        self.open_session(credentials.account).await
    }

    async fn logout(&self, token: &str) -> Result<()> {
        let session = self.current(token).await?.ok_or(Error::AuthRequired)?;
        db::sessions::delete(&self.pool, token)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        info!("{} logged out", session.account.username);
        self.watch.publish(SessionEvent::SignedOut(session.account.id));
        Ok(())
    }

    async fn current(&self, token: &str) -> Result<Option<AuthSession>> {
        db::sessions::get_active(&self.pool, token)
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }
}
