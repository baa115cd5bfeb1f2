//! User accounts and credential verification.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

/// A registered user.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User data as exposed over the API (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// User service backed by the database.
#[derive(Debug, Clone)]
pub struct UserService {
    pool: SqlitePool,
}

impl UserService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a new user with a bcrypt-hashed password.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<User> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            bail!("invalid email address");
        }
        if password.len() < 8 {
            bail!("invalid password: must be at least 8 characters");
        }
        let name = name.trim();
        if name.is_empty() || name.len() > 100 {
            bail!("invalid name: must be 1-100 characters");
        }

        let existing = self.find_by_email(&email).await?;
        if existing.is_some() {
            bail!("email '{email}' is already registered");
        }

        let password_hash =
            bcrypt::hash(password, bcrypt::DEFAULT_COST).context("hashing password")?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email,
            name: name.to_string(),
            password_hash,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, password_hash, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .context("inserting user")?;

        Ok(user)
    }

    /// Verify email/password credentials and return the matching user.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<User> {
        let email = email.trim().to_lowercase();
        let user = self
            .find_by_email(&email)
            .await?
            .filter(|u| u.is_active)
            .context("authentication failed")?;

        let valid =
            bcrypt::verify(password, &user.password_hash).context("verifying password")?;
        if !valid {
            bail!("authentication failed");
        }

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, is_active, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("fetching user by email")?;

        Ok(user)
    }

    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, is_active, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("fetching user by id")?;

        Ok(user)
    }
}
