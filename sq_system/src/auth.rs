//! Accounts, password hashing and session tokens.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use eyre::Context;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use schemars::JsonSchema;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use sq_db::entity::{sea_orm_active_enums::UserRole, users};
use sq_db::DbId;
use crate::config::AuthConfig;
use crate::data::{PublicUser, Role};
use crate::db::StoryDb;
use crate::error::{Result, SystemError};
use crate::validate;

/// Claims embedded in every session token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub id: DbId,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Fields left as `None` are not changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A user alongside a freshly issued token.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: PublicUser,
    pub token: String,
}

pub struct AuthService {
    db: StoryDb,
    lifetime: chrono::Duration,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl AuthService {
    pub fn new(db: StoryDb, config: &AuthConfig) -> Self {
        Self {
            db,
            lifetime: chrono::Duration::hours(config.token_lifetime_hours.into()),
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    #[tracing::instrument(skip_all, fields(username = %registration.username))]
    pub async fn register(&self, registration: Registration) -> Result<AuthResponse> {
        let username = registration.username.trim().to_string();
        let email = registration.email.trim().to_lowercase();
        validate::length("Username", &username, 3, 50)?;
        validate::email(&email)?;
        validate::password(&registration.password)?;

        let taken = users::Entity::find()
            .filter(
                Condition::any()
                    .add(users::Column::Email.eq(&email))
                    .add(users::Column::Username.eq(&username)),
            )
            .one(self.db.reader())
            .await?;
        if taken.is_some() {
            return Err(SystemError::UserExists);
        }

        let password_hash = hash_password(registration.password).await?;
        let now = Utc::now();
        let user = users::ActiveModel {
            username: Set(username),
            email: Set(email),
            password_hash: Set(password_hash),
            role: Set(UserRole::Player),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.writer())
        .await
        .map_err(|e| SystemError::from_unique_violation(e, || SystemError::UserExists))?;

        tracing::info!(user = user.id, "Registered new user");

        self.respond_with_token(user)
    }

    #[tracing::instrument(skip_all)]
    pub async fn login(&self, credentials: Credentials) -> Result<AuthResponse> {
        let email = credentials.email.trim().to_lowercase();
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(self.db.reader())
            .await?
            .ok_or(SystemError::InvalidCredentials)?;

        if !verify_password(credentials.password, user.password_hash.clone()).await? {
            return Err(SystemError::InvalidCredentials);
        }

        self.respond_with_token(user)
    }

    #[tracing::instrument(skip(self))]
    pub async fn profile(&self, user_id: DbId) -> Result<PublicUser> {
        users::Entity::find_by_id(user_id)
            .one(self.db.reader())
            .await?
            .map(PublicUser::from)
            .ok_or_else(|| SystemError::not_found("User not found"))
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update_profile(&self, user_id: DbId, update: ProfileUpdate) -> Result<PublicUser> {
        let user = users::Entity::find_by_id(user_id)
            .one(self.db.reader())
            .await?
            .ok_or_else(|| SystemError::not_found("User not found"))?;
        let mut active: users::ActiveModel = user.into();

        let username = update.username.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
        let email = update.email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty());

        if let Some(username) = username {
            validate::length("Username", &username, 3, 50)?;
            self.ensure_unused(user_id, users::Column::Username, &username).await?;
            active.username = Set(username);
        }
        if let Some(email) = email {
            validate::email(&email)?;
            self.ensure_unused(user_id, users::Column::Email, &email).await?;
            active.email = Set(email);
        }
        if let Some(password) = update.password.filter(|p| !p.is_empty()) {
            validate::password(&password)?;
            active.password_hash = Set(hash_password(password).await?);
        }
        active.updated_at = Set(Utc::now());

        let user = active
            .update(self.db.writer())
            .await
            .map_err(|e| SystemError::from_unique_violation(e, || SystemError::UserExists))?;

        Ok(user.into())
    }

    /// Verify `token` and load the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<PublicUser> {
        let user_id = self.verify_token(token)?;

        users::Entity::find_by_id(user_id)
            .one(self.db.reader())
            .await?
            .map(PublicUser::from)
            .ok_or_else(|| SystemError::unauthorized("Not authorized, user not found"))
    }

    pub fn issue_token(&self, user_id: DbId) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            id: user_id,
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };

        Ok(jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).context("Failed to sign token")?)
    }

    /// Check the signature and expiry of `token`, returning the id of the user it belongs to.
    pub fn verify_token(&self, token: &str) -> Result<DbId> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.id)
            .map_err(|e| {
                tracing::debug!(?e, "Rejected token");
                SystemError::unauthorized("Not authorized, token failed")
            })
    }

    pub fn require_admin(&self, user: &PublicUser) -> Result<()> {
        if user.role == Role::Admin {
            Ok(())
        } else {
            Err(SystemError::forbidden("Not authorized, admin access required"))
        }
    }

    /// All registered users, only available to admins.
    #[tracing::instrument(skip_all)]
    pub async fn list_users(&self, requester: &PublicUser) -> Result<Vec<PublicUser>> {
        self.require_admin(requester)?;

        let users = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(self.db.reader())
            .await?;

        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    fn respond_with_token(&self, user: users::Model) -> Result<AuthResponse> {
        let token = self.issue_token(user.id)?;
        Ok(AuthResponse {
            user: user.into(),
            token,
        })
    }

    async fn ensure_unused(&self, user_id: DbId, column: users::Column, value: &str) -> Result<()> {
        let other = users::Entity::find()
            .filter(column.eq(value))
            .filter(users::Column::Id.ne(user_id))
            .one(self.db.reader())
            .await?;

        match other {
            Some(_) => Err(SystemError::UserExists),
            None => Ok(()),
        }
    }
}

/// Hash `password` into a PHC string.
///
/// Argon2 is intentionally slow, so this runs on the blocking pool.
pub async fn hash_password(password: String) -> Result<String> {
    let hashed = tokio::task::spawn_blocking(move || {
        let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>()).map_err(|e| eyre::eyre!("Invalid salt: {e}"))?;
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| eyre::eyre!("Failed to hash password: {e}"))
    })
    .await
    .context("Password hashing task panicked")??;

    Ok(hashed)
}

async fn verify_password(password: String, phc: String) -> Result<bool> {
    let matches = tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&phc).map_err(|e| eyre::eyre!("Stored password hash is malformed: {e}"))?;
        Ok::<_, eyre::Error>(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    })
    .await
    .context("Password verification task panicked")??;

    Ok(matches)
}
