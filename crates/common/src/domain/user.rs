use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::DomainResult;

/// User domain entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    /// Owned-device references (`device_id` values); order is irrelevant.
    pub device_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// External input for registering a user (no ID, plaintext password)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterUserInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Internal input with generated ID and hashed password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterUserInputWithId {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Input for getting a user by ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetUserInput {
    pub user_id: String,
}

/// Input for the login lookup (either field may match)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindUserByLoginInput {
    pub username_or_email: String,
}

/// Repository trait for user storage operations
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Register a new user (id and password_hash already generated/hashed
    /// by the domain service); fails if the username or email is taken.
    async fn register_user(&self, input: RegisterUserInputWithId) -> DomainResult<User>;

    /// Get a user by ID
    async fn get_user(&self, input: GetUserInput) -> DomainResult<Option<User>>;

    /// Find a user whose username or email matches the given value
    async fn find_user_by_login(&self, input: FindUserByLoginInput) -> DomainResult<Option<User>>;
}
