use common::auth::{AuthTokenProvider, PasswordService};
use common::domain::{
    DeviceRepository, DomainError, DomainResult, FindUserByLoginInput, RegisterUserInput,
    RegisterUserInputWithId, User, UserRepository,
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Output from a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginUserOutput {
    pub token: String,
    pub user_id: String,
}

/// Input for user login; the identifier may be a username or an email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginUserInput {
    pub username_or_email: String,
    pub password: String,
}

/// Domain service for user registration and login
pub struct UserService {
    user_repository: Arc<dyn UserRepository>,
    device_repository: Arc<dyn DeviceRepository>,
    token_provider: Arc<dyn AuthTokenProvider>,
    password_service: Arc<dyn PasswordService>,
}

impl UserService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        device_repository: Arc<dyn DeviceRepository>,
        token_provider: Arc<dyn AuthTokenProvider>,
        password_service: Arc<dyn PasswordService>,
    ) -> Self {
        Self {
            user_repository,
            device_repository,
            token_provider,
            password_service,
        }
    }

    /// Register a new user with hashed password
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register_user(&self, input: RegisterUserInput) -> DomainResult<User> {
        if input.username.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Username cannot be empty".to_string(),
            ));
        }
        if !Self::is_valid_email(&input.email) {
            return Err(DomainError::InvalidEmail(
                "Invalid email format".to_string(),
            ));
        }
        if input.password.len() < 8 {
            return Err(DomainError::InvalidPassword(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let password_hash = self.password_service.hash_password(&input.password)?;
        let user_id = xid::new().to_string();

        debug!(user_id = %user_id, "registering user with hashed password");

        let user = self
            .user_repository
            .register_user(RegisterUserInputWithId {
                id: user_id,
                username: input.username,
                email: input.email,
                password_hash,
            })
            .await?;

        debug!(user_id = %user.id, "user registered successfully");
        Ok(user)
    }

    /// Login by username or email. A fresh access token is minted and fanned
    /// out to every device the user owns, voiding all previously issued
    /// device credentials.
    #[instrument(skip(self, input), fields(login = %input.username_or_email))]
    pub async fn login_user(&self, input: LoginUserInput) -> DomainResult<LoginUserOutput> {
        debug!("attempting user login");

        let user = self
            .user_repository
            .find_user_by_login(FindUserByLoginInput {
                username_or_email: input.username_or_email.clone(),
            })
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        if !self
            .password_service
            .verify_password(&input.password, &user.password_hash)?
        {
            return Err(DomainError::InvalidCredentials);
        }

        let token = self
            .token_provider
            .generate_user_token(&user.id, &user.username)?;

        let rewritten = self
            .device_repository
            .replace_user_device_tokens(&user.id, &token)
            .await?;

        debug!(user_id = %user.id, devices = rewritten, "user login successful");

        Ok(LoginUserOutput {
            token,
            user_id: user.id,
        })
    }

    /// Basic email validation
    fn is_valid_email(email: &str) -> bool {
        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() != 2 || parts[0].is_empty() {
            return false;
        }
        let domain = parts[1];
        domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    }
}
