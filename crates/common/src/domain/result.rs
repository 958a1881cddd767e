use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Device already registered: {0}")]
    DeviceAlreadyRegistered(String),

    #[error("Invalid device id: {0}")]
    InvalidDeviceId(String),

    #[error("Device name already exists: {0}")]
    DeviceNameTaken(String),

    #[error("Device {0} does not belong to user {1}")]
    DeviceNotOwned(String, String),

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Channel name already exists: {0}")]
    ChannelNameTaken(String),

    #[error("Cannot delete an active channel: {0}")]
    ChannelActive(String),

    #[error("Invalid timeout time: {0}")]
    InvalidTimeFormat(String),

    #[error("Invalid timeout date: {0}")]
    InvalidDateFormat(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Username or email already exists")]
    UserAlreadyExists,

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid or expired token: {0}")]
    InvalidToken(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Password hashing error: {0}")]
    PasswordHashingError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] anyhow::Error),
}
