use crate::domain::DomainResult;

/// Trait for bearer-token operations (user access tokens and device
/// credentials)
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AuthTokenProvider: Send + Sync {
    /// Generate a time-bounded access token (JWT) for a user
    fn generate_user_token(&self, user_id: &str, username: &str) -> DomainResult<String>;

    /// Generate a device credential bound to a device id. Device credentials
    /// carry no expiry; they are voided by the login fan-out that rewrites
    /// every owned device's stored token.
    fn generate_device_token(&self, device_id: &str) -> DomainResult<String>;

    /// Validate a user access token (signature + expiry) and extract the
    /// user ID
    fn validate_user_token(&self, token: &str) -> DomainResult<String>;
}

/// Trait for password hashing and verification
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PasswordService: Send + Sync {
    /// Hash a plaintext password
    fn hash_password(&self, password: &str) -> DomainResult<String>;

    /// Verify a password against a hash
    fn verify_password(&self, password: &str, hash: &str) -> DomainResult<bool>;
}
