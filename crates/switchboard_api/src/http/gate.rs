use async_trait::async_trait;
use axum::http::{header, HeaderMap, Method, Uri};
use common::auth::{AuthTokenProvider, RequestSigner, StaticApiKey};
use common::domain::{DeviceRepository, DomainError, DomainResult};
use std::sync::Arc;
use tracing::debug;

/// The strategies a route may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    UserBearer,
    DeviceToken,
    ApiKey,
    HmacSignature,
}

/// Declarative per-route gate policies. A route requires zero, one, or two
/// strategies; the gate applies them as a conjunction.
pub mod policy {
    use super::StrategyKind;

    /// Routes open to anyone
    pub const OPEN: &[StrategyKind] = &[];
    /// User-facing routes behind the bearer token
    pub const USER: &[StrategyKind] = &[StrategyKind::UserBearer];
    /// Device-facing routes behind the device's own stored credential
    pub const DEVICE: &[StrategyKind] = &[StrategyKind::DeviceToken];
    /// Service-to-service reads: static key and request signature together
    pub const SERVICE: &[StrategyKind] = &[StrategyKind::ApiKey, StrategyKind::HmacSignature];
}

/// Snapshot of the request attributes the strategies evaluate. Strategies
/// never mutate state; they are predicates over this and the store.
pub struct GateRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub query: &'a str,
    pub headers: &'a HeaderMap,
    /// Path device id, on device-facing routes
    pub device_id: Option<&'a str>,
}

impl<'a> GateRequest<'a> {
    pub fn from_parts(
        method: &'a Method,
        uri: &'a Uri,
        headers: &'a HeaderMap,
        device_id: Option<&'a str>,
    ) -> Self {
        Self {
            method: method.as_str(),
            path: uri.path(),
            query: uri.query().unwrap_or(""),
            headers,
            device_id,
        }
    }
}

/// What an allowed request established about the caller
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub user_id: Option<String>,
    pub device_id: Option<String>,
    /// The raw bearer credential, for routes that store it
    pub bearer_token: Option<String>,
}

impl AuthContext {
    fn merge(&mut self, other: AuthContext) {
        self.user_id = self.user_id.take().or(other.user_id);
        self.device_id = self.device_id.take().or(other.device_id);
        self.bearer_token = self.bearer_token.take().or(other.bearer_token);
    }
}

/// One authorization capability: allow (with what was learned) or deny
#[async_trait]
pub trait AccessStrategy: Send + Sync {
    async fn authorize(&self, request: &GateRequest<'_>) -> DomainResult<AuthContext>;
}

fn authorization_header(headers: &HeaderMap) -> DomainResult<&str> {
    headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| DomainError::Unauthorized("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| DomainError::Unauthorized("Invalid authorization header".to_string()))
}

/// Bearer-token user authentication against the token issuer
pub struct UserBearerStrategy {
    token_provider: Arc<dyn AuthTokenProvider>,
}

impl UserBearerStrategy {
    pub fn new(token_provider: Arc<dyn AuthTokenProvider>) -> Self {
        Self { token_provider }
    }
}

#[async_trait]
impl AccessStrategy for UserBearerStrategy {
    async fn authorize(&self, request: &GateRequest<'_>) -> DomainResult<AuthContext> {
        let value = authorization_header(request.headers)?;
        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .ok_or_else(|| {
                DomainError::Unauthorized(
                    "Invalid authorization format, expected 'Bearer <token>'".to_string(),
                )
            })?;

        let user_id = self.token_provider.validate_user_token(token)?;

        Ok(AuthContext {
            user_id: Some(user_id),
            bearer_token: Some(token.to_string()),
            ..AuthContext::default()
        })
    }
}

/// Shared-secret device authentication: the presented credential must equal
/// the device's stored token. Plain equality, no signature verification —
/// the stored value is the secret.
pub struct DeviceTokenStrategy {
    device_repository: Arc<dyn DeviceRepository>,
}

impl DeviceTokenStrategy {
    pub fn new(device_repository: Arc<dyn DeviceRepository>) -> Self {
        Self { device_repository }
    }
}

#[async_trait]
impl AccessStrategy for DeviceTokenStrategy {
    async fn authorize(&self, request: &GateRequest<'_>) -> DomainResult<AuthContext> {
        let device_id = request
            .device_id
            .ok_or_else(|| DomainError::Unauthorized("Missing device id".to_string()))?;

        let device = self
            .device_repository
            .get_device(device_id)
            .await?
            .ok_or_else(|| DomainError::DeviceNotFound(device_id.to_string()))?;

        let value = authorization_header(request.headers)?;
        // devices send the raw credential; a Bearer prefix is tolerated
        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .unwrap_or(value);

        if device.token != token {
            return Err(DomainError::Unauthorized("Invalid device token".to_string()));
        }

        Ok(AuthContext {
            device_id: Some(device.device_id),
            ..AuthContext::default()
        })
    }
}

/// Static API key authentication
pub struct ApiKeyStrategy {
    key: StaticApiKey,
}

impl ApiKeyStrategy {
    pub fn new(key: StaticApiKey) -> Self {
        Self { key }
    }
}

#[async_trait]
impl AccessStrategy for ApiKeyStrategy {
    async fn authorize(&self, request: &GateRequest<'_>) -> DomainResult<AuthContext> {
        let candidate = request
            .headers
            .get("x-api-key")
            .ok_or_else(|| DomainError::Unauthorized("Missing API key".to_string()))?
            .to_str()
            .map_err(|_| DomainError::Unauthorized("Invalid API key".to_string()))?;

        if !self.key.matches(candidate) {
            return Err(DomainError::Unauthorized("Invalid API key".to_string()));
        }

        Ok(AuthContext::default())
    }
}

/// HMAC request-signature authentication
pub struct HmacSignatureStrategy {
    signer: RequestSigner,
}

impl HmacSignatureStrategy {
    pub fn new(signer: RequestSigner) -> Self {
        Self { signer }
    }
}

#[async_trait]
impl AccessStrategy for HmacSignatureStrategy {
    async fn authorize(&self, request: &GateRequest<'_>) -> DomainResult<AuthContext> {
        let signature = request
            .headers
            .get("x-signature")
            .ok_or_else(|| DomainError::Unauthorized("Missing request signature".to_string()))?
            .to_str()
            .map_err(|_| DomainError::Unauthorized("Invalid request signature".to_string()))?;

        if !self
            .signer
            .verify(request.method, request.path, request.query, signature)
        {
            return Err(DomainError::Unauthorized(
                "Invalid request signature".to_string(),
            ));
        }

        Ok(AuthContext::default())
    }
}

/// The access-control gate: holds one instance of each strategy and applies
/// a route's declared list as a conjunction, short-circuiting on the first
/// deny so no handler runs partially authorized.
pub struct Gate {
    user_bearer: UserBearerStrategy,
    device_token: DeviceTokenStrategy,
    api_key: ApiKeyStrategy,
    hmac_signature: HmacSignatureStrategy,
}

impl Gate {
    pub fn new(
        token_provider: Arc<dyn AuthTokenProvider>,
        device_repository: Arc<dyn DeviceRepository>,
        api_key: StaticApiKey,
        signer: RequestSigner,
    ) -> Self {
        Self {
            user_bearer: UserBearerStrategy::new(token_provider),
            device_token: DeviceTokenStrategy::new(device_repository),
            api_key: ApiKeyStrategy::new(api_key),
            hmac_signature: HmacSignatureStrategy::new(signer),
        }
    }

    fn strategy(&self, kind: StrategyKind) -> &dyn AccessStrategy {
        match kind {
            StrategyKind::UserBearer => &self.user_bearer,
            StrategyKind::DeviceToken => &self.device_token,
            StrategyKind::ApiKey => &self.api_key,
            StrategyKind::HmacSignature => &self.hmac_signature,
        }
    }

    pub async fn authorize(
        &self,
        required: &[StrategyKind],
        request: &GateRequest<'_>,
    ) -> DomainResult<AuthContext> {
        let mut context = AuthContext::default();
        for kind in required {
            let granted = self.strategy(*kind).authorize(request).await.map_err(|e| {
                debug!(strategy = ?kind, path = %request.path, "gate denied request");
                e
            })?;
            context.merge(granted);
        }
        Ok(context)
    }
}
