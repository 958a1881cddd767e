use common::auth::AuthTokenProvider;
use common::domain::{
    validate_device_id, AssignUserInput, Device, DeviceRepository, DeviceStatus, DomainError,
    DomainResult, GetUserInput, InitializeDeviceInput, RegisterDeviceInput, RenameDeviceInput,
    UnregisterDeviceInput, UserRepository,
};
use garde::Validate;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Service request for the idempotent device initialize
#[derive(Debug, Clone, Validate)]
pub struct InitializeDeviceRequest {
    #[garde(length(min = 1))]
    pub device_id: String,
}

/// Service request for registering a device to a user
#[derive(Debug, Clone, Validate)]
pub struct RegisterDeviceRequest {
    #[garde(skip)] // asserted by the caller, checked against the store
    pub user_id: String,
    #[garde(length(min = 1))]
    pub device_id: String,
    #[garde(skip)] // opaque credential, stored as presented
    pub bearer_token: String,
}

/// Service request for listing a user's devices
#[derive(Debug, Clone, Validate)]
pub struct ListDevicesRequest {
    #[garde(length(min = 1))]
    pub user_id: String,
}

/// Service request for renaming a device
#[derive(Debug, Clone, Validate)]
pub struct UpdateDeviceNameRequest {
    #[garde(length(min = 1))]
    pub device_id: String,
    #[garde(length(min = 1))]
    pub new_name: String,
}

/// Service request for toggling a device's status
#[derive(Debug, Clone, Validate)]
pub struct ToggleDeviceStatusRequest {
    #[garde(length(min = 1))]
    pub device_id: String,
}

/// Service request for setting a device's status explicitly
#[derive(Debug, Clone, Validate)]
pub struct SetDeviceStatusRequest {
    #[garde(length(min = 1))]
    pub device_id: String,
    #[garde(skip)]
    pub status: DeviceStatus,
}

/// Service request for unregistering a device
#[derive(Debug, Clone, Validate)]
pub struct UnregisterDeviceRequest {
    #[garde(length(min = 1))]
    pub device_id: String,
    #[garde(length(min = 1))]
    pub user_id: String,
}

/// Service request for assigning a device to a user
#[derive(Debug, Clone, Validate)]
pub struct AssignUserRequest {
    #[garde(length(min = 1))]
    pub device_id: String,
    #[garde(length(min = 1))]
    pub user_id: String,
}

/// Service request for the activation check
#[derive(Debug, Clone, Validate)]
pub struct CheckActivationRequest {
    #[garde(length(min = 1))]
    pub device_id: String,
}

/// Domain service for device lifecycle business logic
/// This is the orchestration layer that handlers call
pub struct DeviceService {
    device_repository: Arc<dyn DeviceRepository>,
    user_repository: Arc<dyn UserRepository>,
    token_provider: Arc<dyn AuthTokenProvider>,
}

impl DeviceService {
    pub fn new(
        device_repository: Arc<dyn DeviceRepository>,
        user_repository: Arc<dyn UserRepository>,
        token_provider: Arc<dyn AuthTokenProvider>,
    ) -> Self {
        Self {
            device_repository,
            user_repository,
            token_provider,
        }
    }

    /// Get-or-create a device by id. An existing device is returned as
    /// stored; a fresh id must match the canonical format and gets a minted
    /// credential plus the next free generated name.
    #[instrument(skip(self, request), fields(device_id = %request.device_id))]
    pub async fn initialize_device(&self, request: InitializeDeviceRequest) -> DomainResult<Device> {
        common::garde::validate(&request)?;

        if let Some(existing) = self.device_repository.get_device(&request.device_id).await? {
            debug!(device_id = %existing.device_id, "device already initialized");
            return Ok(existing);
        }

        validate_device_id(&request.device_id)?;
        let token = self.token_provider.generate_device_token(&request.device_id)?;

        let device = self
            .device_repository
            .initialize_device(InitializeDeviceInput {
                device_id: request.device_id,
                token,
            })
            .await?;

        debug!(device_id = %device.device_id, name = %device.name, "device initialized");
        Ok(device)
    }

    /// Register a device to a user, storing the caller's bearer token as the
    /// device credential.
    #[instrument(skip(self, request), fields(device_id = %request.device_id, user_id = %request.user_id))]
    pub async fn register_device(&self, request: RegisterDeviceRequest) -> DomainResult<Device> {
        common::garde::validate(&request)?;
        validate_device_id(&request.device_id)?;

        let device = self
            .device_repository
            .register_device_to_user(RegisterDeviceInput {
                device_id: request.device_id,
                user_id: request.user_id,
                token: request.bearer_token,
            })
            .await?;

        debug!(device_id = %device.device_id, "device registered");
        Ok(device)
    }

    /// List devices owned by a user
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn list_devices(&self, request: ListDevicesRequest) -> DomainResult<Vec<Device>> {
        common::garde::validate(&request)?;

        let devices = self
            .device_repository
            .list_devices_by_user(&request.user_id)
            .await?;

        debug!(count = devices.len(), "listed devices");
        Ok(devices)
    }

    /// List devices owned by a user, failing when the user does not exist
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn filter_devices(&self, request: ListDevicesRequest) -> DomainResult<Vec<Device>> {
        common::garde::validate(&request)?;

        self.user_repository
            .get_user(GetUserInput {
                user_id: request.user_id.clone(),
            })
            .await?
            .ok_or_else(|| DomainError::UserNotFound(request.user_id.clone()))?;

        self.device_repository
            .list_devices_by_user(&request.user_id)
            .await
    }

    /// Rename a device; the name must be free within the owner scope
    #[instrument(skip(self, request), fields(device_id = %request.device_id))]
    pub async fn update_name(&self, request: UpdateDeviceNameRequest) -> DomainResult<Device> {
        common::garde::validate(&request)?;

        self.device_repository
            .rename_device(RenameDeviceInput {
                device_id: request.device_id,
                new_name: request.new_name,
            })
            .await
    }

    /// Flip a device's activation state. Going inactive forces every channel
    /// off in the same store update.
    #[instrument(skip(self, request), fields(device_id = %request.device_id))]
    pub async fn toggle_status(&self, request: ToggleDeviceStatusRequest) -> DomainResult<Device> {
        common::garde::validate(&request)?;

        self.device_repository
            .update_device(
                &request.device_id,
                Box::new(|device| {
                    device.toggle_status();
                    Ok(())
                }),
            )
            .await
    }

    /// Set a device's activation state explicitly (device-facing route)
    #[instrument(skip(self, request), fields(device_id = %request.device_id))]
    pub async fn set_status(&self, request: SetDeviceStatusRequest) -> DomainResult<Device> {
        common::garde::validate(&request)?;

        let status = request.status;
        self.device_repository
            .update_device(
                &request.device_id,
                Box::new(move |device| {
                    device.set_status(status);
                    Ok(())
                }),
            )
            .await
    }

    /// Unregister a device; only its owner may do so
    #[instrument(skip(self, request), fields(device_id = %request.device_id, user_id = %request.user_id))]
    pub async fn unregister_device(&self, request: UnregisterDeviceRequest) -> DomainResult<()> {
        common::garde::validate(&request)?;

        self.device_repository
            .unregister_device_from_user(UnregisterDeviceInput {
                device_id: request.device_id,
                user_id: request.user_id,
            })
            .await
    }

    /// Bind the owning user on a device. There is deliberately no
    /// ownership-transfer consent check.
    #[instrument(skip(self, request), fields(device_id = %request.device_id, user_id = %request.user_id))]
    pub async fn assign_user(&self, request: AssignUserRequest) -> DomainResult<Device> {
        common::garde::validate(&request)?;

        self.device_repository
            .assign_user(AssignUserInput {
                device_id: request.device_id,
                user_id: request.user_id,
            })
            .await
    }

    /// Report whether a device exists and is active. Unknown devices read as
    /// not activated rather than erroring.
    #[instrument(skip(self, request), fields(device_id = %request.device_id))]
    pub async fn check_activation(&self, request: CheckActivationRequest) -> DomainResult<bool> {
        common::garde::validate(&request)?;

        let activated = self
            .device_repository
            .get_device(&request.device_id)
            .await?
            .map(|device| device.is_active())
            .unwrap_or(false);

        Ok(activated)
    }
}
