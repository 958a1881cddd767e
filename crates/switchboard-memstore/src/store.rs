use async_trait::async_trait;
use common::domain::{
    AssignUserInput, Device, DeviceMutation, DeviceRepository, DomainError, DomainResult,
    FindUserByLoginInput, GetUserInput, InitializeDeviceInput, RegisterDeviceInput,
    RegisterUserInputWithId, RenameDeviceInput, UnregisterDeviceInput, User, UserRepository,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct StoreInner {
    devices: HashMap<String, Device>,
    users: HashMap<String, User>,
}

impl StoreInner {
    /// Probe for the next free "Device {n}" name within one owner scope.
    /// Callers hold the write lock, so probe and insert are one unit.
    fn next_device_name(&self, owner: Option<&str>) -> String {
        let mut counter = 1;
        loop {
            let candidate = format!("Device {}", counter);
            let taken = self
                .devices
                .values()
                .any(|device| device.user_id.as_deref() == owner && device.name == candidate);
            if !taken {
                return candidate;
            }
            counter += 1;
        }
    }

    fn name_taken_in_scope(&self, owner: Option<&str>, name: &str, except: &str) -> bool {
        self.devices.values().any(|device| {
            device.user_id.as_deref() == owner && device.name == name && device.device_id != except
        })
    }
}

/// In-memory document store implementing the device and user repositories.
///
/// All mutations run under a single write lock; multi-document operations
/// (register, unregister, the login token fan-out) commit inside one
/// critical section, and single-device mutations are applied to a copy that
/// is only written back on success. Readers take the shared lock and never
/// observe a half-applied update.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceRepository for MemoryStore {
    async fn initialize_device(&self, input: InitializeDeviceInput) -> DomainResult<Device> {
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner.devices.get(&input.device_id) {
            debug!(device_id = %input.device_id, "initialize found existing device");
            return Ok(existing.clone());
        }

        let name = inner.next_device_name(None);
        let device = Device::new(input.device_id.clone(), name, input.token, None);
        inner.devices.insert(input.device_id, device.clone());

        debug!(device_id = %device.device_id, name = %device.name, "initialized device");
        Ok(device)
    }

    async fn register_device_to_user(&self, input: RegisterDeviceInput) -> DomainResult<Device> {
        let mut inner = self.inner.write().await;

        if !inner.users.contains_key(&input.user_id) {
            return Err(DomainError::UserNotFound(input.user_id));
        }
        if inner.devices.contains_key(&input.device_id) {
            return Err(DomainError::DeviceAlreadyRegistered(input.device_id));
        }

        let name = inner.next_device_name(Some(&input.user_id));
        let device = Device::new(
            input.device_id.clone(),
            name,
            input.token,
            Some(input.user_id.clone()),
        );

        inner.devices.insert(input.device_id.clone(), device.clone());
        if let Some(user) = inner.users.get_mut(&input.user_id) {
            user.device_ids.push(input.device_id);
        }

        debug!(device_id = %device.device_id, user_id = %input.user_id, "registered device");
        Ok(device)
    }

    async fn unregister_device_from_user(&self, input: UnregisterDeviceInput) -> DomainResult<()> {
        let mut inner = self.inner.write().await;

        if !inner.users.contains_key(&input.user_id) {
            return Err(DomainError::UserNotFound(input.user_id));
        }
        let device = inner
            .devices
            .get(&input.device_id)
            .ok_or_else(|| DomainError::DeviceNotFound(input.device_id.clone()))?;

        if device.user_id.as_deref() != Some(input.user_id.as_str()) {
            return Err(DomainError::DeviceNotOwned(input.device_id, input.user_id));
        }

        inner.devices.remove(&input.device_id);
        if let Some(user) = inner.users.get_mut(&input.user_id) {
            user.device_ids.retain(|id| id != &input.device_id);
        }

        debug!(device_id = %input.device_id, user_id = %input.user_id, "unregistered device");
        Ok(())
    }

    async fn get_device(&self, device_id: &str) -> DomainResult<Option<Device>> {
        let inner = self.inner.read().await;
        Ok(inner.devices.get(device_id).cloned())
    }

    async fn find_device_by_channel(&self, channel_id: &str) -> DomainResult<Option<Device>> {
        let inner = self.inner.read().await;
        Ok(inner
            .devices
            .values()
            .find(|device| device.channels.iter().any(|c| c.id == channel_id))
            .cloned())
    }

    async fn list_devices_by_user(&self, user_id: &str) -> DomainResult<Vec<Device>> {
        let inner = self.inner.read().await;
        let mut devices: Vec<Device> = inner
            .devices
            .values()
            .filter(|device| device.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect();
        devices.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.device_id.cmp(&b.device_id))
        });
        Ok(devices)
    }

    async fn assign_user(&self, input: AssignUserInput) -> DomainResult<Device> {
        let mut inner = self.inner.write().await;

        if !inner.users.contains_key(&input.user_id) {
            return Err(DomainError::UserNotFound(input.user_id));
        }
        let device = inner
            .devices
            .get(&input.device_id)
            .ok_or_else(|| DomainError::DeviceNotFound(input.device_id.clone()))?;

        // The device keeps its name across scopes, so the target scope must
        // not already use it.
        if inner.name_taken_in_scope(Some(&input.user_id), &device.name, &input.device_id) {
            return Err(DomainError::DeviceNameTaken(device.name.clone()));
        }

        let previous_owner = device.user_id.clone();
        if let Some(owner_id) = previous_owner {
            if let Some(owner) = inner.users.get_mut(&owner_id) {
                owner.device_ids.retain(|id| id != &input.device_id);
            }
        }
        if let Some(user) = inner.users.get_mut(&input.user_id) {
            if !user.device_ids.contains(&input.device_id) {
                user.device_ids.push(input.device_id.clone());
            }
        }

        let device = inner
            .devices
            .get_mut(&input.device_id)
            .ok_or_else(|| DomainError::DeviceNotFound(input.device_id.clone()))?;
        device.user_id = Some(input.user_id);

        Ok(device.clone())
    }

    async fn rename_device(&self, input: RenameDeviceInput) -> DomainResult<Device> {
        let mut inner = self.inner.write().await;

        let owner = inner
            .devices
            .get(&input.device_id)
            .ok_or_else(|| DomainError::DeviceNotFound(input.device_id.clone()))?
            .user_id
            .clone();

        if inner.name_taken_in_scope(owner.as_deref(), &input.new_name, &input.device_id) {
            return Err(DomainError::DeviceNameTaken(input.new_name));
        }

        let device = inner
            .devices
            .get_mut(&input.device_id)
            .ok_or_else(|| DomainError::DeviceNotFound(input.device_id.clone()))?;
        device.name = input.new_name;

        Ok(device.clone())
    }

    async fn replace_user_device_tokens(&self, user_id: &str, token: &str) -> DomainResult<u64> {
        let mut inner = self.inner.write().await;

        let mut rewritten = 0;
        for device in inner.devices.values_mut() {
            if device.user_id.as_deref() == Some(user_id) {
                device.token = token.to_string();
                rewritten += 1;
            }
        }

        debug!(user_id = %user_id, count = rewritten, "replaced device tokens");
        Ok(rewritten)
    }

    async fn update_device(
        &self,
        device_id: &str,
        mutation: DeviceMutation,
    ) -> DomainResult<Device> {
        let mut inner = self.inner.write().await;

        let device = inner
            .devices
            .get(device_id)
            .ok_or_else(|| DomainError::DeviceNotFound(device_id.to_string()))?;

        // Mutate a copy and only commit on success, so a failed mutation
        // leaves the stored document untouched.
        let mut updated = device.clone();
        mutation(&mut updated)?;
        inner.devices.insert(device_id.to_string(), updated.clone());

        Ok(updated)
    }

    async fn update_device_by_channel(
        &self,
        channel_id: &str,
        mutation: DeviceMutation,
    ) -> DomainResult<Device> {
        let mut inner = self.inner.write().await;

        let device_id = inner
            .devices
            .values()
            .find(|device| device.channels.iter().any(|c| c.id == channel_id))
            .map(|device| device.device_id.clone())
            .ok_or_else(|| DomainError::ChannelNotFound(channel_id.to_string()))?;

        let device = inner
            .devices
            .get(&device_id)
            .ok_or_else(|| DomainError::DeviceNotFound(device_id.clone()))?;

        let mut updated = device.clone();
        mutation(&mut updated)?;
        inner.devices.insert(device_id, updated.clone());

        Ok(updated)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn register_user(&self, input: RegisterUserInputWithId) -> DomainResult<User> {
        let mut inner = self.inner.write().await;

        let taken = inner
            .users
            .values()
            .any(|user| user.username == input.username || user.email == input.email);
        if taken {
            return Err(DomainError::UserAlreadyExists);
        }

        let user = User {
            id: input.id.clone(),
            username: input.username,
            email: input.email,
            password_hash: input.password_hash,
            device_ids: Vec::new(),
            created_at: chrono::Utc::now(),
        };
        inner.users.insert(input.id, user.clone());

        debug!(user_id = %user.id, "registered user");
        Ok(user)
    }

    async fn get_user(&self, input: GetUserInput) -> DomainResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&input.user_id).cloned())
    }

    async fn find_user_by_login(&self, input: FindUserByLoginInput) -> DomainResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|user| {
                user.username == input.username_or_email || user.email == input.username_or_email
            })
            .cloned())
    }
}
