use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{parse_date, validate_time, ChannelSchedule, DomainError, DomainResult};

/// Device activation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Active,
    Inactive,
}

/// A named on/off sub-resource of a device, optionally time-windowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub status: bool,
    pub timeout: ChannelSchedule,
}

/// Device domain entity.
///
/// Channels are exclusively owned by their device; every mutation that can
/// affect them goes through the methods below so the structural rules hold
/// after each call: channel names are exactly `Channel 1..k` after any
/// add/remove, and an inactive device never has an active channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: String,
    pub name: String,
    pub token: String,
    pub status: DeviceStatus,
    pub user_id: Option<String>,
    pub channels: Vec<Channel>,
    pub created_at: DateTime<Utc>,
}

impl Device {
    pub fn new(device_id: String, name: String, token: String, user_id: Option<String>) -> Self {
        Self {
            device_id,
            name,
            token,
            status: DeviceStatus::Active,
            user_id,
            channels: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == DeviceStatus::Active
    }

    /// Set the activation state. Going inactive forces every channel off in
    /// the same mutation, so no reader sees an inactive device with a live
    /// channel.
    pub fn set_status(&mut self, status: DeviceStatus) {
        self.status = status;
        if status == DeviceStatus::Inactive {
            for channel in &mut self.channels {
                channel.status = false;
            }
        }
    }

    /// Flip the activation state and return the new value.
    pub fn toggle_status(&mut self) -> DeviceStatus {
        let next = match self.status {
            DeviceStatus::Active => DeviceStatus::Inactive,
            DeviceStatus::Inactive => DeviceStatus::Active,
        };
        self.set_status(next);
        next
    }

    /// Append a new channel named after its position, off by default.
    pub fn add_channel(&mut self, channel_id: String) -> Channel {
        let channel = Channel {
            id: channel_id,
            name: format!("Channel {}", self.channels.len() + 1),
            status: false,
            timeout: ChannelSchedule::default(),
        };
        self.channels.push(channel.clone());
        channel
    }

    /// Remove a channel and renumber the remainder to close the gap.
    /// An active channel cannot be removed.
    pub fn remove_channel(&mut self, channel_id: &str) -> DomainResult<()> {
        let index = self
            .channels
            .iter()
            .position(|channel| channel.id == channel_id)
            .ok_or_else(|| DomainError::ChannelNotFound(channel_id.to_string()))?;

        if self.channels[index].status {
            return Err(DomainError::ChannelActive(channel_id.to_string()));
        }

        self.channels.remove(index);
        self.renumber_channels();
        Ok(())
    }

    // Renumbering is authoritative: it overwrites any custom name a channel
    // acquired through rename.
    fn renumber_channels(&mut self) {
        for (index, channel) in self.channels.iter_mut().enumerate() {
            channel.name = format!("Channel {}", index + 1);
        }
    }

    /// Flip one channel's on/off state and return the new value.
    pub fn toggle_channel(&mut self, channel_id: &str) -> DomainResult<bool> {
        let channel = self.channel_mut(channel_id)?;
        channel.status = !channel.status;
        Ok(channel.status)
    }

    /// Rename a channel; the name must not be used by a sibling.
    pub fn rename_channel(&mut self, channel_id: &str, new_name: &str) -> DomainResult<()> {
        if !self.channels.iter().any(|channel| channel.id == channel_id) {
            return Err(DomainError::ChannelNotFound(channel_id.to_string()));
        }
        if self
            .channels
            .iter()
            .any(|channel| channel.name == new_name && channel.id != channel_id)
        {
            return Err(DomainError::ChannelNameTaken(new_name.to_string()));
        }

        let channel = self.channel_mut(channel_id)?;
        channel.name = new_name.to_string();
        Ok(())
    }

    /// Set a channel's timeout time (24-hour `HH:MM`, stored verbatim).
    pub fn set_channel_time(&mut self, channel_id: &str, time: &str) -> DomainResult<()> {
        validate_time(time)?;
        let channel = self.channel_mut(channel_id)?;
        channel.timeout.time = Some(time.to_string());
        Ok(())
    }

    pub fn clear_channel_time(&mut self, channel_id: &str) -> DomainResult<()> {
        let channel = self.channel_mut(channel_id)?;
        channel.timeout.time = None;
        Ok(())
    }

    /// Set a channel's timeout date (`MM/DD/YYYY`, stored canonicalized).
    pub fn set_channel_date(&mut self, channel_id: &str, date: &str) -> DomainResult<()> {
        let canonical = parse_date(date)?;
        let channel = self.channel_mut(channel_id)?;
        channel.timeout.date = Some(canonical);
        Ok(())
    }

    pub fn clear_channel_date(&mut self, channel_id: &str) -> DomainResult<()> {
        let channel = self.channel_mut(channel_id)?;
        channel.timeout.date = None;
        Ok(())
    }

    pub fn channel(&self, channel_id: &str) -> DomainResult<&Channel> {
        self.channels
            .iter()
            .find(|channel| channel.id == channel_id)
            .ok_or_else(|| DomainError::ChannelNotFound(channel_id.to_string()))
    }

    fn channel_mut(&mut self, channel_id: &str) -> DomainResult<&mut Channel> {
        self.channels
            .iter_mut()
            .find(|channel| channel.id == channel_id)
            .ok_or_else(|| DomainError::ChannelNotFound(channel_id.to_string()))
    }
}

/// Input for the idempotent get-or-create of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializeDeviceInput {
    pub device_id: String,
    /// Credential to store when the device does not exist yet.
    pub token: String,
}

/// Input for registering a device to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDeviceInput {
    pub device_id: String,
    pub user_id: String,
    pub token: String,
}

/// Input for unregistering a device from its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnregisterDeviceInput {
    pub device_id: String,
    /// Caller-asserted owner; must match the device's owner.
    pub user_id: String,
}

/// Input for assigning a device to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignUserInput {
    pub device_id: String,
    pub user_id: String,
}

/// Input for renaming a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameDeviceInput {
    pub device_id: String,
    pub new_name: String,
}

/// Single-device mutation applied under the store's write lock. The store
/// applies it to a copy and only commits when it returns `Ok`.
pub type DeviceMutation = Box<dyn FnOnce(&mut Device) -> DomainResult<()> + Send>;

/// Repository trait for device storage operations.
///
/// Every method is one atomic unit against the store: multi-document writes
/// (register/unregister), the probe-and-reserve name generation, and
/// load-mutate-store updates may not be split by an implementation.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Get-or-create a device by id. When the device exists its stored
    /// record wins and the provided token is discarded; otherwise the
    /// device is created with the next free generated name.
    async fn initialize_device(&self, input: InitializeDeviceInput) -> DomainResult<Device>;

    /// Create a device bound to a user and append it to the user's owned
    /// set, as one unit. Fails if the id is taken or the user is missing.
    async fn register_device_to_user(&self, input: RegisterDeviceInput) -> DomainResult<Device>;

    /// Delete a device and remove it from its owner's set, as one unit.
    /// Fails without touching anything when the asserted owner does not
    /// match.
    async fn unregister_device_from_user(&self, input: UnregisterDeviceInput) -> DomainResult<()>;

    /// Get a device by its external id.
    async fn get_device(&self, device_id: &str) -> DomainResult<Option<Device>>;

    /// Find the device owning the given channel.
    async fn find_device_by_channel(&self, channel_id: &str) -> DomainResult<Option<Device>>;

    /// List all devices owned by a user.
    async fn list_devices_by_user(&self, user_id: &str) -> DomainResult<Vec<Device>>;

    /// Bind the owning user on a device.
    async fn assign_user(&self, input: AssignUserInput) -> DomainResult<Device>;

    /// Rename a device after checking the name is free within the owner
    /// scope.
    async fn rename_device(&self, input: RenameDeviceInput) -> DomainResult<Device>;

    /// Replace the stored token of every device owned by the user; returns
    /// the number of devices rewritten.
    async fn replace_user_device_tokens(&self, user_id: &str, token: &str) -> DomainResult<u64>;

    /// Apply a mutation to one device under the store write lock and return
    /// the updated record.
    async fn update_device(&self, device_id: &str, mutation: DeviceMutation)
        -> DomainResult<Device>;

    /// Same as [`update_device`](Self::update_device), addressing the device
    /// that owns the given channel.
    async fn update_device_by_channel(
        &self,
        channel_id: &str,
        mutation: DeviceMutation,
    ) -> DomainResult<Device>;
}
