use common::domain::{Channel, Device, DeviceRepository, DomainError, DomainResult};
use garde::Validate;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Service request for adding a channel to a device
#[derive(Debug, Clone, Validate)]
pub struct AddChannelRequest {
    #[garde(length(min = 1))]
    pub device_id: String,
}

/// Service request for removing a channel from a device
#[derive(Debug, Clone, Validate)]
pub struct RemoveChannelRequest {
    #[garde(length(min = 1))]
    pub device_id: String,
    #[garde(length(min = 1))]
    pub channel_id: String,
}

/// Service request for toggling a channel's on/off state
#[derive(Debug, Clone, Validate)]
pub struct ToggleChannelRequest {
    #[garde(length(min = 1))]
    pub device_id: String,
    #[garde(length(min = 1))]
    pub channel_id: String,
}

/// Service request for renaming a channel
#[derive(Debug, Clone, Validate)]
pub struct RenameChannelRequest {
    #[garde(length(min = 1))]
    pub channel_id: String,
    #[garde(length(min = 1))]
    pub new_name: String,
}

/// Service request for setting a channel's timeout time
#[derive(Debug, Clone, Validate)]
pub struct SetChannelTimeRequest {
    #[garde(length(min = 1))]
    pub channel_id: String,
    #[garde(length(min = 1))]
    pub timeout: String,
}

/// Service request for setting a channel's timeout date
#[derive(Debug, Clone, Validate)]
pub struct SetChannelDateRequest {
    #[garde(length(min = 1))]
    pub channel_id: String,
    #[garde(length(min = 1))]
    pub date: String,
}

/// Service request addressing a channel by id only
#[derive(Debug, Clone, Validate)]
pub struct ChannelRequest {
    #[garde(length(min = 1))]
    pub channel_id: String,
}

/// Service request for reading a device's channels
#[derive(Debug, Clone, Validate)]
pub struct GetChannelsRequest {
    #[garde(length(min = 1))]
    pub device_id: String,
}

/// Domain service for channel lifecycle business logic. Every mutation is
/// routed through the device entity inside one store update, so the
/// numbering and cascade rules hold whatever interleaving requests arrive
/// in.
pub struct ChannelService {
    device_repository: Arc<dyn DeviceRepository>,
}

impl ChannelService {
    pub fn new(device_repository: Arc<dyn DeviceRepository>) -> Self {
        Self { device_repository }
    }

    /// Append a new channel named after its position
    #[instrument(skip(self, request), fields(device_id = %request.device_id))]
    pub async fn add_channel(&self, request: AddChannelRequest) -> DomainResult<Device> {
        common::garde::validate(&request)?;

        let channel_id = xid::new().to_string();
        let device = self
            .device_repository
            .update_device(
                &request.device_id,
                Box::new(move |device| {
                    device.add_channel(channel_id);
                    Ok(())
                }),
            )
            .await?;

        debug!(device_id = %device.device_id, count = device.channels.len(), "channel added");
        Ok(device)
    }

    /// Remove a channel and close the numbering gap. Active channels are
    /// refused.
    #[instrument(skip(self, request), fields(device_id = %request.device_id, channel_id = %request.channel_id))]
    pub async fn remove_channel(&self, request: RemoveChannelRequest) -> DomainResult<Device> {
        common::garde::validate(&request)?;

        let channel_id = request.channel_id.clone();
        let device = self
            .device_repository
            .update_device(
                &request.device_id,
                Box::new(move |device| device.remove_channel(&channel_id)),
            )
            .await?;

        debug!(device_id = %device.device_id, count = device.channels.len(), "channel removed");
        Ok(device)
    }

    /// Flip one channel's on/off state
    #[instrument(skip(self, request), fields(device_id = %request.device_id, channel_id = %request.channel_id))]
    pub async fn toggle_channel(&self, request: ToggleChannelRequest) -> DomainResult<Device> {
        common::garde::validate(&request)?;

        let channel_id = request.channel_id.clone();
        self.device_repository
            .update_device(
                &request.device_id,
                Box::new(move |device| device.toggle_channel(&channel_id).map(|_| ())),
            )
            .await
    }

    /// Rename a channel; the name must be free among its siblings
    #[instrument(skip(self, request), fields(channel_id = %request.channel_id))]
    pub async fn rename_channel(&self, request: RenameChannelRequest) -> DomainResult<Device> {
        common::garde::validate(&request)?;

        let channel_id = request.channel_id.clone();
        let new_name = request.new_name.clone();
        self.device_repository
            .update_device_by_channel(
                &request.channel_id,
                Box::new(move |device| device.rename_channel(&channel_id, &new_name)),
            )
            .await
    }

    /// Set a channel's timeout time (24-hour `HH:MM`)
    #[instrument(skip(self, request), fields(channel_id = %request.channel_id))]
    pub async fn set_timeout(&self, request: SetChannelTimeRequest) -> DomainResult<Channel> {
        common::garde::validate(&request)?;

        let channel_id = request.channel_id.clone();
        let time = request.timeout.clone();
        let device = self
            .device_repository
            .update_device_by_channel(
                &request.channel_id,
                Box::new(move |device| device.set_channel_time(&channel_id, &time)),
            )
            .await?;

        device.channel(&request.channel_id).cloned()
    }

    /// Clear a channel's timeout time
    #[instrument(skip(self, request), fields(channel_id = %request.channel_id))]
    pub async fn remove_timeout(&self, request: ChannelRequest) -> DomainResult<Channel> {
        common::garde::validate(&request)?;

        let channel_id = request.channel_id.clone();
        let device = self
            .device_repository
            .update_device_by_channel(
                &request.channel_id,
                Box::new(move |device| device.clear_channel_time(&channel_id)),
            )
            .await?;

        device.channel(&request.channel_id).cloned()
    }

    /// Set a channel's timeout date (`MM/DD/YYYY`, stored canonicalized)
    #[instrument(skip(self, request), fields(channel_id = %request.channel_id))]
    pub async fn set_date(&self, request: SetChannelDateRequest) -> DomainResult<Channel> {
        common::garde::validate(&request)?;

        let channel_id = request.channel_id.clone();
        let date = request.date.clone();
        let device = self
            .device_repository
            .update_device_by_channel(
                &request.channel_id,
                Box::new(move |device| device.set_channel_date(&channel_id, &date)),
            )
            .await?;

        device.channel(&request.channel_id).cloned()
    }

    /// Clear a channel's timeout date
    #[instrument(skip(self, request), fields(channel_id = %request.channel_id))]
    pub async fn remove_date(&self, request: ChannelRequest) -> DomainResult<Channel> {
        common::garde::validate(&request)?;

        let channel_id = request.channel_id.clone();
        let device = self
            .device_repository
            .update_device_by_channel(
                &request.channel_id,
                Box::new(move |device| device.clear_channel_date(&channel_id)),
            )
            .await?;

        device.channel(&request.channel_id).cloned()
    }

    /// Read a device's channels
    #[instrument(skip(self, request), fields(device_id = %request.device_id))]
    pub async fn get_channels(&self, request: GetChannelsRequest) -> DomainResult<Vec<Channel>> {
        common::garde::validate(&request)?;

        let device = self
            .device_repository
            .get_device(&request.device_id)
            .await?
            .ok_or_else(|| DomainError::DeviceNotFound(request.device_id.clone()))?;

        Ok(device.channels)
    }
}
