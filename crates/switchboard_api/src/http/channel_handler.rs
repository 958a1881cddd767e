use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, Uri};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::domain::{
    AddChannelRequest, ChannelRequest, GetChannelsRequest, RemoveChannelRequest,
    RenameChannelRequest, SetChannelDateRequest, SetChannelTimeRequest, ToggleChannelRequest,
};
use crate::http::error::ApiResult;
use crate::http::gate::{policy, GateRequest};
use crate::http::server::AppState;
use common::domain::{Channel, Device};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdParams {
    pub device_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceChannelParams {
    pub device_id: String,
    pub channel_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelIdParams {
    pub channel_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNameBody {
    pub new_name: String,
}

#[derive(Debug, Deserialize)]
pub struct TimeoutBody {
    pub timeout: String,
}

#[derive(Debug, Deserialize)]
pub struct DateBody {
    pub date: String,
}

/// `{name: status}` object for device- and service-facing channel reads
fn channels_to_map(channels: &[Channel]) -> Map<String, Value> {
    channels
        .iter()
        .map(|channel| (channel.name.clone(), Value::Bool(channel.status)))
        .collect()
}

/// POST /api/devices/channels
pub async fn add_channel(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<DeviceIdParams>,
) -> ApiResult<Json<Value>> {
    state
        .gate
        .authorize(policy::USER, &GateRequest::from_parts(&method, &uri, &headers, None))
        .await?;

    state
        .channel_service
        .add_channel(AddChannelRequest {
            device_id: params.device_id,
        })
        .await?;

    Ok(Json(json!({ "message": "Channel added successfully" })))
}

/// DELETE /api/devices/channels
pub async fn remove_channel(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<DeviceChannelParams>,
) -> ApiResult<Json<Value>> {
    state
        .gate
        .authorize(policy::USER, &GateRequest::from_parts(&method, &uri, &headers, None))
        .await?;

    state
        .channel_service
        .remove_channel(RemoveChannelRequest {
            device_id: params.device_id,
            channel_id: params.channel_id,
        })
        .await?;

    Ok(Json(json!({ "message": "Channel removed successfully" })))
}

/// PUT /api/devices/channels
pub async fn toggle_channel(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<DeviceChannelParams>,
) -> ApiResult<Json<Vec<Channel>>> {
    state
        .gate
        .authorize(policy::USER, &GateRequest::from_parts(&method, &uri, &headers, None))
        .await?;

    let device = state
        .channel_service
        .toggle_channel(ToggleChannelRequest {
            device_id: params.device_id,
            channel_id: params.channel_id,
        })
        .await?;

    Ok(Json(device.channels))
}

/// GET /api/devices/channels (service-facing)
pub async fn read_channels(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<DeviceIdParams>,
) -> ApiResult<Json<Value>> {
    state
        .gate
        .authorize(
            policy::SERVICE,
            &GateRequest::from_parts(&method, &uri, &headers, None),
        )
        .await?;

    let channels = state
        .channel_service
        .get_channels(GetChannelsRequest {
            device_id: params.device_id,
        })
        .await?;

    Ok(Json(json!({ "channels": channels_to_map(&channels) })))
}

/// GET /api/devices/:device_id/channels (device-facing)
pub async fn device_channels(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(device_id): Path<String>,
) -> ApiResult<Json<Value>> {
    state
        .gate
        .authorize(
            policy::DEVICE,
            &GateRequest::from_parts(&method, &uri, &headers, Some(&device_id)),
        )
        .await?;

    let channels = state
        .channel_service
        .get_channels(GetChannelsRequest { device_id })
        .await?;

    Ok(Json(json!({ "channels": channels_to_map(&channels) })))
}

/// PUT /api/devices/update-channel-name
pub async fn update_channel_name(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<ChannelIdParams>,
    Json(body): Json<NewNameBody>,
) -> ApiResult<Json<Device>> {
    state
        .gate
        .authorize(policy::USER, &GateRequest::from_parts(&method, &uri, &headers, None))
        .await?;

    let device = state
        .channel_service
        .rename_channel(RenameChannelRequest {
            channel_id: params.channel_id,
            new_name: body.new_name,
        })
        .await?;

    Ok(Json(device))
}

/// POST /api/devices/channel-set-timeout
pub async fn set_timeout(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<ChannelIdParams>,
    Json(body): Json<TimeoutBody>,
) -> ApiResult<Json<Channel>> {
    state
        .gate
        .authorize(policy::USER, &GateRequest::from_parts(&method, &uri, &headers, None))
        .await?;

    let channel = state
        .channel_service
        .set_timeout(SetChannelTimeRequest {
            channel_id: params.channel_id,
            timeout: body.timeout,
        })
        .await?;

    Ok(Json(channel))
}

/// PUT /api/devices/channel-remove-timeout
pub async fn remove_timeout(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<ChannelIdParams>,
) -> ApiResult<Json<Channel>> {
    state
        .gate
        .authorize(policy::USER, &GateRequest::from_parts(&method, &uri, &headers, None))
        .await?;

    let channel = state
        .channel_service
        .remove_timeout(ChannelRequest {
            channel_id: params.channel_id,
        })
        .await?;

    Ok(Json(channel))
}

/// POST /api/devices/channel-set-date
pub async fn set_date(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<ChannelIdParams>,
    Json(body): Json<DateBody>,
) -> ApiResult<Json<Channel>> {
    state
        .gate
        .authorize(policy::USER, &GateRequest::from_parts(&method, &uri, &headers, None))
        .await?;

    let channel = state
        .channel_service
        .set_date(SetChannelDateRequest {
            channel_id: params.channel_id,
            date: body.date,
        })
        .await?;

    Ok(Json(channel))
}

/// PUT /api/devices/channel-remove-date
pub async fn remove_date(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<ChannelIdParams>,
) -> ApiResult<Json<Channel>> {
    state
        .gate
        .authorize(policy::USER, &GateRequest::from_parts(&method, &uri, &headers, None))
        .await?;

    let channel = state
        .channel_service
        .remove_date(ChannelRequest {
            channel_id: params.channel_id,
        })
        .await?;

    Ok(Json(channel))
}
