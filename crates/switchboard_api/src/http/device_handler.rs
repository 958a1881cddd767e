use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, Uri};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::{
    AssignUserRequest, CheckActivationRequest, InitializeDeviceRequest, ListDevicesRequest,
    RegisterDeviceRequest, SetDeviceStatusRequest, ToggleDeviceStatusRequest,
    UnregisterDeviceRequest, UpdateDeviceNameRequest,
};
use crate::http::error::ApiResult;
use crate::http::gate::{policy, GateRequest};
use crate::http::server::AppState;
use common::domain::{Device, DeviceStatus};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceParams {
    pub user_id: String,
    pub device_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdParams {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdParams {
    pub device_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNameParams {
    pub device_id: String,
    // accepted for wire compatibility; the uniqueness scope comes from the
    // device's stored owner
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnregisterParams {
    pub device_id: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNameBody {
    pub new_name: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: DeviceStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignUserBody {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeBody {
    pub device_id: String,
}

/// POST /api/devices/register
pub async fn register_device(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<RegisterDeviceParams>,
) -> ApiResult<Json<Value>> {
    let auth = state
        .gate
        .authorize(policy::USER, &GateRequest::from_parts(&method, &uri, &headers, None))
        .await?;

    state
        .device_service
        .register_device(RegisterDeviceRequest {
            user_id: params.user_id,
            device_id: params.device_id,
            bearer_token: auth.bearer_token.unwrap_or_default(),
        })
        .await?;

    Ok(Json(json!({ "message": "Device registered successfully" })))
}

/// GET /api/devices
pub async fn list_devices(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<UserIdParams>,
) -> ApiResult<Json<Vec<Device>>> {
    state
        .gate
        .authorize(policy::USER, &GateRequest::from_parts(&method, &uri, &headers, None))
        .await?;

    let devices = state
        .device_service
        .list_devices(ListDevicesRequest {
            user_id: params.user_id,
        })
        .await?;

    Ok(Json(devices))
}

/// GET /api/devices/filter
pub async fn filter_devices(
    State(state): State<AppState>,
    Query(params): Query<UserIdParams>,
) -> ApiResult<Json<Vec<Device>>> {
    let devices = state
        .device_service
        .filter_devices(ListDevicesRequest {
            user_id: params.user_id,
        })
        .await?;

    Ok(Json(devices))
}

/// PUT /api/devices/update-name
pub async fn update_name(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<UpdateNameParams>,
    Json(body): Json<NewNameBody>,
) -> ApiResult<Json<Device>> {
    state
        .gate
        .authorize(policy::USER, &GateRequest::from_parts(&method, &uri, &headers, None))
        .await?;

    let device = state
        .device_service
        .update_name(UpdateDeviceNameRequest {
            device_id: params.device_id,
            new_name: body.new_name,
        })
        .await?;

    Ok(Json(device))
}

/// PUT /api/devices/update-status
pub async fn update_status(
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
        .device_service
        .toggle_status(ToggleDeviceStatusRequest {
            device_id: params.device_id,
        })
        .await?;

    Ok(Json(json!({ "message": "Device status updated successfully" })))
}

/// PUT /api/devices/:device_id/status (device-facing)
pub async fn set_status(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(device_id): Path<String>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Json<Value>> {
    state
        .gate
        .authorize(
            policy::DEVICE,
            &GateRequest::from_parts(&method, &uri, &headers, Some(&device_id)),
        )
        .await?;

    state
        .device_service
        .set_status(SetDeviceStatusRequest {
            device_id,
            status: body.status,
        })
        .await?;

    Ok(Json(json!({ "message": "Device status updated successfully" })))
}

/// DELETE /api/devices/unregister
pub async fn unregister_device(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<UnregisterParams>,
) -> ApiResult<Json<Value>> {
    state
        .gate
        .authorize(policy::USER, &GateRequest::from_parts(&method, &uri, &headers, None))
        .await?;

    state
        .device_service
        .unregister_device(UnregisterDeviceRequest {
            device_id: params.device_id,
            user_id: params.user_id,
        })
        .await?;

    Ok(Json(json!({ "message": "Device unregistered and removed successfully" })))
}

/// POST /api/devices/:device_id/assign-user
pub async fn assign_user(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Json(body): Json<AssignUserBody>,
) -> ApiResult<Json<Value>> {
    state
        .device_service
        .assign_user(AssignUserRequest {
            device_id,
            user_id: body.user_id,
        })
        .await?;

    Ok(Json(json!({ "message": "User assigned to device successfully" })))
}

/// GET /api/devices/check-activation (service-facing)
pub async fn check_activation(
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

    let activated = state
        .device_service
        .check_activation(CheckActivationRequest {
            device_id: params.device_id,
        })
        .await?;

    Ok(Json(json!({ "activated": activated })))
}

/// POST /api/devices/initialize — idempotent get-or-create
pub async fn initialize_device(
    State(state): State<AppState>,
    Json(body): Json<InitializeBody>,
) -> ApiResult<Json<Value>> {
    let device = state
        .device_service
        .initialize_device(InitializeDeviceRequest {
            device_id: body.device_id,
        })
        .await?;

    Ok(Json(json!({
        "deviceId": device.device_id,
        "token": device.token,
        "name": device.name,
    })))
}
