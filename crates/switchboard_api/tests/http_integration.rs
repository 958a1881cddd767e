use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use common::auth::{Argon2PasswordService, JwtAuthTokenProvider, JwtConfig, RequestSigner, StaticApiKey};
use switchboard_api::domain::{ChannelService, DeviceService, UserService};
use switchboard_api::http::{build_router, AppState, Gate};
use switchboard_memstore::MemoryStore;

const API_KEY: &str = "service-key-123";
const SIGNING_SECRET: &[u8] = b"service-signing-secret";
const DEVICE_ID_A: &str = "9f1c6f0e-2d3a-4b5c-8d7e-1f2a3b4c5d6e";
const DEVICE_ID_B: &str = "1a2b3c4d-5e6f-4a0b-9c8d-7e6f5a4b3c2d";

fn test_router() -> Router {
    let store = Arc::new(MemoryStore::new());
    let token_provider = Arc::new(JwtAuthTokenProvider::new(JwtConfig::new(
        "integration-test-secret".to_string(),
        1,
    )));
    let password_service = Arc::new(Argon2PasswordService::new());

    let device_service = Arc::new(DeviceService::new(
        store.clone(),
        store.clone(),
        token_provider.clone(),
    ));
    let channel_service = Arc::new(ChannelService::new(store.clone()));
    let user_service = Arc::new(UserService::new(
        store.clone(),
        store.clone(),
        token_provider.clone(),
        password_service,
    ));
    let gate = Arc::new(Gate::new(
        token_provider,
        store,
        StaticApiKey::new(API_KEY.to_string()),
        RequestSigner::new(SIGNING_SECRET.to_vec()),
    ));

    build_router(AppState {
        device_service,
        channel_service,
        user_service,
        gate,
    })
}

fn signer() -> RequestSigner {
    RequestSigner::new(SIGNING_SECRET.to_vec())
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn bare_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn bearer_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn bearer_json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Register and login a user, returning (user_id, bearer token)
async fn login_user(router: &Router, username: &str) -> (String, String) {
    let (status, _) = send(
        router,
        json_request(
            "POST",
            "/api/register",
            json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "correct-horse-battery",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        router,
        json_request(
            "POST",
            "/api/login",
            json!({ "usernameOrEmail": username, "password": "correct-horse-battery" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    (
        body["_id"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn health_endpoint_is_open() {
    let router = test_router();
    let (status, body) = send(&router, bare_request("GET", "/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn initialize_assigns_sequential_names_and_is_idempotent() {
    let router = test_router();

    let (status, first) = send(
        &router,
        json_request("POST", "/api/devices/initialize", json!({ "deviceId": DEVICE_ID_A })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["name"], "Device 1");
    assert_eq!(first["deviceId"], DEVICE_ID_A);
    let first_token = first["token"].as_str().unwrap().to_string();
    assert!(!first_token.is_empty());

    let (status, second) = send(
        &router,
        json_request("POST", "/api/devices/initialize", json!({ "deviceId": DEVICE_ID_B })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["name"], "Device 2");

    // re-initializing returns the stored record, token included
    let (status, again) = send(
        &router,
        json_request("POST", "/api/devices/initialize", json!({ "deviceId": DEVICE_ID_A })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["name"], "Device 1");
    assert_eq!(again["token"], first_token.as_str());
}

#[tokio::test]
async fn initialize_rejects_malformed_device_id() {
    let router = test_router();
    let (status, body) = send(
        &router,
        json_request("POST", "/api/devices/initialize", json!({ "deviceId": "{not-canonical}" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid device id"));
}

#[tokio::test]
async fn user_routes_require_a_valid_bearer_token() {
    let router = test_router();

    let (status, _) = send(&router, bare_request("GET", "/api/devices?userId=u1")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &router,
        bearer_request("GET", "/api/devices?userId=u1", "garbage-token"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn device_lifecycle_end_to_end() {
    let router = test_router();
    let (user_id, token) = login_user(&router, "alice").await;

    // register a device to the user
    let (status, _) = send(
        &router,
        bearer_request(
            "POST",
            &format!("/api/devices/register?userId={}&deviceId={}", user_id, DEVICE_ID_A),
            &token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // registering the same id again conflicts
    let (status, _) = send(
        &router,
        bearer_request(
            "POST",
            &format!("/api/devices/register?userId={}&deviceId={}", user_id, DEVICE_ID_A),
            &token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // the stored device credential is the caller's bearer token
    let (status, devices) = send(
        &router,
        bearer_request("GET", &format!("/api/devices?userId={}", user_id), &token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(devices.as_array().unwrap().len(), 1);
    assert_eq!(devices[0]["name"], "Device 1");
    assert_eq!(devices[0]["token"], token.as_str());
    assert_eq!(devices[0]["status"], "active");

    // add two channels
    for _ in 0..2 {
        let (status, _) = send(
            &router,
            bearer_request(
                "POST",
                &format!("/api/devices/channels?deviceId={}", DEVICE_ID_A),
                &token,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, devices) = send(
        &router,
        bearer_request("GET", &format!("/api/devices?userId={}", user_id), &token),
    )
    .await;
    let channels = devices[0]["channels"].as_array().unwrap();
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0]["name"], "Channel 1");
    assert_eq!(channels[1]["name"], "Channel 2");
    let channel_1 = channels[0]["id"].as_str().unwrap().to_string();

    // toggle the first channel on
    let (status, toggled) = send(
        &router,
        bearer_request(
            "PUT",
            &format!("/api/devices/channels?deviceId={}&channelId={}", DEVICE_ID_A, channel_1),
            &token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled[0]["status"], true);

    // an active channel cannot be deleted
    let (status, body) = send(
        &router,
        bearer_request(
            "DELETE",
            &format!("/api/devices/channels?deviceId={}&channelId={}", DEVICE_ID_A, channel_1),
            &token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("active channel"));

    // toggling the device inactive cascades every channel off
    let (status, _) = send(
        &router,
        bearer_request(
            "PUT",
            &format!("/api/devices/update-status?deviceId={}", DEVICE_ID_A),
            &token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, devices) = send(
        &router,
        bearer_request("GET", &format!("/api/devices?userId={}", user_id), &token),
    )
    .await;
    assert_eq!(devices[0]["status"], "inactive");
    assert!(devices[0]["channels"]
        .as_array()
        .unwrap()
        .iter()
        .all(|c| c["status"] == false));

    // the channel is off now, so deletion succeeds and names close the gap
    let (status, _) = send(
        &router,
        bearer_request(
            "DELETE",
            &format!("/api/devices/channels?deviceId={}&channelId={}", DEVICE_ID_A, channel_1),
            &token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, devices) = send(
        &router,
        bearer_request("GET", &format!("/api/devices?userId={}", user_id), &token),
    )
    .await;
    let channels = devices[0]["channels"].as_array().unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0]["name"], "Channel 1");
}

#[tokio::test]
async fn unregister_by_non_owner_is_forbidden() {
    let router = test_router();
    let (owner_id, owner_token) = login_user(&router, "owner").await;
    let (intruder_id, intruder_token) = login_user(&router, "intruder").await;

    let (status, _) = send(
        &router,
        bearer_request(
            "POST",
            &format!("/api/devices/register?userId={}&deviceId={}", owner_id, DEVICE_ID_A),
            &owner_token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &router,
        bearer_request(
            "DELETE",
            &format!("/api/devices/unregister?deviceId={}&userId={}", DEVICE_ID_A, intruder_id),
            &intruder_token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // device still listed under the owner
    let (_, devices) = send(
        &router,
        bearer_request("GET", &format!("/api/devices?userId={}", owner_id), &owner_token),
    )
    .await;
    assert_eq!(devices.as_array().unwrap().len(), 1);

    // the owner may unregister
    let (status, _) = send(
        &router,
        bearer_request(
            "DELETE",
            &format!("/api/devices/unregister?deviceId={}&userId={}", DEVICE_ID_A, owner_id),
            &owner_token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn channel_schedule_validation_over_http() {
    let router = test_router();
    let (user_id, token) = login_user(&router, "carol").await;

    send(
        &router,
        bearer_request(
            "POST",
            &format!("/api/devices/register?userId={}&deviceId={}", user_id, DEVICE_ID_A),
            &token,
        ),
    )
    .await;
    send(
        &router,
        bearer_request(
            "POST",
            &format!("/api/devices/channels?deviceId={}", DEVICE_ID_A),
            &token,
        ),
    )
    .await;
    let (_, devices) = send(
        &router,
        bearer_request("GET", &format!("/api/devices?userId={}", user_id), &token),
    )
    .await;
    let channel_id = devices[0]["channels"][0]["id"].as_str().unwrap().to_string();

    // "24:00" is out of range
    let (status, _) = send(
        &router,
        bearer_json_request(
            "POST",
            &format!("/api/devices/channel-set-timeout?channelId={}", channel_id),
            &token,
            json!({ "timeout": "24:00" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // "23:59" is stored verbatim
    let (status, channel) = send(
        &router,
        bearer_json_request(
            "POST",
            &format!("/api/devices/channel-set-timeout?channelId={}", channel_id),
            &token,
            json!({ "timeout": "23:59" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(channel["timeout"]["time"], "23:59");

    // clearing resets to null
    let (status, channel) = send(
        &router,
        bearer_request(
            "PUT",
            &format!("/api/devices/channel-remove-timeout?channelId={}", channel_id),
            &token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(channel["timeout"]["time"], Value::Null);

    // dates before 2023 are rejected
    let (status, _) = send(
        &router,
        bearer_json_request(
            "POST",
            &format!("/api/devices/channel-set-date?channelId={}", channel_id),
            &token,
            json!({ "date": "01/01/2022" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // leap day 2024 is valid and canonical
    let (status, channel) = send(
        &router,
        bearer_json_request(
            "POST",
            &format!("/api/devices/channel-set-date?channelId={}", channel_id),
            &token,
            json!({ "date": "02/29/2024" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(channel["timeout"]["date"], "02/29/2024");
}

#[tokio::test]
async fn service_routes_require_api_key_and_signature() {
    let router = test_router();
    let query = format!("deviceId={}", DEVICE_ID_A);
    let uri = format!("/api/devices/check-activation?{}", query);
    let signature = signer().sign("GET", "/api/devices/check-activation", &query);

    // no credentials at all
    let (status, _) = send(&router, bare_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // key without signature
    let request = Request::builder()
        .method("GET")
        .uri(&uri)
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // signature with a wrong key
    let request = Request::builder()
        .method("GET")
        .uri(&uri)
        .header("x-api-key", "wrong-key")
        .header("x-signature", signature.clone())
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // both valid: unknown devices read as not activated
    let request = Request::builder()
        .method("GET")
        .uri(&uri)
        .header("x-api-key", API_KEY)
        .header("x-signature", signature)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["activated"], false);
}

#[tokio::test]
async fn check_activation_reflects_device_status() {
    let router = test_router();
    send(
        &router,
        json_request("POST", "/api/devices/initialize", json!({ "deviceId": DEVICE_ID_A })),
    )
    .await;

    let query = format!("deviceId={}", DEVICE_ID_A);
    let uri = format!("/api/devices/check-activation?{}", query);
    let signature = signer().sign("GET", "/api/devices/check-activation", &query);

    let request = Request::builder()
        .method("GET")
        .uri(&uri)
        .header("x-api-key", API_KEY)
        .header("x-signature", signature)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["activated"], true);
}

#[tokio::test]
async fn device_facing_routes_use_the_stored_credential() {
    let router = test_router();
    let (_, body) = send(
        &router,
        json_request("POST", "/api/devices/initialize", json!({ "deviceId": DEVICE_ID_A })),
    )
    .await;
    let device_token = body["token"].as_str().unwrap().to_string();

    // a wrong credential is rejected
    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/devices/{}/channels", DEVICE_ID_A))
        .header("authorization", "wrong-token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // the stored credential reads the channel map
    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/devices/{}/channels", DEVICE_ID_A))
        .header("authorization", device_token.clone())
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["channels"].as_object().unwrap().is_empty());

    // and may set the device status explicitly
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/api/devices/{}/status", DEVICE_ID_A))
        .header("authorization", device_token)
        .header("content-type", "application/json")
        .body(Body::from(json!({ "status": "inactive" }).to_string()))
        .unwrap();
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn login_rewrites_device_credentials() {
    let router = test_router();
    let (user_id, token) = login_user(&router, "dave").await;

    send(
        &router,
        bearer_request(
            "POST",
            &format!("/api/devices/register?userId={}&deviceId={}", user_id, DEVICE_ID_A),
            &token,
        ),
    )
    .await;

    // second login mints a fresh token and fans it out
    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/login",
            json!({ "usernameOrEmail": "dave", "password": "correct-horse-battery" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_token = body["token"].as_str().unwrap().to_string();

    let (_, devices) = send(
        &router,
        bearer_request("GET", &format!("/api/devices?userId={}", user_id), &new_token),
    )
    .await;
    assert_eq!(devices[0]["token"], new_token.as_str());
}

#[tokio::test]
async fn register_duplicate_username_conflicts() {
    let router = test_router();
    login_user(&router, "erin").await;

    let (status, _) = send(
        &router,
        json_request(
            "POST",
            "/api/register",
            json!({
                "username": "erin",
                "email": "other@example.com",
                "password": "correct-horse-battery",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn rename_device_and_channel_enforce_scoped_uniqueness() {
    let router = test_router();
    let (user_id, token) = login_user(&router, "frank").await;

    for device_id in [DEVICE_ID_A, DEVICE_ID_B] {
        send(
            &router,
            bearer_request(
                "POST",
                &format!("/api/devices/register?userId={}&deviceId={}", user_id, device_id),
                &token,
            ),
        )
        .await;
    }

    // renaming onto a sibling device's name conflicts
    let (status, _) = send(
        &router,
        bearer_json_request(
            "PUT",
            &format!("/api/devices/update-name?deviceId={}&userId={}", DEVICE_ID_B, user_id),
            &token,
            json!({ "newName": "Device 1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, device) = send(
        &router,
        bearer_json_request(
            "PUT",
            &format!("/api/devices/update-name?deviceId={}&userId={}", DEVICE_ID_B, user_id),
            &token,
            json!({ "newName": "Greenhouse hub" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(device["name"], "Greenhouse hub");

    // channel rename collisions within one device conflict as well
    for _ in 0..2 {
        send(
            &router,
            bearer_request(
                "POST",
                &format!("/api/devices/channels?deviceId={}", DEVICE_ID_A),
                &token,
            ),
        )
        .await;
    }
    let (_, devices) = send(
        &router,
        bearer_request("GET", &format!("/api/devices?userId={}", user_id), &token),
    )
    .await;
    let device_a = devices
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["deviceId"] == DEVICE_ID_A)
        .unwrap();
    let channel_id = device_a["channels"][1]["id"].as_str().unwrap();

    let (status, _) = send(
        &router,
        bearer_json_request(
            "PUT",
            &format!("/api/devices/update-channel-name?channelId={}", channel_id),
            &token,
            json!({ "newName": "Channel 1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
