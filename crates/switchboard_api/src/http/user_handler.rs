use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::LoginUserInput;
use crate::http::error::ApiResult;
use crate::http::server::AppState;
use common::domain::RegisterUserInput;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody {
    pub username_or_email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterUserBody {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> ApiResult<Json<Value>> {
    let output = state
        .user_service
        .login_user(LoginUserInput {
            username_or_email: body.username_or_email,
            password: body.password,
        })
        .await?;

    debug!(user_id = %output.user_id, "login succeeded");

    Ok(Json(json!({ "token": output.token, "_id": output.user_id })))
}

/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterUserBody>,
) -> ApiResult<Json<Value>> {
    state
        .user_service
        .register_user(RegisterUserInput {
            username: body.username,
            email: body.email,
            password: body.password,
        })
        .await?;

    Ok(Json(json!({ "message": "User registered successfully" })))
}
