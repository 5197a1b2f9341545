use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log::{error, info};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::device::Device;
use crate::error::Error;

type SharedDevice = Arc<Device>;

/// Routes of the front-end, with the device as shared state.
pub fn router(device: SharedDevice) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ac/on", get(ac_on))
        .route("/ac/off", get(ac_off))
        .route("/ac/status", get(ac_status))
        .with_state(device)
}

/// Start the API
///
/// Receives a TCP listener already bound to the right address and port.
pub async fn start(listener: TcpListener, device: SharedDevice) -> anyhow::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on {}", addr);
    }
    axum::serve(listener, router(device)).await?;
    Ok(())
}

/// Handle `GET /`
///
/// Echoes the configuration that does not need to stay secret
async fn root(State(device): State<SharedDevice>) -> Json<Value> {
    let settings = device.settings();
    Json(json!({
        "ok": true,
        "device": settings.device_id(),
        "region": settings.region_code(),
        "dp_code": settings.dp_code(),
    }))
}

/// Handle `GET /ac/on`
async fn ac_on(State(device): State<SharedDevice>) -> Response {
    switch(&device, true).await
}

/// Handle `GET /ac/off`
async fn ac_off(State(device): State<SharedDevice>) -> Response {
    switch(&device, false).await
}

/// Handle `GET /ac/status`
async fn ac_status(State(device): State<SharedDevice>) -> Response {
    match device.status().await {
        Ok(status) => Json(json!({ "ok": true, "status": status })).into_response(),
        Err(e) => failure("status", e),
    }
}

async fn switch(device: &Device, value: bool) -> Response {
    let action = if value { "on" } else { "off" };
    match device.switch(value).await {
        Ok(response) => {
            Json(json!({ "ok": true, "action": action, "tuya": response })).into_response()
        }
        Err(e) => failure(action, e),
    }
}

fn failure(action: &str, e: Error) -> Response {
    error!("{} failed: {}", action, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "ok": false, "error": e.to_string() })),
    )
        .into_response()
}
