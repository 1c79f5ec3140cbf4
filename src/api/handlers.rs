//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{
    host::{ChannelCatalog, ProgramInfo, RecordingStatus, ServiceInfo},
    state::AppState,
    tasks::Command,
    timer::{Decision, SettingsInput},
};
use super::responses::{
    loop_unavailable, rejected, ApiError, ApiResponse, HealthResponse, StatusResponse,
};

/// Body of POST /enable
#[derive(Debug, Default, Deserialize)]
pub struct EnableRequest {
    #[serde(default)]
    pub settings: Option<SettingsInput>,
}

/// Handle POST /enable - Enable the timer, optionally with new settings
pub async fn enable_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EnableRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let result = state
        .request(|reply| Command::Enable { settings: request.settings, reply })
        .await
        .map_err(loop_unavailable)?;

    match result {
        Ok(session) => {
            info!("Enable endpoint called - timer armed");
            Ok(Json(ApiResponse::ok("Timer enabled".to_string(), session)))
        }
        Err(e) => {
            warn!("Failed to enable timer: {}", e);
            Err(rejected(e))
        }
    }
}

/// Handle POST /disable - Disable the timer and drop any pending sleep
pub async fn disable_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, ApiError> {
    let session = state
        .request(|reply| Command::Disable { reply })
        .await
        .map_err(loop_unavailable)?;

    info!("Disable endpoint called - timer disarmed");
    Ok(Json(ApiResponse::ok("Timer disabled".to_string(), session)))
}

/// Handle POST /settings - Replace the timer settings
pub async fn settings_handler(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<SettingsInput>,
) -> Result<Json<ApiResponse>, ApiError> {
    let result = state
        .request(|reply| Command::ApplySettings { settings, reply })
        .await
        .map_err(loop_unavailable)?;

    match result {
        Ok(session) => {
            info!("Settings endpoint called - settings accepted");
            Ok(Json(ApiResponse::ok("Settings accepted".to_string(), session)))
        }
        Err(e) => {
            warn!("Settings rejected: {}", e);
            Err(rejected(e))
        }
    }
}

/// Handle POST /confirm/:decision - Answer the confirmation prompt
pub async fn confirm_handler(
    State(state): State<Arc<AppState>>,
    Path(decision): Path<Decision>,
) -> Result<Json<ApiResponse>, ApiError> {
    let outcome = state
        .request(|reply| Command::Confirm { decision, reply })
        .await
        .map_err(loop_unavailable)?
        .map_err(rejected)?;

    let session = state
        .request(|reply| Command::Status { reply })
        .await
        .map_err(loop_unavailable)?;

    info!("Confirm endpoint called - {:?} resulted in {:?}", decision, outcome);
    Ok(Json(
        ApiResponse::ok(format!("Confirmation answered: {:?}", decision), session).with_outcome(outcome),
    ))
}

/// Handle PUT /viewer/program - Update the currently airing program
pub async fn program_handler(
    State(state): State<Arc<AppState>>,
    Json(program): Json<Option<ProgramInfo>>,
) -> Result<StatusCode, ApiError> {
    state
        .notify(Command::UpdateProgram(program))
        .await
        .map_err(loop_unavailable)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle PUT /viewer/recording - Update the recording status
pub async fn recording_handler(
    State(state): State<Arc<AppState>>,
    Json(status): Json<Option<RecordingStatus>>,
) -> Result<StatusCode, ApiError> {
    state
        .notify(Command::UpdateRecording(status))
        .await
        .map_err(loop_unavailable)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle PUT /viewer/catalog - Replace the channel catalog
pub async fn catalog_handler(
    State(state): State<Arc<AppState>>,
    Json(catalog): Json<ChannelCatalog>,
) -> Result<StatusCode, ApiError> {
    info!("Channel catalog updated with {} drivers", catalog.drivers.len());
    state
        .notify(Command::UpdateCatalog(catalog))
        .await
        .map_err(loop_unavailable)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle GET /drivers - List drivers
pub async fn drivers_handler(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiError> {
    state
        .request(|reply| Command::Drivers { reply })
        .await
        .map(Json)
        .map_err(loop_unavailable)
}

/// Handle GET /drivers/:driver/spaces - List tuning spaces of a driver
pub async fn tuning_spaces_handler(
    State(state): State<Arc<AppState>>,
    Path(driver): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    state
        .request(|reply| Command::TuningSpaces { driver, reply })
        .await
        .map(Json)
        .map_err(loop_unavailable)
}

/// Handle GET /drivers/:driver/spaces/:space/channels - List channels of a tuning space
pub async fn channels_handler(
    State(state): State<Arc<AppState>>,
    Path((driver, space)): Path<(String, usize)>,
) -> Result<Json<Vec<ServiceInfo>>, ApiError> {
    state
        .request(|reply| Command::Channels { driver, space, reply })
        .await
        .map(Json)
        .map_err(loop_unavailable)
}

/// Handle GET /status - Return current timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, ApiError> {
    let session = match state.request(|reply| Command::Status { reply }).await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to get timer status: {}", e);
            return Err(loop_unavailable(e));
        }
    };

    Ok(Json(StatusResponse {
        session,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::create_router,
        host::catalog::{DriverEntry, TuningSpaceEntry},
        state::{ChannelTimer, PluginOptions},
        tasks::{timer_loop_task, ActionRunner, RuntimeHost},
    };
    use axum::{
        body::{to_bytes, Body},
        http::Request,
        Router,
    };
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    fn router(options: PluginOptions) -> Router {
        let catalog = ChannelCatalog {
            drivers: vec![DriverEntry {
                name: "BonDriver_PT-T.dll".to_string(),
                tuning_spaces: vec![TuningSpaceEntry {
                    name: "UHF".to_string(),
                    channels: vec![ServiceInfo {
                        name: "NHK".to_string(),
                        network_id: 32736,
                        service_id: 1024,
                        channel: 27,
                        disabled: false,
                    }],
                }],
            }],
        };
        let (tx, rx) = mpsc::channel(8);
        let session = ChannelTimer::new(RuntimeHost::new(catalog), options);
        let runner = ActionRunner {
            switch_command: None,
            dry_run: true,
            ..ActionRunner::default()
        };
        tokio::spawn(timer_loop_task(session, rx, runner));
        create_router(Arc::new(AppState::new(tx, 0, "127.0.0.1".to_string())))
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const DURATION_SETTINGS: &str = r#"{
        "settings": {
            "condition": "duration",
            "duration_minutes": 5,
            "driver": 0,
            "tuning_space": 0,
            "channel": 0
        }
    }"#;

    #[tokio::test]
    async fn enable_with_settings_arms_timer() {
        let app = router(PluginOptions::default());
        let response = app
            .clone()
            .oneshot(json_request("POST", "/enable", DURATION_SETTINGS))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        let session = &body["session"];
        assert_eq!(session["enabled"], true);
        assert_eq!(session["armed"], true);
        assert_eq!(session["confirmation_pending"], false);
        assert!(session["remaining_seconds"].as_u64().is_some_and(|s| s <= 290));
    }

    #[tokio::test]
    async fn invalid_settings_return_reason() {
        let app = router(PluginOptions::default());
        let response = app
            .oneshot(json_request("POST", "/enable", r#"{ "settings": { "driver": 0 } }"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Select the condition that starts the timer.");
    }

    #[tokio::test]
    async fn confirm_without_prompt_conflicts() {
        let app = router(PluginOptions::default());
        let response = app
            .oneshot(json_request("POST", "/confirm/accept", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn lists_channels_for_driver_and_space() {
        let app = router(PluginOptions::default());
        let response = app
            .oneshot(
                Request::get("/drivers/BonDriver_PT-T.dll/spaces/0/channels")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body[0]["name"], "NHK");
        assert_eq!(body[0]["service_id"], 1024);
    }

    #[tokio::test]
    async fn viewer_updates_are_accepted() {
        let app = router(PluginOptions::default());
        let response = app
            .clone()
            .oneshot(json_request("PUT", "/viewer/recording", r#""recording""#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let program = r#"{
            "event_id": 4321,
            "start_time": "2024-06-01T21:00:00",
            "duration_seconds": 3600,
            "name": "News"
        }"#;
        let response = app
            .oneshot(json_request("PUT", "/viewer/program", program))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
