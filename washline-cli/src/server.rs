use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;

use washline_core::client::AllocationClient;
use washline_core::config::PoolConfig;
use washline_core::error::AllocationError;
use washline_core::service::SubmitOutcome;

use crate::handlers::*;
use crate::reconciler::spawn_reconcile_task;

/// One allocator, one lock. Every handler runs read-clock, reconcile and act
/// under a single acquisition.
pub type SharedClient = Arc<Mutex<AllocationClient>>;

#[derive(Clone)]
pub struct AppState {
    pub client: SharedClient,
    pub time: TimeFormatter,
}

pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    pub pool: PoolConfig,
    pub utc_offset_minutes: i32,
    /// Background reconciliation period. `None` keeps expiry purely lazy.
    pub reconcile_interval: Option<Duration>,
    pub max_concurrent_requests: usize,
}

pub async fn run(config: ServeConfig) -> anyhow::Result<()> {
    config.pool.validate().map_err(anyhow::Error::msg)?;
    let time = TimeFormatter::new(config.utc_offset_minutes).map_err(anyhow::Error::msg)?;

    let client: SharedClient = Arc::new(Mutex::new(AllocationClient::new(&config.pool)));
    let state = AppState {
        client: Arc::clone(&client),
        time,
    };

    let reconciler = config
        .reconcile_interval
        .map(|every| spawn_reconcile_task(Arc::clone(&client), every));

    let app = router(state).layer(ConcurrencyLimitLayer::new(config.max_concurrent_requests));

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!(
        machines = config.pool.machines,
        utc_offset_minutes = config.utc_offset_minutes,
        "🧺 washline server starting on http://{}",
        addr
    );
    if reconciler.is_none() {
        tracing::info!("Background reconciliation disabled; expiry is checked on each request");
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(token) = reconciler {
        token.cancel();
    }
    tracing::info!("washline server stopped");
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/assign_machine", post(assign_machine))
        .route("/status", get(pool_status))
        .route("/user_status", get(user_status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

// ─── Handlers ───────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let client = state.client.lock().await;
    let svc = client.service();
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        machines: svc.capacity(),
        active: svc.active_count(),
        queued: svc.queued_count(),
        completed: svc.completed_count(),
    }))
}

async fn assign_machine(
    State(state): State<AppState>,
    Json(req): Json<AssignMachineRequest>,
) -> (StatusCode, Json<ApiResponse<AssignMachineResponse>>) {
    if let Err(e) = req.validate() {
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::err(e)));
    }
    let user_name = req.user_name.trim();

    let mut client = state.client.lock().await;
    match client.submit(user_name, req.wash_time) {
        Ok((outcome, _)) => {
            let code = match &outcome {
                SubmitOutcome::Assigned { .. } => StatusCode::CREATED,
                SubmitOutcome::Queued { .. } => StatusCode::ACCEPTED,
            };
            (
                code,
                Json(ApiResponse::ok(AssignMachineResponse::from_outcome(
                    user_name,
                    &outcome,
                    &state.time,
                ))),
            )
        }
        Err(e @ AllocationError::AlreadyActive { .. }) => {
            tracing::warn!(user_name, "Duplicate submission rejected");
            (StatusCode::CONFLICT, Json(ApiResponse::err(e.to_string())))
        }
        Err(e) => (StatusCode::BAD_REQUEST, Json(ApiResponse::err(e.to_string()))),
    }
}

async fn pool_status(State(state): State<AppState>) -> Json<ApiResponse<StatusResponse>> {
    let mut client = state.client.lock().await;
    let (view, _) = client.pool_status();
    Json(ApiResponse::ok(StatusResponse::from_view(&view, &state.time)))
}

async fn user_status(
    State(state): State<AppState>,
    Query(query): Query<UserStatusQuery>,
) -> (StatusCode, Json<ApiResponse<UserStatusResponse>>) {
    let user_name = query.user_name.trim();
    if user_name.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::err("user_name is required")),
        );
    }

    let mut client = state.client.lock().await;
    let (status, _) = client.requester_status(user_name);
    (
        StatusCode::OK,
        Json(ApiResponse::ok(UserStatusResponse::from_status(&status, &state.time))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;
    use washline_core::clock::ManualClock;

    // 2023-11-14 22:13:20 UTC, 03:43 AM at +05:30
    const T0: u64 = 1_700_000_000_000;

    fn test_app(machines: usize) -> (Router, ManualClock) {
        let clock = ManualClock::new(T0);
        let client = AllocationClient::with_clock(&PoolConfig::new(machines), clock.clone());
        let state = AppState {
            client: Arc::new(Mutex::new(client)),
            time: TimeFormatter::new(330).unwrap(),
        };
        (router(state), clock)
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn assign(user: &str, minutes: u32) -> Request<Body> {
        Request::post("/assign_machine")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({ "user_name": user, "wash_time": minutes }).to_string(),
            ))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_assign_then_queue() {
        let (app, _clock) = test_app(1);

        let (code, body) = send(&app, assign("alice", 10)).await;
        assert_eq!(code, StatusCode::CREATED);
        assert_eq!(
            body["data"]["message"],
            "Assigned machine 1 to user alice for 10 minutes from 03:43 AM"
        );

        let (code, body) = send(&app, assign("bob", 5)).await;
        assert_eq!(code, StatusCode::ACCEPTED);
        assert_eq!(body["data"]["message"], "Added to queue. Waiting time is 10 minutes");

        let (_, body) = send(&app, assign("carol", 5)).await;
        assert_eq!(body["data"]["message"], "Added to queue");
    }

    #[tokio::test]
    async fn test_rejects_invalid_and_duplicate() {
        let (app, _clock) = test_app(1);

        let (code, _) = send(&app, assign("", 10)).await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        let (code, _) = send(&app, assign("alice", 0)).await;
        assert_eq!(code, StatusCode::BAD_REQUEST);

        send(&app, assign("alice", 10)).await;
        let (code, body) = send(&app, assign("alice", 10)).await;
        assert_eq!(code, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_status_promotes_after_expiry() {
        let (app, clock) = test_app(1);
        send(&app, assign("alice", 10)).await;
        send(&app, assign("bob", 5)).await;

        let (_, body) = send(&app, get_req("/status")).await;
        assert_eq!(body["data"]["machines"][0]["user_name"], "alice");
        assert_eq!(body["data"]["queue"][0]["user_name"], "bob");
        assert_eq!(body["data"]["queue"][0]["waiting_time"], 10);
        assert_eq!(body["data"]["queue"][0]["machine_available_at"], "03:53 AM");

        clock.advance_minutes(11);
        let (_, body) = send(&app, get_req("/status")).await;
        assert_eq!(body["data"]["machines"][0]["user_name"], "bob");
        assert_eq!(body["data"]["queue"].as_array().map(|q| q.len()), Some(0));

        let (_, body) = send(&app, get_req("/user_status?user_name=alice")).await;
        assert_eq!(body["data"]["status"], "completed");
        assert_eq!(body["data"]["message"], "Wash successful. Pick up your clothes");
    }

    #[tokio::test]
    async fn test_user_status_variants() {
        let (app, _clock) = test_app(1);
        send(&app, assign("alice", 10)).await;
        send(&app, assign("bob", 5)).await;
        send(&app, assign("carol", 5)).await;

        let (_, body) = send(&app, get_req("/user_status?user_name=alice")).await;
        assert_eq!(body["data"]["message"], "You are assigned to machine 1");
        assert_eq!(body["data"]["assigned_at"], "03:43 AM");

        let (_, body) = send(&app, get_req("/user_status?user_name=bob")).await;
        assert_eq!(body["data"]["position"], 1);
        assert_eq!(body["data"]["waiting_time"], 10);

        let (_, body) = send(&app, get_req("/user_status?user_name=carol")).await;
        assert_eq!(body["data"]["message"], "You are in Queue position 2");
        assert!(body["data"].get("waiting_time").is_none());

        let (_, body) = send(&app, get_req("/user_status?user_name=dave")).await;
        assert_eq!(body["data"]["status"], "not_found");

        let (code, _) = send(&app, get_req("/user_status")).await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_user_name_is_trimmed_on_submit_and_lookup() {
        let (app, _clock) = test_app(1);
        let (code, _) = send(&app, assign(" alice ", 10)).await;
        assert_eq!(code, StatusCode::CREATED);

        let (_, body) = send(&app, get_req("/user_status?user_name=%20alice")).await;
        assert_eq!(body["data"]["status"], "assigned");
        assert_eq!(body["data"]["user_name"], "alice");

        let (_, body) = send(&app, get_req("/user_status?user_name=alice")).await;
        assert_eq!(body["data"]["status"], "assigned");

        let (code, _) = send(&app, get_req("/user_status?user_name=%20%20")).await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_reports_counts() {
        let (app, _clock) = test_app(2);
        send(&app, assign("alice", 10)).await;

        let (code, body) = send(&app, get_req("/health")).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["data"]["machines"], 2);
        assert_eq!(body["data"]["active"], 1);
        assert_eq!(body["data"]["queued"], 0);
    }
}
