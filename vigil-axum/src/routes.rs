use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use vigil::{LoginContext, RepositoryProvider, Vigil};

use crate::{
    error::{ApiError, Result},
    extractors::{AdminUser, AuthUser},
    middleware::{AppState, CorrelationId, auth_middleware, correlation_id_middleware},
    types::*,
};

pub fn create_router<R>(vigil: Arc<Vigil<R>>) -> Router
where
    R: RepositoryProvider + 'static,
{
    let state = AppState { vigil };

    let auth_routes: Router<AppState<R>> = Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/refresh", post(refresh_handler))
        .route("/auth/logout", post(logout_handler));

    let risk_routes: Router<AppState<R>> = Router::new()
        .route("/risk/score", get(score_handler))
        .route("/risk/my-score", get(my_score_handler));

    let admin_routes: Router<AppState<R>> = Router::new()
        .route("/admin/top-ips", get(top_ips_handler))
        .route("/admin/events", get(events_handler))
        .route("/admin/blocked-ips", get(blocked_ips_handler))
        .route("/admin/unblock-ip/{ip}", post(unblock_ip_handler))
        .route("/admin/promote/{email}", post(promote_handler));

    Router::new()
        .route("/health", get(health_handler))
        .merge(auth_routes)
        .merge(risk_routes)
        .merge(admin_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<R>,
        ))
        .layer(axum::middleware::from_fn(correlation_id_middleware))
        .with_state(state)
}

async fn health_handler<R>(State(state): State<AppState<R>>) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state.vigil.health_check().await.map_err(ApiError::from)?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn register_handler<R>(
    State(state): State<AppState<R>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let user = state
        .vigil
        .register(&payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

async fn login_handler<R>(
    State(state): State<AppState<R>>,
    connection_info: ConnectionInfo,
    correlation_id: CorrelationId,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let ctx = LoginContext::new(connection_info.ip.unwrap_or_else(|| "unknown".to_string()))
        .with_user_agent(connection_info.user_agent)
        .with_correlation_id(Some(correlation_id.0));

    let pair = state
        .vigil
        .login(&payload.email, &payload.password, &ctx)
        .await?;

    Ok(Json(TokenPairResponse::from(pair)))
}

async fn refresh_handler<R>(
    State(state): State<AppState<R>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let pair = state.vigil.refresh(&payload.refresh_token).await?;

    Ok(Json(TokenPairResponse::from(pair)))
}

async fn logout_handler<R>(
    State(state): State<AppState<R>>,
    Json(payload): Json<LogoutRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state.vigil.logout(&payload.refresh_token).await?;

    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

async fn score_handler<R>(
    State(state): State<AppState<R>>,
    Query(query): Query<ScoreQuery>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let score = state.vigil.score(&query.ip).await?;

    Ok(Json(ScoreResponse { score }))
}

/// Score the caller's own address, derived from the connection.
async fn my_score_handler<R>(
    State(state): State<AppState<R>>,
    _user: AuthUser,
    connection_info: ConnectionInfo,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let ip = connection_info.ip.unwrap_or_else(|| "unknown".to_string());
    let score = state.vigil.score(&ip).await?;

    Ok(Json(ScoreResponse { score }))
}

async fn top_ips_handler<R>(
    State(state): State<AppState<R>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let top = state.vigil.top_ips(20).await?;

    Ok(Json(TopIpsResponse { top }))
}

async fn events_handler<R>(
    State(state): State<AppState<R>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let events = state.vigil.recent_events(50).await?;

    Ok(Json(RiskEventsResponse { events }))
}

async fn blocked_ips_handler<R>(
    State(state): State<AppState<R>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let blocked = state.vigil.list_blocked().await?;

    Ok(Json(BlockedIpsResponse { blocked }))
}

async fn unblock_ip_handler<R>(
    State(state): State<AppState<R>>,
    _admin: AdminUser,
    Path(ip): Path<String>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state.vigil.unblock(&ip).await?;

    Ok(Json(MessageResponse {
        message: format!("Unblocked {ip}"),
    }))
}

async fn promote_handler<R>(
    State(state): State<AppState<R>>,
    _admin: AdminUser,
    Path(email): Path<String>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let user = state.vigil.promote(&email).await?;

    Ok(Json(UserResponse { user }))
}
