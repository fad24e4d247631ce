//! Handler模块

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use common::errors::AppError;
use common::middleware::RequestId;
use common::models::webhook::{WebhookRequest, WebhookResponse};
use common::response::ApiResponse;
use crate::state::AppState;

/// 处理对话代理 Webhook 调用
#[utoipa::path(
    post,
    path = "/webhook",
    tag = "webhook",
    request_body = WebhookRequest,
    responses(
        (status = 200, description = "履约响应（查询失败时包含错误块）", body = WebhookResponse),
        (status = 400, description = "未知标签或缺少会话参数"),
        (status = 500, description = "配置或数据库连接失败")
    )
)]
pub async fn fulfill(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(req): Json<WebhookRequest>,
) -> Result<Json<WebhookResponse>, AppError> {
    tracing::debug!(
        payload = %serde_json::to_string(&req).unwrap_or_default(),
        "收到 Webhook 请求"
    );
    req.validate()?;

    let response = state
        .router
        .route(&req.fulfillment_info.tag, &req.session_info)
        .await?;

    tracing::info!(
        request_id = request_id.as_str(),
        tag = %req.fulfillment_info.tag,
        row_count = ?response.session_info.parameter("rowCount"),
        "Webhook 响应已生成"
    );
    Ok(Json(response))
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = ApiResponse<HealthResponse>)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(
        ApiResponse::ok(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            pool_initialized: state.pool_manager.is_initialized(),
        })
        .with_service(state.config.service_name.clone()),
    )
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub pool_initialized: bool,
}
