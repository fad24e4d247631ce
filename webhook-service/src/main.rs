//! 对话代理 AlloyDB 查询 Webhook 服务
//!
//! 根据 Webhook 标签选择执行策略：
//! - static: 原样执行会话参数中的 SQL
//! - parameterized: 以搜索短语执行向量相似度查询
//! - natural: 调用数据库自然语言转 SQL 函数并返回生成的 SQL

mod executor;
mod formatter;
mod handlers;
mod pg_value;
mod pool_manager;
mod response_builder;
mod routes;
mod state;
mod strategy;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::Context;
use axum::{middleware, routing::get, Json, Router};
use common::config::{AppConfig, DatabaseSettings};
use common::middleware::request_id::request_id_middleware;
use pool_manager::PgConnector;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "webhook-service";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AlloyDB Webhook API",
        version = "0.1.0",
        description = "对话代理 AlloyDB 查询 Webhook"
    ),
    paths(
        handlers::fulfill,
        handlers::health_check,
    ),
    components(schemas(
        common::models::WebhookRequest,
        common::models::WebhookResponse,
        common::models::RichContentBlock,
        common::models::RichText,
        handlers::HealthResponse,
    )),
    tags(
        (name = "webhook", description = "Webhook 履约端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    // 加载配置（缺少必需项时直接退出）
    let config = AppConfig::load_with_service(SERVICE_NAME);
    let settings = DatabaseSettings::from_env().context("加载数据库配置失败")?;
    info!(instance = %settings.instance_uri(), "数据库实例");

    // 连接池在首次请求时创建
    let connector = Arc::new(PgConnector::new(&config));
    let state = AppState::new(config.clone(), settings, connector);

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!(service = SERVICE_NAME, address = %addr, "启动服务");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {}", addr))?;
    axum::serve(listener, app).await.context("服务启动失败")?;
    Ok(())
}

/// `RUST_LOG` selects the filter; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(filter)
            .init();
    }
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
