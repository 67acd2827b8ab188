use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use log::info;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::create_api_router;
use crate::booking::{BookingServices, SystemClock};
use crate::config::AppConfig;
use crate::db::init_database;
use crate::external::{Identity, InMemoryTurfCatalog, JwtIdentity, RazorpayGateway, TurfCatalog};

/// 서버 상태
#[derive(Clone)]
pub struct ServerState {
    pub services: BookingServices,
    pub catalog: Arc<dyn TurfCatalog>,
    pub identity: Arc<dyn Identity>,
}

/// 미들웨어가 적용된 앱 라우터
pub fn build_app(state: ServerState) -> Router {
    create_api_router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 서버 시작
pub async fn start_server(config: AppConfig) -> Result<()> {
    info!("TurfHub 서버 시작 중...");

    let pool = init_database(&config.database_url, config.db_max_connections)
        .await
        .with_context(|| format!("데이터베이스 초기화 실패: {}", config.database_url))?;

    let catalog: Arc<dyn TurfCatalog> = match &config.turf_catalog_path {
        Some(path) => Arc::new(InMemoryTurfCatalog::from_json_file(path)?),
        None => Arc::new(InMemoryTurfCatalog::seeded()),
    };

    let gateway = Arc::new(RazorpayGateway::new(
        config.razorpay_base_url.clone(),
        config.razorpay_key_id.clone(),
        config.razorpay_key_secret.clone(),
    ));

    let services = BookingServices::new(
        pool,
        catalog.clone(),
        gateway,
        Arc::new(SystemClock),
        config.booking_settings()?,
    );

    // 대기 예약 정리 루프
    tokio::spawn(services.sweeper.clone().run_sweep_loop());

    let state = ServerState {
        services,
        catalog,
        identity: Arc::new(JwtIdentity::new(&config.jwt_secret)),
    };

    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.rest_port))
        .await
        .with_context(|| format!("REST 포트 바인드 실패: {}", config.rest_port))?;

    info!("서버가 성공적으로 시작되었습니다!");
    info!("REST API: http://localhost:{}", config.rest_port);

    axum::serve(listener, app).await.context("REST 서버 오류")?;

    Ok(())
}
