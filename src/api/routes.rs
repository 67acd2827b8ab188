use axum::{
    routing::{get, post},
    Router,
};

use crate::api::handlers::*;
use crate::server::ServerState;

/// API 라우터 생성
pub fn create_api_router() -> Router<ServerState> {
    Router::new()
        .route("/api", get(api_status))

        // 카탈로그/슬롯 조회 API
        .route("/api/turfs", get(list_turfs))
        .route("/api/turfs/:turf_id", get(get_turf))
        .route("/api/cities", get(list_cities))
        .route("/api/slots/:turf_id", get(get_slots))

        // 예약/결제 API (Bearer 인증)
        .route("/api/bookings", get(list_bookings))
        .route("/api/payment/create-order", post(create_order))
        .route("/api/payment/verify", post(verify_payment))
}
