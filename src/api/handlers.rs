use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use log::debug;

use crate::api::auth::AuthUser;
use crate::api::extract::ApiJson;
use crate::api::models::*;
use crate::booking::{CreateOrder, Page, PaymentCallback};
use crate::db::models::DATE_FORMAT;
use crate::error::{BookingError, BookingResult};
use crate::server::ServerState;

/// 상태 확인 핸들러
pub async fn api_status() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "TurfHub API is running!".to_string(),
    })
}

/// 턴프 목록 조회 핸들러 (city 필터, "All" 은 전체)
pub async fn list_turfs(
    State(state): State<ServerState>,
    Query(params): Query<TurfQuery>,
) -> Json<TurfListResponse> {
    let turfs = state.catalog.list_turfs(params.city.as_deref()).await;
    Json(TurfListResponse { turfs })
}

/// 턴프 단건 조회 핸들러
pub async fn get_turf(
    State(state): State<ServerState>,
    Path(turf_id): Path<String>,
) -> BookingResult<Json<TurfResponse>> {
    let turf = state
        .catalog
        .get_turf(&turf_id)
        .await
        .ok_or(BookingError::TurfNotFound(turf_id))?;
    Ok(Json(TurfResponse { turf }))
}

/// 도시 목록 조회 핸들러
pub async fn list_cities(State(state): State<ServerState>) -> Json<CityListResponse> {
    Json(CityListResponse {
        cities: state.catalog.cities().await,
    })
}

/// 슬롯 조회 핸들러
pub async fn get_slots(
    State(state): State<ServerState>,
    Path(turf_id): Path<String>,
    Query(params): Query<SlotQuery>,
) -> BookingResult<Json<SlotListResponse>> {
    let now = state.services.local_now();
    let date = match params.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => now.date(),
    };

    let slots = state.services.slot_board.available_slots(&turf_id, date, now).await?;

    Ok(Json(SlotListResponse {
        date: date.format(DATE_FORMAT).to_string(),
        slots,
    }))
}

/// 내 예약 목록 조회 핸들러
pub async fn list_bookings(
    State(state): State<ServerState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<BookingQuery>,
) -> BookingResult<Json<BookingListResponse>> {
    let page = Page::new(params.offset, params.limit);
    let bookings = state.services.read_model.list_bookings(&user_id, page).await?;
    Ok(Json(BookingListResponse { bookings }))
}

/// 결제 주문 생성 핸들러
pub async fn create_order(
    State(state): State<ServerState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<CreateOrderRequest>,
) -> BookingResult<Json<CreateOrderResponse>> {
    let slots = payload
        .slots
        .iter()
        .map(SlotInput::to_slot_request)
        .collect::<BookingResult<Vec<_>>>()?;

    debug!("주문 생성 요청: 사용자 {} 턴프 {} 슬롯 {}개", user_id, payload.turf_id, slots.len());

    let handle = state
        .services
        .coordinator
        .create_order(CreateOrder {
            user_id,
            turf_id: payload.turf_id,
            slots,
            declared_amount: payload.amount,
        })
        .await?;

    Ok(Json(CreateOrderResponse {
        order_id: handle.remote_order_id,
        amount: handle.amount,
        currency: handle.currency,
        booking_ids: handle.booking_ids,
    }))
}

/// 결제 검증 핸들러
pub async fn verify_payment(
    State(state): State<ServerState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<VerifyPaymentRequest>,
) -> BookingResult<Json<VerifyPaymentResponse>> {
    let outcome = state
        .services
        .verifier
        .verify(
            &user_id,
            PaymentCallback {
                remote_order_id: payload.razorpay_order_id,
                payment_id: payload.razorpay_payment_id,
                signature: payload.razorpay_signature,
                booking_ids: payload.booking_ids.into_vec(),
            },
        )
        .await?;

    Ok(Json(outcome.into()))
}
