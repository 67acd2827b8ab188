//! 예약/정산 오류 분류
//!
//! 모든 실패는 단일 요청 범위로 한정되며, 프로세스를 종료시키는 오류는 없습니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use log::error;

use crate::api::models::ErrorResponse;

pub type BookingResult<T> = Result<T, BookingError>;

/// 예약 코어 오류
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// 잘못된 입력 (빈 슬롯 목록, 금액 불일치 등). 원장에 닿기 전에 거부됩니다.
    #[error("{0}")]
    InvalidInput(String),

    #[error("Unauthorized")]
    Unauthenticated,

    #[error("Turf not found: {0}")]
    TurfNotFound(String),

    /// 이미 점유된 슬롯
    #[error("Slot unavailable: {turf_id} {date} {hour:02}:00")]
    SlotUnavailable {
        turf_id: String,
        date: String,
        hour: u32,
    },

    /// 정산 시점에 예약이 더 이상 기대한 상태가 아님
    #[error("Stale or invalid booking reference: {0}")]
    StaleBookingReference(String),

    #[error("Invalid signature")]
    InvalidSignature,

    /// 원격 결제 주문 생성 실패 (재시도 가능)
    #[error("Payment gateway error: {0}")]
    Downstream(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl BookingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::InvalidInput(_) | BookingError::InvalidSignature => StatusCode::BAD_REQUEST,
            BookingError::Unauthenticated => StatusCode::UNAUTHORIZED,
            BookingError::TurfNotFound(_) => StatusCode::NOT_FOUND,
            BookingError::SlotUnavailable { .. } | BookingError::StaleBookingReference(_) => {
                StatusCode::CONFLICT
            }
            BookingError::Downstream(_) => StatusCode::BAD_GATEWAY,
            BookingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 응답 본문의 기계용 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::InvalidInput(_) => "INVALID_INPUT",
            BookingError::Unauthenticated => "UNAUTHORIZED",
            BookingError::TurfNotFound(_) => "TURF_NOT_FOUND",
            BookingError::SlotUnavailable { .. } => "SLOT_UNAVAILABLE",
            BookingError::StaleBookingReference(_) => "STALE_BOOKING_REFERENCE",
            BookingError::InvalidSignature => "INVALID_SIGNATURE",
            BookingError::Downstream(_) => "PAYMENT_GATEWAY_ERROR",
            BookingError::Storage(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            BookingError::Storage(e) => {
                error!("저장소 오류: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(ErrorResponse {
                error: self.code().to_string(),
                message,
            }),
        )
            .into_response()
    }
}
