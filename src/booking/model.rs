//! 예약 코어의 기본 모델
//!
//! 예약(Booking), 예약 상태, 슬롯 요청, 원격 결제 주문 핸들 등
//! 예약/정산 흐름 전반에서 쓰이는 데이터 모델을 정의합니다.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 예약 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// 결제 대기 (원장 점유 중)
    Pending,
    /// 결제 확정
    Confirmed,
    /// 취소 (타임아웃 또는 보상 처리)
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// 원장 점유를 유지하는 상태인지
    pub fn holds_slot(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 예약할 슬롯 (날짜 + 시작 시각)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotRequest {
    pub date: NaiveDate,
    pub hour: u32,
}

impl SlotRequest {
    pub fn new(date: NaiveDate, hour: u32) -> Self {
        Self { date, hour }
    }
}

/// 예약 정보
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// 예약 고유 ID
    pub booking_id: String,
    pub turf_id: String,
    pub date: NaiveDate,
    pub hour: u32,
    /// 한 요청에서 함께 생성된 예약들이 공유하는 주문 ID
    pub order_id: String,
    /// 결제 게이트웨이 주문 ID (원격 주문 생성 전에는 없음)
    pub remote_order_id: Option<String>,
    pub user_id: String,
    /// 슬롯 가격 (주 통화 단위)
    pub amount: u64,
    pub status: BookingStatus,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// 결제 게이트웨이가 돌려준 원격 주문
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOrder {
    pub id: String,
    /// 보조 통화 단위 금액 (예: 파이사)
    pub amount: u64,
    pub currency: String,
}

/// 주문 생성 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderHandle {
    pub remote_order_id: String,
    pub order_id: String,
    /// 요청 슬롯 순서와 동일한 순서
    pub booking_ids: Vec<String>,
    /// 보조 통화 단위 금액
    pub amount: u64,
    pub currency: String,
}

/// 정산 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementOutcome {
    pub confirmed: bool,
    /// 이번 호출에서 pending → confirmed 로 전이된 예약 수
    pub newly_confirmed: usize,
    pub bookings: Vec<Booking>,
}

/// 턴프 메타데이터가 결합된 예약 (조회용)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedBooking {
    #[serde(flatten)]
    pub booking: Booking,
    pub turf_details: Option<TurfDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurfDetails {
    pub name: String,
    pub location: String,
    pub city: String,
}

/// 슬롯 조회 결과 한 줄
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    pub slot_id: String,
    pub hour: u32,
    pub time: String,
    pub end_time: String,
    pub available: bool,
}

impl SlotAvailability {
    pub fn new(date: NaiveDate, hour: u32, available: bool) -> Self {
        Self {
            slot_id: format!("slot-{}-{}", date.format("%Y-%m-%d"), hour),
            hour,
            time: format!("{:02}:00", hour),
            end_time: format!("{:02}:00", hour + 1),
            available,
        }
    }
}
