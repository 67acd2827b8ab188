use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::booking::{Booking, EnrichedBooking, SettlementOutcome, SlotAvailability, SlotRequest};
use crate::db::models::DATE_FORMAT;
use crate::error::{BookingError, BookingResult};
use crate::external::Turf;

/// API 상태 응답
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: String,
}

/// 턴프 목록 조회 파라미터
#[derive(Debug, Default, Deserialize)]
pub struct TurfQuery {
    pub city: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TurfListResponse {
    pub turfs: Vec<Turf>,
}

#[derive(Debug, Serialize)]
pub struct TurfResponse {
    pub turf: Turf,
}

#[derive(Debug, Serialize)]
pub struct CityListResponse {
    pub cities: Vec<String>,
}

/// 슬롯 조회 파라미터 (date 생략 시 현지 오늘)
#[derive(Debug, Default, Deserialize)]
pub struct SlotQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SlotListResponse {
    pub date: String,
    pub slots: Vec<SlotAvailability>,
}

/// 예약 목록 페이지 파라미터
#[derive(Debug, Default, Deserialize)]
pub struct BookingQuery {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct BookingListResponse {
    pub bookings: Vec<EnrichedBooking>,
}

/// 요청 슬롯
///
/// `date`(YYYY-MM-DD) + `hour` 또는 슬롯 조회가 돌려준 `slotId`(slot-YYYY-MM-DD-H)로 지정합니다.
/// 둘 다 주어지면 서로 일치해야 합니다.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
}

pub fn parse_date(raw: &str) -> BookingResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| BookingError::InvalidInput(format!("Invalid date: {}", raw)))
}

fn parse_slot_id(raw: &str) -> BookingResult<SlotRequest> {
    let invalid = || BookingError::InvalidInput(format!("Invalid slotId: {}", raw));
    let (date, hour) = raw
        .trim()
        .strip_prefix("slot-")
        .and_then(|rest| rest.rsplit_once('-'))
        .ok_or_else(invalid)?;
    let date = NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| invalid())?;
    let hour = hour.parse::<u32>().map_err(|_| invalid())?;
    Ok(SlotRequest::new(date, hour))
}

impl SlotInput {
    pub fn to_slot_request(&self) -> BookingResult<SlotRequest> {
        let from_id = self.slot_id.as_deref().map(parse_slot_id).transpose()?;

        let date = match (self.date.as_deref(), from_id) {
            (Some(raw), _) => parse_date(raw)?,
            (None, Some(slot)) => slot.date,
            (None, None) => return Err(BookingError::InvalidInput("Slot date is required".to_string())),
        };
        let hour = match (self.hour, from_id) {
            (Some(hour), _) => hour,
            (None, Some(slot)) => slot.hour,
            (None, None) => {
                return Err(BookingError::InvalidInput("Slot hour or slotId is required".to_string()))
            }
        };

        let slot = SlotRequest::new(date, hour);
        if from_id.is_some_and(|id_slot| id_slot != slot) {
            return Err(BookingError::InvalidInput(format!(
                "slotId {} does not match date/hour",
                self.slot_id.as_deref().unwrap_or_default()
            )));
        }
        Ok(slot)
    }
}

/// 주문 생성 요청
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub turf_id: String,
    pub slots: Vec<SlotInput>,
    /// 주 통화 단위 총액
    pub amount: u64,
}

/// 주문 생성 응답
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: String,
    /// 보조 통화 단위 금액
    pub amount: u64,
    pub currency: String,
    pub booking_ids: Vec<String>,
}

/// 단일 ID 또는 ID 배열
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum BookingIdsInput {
    One(String),
    Many(Vec<String>),
}

impl BookingIdsInput {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            BookingIdsInput::One(id) => vec![id],
            BookingIdsInput::Many(ids) => ids,
        }
    }
}

/// 결제 검증 요청 (게이트웨이 필드명 유지)
#[derive(Debug, Deserialize, Serialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    #[serde(rename = "bookingIds")]
    pub booking_ids: BookingIdsInput,
}

/// 결제 검증 응답
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub confirmed: bool,
    /// 이번 호출에서 확정된 예약 수
    pub newly_confirmed: usize,
    pub bookings: Vec<Booking>,
}

impl From<SettlementOutcome> for VerifyPaymentResponse {
    fn from(outcome: SettlementOutcome) -> Self {
        Self {
            success: true,
            confirmed: outcome.confirmed,
            newly_confirmed: outcome.newly_confirmed,
            bookings: outcome.bookings,
        }
    }
}

/// API 오류 응답
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_ids_accept_scalar_or_list() {
        let one: VerifyPaymentRequest = serde_json::from_str(
            r#"{"razorpay_order_id":"o","razorpay_payment_id":"p","razorpay_signature":"s","bookingIds":"b-1"}"#,
        )
        .unwrap();
        assert_eq!(one.booking_ids.into_vec(), vec!["b-1".to_string()]);

        let many: VerifyPaymentRequest = serde_json::from_str(
            r#"{"razorpay_order_id":"o","razorpay_payment_id":"p","razorpay_signature":"s","bookingIds":["b-1","b-2"]}"#,
        )
        .unwrap();
        assert_eq!(many.booking_ids.into_vec(), vec!["b-1".to_string(), "b-2".to_string()]);
    }

    #[test]
    fn test_create_order_request_is_camel_case() {
        let req: CreateOrderRequest = serde_json::from_str(
            r#"{"turfId":"turf-001","slots":[{"date":"2026-10-17","hour":10}],"amount":1500}"#,
        )
        .unwrap();
        assert_eq!(req.turf_id, "turf-001");
        assert_eq!(req.slots[0].hour, Some(10));
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_slot_input_accepts_slot_id_or_date_hour() {
        let by_fields = SlotInput {
            date: Some("2026-10-17".into()),
            hour: Some(10),
            ..SlotInput::default()
        };
        assert_eq!(by_fields.to_slot_request().unwrap(), SlotRequest::new(day(17), 10));

        let by_id = SlotInput {
            slot_id: Some("slot-2026-10-17-9".into()),
            date: Some("2026-10-17".into()),
            ..SlotInput::default()
        };
        assert_eq!(by_id.to_slot_request().unwrap(), SlotRequest::new(day(17), 9));

        let id_only = SlotInput {
            slot_id: Some("slot-2026-10-18-22".into()),
            ..SlotInput::default()
        };
        assert_eq!(id_only.to_slot_request().unwrap(), SlotRequest::new(day(18), 22));
    }

    #[test]
    fn test_slot_input_rejects_malformed_or_conflicting() {
        let cases = [
            SlotInput { slot_id: Some("slot-2026-10-17".into()), ..SlotInput::default() },
            SlotInput { slot_id: Some("2026-10-17-10".into()), ..SlotInput::default() },
            SlotInput { slot_id: Some("slot-2026-13-01-10".into()), ..SlotInput::default() },
            SlotInput { date: Some("2026-10-17".into()), ..SlotInput::default() },
            SlotInput { hour: Some(10), ..SlotInput::default() },
            SlotInput {
                slot_id: Some("slot-2026-10-17-10".into()),
                date: Some("2026-10-17".into()),
                hour: Some(11),
            },
            SlotInput {
                slot_id: Some("slot-2026-10-17-10".into()),
                date: Some("2026-10-18".into()),
                hour: None,
            },
        ];
        for input in cases {
            assert!(
                matches!(input.to_slot_request(), Err(BookingError::InvalidInput(_))),
                "{:?}",
                input
            );
        }
    }
}
