//! 정산 검증기
//!
//! 결제 콜백 서명을 검증하고, 주문에 속한 예약들을 pending → confirmed 로
//! 정확히 한 번 전이시킵니다. 같은 주문에 대한 호출은 주문 잠금으로 직렬화됩니다.

use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::booking::clock::Clock;
use crate::booking::model::{BookingStatus, SettlementOutcome};
use crate::booking::order_lock::OrderLocks;
use crate::db::BookingRepository;
use crate::error::{BookingError, BookingResult};
use crate::external::PaymentSignature;

/// 결제 콜백
#[derive(Debug, Clone)]
pub struct PaymentCallback {
    pub remote_order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub booking_ids: Vec<String>,
}

/// 정산 검증기
pub struct SettlementVerifier {
    bookings: BookingRepository,
    signature: PaymentSignature,
    locks: Arc<OrderLocks>,
    clock: Arc<dyn Clock>,
}

impl SettlementVerifier {
    pub fn new(
        bookings: BookingRepository,
        signature: PaymentSignature,
        locks: Arc<OrderLocks>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bookings,
            signature,
            locks,
            clock,
        }
    }

    /// 콜백 검증 및 확정
    ///
    /// 서명이 틀리면 아무 것도 변경하지 않습니다. 참조된 예약 중 하나라도 없거나,
    /// 다른 주문/사용자 소속이거나, 취소된 상태라면 전체가 실패하고 역시 변경이 없습니다.
    /// 이미 확정된 예약은 그대로 두므로 같은 콜백의 재전송은 성공으로 끝납니다.
    pub async fn verify(&self, user_id: &str, callback: PaymentCallback) -> BookingResult<SettlementOutcome> {
        if !self
            .signature
            .verify(&callback.remote_order_id, &callback.payment_id, &callback.signature)
        {
            warn!("정산 서명 불일치: 원격 주문 {}", callback.remote_order_id);
            return Err(BookingError::InvalidSignature);
        }

        let booking_ids = dedup_preserving_order(callback.booking_ids);
        if booking_ids.is_empty() {
            return Err(BookingError::InvalidInput("bookingIds is required".to_string()));
        }

        let _guard = self.locks.lock(&callback.remote_order_id).await;

        let stored = self.bookings.find_by_ids(&booking_ids).await?;
        if stored.len() != booking_ids.len() {
            let found: HashSet<&str> = stored.iter().map(|b| b.booking_id.as_str()).collect();
            let missing = booking_ids
                .iter()
                .find(|id| !found.contains(id.as_str()))
                .cloned()
                .unwrap_or_default();
            return Err(BookingError::StaleBookingReference(format!("booking {} not found", missing)));
        }

        for booking in &stored {
            if booking.remote_order_id.as_deref() != Some(callback.remote_order_id.as_str()) {
                return Err(BookingError::StaleBookingReference(format!(
                    "booking {} does not belong to order {}",
                    booking.booking_id, callback.remote_order_id
                )));
            }
            if booking.user_id != user_id {
                return Err(BookingError::StaleBookingReference(format!(
                    "booking {} does not belong to the caller",
                    booking.booking_id
                )));
            }
            if !booking.status.holds_slot() {
                return Err(BookingError::StaleBookingReference(format!(
                    "booking {} is {}",
                    booking.booking_id, booking.status
                )));
            }
        }

        let pending: Vec<String> = stored
            .iter()
            .filter(|b| b.status == BookingStatus::Pending)
            .map(|b| b.booking_id.clone())
            .collect();

        let newly_confirmed = if pending.is_empty() {
            debug!("이미 확정된 주문 재정산: {}", callback.remote_order_id);
            0
        } else {
            let updated = self
                .bookings
                .confirm_pending(&pending, &callback.remote_order_id, &callback.payment_id, self.clock.now())
                .await?;
            if updated as usize != pending.len() {
                // 주문 잠금 밖에서 상태가 바뀐 경우
                return Err(BookingError::StaleBookingReference(format!(
                    "order {} changed during settlement",
                    callback.remote_order_id
                )));
            }
            info!(
                "결제 확정: 원격 주문 {} (결제 {}, 예약 {}개)",
                callback.remote_order_id, callback.payment_id, updated
            );
            updated as usize
        };

        let mut bookings = self.bookings.find_by_ids(&booking_ids).await?;
        bookings.sort_by_key(|b| booking_ids.iter().position(|id| *id == b.booking_id));

        Ok(SettlementOutcome {
            confirmed: bookings.iter().all(|b| b.status == BookingStatus::Confirmed),
            newly_confirmed,
            bookings,
        })
    }
}

fn dedup_preserving_order(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect()
}
