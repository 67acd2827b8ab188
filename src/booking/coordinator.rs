//! 주문 조정자
//!
//! 다중 슬롯 예약을 하나의 논리적 트랜잭션으로 처리합니다.
//! 검증 → 원장 점유 → 예약 생성 → 원격 결제 주문 생성 순서로 진행하며,
//! 점유 이후 단계가 실패하면 점유 해제와 예약 취소로 완전히 보상한 뒤 오류를 돌려줍니다.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use log::{error, info, warn};
use uuid::Uuid;

use crate::booking::clock::{self, Clock};
use crate::booking::ledger::AvailabilityLedger;
use crate::booking::model::{Booking, BookingStatus, OrderHandle, SlotRequest};
use crate::booking::slot_clock::SlotClock;
use crate::db::models::DATE_FORMAT;
use crate::db::BookingRepository;
use crate::error::{BookingError, BookingResult};
use crate::external::{PaymentGateway, RemoteOrderRequest, TurfCatalog};

/// 주 통화 → 보조 통화 단위 배수
pub const MINOR_UNITS_PER_MAJOR: u64 = 100;

/// 주문 생성 요청
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub user_id: String,
    pub turf_id: String,
    pub slots: Vec<SlotRequest>,
    /// 클라이언트가 계산한 총액 (주 통화 단위)
    pub declared_amount: u64,
}

/// 주문 조정자
pub struct OrderCoordinator {
    ledger: AvailabilityLedger,
    bookings: BookingRepository,
    catalog: Arc<dyn TurfCatalog>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    slot_clock: SlotClock,
    utc_offset: FixedOffset,
    currency: String,
}

impl OrderCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ledger: AvailabilityLedger,
        bookings: BookingRepository,
        catalog: Arc<dyn TurfCatalog>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        slot_clock: SlotClock,
        utc_offset: FixedOffset,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            ledger,
            bookings,
            catalog,
            gateway,
            clock,
            slot_clock,
            utc_offset,
            currency: currency.into(),
        }
    }

    /// 다중 슬롯 주문 생성
    pub async fn create_order(&self, request: CreateOrder) -> BookingResult<OrderHandle> {
        if request.slots.is_empty() {
            return Err(BookingError::InvalidInput("At least one slot is required".to_string()));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = request.slots.iter().find(|slot| !seen.insert(**slot)) {
            return Err(BookingError::InvalidInput(format!(
                "Duplicate slot in request: {} {:02}:00",
                dup.date.format(DATE_FORMAT),
                dup.hour
            )));
        }

        let turf = self
            .catalog
            .get_turf(&request.turf_id)
            .await
            .ok_or_else(|| BookingError::TurfNotFound(request.turf_id.clone()))?;

        // 슬롯 제공 여부는 호출 시점 기준으로 판단
        let now = self.clock.now();
        let local = clock::to_local(now, self.utc_offset);
        if let Some(slot) = request
            .slots
            .iter()
            .find(|slot| !self.slot_clock.is_offerable(slot.date, slot.hour, local))
        {
            return Err(BookingError::InvalidInput(format!(
                "Slot is not offerable: {} {:02}:00",
                slot.date.format(DATE_FORMAT),
                slot.hour
            )));
        }

        let expected_amount = turf.price_per_hour * request.slots.len() as u64;
        if request.declared_amount != expected_amount {
            warn!(
                "금액 불일치: 턴프 {} 선언 {} / 계산 {}",
                turf.id, request.declared_amount, expected_amount
            );
            return Err(BookingError::InvalidInput(format!(
                "Amount mismatch: expected {}, got {}",
                expected_amount, request.declared_amount
            )));
        }

        let order_id = Uuid::new_v4().to_string();

        self.ledger
            .try_reserve_all(&turf.id, &request.slots, &order_id, now)
            .await?;

        let bookings = self.build_bookings(&request, &order_id, turf.price_per_hour, now);
        if let Err(e) = self.bookings.insert_order(&bookings).await {
            error!("예약 저장 실패, 점유 해제: 주문 {} ({})", order_id, e);
            self.compensate(&order_id).await;
            return Err(e.into());
        }

        let remote_request = RemoteOrderRequest {
            amount: expected_amount * MINOR_UNITS_PER_MAJOR,
            currency: self.currency.clone(),
            receipt: format!("receipt_{}", now.timestamp_millis()),
            notes: HashMap::from([
                ("turfId".to_string(), turf.id.clone()),
                ("userId".to_string(), request.user_id.clone()),
                ("slotsCount".to_string(), request.slots.len().to_string()),
                ("orderId".to_string(), order_id.clone()),
            ]),
        };

        let remote = match self.gateway.create_remote_order(remote_request).await {
            Ok(remote) => remote,
            Err(e) => {
                error!("원격 결제 주문 생성 실패, 보상 처리: 주문 {} ({})", order_id, e);
                self.compensate(&order_id).await;
                return Err(match e {
                    downstream @ BookingError::Downstream(_) => downstream,
                    other => BookingError::Downstream(other.to_string()),
                });
            }
        };

        let expected_minor = expected_amount * MINOR_UNITS_PER_MAJOR;
        if remote.amount != expected_minor {
            error!(
                "원격 주문 금액 불일치: 주문 {} (요청 {}, 응답 {})",
                order_id, expected_minor, remote.amount
            );
            self.compensate(&order_id).await;
            return Err(BookingError::Downstream(format!(
                "Remote order amount {} does not match {}",
                remote.amount, expected_minor
            )));
        }

        if let Err(e) = self.bookings.attach_remote_order(&order_id, &remote.id).await {
            error!("원격 주문 연결 실패, 보상 처리: 주문 {} ({})", order_id, e);
            self.compensate(&order_id).await;
            return Err(e.into());
        }

        info!(
            "주문 생성 완료: {} (원격 {}, 턴프 {}, 슬롯 {}개, {} {})",
            order_id,
            remote.id,
            turf.id,
            bookings.len(),
            remote.amount,
            remote.currency
        );

        Ok(OrderHandle {
            remote_order_id: remote.id,
            order_id,
            booking_ids: bookings.into_iter().map(|b| b.booking_id).collect(),
            amount: remote.amount,
            currency: remote.currency,
        })
    }

    fn build_bookings(
        &self,
        request: &CreateOrder,
        order_id: &str,
        price_per_hour: u64,
        now: DateTime<Utc>,
    ) -> Vec<Booking> {
        request
            .slots
            .iter()
            .map(|slot| Booking {
                booking_id: Uuid::new_v4().to_string(),
                turf_id: request.turf_id.clone(),
                date: slot.date,
                hour: slot.hour,
                order_id: order_id.to_string(),
                remote_order_id: None,
                user_id: request.user_id.clone(),
                amount: price_per_hour,
                status: BookingStatus::Pending,
                payment_id: None,
                created_at: now,
                confirmed_at: None,
            })
            .collect()
    }

    /// 보상 처리: 예약 취소(감사용 보존)와 원장 점유 해제를 한 트랜잭션으로
    ///
    /// 실패하면 남은 점유는 대기 예약 정리 작업이 고아 점유로 회수합니다.
    async fn compensate(&self, order_id: &str) {
        if let Err(e) = self.ledger.cancel_order(order_id, None).await {
            error!("보상 처리 실패, 정리 작업에서 회수 예정: 주문 {} ({})", order_id, e);
        }
    }
}
