//! 대기 예약 타임아웃 정리
//!
//! 결제 없이 방치된 주문이 슬롯을 영구히 막지 않도록, 제한 시간을 넘긴
//! pending 예약을 주문 단위로 취소하고 원장 점유를 해제합니다. 예약 없이 남은
//! 오래된 점유도 함께 회수합니다.
//! 주기 실행(백그라운드 루프)과 즉시 실행(`sweep_once`)을 모두 제공합니다.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{debug, error, info};
use tokio::time::{interval, Duration};

use crate::booking::clock::Clock;
use crate::booking::ledger::AvailabilityLedger;
use crate::booking::order_lock::OrderLocks;
use crate::db::BookingRepository;
use crate::error::BookingResult;

/// 정리 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub orders: usize,
    pub bookings: u64,
    pub released_slots: u64,
    pub orphaned_slots: u64,
}

pub struct PendingSweeper {
    bookings: BookingRepository,
    ledger: AvailabilityLedger,
    locks: Arc<OrderLocks>,
    clock: Arc<dyn Clock>,
    /// 대기 허용 시간
    timeout: ChronoDuration,
    /// 주기 실행 간격
    sweep_interval: Duration,
}

impl PendingSweeper {
    pub fn new(
        bookings: BookingRepository,
        ledger: AvailabilityLedger,
        locks: Arc<OrderLocks>,
        clock: Arc<dyn Clock>,
        timeout: ChronoDuration,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            bookings,
            ledger,
            locks,
            clock,
            timeout,
            sweep_interval,
        }
    }

    /// 한 번 정리
    ///
    /// 원격 주문 ID 가 붙은 주문은 정산과 같은 잠금 키(원격 주문 ID)를 사용합니다.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> BookingResult<SweepStats> {
        let cutoff = now - self.timeout;
        let expired = self.bookings.find_expired_pending_orders(cutoff).await?;
        let mut stats = SweepStats::default();

        for order_id in expired {
            let lock_key = self
                .bookings
                .find_by_order(&order_id)
                .await?
                .into_iter()
                .find_map(|b| b.remote_order_id)
                .unwrap_or_else(|| order_id.clone());
            let _guard = self.locks.lock(&lock_key).await;

            let release = self.ledger.cancel_order(&order_id, Some(cutoff)).await?;
            if release.cancelled == 0 {
                debug!("정리 대상이 이미 전이됨: 주문 {}", order_id);
                continue;
            }

            stats.orders += 1;
            stats.bookings += release.cancelled;
            stats.released_slots += release.released;
        }

        // 보상 실패 등으로 예약 없이 남은 점유
        stats.orphaned_slots = self.ledger.reap_orphan_holds(cutoff).await?;

        if stats.orders > 0 || stats.orphaned_slots > 0 {
            info!(
                "🧹 대기 예약 정리: 주문 {}개, 예약 {}개 취소, 슬롯 {}개 해제, 고아 점유 {}개 회수",
                stats.orders, stats.bookings, stats.released_slots, stats.orphaned_slots
            );
        }

        Ok(stats)
    }

    /// 주기 정리 루프 실행 (백그라운드 태스크)
    pub async fn run_sweep_loop(self: Arc<Self>) {
        info!(
            "🚀 대기 예약 정리 루프 시작 (타임아웃: {}초, 간격: {:?})",
            self.timeout.num_seconds(),
            self.sweep_interval
        );

        let mut interval_timer = interval(self.sweep_interval);

        loop {
            interval_timer.tick().await;

            if let Err(e) = self.sweep_once(self.clock.now()).await {
                error!("대기 예약 정리 실패: {}", e);
            }
        }
    }
}
