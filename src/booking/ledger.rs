//! 가용성 원장
//!
//! (턴프, 날짜, 시각) 단위 점유 상태의 단일 진실 공급원입니다.
//! `slot_holds` 의 기본 키가 키별 직렬화 지점이며, 다중 슬롯 점유는
//! 하나의 트랜잭션 안에서 정렬된 순서로 삽입하여 전부 또는 전무로 처리합니다.

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info, warn};
use sqlx::sqlite::SqlitePool;

use crate::booking::model::SlotRequest;
use crate::db::models::DATE_FORMAT;
use crate::error::{BookingError, BookingResult};

/// 주문 취소 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderRelease {
    pub cancelled: u64,
    pub released: u64,
}

/// 가용성 원장
#[derive(Clone)]
pub struct AvailabilityLedger {
    pool: SqlitePool,
}

impl AvailabilityLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 모든 슬롯을 하나의 단위로 점유 시도
    ///
    /// 하나라도 이미 점유되어 있으면 아무 것도 점유하지 않고 `SlotUnavailable` 을 반환합니다.
    /// 대기하지 않고 즉시 실패합니다.
    pub async fn try_reserve_all(
        &self,
        turf_id: &str,
        slots: &[SlotRequest],
        order_id: &str,
        held_at: DateTime<Utc>,
    ) -> BookingResult<()> {
        let mut ordered: Vec<SlotRequest> = slots.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut tx = self.pool.begin().await?;

        for slot in &ordered {
            let inserted = sqlx::query(
                "INSERT INTO slot_holds (turf_id, slot_date, hour, order_id, held_at)
                 VALUES (?, ?, ?, ?, ?)"
            )
            .bind(turf_id)
            .bind(slot.date.format(DATE_FORMAT).to_string())
            .bind(slot.hour as i64)
            .bind(order_id)
            .bind(held_at.timestamp_millis())
            .execute(&mut *tx)
            .await;

            match inserted {
                Ok(_) => {}
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    tx.rollback().await?;
                    warn!("슬롯 점유 충돌: {} {} {:02}:00 (주문 {})", turf_id, slot.date, slot.hour, order_id);
                    return Err(BookingError::SlotUnavailable {
                        turf_id: turf_id.to_string(),
                        date: slot.date.format(DATE_FORMAT).to_string(),
                        hour: slot.hour,
                    });
                }
                Err(e) => {
                    tx.rollback().await?;
                    return Err(e.into());
                }
            }
        }

        tx.commit().await?;

        debug!("슬롯 {}개 점유 완료: {} (주문 {})", ordered.len(), turf_id, order_id);

        Ok(())
    }

    /// 단일 슬롯 점유 해제
    pub async fn release(&self, turf_id: &str, date: NaiveDate, hour: u32) -> BookingResult<bool> {
        let result = sqlx::query(
            "DELETE FROM slot_holds WHERE turf_id = ? AND slot_date = ? AND hour = ?"
        )
        .bind(turf_id)
        .bind(date.format(DATE_FORMAT).to_string())
        .bind(hour as i64)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 주문 취소와 점유 해제를 하나의 트랜잭션으로 처리
    ///
    /// `created_before` 이전에 생성된 pending 예약만 취소합니다(`None` 이면 전부).
    /// 주문에 pending/confirmed 예약이 하나도 남지 않을 때만 점유를 해제하므로,
    /// 예약 행이 아예 없는 주문(저장 실패)의 점유도 함께 정리됩니다.
    pub async fn cancel_order(
        &self,
        order_id: &str,
        created_before: Option<DateTime<Utc>>,
    ) -> BookingResult<OrderRelease> {
        let cutoff = created_before.map(|t| t.timestamp_millis()).unwrap_or(i64::MAX);
        let mut tx = self.pool.begin().await?;

        let cancelled = sqlx::query(
            "UPDATE bookings SET status = 'cancelled'
             WHERE order_id = ? AND status = 'pending' AND created_at < ?"
        )
        .bind(order_id)
        .bind(cutoff)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let released = sqlx::query(
            "DELETE FROM slot_holds
             WHERE order_id = ?
               AND NOT EXISTS (
                   SELECT 1 FROM bookings
                   WHERE bookings.order_id = ? AND bookings.status IN ('pending', 'confirmed')
               )"
        )
        .bind(order_id)
        .bind(order_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        if cancelled > 0 || released > 0 {
            info!("주문 {} 취소: 예약 {}개, 슬롯 {}개 점유 해제", order_id, cancelled, released);
        }

        Ok(OrderRelease { cancelled, released })
    }

    /// 살아 있는 예약이 없는 오래된 점유 회수
    ///
    /// 보상 처리가 중간에 실패해 남은 점유를 정리합니다. 주문 생성 중인 점유를
    /// 건드리지 않도록 `held_before` 이전에 잡힌 것만 대상입니다.
    pub async fn reap_orphan_holds(&self, held_before: DateTime<Utc>) -> BookingResult<u64> {
        let result = sqlx::query(
            "DELETE FROM slot_holds
             WHERE held_at < ?
               AND NOT EXISTS (
                   SELECT 1 FROM bookings
                   WHERE bookings.order_id = slot_holds.order_id
                     AND bookings.status IN ('pending', 'confirmed')
               )"
        )
        .bind(held_before.timestamp_millis())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            warn!("고아 점유 {}개 회수", result.rows_affected());
        }

        Ok(result.rows_affected())
    }

    pub async fn is_free(&self, turf_id: &str, date: NaiveDate, hour: u32) -> BookingResult<bool> {
        let held: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM slot_holds WHERE turf_id = ? AND slot_date = ? AND hour = ?"
        )
        .bind(turf_id)
        .bind(date.format(DATE_FORMAT).to_string())
        .bind(hour as i64)
        .fetch_optional(&self.pool)
        .await?;

        Ok(held.is_none())
    }

    /// 해당 날짜에 점유된 시각 목록 (오름차순)
    pub async fn held_hours(&self, turf_id: &str, date: NaiveDate) -> BookingResult<Vec<u32>> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT hour FROM slot_holds WHERE turf_id = ? AND slot_date = ? ORDER BY hour ASC"
        )
        .bind(turf_id)
        .bind(date.format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(hour,)| hour as u32).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::model::{Booking, BookingStatus};
    use crate::db::{memory_pool, BookingRepository};
    use chrono::Duration;
    use std::sync::Arc;

    fn slot(hour: u32) -> SlotRequest {
        SlotRequest::new(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(), hour)
    }

    #[tokio::test]
    async fn test_reserve_and_query() {
        let ledger = AvailabilityLedger::new(memory_pool().await);
        let now = Utc::now();

        ledger.try_reserve_all("turf-001", &[slot(12), slot(10)], "o-1", now).await.unwrap();

        assert!(!ledger.is_free("turf-001", slot(10).date, 10).await.unwrap());
        assert!(!ledger.is_free("turf-001", slot(12).date, 12).await.unwrap());
        assert!(ledger.is_free("turf-001", slot(11).date, 11).await.unwrap());
        // 다른 턴프는 독립
        assert!(ledger.is_free("turf-002", slot(10).date, 10).await.unwrap());
        assert_eq!(ledger.held_hours("turf-001", slot(10).date).await.unwrap(), vec![10, 12]);
    }

    #[tokio::test]
    async fn test_partial_conflict_holds_nothing() {
        let ledger = AvailabilityLedger::new(memory_pool().await);
        let now = Utc::now();
        ledger.try_reserve_all("turf-001", &[slot(11)], "o-1", now).await.unwrap();

        let err = ledger
            .try_reserve_all("turf-001", &[slot(10), slot(11), slot(12)], "o-2", now)
            .await
            .unwrap_err();

        match err {
            BookingError::SlotUnavailable { hour, .. } => assert_eq!(hour, 11),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(ledger.is_free("turf-001", slot(10).date, 10).await.unwrap());
        assert!(ledger.is_free("turf-001", slot(12).date, 12).await.unwrap());
        assert_eq!(ledger.held_hours("turf-001", slot(10).date).await.unwrap(), vec![11]);
    }

    fn pending(id: &str, order: &str, hour: u32, created_at: DateTime<Utc>) -> Booking {
        Booking {
            booking_id: id.to_string(),
            turf_id: "turf-001".to_string(),
            date: slot(hour).date,
            hour,
            order_id: order.to_string(),
            remote_order_id: None,
            user_id: "u-1".to_string(),
            amount: 1500,
            status: BookingStatus::Pending,
            payment_id: None,
            created_at,
            confirmed_at: None,
        }
    }

    #[tokio::test]
    async fn test_release_single_and_cancel_order() {
        let pool = memory_pool().await;
        let ledger = AvailabilityLedger::new(pool.clone());
        let repo = BookingRepository::new(pool);
        let now = Utc::now();
        ledger.try_reserve_all("turf-001", &[slot(10), slot(11)], "o-1", now).await.unwrap();
        repo.insert_order(&[pending("b-10", "o-1", 10, now), pending("b-11", "o-1", 11, now)])
            .await
            .unwrap();
        ledger.try_reserve_all("turf-001", &[slot(15)], "o-2", now).await.unwrap();

        assert!(ledger.release("turf-001", slot(15).date, 15).await.unwrap());
        assert!(!ledger.release("turf-001", slot(15).date, 15).await.unwrap());
        assert!(ledger.is_free("turf-001", slot(15).date, 15).await.unwrap());

        let release = ledger.cancel_order("o-1", None).await.unwrap();
        assert_eq!(release, OrderRelease { cancelled: 2, released: 2 });
        assert!(repo.find_by_order("o-1").await.unwrap().iter().all(|b| b.status == BookingStatus::Cancelled));
        assert!(ledger.held_hours("turf-001", slot(10).date).await.unwrap().is_empty());

        // 해제된 슬롯은 다시 점유 가능
        ledger.try_reserve_all("turf-001", &[slot(10), slot(11)], "o-3", now).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_order_respects_cutoff_and_confirmed_rows() {
        let pool = memory_pool().await;
        let ledger = AvailabilityLedger::new(pool.clone());
        let repo = BookingRepository::new(pool);
        let t0 = Utc::now();

        ledger.try_reserve_all("turf-001", &[slot(10)], "o-1", t0).await.unwrap();
        repo.insert_order(&[pending("b-1", "o-1", 10, t0)]).await.unwrap();

        // 컷오프 이후 생성된 예약은 그대로
        let early = ledger.cancel_order("o-1", Some(t0 - Duration::minutes(1))).await.unwrap();
        assert_eq!(early, OrderRelease::default());
        assert!(!ledger.is_free("turf-001", slot(10).date, 10).await.unwrap());

        // 확정된 예약이 있으면 점유 유지
        repo.attach_remote_order("o-1", "order_R1").await.unwrap();
        repo.confirm_pending(&["b-1".to_string()], "order_R1", "pay_1", t0).await.unwrap();
        assert_eq!(ledger.cancel_order("o-1", None).await.unwrap(), OrderRelease::default());
        assert!(!ledger.is_free("turf-001", slot(10).date, 10).await.unwrap());
    }

    #[tokio::test]
    async fn test_reap_orphan_holds_only_touches_old_dead_holds() {
        let pool = memory_pool().await;
        let ledger = AvailabilityLedger::new(pool.clone());
        let repo = BookingRepository::new(pool);
        let t0 = Utc::now();

        // 예약 행 없이 남은 점유, 살아 있는 예약의 점유, 방금 잡힌 점유
        ledger.try_reserve_all("turf-001", &[slot(10)], "o-orphan", t0).await.unwrap();
        ledger.try_reserve_all("turf-001", &[slot(11)], "o-live", t0).await.unwrap();
        repo.insert_order(&[pending("b-11", "o-live", 11, t0)]).await.unwrap();
        ledger
            .try_reserve_all("turf-001", &[slot(12)], "o-fresh", t0 + Duration::minutes(20))
            .await
            .unwrap();

        let reaped = ledger.reap_orphan_holds(t0 + Duration::minutes(15)).await.unwrap();
        assert_eq!(reaped, 1);
        assert_eq!(ledger.held_hours("turf-001", slot(10).date).await.unwrap(), vec![11, 12]);
    }

    #[tokio::test]
    async fn test_concurrent_overlapping_reservations_one_wins() {
        let ledger = Arc::new(AvailabilityLedger::new(memory_pool().await));
        let now = Utc::now();

        let mut handles = Vec::new();
        for i in 0..8 {
            let ledger = ledger.clone();
            // 모든 요청이 11시를 공유
            let slots = vec![slot(10 + (i % 2)), slot(11)];
            handles.push(tokio::spawn(async move {
                ledger.try_reserve_all("turf-001", &slots, &format!("o-{}", i), now).await
            }));
        }

        let mut wins = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => wins += 1,
                Err(BookingError::SlotUnavailable { .. }) => conflicts += 1,
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(conflicts, 7);
        assert!(!ledger.is_free("turf-001", slot(11).date, 11).await.unwrap());
    }
}
