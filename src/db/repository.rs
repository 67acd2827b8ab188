use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::{Error as SqlxError, QueryBuilder, Sqlite};

use super::models::BookingRecord;
use crate::booking::model::{Booking, BookingStatus};

const BOOKING_COLUMNS: &str = "booking_id, turf_id, slot_date, hour, order_id, remote_order_id, user_id, \
                               amount, status, payment_id, created_at, confirmed_at";

/// 예약 저장소
#[derive(Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 한 주문의 예약들을 하나의 트랜잭션으로 저장 (전부 또는 전무)
    pub async fn insert_order(&self, bookings: &[Booking]) -> Result<(), SqlxError> {
        let mut tx = self.pool.begin().await?;

        for booking in bookings {
            let record = BookingRecord::from_booking(booking);
            sqlx::query(
                "INSERT INTO bookings
                 (booking_id, turf_id, slot_date, hour, order_id, remote_order_id, user_id, amount, status, payment_id, created_at, confirmed_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            )
            .bind(&record.booking_id)
            .bind(&record.turf_id)
            .bind(&record.slot_date)
            .bind(record.hour)
            .bind(&record.order_id)
            .bind(&record.remote_order_id)
            .bind(&record.user_id)
            .bind(record.amount)
            .bind(&record.status)
            .bind(&record.payment_id)
            .bind(record.created_at)
            .bind(record.confirmed_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// 원격 결제 주문 ID 연결
    pub async fn attach_remote_order(&self, order_id: &str, remote_order_id: &str) -> Result<u64, SqlxError> {
        let result = sqlx::query(
            "UPDATE bookings SET remote_order_id = ? WHERE order_id = ? AND status = 'pending'"
        )
        .bind(remote_order_id)
        .bind(order_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// ID 목록으로 예약 조회 (순서는 보장하지 않음)
    pub async fn find_by_ids(&self, booking_ids: &[String]) -> Result<Vec<Booking>, SqlxError> {
        if booking_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM bookings WHERE booking_id IN (", BOOKING_COLUMNS));
        let mut separated = builder.separated(", ");
        for id in booking_ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(") ORDER BY seq ASC");

        let records = builder
            .build_query_as::<BookingRecord>()
            .fetch_all(&self.pool)
            .await?;

        records.into_iter().map(Booking::try_from).collect()
    }

    pub async fn find_by_order(&self, order_id: &str) -> Result<Vec<Booking>, SqlxError> {
        let records = sqlx::query_as::<_, BookingRecord>(&format!(
            "SELECT {} FROM bookings WHERE order_id = ? ORDER BY seq ASC",
            BOOKING_COLUMNS
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        records.into_iter().map(Booking::try_from).collect()
    }

    /// 대기 중인 예약을 확정. 실제로 전이된 행 수를 반환합니다.
    pub async fn confirm_pending(
        &self,
        booking_ids: &[String],
        remote_order_id: &str,
        payment_id: &str,
        confirmed_at: DateTime<Utc>,
    ) -> Result<u64, SqlxError> {
        if booking_ids.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE bookings SET status = ");
        builder
            .push_bind(BookingStatus::Confirmed.as_str())
            .push(", payment_id = ")
            .push_bind(payment_id)
            .push(", confirmed_at = ")
            .push_bind(confirmed_at.timestamp_millis())
            .push(" WHERE status = 'pending' AND remote_order_id = ")
            .push_bind(remote_order_id)
            .push(" AND booking_id IN (");
        let mut separated = builder.separated(", ");
        for id in booking_ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");

        let result = builder.build().execute(&self.pool).await?;

        Ok(result.rows_affected())
    }

    /// 사용자별 예약 조회 (최신순, 동시각은 삽입 순서)
    pub async fn find_by_user(&self, user_id: &str, offset: i64, limit: i64) -> Result<Vec<Booking>, SqlxError> {
        let records = sqlx::query_as::<_, BookingRecord>(&format!(
            "SELECT {} FROM bookings
             WHERE user_id = ?
             ORDER BY created_at DESC, seq ASC
             LIMIT ? OFFSET ?",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        records.into_iter().map(Booking::try_from).collect()
    }

    /// 기준 시각 이전에 생성되어 아직 대기 중인 주문 ID 목록
    pub async fn find_expired_pending_orders(&self, created_before: DateTime<Utc>) -> Result<Vec<String>, SqlxError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT order_id FROM bookings
             WHERE status = 'pending' AND created_at < ?
             GROUP BY order_id
             ORDER BY MIN(created_at) ASC"
        )
        .bind(created_before.timestamp_millis())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(order_id,)| order_id).collect())
    }
}
