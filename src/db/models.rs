use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::booking::model::{Booking, BookingStatus};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 예약 DB 모델
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingRecord {
    pub booking_id: String,
    pub turf_id: String,
    pub slot_date: String,
    pub hour: i64,
    pub order_id: String,
    pub remote_order_id: Option<String>,
    pub user_id: String,
    pub amount: i64,
    pub status: String,
    pub payment_id: Option<String>,
    pub created_at: i64,
    pub confirmed_at: Option<i64>,
}

impl BookingRecord {
    pub fn from_booking(booking: &Booking) -> Self {
        Self {
            booking_id: booking.booking_id.clone(),
            turf_id: booking.turf_id.clone(),
            slot_date: booking.date.format(DATE_FORMAT).to_string(),
            hour: booking.hour as i64,
            order_id: booking.order_id.clone(),
            remote_order_id: booking.remote_order_id.clone(),
            user_id: booking.user_id.clone(),
            amount: booking.amount as i64,
            status: booking.status.as_str().to_string(),
            payment_id: booking.payment_id.clone(),
            created_at: booking.created_at.timestamp_millis(),
            confirmed_at: booking.confirmed_at.map(|t| t.timestamp_millis()),
        }
    }
}

impl TryFrom<BookingRecord> for Booking {
    type Error = sqlx::Error;

    fn try_from(record: BookingRecord) -> Result<Self, Self::Error> {
        let date = NaiveDate::parse_from_str(&record.slot_date, DATE_FORMAT)
            .map_err(|e| decode_error("slot_date", e.to_string()))?;
        let status = BookingStatus::parse(&record.status)
            .ok_or_else(|| decode_error("status", record.status.clone()))?;

        Ok(Booking {
            booking_id: record.booking_id,
            turf_id: record.turf_id,
            date,
            hour: record.hour as u32,
            order_id: record.order_id,
            remote_order_id: record.remote_order_id,
            user_id: record.user_id,
            amount: record.amount as u64,
            status,
            payment_id: record.payment_id,
            created_at: from_millis(record.created_at)?,
            confirmed_at: record.confirmed_at.map(from_millis).transpose()?,
        })
    }
}

pub fn from_millis(millis: i64) -> Result<DateTime<Utc>, sqlx::Error> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| decode_error("timestamp", millis.to_string()))
}

fn decode_error(column: &str, detail: String) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: detail.into(),
    }
}
