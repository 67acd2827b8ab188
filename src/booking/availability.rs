use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::booking::ledger::AvailabilityLedger;
use crate::booking::model::SlotAvailability;
use crate::booking::slot_clock::SlotClock;
use crate::error::{BookingError, BookingResult};
use crate::external::TurfCatalog;

/// 슬롯 시계 출력과 원장 점유 상태를 합친 슬롯 목록
pub struct SlotBoard {
    ledger: AvailabilityLedger,
    catalog: Arc<dyn TurfCatalog>,
    slot_clock: SlotClock,
}

impl SlotBoard {
    pub fn new(ledger: AvailabilityLedger, catalog: Arc<dyn TurfCatalog>, slot_clock: SlotClock) -> Self {
        Self {
            ledger,
            catalog,
            slot_clock,
        }
    }

    /// 제공 가능한 슬롯마다 예약 가능 여부를 표시해 오름차순으로 반환
    pub async fn available_slots(
        &self,
        turf_id: &str,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> BookingResult<Vec<SlotAvailability>> {
        if self.catalog.get_turf(turf_id).await.is_none() {
            return Err(BookingError::TurfNotFound(turf_id.to_string()));
        }

        let hours = self.slot_clock.available_hours(date, now);
        if hours.is_empty() {
            return Ok(Vec::new());
        }

        let held = self.ledger.held_hours(turf_id, date).await?;

        Ok(hours
            .into_iter()
            .map(|hour| SlotAvailability::new(date, hour, !held.contains(&hour)))
            .collect())
    }
}
