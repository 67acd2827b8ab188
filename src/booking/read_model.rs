//! 예약 조회 모델
//!
//! 저장된 예약에 턴프 메타데이터를 조회 시점에 결합하고 최신순으로 돌려줍니다.
//! 상태를 변경하지 않습니다.

use std::sync::Arc;

use crate::booking::model::{EnrichedBooking, TurfDetails};
use crate::db::BookingRepository;
use crate::error::BookingResult;
use crate::external::TurfCatalog;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 200;

/// 페이지 지정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Page {
    pub fn new(offset: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            offset: offset.unwrap_or(0),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn next(&self) -> Self {
        Self {
            offset: self.offset + self.limit,
            limit: self.limit,
        }
    }
}

pub struct BookingReadModel {
    bookings: BookingRepository,
    catalog: Arc<dyn TurfCatalog>,
}

impl BookingReadModel {
    pub fn new(bookings: BookingRepository, catalog: Arc<dyn TurfCatalog>) -> Self {
        Self { bookings, catalog }
    }

    /// 사용자 예약 목록 (최신순, 동시각은 삽입 순서)
    pub async fn list_bookings(&self, user_id: &str, page: Page) -> BookingResult<Vec<EnrichedBooking>> {
        let rows = self
            .bookings
            .find_by_user(user_id, page.offset as i64, page.limit as i64)
            .await?;

        let mut enriched = Vec::with_capacity(rows.len());
        for booking in rows {
            let turf_details = self.catalog.get_turf(&booking.turf_id).await.map(|turf| TurfDetails {
                name: turf.name,
                location: turf.location,
                city: turf.city,
            });
            enriched.push(EnrichedBooking { booking, turf_details });
        }

        Ok(enriched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::coordinator::CreateOrder;
    use crate::booking::model::SlotRequest;
    use crate::booking::test_support::fixture;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn test_page_clamps_limit() {
        assert_eq!(Page::new(None, None), Page::default());
        assert_eq!(Page::new(Some(10), Some(0)).limit, 1);
        assert_eq!(Page::new(None, Some(10_000)).limit, MAX_PAGE_SIZE);
        assert_eq!(Page::new(Some(5), Some(5)).next(), Page { offset: 10, limit: 5 });
    }

    #[tokio::test]
    async fn test_enriched_and_ordered_by_recency() {
        let fx = fixture().await;
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();

        let older = fx
            .coordinator
            .create_order(CreateOrder {
                user_id: "user-1".to_string(),
                turf_id: "turf-001".to_string(),
                slots: vec![SlotRequest::new(date, 8), SlotRequest::new(date, 9)],
                declared_amount: 3000,
            })
            .await
            .unwrap();
        fx.clock.advance(Duration::minutes(3));
        let newer = fx
            .coordinator
            .create_order(CreateOrder {
                user_id: "user-1".to_string(),
                turf_id: "turf-003".to_string(),
                slots: vec![SlotRequest::new(date, 20)],
                declared_amount: 1200,
            })
            .await
            .unwrap();

        let listed = fx.read_model.list_bookings("user-1", Page::default()).await.unwrap();
        let ids: Vec<String> = listed.iter().map(|b| b.booking.booking_id.clone()).collect();
        let mut expected = newer.booking_ids.clone();
        expected.extend(older.booking_ids.clone());
        assert_eq!(ids, expected);

        let first = listed[0].turf_details.as_ref().unwrap();
        assert_eq!(first.name, "Sports Hub");
        assert_eq!(first.city, "Delhi");
        assert_eq!(listed[1].turf_details.as_ref().unwrap().location, "Andheri West");

        // 페이지를 이어서 읽어도 같은 순서
        let page = Page::new(None, Some(2));
        let mut paged = fx.read_model.list_bookings("user-1", page).await.unwrap();
        paged.extend(fx.read_model.list_bookings("user-1", page.next()).await.unwrap());
        assert_eq!(paged, listed);

        assert!(fx.read_model.list_bookings("user-2", Page::default()).await.unwrap().is_empty());
    }
}
