//! 단위 테스트 공용 픽스처

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, FixedOffset, TimeZone, Utc};
use sqlx::sqlite::SqlitePool;

use super::*;
use crate::booking::model::RemoteOrder;
use crate::db::memory_pool;
use crate::error::{BookingError, BookingResult};
use crate::external::{InMemoryTurfCatalog, PaymentSignature, RemoteOrderRequest};

pub const TEST_SECRET: &str = "test_key_secret";

/// 요청을 기록하는 가짜 결제 게이트웨이
#[derive(Default)]
pub struct RecordingGateway {
    requests: Mutex<Vec<RemoteOrderRequest>>,
    fail_next: AtomicBool,
    sequence: AtomicU64,
}

impl RecordingGateway {
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<RemoteOrderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn create_remote_order(&self, request: RemoteOrderRequest) -> BookingResult<RemoteOrder> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(BookingError::Downstream("gateway unavailable".to_string()));
        }
        let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let order = RemoteOrder {
            id: format!("order_test_{}", n),
            amount: request.amount,
            currency: request.currency.clone(),
        };
        self.requests.lock().unwrap().push(request);
        Ok(order)
    }
}

pub struct Fixture {
    pub pool: SqlitePool,
    pub ledger: AvailabilityLedger,
    pub bookings: BookingRepository,
    pub coordinator: Arc<OrderCoordinator>,
    pub verifier: Arc<SettlementVerifier>,
    pub read_model: Arc<BookingReadModel>,
    pub sweeper: Arc<PendingSweeper>,
    pub gateway: Arc<RecordingGateway>,
    pub clock: Arc<FixedClock>,
    pub signer: PaymentSignature,
}

/// 현지(+05:30) 2026-10-16 14:30 에 고정된 서비스
pub async fn fixture() -> Fixture {
    let pool = memory_pool().await;
    let gateway = Arc::new(RecordingGateway::default());
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()));

    let services = BookingServices::new(
        pool.clone(),
        Arc::new(InMemoryTurfCatalog::seeded()),
        gateway.clone(),
        clock.clone(),
        BookingSettings {
            slot_clock: SlotClock::default(),
            utc_offset: FixedOffset::east_opt(330 * 60).unwrap(),
            currency: "INR".to_string(),
            signature_secret: TEST_SECRET.to_string(),
            pending_timeout: ChronoDuration::minutes(15),
            sweep_interval: std::time::Duration::from_secs(60),
        },
    );

    Fixture {
        pool,
        ledger: services.ledger,
        bookings: services.bookings,
        coordinator: services.coordinator,
        verifier: services.verifier,
        read_model: services.read_model,
        sweeper: services.sweeper,
        gateway,
        clock,
        signer: PaymentSignature::new(TEST_SECRET),
    }
}
