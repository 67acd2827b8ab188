/**
* filename : mod
* description: 슬롯 예약 및 결제 정산 코어
**/

pub mod availability;
pub mod clock;
pub mod coordinator;
pub mod ledger;
pub mod model;
pub mod order_lock;
pub mod read_model;
pub mod settlement;
pub mod slot_clock;
pub mod sweeper;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, FixedOffset};
use sqlx::sqlite::SqlitePool;

pub use availability::SlotBoard;
pub use clock::{Clock, FixedClock, SystemClock};
pub use coordinator::{CreateOrder, OrderCoordinator};
pub use ledger::AvailabilityLedger;
pub use model::{
    Booking,
    BookingStatus,
    EnrichedBooking,
    OrderHandle,
    SettlementOutcome,
    SlotAvailability,
    SlotRequest,
};
pub use order_lock::OrderLocks;
pub use read_model::{BookingReadModel, Page};
pub use settlement::{PaymentCallback, SettlementVerifier};
pub use slot_clock::SlotClock;
pub use sweeper::{PendingSweeper, SweepStats};

use crate::db::BookingRepository;
use crate::external::{PaymentGateway, PaymentSignature, TurfCatalog};

/// 코어 동작 설정
#[derive(Debug, Clone)]
pub struct BookingSettings {
    pub slot_clock: SlotClock,
    /// 턴프 현지 시각 오프셋
    pub utc_offset: FixedOffset,
    pub currency: String,
    /// 정산 서명 비밀키
    pub signature_secret: String,
    pub pending_timeout: ChronoDuration,
    pub sweep_interval: std::time::Duration,
}

/// 코어 구성 요소 묶음
#[derive(Clone)]
pub struct BookingServices {
    pub ledger: AvailabilityLedger,
    pub bookings: BookingRepository,
    pub coordinator: Arc<OrderCoordinator>,
    pub verifier: Arc<SettlementVerifier>,
    pub read_model: Arc<BookingReadModel>,
    pub slot_board: Arc<SlotBoard>,
    pub sweeper: Arc<PendingSweeper>,
    pub clock: Arc<dyn Clock>,
    pub utc_offset: FixedOffset,
}

impl BookingServices {
    pub fn new(
        pool: SqlitePool,
        catalog: Arc<dyn TurfCatalog>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        settings: BookingSettings,
    ) -> Self {
        let ledger = AvailabilityLedger::new(pool.clone());
        let bookings = BookingRepository::new(pool);
        let locks = Arc::new(OrderLocks::new());

        let coordinator = OrderCoordinator::new(
            ledger.clone(),
            bookings.clone(),
            catalog.clone(),
            gateway,
            clock.clone(),
            settings.slot_clock,
            settings.utc_offset,
            settings.currency,
        );
        let verifier = SettlementVerifier::new(
            bookings.clone(),
            PaymentSignature::new(&settings.signature_secret),
            locks.clone(),
            clock.clone(),
        );
        let read_model = BookingReadModel::new(bookings.clone(), catalog.clone());
        let slot_board = SlotBoard::new(ledger.clone(), catalog, settings.slot_clock);
        let sweeper = PendingSweeper::new(
            bookings.clone(),
            ledger.clone(),
            locks,
            clock.clone(),
            settings.pending_timeout,
            settings.sweep_interval,
        );

        Self {
            ledger,
            bookings,
            coordinator: Arc::new(coordinator),
            verifier: Arc::new(verifier),
            read_model: Arc::new(read_model),
            slot_board: Arc::new(slot_board),
            sweeper: Arc::new(sweeper),
            clock,
            utc_offset: settings.utc_offset,
        }
    }

    /// 턴프 현지 기준 현재 시각
    pub fn local_now(&self) -> chrono::NaiveDateTime {
        clock::local_now(self.clock.as_ref(), self.utc_offset)
    }
}
