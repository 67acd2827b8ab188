//! TurfHub 슬롯 예약 및 결제 정산 서비스

pub mod api;
pub mod booking;
pub mod config;
pub mod db;
pub mod error;
pub mod external;
pub mod server;

pub use config::AppConfig;
pub use error::{BookingError, BookingResult};
pub use server::{build_app, start_server, ServerState};
