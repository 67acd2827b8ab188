//! 외부 협력 시스템 연동 모듈
//!
//! 턴프 카탈로그, 결제 게이트웨이, 사용자 인증을 계약(트레이트)과
//! 구체 어댑터로 제공합니다.

pub mod catalog;
pub mod identity;
pub mod payment_gateway;

pub use catalog::{InMemoryTurfCatalog, Turf, TurfCatalog};
pub use identity::{Identity, JwtIdentity};
pub use payment_gateway::{PaymentGateway, PaymentSignature, RazorpayGateway, RemoteOrderRequest};
