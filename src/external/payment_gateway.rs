//! 결제 게이트웨이 연동
//!
//! 원격 주문 생성 API 와 정산 콜백 서명 검증을 담당합니다.

use std::collections::HashMap;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::booking::model::RemoteOrder;
use crate::error::{BookingError, BookingResult};

type HmacSha256 = Hmac<Sha256>;

/// 원격 주문 생성 요청
#[derive(Debug, Clone, Serialize)]
pub struct RemoteOrderRequest {
    /// 보조 통화 단위
    pub amount: u64,
    pub currency: String,
    pub receipt: String,
    pub notes: HashMap<String, String>,
}

/// 결제 게이트웨이 계약
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_remote_order(&self, request: RemoteOrderRequest) -> BookingResult<RemoteOrder>;
}

/// Razorpay 주문 API 클라이언트
pub struct RazorpayGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

#[derive(Debug, Deserialize)]
struct RazorpayOrderResponse {
    id: String,
    amount: u64,
    currency: String,
}

impl RazorpayGateway {
    pub fn new(base_url: impl Into<String>, key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_remote_order(&self, request: RemoteOrderRequest) -> BookingResult<RemoteOrder> {
        let url = format!("{}/v1/orders", self.base_url);
        debug!("원격 주문 생성 요청: {} ({} {})", url, request.amount, request.currency);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("결제 게이트웨이 연결 실패: {}", e);
                BookingError::Downstream(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("결제 게이트웨이 오류 응답: {} {}", status, body);
            return Err(BookingError::Downstream(format!("gateway responded {}", status)));
        }

        let order: RazorpayOrderResponse = response
            .json()
            .await
            .map_err(|e| BookingError::Downstream(format!("malformed gateway response: {}", e)))?;

        Ok(RemoteOrder {
            id: order.id,
            amount: order.amount,
            currency: order.currency,
        })
    }
}

/// 정산 콜백 서명 (HMAC-SHA256, 16진수)
///
/// 서명 대상은 `"<원격 주문 ID>|<결제 ID>"` 입니다.
#[derive(Clone)]
pub struct PaymentSignature {
    secret: Vec<u8>,
}

impl PaymentSignature {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self, remote_order_id: &str, payment_id: &str) -> HmacSha256 {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(remote_order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        mac
    }

    /// 기대 서명 계산
    pub fn sign(&self, remote_order_id: &str, payment_id: &str) -> String {
        hex::encode(self.mac(remote_order_id, payment_id).finalize().into_bytes())
    }

    /// 상수 시간 비교로 서명 검증
    pub fn verify(&self, remote_order_id: &str, payment_id: &str, signature: &str) -> bool {
        let Ok(provided) = hex::decode(signature.trim()) else {
            return false;
        };
        self.mac(remote_order_id, payment_id).verify_slice(&provided).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_verifies_hex_any_case() {
        let signer = PaymentSignature::new("secret");
        let sig = signer.sign("order_abc", "pay_xyz");
        assert_eq!(sig.len(), 64);
        assert!(signer.verify("order_abc", "pay_xyz", &sig));
        assert!(signer.verify("order_abc", "pay_xyz", &sig.to_uppercase()));
    }

    #[test]
    fn test_signature_rejects_tampering() {
        let signer = PaymentSignature::new("secret");
        let sig = signer.sign("order_abc", "pay_xyz");

        assert!(!signer.verify("order_abc", "pay_other", &sig));
        assert!(!signer.verify("order_other", "pay_xyz", &sig));
        assert!(!signer.verify("order_abc", "pay_xyz", "not-hex"));
        assert!(!signer.verify("order_abc", "pay_xyz", &sig[..62]));
        assert!(!PaymentSignature::new("other").verify("order_abc", "pay_xyz", &sig));
    }
}
