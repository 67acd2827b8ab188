//! 사용자 인증 (베어러 토큰)
//!
//! OTP 발급은 외부 인증 서비스의 몫이며, 여기서는 발급된 HS256 토큰을
//! 검증해 사용자 ID 만 꺼냅니다.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::Result as JwtResult, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, BookingResult};

const TOKEN_LIFETIME_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    #[serde(default)]
    pub mobile: String,
    pub exp: usize,
}

/// 인증 계약
pub trait Identity: Send + Sync {
    fn authenticate(&self, token: &str) -> BookingResult<String>;
}

/// JWT 기반 인증
pub struct JwtIdentity {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtIdentity {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// 토큰 발급 (30일 유효)
    pub fn issue_token(&self, user_id: &str, mobile: &str, now: DateTime<Utc>) -> JwtResult<String> {
        let claims = Claims {
            user_id: user_id.to_string(),
            mobile: mobile.to_string(),
            exp: (now + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }
}

impl Identity for JwtIdentity {
    fn authenticate(&self, token: &str) -> BookingResult<String> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims.user_id)
            .map_err(|e| {
                debug!("토큰 검증 실패: {}", e);
                BookingError::Unauthenticated
            })
    }
}
