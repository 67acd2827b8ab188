//! 환경 변수 기반 설정
//!
//! `.env` 파일(있다면)을 읽은 뒤 환경 변수로 기본값을 덮어씁니다.

use std::env;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::{Duration as ChronoDuration, FixedOffset};

use crate::booking::{BookingSettings, SlotClock};

/// 서버 설정
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rest_port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub razorpay_key_id: String,
    /// 게이트웨이 인증과 정산 서명 검증에 함께 사용
    pub razorpay_key_secret: String,
    pub razorpay_base_url: String,
    pub currency: String,
    pub open_hour: u32,
    pub close_hour: u32,
    pub utc_offset_minutes: i32,
    pub pending_timeout_secs: u64,
    pub sweep_interval_secs: u64,
    pub turf_catalog_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rest_port: 7000,
            database_url: "sqlite://turfhub.db?mode=rwc".into(),
            db_max_connections: 5,
            jwt_secret: "turfhub_secret_key_2025".into(),
            razorpay_key_id: String::new(),
            razorpay_key_secret: String::new(),
            razorpay_base_url: "https://api.razorpay.com".into(),
            currency: "INR".into(),
            open_hour: 6,
            close_hour: 22,
            utc_offset_minutes: 330,
            pending_timeout_secs: 900,
            sweep_interval_secs: 60,
            turf_catalog_path: None,
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} 값이 올바르지 않습니다: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

fn string_var(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let defaults = Self::default();

        let config = Self {
            rest_port: parse_var("REST_PORT", defaults.rest_port)?,
            database_url: string_var("DATABASE_URL", defaults.database_url),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            jwt_secret: string_var("JWT_SECRET", defaults.jwt_secret),
            razorpay_key_id: string_var("RAZORPAY_KEY_ID", defaults.razorpay_key_id),
            razorpay_key_secret: string_var("RAZORPAY_KEY_SECRET", defaults.razorpay_key_secret),
            razorpay_base_url: string_var("RAZORPAY_BASE_URL", defaults.razorpay_base_url),
            currency: string_var("CURRENCY", defaults.currency),
            open_hour: parse_var("OPEN_HOUR", defaults.open_hour)?,
            close_hour: parse_var("CLOSE_HOUR", defaults.close_hour)?,
            utc_offset_minutes: parse_var("UTC_OFFSET_MINUTES", defaults.utc_offset_minutes)?,
            pending_timeout_secs: parse_var("PENDING_TIMEOUT_SECS", defaults.pending_timeout_secs)?,
            sweep_interval_secs: parse_var("SWEEP_INTERVAL_SECS", defaults.sweep_interval_secs)?,
            turf_catalog_path: env::var("TURF_CATALOG_PATH").ok().filter(|p| !p.is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.close_hour > 23 {
            bail!("CLOSE_HOUR 는 23 이하여야 합니다: {}", self.close_hour);
        }
        if self.open_hour > self.close_hour {
            bail!(
                "OPEN_HOUR({}) 가 CLOSE_HOUR({}) 보다 클 수 없습니다",
                self.open_hour,
                self.close_hour
            );
        }
        if self.db_max_connections == 0 {
            bail!("DB_MAX_CONNECTIONS 는 1 이상이어야 합니다");
        }
        if self.sweep_interval_secs == 0 {
            bail!("SWEEP_INTERVAL_SECS 는 1 이상이어야 합니다");
        }
        self.utc_offset()?;
        Ok(())
    }

    pub fn utc_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .with_context(|| format!("UTC_OFFSET_MINUTES 범위 초과: {}", self.utc_offset_minutes))
    }

    /// 코어 설정으로 변환
    pub fn booking_settings(&self) -> Result<BookingSettings> {
        Ok(BookingSettings {
            slot_clock: SlotClock::new(self.open_hour, self.close_hour),
            utc_offset: self.utc_offset()?,
            currency: self.currency.clone(),
            signature_secret: self.razorpay_key_secret.clone(),
            pending_timeout: ChronoDuration::seconds(self.pending_timeout_secs as i64),
            sweep_interval: std::time::Duration::from_secs(self.sweep_interval_secs),
        })
    }
}
