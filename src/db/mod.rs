pub mod models;
pub mod repository;

use std::str::FromStr;
use std::time::Duration;

use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Error as SqlxError;

pub use repository::BookingRepository;

/// SQLite 데이터베이스 초기화 및 연결
///
/// 인메모리 URL 은 연결마다 별도 DB 가 생기므로 단일 연결로 고정합니다.
pub async fn init_database(database_url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    info!("🗄️  SQLite 데이터베이스 초기화 중... ({})", database_url);

    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));

    let mut pool_options = SqlitePoolOptions::new();
    pool_options = if in_memory {
        pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        pool_options.max_connections(max_connections.max(1))
    };

    let pool = pool_options.connect_with(options).await?;

    create_tables(&pool).await?;

    info!("✅ 데이터베이스 초기화 완료");

    Ok(pool)
}

/// 필요한 테이블 생성
async fn create_tables(pool: &SqlitePool) -> Result<(), SqlxError> {
    // 예약 테이블 (삭제하지 않고 취소 상태로 보존)
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS bookings (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            booking_id TEXT NOT NULL UNIQUE,
            turf_id TEXT NOT NULL,
            slot_date TEXT NOT NULL,
            hour INTEGER NOT NULL,
            order_id TEXT NOT NULL,
            remote_order_id TEXT,
            user_id TEXT NOT NULL,
            amount INTEGER NOT NULL,
            status TEXT NOT NULL,
            payment_id TEXT,
            created_at INTEGER NOT NULL,
            confirmed_at INTEGER
        )"
    )
    .execute(pool)
    .await?;

    // 가용성 원장: (턴프, 날짜, 시각) 당 하나의 점유만 허용
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS slot_holds (
            turf_id TEXT NOT NULL,
            slot_date TEXT NOT NULL,
            hour INTEGER NOT NULL,
            order_id TEXT NOT NULL,
            held_at INTEGER NOT NULL,
            PRIMARY KEY (turf_id, slot_date, hour)
        )"
    )
    .execute(pool)
    .await?;

    // 인덱스 생성
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookings_user ON bookings(user_id, created_at)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookings_order ON bookings(order_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookings_status ON bookings(status, created_at)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_slot_holds_order ON slot_holds(order_id)")
        .execute(pool)
        .await?;

    info!("📋 테이블 생성 완료");

    Ok(())
}

/// 테스트용 인메모리 풀
#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    init_database("sqlite::memory:", 1)
        .await
        .expect("in-memory sqlite")
}
