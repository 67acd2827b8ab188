use anyhow::Result;
use log::info;

use turfhub::{start_server, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    env_logger::init();

    info!(
        "설정 로드 완료: 포트 {}, 운영 시간 {:02}:00-{:02}:00, 대기 타임아웃 {}초",
        config.rest_port, config.open_hour, config.close_hour, config.pending_timeout_secs
    );

    start_server(config).await
}
