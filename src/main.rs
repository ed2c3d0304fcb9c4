#![warn(clippy::all)]

use tracing_subscriber::fmt::format::FmtSpan;

use travanah::config::Config;

#[tokio::main]
async fn main() -> Result<(), handle_errors::Error> {
    let config = Config::new()?;

    // RUST_LOG 가 있으면 그 값을, 없으면 설정 파일의 로그 수준을 쓴다.
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_filter());

    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        // 각 범위가 닫힐 때 이벤트를 기록한다.
        .with_span_events(FmtSpan::CLOSE)
        .init();

    travanah::run(&config).await
}
