use anyhow::Result;
use clap::Parser;

use billpost_core::config::BillpostConfig;
use billpost_daemon::cli::DaemonCli;
use billpost_daemon::logging;
use billpost_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // 설정 로드 (파일 + 환경변수 + CLI 오버라이드)
    let mut config = BillpostConfig::load(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", cli.config.display(), e))?;
    if let Some(log_level) = cli.log_level {
        config.general.log_level = log_level;
    }
    if let Some(log_format) = cli.log_format {
        config.general.log_format = log_format;
    }
    if let Some(pid_file) = cli.pid_file {
        config.general.pid_file = pid_file;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    // --validate: 검증만 수행하고 종료
    if cli.validate {
        println!("configuration OK: {}", cli.config.display());
        return Ok(());
    }

    // 로깅 초기화
    logging::init_tracing(&config.general)?;
    tracing::info!(
        config = %cli.config.display(),
        version = env!("CARGO_PKG_VERSION"),
        "billpost-daemon starting"
    );

    // 오케스트레이터 빌드 및 실행
    let mut orchestrator = Orchestrator::build_from_config(config).await?;
    orchestrator.run().await
}
