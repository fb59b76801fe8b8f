//! CLI argument definitions for billpost.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Billpost CLI — 고지서 배달 추적 서비스 명령줄 도구
#[derive(Parser, Debug)]
#[command(name = "billpost", version, about)]
pub struct Cli {
    /// 설정 파일 경로
    #[arg(short, long, default_value = "/etc/billpost/billpost.toml")]
    pub config: PathBuf,

    /// 출력 형식
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// 로그 레벨
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// 출력 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// 사람이 읽는 텍스트
    Text,
    /// 기계가 읽는 JSON
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 설정 검증 및 조회
    Config(ConfigArgs),
    /// 데몬 상태 확인
    Status(StatusArgs),
    /// 배달 생명주기 플로우 실행
    Flow(FlowArgs),
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// 설정 파일을 로드하고 검증
    Check,
    /// 유효 설정(파일 + 환경변수 + 기본값)을 출력
    Show {
        /// 특정 섹션만 출력 (general, auth, dispatch, report, metrics)
        #[arg(long)]
        section: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// 모듈별 상세 정보 포함
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct FlowArgs {
    #[command(subcommand)]
    pub action: FlowAction,
}

#[derive(Subcommand, Debug)]
pub enum FlowAction {
    /// 전체 생명주기(생성→배정→증빙→검증→리포트)를 인프로세스로 실행
    Run {
        /// 테스트 고지서 계좌번호
        #[arg(long, default_value = "ACCT-E2E-1001")]
        account: String,

        /// 테스트 고지서 청구월 (YYYY-MM)
        #[arg(long, default_value = "2026-02")]
        billing_month: String,

        /// 코디네이터 로그인 이메일
        #[arg(long, default_value = "admin@example.com")]
        coordinator_email: String,

        /// 코디네이터 로그인 비밀값
        #[arg(long, default_value = "admin123")]
        coordinator_secret: String,

        /// 선호 배달원 이메일 (없으면 목록의 첫 배달원 사용)
        #[arg(long)]
        messenger_email: Option<String>,

        /// 배달원 로그인 비밀값
        #[arg(long, default_value = "pass123")]
        messenger_secret: String,
    },
}
