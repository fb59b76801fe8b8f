//! 설정 관리 — billpost.toml 파싱 및 런타임 설정
//!
//! [`BillpostConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`BILLPOST_AUTH_TOKEN_TTL_SECS=600` 형식)
//! 3. 설정 파일 (`billpost.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), billpost_core::error::BillpostError> {
//! use billpost_core::config::BillpostConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = BillpostConfig::load("billpost.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = BillpostConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BillpostError, ConfigError};

/// Billpost 통합 설정
///
/// `billpost.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillpostConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 인증 가드 설정
    #[serde(default)]
    pub auth: AuthConfig,
    /// 디스패치(고지서/배송) 설정
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// 리포트 설정
    #[serde(default)]
    pub report: ReportConfig,
    /// 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 로그 포맷 (json, pretty)
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// 데이터 디렉토리
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// PID 파일 경로 (비어있으면 기록하지 않음)
    #[serde(default)]
    pub pid_file: String,
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_log_format() -> String {
    "json".to_owned()
}

fn default_data_dir() -> String {
    "/var/lib/billpost".to_owned()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            data_dir: default_data_dir(),
            pid_file: String::new(),
        }
    }
}

/// 인증 가드 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// 세션 토큰 수명 (초)
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    /// 시드 계정 파일 경로
    #[serde(default = "default_accounts_path")]
    pub accounts_path: String,
    /// 동시 세션 최대 수
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_token_ttl_secs() -> u64 {
    3600
}

fn default_accounts_path() -> String {
    "/etc/billpost/accounts.toml".to_owned()
}

fn default_max_sessions() -> usize {
    10_000
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: default_token_ttl_secs(),
            accounts_path: default_accounts_path(),
            max_sessions: default_max_sessions(),
        }
    }
}

/// 디스패치 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// 증빙 페이로드 최대 크기 (바이트)
    #[serde(default = "default_max_proof_bytes")]
    pub max_proof_bytes: usize,
    /// 일괄 배정 최대 건수
    #[serde(default = "default_max_assign_batch")]
    pub max_assign_batch: usize,
    /// 저장 가능한 고지서 최대 수
    #[serde(default = "default_max_bills")]
    pub max_bills: usize,
}

fn default_max_proof_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_max_assign_batch() -> usize {
    100
}

fn default_max_bills() -> usize {
    100_000
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_proof_bytes: default_max_proof_bytes(),
            max_assign_batch: default_max_assign_batch(),
            max_bills: default_max_bills(),
        }
    }
}

/// 리포트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// 메모 최대 길이 (문자)
    #[serde(default = "default_max_note_len")]
    pub max_note_len: usize,
    /// 보관 리포트 최대 수
    #[serde(default = "default_max_reports")]
    pub max_reports: usize,
}

fn default_max_note_len() -> usize {
    1024
}

fn default_max_reports() -> usize {
    10_000
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_note_len: default_max_note_len(),
            max_reports: default_max_reports(),
        }
    }
}

/// 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Prometheus 엔드포인트 활성화 여부
    #[serde(default)]
    pub enabled: bool,
    /// 리슨 주소
    #[serde(default = "default_metrics_listen_addr")]
    pub listen_addr: String,
    /// 리슨 포트
    #[serde(default = "default_metrics_port")]
    pub port: u16,
    /// 스크레이프 엔드포인트 경로
    #[serde(default = "default_metrics_endpoint")]
    pub endpoint: String,
}

fn default_metrics_listen_addr() -> String {
    "127.0.0.1".to_owned()
}

fn default_metrics_port() -> u16 {
    9205
}

fn default_metrics_endpoint() -> String {
    "/metrics".to_owned()
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: default_metrics_listen_addr(),
            port: default_metrics_port(),
            endpoint: default_metrics_endpoint(),
        }
    }
}

/// 설정 상한값 상수
const MAX_TOKEN_TTL_SECS: u64 = 7 * 24 * 3600;
const MAX_PROOF_BYTES_CEILING: usize = 50 * 1024 * 1024;
const MAX_ASSIGN_BATCH_CEILING: usize = 1000;

impl BillpostConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, BillpostError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, BillpostError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BillpostError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                BillpostError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, BillpostError> {
        toml::from_str(toml_str).map_err(|e| {
            BillpostError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `BILLPOST_{SECTION}_{FIELD}`
    /// 예: `BILLPOST_AUTH_TOKEN_TTL_SECS=600`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "BILLPOST_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "BILLPOST_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.data_dir, "BILLPOST_GENERAL_DATA_DIR");
        override_string(&mut self.general.pid_file, "BILLPOST_GENERAL_PID_FILE");

        // Auth
        override_u64(&mut self.auth.token_ttl_secs, "BILLPOST_AUTH_TOKEN_TTL_SECS");
        override_string(&mut self.auth.accounts_path, "BILLPOST_AUTH_ACCOUNTS_PATH");
        override_usize(&mut self.auth.max_sessions, "BILLPOST_AUTH_MAX_SESSIONS");

        // Dispatch
        override_usize(
            &mut self.dispatch.max_proof_bytes,
            "BILLPOST_DISPATCH_MAX_PROOF_BYTES",
        );
        override_usize(
            &mut self.dispatch.max_assign_batch,
            "BILLPOST_DISPATCH_MAX_ASSIGN_BATCH",
        );
        override_usize(&mut self.dispatch.max_bills, "BILLPOST_DISPATCH_MAX_BILLS");

        // Report
        override_usize(&mut self.report.max_note_len, "BILLPOST_REPORT_MAX_NOTE_LEN");
        override_usize(&mut self.report.max_reports, "BILLPOST_REPORT_MAX_REPORTS");

        // Metrics
        override_bool(&mut self.metrics.enabled, "BILLPOST_METRICS_ENABLED");
        override_string(
            &mut self.metrics.listen_addr,
            "BILLPOST_METRICS_LISTEN_ADDR",
        );
        override_u16(&mut self.metrics.port, "BILLPOST_METRICS_PORT");
        override_string(&mut self.metrics.endpoint, "BILLPOST_METRICS_ENDPOINT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), BillpostError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // auth 검증
        if self.auth.token_ttl_secs == 0 || self.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::InvalidValue {
                field: "auth.token_ttl_secs".to_owned(),
                reason: format!("must be 1-{MAX_TOKEN_TTL_SECS}"),
            }
            .into());
        }
        if self.auth.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "auth.max_sessions".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }
        if self.auth.accounts_path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "auth.accounts_path".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        // dispatch 검증
        if self.dispatch.max_proof_bytes == 0
            || self.dispatch.max_proof_bytes > MAX_PROOF_BYTES_CEILING
        {
            return Err(ConfigError::InvalidValue {
                field: "dispatch.max_proof_bytes".to_owned(),
                reason: format!("must be 1-{MAX_PROOF_BYTES_CEILING}"),
            }
            .into());
        }
        if self.dispatch.max_assign_batch == 0
            || self.dispatch.max_assign_batch > MAX_ASSIGN_BATCH_CEILING
        {
            return Err(ConfigError::InvalidValue {
                field: "dispatch.max_assign_batch".to_owned(),
                reason: format!("must be 1-{MAX_ASSIGN_BATCH_CEILING}"),
            }
            .into());
        }
        if self.dispatch.max_bills == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dispatch.max_bills".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        // report 검증
        if self.report.max_note_len == 0 {
            return Err(ConfigError::InvalidValue {
                field: "report.max_note_len".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }
        if self.report.max_reports == 0 {
            return Err(ConfigError::InvalidValue {
                field: "report.max_reports".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        // metrics 검증
        if self.metrics.enabled {
            if self.metrics.port == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "metrics.port".to_owned(),
                    reason: "must be non-zero when metrics are enabled".to_owned(),
                }
                .into());
            }
            if self.metrics.listen_addr.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "metrics.listen_addr".to_owned(),
                    reason: "must not be empty when metrics are enabled".to_owned(),
                }
                .into());
            }
        }

        Ok(())
    }
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        *target = value;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" => *target = true,
            "false" | "0" | "no" => *target = false,
            _ => {
                tracing::warn!(key = env_key, value = %value, "ignoring invalid bool override");
            }
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => {
                tracing::warn!(key = env_key, value = %value, "ignoring invalid u64 override");
            }
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => {
                tracing::warn!(key = env_key, value = %value, "ignoring invalid u16 override");
            }
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => {
                tracing::warn!(key = env_key, value = %value, "ignoring invalid usize override");
            }
        }
    }
}
