//! 인증 가드 설정
//!
//! [`AuthGuardConfig`]는 core의 [`AuthConfig`](billpost_core::config::AuthConfig)를
//! 기반으로 인증 가드 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use billpost_core::config::BillpostConfig;
//! use billpost_auth::config::AuthGuardConfig;
//!
//! let core_config = BillpostConfig::default();
//! let config = AuthGuardConfig::from_core(&core_config.auth);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::AuthGuardError;

/// 인증 가드 설정
///
/// core의 `AuthConfig`에서 파생됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthGuardConfig {
    /// 세션 토큰 수명 (초)
    pub token_ttl_secs: u64,
    /// 시드 계정 파일 경로
    pub accounts_path: String,
    /// 동시 세션 최대 수
    pub max_sessions: usize,
}

impl Default for AuthGuardConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: 3600,
            accounts_path: "/etc/billpost/accounts.toml".to_owned(),
            max_sessions: 10_000,
        }
    }
}

/// 설정 상한값 상수
const MAX_TOKEN_TTL_SECS: u64 = 7 * 24 * 3600;
const MAX_SESSIONS_CEILING: usize = 1_000_000;

impl AuthGuardConfig {
    /// core의 `AuthConfig`에서 가드 설정을 생성합니다.
    pub fn from_core(core: &billpost_core::config::AuthConfig) -> Self {
        Self {
            token_ttl_secs: core.token_ttl_secs,
            accounts_path: core.accounts_path.clone(),
            max_sessions: core.max_sessions,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), AuthGuardError> {
        if self.token_ttl_secs == 0 || self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(AuthGuardError::Config {
                field: "token_ttl_secs".to_owned(),
                reason: format!("must be 1-{MAX_TOKEN_TTL_SECS}"),
            });
        }

        if self.max_sessions == 0 || self.max_sessions > MAX_SESSIONS_CEILING {
            return Err(AuthGuardError::Config {
                field: "max_sessions".to_owned(),
                reason: format!("must be 1-{MAX_SESSIONS_CEILING}"),
            });
        }

        if self.accounts_path.is_empty() {
            return Err(AuthGuardError::Config {
                field: "accounts_path".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        Ok(())
    }
}

/// 인증 가드 설정 빌더
#[derive(Default)]
pub struct AuthGuardConfigBuilder {
    config: AuthGuardConfig,
}

impl AuthGuardConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 세션 토큰 수명(초)을 설정합니다.
    pub fn token_ttl_secs(mut self, secs: u64) -> Self {
        self.config.token_ttl_secs = secs;
        self
    }

    /// 시드 계정 파일 경로를 설정합니다.
    pub fn accounts_path(mut self, path: impl Into<String>) -> Self {
        self.config.accounts_path = path.into();
        self
    }

    /// 동시 세션 최대 수를 설정합니다.
    pub fn max_sessions(mut self, max: usize) -> Self {
        self.config.max_sessions = max;
        self
    }

    /// 설정을 검증하고 `AuthGuardConfig`를 생성합니다.
    pub fn build(self) -> Result<AuthGuardConfig, AuthGuardError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
