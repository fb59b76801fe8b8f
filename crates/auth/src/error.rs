//! 인증 가드 에러 타입
//!
//! [`AuthGuardError`]는 인증 가드 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<AuthGuardError> for BillpostError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use billpost_core::error::{AuthError, BillpostError, ConfigError};

/// 인증 가드 도메인 에러
///
/// 계정 조회, 세션 발급/해석, 시드 계정 파일 로딩, 설정 에러 등
/// 인증 가드 내부의 모든 에러 상황을 포괄합니다.
#[derive(Debug, thiserror::Error)]
pub enum AuthGuardError {
    /// 알 수 없는 계정이거나 비밀번호 불일치
    #[error("invalid credential")]
    InvalidCredential,

    /// 알 수 없는 세션 토큰
    #[error("unknown session token")]
    SessionUnknown,

    /// 만료된 세션 토큰
    #[error("session expired")]
    SessionExpired,

    /// 세션 저장소 상한 도달
    #[error("session limit reached: {max} active sessions")]
    SessionLimit {
        /// 설정된 세션 상한
        max: usize,
    },

    /// 역할 불일치
    #[error("forbidden: {operation}: {reason}")]
    Forbidden {
        /// 거부된 연산명
        operation: String,
        /// 거부 사유
        reason: String,
    },

    /// 시드 계정 파일 로딩 실패
    #[error("accounts load error: {path}: {reason}")]
    AccountsLoad {
        /// 계정 파일 경로
        path: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// 시드 계정 유효성 검증 실패
    #[error("accounts validation error: account '{account}': {reason}")]
    AccountsValidation {
        /// 문제가 된 계정 (이메일 또는 ID)
        account: String,
        /// 검증 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<AuthGuardError> for BillpostError {
    fn from(err: AuthGuardError) -> Self {
        match err {
            AuthGuardError::InvalidCredential => BillpostError::Auth(AuthError::InvalidCredential),
            AuthGuardError::SessionUnknown => BillpostError::Auth(AuthError::SessionUnknown),
            AuthGuardError::SessionExpired => BillpostError::Auth(AuthError::SessionExpired),
            AuthGuardError::SessionLimit { max } => BillpostError::Auth(AuthError::Forbidden {
                operation: "login".to_owned(),
                reason: format!("session limit reached ({max})"),
            }),
            AuthGuardError::Forbidden { operation, reason } => {
                BillpostError::Auth(AuthError::Forbidden { operation, reason })
            }
            AuthGuardError::AccountsLoad { path, reason } => {
                BillpostError::Config(ConfigError::InvalidValue {
                    field: "auth.accounts_path".to_owned(),
                    reason: format!("{path}: {reason}"),
                })
            }
            AuthGuardError::AccountsValidation { account, reason } => {
                BillpostError::Config(ConfigError::InvalidValue {
                    field: "auth.accounts".to_owned(),
                    reason: format!("account '{account}': {reason}"),
                })
            }
            AuthGuardError::Config { field, reason } => {
                BillpostError::Config(ConfigError::InvalidValue { field, reason })
            }
        }
    }
}
