//! 리포트 에러 타입
//!
//! [`ReportGenError`]는 리포트 생성기 내부에서 발생하는 모든 에러를
//! 표현합니다. `From<ReportGenError> for BillpostError` 변환이 구현되어
//! 있어 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use billpost_core::error::{AuthError, BillpostError, ConfigError, ReportError};

/// 리포트 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ReportGenError {
    /// 역할 불일치
    #[error("forbidden: {operation}: {reason}")]
    Forbidden {
        /// 거부된 연산명
        operation: String,
        /// 거부 사유
        reason: String,
    },

    /// 메모 길이 초과
    #[error("report note too long: {len} chars (max: {max})")]
    NoteTooLong {
        /// 제출된 메모 길이
        len: usize,
        /// 설정된 상한
        max: usize,
    },

    /// 리포트 저장소 상한 도달
    #[error("report store full: {max} reports retained")]
    StoreFull {
        /// 설정된 상한
        max: usize,
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

impl From<ReportGenError> for BillpostError {
    fn from(err: ReportGenError) -> Self {
        match err {
            ReportGenError::Forbidden { operation, reason } => {
                BillpostError::Auth(AuthError::Forbidden { operation, reason })
            }
            ReportGenError::NoteTooLong { len, max } => {
                BillpostError::Report(ReportError::NoteTooLong { len, max })
            }
            ReportGenError::StoreFull { max } => {
                BillpostError::Report(ReportError::StoreFull { max })
            }
            ReportGenError::Config { field, reason } => {
                BillpostError::Config(ConfigError::InvalidValue { field, reason })
            }
        }
    }
}
