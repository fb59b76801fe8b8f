//! 리포트 설정
//!
//! [`ReportGenConfig`]는 core의 [`ReportConfig`](billpost_core::config::ReportConfig)를
//! 기반으로 리포트 생성기의 상한값을 제공합니다.

use serde::{Deserialize, Serialize};

use crate::error::ReportGenError;

/// 리포트 생성기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportGenConfig {
    /// 메모 최대 길이 (문자)
    pub max_note_len: usize,
    /// 보관 리포트 최대 수
    pub max_reports: usize,
}

impl Default for ReportGenConfig {
    fn default() -> Self {
        Self {
            max_note_len: 1024,
            max_reports: 10_000,
        }
    }
}

/// 설정 상한값 상수
const MAX_NOTE_LEN_CEILING: usize = 64 * 1024;
const MAX_REPORTS_CEILING: usize = 1_000_000;

impl ReportGenConfig {
    /// core의 `ReportConfig`에서 생성기 설정을 생성합니다.
    pub fn from_core(core: &billpost_core::config::ReportConfig) -> Self {
        Self {
            max_note_len: core.max_note_len,
            max_reports: core.max_reports,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ReportGenError> {
        if self.max_note_len == 0 || self.max_note_len > MAX_NOTE_LEN_CEILING {
            return Err(ReportGenError::Config {
                field: "max_note_len".to_owned(),
                reason: format!("must be 1-{MAX_NOTE_LEN_CEILING}"),
            });
        }

        if self.max_reports == 0 || self.max_reports > MAX_REPORTS_CEILING {
            return Err(ReportGenError::Config {
                field: "max_reports".to_owned(),
                reason: format!("must be 1-{MAX_REPORTS_CEILING}"),
            });
        }

        Ok(())
    }
}
