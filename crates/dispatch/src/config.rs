//! 디스패치 설정
//!
//! [`LedgerConfig`]는 core의 [`DispatchConfig`](billpost_core::config::DispatchConfig)를
//! 기반으로 원장과 배정 엔진의 상한값을 제공합니다.

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// 디스패치 설정
///
/// core의 `DispatchConfig`에서 파생됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// 증빙 페이로드 최대 크기 (바이트)
    pub max_proof_bytes: usize,
    /// 일괄 배정 최대 건수
    pub max_assign_batch: usize,
    /// 저장 가능한 고지서 최대 수
    pub max_bills: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_proof_bytes: 5 * 1024 * 1024,
            max_assign_batch: 100,
            max_bills: 100_000,
        }
    }
}

/// 설정 상한값 상수
const MAX_PROOF_BYTES_CEILING: usize = 50 * 1024 * 1024;
const MAX_ASSIGN_BATCH_CEILING: usize = 1000;
const MAX_BILLS_CEILING: usize = 10_000_000;

impl LedgerConfig {
    /// core의 `DispatchConfig`에서 원장 설정을 생성합니다.
    pub fn from_core(core: &billpost_core::config::DispatchConfig) -> Self {
        Self {
            max_proof_bytes: core.max_proof_bytes,
            max_assign_batch: core.max_assign_batch,
            max_bills: core.max_bills,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.max_proof_bytes == 0 || self.max_proof_bytes > MAX_PROOF_BYTES_CEILING {
            return Err(DispatchError::Config {
                field: "max_proof_bytes".to_owned(),
                reason: format!("must be 1-{MAX_PROOF_BYTES_CEILING}"),
            });
        }

        if self.max_assign_batch == 0 || self.max_assign_batch > MAX_ASSIGN_BATCH_CEILING {
            return Err(DispatchError::Config {
                field: "max_assign_batch".to_owned(),
                reason: format!("must be 1-{MAX_ASSIGN_BATCH_CEILING}"),
            });
        }

        if self.max_bills == 0 || self.max_bills > MAX_BILLS_CEILING {
            return Err(DispatchError::Config {
                field: "max_bills".to_owned(),
                reason: format!("must be 1-{MAX_BILLS_CEILING}"),
            });
        }

        Ok(())
    }
}

/// 디스패치 설정 빌더
#[derive(Default)]
pub struct LedgerConfigBuilder {
    config: LedgerConfig,
}

impl LedgerConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 증빙 최대 크기(바이트)를 설정합니다.
    pub fn max_proof_bytes(mut self, bytes: usize) -> Self {
        self.config.max_proof_bytes = bytes;
        self
    }

    /// 일괄 배정 최대 건수를 설정합니다.
    pub fn max_assign_batch(mut self, max: usize) -> Self {
        self.config.max_assign_batch = max;
        self
    }

    /// 고지서 최대 수를 설정합니다.
    pub fn max_bills(mut self, max: usize) -> Self {
        self.config.max_bills = max;
        self
    }

    /// 설정을 검증하고 `LedgerConfig`를 생성합니다.
    pub fn build(self) -> Result<LedgerConfig, DispatchError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
