//! 디스패치 에러 타입
//!
//! [`DispatchError`]는 고지서 원장, 배정 엔진, 배송 추적, 검증 단계에서
//! 발생하는 모든 에러를 표현합니다.
//! `From<DispatchError> for BillpostError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use billpost_core::error::{AuthError, BillError, BillpostError, ConfigError, DeliveryError};
use billpost_core::types::DeliveryState;

/// 디스패치 도메인 에러
///
/// 상태 전이 거부, 중복/충돌 판정, 역할·소유권 위반, 설정 에러 등
/// 디스패치 내부의 모든 에러 상황을 포괄합니다.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// 역할 불일치
    #[error("forbidden: {operation}: {reason}")]
    Forbidden {
        /// 거부된 연산명
        operation: String,
        /// 거부 사유
        reason: String,
    },

    /// 소유권 불일치 — 다른 배달원의 배송에 대한 증빙 제출 시도
    #[error("forbidden: delivery '{delivery_id}' is not assigned to messenger '{messenger_id}'")]
    NotOwner {
        /// 대상 배송 ID
        delivery_id: String,
        /// 호출한 배달원 ID
        messenger_id: String,
    },

    /// 알 수 없는 고지서 ID
    #[error("bill not found: {0}")]
    BillNotFound(String),

    /// (계좌번호, 청구월) 중복
    #[error("duplicate bill: account '{account_number}' already billed for {billing_month}")]
    DuplicateBill {
        /// 중복된 계좌번호
        account_number: String,
        /// 중복된 청구월
        billing_month: String,
    },

    /// 형식이 잘못된 고지서 입력
    #[error("invalid bill input: {reason}")]
    InvalidBillInput {
        /// 거부 사유
        reason: String,
    },

    /// 이미 배정된 고지서에 대한 재배정 시도
    #[error("bill already assigned: {0}")]
    AlreadyAssigned(String),

    /// 일괄 배정 실패 — 배치 전체가 원자적으로 거부됨
    #[error("assignment conflict: {} bill(s) not assignable: {}", .conflicts.len(), .conflicts.join(", "))]
    AssignmentConflict {
        /// 배정 불가능한 고지서 ID 목록
        conflicts: Vec<String>,
    },

    /// 알 수 없는 배달원 ID
    #[error("messenger not found: {0}")]
    MessengerNotFound(String),

    /// 빈 배정 배치
    #[error("assignment batch is empty")]
    EmptyAssignment,

    /// 배정 배치 크기 초과
    #[error("assignment batch too large: {size} bills (max: {max})")]
    BatchTooLarge {
        /// 요청된 배치 크기
        size: usize,
        /// 설정된 상한
        max: usize,
    },

    /// 고지서 저장소 상한 도달
    #[error("bill store full: {max} bills retained")]
    StoreFull {
        /// 설정된 상한
        max: usize,
    },

    /// 알 수 없는 배송 ID
    #[error("delivery not found: {0}")]
    DeliveryNotFound(String),

    /// 순서에 맞지 않는 상태 전이 시도
    #[error("invalid state for {operation}: delivery '{delivery_id}' is {current}")]
    InvalidState {
        /// 대상 배송 ID
        delivery_id: String,
        /// 현재 상태
        current: DeliveryState,
        /// 시도된 연산명
        operation: String,
    },

    /// 증빙 페이로드 크기 초과
    #[error("proof too large: {size} bytes (max: {max})")]
    ProofTooLarge {
        /// 제출된 크기
        size: usize,
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

impl From<DispatchError> for BillpostError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Forbidden { operation, reason } => {
                BillpostError::Auth(AuthError::Forbidden { operation, reason })
            }
            DispatchError::NotOwner {
                delivery_id,
                messenger_id,
            } => BillpostError::Auth(AuthError::Forbidden {
                operation: "submit proof".to_owned(),
                reason: format!(
                    "delivery '{delivery_id}' is not assigned to messenger '{messenger_id}'"
                ),
            }),
            DispatchError::BillNotFound(id) => BillpostError::Bill(BillError::NotFound(id)),
            DispatchError::DuplicateBill {
                account_number,
                billing_month,
            } => BillpostError::Bill(BillError::Duplicate {
                account_number,
                billing_month,
            }),
            DispatchError::InvalidBillInput { reason } => {
                BillpostError::Bill(BillError::InvalidRequest { reason })
            }
            DispatchError::AlreadyAssigned(id) => {
                BillpostError::Bill(BillError::AlreadyAssigned(id))
            }
            DispatchError::AssignmentConflict { conflicts } => {
                BillpostError::Bill(BillError::AssignmentConflict { conflicts })
            }
            DispatchError::MessengerNotFound(id) => {
                BillpostError::Bill(BillError::MessengerNotFound(id))
            }
            DispatchError::EmptyAssignment => BillpostError::Bill(BillError::InvalidRequest {
                reason: "assignment batch is empty".to_owned(),
            }),
            DispatchError::BatchTooLarge { size, max } => {
                BillpostError::Bill(BillError::InvalidRequest {
                    reason: format!("assignment batch too large: {size} bills (max: {max})"),
                })
            }
            DispatchError::StoreFull { max } => BillpostError::Bill(BillError::InvalidRequest {
                reason: format!("bill store full: {max} bills retained"),
            }),
            DispatchError::DeliveryNotFound(id) => {
                BillpostError::Delivery(DeliveryError::NotFound(id))
            }
            DispatchError::InvalidState {
                delivery_id,
                current,
                operation,
            } => BillpostError::Delivery(DeliveryError::InvalidState {
                delivery_id,
                current: current.to_string(),
                operation,
            }),
            DispatchError::ProofTooLarge { size, max } => {
                BillpostError::Delivery(DeliveryError::ProofTooLarge { size, max })
            }
            DispatchError::Config { field, reason } => {
                BillpostError::Config(ConfigError::InvalidValue { field, reason })
            }
        }
    }
}
