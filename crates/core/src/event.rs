//! 이벤트 시스템 — 모듈 간 통신의 기본 단위
//!
//! 도메인 컴포넌트는 상태 전이가 커밋된 후 감사(audit) 이벤트를
//! 이벤트 기반 메시지 패싱으로 발행합니다.
//! [`EventMetadata`]는 모든 이벤트에 공통으로 포함되는 메타데이터이며,
//! [`Event`] trait은 모든 이벤트 타입이 구현해야 하는 인터페이스입니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::types::{DeliveryTally, ReportDate};

// --- 모듈명 상수 ---

/// 인증 가드 모듈명
pub const MODULE_AUTH_GUARD: &str = "auth-guard";
/// 디스패치(고지서/배송) 모듈명
pub const MODULE_DISPATCH: &str = "dispatch";
/// 리포트 생성기 모듈명
pub const MODULE_REPORT: &str = "report-generator";
/// 데몬 모듈명
pub const MODULE_DAEMON: &str = "daemon";

// --- 이벤트 타입 상수 ---

/// 배송 생명주기 이벤트 타입
pub const EVENT_TYPE_DELIVERY: &str = "delivery";
/// 리포트 생성 이벤트 타입
pub const EVENT_TYPE_REPORT: &str = "report";

/// 이벤트 메타데이터 — 모든 이벤트에 공통으로 포함되는 추적 정보
///
/// 각 이벤트의 발생 시각, 생성 모듈, 추적 ID를 담고 있어
/// 이벤트 흐름을 추적하고 디버깅할 수 있습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// 이벤트 발생 시각
    pub timestamp: SystemTime,
    /// 이벤트를 생성한 모듈명 (예: "dispatch", "report-generator")
    pub source_module: String,
    /// 추적 ID — 같은 요청 흐름의 이벤트를 연결합니다
    pub trace_id: String,
}

impl EventMetadata {
    /// 기존 trace_id를 사용하여 새 메타데이터를 생성합니다.
    ///
    /// 이벤트 체인에서 동일한 추적 ID를 유지할 때 사용합니다.
    pub fn new(source_module: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: trace_id.into(),
        }
    }

    /// 새로운 UUID v4 trace_id를 생성하여 메타데이터를 만듭니다.
    ///
    /// 새로운 이벤트 체인의 시작점에서 사용합니다.
    pub fn with_new_trace(source_module: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl fmt::Display for EventMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "source={} trace={}",
            self.source_module, self.trace_id,
        )
    }
}

/// 모든 이벤트가 구현해야 하는 기본 trait
///
/// `Send + Sync + 'static` 바운드로 `tokio::mpsc` 채널을 통한
/// 안전한 전송을 보장합니다.
pub trait Event: Send + Sync + 'static {
    /// 이벤트 고유 ID (UUID v4)
    fn event_id(&self) -> &str;

    /// 이벤트 메타데이터 (timestamp, source_module, trace_id)
    fn metadata(&self) -> &EventMetadata;

    /// 이벤트 타입명 (로깅 및 라우팅에 사용)
    fn event_type(&self) -> &str;
}

/// 배송 생명주기 이벤트 종류
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryEventKind {
    /// 고지서가 배달원에게 배정됨
    Assigned,
    /// 배달 증빙이 제출됨
    ProofSubmitted {
        /// 제출된 증빙 크기 (바이트)
        proof_bytes: usize,
    },
    /// 배송이 검증 완료됨
    Verified,
    /// 배송이 반려됨
    Rejected,
}

impl fmt::Display for DeliveryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assigned => write!(f, "assigned"),
            Self::ProofSubmitted { proof_bytes } => {
                write!(f, "proof_submitted({proof_bytes} bytes)")
            }
            Self::Verified => write!(f, "verified"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// 배송 생명주기 감사 이벤트
///
/// 디스패치 모듈에서 상태 전이가 커밋된 직후 발행됩니다.
/// 데몬의 감사 로거가 수신하여 구조화 로그로 남깁니다.
#[derive(Debug, Clone)]
pub struct DeliveryEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 대상 배송 ID
    pub delivery_id: String,
    /// 대상 고지서 ID
    pub bill_id: String,
    /// 배정된 배달원 ID
    pub messenger_id: String,
    /// 이벤트 종류
    pub kind: DeliveryEventKind,
}

impl DeliveryEvent {
    /// 새로운 trace를 시작하는 배송 이벤트를 생성합니다.
    pub fn new(
        delivery_id: impl Into<String>,
        bill_id: impl Into<String>,
        messenger_id: impl Into<String>,
        kind: DeliveryEventKind,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_DISPATCH),
            delivery_id: delivery_id.into(),
            bill_id: bill_id.into(),
            messenger_id: messenger_id.into(),
            kind,
        }
    }

    /// 기존 trace에 연결된 배송 이벤트를 생성합니다.
    pub fn with_trace(
        delivery_id: impl Into<String>,
        bill_id: impl Into<String>,
        messenger_id: impl Into<String>,
        kind: DeliveryEventKind,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::new(MODULE_DISPATCH, trace_id),
            delivery_id: delivery_id.into(),
            bill_id: bill_id.into(),
            messenger_id: messenger_id.into(),
            kind,
        }
    }
}

impl Event for DeliveryEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_DELIVERY
    }
}

impl fmt::Display for DeliveryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DeliveryEvent[{}] delivery={} bill={} messenger={} kind={}",
            &self.id[..8.min(self.id.len())],
            &self.delivery_id[..8.min(self.delivery_id.len())],
            &self.bill_id[..8.min(self.bill_id.len())],
            self.messenger_id,
            self.kind,
        )
    }
}

/// 리포트 생성 감사 이벤트
///
/// 리포트 생성기가 DSR을 저장한 직후 발행됩니다.
#[derive(Debug, Clone)]
pub struct ReportEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 생성된 리포트 ID
    pub report_id: String,
    /// 리포트 귀속 날짜
    pub report_date: ReportDate,
    /// 리포트에 담긴 집계
    pub tally: DeliveryTally,
}

impl ReportEvent {
    /// 새로운 trace를 시작하는 리포트 이벤트를 생성합니다.
    pub fn new(report_id: impl Into<String>, report_date: ReportDate, tally: DeliveryTally) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_REPORT),
            report_id: report_id.into(),
            report_date,
            tally,
        }
    }
}

impl Event for ReportEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_REPORT
    }
}

impl fmt::Display for ReportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReportEvent[{}] report={} date={} total={}",
            &self.id[..8.min(self.id.len())],
            &self.report_id[..8.min(self.report_id.len())],
            self.report_date,
            self.tally.total(),
        )
    }
}
