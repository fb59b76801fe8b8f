//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 모든 모듈이 공유하는 데이터 구조를 정의합니다.
//! 각 모듈은 이 타입들을 사용하여 고지서, 배송, 리포트 데이터를 교환합니다.

use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// 역할 — 호출자가 수행할 수 있는 작업의 범위를 결정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// 관리 역할 — 고지서 생성/배정, 배송 검증, 리포트 생성
    Coordinator,
    /// 배달원 역할 — 배정된 배송 수행 및 증빙 제출
    Messenger,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coordinator => write!(f, "coordinator"),
            Self::Messenger => write!(f, "messenger"),
        }
    }
}

impl Role {
    /// 문자열에서 역할을 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "coordinator" => Some(Self::Coordinator),
            "messenger" => Some(Self::Messenger),
            _ => None,
        }
    }
}

/// 인증된 주체 — 역할 태그가 붙은 호출자 식별자
///
/// 세션 토큰이 해석된 결과이며, 모든 컴포넌트 연산에 명시적 인자로
/// 전달됩니다. 전역 가변 세션 상태는 존재하지 않습니다.
/// 권한 검사는 variant 매칭으로 수행합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Principal {
    /// 코디네이터 주체
    Coordinator {
        /// 계정 ID
        id: String,
    },
    /// 메신저(배달원) 주체
    Messenger {
        /// 계정 ID
        id: String,
    },
}

impl Principal {
    /// 주체의 계정 ID를 반환합니다.
    pub fn id(&self) -> &str {
        match self {
            Self::Coordinator { id } | Self::Messenger { id } => id,
        }
    }

    /// 주체의 역할을 반환합니다.
    pub fn role(&self) -> Role {
        match self {
            Self::Coordinator { .. } => Role::Coordinator,
            Self::Messenger { .. } => Role::Messenger,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.role(), self.id())
    }
}

/// 청구 월 — `"YYYY-MM"` 형식의 값 타입
///
/// (계좌번호, 청구월) 쌍이 고지서 중복 판정의 기준이 됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BillingMonth {
    /// 연도 (예: 2026)
    pub year: u16,
    /// 월 (1-12)
    pub month: u8,
}

impl BillingMonth {
    /// 연도와 월로 청구 월을 생성합니다.
    ///
    /// 월이 1-12 범위를 벗어나면 `None`을 반환합니다.
    pub fn new(year: u16, month: u8) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }
}

impl FromStr for BillingMonth {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ParseError::BillingMonth {
            value: s.to_owned(),
            reason: reason.to_owned(),
        };

        let (year_str, month_str) = s
            .split_once('-')
            .ok_or_else(|| invalid("expected YYYY-MM"))?;
        if year_str.len() != 4 || month_str.len() != 2 {
            return Err(invalid("expected YYYY-MM"));
        }
        let year: u16 = year_str.parse().map_err(|_| invalid("invalid year"))?;
        let month: u8 = month_str.parse().map_err(|_| invalid("invalid month"))?;
        Self::new(year, month).ok_or_else(|| invalid("month must be 01-12"))
    }
}

impl TryFrom<String> for BillingMonth {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BillingMonth> for String {
    fn from(m: BillingMonth) -> Self {
        m.to_string()
    }
}

impl fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// 리포트 날짜 — `"YYYY-MM-DD"` 형식의 값 타입
///
/// 일일 요약 리포트(DSR)가 귀속되는 달력 날짜를 나타냅니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReportDate {
    /// 연도
    pub year: u16,
    /// 월 (1-12)
    pub month: u8,
    /// 일 (1-31, 해당 월의 길이로 검증)
    pub day: u8,
}

impl ReportDate {
    /// 연·월·일로 리포트 날짜를 생성합니다.
    ///
    /// 존재하지 않는 날짜(예: 2월 30일)는 `None`을 반환합니다.
    pub fn new(year: u16, month: u8, day: u8) -> Option<Self> {
        chrono::NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))?;
        Some(Self { year, month, day })
    }

    /// 오늘(UTC)에 해당하는 리포트 날짜를 반환합니다.
    pub fn today_utc() -> Self {
        use chrono::Datelike;
        let today = chrono::Utc::now().date_naive();
        Self {
            year: today.year() as u16,
            month: today.month() as u8,
            day: today.day() as u8,
        }
    }
}

impl FromStr for ReportDate {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ParseError::ReportDate {
            value: s.to_owned(),
            reason: reason.to_owned(),
        };

        let mut parts = s.splitn(3, '-');
        let (year_str, month_str, day_str) =
            match (parts.next(), parts.next(), parts.next()) {
                (Some(y), Some(m), Some(d)) => (y, m, d),
                _ => return Err(invalid("expected YYYY-MM-DD")),
            };
        if year_str.len() != 4 || month_str.len() != 2 || day_str.len() != 2 {
            return Err(invalid("expected YYYY-MM-DD"));
        }
        let year: u16 = year_str.parse().map_err(|_| invalid("invalid year"))?;
        let month: u8 = month_str.parse().map_err(|_| invalid("invalid month"))?;
        let day: u8 = day_str.parse().map_err(|_| invalid("invalid day"))?;
        Self::new(year, month, day).ok_or_else(|| invalid("no such calendar date"))
    }
}

impl TryFrom<String> for ReportDate {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ReportDate> for String {
    fn from(d: ReportDate) -> Self {
        d.to_string()
    }
}

impl fmt::Display for ReportDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// 고지서 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillType {
    /// 정기 고지서
    Regular,
    /// 최종 납부 독촉
    FinalNotice,
    /// 공급 중단 예고
    Disconnection,
}

impl BillType {
    /// 문자열에서 고지서 유형을 파싱합니다.
    ///
    /// 대소문자를 구분하지 않으며, 기존 시스템의 `regular_bill` 표기도
    /// 허용합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "regular" | "regular_bill" => Some(Self::Regular),
            "final_notice" | "final" => Some(Self::FinalNotice),
            "disconnection" | "disconnection_notice" => Some(Self::Disconnection),
            _ => None,
        }
    }
}

impl fmt::Display for BillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regular => write!(f, "regular"),
            Self::FinalNotice => write!(f, "final_notice"),
            Self::Disconnection => write!(f, "disconnection"),
        }
    }
}

/// 고지서 상태
///
/// `Unassigned -> Assigned` 전이는 배정 엔진에 의해 정확히 한 번만
/// 일어납니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    /// 미배정
    #[default]
    Unassigned,
    /// 배정 완료 (배송 레코드 존재)
    Assigned,
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unassigned => write!(f, "unassigned"),
            Self::Assigned => write!(f, "assigned"),
        }
    }
}

impl BillStatus {
    /// 문자열에서 고지서 상태를 파싱합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "unassigned" => Some(Self::Unassigned),
            "assigned" => Some(Self::Assigned),
            _ => None,
        }
    }
}

/// 고지서 레코드
///
/// 배달 대상이 되는 청구 계정 레코드입니다. 상태 필드는 배정 엔진만
/// 변경합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    /// 고지서 고유 ID
    pub id: String,
    /// 계좌번호 — (계좌번호, 청구월) 쌍으로 유일
    pub account_number: String,
    /// 고객명
    pub customer_name: String,
    /// 배달 주소
    pub address: String,
    /// 배달 경로 코드 (예: "R1")
    pub route: String,
    /// 고지서 유형
    pub bill_type: BillType,
    /// 청구 월
    pub billing_month: BillingMonth,
    /// 현재 상태
    pub status: BillStatus,
    /// 생성 시각
    pub created_at: SystemTime,
}

impl fmt::Display for Bill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) route={} status={}",
            self.account_number, self.billing_month, self.route, self.status,
        )
    }
}

/// 고지서 생성 입력
///
/// 코디네이터가 고지서 일괄 생성 시 제출하는 항목입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillInput {
    /// 계좌번호
    pub account_number: String,
    /// 고객명
    pub customer_name: String,
    /// 배달 주소
    pub address: String,
    /// 배달 경로 코드
    pub route: String,
    /// 고지서 유형
    pub bill_type: BillType,
    /// 청구 월
    pub billing_month: BillingMonth,
}

/// 배달원(메신저) 레코드
///
/// 시드 데이터로 공급되며 이 코어에서는 읽기 전용입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Messenger {
    /// 배달원 계정 ID
    pub id: String,
    /// 배달원 이름
    pub name: String,
    /// 이메일 (유일)
    pub email: String,
}

impl fmt::Display for Messenger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// 배달 증빙 — 배달원이 제출하는 불투명 이미지 페이로드
///
/// 원본 데이터는 `bytes::Bytes`로 보관하여 복사 없이 공유됩니다.
#[derive(Debug, Clone)]
pub struct ProofImage {
    /// 페이로드 MIME 타입 (예: "image/png")
    pub content_type: String,
    /// 인코딩된 이미지 데이터
    pub data: Bytes,
}

impl ProofImage {
    /// 새 증빙 페이로드를 생성합니다.
    pub fn new(content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            content_type: content_type.into(),
            data,
        }
    }

    /// 페이로드 크기 (바이트)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 페이로드가 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Display for ProofImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.content_type, self.data.len())
    }
}

/// 배송 상태
///
/// 상태는 앞으로만 진행합니다:
/// `Assigned -> ProofSubmitted -> {Verified | Rejected}`.
/// 건너뛰기와 되돌리기는 허용되지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    /// 배정됨 — 증빙 제출 대기
    Assigned,
    /// 증빙 제출됨 — 검증 대기
    ProofSubmitted,
    /// 검증 완료 (최종)
    Verified,
    /// 반려됨 (최종)
    Rejected,
}

impl DeliveryState {
    /// 최종 상태 여부를 반환합니다.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified | Self::Rejected)
    }

    /// `next`로의 전이가 상태 기계상 허용되는지 확인합니다.
    pub fn can_advance_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Assigned, Self::ProofSubmitted)
                | (Self::ProofSubmitted, Self::Verified)
                | (Self::ProofSubmitted, Self::Rejected)
        )
    }

    /// 문자열에서 배송 상태를 파싱합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "assigned" => Some(Self::Assigned),
            "proof_submitted" => Some(Self::ProofSubmitted),
            "verified" => Some(Self::Verified),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assigned => write!(f, "assigned"),
            Self::ProofSubmitted => write!(f, "proof_submitted"),
            Self::Verified => write!(f, "verified"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// 검증 결정
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationDecision {
    /// 배달 완료로 확정
    Verified,
    /// 반려
    Rejected,
}

impl VerificationDecision {
    /// 결정이 귀결되는 최종 배송 상태를 반환합니다.
    pub fn terminal_state(&self) -> DeliveryState {
        match self {
            Self::Verified => DeliveryState::Verified,
            Self::Rejected => DeliveryState::Rejected,
        }
    }

    /// 문자열에서 검증 결정을 파싱합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "verified" => Some(Self::Verified),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for VerificationDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified => write!(f, "verified"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// 배송 레코드
///
/// 고지서와 1:1로 묶이는 배달 추적 인스턴스입니다. 배정 엔진이 생성하고,
/// 증빙 제출과 검증 단계만 상태를 전진시킵니다.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// 배송 고유 ID
    pub id: String,
    /// 대상 고지서 ID (생성 후 불변)
    pub bill_id: String,
    /// 배정된 배달원 ID
    pub messenger_id: String,
    /// 현재 상태
    pub state: DeliveryState,
    /// 제출된 증빙 (제출 전에는 None)
    pub proof: Option<ProofImage>,
    /// 검증 메모 (검증 전에는 None)
    pub verification_note: Option<String>,
    /// 배정 시각
    pub assigned_at: SystemTime,
    /// 증빙 제출 시각
    pub proof_submitted_at: Option<SystemTime>,
    /// 검증/반려 시각
    pub verified_at: Option<SystemTime>,
}

impl Delivery {
    /// 증빙 제출 여부를 반환합니다.
    pub fn has_proof(&self) -> bool {
        self.proof.is_some()
    }
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "delivery[{}] bill={} messenger={} state={}",
            &self.id[..8.min(self.id.len())],
            &self.bill_id[..8.min(self.bill_id.len())],
            self.messenger_id,
            self.state,
        )
    }
}

/// 배송 상태별 집계
///
/// 리포트 생성 시점의 배송 스냅샷을 상태별 건수로 요약합니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryTally {
    /// 배정됨 (증빙 대기)
    pub assigned: u64,
    /// 증빙 제출됨 (검증 대기)
    pub proof_submitted: u64,
    /// 검증 완료
    pub verified: u64,
    /// 반려됨
    pub rejected: u64,
}

impl DeliveryTally {
    /// 상태 하나를 집계에 반영합니다.
    pub fn record(&mut self, state: DeliveryState) {
        match state {
            DeliveryState::Assigned => self.assigned += 1,
            DeliveryState::ProofSubmitted => self.proof_submitted += 1,
            DeliveryState::Verified => self.verified += 1,
            DeliveryState::Rejected => self.rejected += 1,
        }
    }

    /// 전체 배송 건수를 반환합니다.
    pub fn total(&self) -> u64 {
        self.assigned + self.proof_submitted + self.verified + self.rejected
    }

    /// 최종 상태(검증/반려) 건수를 반환합니다.
    pub fn terminal(&self) -> u64 {
        self.verified + self.rejected
    }
}

impl fmt::Display for DeliveryTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "assigned={} proof_submitted={} verified={} rejected={}",
            self.assigned, self.proof_submitted, self.verified, self.rejected,
        )
    }
}

/// 일일 요약 리포트 (DSR)
///
/// 생성 시점의 배송 집계 스냅샷을 담는 불변 레코드입니다.
/// 같은 날짜에 여러 리포트를 생성할 수 있습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyReport {
    /// 리포트 고유 ID
    pub id: String,
    /// 리포트 귀속 날짜
    pub report_date: ReportDate,
    /// 작성 메모
    pub note: String,
    /// 상태별 배송 집계
    pub tally: DeliveryTally,
    /// 생성 시각
    pub generated_at: SystemTime,
}

impl fmt::Display for DailyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dsr[{}] {} total={} ({})",
            &self.id[..8.min(self.id.len())],
            self.report_date,
            self.tally.total(),
            self.tally,
        )
    }
}
