//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `billpost_`
//! - 모듈명: `auth_`, `dispatch_`, `report_`, `daemon_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use billpost_core::metrics;
//! use metrics::counter;
//!
//! counter!(billpost_core::metrics::DISPATCH_ASSIGNMENTS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 역할 레이블 키 (coordinator, messenger)
pub const LABEL_ROLE: &str = "role";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 검증 결정 레이블 키 (verified, rejected)
pub const LABEL_DECISION: &str = "decision";

// ─── Auth Guard 메트릭 ─────────────────────────────────────────────

/// Auth: 로그인 시도 수 (counter, label: result)
pub const AUTH_LOGINS_TOTAL: &str = "billpost_auth_logins_total";

/// Auth: 역할/소유권 거부 수 (counter)
pub const AUTH_FORBIDDEN_TOTAL: &str = "billpost_auth_forbidden_total";

/// Auth: 활성 세션 수 (gauge)
pub const AUTH_SESSIONS_ACTIVE: &str = "billpost_auth_sessions_active";

// ─── Dispatch 메트릭 ───────────────────────────────────────────────

/// Dispatch: 생성된 고지서 수 (counter)
pub const DISPATCH_BILLS_CREATED_TOTAL: &str = "billpost_dispatch_bills_created_total";

/// Dispatch: 배정된 배송 수 (counter)
pub const DISPATCH_ASSIGNMENTS_TOTAL: &str = "billpost_dispatch_assignments_total";

/// Dispatch: 일괄 배정 거부 수 (counter)
pub const DISPATCH_ASSIGNMENT_CONFLICTS_TOTAL: &str =
    "billpost_dispatch_assignment_conflicts_total";

/// Dispatch: 제출된 증빙 수 (counter)
pub const DISPATCH_PROOFS_SUBMITTED_TOTAL: &str = "billpost_dispatch_proofs_submitted_total";

/// Dispatch: 검증 결정 수 (counter, label: decision)
pub const DISPATCH_VERIFICATIONS_TOTAL: &str = "billpost_dispatch_verifications_total";

/// Dispatch: 미배정 고지서 수 (gauge)
pub const DISPATCH_BILLS_UNASSIGNED: &str = "billpost_dispatch_bills_unassigned";

// ─── Report 메트릭 ─────────────────────────────────────────────────

/// Report: 생성된 리포트 수 (counter)
pub const REPORT_GENERATED_TOTAL: &str = "billpost_report_generated_total";

/// Report: 보관 중인 리포트 수 (gauge)
pub const REPORT_STORE_SIZE: &str = "billpost_report_store_size";

// ─── Daemon 메트릭 ─────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "billpost_daemon_uptime_seconds";

/// Daemon: 빌드 정보 (gauge, label: version)
pub const DAEMON_BUILD_INFO: &str = "billpost_daemon_build_info";

/// 모든 메트릭의 설명을 레코더에 등록합니다.
///
/// 메트릭 레코더 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(AUTH_LOGINS_TOTAL, "Login attempts by result");
    describe_counter!(AUTH_FORBIDDEN_TOTAL, "Role or ownership denials");
    describe_gauge!(AUTH_SESSIONS_ACTIVE, "Currently active sessions");

    describe_counter!(DISPATCH_BILLS_CREATED_TOTAL, "Bills created");
    describe_counter!(DISPATCH_ASSIGNMENTS_TOTAL, "Deliveries created by assignment");
    describe_counter!(
        DISPATCH_ASSIGNMENT_CONFLICTS_TOTAL,
        "Batch assignments rejected atomically"
    );
    describe_counter!(DISPATCH_PROOFS_SUBMITTED_TOTAL, "Delivery proofs accepted");
    describe_counter!(
        DISPATCH_VERIFICATIONS_TOTAL,
        "Verification decisions by outcome"
    );
    describe_gauge!(DISPATCH_BILLS_UNASSIGNED, "Bills awaiting assignment");

    describe_counter!(REPORT_GENERATED_TOTAL, "Daily summary reports generated");
    describe_gauge!(REPORT_STORE_SIZE, "Reports currently retained");

    describe_gauge!(DAEMON_UPTIME_SECONDS, "Daemon uptime in seconds");
    describe_gauge!(DAEMON_BUILD_INFO, "Daemon build information");
}
