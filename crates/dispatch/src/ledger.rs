//! 디스패치 원장 -- 고지서와 배송 레코드의 단일 저장소
//!
//! [`DispatchLedger`]는 고지서와 배송을 하나의 `RwLock` 아래에 보관합니다.
//! 모든 상태 전이는 한 번의 쓰기 락 임계 구역 안에서 검증과 변경을
//! 함께 수행하므로, 같은 엔티티에 대한 동시 전이는 하나만 성공하고
//! 일괄 배정은 롤백 프로토콜 없이 전체-또는-전무로 커밋됩니다.
//!
//! 읽기 뷰(`list_bills`, 추적 뷰, 집계)는 읽기 락을 사용하며 배치의
//! 일부만 반영된 상태를 관찰할 수 없습니다.
//!
//! 영속 스토리지는 외부 협력자입니다. 이 원장은 그 자리에 서는
//! 인메모리 구현이며, 컴포넌트 API가 경계를 이룹니다.

use std::collections::HashSet;
use std::time::SystemTime;

use tokio::sync::RwLock;
use tracing::{info, warn};

use billpost_core::metrics as m;
use billpost_core::service::{Component, DeliveryFeed, HealthStatus};
use billpost_core::types::{
    Bill, BillInput, BillStatus, Delivery, DeliveryState, DeliveryTally, Principal, ProofImage,
    VerificationDecision,
};

use crate::config::LedgerConfig;
use crate::error::DispatchError;
use crate::tracker::{TrackingEntry, TrackingFilter};

/// 원장 내부 상태
///
/// `bills`는 생성 순서, `deliveries`는 배정 순서를 유지합니다.
#[derive(Default)]
struct LedgerInner {
    bills: Vec<Bill>,
    deliveries: Vec<Delivery>,
}

/// 디스패치 원장
///
/// 고지서 저장소 연산(`create_bills`, `list_bills`)은 여기서 역할을
/// 직접 검사합니다. 배정/증빙/검증 전이는 각 컴포넌트가 역할·소유권을
/// 검사한 뒤 crate 내부 메서드로 호출합니다.
pub struct DispatchLedger {
    config: LedgerConfig,
    inner: RwLock<LedgerInner>,
}

impl DispatchLedger {
    /// 설정을 검증하고 빈 원장을 생성합니다.
    pub fn new(config: LedgerConfig) -> Result<Self, DispatchError> {
        config.validate()?;
        Ok(Self {
            config,
            inner: RwLock::new(LedgerInner::default()),
        })
    }

    /// 원장 설정을 반환합니다.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// 고지서를 일괄 생성합니다.
    ///
    /// 코디네이터 전용. 입력 전체가 검증을 통과해야 하나라도 저장되며,
    /// (계좌번호, 청구월)은 기존 고지서와 배치 내부 모두에서 유일해야
    /// 합니다. 새 고지서는 `Unassigned` 상태로 시작합니다.
    pub async fn create_bills(
        &self,
        principal: &Principal,
        inputs: Vec<BillInput>,
    ) -> Result<Vec<Bill>, DispatchError> {
        require_coordinator(principal, "create bills")?;

        if inputs.is_empty() {
            return Err(DispatchError::InvalidBillInput {
                reason: "no bill inputs provided".to_owned(),
            });
        }
        for input in &inputs {
            validate_bill_input(input)?;
        }

        let mut inner = self.inner.write().await;

        if inner.bills.len() + inputs.len() > self.config.max_bills {
            return Err(DispatchError::StoreFull {
                max: self.config.max_bills,
            });
        }

        // 배치 내부 중복 검사
        let mut batch_keys: HashSet<(String, String)> = HashSet::new();
        for input in &inputs {
            let key = (
                input.account_number.clone(),
                input.billing_month.to_string(),
            );
            if !batch_keys.insert(key) {
                return Err(DispatchError::DuplicateBill {
                    account_number: input.account_number.clone(),
                    billing_month: input.billing_month.to_string(),
                });
            }
        }

        // 기존 고지서와의 중복 검사
        for input in &inputs {
            let duplicate = inner.bills.iter().any(|b| {
                b.account_number == input.account_number && b.billing_month == input.billing_month
            });
            if duplicate {
                return Err(DispatchError::DuplicateBill {
                    account_number: input.account_number.clone(),
                    billing_month: input.billing_month.to_string(),
                });
            }
        }

        let now = SystemTime::now();
        let mut created = Vec::with_capacity(inputs.len());
        for input in inputs {
            let bill = Bill {
                id: uuid::Uuid::new_v4().to_string(),
                account_number: input.account_number,
                customer_name: input.customer_name,
                address: input.address,
                route: input.route,
                bill_type: input.bill_type,
                billing_month: input.billing_month,
                status: BillStatus::Unassigned,
                created_at: now,
            };
            inner.bills.push(bill.clone());
            created.push(bill);
        }

        metrics::counter!(m::DISPATCH_BILLS_CREATED_TOTAL).increment(created.len() as u64);
        update_unassigned_gauge(&inner);
        info!(
            coordinator = principal.id(),
            bills = created.len(),
            "bills created"
        );
        Ok(created)
    }

    /// 고지서 목록을 반환합니다.
    ///
    /// 코디네이터 전용. 생성 시각 오름차순이며 빈 목록은 에러가 아닙니다.
    pub async fn list_bills(
        &self,
        principal: &Principal,
        status: Option<BillStatus>,
    ) -> Result<Vec<Bill>, DispatchError> {
        require_coordinator(principal, "list bills")?;

        let inner = self.inner.read().await;
        Ok(inner
            .bills
            .iter()
            .filter(|b| status.is_none_or(|s| b.status == s))
            .cloned()
            .collect())
    }

    /// 고지서를 ID로 조회합니다.
    pub async fn find_bill(&self, bill_id: &str) -> Option<Bill> {
        let inner = self.inner.read().await;
        inner.bills.iter().find(|b| b.id == bill_id).cloned()
    }

    /// 배송을 ID로 조회합니다.
    pub async fn find_delivery(&self, delivery_id: &str) -> Option<Delivery> {
        let inner = self.inner.read().await;
        inner
            .deliveries
            .iter()
            .find(|d| d.id == delivery_id)
            .cloned()
    }

    /// 고지서 배치를 배달원에게 원자적으로 배정합니다.
    ///
    /// 배치의 모든 고지서가 `Unassigned`일 때만 커밋됩니다. 하나라도
    /// 미존재이거나 이미 배정되어 있으면 아무것도 변경하지 않고
    /// 실패합니다. 단건 배치는 정확한 원인(`BillNotFound` /
    /// `AlreadyAssigned`)을, 다건 배치는 위반 목록을 담은
    /// `AssignmentConflict`를 반환합니다.
    pub(crate) async fn assign_batch(
        &self,
        bill_ids: &[String],
        messenger_id: &str,
    ) -> Result<Vec<Delivery>, DispatchError> {
        let mut inner = self.inner.write().await;

        // 1. 변경 없이 배치 전체를 먼저 검증
        let mut conflicts = Vec::new();
        for bill_id in bill_ids {
            match inner.bills.iter().find(|b| &b.id == bill_id) {
                None => conflicts.push(bill_id.clone()),
                Some(bill) if bill.status != BillStatus::Unassigned => {
                    conflicts.push(bill_id.clone())
                }
                Some(_) => {}
            }
        }

        if !conflicts.is_empty() {
            metrics::counter!(m::DISPATCH_ASSIGNMENT_CONFLICTS_TOTAL).increment(1);
            if bill_ids.len() == 1 {
                let bill_id = &bill_ids[0];
                return Err(
                    if inner.bills.iter().any(|b| &b.id == bill_id) {
                        DispatchError::AlreadyAssigned(bill_id.clone())
                    } else {
                        DispatchError::BillNotFound(bill_id.clone())
                    },
                );
            }
            return Err(DispatchError::AssignmentConflict { conflicts });
        }

        // 2. 같은 임계 구역 안에서 상태 전이와 배송 생성을 커밋
        let now = SystemTime::now();
        let mut deliveries = Vec::with_capacity(bill_ids.len());
        for bill_id in bill_ids {
            let bill = inner
                .bills
                .iter_mut()
                .find(|b| &b.id == bill_id)
                .ok_or_else(|| DispatchError::BillNotFound(bill_id.clone()))?;
            bill.status = BillStatus::Assigned;

            let delivery = Delivery {
                id: uuid::Uuid::new_v4().to_string(),
                bill_id: bill_id.clone(),
                messenger_id: messenger_id.to_owned(),
                state: DeliveryState::Assigned,
                proof: None,
                verification_note: None,
                assigned_at: now,
                proof_submitted_at: None,
                verified_at: None,
            };
            inner.deliveries.push(delivery.clone());
            deliveries.push(delivery);
        }

        metrics::counter!(m::DISPATCH_ASSIGNMENTS_TOTAL).increment(deliveries.len() as u64);
        update_unassigned_gauge(&inner);
        Ok(deliveries)
    }

    /// 증빙 제출을 compare-and-set으로 반영합니다.
    ///
    /// 소유권 검사와 상태 검사가 같은 쓰기 락 안에서 수행되므로
    /// 동시 제출 중 하나만 성공합니다. 증빙은 정확히 한 번만 제출할 수
    /// 있으며 재제출은 덮어쓰지 않고 `InvalidState`로 거부됩니다.
    pub(crate) async fn apply_proof(
        &self,
        messenger_id: &str,
        delivery_id: &str,
        proof: ProofImage,
    ) -> Result<Delivery, DispatchError> {
        if proof.len() > self.config.max_proof_bytes {
            return Err(DispatchError::ProofTooLarge {
                size: proof.len(),
                max: self.config.max_proof_bytes,
            });
        }

        let mut inner = self.inner.write().await;
        let delivery = inner
            .deliveries
            .iter_mut()
            .find(|d| d.id == delivery_id)
            .ok_or_else(|| DispatchError::DeliveryNotFound(delivery_id.to_owned()))?;

        if delivery.messenger_id != messenger_id {
            return Err(DispatchError::NotOwner {
                delivery_id: delivery_id.to_owned(),
                messenger_id: messenger_id.to_owned(),
            });
        }

        if delivery.state != DeliveryState::Assigned {
            return Err(DispatchError::InvalidState {
                delivery_id: delivery_id.to_owned(),
                current: delivery.state,
                operation: "submit proof".to_owned(),
            });
        }

        delivery.state = DeliveryState::ProofSubmitted;
        delivery.proof = Some(proof);
        delivery.proof_submitted_at = Some(SystemTime::now());

        metrics::counter!(m::DISPATCH_PROOFS_SUBMITTED_TOTAL).increment(1);
        Ok(delivery.clone())
    }

    /// 검증 결정을 compare-and-set으로 반영합니다.
    ///
    /// `ProofSubmitted` 상태에서만 허용됩니다. 증빙 없이는 이 상태에
    /// 도달할 수 없으므로 증빙-선행 게이트가 함께 보장됩니다.
    /// 최종 상태에서는 어떤 전이도 허용되지 않습니다.
    pub(crate) async fn apply_decision(
        &self,
        delivery_id: &str,
        decision: VerificationDecision,
        note: &str,
    ) -> Result<Delivery, DispatchError> {
        let mut inner = self.inner.write().await;
        let delivery = inner
            .deliveries
            .iter_mut()
            .find(|d| d.id == delivery_id)
            .ok_or_else(|| DispatchError::DeliveryNotFound(delivery_id.to_owned()))?;

        if delivery.state != DeliveryState::ProofSubmitted {
            return Err(DispatchError::InvalidState {
                delivery_id: delivery_id.to_owned(),
                current: delivery.state,
                operation: "verify delivery".to_owned(),
            });
        }
        debug_assert!(delivery.has_proof(), "proof_submitted delivery without proof");

        delivery.state = decision.terminal_state();
        delivery.verification_note = Some(note.to_owned());
        delivery.verified_at = Some(SystemTime::now());

        metrics::counter!(
            m::DISPATCH_VERIFICATIONS_TOTAL,
            m::LABEL_DECISION => decision.terminal_state().to_string(),
        )
        .increment(1);
        Ok(delivery.clone())
    }

    /// 추적 뷰 항목을 반환합니다.
    ///
    /// 배송을 고지서 스냅샷과 조인하며, 최근 배정이 먼저 옵니다.
    pub(crate) async fn tracking_entries(&self, filter: &TrackingFilter) -> Vec<TrackingEntry> {
        let inner = self.inner.read().await;
        inner
            .deliveries
            .iter()
            .rev()
            .filter(|d| filter.state.is_none_or(|s| d.state == s))
            .filter(|d| {
                filter
                    .messenger_id
                    .as_deref()
                    .is_none_or(|id| d.messenger_id == id)
            })
            .filter_map(|d| {
                let Some(bill) = inner.bills.iter().find(|b| b.id == d.bill_id) else {
                    // 원장 불변식상 도달 불가; 방어적으로 항목만 제외
                    warn!(delivery = %d.id, bill = %d.bill_id, "delivery references missing bill");
                    return None;
                };
                if filter.route.as_deref().is_some_and(|r| bill.route != r) {
                    return None;
                }
                Some(TrackingEntry::join(d, bill.clone()))
            })
            .collect()
    }

    /// 저장된 고지서 수를 반환합니다.
    pub async fn bill_count(&self) -> usize {
        self.inner.read().await.bills.len()
    }

    /// 저장된 배송 수를 반환합니다.
    pub async fn delivery_count(&self) -> usize {
        self.inner.read().await.deliveries.len()
    }

    /// 미배정 고지서 수를 반환합니다.
    pub async fn unassigned_count(&self) -> usize {
        self.inner
            .read()
            .await
            .bills
            .iter()
            .filter(|b| b.status == BillStatus::Unassigned)
            .count()
    }
}

impl DeliveryFeed for DispatchLedger {
    async fn delivery_tally(&self) -> DeliveryTally {
        let inner = self.inner.read().await;
        let mut tally = DeliveryTally::default();
        for delivery in &inner.deliveries {
            tally.record(delivery.state);
        }
        tally
    }
}

impl Component for DispatchLedger {
    fn name(&self) -> &str {
        billpost_core::event::MODULE_DISPATCH
    }

    async fn health_check(&self) -> HealthStatus {
        let bills = self.bill_count().await;
        if bills >= self.config.max_bills {
            return HealthStatus::Degraded(format!(
                "bill store full: {bills}/{} bills",
                self.config.max_bills
            ));
        }
        HealthStatus::Healthy
    }
}

/// 코디네이터 역할을 요구합니다.
fn require_coordinator(principal: &Principal, operation: &str) -> Result<(), DispatchError> {
    match principal {
        Principal::Coordinator { .. } => Ok(()),
        Principal::Messenger { .. } => {
            metrics::counter!(m::AUTH_FORBIDDEN_TOTAL).increment(1);
            Err(DispatchError::Forbidden {
                operation: operation.to_owned(),
                reason: "requires coordinator role".to_owned(),
            })
        }
    }
}

/// 고지서 입력의 필수 필드를 검증합니다.
fn validate_bill_input(input: &BillInput) -> Result<(), DispatchError> {
    let reject = |reason: &str| {
        Err(DispatchError::InvalidBillInput {
            reason: reason.to_owned(),
        })
    };
    if input.account_number.trim().is_empty() {
        return reject("account_number cannot be empty");
    }
    if input.customer_name.trim().is_empty() {
        return reject("customer_name cannot be empty");
    }
    if input.address.trim().is_empty() {
        return reject("address cannot be empty");
    }
    if input.route.trim().is_empty() {
        return reject("route cannot be empty");
    }
    Ok(())
}

/// 미배정 고지서 게이지를 갱신합니다.
fn update_unassigned_gauge(inner: &LedgerInner) {
    let unassigned = inner
        .bills
        .iter()
        .filter(|b| b.status == BillStatus::Unassigned)
        .count();
    #[allow(clippy::cast_precision_loss)]
    metrics::gauge!(m::DISPATCH_BILLS_UNASSIGNED).set(unassigned as f64);
}
