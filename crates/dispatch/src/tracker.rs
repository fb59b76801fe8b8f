//! 배송 추적 -- 코디네이터 대시보드 뷰와 증빙 제출
//!
//! [`DeliveryTracker`]는 두 가지 일을 합니다.
//! 코디네이터에게는 배송과 고지서를 조인한 추적 뷰를 제공하고,
//! 배달원에게는 자기 배송에 대한 증빙 제출 경로를 제공합니다.
//! 증빙은 정확히 한 번만 제출할 수 있으며 재제출은 `InvalidState`로
//! 거부됩니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use billpost_core::event::{DeliveryEvent, DeliveryEventKind};
use billpost_core::types::{Bill, Delivery, DeliveryState, Principal, ProofImage};

use crate::error::DispatchError;
use crate::ledger::DispatchLedger;

/// 추적 뷰 필터
///
/// 모든 필드는 선택적이며 지정된 필드는 AND 조건으로 결합됩니다.
#[derive(Debug, Clone, Default)]
pub struct TrackingFilter {
    /// 배송 상태 필터
    pub state: Option<DeliveryState>,
    /// 배달원 ID 필터
    pub messenger_id: Option<String>,
    /// 배달 경로 코드 필터
    pub route: Option<String>,
}

/// 추적 뷰 항목 — 배송과 고지서 스냅샷의 조인
///
/// 대시보드 직렬화를 위한 읽기 전용 뷰입니다. 증빙 페이로드 자체는
/// 포함하지 않고 존재 여부만 노출합니다.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingEntry {
    /// 배송 ID
    pub delivery_id: String,
    /// 고지서 스냅샷
    pub bill: Bill,
    /// 배정된 배달원 ID
    pub messenger_id: String,
    /// 현재 배송 상태
    pub state: DeliveryState,
    /// 증빙 제출 여부
    pub has_proof: bool,
    /// 검증 메모
    pub verification_note: Option<String>,
    /// 배정 시각
    pub assigned_at: SystemTime,
    /// 증빙 제출 시각
    pub proof_submitted_at: Option<SystemTime>,
    /// 검증/반려 시각
    pub verified_at: Option<SystemTime>,
}

impl TrackingEntry {
    /// 배송과 고지서 스냅샷으로 뷰 항목을 만듭니다.
    pub(crate) fn join(delivery: &Delivery, bill: Bill) -> Self {
        Self {
            delivery_id: delivery.id.clone(),
            bill,
            messenger_id: delivery.messenger_id.clone(),
            state: delivery.state,
            has_proof: delivery.has_proof(),
            verification_note: delivery.verification_note.clone(),
            assigned_at: delivery.assigned_at,
            proof_submitted_at: delivery.proof_submitted_at,
            verified_at: delivery.verified_at,
        }
    }
}

/// 배송 추적기
pub struct DeliveryTracker {
    ledger: Arc<DispatchLedger>,
    event_tx: mpsc::Sender<DeliveryEvent>,
    /// 수락된 증빙 카운터
    proofs_accepted: AtomicU64,
    /// 거부된 증빙 카운터
    proofs_rejected: AtomicU64,
}

impl DeliveryTracker {
    /// 원장과 감사 이벤트 채널로 추적기를 생성합니다.
    pub fn new(ledger: Arc<DispatchLedger>, event_tx: mpsc::Sender<DeliveryEvent>) -> Self {
        Self {
            ledger,
            event_tx,
            proofs_accepted: AtomicU64::new(0),
            proofs_rejected: AtomicU64::new(0),
        }
    }

    /// 추적 뷰를 반환합니다.
    ///
    /// 코디네이터 전용. 최근 배정이 먼저 옵니다.
    pub async fn track(
        &self,
        principal: &Principal,
        filter: &TrackingFilter,
    ) -> Result<Vec<TrackingEntry>, DispatchError> {
        match principal {
            Principal::Coordinator { .. } => {}
            Principal::Messenger { .. } => {
                return Err(DispatchError::Forbidden {
                    operation: "tracking view".to_owned(),
                    reason: "requires coordinator role".to_owned(),
                });
            }
        }
        Ok(self.ledger.tracking_entries(filter).await)
    }

    /// 배달 증빙을 제출합니다.
    ///
    /// 배달원 전용이며, 자신에게 배정된 배송에만 제출할 수 있습니다.
    /// 상태 검사와 저장은 원장의 단일 임계 구역에서 수행됩니다.
    pub async fn submit_proof(
        &self,
        principal: &Principal,
        delivery_id: &str,
        proof: ProofImage,
    ) -> Result<Delivery, DispatchError> {
        let messenger_id = match principal {
            Principal::Messenger { id } => id.clone(),
            Principal::Coordinator { .. } => {
                return Err(DispatchError::Forbidden {
                    operation: "submit proof".to_owned(),
                    reason: "requires messenger role".to_owned(),
                });
            }
        };

        let proof_bytes = proof.len();
        let delivery = match self
            .ledger
            .apply_proof(&messenger_id, delivery_id, proof)
            .await
        {
            Ok(delivery) => delivery,
            Err(err) => {
                self.proofs_rejected.fetch_add(1, Ordering::Relaxed);
                return Err(err);
            }
        };

        self.proofs_accepted.fetch_add(1, Ordering::Relaxed);
        info!(
            messenger = %messenger_id,
            delivery = %delivery.id,
            bytes = proof_bytes,
            "proof submitted"
        );

        let event = DeliveryEvent::new(
            &delivery.id,
            &delivery.bill_id,
            &delivery.messenger_id,
            DeliveryEventKind::ProofSubmitted { proof_bytes },
        );
        if let Err(e) = self.event_tx.try_send(event) {
            warn!(error = %e, "audit channel full, dropping proof event");
        }

        Ok(delivery)
    }

    /// 수락된 증빙 수를 반환합니다.
    pub fn proofs_accepted(&self) -> u64 {
        self.proofs_accepted.load(Ordering::Relaxed)
    }

    /// 거부된 증빙 수를 반환합니다.
    pub fn proofs_rejected(&self) -> u64 {
        self.proofs_rejected.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billpost_core::types::{BillInput, BillStatus, BillType};
    use bytes::Bytes;

    use crate::config::LedgerConfig;

    fn coordinator() -> Principal {
        Principal::Coordinator {
            id: "c-1".to_owned(),
        }
    }

    fn messenger(id: &str) -> Principal {
        Principal::Messenger { id: id.to_owned() }
    }

    fn input(account: &str, route: &str) -> BillInput {
        BillInput {
            account_number: account.to_owned(),
            customer_name: "Test User".to_owned(),
            address: "123 Test Ave".to_owned(),
            route: route.to_owned(),
            bill_type: BillType::Regular,
            billing_month: "2026-02".parse().unwrap(),
        }
    }

    fn proof() -> ProofImage {
        ProofImage::new("image/png", Bytes::from_static(b"png-bytes"))
    }

    async fn tracker_with_assignments() -> (DeliveryTracker, Arc<DispatchLedger>, Vec<Delivery>) {
        let ledger = Arc::new(DispatchLedger::new(LedgerConfig::default()).unwrap());
        let bills = ledger
            .create_bills(
                &coordinator(),
                vec![input("ACCT-1", "R1"), input("ACCT-2", "R2")],
            )
            .await
            .unwrap();
        let ids: Vec<String> = bills.iter().map(|b| b.id.clone()).collect();
        let deliveries = ledger.assign_batch(&ids, "m-1").await.unwrap();

        let (tx, _rx) = mpsc::channel(16);
        let tracker = DeliveryTracker::new(Arc::clone(&ledger), tx);
        (tracker, ledger, deliveries)
    }

    #[tokio::test]
    async fn track_joins_bills_most_recent_first() {
        let (tracker, _ledger, deliveries) = tracker_with_assignments().await;
        let entries = tracker
            .track(&coordinator(), &TrackingFilter::default())
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        // 최근 배정 먼저 (deliveries는 push 순서이므로 역순)
        assert_eq!(entries[0].delivery_id, deliveries[1].id);
        assert_eq!(entries[0].bill.account_number, "ACCT-2");
        assert_eq!(entries[1].bill.account_number, "ACCT-1");
        assert_eq!(entries[0].bill.status, BillStatus::Assigned);
        assert!(!entries[0].has_proof);
    }

    #[tokio::test]
    async fn track_rejects_messenger() {
        let (tracker, _ledger, _deliveries) = tracker_with_assignments().await;
        let result = tracker
            .track(&messenger("m-1"), &TrackingFilter::default())
            .await;
        assert!(matches!(result, Err(DispatchError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn track_filters_by_state_messenger_route() {
        let (tracker, _ledger, deliveries) = tracker_with_assignments().await;
        tracker
            .submit_proof(&messenger("m-1"), &deliveries[0].id, proof())
            .await
            .unwrap();

        let by_state = tracker
            .track(
                &coordinator(),
                &TrackingFilter {
                    state: Some(DeliveryState::ProofSubmitted),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_state.len(), 1);
        assert_eq!(by_state[0].delivery_id, deliveries[0].id);
        assert!(by_state[0].has_proof);

        let by_route = tracker
            .track(
                &coordinator(),
                &TrackingFilter {
                    route: Some("R2".to_owned()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_route.len(), 1);
        assert_eq!(by_route[0].bill.route, "R2");

        let by_messenger = tracker
            .track(
                &coordinator(),
                &TrackingFilter {
                    messenger_id: Some("m-9".to_owned()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(by_messenger.is_empty());
    }

    #[tokio::test]
    async fn submit_proof_requires_messenger_role() {
        let (tracker, _ledger, deliveries) = tracker_with_assignments().await;
        let result = tracker
            .submit_proof(&coordinator(), &deliveries[0].id, proof())
            .await;
        assert!(matches!(result, Err(DispatchError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn submit_proof_enforces_ownership() {
        let (tracker, _ledger, deliveries) = tracker_with_assignments().await;
        let result = tracker
            .submit_proof(&messenger("m-2"), &deliveries[0].id, proof())
            .await;
        assert!(matches!(result, Err(DispatchError::NotOwner { .. })));
        assert_eq!(tracker.proofs_rejected(), 1);
    }

    #[tokio::test]
    async fn submit_proof_happy_path_counts_and_events() {
        let ledger = Arc::new(DispatchLedger::new(LedgerConfig::default()).unwrap());
        let bills = ledger
            .create_bills(&coordinator(), vec![input("ACCT-1", "R1")])
            .await
            .unwrap();
        let deliveries = ledger
            .assign_batch(&[bills[0].id.clone()], "m-1")
            .await
            .unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        let tracker = DeliveryTracker::new(Arc::clone(&ledger), tx);

        let updated = tracker
            .submit_proof(&messenger("m-1"), &deliveries[0].id, proof())
            .await
            .unwrap();
        assert_eq!(updated.state, DeliveryState::ProofSubmitted);
        assert_eq!(tracker.proofs_accepted(), 1);

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event.kind,
            DeliveryEventKind::ProofSubmitted { proof_bytes: 9 }
        ));
    }

    #[tokio::test]
    async fn submit_proof_twice_fails_without_overwrite() {
        let (tracker, ledger, deliveries) = tracker_with_assignments().await;
        let first = ProofImage::new("image/png", Bytes::from_static(b"original"));
        tracker
            .submit_proof(&messenger("m-1"), &deliveries[0].id, first)
            .await
            .unwrap();

        let second = ProofImage::new("image/png", Bytes::from_static(b"replacement"));
        let result = tracker
            .submit_proof(&messenger("m-1"), &deliveries[0].id, second)
            .await;
        assert!(matches!(result, Err(DispatchError::InvalidState { .. })));

        // 원본 증빙이 그대로 남아있음
        let delivery = ledger.find_delivery(&deliveries[0].id).await.unwrap();
        assert_eq!(delivery.proof.unwrap().data.as_ref(), b"original");
    }

    #[tokio::test]
    async fn submit_proof_unknown_delivery() {
        let (tracker, _ledger, _deliveries) = tracker_with_assignments().await;
        let result = tracker
            .submit_proof(&messenger("m-1"), "ghost", proof())
            .await;
        assert!(matches!(result, Err(DispatchError::DeliveryNotFound(_))));
    }
}
