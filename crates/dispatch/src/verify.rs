//! 검증 단계 -- 배송을 최종 상태로 확정
//!
//! [`VerificationStep`]은 증빙이 제출된 배송을 코디네이터의 결정에 따라
//! `Verified` 또는 `Rejected`로 확정합니다. 증빙 없는 검증은 상태
//! 기계가 막고(`ProofSubmitted`에서만 허용), 최종 상태 이후의 어떤
//! 전이도 허용되지 않습니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tracing::{info, warn};

use billpost_core::event::{DeliveryEvent, DeliveryEventKind};
use billpost_core::types::{Delivery, Principal, VerificationDecision};

use crate::error::DispatchError;
use crate::ledger::DispatchLedger;

/// 검증 단계
pub struct VerificationStep {
    ledger: Arc<DispatchLedger>,
    event_tx: mpsc::Sender<DeliveryEvent>,
    /// 확정된 결정 카운터
    decisions_made: AtomicU64,
}

impl VerificationStep {
    /// 원장과 감사 이벤트 채널로 검증 단계를 생성합니다.
    pub fn new(ledger: Arc<DispatchLedger>, event_tx: mpsc::Sender<DeliveryEvent>) -> Self {
        Self {
            ledger,
            event_tx,
            decisions_made: AtomicU64::new(0),
        }
    }

    /// 배송을 검증하거나 반려합니다.
    ///
    /// 코디네이터 전용. 현재 상태가 `ProofSubmitted`일 때만 허용되며
    /// 메모와 결정 시각이 함께 기록됩니다. `Rejected`는 최종 상태이며
    /// 증빙 재제출로 되살릴 수 없습니다.
    pub async fn verify(
        &self,
        principal: &Principal,
        delivery_id: &str,
        decision: VerificationDecision,
        note: &str,
    ) -> Result<Delivery, DispatchError> {
        match principal {
            Principal::Coordinator { .. } => {}
            Principal::Messenger { .. } => {
                return Err(DispatchError::Forbidden {
                    operation: "verify delivery".to_owned(),
                    reason: "requires coordinator role".to_owned(),
                });
            }
        }

        let delivery = self
            .ledger
            .apply_decision(delivery_id, decision, note)
            .await?;

        self.decisions_made.fetch_add(1, Ordering::Relaxed);
        info!(
            coordinator = principal.id(),
            delivery = %delivery.id,
            decision = %decision,
            "delivery decision recorded"
        );

        let kind = match decision {
            VerificationDecision::Verified => DeliveryEventKind::Verified,
            VerificationDecision::Rejected => DeliveryEventKind::Rejected,
        };
        let event = DeliveryEvent::new(
            &delivery.id,
            &delivery.bill_id,
            &delivery.messenger_id,
            kind,
        );
        if let Err(e) = self.event_tx.try_send(event) {
            warn!(error = %e, "audit channel full, dropping verification event");
        }

        Ok(delivery)
    }

    /// 확정된 결정 수를 반환합니다.
    pub fn decisions_made(&self) -> u64 {
        self.decisions_made.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billpost_core::types::{BillInput, BillType, DeliveryState, ProofImage};
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

    fn input(account: &str) -> BillInput {
        BillInput {
            account_number: account.to_owned(),
            customer_name: "Test User".to_owned(),
            address: "123 Test Ave".to_owned(),
            route: "R1".to_owned(),
            bill_type: BillType::Regular,
            billing_month: "2026-02".parse().unwrap(),
        }
    }

    async fn step_with_proofed_delivery() -> (
        VerificationStep,
        Arc<DispatchLedger>,
        String,
        mpsc::Receiver<DeliveryEvent>,
    ) {
        let ledger = Arc::new(DispatchLedger::new(LedgerConfig::default()).unwrap());
        let bills = ledger
            .create_bills(&coordinator(), vec![input("ACCT-1")])
            .await
            .unwrap();
        let deliveries = ledger
            .assign_batch(&[bills[0].id.clone()], "m-1")
            .await
            .unwrap();
        let delivery_id = deliveries[0].id.clone();
        ledger
            .apply_proof(
                "m-1",
                &delivery_id,
                ProofImage::new("image/png", Bytes::from_static(b"proof")),
            )
            .await
            .unwrap();

        let (tx, rx) = mpsc::channel(16);
        let step = VerificationStep::new(Arc::clone(&ledger), tx);
        (step, ledger, delivery_id, rx)
    }

    #[tokio::test]
    async fn verify_records_decision_note_and_event() {
        let (step, ledger, delivery_id, mut rx) = step_with_proofed_delivery().await;

        let verified = step
            .verify(
                &coordinator(),
                &delivery_id,
                VerificationDecision::Verified,
                "E2E: OK",
            )
            .await
            .unwrap();
        assert_eq!(verified.state, DeliveryState::Verified);
        assert_eq!(verified.verification_note.as_deref(), Some("E2E: OK"));
        assert_eq!(step.decisions_made(), 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, DeliveryEventKind::Verified);

        let stored = ledger.find_delivery(&delivery_id).await.unwrap();
        assert_eq!(stored.state, DeliveryState::Verified);
    }

    #[tokio::test]
    async fn reject_decision_emits_rejected_event() {
        let (step, _ledger, delivery_id, mut rx) = step_with_proofed_delivery().await;
        let rejected = step
            .verify(
                &coordinator(),
                &delivery_id,
                VerificationDecision::Rejected,
                "blurry photo",
            )
            .await
            .unwrap();
        assert_eq!(rejected.state, DeliveryState::Rejected);
        assert_eq!(rx.recv().await.unwrap().kind, DeliveryEventKind::Rejected);
    }

    #[tokio::test]
    async fn verify_rejects_messenger_role() {
        let (step, _ledger, delivery_id, _rx) = step_with_proofed_delivery().await;
        let result = step
            .verify(
                &messenger("m-1"),
                &delivery_id,
                VerificationDecision::Verified,
                "self-approval",
            )
            .await;
        assert!(matches!(result, Err(DispatchError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn verify_unknown_delivery() {
        let (step, _ledger, _delivery_id, _rx) = step_with_proofed_delivery().await;
        let result = step
            .verify(
                &coordinator(),
                "ghost",
                VerificationDecision::Verified,
                "ok",
            )
            .await;
        assert!(matches!(result, Err(DispatchError::DeliveryNotFound(_))));
    }

    #[tokio::test]
    async fn verify_twice_fails() {
        let (step, _ledger, delivery_id, _rx) = step_with_proofed_delivery().await;
        step.verify(
            &coordinator(),
            &delivery_id,
            VerificationDecision::Verified,
            "ok",
        )
        .await
        .unwrap();

        let result = step
            .verify(
                &coordinator(),
                &delivery_id,
                VerificationDecision::Rejected,
                "changed my mind",
            )
            .await;
        assert!(matches!(result, Err(DispatchError::InvalidState { .. })));
        assert_eq!(step.decisions_made(), 1);
    }
}
