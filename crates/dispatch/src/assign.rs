//! 배정 엔진 -- 미배정 고지서를 배달원에게 원자적으로 배정
//!
//! [`AssignmentEngine`]은 배치 형태 검증과 배달원 해석을 수행한 뒤
//! 원장의 단일 임계 구역 커밋에 위임합니다. 배정은 설정 가능한
//! 속성이 아니라 한 번만 일어나는 상태 전이이므로, 같은 배치를 두 번
//! 호출하면 두 번째 호출은 실패합니다.
//!
//! # 내부 아키텍처
//! ```text
//! assign(principal, bill_ids, messenger_id)
//!     |-- 역할 검사 (coordinator)
//!     |-- 배치 형태 검사 (빈 배치 / 상한 / 중복 ID)
//!     |-- MessengerDirectory.find_messenger()
//!     |-- DispatchLedger.assign_batch()   <- 단일 쓰기 락, 전체-또는-전무
//!     `-- DeliveryEvent::Assigned ──mpsc──> audit
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tracing::{info, warn};

use billpost_core::event::{DeliveryEvent, DeliveryEventKind};
use billpost_core::service::MessengerDirectory;
use billpost_core::types::{Delivery, Principal};

use crate::error::DispatchError;
use crate::ledger::DispatchLedger;

/// 배정 엔진
///
/// 배달원 조회는 [`MessengerDirectory`] trait 뒤에 있어 테스트에서
/// mock 디렉토리를 주입할 수 있습니다.
pub struct AssignmentEngine<D: MessengerDirectory> {
    ledger: Arc<DispatchLedger>,
    directory: Arc<D>,
    event_tx: mpsc::Sender<DeliveryEvent>,
    /// 커밋된 배정 배치 카운터
    batches_committed: AtomicU64,
    /// 거부된 배정 배치 카운터
    batches_rejected: AtomicU64,
}

impl<D: MessengerDirectory> AssignmentEngine<D> {
    /// 원장, 배달원 디렉토리, 감사 이벤트 채널로 엔진을 생성합니다.
    pub fn new(
        ledger: Arc<DispatchLedger>,
        directory: Arc<D>,
        event_tx: mpsc::Sender<DeliveryEvent>,
    ) -> Self {
        Self {
            ledger,
            directory,
            event_tx,
            batches_committed: AtomicU64::new(0),
            batches_rejected: AtomicU64::new(0),
        }
    }

    /// 고지서 배치를 배달원에게 배정합니다.
    ///
    /// 코디네이터 전용. 성공 시 고지서마다 정확히 하나의 배송 레코드가
    /// `Assigned` 상태로 생성됩니다. 배치의 어느 하나라도 미존재이거나
    /// 이미 배정되어 있으면 전체가 거부되고 아무 상태도 변하지 않습니다.
    pub async fn assign(
        &self,
        principal: &Principal,
        bill_ids: &[String],
        messenger_id: &str,
    ) -> Result<Vec<Delivery>, DispatchError> {
        match principal {
            Principal::Coordinator { .. } => {}
            Principal::Messenger { .. } => {
                return Err(DispatchError::Forbidden {
                    operation: "assign bills".to_owned(),
                    reason: "requires coordinator role".to_owned(),
                });
            }
        }

        if bill_ids.is_empty() {
            return Err(DispatchError::EmptyAssignment);
        }
        let max_batch = self.ledger.config().max_assign_batch;
        if bill_ids.len() > max_batch {
            return Err(DispatchError::BatchTooLarge {
                size: bill_ids.len(),
                max: max_batch,
            });
        }

        // 배치 내부 중복 ID는 단일 고지서에 배송 두 개를 만들 수 있으므로
        // 충돌로 거부합니다.
        let mut seen = HashSet::new();
        let duplicates: Vec<String> = bill_ids
            .iter()
            .filter(|id| !seen.insert(id.as_str()))
            .cloned()
            .collect();
        if !duplicates.is_empty() {
            self.batches_rejected.fetch_add(1, Ordering::Relaxed);
            return Err(DispatchError::AssignmentConflict {
                conflicts: duplicates,
            });
        }

        let messenger = self
            .directory
            .find_messenger(messenger_id)
            .await
            .ok_or_else(|| DispatchError::MessengerNotFound(messenger_id.to_owned()))?;

        let deliveries = match self.ledger.assign_batch(bill_ids, &messenger.id).await {
            Ok(deliveries) => deliveries,
            Err(err) => {
                self.batches_rejected.fetch_add(1, Ordering::Relaxed);
                return Err(err);
            }
        };

        self.batches_committed.fetch_add(1, Ordering::Relaxed);
        info!(
            coordinator = principal.id(),
            messenger = %messenger.id,
            deliveries = deliveries.len(),
            "bills assigned"
        );

        for delivery in &deliveries {
            let event = DeliveryEvent::new(
                &delivery.id,
                &delivery.bill_id,
                &delivery.messenger_id,
                DeliveryEventKind::Assigned,
            );
            if let Err(e) = self.event_tx.try_send(event) {
                warn!(error = %e, "audit channel full, dropping assignment event");
            }
        }

        Ok(deliveries)
    }

    /// 커밋된 배정 배치 수를 반환합니다.
    pub fn batches_committed(&self) -> u64 {
        self.batches_committed.load(Ordering::Relaxed)
    }

    /// 거부된 배정 배치 수를 반환합니다.
    pub fn batches_rejected(&self) -> u64 {
        self.batches_rejected.load(Ordering::Relaxed)
    }
}
