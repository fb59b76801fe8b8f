//! 리포트 생성기 -- 일일 요약 리포트(DSR) 집계
//!
//! [`ReportGenerator`]는 생성 시점의 배송 상태 스냅샷을 집계하여
//! 불변 리포트 레코드를 만듭니다.
//!
//! # 집계 의미론
//!
//! `report_date`는 스냅샷이 귀속되는 라벨이며 이벤트 범위 필터가
//! 아닙니다. 집계는 항상 호출 시점에 원장이 보유한 전체 배송의 현재
//! 상태를 대상으로 합니다. 같은 날짜로 여러 번 생성하면 각각 독립된
//! 리포트 레코드가 만들어지고 기존 레코드는 절대 갱신되지 않습니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use tokio::sync::mpsc;
use tracing::{info, warn};

use billpost_core::event::ReportEvent;
use billpost_core::metrics as m;
use billpost_core::service::{Component, DeliveryFeed, HealthStatus};
use billpost_core::types::{DailyReport, Principal, ReportDate};

use crate::config::ReportGenConfig;
use crate::error::ReportGenError;
use crate::store::ReportStore;

/// 리포트 생성 요청
#[derive(Debug, Clone)]
pub struct ReportRequest {
    /// 리포트 귀속 날짜
    pub report_date: ReportDate,
    /// 작성 메모
    pub note: String,
}

/// 리포트 생성기
///
/// 배송 집계는 [`DeliveryFeed`] trait 뒤에 있어 테스트에서 고정
/// 집계를 주입할 수 있습니다. 운영 구현은 디스패치 원장입니다.
pub struct ReportGenerator<F: DeliveryFeed> {
    feed: Arc<F>,
    store: ReportStore,
    config: ReportGenConfig,
    event_tx: mpsc::Sender<ReportEvent>,
    /// 생성된 리포트 카운터
    reports_generated: AtomicU64,
}

impl<F: DeliveryFeed> ReportGenerator<F> {
    /// 배송 피드, 설정, 감사 이벤트 채널로 생성기를 만듭니다.
    pub fn new(
        feed: Arc<F>,
        config: ReportGenConfig,
        event_tx: mpsc::Sender<ReportEvent>,
    ) -> Result<Self, ReportGenError> {
        config.validate()?;
        let store = ReportStore::new(config.max_reports);
        Ok(Self {
            feed,
            store,
            config,
            event_tx,
            reports_generated: AtomicU64::new(0),
        })
    }

    /// 일일 요약 리포트를 생성합니다.
    ///
    /// 코디네이터 전용. 잘 형성된 입력에 대해서는 항상 성공하며,
    /// 같은 날짜에 대한 기존 리포트를 갱신하지 않고 항상 새 불변
    /// 레코드를 추가합니다.
    pub async fn generate(
        &self,
        principal: &Principal,
        request: ReportRequest,
    ) -> Result<DailyReport, ReportGenError> {
        match principal {
            Principal::Coordinator { .. } => {}
            Principal::Messenger { .. } => {
                return Err(ReportGenError::Forbidden {
                    operation: "generate report".to_owned(),
                    reason: "requires coordinator role".to_owned(),
                });
            }
        }

        let note_len = request.note.chars().count();
        if note_len > self.config.max_note_len {
            return Err(ReportGenError::NoteTooLong {
                len: note_len,
                max: self.config.max_note_len,
            });
        }

        let tally = self.feed.delivery_tally().await;
        let report = DailyReport {
            id: uuid::Uuid::new_v4().to_string(),
            report_date: request.report_date,
            note: request.note,
            tally,
            generated_at: SystemTime::now(),
        };
        self.store.append(report.clone()).await?;

        self.reports_generated.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(m::REPORT_GENERATED_TOTAL).increment(1);
        info!(
            coordinator = principal.id(),
            report = %report.id,
            date = %report.report_date,
            total = tally.total(),
            "daily summary report generated"
        );

        let event = ReportEvent::new(&report.id, report.report_date, tally);
        if let Err(e) = self.event_tx.try_send(event) {
            warn!(error = %e, "audit channel full, dropping report event");
        }

        Ok(report)
    }

    /// 생성된 리포트 목록을 반환합니다.
    ///
    /// 코디네이터 전용. 생성 순서 오름차순이며 `date`로 귀속 날짜를
    /// 필터링할 수 있습니다.
    pub async fn list_reports(
        &self,
        principal: &Principal,
        date: Option<ReportDate>,
    ) -> Result<Vec<DailyReport>, ReportGenError> {
        match principal {
            Principal::Coordinator { .. } => {}
            Principal::Messenger { .. } => {
                return Err(ReportGenError::Forbidden {
                    operation: "list reports".to_owned(),
                    reason: "requires coordinator role".to_owned(),
                });
            }
        }
        Ok(self.store.list(date).await)
    }

    /// 생성된 리포트 수를 반환합니다.
    pub fn reports_generated(&self) -> u64 {
        self.reports_generated.load(Ordering::Relaxed)
    }

    /// 저장소에 대한 참조를 반환합니다.
    pub fn store(&self) -> &ReportStore {
        &self.store
    }
}

impl<F: DeliveryFeed> Component for ReportGenerator<F> {
    fn name(&self) -> &str {
        billpost_core::event::MODULE_REPORT
    }

    async fn health_check(&self) -> HealthStatus {
        let len = self.store.len().await;
        if len >= self.config.max_reports {
            return HealthStatus::Degraded(format!(
                "report store full: {len}/{} reports",
                self.config.max_reports
            ));
        }
        HealthStatus::Healthy
    }
}
