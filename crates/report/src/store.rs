//! 리포트 저장소 -- 생성된 DSR의 추가 전용 보관
//!
//! [`ReportStore`]는 생성된 리포트를 생성 순서대로 보관합니다.
//! 리포트는 불변이며 갱신 경로가 없습니다. 같은 날짜에 여러 리포트가
//! 존재할 수 있습니다(날짜 유일성 제약 없음).

use tokio::sync::RwLock;

use billpost_core::metrics as m;
use billpost_core::types::{DailyReport, ReportDate};

use crate::error::ReportGenError;

/// 추가 전용 리포트 저장소
pub struct ReportStore {
    reports: RwLock<Vec<DailyReport>>,
    max_reports: usize,
}

impl ReportStore {
    /// 보관 상한을 지정하여 빈 저장소를 생성합니다.
    pub fn new(max_reports: usize) -> Self {
        Self {
            reports: RwLock::new(Vec::new()),
            max_reports,
        }
    }

    /// 리포트를 저장합니다.
    ///
    /// 상한에 도달하면 기존 리포트를 밀어내지 않고 거부합니다.
    pub async fn append(&self, report: DailyReport) -> Result<(), ReportGenError> {
        let mut reports = self.reports.write().await;
        if reports.len() >= self.max_reports {
            return Err(ReportGenError::StoreFull {
                max: self.max_reports,
            });
        }
        reports.push(report);

        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!(m::REPORT_STORE_SIZE).set(reports.len() as f64);
        Ok(())
    }

    /// 리포트 목록을 생성 순서대로 반환합니다.
    ///
    /// `date`를 지정하면 해당 귀속 날짜의 리포트만 반환합니다.
    pub async fn list(&self, date: Option<ReportDate>) -> Vec<DailyReport> {
        let reports = self.reports.read().await;
        reports
            .iter()
            .filter(|r| date.is_none_or(|d| r.report_date == d))
            .cloned()
            .collect()
    }

    /// 리포트를 ID로 조회합니다.
    pub async fn find(&self, report_id: &str) -> Option<DailyReport> {
        let reports = self.reports.read().await;
        reports.iter().find(|r| r.id == report_id).cloned()
    }

    /// 보관 중인 리포트 수를 반환합니다.
    pub async fn len(&self) -> usize {
        self.reports.read().await.len()
    }

    /// 저장소가 비어있는지 확인합니다.
    pub async fn is_empty(&self) -> bool {
        self.reports.read().await.is_empty()
    }

    /// 보관 상한을 반환합니다.
    pub fn capacity(&self) -> usize {
        self.max_reports
    }
}
