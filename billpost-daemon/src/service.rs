//! The transport-agnostic request surface.
//!
//! [`BillpostService`] composes the auth guard, dispatch components, and
//! report generator into one facade. Every operation takes the caller's
//! bearer token, resolves it to a [`Principal`], and invokes the component
//! with the resolved principal as an explicit argument. Transport bindings
//! (HTTP or otherwise) are thin adapters over this facade and live outside
//! this core.

use std::sync::Arc;

use tokio::sync::mpsc;

use billpost_auth::{AuthGuard, AuthGuardConfig, IssuedToken, PrincipalDirectory};
use billpost_core::config::BillpostConfig;
use billpost_core::error::BillpostError;
use billpost_core::event::{DeliveryEvent, ReportEvent};
use billpost_core::types::{
    Bill, BillInput, BillStatus, DailyReport, Delivery, Messenger, Principal, ProofImage,
    ReportDate, VerificationDecision,
};
use billpost_dispatch::{
    AssignmentEngine, DeliveryTracker, DispatchLedger, LedgerConfig, TrackingEntry,
    TrackingFilter, VerificationStep,
};
use billpost_report::{ReportGenConfig, ReportGenerator, ReportRequest};

/// 서비스 파사드 — 모든 외부 연산의 진입점
pub struct BillpostService {
    guard: Arc<AuthGuard>,
    ledger: Arc<DispatchLedger>,
    engine: AssignmentEngine<PrincipalDirectory>,
    tracker: DeliveryTracker,
    verifier: VerificationStep,
    reports: ReportGenerator<DispatchLedger>,
}

impl BillpostService {
    /// Assemble the service from a loaded directory, validated config,
    /// and the audit event channels.
    pub fn from_parts(
        directory: Arc<PrincipalDirectory>,
        config: &BillpostConfig,
        delivery_tx: mpsc::Sender<DeliveryEvent>,
        report_tx: mpsc::Sender<ReportEvent>,
    ) -> Result<Self, BillpostError> {
        let guard = Arc::new(AuthGuard::new(
            Arc::clone(&directory),
            AuthGuardConfig::from_core(&config.auth),
        )?);
        let ledger = Arc::new(DispatchLedger::new(LedgerConfig::from_core(
            &config.dispatch,
        ))?);
        let engine = AssignmentEngine::new(
            Arc::clone(&ledger),
            Arc::clone(&directory),
            delivery_tx.clone(),
        );
        let tracker = DeliveryTracker::new(Arc::clone(&ledger), delivery_tx.clone());
        let verifier = VerificationStep::new(Arc::clone(&ledger), delivery_tx);
        let reports = ReportGenerator::new(
            Arc::clone(&ledger),
            ReportGenConfig::from_core(&config.report),
            report_tx,
        )?;

        Ok(Self {
            guard,
            ledger,
            engine,
            tracker,
            verifier,
            reports,
        })
    }

    /// 자격 증명으로 로그인하고 세션 토큰을 받습니다.
    pub async fn login(&self, email: &str, secret: &str) -> Result<IssuedToken, BillpostError> {
        Ok(self.guard.authenticate(email, secret).await?)
    }

    /// 세션 토큰을 폐기합니다. 존재했으면 `true`를 반환합니다.
    pub async fn logout(&self, token: &str) -> bool {
        self.guard.revoke(token).await
    }

    /// 토큰을 주체로 해석합니다.
    pub async fn resolve(&self, token: &str) -> Result<Principal, BillpostError> {
        Ok(self.guard.resolve(token).await?)
    }

    /// 고지서를 일괄 생성합니다 (코디네이터 전용).
    pub async fn create_bills(
        &self,
        token: &str,
        inputs: Vec<BillInput>,
    ) -> Result<Vec<Bill>, BillpostError> {
        let principal = self.guard.resolve(token).await?;
        Ok(self.ledger.create_bills(&principal, inputs).await?)
    }

    /// 고지서 목록을 조회합니다 (코디네이터 전용).
    pub async fn list_bills(
        &self,
        token: &str,
        status: Option<BillStatus>,
    ) -> Result<Vec<Bill>, BillpostError> {
        let principal = self.guard.resolve(token).await?;
        Ok(self.ledger.list_bills(&principal, status).await?)
    }

    /// 배달원 목록을 조회합니다 (코디네이터 전용).
    pub async fn list_messengers(&self, token: &str) -> Result<Vec<Messenger>, BillpostError> {
        let principal = self.guard.resolve(token).await?;
        Ok(self.guard.list_messengers(&principal).await?)
    }

    /// 고지서 배치를 배달원에게 배정합니다 (코디네이터 전용).
    pub async fn assign_bills(
        &self,
        token: &str,
        bill_ids: &[String],
        messenger_id: &str,
    ) -> Result<Vec<Delivery>, BillpostError> {
        let principal = self.guard.resolve(token).await?;
        Ok(self.engine.assign(&principal, bill_ids, messenger_id).await?)
    }

    /// 추적 뷰를 조회합니다 (코디네이터 전용).
    pub async fn tracking(
        &self,
        token: &str,
        filter: &TrackingFilter,
    ) -> Result<Vec<TrackingEntry>, BillpostError> {
        let principal = self.guard.resolve(token).await?;
        Ok(self.tracker.track(&principal, filter).await?)
    }

    /// 배달 증빙을 제출합니다 (배정된 배달원 전용).
    pub async fn submit_proof(
        &self,
        token: &str,
        delivery_id: &str,
        proof: ProofImage,
    ) -> Result<Delivery, BillpostError> {
        let principal = self.guard.resolve(token).await?;
        Ok(self
            .tracker
            .submit_proof(&principal, delivery_id, proof)
            .await?)
    }

    /// 배송을 검증하거나 반려합니다 (코디네이터 전용).
    pub async fn verify_delivery(
        &self,
        token: &str,
        delivery_id: &str,
        decision: VerificationDecision,
        note: &str,
    ) -> Result<Delivery, BillpostError> {
        let principal = self.guard.resolve(token).await?;
        Ok(self
            .verifier
            .verify(&principal, delivery_id, decision, note)
            .await?)
    }

    /// 일일 요약 리포트를 생성합니다 (코디네이터 전용).
    pub async fn generate_report(
        &self,
        token: &str,
        request: ReportRequest,
    ) -> Result<DailyReport, BillpostError> {
        let principal = self.guard.resolve(token).await?;
        Ok(self.reports.generate(&principal, request).await?)
    }

    /// 생성된 리포트 목록을 조회합니다 (코디네이터 전용).
    pub async fn list_reports(
        &self,
        token: &str,
        date: Option<ReportDate>,
    ) -> Result<Vec<DailyReport>, BillpostError> {
        let principal = self.guard.resolve(token).await?;
        Ok(self.reports.list_reports(&principal, date).await?)
    }

    /// 인증 가드에 대한 참조를 반환합니다.
    pub fn guard(&self) -> &Arc<AuthGuard> {
        &self.guard
    }

    /// 디스패치 원장에 대한 참조를 반환합니다.
    pub fn ledger(&self) -> &Arc<DispatchLedger> {
        &self.ledger
    }

    /// 리포트 생성기에 대한 참조를 반환합니다.
    pub fn report_generator(&self) -> &ReportGenerator<DispatchLedger> {
        &self.reports
    }
}
