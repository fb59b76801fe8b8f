//! `billpost flow run` command handler
//!
//! Drives the whole delivery lifecycle in-process against a freshly
//! composed service: coordinator login, bill creation, assignment,
//! proof submission as the messenger, verification, and a DSR. Exits
//! non-zero on the first failed step, which makes the command usable
//! as a smoke test in scripts.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use colored::Colorize;
use serde::Serialize;
use tracing::info;

use billpost_auth::{AuthGuard, AuthGuardConfig, PrincipalDirectory};
use billpost_core::config::BillpostConfig;
use billpost_core::types::{
    BillInput, BillStatus, BillType, DeliveryTally, Principal, ProofImage, ReportDate,
    VerificationDecision,
};
use billpost_dispatch::{
    AssignmentEngine, DeliveryTracker, DispatchLedger, LedgerConfig, TrackingFilter,
    VerificationStep,
};
use billpost_report::{ReportGenConfig, ReportGenerator, ReportRequest};

use crate::cli::FlowAction;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// 1x1 transparent PNG standing in for a real proof photo.
const MOCK_PROOF_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Execute the `flow` command.
pub async fn execute(
    action: FlowAction,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match action {
        FlowAction::Run {
            account,
            billing_month,
            coordinator_email,
            coordinator_secret,
            messenger_email,
            messenger_secret,
        } => {
            run_flow(
                config_path,
                writer,
                &account,
                &billing_month,
                &coordinator_email,
                &coordinator_secret,
                messenger_email.as_deref(),
                &messenger_secret,
            )
            .await
        }
    }
}

fn step(n: u32, text: &str) {
    println!("{} {text}", format!("{n})").bold());
}

fn ok(text: &str) {
    println!("   {} {text}", "✓".green());
}

fn flow_err(step: &str) -> impl FnOnce(billpost_core::error::BillpostError) -> CliError + '_ {
    move |e| CliError::Flow {
        step: step.to_owned(),
        reason: e.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_flow(
    config_path: &Path,
    writer: &OutputWriter,
    account: &str,
    billing_month: &str,
    coordinator_email: &str,
    coordinator_secret: &str,
    messenger_email: Option<&str>,
    messenger_secret: &str,
) -> Result<(), CliError> {
    let config = BillpostConfig::load(config_path)
        .await
        .map_err(|e| CliError::Config(e.to_string()))?;

    info!(path = %config.auth.accounts_path, "loading principal directory");
    let directory = Arc::new(
        PrincipalDirectory::load_from_file(&config.auth.accounts_path)
            .await
            .map_err(|e| CliError::Config(e.to_string()))?,
    );

    // 인프로세스 서비스 조립 (감사 채널은 CLI에서는 드레인만)
    let guard = AuthGuard::new(
        Arc::clone(&directory),
        AuthGuardConfig::from_core(&config.auth),
    )?;
    let ledger = Arc::new(
        DispatchLedger::new(LedgerConfig::from_core(&config.dispatch))
            .map_err(CliError::from)?,
    );
    let (delivery_tx, mut delivery_rx) = tokio::sync::mpsc::channel(64);
    let (report_tx, mut report_rx) = tokio::sync::mpsc::channel(16);
    let engine = AssignmentEngine::new(Arc::clone(&ledger), Arc::clone(&directory), delivery_tx.clone());
    let tracker = DeliveryTracker::new(Arc::clone(&ledger), delivery_tx.clone());
    let verifier = VerificationStep::new(Arc::clone(&ledger), delivery_tx);
    let reports = ReportGenerator::new(
        Arc::clone(&ledger),
        ReportGenConfig::from_core(&config.report),
        report_tx,
    )?;

    step(1, &format!("logging in as coordinator ({coordinator_email})"));
    let coord_session = guard
        .authenticate(coordinator_email, coordinator_secret)
        .await
        .map_err(|e| CliError::Flow {
            step: "coordinator login".to_owned(),
            reason: e.to_string(),
        })?;
    let coord: Principal = guard
        .resolve(&coord_session.token)
        .await
        .map_err(|e| CliError::Flow {
            step: "coordinator token resolve".to_owned(),
            reason: e.to_string(),
        })?;
    ok("token issued");

    step(2, "creating one test bill (unassigned)");
    let billing_month = billing_month
        .parse()
        .map_err(|e: billpost_core::error::ParseError| CliError::Command(e.to_string()))?;
    ledger
        .create_bills(
            &coord,
            vec![BillInput {
                account_number: account.to_owned(),
                customer_name: "E2E Test User".to_owned(),
                address: "123 Test Ave".to_owned(),
                route: "R1".to_owned(),
                bill_type: BillType::Regular,
                billing_month,
            }],
        )
        .await
        .map_err(|e| flow_err("create bills")(e.into()))?;
    ok(&format!("bill {account} created"));

    step(3, "fetching unassigned bills");
    let unassigned = ledger
        .list_bills(&coord, Some(BillStatus::Unassigned))
        .await
        .map_err(|e| flow_err("list bills")(e.into()))?;
    let bill = unassigned
        .iter()
        .find(|b| b.account_number == account)
        .ok_or_else(|| CliError::Flow {
            step: "list bills".to_owned(),
            reason: "no unassigned bills found".to_owned(),
        })?;
    let bill_id = bill.id.clone();
    ok(&format!("found bill id {bill_id}"));

    step(4, "fetching messengers to assign to");
    let messengers = guard
        .list_messengers(&coord)
        .await
        .map_err(|e| flow_err("list messengers")(e.into()))?;
    if messengers.is_empty() {
        return Err(CliError::Flow {
            step: "list messengers".to_owned(),
            reason: "no messengers available".to_owned(),
        });
    }
    // 선호 배달원이 있으면 사용, 없으면 첫 배달원
    let messenger = messenger_email
        .and_then(|email| messengers.iter().find(|m| m.email == email))
        .unwrap_or(&messengers[0])
        .clone();
    ok(&format!("using messenger {} <{}>", messenger.id, messenger.email));

    step(5, "assigning bill to messenger");
    engine
        .assign(&coord, &[bill_id.clone()], &messenger.id)
        .await
        .map_err(|e| flow_err("assign bills")(e.into()))?;
    ok("assignment committed");

    step(6, "retrieving tracking to find delivery id");
    let tracking = tracker
        .track(&coord, &TrackingFilter::default())
        .await
        .map_err(|e| flow_err("tracking view")(e.into()))?;
    let entry = tracking
        .iter()
        .find(|e| e.bill.id == bill_id)
        .ok_or_else(|| CliError::Flow {
            step: "tracking view".to_owned(),
            reason: "delivery not found after assignment".to_owned(),
        })?;
    let delivery_id = entry.delivery_id.clone();
    ok(&format!("delivery id {delivery_id}"));

    step(7, &format!("logging in as messenger ({})", messenger.email));
    let mess_session = guard
        .authenticate(&messenger.email, messenger_secret)
        .await
        .map_err(|e| CliError::Flow {
            step: "messenger login".to_owned(),
            reason: e.to_string(),
        })?;
    let mess = guard
        .resolve(&mess_session.token)
        .await
        .map_err(|e| CliError::Flow {
            step: "messenger token resolve".to_owned(),
            reason: e.to_string(),
        })?;
    ok("token issued");

    step(8, "uploading proof image (mock png)");
    tracker
        .submit_proof(
            &mess,
            &delivery_id,
            ProofImage::new("image/png", Bytes::from_static(MOCK_PROOF_PNG)),
        )
        .await
        .map_err(|e| flow_err("submit proof")(e.into()))?;
    ok("proof accepted");

    step(9, "as coordinator, verifying delivery");
    verifier
        .verify(&coord, &delivery_id, VerificationDecision::Verified, "E2E: OK")
        .await
        .map_err(|e| flow_err("verify delivery")(e.into()))?;
    ok("delivery verified");

    step(10, "generating DSR report");
    let report_date = ReportDate::today_utc();
    let report = reports
        .generate(
            &coord,
            ReportRequest {
                report_date,
                note: "E2E run".to_owned(),
            },
        )
        .await
        .map_err(|e| flow_err("generate report")(e.into()))?;
    ok(&format!("DSR created: {}", report.id));

    // 감사 이벤트 드레인 (채널이 닫히기 전까지 수신된 것만)
    let mut audit_events = 0usize;
    while delivery_rx.try_recv().is_ok() {
        audit_events += 1;
    }
    while report_rx.try_recv().is_ok() {
        audit_events += 1;
    }

    println!("\n{}", "flow completed successfully".green().bold());

    writer.render(&FlowReport {
        bill_id,
        delivery_id,
        messenger_id: messenger.id,
        report_id: report.id,
        report_date: report.report_date,
        tally: report.tally,
        audit_events,
    })?;
    Ok(())
}

/// Final flow summary payload.
#[derive(Debug, Serialize)]
pub struct FlowReport {
    pub bill_id: String,
    pub delivery_id: String,
    pub messenger_id: String,
    pub report_id: String,
    pub report_date: ReportDate,
    pub tally: DeliveryTally,
    pub audit_events: usize,
}

impl Render for FlowReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Bill:      {}", self.bill_id)?;
        writeln!(w, "Delivery:  {}", self.delivery_id)?;
        writeln!(w, "Messenger: {}", self.messenger_id)?;
        writeln!(w, "Report:    {} ({})", self.report_id, self.report_date)?;
        writeln!(w, "Tally:     {}", self.tally)?;
        writeln!(w, "Audit:     {} events", self.audit_events)?;
        Ok(())
    }
}
