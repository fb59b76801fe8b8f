//! Service fixtures: seeded directory, composed facade, login helpers.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

use billpost_auth::{AccountRecord, PrincipalDirectory};
use billpost_core::config::BillpostConfig;
use billpost_core::event::{DeliveryEvent, ReportEvent};
use billpost_core::types::{BillInput, BillType, ProofImage, Role};
use billpost_daemon::BillpostService;

pub const COORD_EMAIL: &str = "admin@example.com";
pub const COORD_SECRET: &str = "admin123";
pub const MESSENGER_EMAIL: &str = "e2e-m@example.com";
pub const MESSENGER_SECRET: &str = "pass123";
pub const SECOND_MESSENGER_EMAIL: &str = "m2@example.com";

/// A composed service plus the receiving half of its audit channels.
pub struct TestHarness {
    pub service: Arc<BillpostService>,
    pub delivery_events: mpsc::Receiver<DeliveryEvent>,
    pub report_events: mpsc::Receiver<ReportEvent>,
}

fn account(id: &str, name: &str, email: &str, secret: &str, role: Role) -> AccountRecord {
    AccountRecord {
        id: id.to_owned(),
        name: name.to_owned(),
        email: email.to_owned(),
        secret: secret.to_owned(),
        role,
    }
}

/// Seeded accounts matching the reference client script: one coordinator
/// and two messengers, with the preferred e2e messenger present.
pub fn seeded_directory() -> Arc<PrincipalDirectory> {
    Arc::new(
        PrincipalDirectory::from_records(vec![
            account("coord-1", "Head Office", COORD_EMAIL, COORD_SECRET, Role::Coordinator),
            account(
                "mess-1",
                "E2E Messenger",
                MESSENGER_EMAIL,
                MESSENGER_SECRET,
                Role::Messenger,
            ),
            account(
                "mess-2",
                "Second Messenger",
                SECOND_MESSENGER_EMAIL,
                MESSENGER_SECRET,
                Role::Messenger,
            ),
        ])
        .expect("seed accounts must validate"),
    )
}

/// Build a fully wired service with default limits.
pub fn harness() -> TestHarness {
    harness_with_config(BillpostConfig::default())
}

/// Build a fully wired service with a caller-adjusted configuration.
pub fn harness_with_config(config: BillpostConfig) -> TestHarness {
    let (delivery_tx, delivery_rx) = mpsc::channel(256);
    let (report_tx, report_rx) = mpsc::channel(64);
    let service = Arc::new(
        BillpostService::from_parts(seeded_directory(), &config, delivery_tx, report_tx)
            .expect("service must assemble from default config"),
    );
    TestHarness {
        service,
        delivery_events: delivery_rx,
        report_events: report_rx,
    }
}

/// Login as the seeded coordinator and return the bearer token.
pub async fn coordinator_token(service: &BillpostService) -> String {
    service
        .login(COORD_EMAIL, COORD_SECRET)
        .await
        .expect("coordinator login must succeed")
        .token
}

/// Login as the seeded e2e messenger and return the bearer token.
pub async fn messenger_token(service: &BillpostService) -> String {
    service
        .login(MESSENGER_EMAIL, MESSENGER_SECRET)
        .await
        .expect("messenger login must succeed")
        .token
}

/// Login as the second messenger and return the bearer token.
pub async fn second_messenger_token(service: &BillpostService) -> String {
    service
        .login(SECOND_MESSENGER_EMAIL, MESSENGER_SECRET)
        .await
        .expect("second messenger login must succeed")
        .token
}

/// Bill input shaped like the reference client's payload.
pub fn e2e_bill_input(account_number: &str) -> BillInput {
    BillInput {
        account_number: account_number.to_owned(),
        customer_name: "E2E Test User".to_owned(),
        address: "123 Test Ave".to_owned(),
        route: "R1".to_owned(),
        bill_type: BillType::Regular,
        billing_month: "2026-02".parse().unwrap(),
    }
}

/// Mock proof payload standing in for the reference client's base64 PNG.
pub fn mock_proof() -> ProofImage {
    ProofImage::new(
        "image/png",
        Bytes::from_static(b"iVBORw0KGgoAAAANSUhEUgAAAAEAAAAB"),
    )
}
