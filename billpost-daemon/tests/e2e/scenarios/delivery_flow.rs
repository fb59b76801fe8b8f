//! S1: The full reference flow — create, assign, proof, verify, report.
//!
//! Mirrors the client sequence: coordinator login, create one test bill,
//! fetch unassigned bills, pick the preferred messenger, assign, find the
//! delivery in tracking, messenger uploads proof, coordinator verifies,
//! and a DSR reflects the verified delivery.

use crate::helpers::*;

use billpost_core::event::DeliveryEventKind;
use billpost_core::types::{BillStatus, DeliveryState, VerificationDecision};
use billpost_dispatch::TrackingFilter;
use billpost_report::ReportRequest;

#[tokio::test]
async fn test_e2e_reference_delivery_flow() {
    let mut h = harness();

    // 1) Coordinator login
    let coord = coordinator_token(&h.service).await;

    // 2) Create one test bill (unassigned)
    let created = h
        .service
        .create_bills(&coord, vec![e2e_bill_input("ACCT-E2E-1001")])
        .await
        .expect("bill creation should succeed");
    assert_eq!(created.len(), 1);

    // 3) Fetch unassigned bills
    let unassigned = h
        .service
        .list_bills(&coord, Some(BillStatus::Unassigned))
        .await
        .expect("listing unassigned bills should succeed");
    assert!(!unassigned.is_empty(), "no unassigned bills found");
    let bill_id = unassigned[0].id.clone();
    assert_eq!(unassigned[0].account_number, "ACCT-E2E-1001");

    // 4) Fetch messengers, prefer the e2e messenger if present
    let messengers = h
        .service
        .list_messengers(&coord)
        .await
        .expect("listing messengers should succeed");
    assert!(!messengers.is_empty(), "no messengers available");
    let messenger_id = messengers
        .iter()
        .find(|m| m.email == MESSENGER_EMAIL)
        .unwrap_or(&messengers[0])
        .id
        .clone();

    // 5) Assign the bill to the messenger
    let deliveries = h
        .service
        .assign_bills(&coord, &[bill_id.clone()], &messenger_id)
        .await
        .expect("assignment should succeed");
    assert_eq!(deliveries.len(), 1);

    // 6) Retrieve tracking and find the delivery joined to the bill
    let tracking = h
        .service
        .tracking(&coord, &TrackingFilter::default())
        .await
        .expect("tracking view should succeed");
    let entry = tracking
        .iter()
        .find(|e| e.bill.id == bill_id)
        .expect("delivery not found after assignment");
    let delivery_id = entry.delivery_id.clone();
    assert_eq!(entry.state, DeliveryState::Assigned);
    assert_eq!(entry.messenger_id, messenger_id);

    // 7-8) Messenger login and proof upload
    let mess = messenger_token(&h.service).await;
    let updated = h
        .service
        .submit_proof(&mess, &delivery_id, mock_proof())
        .await
        .expect("proof submission should succeed");
    assert_eq!(updated.state, DeliveryState::ProofSubmitted);

    // 9) Coordinator verifies the delivery
    let verified = h
        .service
        .verify_delivery(
            &coord,
            &delivery_id,
            VerificationDecision::Verified,
            "E2E: OK",
        )
        .await
        .expect("verification should succeed");
    assert_eq!(verified.state, DeliveryState::Verified);
    assert_eq!(verified.verification_note.as_deref(), Some("E2E: OK"));

    // 10) Generate a DSR — the verified delivery must appear in the counts
    let report = h
        .service
        .generate_report(
            &coord,
            ReportRequest {
                report_date: "2026-02-10".parse().unwrap(),
                note: "E2E run".to_owned(),
            },
        )
        .await
        .expect("report generation should succeed");
    assert_eq!(report.tally.verified, 1);
    assert_eq!(report.tally.total(), 1);

    // Audit trail: assigned -> proof_submitted -> verified
    let kinds: Vec<DeliveryEventKind> = [
        h.delivery_events.recv().await.unwrap().kind,
        h.delivery_events.recv().await.unwrap().kind,
        h.delivery_events.recv().await.unwrap().kind,
    ]
    .into();
    assert_eq!(kinds[0], DeliveryEventKind::Assigned);
    assert!(matches!(kinds[1], DeliveryEventKind::ProofSubmitted { .. }));
    assert_eq!(kinds[2], DeliveryEventKind::Verified);

    let report_event = h.report_events.recv().await.unwrap();
    assert_eq!(report_event.report_id, report.id);
    assert_eq!(report_event.tally.verified, 1);
}
