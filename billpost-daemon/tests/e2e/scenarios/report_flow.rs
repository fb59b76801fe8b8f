//! S5: Report generation over lifecycle snapshots.
//!
//! Reports are generation-time snapshots labeled by report_date;
//! multiple reports per date are independent, immutable records.

use crate::helpers::*;

use billpost_core::types::VerificationDecision;
use billpost_report::ReportRequest;

fn request(date: &str, note: &str) -> ReportRequest {
    ReportRequest {
        report_date: date.parse().unwrap(),
        note: note.to_owned(),
    }
}

#[tokio::test]
async fn test_e2e_report_snapshots_progress() {
    let h = harness();
    let coord = coordinator_token(&h.service).await;
    let mess = messenger_token(&h.service).await;

    let bills = h
        .service
        .create_bills(
            &coord,
            vec![e2e_bill_input("ACCT-1"), e2e_bill_input("ACCT-2")],
        )
        .await
        .unwrap();
    let ids: Vec<String> = bills.iter().map(|b| b.id.clone()).collect();
    let deliveries = h.service.assign_bills(&coord, &ids, "mess-1").await.unwrap();

    // 배정 직후 스냅샷
    let early = h
        .service
        .generate_report(&coord, request("2026-02-10", "morning"))
        .await
        .unwrap();
    assert_eq!(early.tally.assigned, 2);
    assert_eq!(early.tally.terminal(), 0);

    // 한 건 verified, 한 건 rejected로 진행
    h.service
        .submit_proof(&mess, &deliveries[0].id, mock_proof())
        .await
        .unwrap();
    h.service
        .verify_delivery(
            &coord,
            &deliveries[0].id,
            VerificationDecision::Verified,
            "ok",
        )
        .await
        .unwrap();
    h.service
        .submit_proof(&mess, &deliveries[1].id, mock_proof())
        .await
        .unwrap();
    h.service
        .verify_delivery(
            &coord,
            &deliveries[1].id,
            VerificationDecision::Rejected,
            "wrong address",
        )
        .await
        .unwrap();

    // 같은 날짜의 두 번째 리포트는 새 스냅샷을 담은 독립 레코드
    let late = h
        .service
        .generate_report(&coord, request("2026-02-10", "evening"))
        .await
        .unwrap();
    assert_ne!(late.id, early.id);
    assert_eq!(late.tally.verified, 1);
    assert_eq!(late.tally.rejected, 1);
    assert_eq!(late.tally.assigned, 0);

    // 기존 리포트는 갱신되지 않았다
    let listed = h
        .service
        .list_reports(&coord, Some("2026-02-10".parse().unwrap()))
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].note, "morning");
    assert_eq!(listed[0].tally.assigned, 2);
    assert_eq!(listed[1].note, "evening");
}

#[tokio::test]
async fn test_e2e_report_on_empty_ledger_succeeds() {
    let h = harness();
    let coord = coordinator_token(&h.service).await;

    let report = h
        .service
        .generate_report(&coord, request("2026-02-10", "nothing yet"))
        .await
        .expect("well-formed report requests always succeed");
    assert_eq!(report.tally.total(), 0);
}
