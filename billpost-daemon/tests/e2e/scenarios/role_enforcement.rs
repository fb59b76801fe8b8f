//! S2: Role and ownership enforcement across the whole surface.
//!
//! A messenger token must be rejected from every coordinator operation,
//! a coordinator token from proof submission, and messenger A from
//! messenger B's delivery.

use crate::helpers::*;

use billpost_core::error::{AuthError, BillpostError};
use billpost_core::types::VerificationDecision;
use billpost_dispatch::TrackingFilter;
use billpost_report::ReportRequest;

fn assert_forbidden(result: Result<impl std::fmt::Debug, BillpostError>, what: &str) {
    match result {
        Err(BillpostError::Auth(AuthError::Forbidden { .. })) => {}
        other => panic!("{what}: expected Forbidden, got {other:?}"),
    }
}

#[tokio::test]
async fn test_e2e_messenger_cannot_use_coordinator_surface() {
    let h = harness();
    let mess = messenger_token(&h.service).await;

    assert_forbidden(
        h.service
            .create_bills(&mess, vec![e2e_bill_input("ACCT-1")])
            .await,
        "create bills",
    );
    assert_forbidden(h.service.list_bills(&mess, None).await, "list bills");
    assert_forbidden(h.service.list_messengers(&mess).await, "list messengers");
    assert_forbidden(
        h.service
            .assign_bills(&mess, &["any".to_owned()], "mess-1")
            .await,
        "assign bills",
    );
    assert_forbidden(
        h.service.tracking(&mess, &TrackingFilter::default()).await,
        "tracking view",
    );
    assert_forbidden(
        h.service
            .verify_delivery(&mess, "any", VerificationDecision::Verified, "x")
            .await,
        "verify delivery",
    );
    assert_forbidden(
        h.service
            .generate_report(
                &mess,
                ReportRequest {
                    report_date: "2026-02-10".parse().unwrap(),
                    note: "x".to_owned(),
                },
            )
            .await,
        "generate report",
    );
    assert_forbidden(h.service.list_reports(&mess, None).await, "list reports");
}

#[tokio::test]
async fn test_e2e_coordinator_cannot_submit_proof() {
    let h = harness();
    let coord = coordinator_token(&h.service).await;

    let bills = h
        .service
        .create_bills(&coord, vec![e2e_bill_input("ACCT-1")])
        .await
        .unwrap();
    let deliveries = h
        .service
        .assign_bills(&coord, &[bills[0].id.clone()], "mess-1")
        .await
        .unwrap();

    assert_forbidden(
        h.service
            .submit_proof(&coord, &deliveries[0].id, mock_proof())
            .await,
        "submit proof with coordinator token",
    );
}

#[tokio::test]
async fn test_e2e_cross_messenger_ownership() {
    let h = harness();
    let coord = coordinator_token(&h.service).await;

    let bills = h
        .service
        .create_bills(&coord, vec![e2e_bill_input("ACCT-1")])
        .await
        .unwrap();
    // mess-1에게 배정
    let deliveries = h
        .service
        .assign_bills(&coord, &[bills[0].id.clone()], "mess-1")
        .await
        .unwrap();

    // mess-2는 제출 불가
    let other = second_messenger_token(&h.service).await;
    assert_forbidden(
        h.service
            .submit_proof(&other, &deliveries[0].id, mock_proof())
            .await,
        "cross-messenger proof submission",
    );

    // 소유자는 제출 가능
    let owner = messenger_token(&h.service).await;
    h.service
        .submit_proof(&owner, &deliveries[0].id, mock_proof())
        .await
        .expect("assigned messenger must be able to submit proof");
}

#[tokio::test]
async fn test_e2e_invalid_tokens_rejected() {
    let h = harness();

    let result = h.service.list_bills("not-a-token", None).await;
    assert!(matches!(
        result,
        Err(BillpostError::Auth(AuthError::SessionUnknown))
    ));

    // 로그아웃된 토큰도 unknown으로 거부
    let coord = coordinator_token(&h.service).await;
    assert!(h.service.logout(&coord).await);
    let result = h.service.list_bills(&coord, None).await;
    assert!(matches!(
        result,
        Err(BillpostError::Auth(AuthError::SessionUnknown))
    ));

    let result = h.service.login(COORD_EMAIL, "wrong-secret").await;
    assert!(matches!(
        result,
        Err(BillpostError::Auth(AuthError::InvalidCredential))
    ));
}
