//! S3: Batch assignment is all-or-nothing.
//!
//! Assigning {billA (unassigned), billB (already assigned)} in one call
//! must leave billA still unassigned — full rollback, no partial state.

use crate::helpers::*;

use billpost_core::error::{BillError, BillpostError};
use billpost_core::types::BillStatus;

#[tokio::test]
async fn test_e2e_mixed_batch_rolls_back_completely() {
    let h = harness();
    let coord = coordinator_token(&h.service).await;

    let bills = h
        .service
        .create_bills(
            &coord,
            vec![e2e_bill_input("ACCT-A"), e2e_bill_input("ACCT-B")],
        )
        .await
        .unwrap();
    let bill_a = bills[0].id.clone();
    let bill_b = bills[1].id.clone();

    // B만 먼저 배정
    h.service
        .assign_bills(&coord, &[bill_b.clone()], "mess-1")
        .await
        .unwrap();

    // 혼합 배치는 충돌 목록과 함께 원자적으로 거부
    let result = h
        .service
        .assign_bills(&coord, &[bill_a.clone(), bill_b.clone()], "mess-2")
        .await;
    match result {
        Err(BillpostError::Bill(BillError::AssignmentConflict { conflicts })) => {
            assert_eq!(conflicts, vec![bill_b]);
        }
        other => panic!("expected AssignmentConflict, got {other:?}"),
    }

    // A는 여전히 미배정 목록에 보인다
    let unassigned = h
        .service
        .list_bills(&coord, Some(BillStatus::Unassigned))
        .await
        .unwrap();
    assert_eq!(unassigned.len(), 1);
    assert_eq!(unassigned[0].id, bill_a);
}

#[tokio::test]
async fn test_e2e_single_reassignment_is_already_assigned() {
    let h = harness();
    let coord = coordinator_token(&h.service).await;

    let bills = h
        .service
        .create_bills(&coord, vec![e2e_bill_input("ACCT-1")])
        .await
        .unwrap();
    let ids = vec![bills[0].id.clone()];

    h.service.assign_bills(&coord, &ids, "mess-1").await.unwrap();

    // 단건 재배정은 정확한 원인을 보고
    let result = h.service.assign_bills(&coord, &ids, "mess-2").await;
    assert!(matches!(
        result,
        Err(BillpostError::Bill(BillError::AlreadyAssigned(_)))
    ));
}

#[tokio::test]
async fn test_e2e_unknown_messenger_rejected_without_mutation() {
    let h = harness();
    let coord = coordinator_token(&h.service).await;

    let bills = h
        .service
        .create_bills(&coord, vec![e2e_bill_input("ACCT-1")])
        .await
        .unwrap();

    let result = h
        .service
        .assign_bills(&coord, &[bills[0].id.clone()], "ghost-messenger")
        .await;
    assert!(matches!(
        result,
        Err(BillpostError::Bill(BillError::MessengerNotFound(_)))
    ));

    let unassigned = h
        .service
        .list_bills(&coord, Some(BillStatus::Unassigned))
        .await
        .unwrap();
    assert_eq!(unassigned.len(), 1);
}
