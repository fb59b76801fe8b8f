//! S4: Proof-gated forward-only lifecycle.
//!
//! {assign -> verify} must fail; {assign -> submitProof -> verify} must
//! succeed; a second submitProof must fail; oversized proof is rejected.

use crate::helpers::*;

use billpost_core::config::BillpostConfig;
use billpost_core::error::{BillpostError, DeliveryError};
use billpost_core::types::{ProofImage, VerificationDecision};
use bytes::Bytes;

async fn assigned_delivery(h: &TestHarness, coord: &str) -> String {
    let bills = h
        .service
        .create_bills(coord, vec![e2e_bill_input("ACCT-1")])
        .await
        .unwrap();
    let deliveries = h
        .service
        .assign_bills(coord, &[bills[0].id.clone()], "mess-1")
        .await
        .unwrap();
    deliveries[0].id.clone()
}

#[tokio::test]
async fn test_e2e_verify_requires_proof_first() {
    let h = harness();
    let coord = coordinator_token(&h.service).await;
    let delivery_id = assigned_delivery(&h, &coord).await;

    // assign -> verify: 반드시 실패
    let result = h
        .service
        .verify_delivery(
            &coord,
            &delivery_id,
            VerificationDecision::Verified,
            "premature",
        )
        .await;
    assert!(matches!(
        result,
        Err(BillpostError::Delivery(DeliveryError::InvalidState { .. }))
    ));

    // assign -> proof -> verify: 성공
    let mess = messenger_token(&h.service).await;
    h.service
        .submit_proof(&mess, &delivery_id, mock_proof())
        .await
        .unwrap();
    h.service
        .verify_delivery(&coord, &delivery_id, VerificationDecision::Verified, "ok")
        .await
        .expect("verify after proof must succeed");
}

#[tokio::test]
async fn test_e2e_second_proof_submission_fails() {
    let h = harness();
    let coord = coordinator_token(&h.service).await;
    let delivery_id = assigned_delivery(&h, &coord).await;
    let mess = messenger_token(&h.service).await;

    h.service
        .submit_proof(&mess, &delivery_id, mock_proof())
        .await
        .unwrap();

    let result = h
        .service
        .submit_proof(&mess, &delivery_id, mock_proof())
        .await;
    assert!(matches!(
        result,
        Err(BillpostError::Delivery(DeliveryError::InvalidState { .. }))
    ));
}

#[tokio::test]
async fn test_e2e_unknown_delivery_ids() {
    let h = harness();
    let coord = coordinator_token(&h.service).await;
    let mess = messenger_token(&h.service).await;

    let result = h.service.submit_proof(&mess, "ghost", mock_proof()).await;
    assert!(matches!(
        result,
        Err(BillpostError::Delivery(DeliveryError::NotFound(_)))
    ));

    let result = h
        .service
        .verify_delivery(&coord, "ghost", VerificationDecision::Verified, "x")
        .await;
    assert!(matches!(
        result,
        Err(BillpostError::Delivery(DeliveryError::NotFound(_)))
    ));
}

#[tokio::test]
async fn test_e2e_proof_size_cap() {
    let mut config = BillpostConfig::default();
    config.dispatch.max_proof_bytes = 16;
    let h = harness_with_config(config);

    let coord = coordinator_token(&h.service).await;
    let delivery_id = assigned_delivery(&h, &coord).await;
    let mess = messenger_token(&h.service).await;

    let oversized = ProofImage::new(
        "image/png",
        Bytes::from(vec![0u8; 17]),
    );
    let result = h.service.submit_proof(&mess, &delivery_id, oversized).await;
    assert!(matches!(
        result,
        Err(BillpostError::Delivery(DeliveryError::ProofTooLarge {
            size: 17,
            max: 16
        }))
    ));

    // 상한 이내 증빙은 수락
    let small = ProofImage::new("image/png", Bytes::from(vec![0u8; 16]));
    h.service
        .submit_proof(&mess, &delivery_id, small)
        .await
        .expect("proof within cap must be accepted");
}
