//! BillpostService 토큰 처리 테스트
//!
//! 파사드가 토큰을 해석해 주체를 각 컴포넌트에 전달하는 경로를
//! 검증합니다. 도메인 규칙 자체는 각 크레이트의 테스트가 다룹니다.

use std::sync::Arc;

use tokio::sync::mpsc;

use billpost_auth::{AccountRecord, PrincipalDirectory};
use billpost_core::config::BillpostConfig;
use billpost_core::error::{AuthError, BillpostError};
use billpost_core::types::{Principal, Role};
use billpost_daemon::BillpostService;

fn directory() -> Arc<PrincipalDirectory> {
    Arc::new(
        PrincipalDirectory::from_records(vec![
            AccountRecord {
                id: "coord-1".to_owned(),
                name: "Head Office".to_owned(),
                email: "admin@example.com".to_owned(),
                secret: "admin123".to_owned(),
                role: Role::Coordinator,
            },
            AccountRecord {
                id: "mess-1".to_owned(),
                name: "E2E Messenger".to_owned(),
                email: "e2e-m@example.com".to_owned(),
                secret: "pass123".to_owned(),
                role: Role::Messenger,
            },
        ])
        .unwrap(),
    )
}

fn service() -> BillpostService {
    let (delivery_tx, _delivery_rx) = mpsc::channel(16);
    let (report_tx, _report_rx) = mpsc::channel(16);
    BillpostService::from_parts(
        directory(),
        &BillpostConfig::default(),
        delivery_tx,
        report_tx,
    )
    .unwrap()
}

#[tokio::test]
async fn login_resolve_logout_roundtrip() {
    let service = service();

    let issued = service.login("admin@example.com", "admin123").await.unwrap();
    let principal = service.resolve(&issued.token).await.unwrap();
    assert!(matches!(principal, Principal::Coordinator { .. }));
    assert_eq!(principal.id(), "coord-1");

    assert!(service.logout(&issued.token).await);
    assert!(!service.logout(&issued.token).await);
    let result = service.resolve(&issued.token).await;
    assert!(matches!(
        result,
        Err(BillpostError::Auth(AuthError::SessionUnknown))
    ));
}

#[tokio::test]
async fn login_failure_is_invalid_credential() {
    let service = service();
    let result = service.login("admin@example.com", "nope").await;
    assert!(matches!(
        result,
        Err(BillpostError::Auth(AuthError::InvalidCredential))
    ));
    let result = service.login("ghost@example.com", "admin123").await;
    assert!(matches!(
        result,
        Err(BillpostError::Auth(AuthError::InvalidCredential))
    ));
}

#[tokio::test]
async fn list_messengers_through_facade() {
    let service = service();
    let coord = service
        .login("admin@example.com", "admin123")
        .await
        .unwrap()
        .token;

    let messengers = service.list_messengers(&coord).await.unwrap();
    assert_eq!(messengers.len(), 1);
    assert_eq!(messengers[0].email, "e2e-m@example.com");

    let mess = service
        .login("e2e-m@example.com", "pass123")
        .await
        .unwrap()
        .token;
    let result = service.list_messengers(&mess).await;
    assert!(matches!(
        result,
        Err(BillpostError::Auth(AuthError::Forbidden { .. }))
    ));
}
