//! 인증 가드 오케스트레이터 -- 자격 증명 검증과 세션 수명 관리
//!
//! [`AuthGuard`]는 계정 디렉토리와 세션 저장소를 묶어 인증 경계를
//! 제공합니다. 모든 요청 표면은 여기서 토큰을 주체로 해석한 뒤
//! 해석된 [`Principal`]을 각 컴포넌트 연산에 명시적으로 전달합니다.
//!
//! # 내부 아키텍처
//! ```text
//! authenticate(email, secret) ── PrincipalDirectory 조회
//!                                      |
//!                                SessionStore.issue()
//!                                      |
//!                                IssuedToken {token, principal}
//!
//! resolve(token) ── SessionStore.resolve() ──> Principal
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{info, warn};

use billpost_core::metrics as m;
use billpost_core::service::{Component, HealthStatus, MessengerDirectory};
use billpost_core::types::{Messenger, Principal};

use crate::config::AuthGuardConfig;
use crate::directory::PrincipalDirectory;
use crate::error::AuthGuardError;
use crate::token::{IssuedToken, SessionStore};

/// 인증 가드
///
/// core의 `Component` trait을 구현하여 `billpost-daemon`에서
/// 다른 모듈과 동일하게 헬스 체크 대상으로 관리됩니다.
pub struct AuthGuard {
    /// 가드 설정
    config: AuthGuardConfig,
    /// 계정 디렉토리 (읽기 전용, 공유)
    directory: Arc<PrincipalDirectory>,
    /// 세션 저장소
    sessions: SessionStore,
    /// 성공한 로그인 카운터
    logins_ok: AtomicU64,
    /// 거부된 로그인 카운터
    logins_denied: AtomicU64,
}

impl AuthGuard {
    /// 디렉토리와 설정으로 인증 가드를 생성합니다.
    pub fn new(
        directory: Arc<PrincipalDirectory>,
        config: AuthGuardConfig,
    ) -> Result<Self, AuthGuardError> {
        config.validate()?;
        let sessions = SessionStore::new(
            Duration::from_secs(config.token_ttl_secs),
            config.max_sessions,
        );
        Ok(Self {
            config,
            directory,
            sessions,
            logins_ok: AtomicU64::new(0),
            logins_denied: AtomicU64::new(0),
        })
    }

    /// 자격 증명을 검증하고 세션 토큰을 발급합니다.
    ///
    /// 알 수 없는 이메일과 비밀값 불일치는 동일하게 `InvalidCredential`로
    /// 거부됩니다.
    pub async fn authenticate(
        &self,
        email: &str,
        secret: &str,
    ) -> Result<IssuedToken, AuthGuardError> {
        let account = match self.directory.find_by_email(email) {
            Some(account) if constant_eq(account.secret.as_bytes(), secret.as_bytes()) => account,
            _ => {
                self.logins_denied.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(m::AUTH_LOGINS_TOTAL, m::LABEL_RESULT => "failure").increment(1);
                warn!(email = %email, "login rejected");
                return Err(AuthGuardError::InvalidCredential);
            }
        };

        let issued = self.sessions.issue(account.principal()).await?;
        self.logins_ok.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(m::AUTH_LOGINS_TOTAL, m::LABEL_RESULT => "success").increment(1);
        info!(principal = %issued.principal, "login accepted");
        Ok(issued)
    }

    /// 토큰을 주체로 해석합니다.
    pub async fn resolve(&self, token: &str) -> Result<Principal, AuthGuardError> {
        self.sessions.resolve(token).await
    }

    /// 토큰을 폐기합니다 (로그아웃). 존재했으면 `true`를 반환합니다.
    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.revoke(token).await
    }

    /// 등록된 배달원 목록을 반환합니다.
    ///
    /// 코디네이터 전용 연산입니다.
    pub async fn list_messengers(
        &self,
        principal: &Principal,
    ) -> Result<Vec<Messenger>, AuthGuardError> {
        match principal {
            Principal::Coordinator { .. } => {}
            Principal::Messenger { .. } => {
                metrics::counter!(m::AUTH_FORBIDDEN_TOTAL).increment(1);
                return Err(AuthGuardError::Forbidden {
                    operation: "list messengers".to_owned(),
                    reason: "requires coordinator role".to_owned(),
                });
            }
        }
        Ok(self.directory.list_messengers().await)
    }

    /// 성공한 로그인 수를 반환합니다.
    pub fn logins_ok(&self) -> u64 {
        self.logins_ok.load(Ordering::Relaxed)
    }

    /// 거부된 로그인 수를 반환합니다.
    pub fn logins_denied(&self) -> u64 {
        self.logins_denied.load(Ordering::Relaxed)
    }

    /// 현재 세션 수를 반환합니다.
    pub async fn session_count(&self) -> usize {
        self.sessions.active_count().await
    }

    /// 가드 설정을 반환합니다.
    pub fn config(&self) -> &AuthGuardConfig {
        &self.config
    }
}

impl Component for AuthGuard {
    fn name(&self) -> &str {
        billpost_core::event::MODULE_AUTH_GUARD
    }

    async fn health_check(&self) -> HealthStatus {
        if self.directory.account_count() == 0 {
            return HealthStatus::Degraded("no seeded accounts; all logins fail".to_owned());
        }
        HealthStatus::Healthy
    }
}

/// 길이 노출 외의 타이밍 차이를 피하는 바이트 비교
fn constant_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use billpost_core::types::Role;

    use crate::directory::AccountRecord;

    fn record(id: &str, email: &str, secret: &str, role: Role) -> AccountRecord {
        AccountRecord {
            id: id.to_owned(),
            name: format!("account {id}"),
            email: email.to_owned(),
            secret: secret.to_owned(),
            role,
        }
    }

    fn guard() -> AuthGuard {
        let directory = Arc::new(
            PrincipalDirectory::from_records(vec![
                record("c-1", "admin@example.com", "admin123", Role::Coordinator),
                record("m-1", "e2e-m@example.com", "pass123", Role::Messenger),
            ])
            .unwrap(),
        );
        AuthGuard::new(
            directory,
            AuthGuardConfig {
                accounts_path: "unused".to_owned(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn authenticate_issues_resolvable_token() {
        let guard = guard();
        let issued = guard
            .authenticate("admin@example.com", "admin123")
            .await
            .unwrap();
        assert!(matches!(issued.principal, Principal::Coordinator { .. }));

        let principal = guard.resolve(&issued.token).await.unwrap();
        assert_eq!(principal.id(), "c-1");
        assert_eq!(guard.logins_ok(), 1);
    }

    #[tokio::test]
    async fn authenticate_rejects_wrong_secret() {
        let guard = guard();
        let result = guard.authenticate("admin@example.com", "wrong").await;
        assert!(matches!(result, Err(AuthGuardError::InvalidCredential)));
        assert_eq!(guard.logins_denied(), 1);
    }

    #[tokio::test]
    async fn authenticate_rejects_unknown_email() {
        let guard = guard();
        let result = guard.authenticate("nobody@example.com", "admin123").await;
        assert!(matches!(result, Err(AuthGuardError::InvalidCredential)));
    }

    #[tokio::test]
    async fn messenger_login_yields_messenger_principal() {
        let guard = guard();
        let issued = guard
            .authenticate("e2e-m@example.com", "pass123")
            .await
            .unwrap();
        assert!(matches!(issued.principal, Principal::Messenger { .. }));
        assert_eq!(issued.principal.id(), "m-1");
    }

    #[tokio::test]
    async fn revoke_invalidates_token() {
        let guard = guard();
        let issued = guard
            .authenticate("admin@example.com", "admin123")
            .await
            .unwrap();
        assert!(guard.revoke(&issued.token).await);
        assert!(guard.resolve(&issued.token).await.is_err());
    }

    #[tokio::test]
    async fn list_messengers_requires_coordinator() {
        let guard = guard();
        let coordinator = Principal::Coordinator {
            id: "c-1".to_owned(),
        };
        let messenger = Principal::Messenger {
            id: "m-1".to_owned(),
        };

        let listed = guard.list_messengers(&coordinator).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].email, "e2e-m@example.com");

        let result = guard.list_messengers(&messenger).await;
        assert!(matches!(result, Err(AuthGuardError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn health_degraded_without_accounts() {
        let seeded = guard();
        assert!(seeded.health_check().await.is_healthy());

        let directory = Arc::new(PrincipalDirectory::from_records(Vec::new()).unwrap());
        let empty = AuthGuard::new(directory, AuthGuardConfig::default()).unwrap();
        assert!(matches!(
            empty.health_check().await,
            HealthStatus::Degraded(_)
        ));
    }

    #[test]
    fn constant_eq_basics() {
        assert!(constant_eq(b"abc", b"abc"));
        assert!(!constant_eq(b"abc", b"abd"));
        assert!(!constant_eq(b"abc", b"abcd"));
        assert!(constant_eq(b"", b""));
    }
}
