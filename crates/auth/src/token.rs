//! 세션 토큰 저장소 -- 불투명 토큰 발급과 해석
//!
//! [`SessionStore`]는 UUID v4 토큰을 주체에 매핑하고 TTL을 강제합니다.
//! 만료된 세션은 해석 시점과 발급 시점에 제거됩니다(lazy purge).
//! 토큰은 불투명 문자열이며 주체 정보가 인코딩되어 있지 않습니다.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use tokio::sync::Mutex;
use tracing::debug;

use billpost_core::metrics as m;
use billpost_core::types::Principal;

use crate::error::AuthGuardError;

/// 발급된 세션
#[derive(Debug, Clone)]
pub struct Session {
    /// 세션에 묶인 주체
    pub principal: Principal,
    /// 발급 시각
    pub issued_at: SystemTime,
    /// 만료 시각
    pub expires_at: SystemTime,
}

/// 발급 결과 — 호출자에게 돌려주는 토큰과 주체 정보
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// 불투명 세션 토큰
    pub token: String,
    /// 인증된 주체
    pub principal: Principal,
    /// 만료 시각
    pub expires_at: SystemTime,
}

/// 세션 저장소
///
/// 모든 연산은 내부 `Mutex`로 직렬화됩니다. 만료 판정과 제거가
/// 한 임계 구역 안에서 일어나므로 만료된 토큰이 해석에 성공하는
/// 경합은 존재하지 않습니다.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: Duration,
    max_sessions: usize,
}

impl SessionStore {
    /// 새 세션 저장소를 생성합니다.
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
            max_sessions,
        }
    }

    /// 주체에 대한 새 세션 토큰을 발급합니다.
    ///
    /// 저장소가 가득 차면 만료 세션을 먼저 정리하고, 그래도 상한이면
    /// `SessionLimit`으로 거부합니다.
    pub async fn issue(&self, principal: Principal) -> Result<IssuedToken, AuthGuardError> {
        let now = SystemTime::now();
        let mut sessions = self.sessions.lock().await;

        if sessions.len() >= self.max_sessions {
            sessions.retain(|_, s| s.expires_at > now);
            if sessions.len() >= self.max_sessions {
                return Err(AuthGuardError::SessionLimit {
                    max: self.max_sessions,
                });
            }
        }

        let token = uuid::Uuid::new_v4().to_string();
        let session = Session {
            principal: principal.clone(),
            issued_at: now,
            expires_at: now + self.ttl,
        };
        let expires_at = session.expires_at;
        sessions.insert(token.clone(), session);

        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!(m::AUTH_SESSIONS_ACTIVE).set(sessions.len() as f64);

        Ok(IssuedToken {
            token,
            principal,
            expires_at,
        })
    }

    /// 토큰을 주체로 해석합니다.
    ///
    /// 만료된 세션은 제거 후 `SessionExpired`를 반환합니다.
    pub async fn resolve(&self, token: &str) -> Result<Principal, AuthGuardError> {
        let now = SystemTime::now();
        let mut sessions = self.sessions.lock().await;

        let session = sessions.get(token).ok_or(AuthGuardError::SessionUnknown)?;
        if session.expires_at <= now {
            sessions.remove(token);
            #[allow(clippy::cast_precision_loss)]
            metrics::gauge!(m::AUTH_SESSIONS_ACTIVE).set(sessions.len() as f64);
            return Err(AuthGuardError::SessionExpired);
        }

        Ok(session.principal.clone())
    }

    /// 토큰을 폐기합니다. 존재했으면 `true`를 반환합니다.
    pub async fn revoke(&self, token: &str) -> bool {
        let mut sessions = self.sessions.lock().await;
        let removed = sessions.remove(token).is_some();
        if removed {
            debug!("session revoked");
            #[allow(clippy::cast_precision_loss)]
            metrics::gauge!(m::AUTH_SESSIONS_ACTIVE).set(sessions.len() as f64);
        }
        removed
    }

    /// 만료된 세션을 제거하고 제거된 수를 반환합니다.
    pub async fn purge_expired(&self) -> usize {
        let now = SystemTime::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        let purged = before - sessions.len();
        if purged > 0 {
            debug!(purged, "purged expired sessions");
            #[allow(clippy::cast_precision_loss)]
            metrics::gauge!(m::AUTH_SESSIONS_ACTIVE).set(sessions.len() as f64);
        }
        purged
    }

    /// 현재 저장된 세션 수를 반환합니다 (만료 포함).
    pub async fn active_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
