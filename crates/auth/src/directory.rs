//! 계정 디렉토리 -- 시드 계정 로딩 및 주체 조회
//!
//! [`PrincipalDirectory`]는 `accounts.toml`에서 코디네이터/배달원 계정을
//! 로드하고, 이메일·ID 조회와 배달원 목록을 제공합니다.
//! 계정 생성/수정은 이 코어의 범위 밖이며 시드 파일이 유일한 공급원입니다.
//!
//! # 계정 파일 형식
//! ```toml
//! [[accounts]]
//! id = "coord-1"
//! name = "Head Office"
//! email = "admin@example.com"
//! secret = "admin123"
//! role = "coordinator"
//! ```

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use billpost_core::types::{Messenger, Principal, Role};

use crate::error::AuthGuardError;

/// Maximum accounts file size (1 MB) to prevent OOM via malicious TOML
const MAX_ACCOUNTS_FILE_SIZE: u64 = 1024 * 1024;

/// Maximum number of accounts to prevent unbounded Vec growth
const MAX_ACCOUNTS: usize = 10_000;

/// 시드 계정 레코드
///
/// `secret`은 로그와 Debug 출력에 절대 노출되지 않습니다.
#[derive(Clone, Deserialize)]
pub struct AccountRecord {
    /// 계정 고유 ID
    pub id: String,
    /// 표시 이름
    pub name: String,
    /// 이메일 (유일, 로그인 식별자)
    pub email: String,
    /// 로그인 비밀값
    pub secret: String,
    /// 계정 역할
    pub role: Role,
}

impl fmt::Debug for AccountRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("secret", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

impl AccountRecord {
    /// 이 계정에 해당하는 주체 값을 생성합니다.
    pub fn principal(&self) -> Principal {
        match self.role {
            Role::Coordinator => Principal::Coordinator {
                id: self.id.clone(),
            },
            Role::Messenger => Principal::Messenger {
                id: self.id.clone(),
            },
        }
    }
}

/// `accounts.toml` 최상위 구조
#[derive(Deserialize)]
struct AccountsFile {
    #[serde(default)]
    accounts: Vec<AccountRecord>,
}

/// 계정 디렉토리 -- 로드된 시드 계정의 읽기 전용 뷰
///
/// 로드 후에는 변경되지 않으므로 `Arc`로 공유하며 락이 필요 없습니다.
pub struct PrincipalDirectory {
    accounts: Vec<AccountRecord>,
}

impl PrincipalDirectory {
    /// 검증을 거쳐 계정 레코드들로 디렉토리를 생성합니다.
    ///
    /// 테스트와 fixture에서 파일 없이 디렉토리를 구성할 때 사용합니다.
    pub fn from_records(accounts: Vec<AccountRecord>) -> Result<Self, AuthGuardError> {
        validate_accounts(&accounts)?;
        if accounts.is_empty() {
            warn!("principal directory loaded with zero accounts; every login will fail");
        }
        Ok(Self { accounts })
    }

    /// TOML 파일에서 계정을 로드합니다.
    ///
    /// 파일 크기와 계정 수에 상한을 두고, 이메일/ID 유일성을 검증합니다.
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Self, AuthGuardError> {
        let path = path.as_ref();
        let load_err = |reason: String| AuthGuardError::AccountsLoad {
            path: path.display().to_string(),
            reason,
        };

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| load_err(e.to_string()))?;
        if metadata.len() > MAX_ACCOUNTS_FILE_SIZE {
            return Err(load_err(format!(
                "file too large: {} bytes (max: {MAX_ACCOUNTS_FILE_SIZE})",
                metadata.len(),
            )));
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| load_err(e.to_string()))?;
        let file: AccountsFile = toml::from_str(&content).map_err(|e| load_err(e.to_string()))?;

        let directory = Self::from_records(file.accounts)?;
        info!(
            path = %path.display(),
            accounts = directory.account_count(),
            messengers = directory.messenger_count(),
            "loaded principal directory"
        );
        Ok(directory)
    }

    /// 이메일로 계정을 조회합니다 (대소문자 무시).
    pub fn find_by_email(&self, email: &str) -> Option<&AccountRecord> {
        self.accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
    }

    /// ID로 계정을 조회합니다.
    pub fn find_by_id(&self, id: &str) -> Option<&AccountRecord> {
        self.accounts.iter().find(|a| a.id == id)
    }

    /// 전체 계정 수를 반환합니다.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// 배달원 계정 수를 반환합니다.
    pub fn messenger_count(&self) -> usize {
        self.accounts
            .iter()
            .filter(|a| a.role == Role::Messenger)
            .count()
    }
}

impl billpost_core::service::MessengerDirectory for PrincipalDirectory {
    async fn find_messenger(&self, messenger_id: &str) -> Option<Messenger> {
        self.accounts
            .iter()
            .find(|a| a.id == messenger_id && a.role == Role::Messenger)
            .map(|a| Messenger {
                id: a.id.clone(),
                name: a.name.clone(),
                email: a.email.clone(),
            })
    }

    async fn list_messengers(&self) -> Vec<Messenger> {
        self.accounts
            .iter()
            .filter(|a| a.role == Role::Messenger)
            .map(|a| Messenger {
                id: a.id.clone(),
                name: a.name.clone(),
                email: a.email.clone(),
            })
            .collect()
    }
}

/// 계정 레코드들의 유효성을 검증합니다.
fn validate_accounts(accounts: &[AccountRecord]) -> Result<(), AuthGuardError> {
    if accounts.len() > MAX_ACCOUNTS {
        return Err(AuthGuardError::AccountsValidation {
            account: "(file)".to_owned(),
            reason: format!("maximum account count ({MAX_ACCOUNTS}) exceeded"),
        });
    }

    for (idx, account) in accounts.iter().enumerate() {
        let label = if account.email.is_empty() {
            format!("(index {idx})")
        } else {
            account.email.clone()
        };

        if account.id.is_empty() {
            return Err(AuthGuardError::AccountsValidation {
                account: label,
                reason: "id cannot be empty".to_owned(),
            });
        }
        if account.email.is_empty() {
            return Err(AuthGuardError::AccountsValidation {
                account: label,
                reason: "email cannot be empty".to_owned(),
            });
        }
        if account.secret.is_empty() {
            return Err(AuthGuardError::AccountsValidation {
                account: label,
                reason: "secret cannot be empty".to_owned(),
            });
        }
    }

    // 이메일/ID 유일성 (이메일은 대소문자 무시)
    for (i, a) in accounts.iter().enumerate() {
        for b in accounts.iter().skip(i + 1) {
            if a.email.eq_ignore_ascii_case(&b.email) {
                return Err(AuthGuardError::AccountsValidation {
                    account: a.email.clone(),
                    reason: "duplicate email".to_owned(),
                });
            }
            if a.id == b.id {
                return Err(AuthGuardError::AccountsValidation {
                    account: a.id.clone(),
                    reason: "duplicate id".to_owned(),
                });
            }
        }
    }

    Ok(())
}
