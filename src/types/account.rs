use chrono::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Session {
    pub exp: DateTime<Utc>,
    pub account_id: AccountId,
    pub nbf: DateTime<Utc>,
}

impl Session {
    /// 토큰에는 계정 id만 있으므로 프로필은 비어 있다.
    pub fn user(&self) -> CurrentUser {
        CurrentUser {
            id: self.account_id,
            full_name: None,
            avatar_url: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Account {
    pub id: Option<AccountId>,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(pub i32);

/// 로그인 요청 본문.
#[derive(Deserialize, Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// 로그인한 사용자.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: AccountId,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl CurrentUser {
    /// 이름의 첫 단어. 이름이 없으면 "Explorer".
    pub fn greeting_name(&self) -> &str {
        self.full_name
            .as_deref()
            .and_then(|name| name.split_whitespace().next())
            .unwrap_or("Explorer")
    }
}

impl Account {
    pub fn current_user(&self) -> Option<CurrentUser> {
        self.id.map(|id| CurrentUser {
            id,
            full_name: self.full_name.clone(),
            avatar_url: self.avatar_url.clone(),
        })
    }
}
