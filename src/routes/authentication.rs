use argon2::{self, Config};
use chrono::prelude::*;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{Level, event, instrument};
use warp::Filter;
use warp::http::StatusCode;

use handle_errors::Error;

use crate::store::Store;
use crate::types::account::{Account, AccountId, Credentials, CurrentUser, Session};

pub const TOKEN_KEY_LEN: usize = 32;

/// PASETO v2.local 암호화 키. 로그에 남지 않도록 Debug를 직접 구현한다.
#[derive(Clone)]
pub struct TokenKey(Arc<[u8]>);

impl TokenKey {
    pub fn new(key: &str) -> Result<Self, Error> {
        if key.len() != TOKEN_KEY_LEN {
            return Err(Error::ConfigError(config::ConfigError::Message(format!(
                "paseto_key must be exactly {} bytes, got {}",
                TOKEN_KEY_LEN,
                key.len()
            ))));
        }
        Ok(TokenKey(Arc::from(key.as_bytes())))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("TokenKey(..)")
    }
}

/// `Bearer <token>` 과 토큰만 있는 헤더를 모두 받는다.
fn strip_bearer(header: &str) -> &str {
    header
        .strip_prefix("Bearer ")
        .unwrap_or(header)
        .trim()
}

pub fn verify_token(token: &str, key: &TokenKey) -> Result<Session, Error> {
    let token = paseto::tokens::validate_local_token(
        token,
        None,
        key.as_bytes(),
        &paseto::tokens::TimeBackend::Chrono,
    )
    .map_err(|_| Error::CannotDecryptToken)?;

    serde_json::from_value::<Session>(token).map_err(|_| Error::CannotDecryptToken)
}

pub fn issue_token(account_id: AccountId, key: &TokenKey) -> Result<String, Error> {
    let current_date_time = Utc::now();
    let dt = current_date_time + chrono::Duration::days(1);

    paseto::tokens::PasetoBuilder::new()
        .set_encryption_key(key.as_bytes())
        .set_expiration(&dt)
        .set_not_before(&current_date_time)
        .set_claim("account_id", serde_json::json!(account_id))
        .build()
        .map_err(|_| Error::CannotIssueToken)
}

pub fn hash_password(password: &[u8]) -> Result<String, Error> {
    // 32바이트 난수 솔트와 argon2 기본 설정을 쓴다.
    let salt = rand::thread_rng().r#gen::<[u8; 32]>();
    let config = Config::default();
    argon2::hash_encoded(password, &salt, &config).map_err(Error::ArgonLibraryError)
}

fn verify_password(hash: &str, password: &[u8]) -> Result<bool, argon2::Error> {
    argon2::verify_encoded(hash, password)
}

pub async fn register(store: Store, account: Account) -> Result<impl warp::Reply, warp::Rejection> {
    let hashed_password = hash_password(account.password.as_bytes())?;

    let account = Account {
        id: None,
        email: account.email.trim().to_string(),
        password: hashed_password,
        username: account.username,
        full_name: account.full_name,
        avatar_url: account.avatar_url,
    };

    match store.add_account(account).await {
        Ok(account) => {
            event!(Level::INFO, account_id = ?account.id, "account added");
            Ok(warp::reply::with_status("Account added", StatusCode::CREATED))
        }
        Err(e) => Err(warp::reject::custom(e)),
    }
}

pub async fn login(
    store: Store,
    key: TokenKey,
    login: Credentials,
) -> Result<impl warp::Reply, warp::Rejection> {
    let account = store.get_account(login.email.trim()).await?;
    match verify_password(&account.password, login.password.as_bytes()) {
        Ok(true) => match account.id {
            Some(id) => Ok(warp::reply::json(&issue_token(id, &key)?)),
            None => Err(warp::reject::custom(Error::AccountNotFound)),
        },
        Ok(false) => Err(warp::reject::custom(Error::WrongPassword)),
        // 시드 계정처럼 해시가 없는 계정도 여기로 온다.
        Err(e) => {
            event!(Level::WARN, "cannot verify stored hash: {}", e);
            Err(warp::reject::custom(Error::WrongPassword))
        }
    }
}

/// 토큰을 폐기한다. 실패해도 기록만 하고 성공으로 응답한다.
#[instrument(skip(store, token))]
pub async fn logout(
    session: Session,
    token: String,
    store: Store,
) -> Result<impl warp::Reply, warp::Rejection> {
    store.revoke_token(strip_bearer(&token)).await;
    event!(Level::INFO, account_id = session.account_id.0, "signed out");
    Ok(warp::reply::with_status("Signed out", StatusCode::OK))
}

#[derive(Serialize, Debug)]
struct Me {
    #[serde(flatten)]
    user: CurrentUser,
    greeting: String,
}

pub async fn me(session: Session, store: Store) -> Result<impl warp::Reply, warp::Rejection> {
    let account = store.get_account_by_id(session.account_id).await?;
    let user = account.current_user().unwrap_or_else(|| session.user());
    let greeting = user.greeting_name().to_string();
    Ok(warp::reply::json(&Me { user, greeting }))
}

async fn session_from_header(
    header: &str,
    store: &Store,
    key: &TokenKey,
) -> Result<Session, Error> {
    let token = strip_bearer(header);
    if store.is_revoked(token).await {
        return Err(Error::CannotDecryptToken);
    }
    verify_token(token, key)
}

pub fn auth(
    store: Store,
    key: TokenKey,
) -> impl Filter<Extract = (Session,), Error = warp::Rejection> + Clone {
    warp::header::<String>("Authorization").and_then(move |token: String| {
        let store = store.clone();
        let key = key.clone();
        async move {
            session_from_header(&token, &store, &key)
                .await
                .map_err(warp::reject::custom)
        }
    })
}

/// 로그인하지 않았거나 토큰이 유효하지 않으면 `None`.
pub fn maybe_auth(
    store: Store,
    key: TokenKey,
) -> impl Filter<Extract = (Option<Session>,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("Authorization").and_then(move |token: Option<String>| {
        let store = store.clone();
        let key = key.clone();
        async move {
            let session = match token {
                Some(token) => session_from_header(&token, &store, &key).await.ok(),
                None => None,
            };
            Ok::<_, warp::Rejection>(session)
        }
    })
}
