use serde::Deserialize;
use tracing::{Level, event};
use warp::http::StatusCode;

use handle_errors::Error;

use crate::store::Store;
use crate::types::notice::Notice;

#[derive(Deserialize, Debug, Clone)]
pub struct WaitlistSignup {
    pub email: String,
}

/// 앞뒤 공백을 지운 주소의 `@` 앞뒤에 글자가 있어야 한다.
pub fn validate_email(email: &str) -> Result<&str, Error> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(Error::InvalidEmail),
    }
}

pub async fn join_waitlist(
    store: Store,
    signup: WaitlistSignup,
) -> Result<impl warp::Reply, warp::Rejection> {
    let email = validate_email(&signup.email)?;

    match store.add_waitlist_entry(email).await {
        Ok(()) => {
            event!(Level::INFO, "waitlist signup");
            Ok(warp::reply::with_status(
                warp::reply::json(&Notice::joined_waitlist()),
                StatusCode::CREATED,
            ))
        }
        // 이미 등록된 주소는 오류가 아니라 안내로 돌려준다.
        Err(Error::AlreadyExists(_)) => Ok(warp::reply::with_status(
            warp::reply::json(&Notice::already_on_waitlist()),
            StatusCode::CONFLICT,
        )),
        Err(e) => Err(warp::reject::custom(e)),
    }
}
