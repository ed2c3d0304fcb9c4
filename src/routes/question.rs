use std::collections::HashMap;
use tracing::{Level, event, instrument};
use warp::http::StatusCode;

use crate::draft::{DraftRequest, QuestionDraft};
use crate::feed;
use crate::form::QuestionForm;
use crate::store::Store;
use crate::types::account::Session;
use crate::types::feed_query::extract_feed_query;
use crate::types::pagination::extract_pagination;
use crate::types::question::QuestionId;

/// 피드 파이프라인을 거친 뒤에 페이지를 자른다.
#[instrument(skip(store))]
pub async fn get_questions(
    params: HashMap<String, String>,
    store: Store,
) -> Result<impl warp::Reply, warp::Rejection> {
    event!(target: "travanah", Level::INFO, "querying questions");
    let query = extract_feed_query(&params)?;
    let pagination = extract_pagination(&params)?;

    let questions = store.list_questions().await?;
    let total = questions.len();
    let feed = pagination.apply(feed::apply(&questions, &query));
    event!(Level::INFO, total, returned = feed.len(), sort = ?query.sort);

    Ok(warp::reply::json(&feed))
}

pub async fn get_question(id: i32, store: Store) -> Result<impl warp::Reply, warp::Rejection> {
    match store.get_question(QuestionId(id)).await {
        Ok(question) => Ok(warp::reply::json(&question)),
        Err(e) => Err(warp::reject::custom(e)),
    }
}

/// 로그인 여부는 폼이 판단한다. 세션이 없으면 저장소를 건드리지 않고 401로 끝난다.
pub async fn add_question(
    session: Option<Session>,
    store: Store,
    request: DraftRequest,
) -> Result<impl warp::Reply, warp::Rejection> {
    let draft = QuestionDraft::try_from(request)?;
    let user = session.map(|session| session.user());

    let mut form = QuestionForm::with_draft(draft);
    match form.submit(user.as_ref(), &*store).await {
        Ok(question) => Ok(warp::reply::with_status(
            warp::reply::json(&question),
            StatusCode::CREATED,
        )),
        Err(e) => Err(warp::reject::custom(e)),
    }
}
