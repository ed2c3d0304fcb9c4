use serde_json::{Value, json};
use std::sync::Arc;
use warp::http::StatusCode;

use travanah::build_routes;
use travanah::routes::authentication::TokenKey;
use travanah::store::{MemoryStore, Store};

const KEY: &str = "RANDOM WORDS WINTER MACINTOSH PC";

fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_fixtures())
}

fn routes(
    store: &Arc<MemoryStore>,
) -> impl warp::Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone + 'static {
    build_routes(Store::from_arc(store.clone()), TokenKey::new(KEY).unwrap())
}

fn body(res: &warp::http::Response<warp::hyper::body::Bytes>) -> Value {
    serde_json::from_slice(res.body()).unwrap()
}

fn titles(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["title"].as_str().unwrap().to_string())
        .collect()
}

async fn sign_up_and_in(store: &Arc<MemoryStore>, email: &str) -> String {
    let api = routes(store);
    let res = warp::test::request()
        .method("POST")
        .path("/registration")
        .json(&json!({ "email": email, "password": "hunter22", "full_name": "Meera Iyer" }))
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = warp::test::request()
        .method("POST")
        .path("/login")
        .json(&json!({ "email": email, "password": "hunter22" }))
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    serde_json::from_slice::<String>(res.body()).unwrap()
}

#[tokio::test]
async fn feed_is_sorted_before_it_is_paged() {
    let store = store();
    let res = warp::test::request()
        .path("/questions?sort=popular&limit=1&offset=1")
        .reply(&routes(&store))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        titles(&body(&res)),
        vec!["Best momos place near Connaught Place?".to_string()]
    );
}

#[tokio::test]
async fn feed_filters_by_category_and_location() {
    let store = store();
    let api = routes(&store);

    let res = warp::test::request()
        .path("/questions?category=3")
        .reply(&api)
        .await;
    assert_eq!(
        titles(&body(&res)),
        vec!["Guitar shop recommendations in Mumbai?".to_string()]
    );

    let res = warp::test::request()
        .path("/questions?location=bangalore")
        .reply(&api)
        .await;
    assert_eq!(body(&res).as_array().map(Vec::len), Some(1));

    let res = warp::test::request()
        .path("/questions?sort=urgent")
        .reply(&api)
        .await;
    assert_eq!(body(&res)[0]["is_urgent"], json!(true));
}

#[tokio::test]
async fn unknown_sort_is_a_bad_request() {
    let store = store();
    let res = warp::test::request()
        .path("/questions?sort=loudest")
        .reply(&routes(&store))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn half_a_page_is_a_bad_request() {
    let store = store();
    let res = warp::test::request()
        .path("/questions?limit=2")
        .reply(&routes(&store))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn question_detail_and_missing_question() {
    let store = store();
    let api = routes(&store);

    let res = warp::test::request().path("/questions/2").reply(&api).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body(&res)["author"]["username"], json!("music_lover"));

    let res = warp::test::request().path("/questions/99").reply(&api).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn categories_are_the_fixed_eight() {
    let store = store();
    let res = warp::test::request()
        .path("/categories")
        .reply(&routes(&store))
        .await;
    let categories = body(&res);
    assert_eq!(categories.as_array().map(Vec::len), Some(8));
    assert_eq!(categories[0]["name"], json!("Food & Dining"));
}

#[tokio::test]
async fn posting_while_signed_out_is_refused_without_a_write() {
    let store = store();
    let res = warp::test::request()
        .method("POST")
        .path("/questions")
        .json(&json!({ "title": "Best momos place?", "content": "Looking for good momos" }))
        .reply(&routes(&store))
        .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(store.insert_calls(), 0);
}

#[tokio::test]
async fn signed_in_user_posts_and_sees_the_question() {
    let store = store();
    let token = sign_up_and_in(&store, "meera@example.com").await;
    let api = routes(&store);

    let res = warp::test::request()
        .method("POST")
        .path("/questions")
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "  Filter coffee near Mylapore?  ",
            "content": "Visiting Chennai next week.",
            "category_id": "1",
            "location_text": "Mylapore, Chennai",
            "search_radius_km": 80,
            "tags": ["coffee", "chennai", "coffee"],
        }))
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let question = body(&res);
    assert_eq!(question["title"], json!("Filter coffee near Mylapore?"));
    assert_eq!(question["tags"], json!(["coffee", "chennai"]));
    assert_eq!(question["author"]["full_name"], json!("Meera Iyer"));

    let res = warp::test::request()
        .path("/questions?location=chennai")
        .reply(&api)
        .await;
    assert_eq!(
        titles(&body(&res)),
        vec!["Filter coffee near Mylapore?".to_string()]
    );
}

#[tokio::test]
async fn incomplete_draft_is_rejected_without_a_write() {
    let store = store();
    let token = sign_up_and_in(&store, "meera@example.com").await;

    let res = warp::test::request()
        .method("POST")
        .path("/questions")
        .header("Authorization", token)
        .json(&json!({ "title": "   ", "content": "Visiting Chennai next week." }))
        .reply(&routes(&store))
        .await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(store.insert_calls(), 0);
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let store = store();
    let token = sign_up_and_in(&store, "meera@example.com").await;
    let api = routes(&store);
    let bearer = format!("Bearer {}", token);

    let res = warp::test::request()
        .path("/me")
        .header("Authorization", &bearer)
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body(&res)["greeting"], json!("Meera"));

    let res = warp::test::request()
        .method("POST")
        .path("/logout")
        .header("Authorization", &bearer)
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = warp::test::request()
        .path("/me")
        .header("Authorization", &bearer)
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_and_duplicate_registration() {
    let store = store();
    sign_up_and_in(&store, "meera@example.com").await;
    let api = routes(&store);

    let res = warp::test::request()
        .method("POST")
        .path("/login")
        .json(&json!({ "email": "meera@example.com", "password": "nope" }))
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = warp::test::request()
        .method("POST")
        .path("/registration")
        .json(&json!({ "email": "meera@example.com", "password": "again" }))
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn waitlist_validates_and_deduplicates() {
    let store = store();
    let api = routes(&store);
    let join = |email: &'static str| {
        warp::test::request()
            .method("POST")
            .path("/waitlist")
            .json(&json!({ "email": email }))
    };

    let res = join("not-an-email").reply(&api).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = join("meera@example.com").reply(&api).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(body(&res)["title"], json!("Welcome to the waitlist!"));

    let res = join("meera@example.com").reply(&api).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body(&res)["title"], json!("Already on the waitlist"));
}
