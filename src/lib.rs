#![warn(clippy::all)]

use handle_errors::{Error, return_error};
use tracing::{Level, event};
use warp::{Filter, http::Method};

pub mod config;
pub mod draft;
pub mod feed;
pub mod form;
pub mod routes;
pub mod shell;
pub mod store;
pub mod types;

use crate::config::{Backend, Config};
use crate::routes::authentication::TokenKey;
use crate::store::{MemoryStore, PgStore, RestStore, Store};

/// 설정에 따라 백엔드를 고른다. postgres 는 여기서 마이그레이션까지 끝낸다.
pub async fn setup_store(config: &Config) -> Result<Store, Error> {
    let store = match config.backend {
        Backend::Memory if config.seed_fixtures => Store::new(MemoryStore::with_fixtures()),
        Backend::Memory => Store::new(MemoryStore::new()),
        Backend::Postgres => {
            let store = PgStore::new(&config.database_url()).await?;
            store.migrate().await?;
            Store::new(store)
        }
        Backend::Rest => {
            let url = config.rest_url.as_deref().ok_or_else(|| {
                Error::ConfigError(::config::ConfigError::NotFound("rest_url".to_string()))
            })?;
            let api_key = config.rest_api_key.as_deref().unwrap_or_default();
            Store::new(RestStore::new(url, api_key, config.rest_max_retries)?)
        }
    };
    event!(Level::INFO, backend = store.backend_tag(), "store ready");
    Ok(store)
}

pub fn build_routes(
    store: Store,
    key: TokenKey,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let store_filter = {
        let store = store.clone();
        warp::any().map(move || store.clone())
    };
    let key_filter = {
        let key = key.clone();
        warp::any().map(move || key.clone())
    };
    let auth = || routes::authentication::auth(store.clone(), key.clone());

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["Content-Type", "Authorization"])
        .allow_methods(&[Method::GET, Method::POST]);

    let get_questions = warp::get()
        .and(warp::path("questions"))
        .and(warp::path::end())
        .and(warp::query())
        .and(store_filter.clone())
        .and_then(routes::question::get_questions);

    let get_question = warp::get()
        .and(warp::path("questions"))
        .and(warp::path::param::<i32>())
        .and(warp::path::end())
        .and(store_filter.clone())
        .and_then(routes::question::get_question);

    let add_question = warp::post()
        .and(warp::path("questions"))
        .and(warp::path::end())
        .and(routes::authentication::maybe_auth(store.clone(), key.clone()))
        .and(store_filter.clone())
        .and(warp::body::json())
        .and_then(routes::question::add_question);

    let get_categories = warp::get()
        .and(warp::path("categories"))
        .and(warp::path::end())
        .and_then(routes::category::get_categories);

    let registration = warp::post()
        .and(warp::path("registration"))
        .and(warp::path::end())
        .and(store_filter.clone())
        .and(warp::body::json())
        .and_then(routes::authentication::register);

    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(store_filter.clone())
        .and(key_filter)
        .and(warp::body::json())
        .and_then(routes::authentication::login);

    let logout = warp::post()
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(auth())
        .and(warp::header::<String>("Authorization"))
        .and(store_filter.clone())
        .and_then(routes::authentication::logout);

    let me = warp::get()
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(auth())
        .and(store_filter.clone())
        .and_then(routes::authentication::me);

    let waitlist = warp::post()
        .and(warp::path("waitlist"))
        .and(warp::path::end())
        .and(store_filter)
        .and(warp::body::json())
        .and_then(routes::waitlist::join_waitlist);

    get_questions
        .or(get_question)
        .or(add_question)
        .or(get_categories)
        .or(registration)
        .or(login)
        .or(logout)
        .or(me)
        .or(waitlist)
        .with(cors)
        .with(warp::trace(|info| {
            tracing::info_span!(
                "request",
                method = %info.method(),
                path = %info.path(),
                id = %uuid::Uuid::new_v4(),
            )
        }))
        .recover(return_error)
}

/// 설정을 읽은 뒤 서버를 띄운다. 포트가 닫힐 때까지 돌아오지 않는다.
pub async fn run(config: &Config) -> Result<(), Error> {
    let key = TokenKey::new(&config.paseto_key)?;
    let store = setup_store(config).await?;
    let routes = build_routes(store, key);

    event!(Level::INFO, port = config.port, "listening");
    warp::serve(routes).run(([0, 0, 0, 0], config.port)).await;
    Ok(())
}
