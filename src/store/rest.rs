use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{Level, event};

use handle_errors::{BackendError, Error};

use crate::store::{FeedRow, Repository};
use crate::types::{
    account::{Account, AccountId},
    question::{NewQuestion, Question, QuestionId},
};

/// PostgREST 호환 호스팅 백엔드 (예: `https://<project>.supabase.co/rest/v1`).
#[derive(Clone)]
pub struct RestStore {
    base_url: String,
    api_key: String,
    client: ClientWithMiddleware,
}

// API 키가 로그에 남지 않도록 직접 구현한다.
impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// `questions` 테이블의 한 행. INSERT 응답으로 받는다.
#[derive(Deserialize, Debug)]
struct QuestionRow {
    id: i32,
    account_id: i32,
    title: String,
    content: String,
    category_id: Option<String>,
    location_text: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    is_urgent: bool,
    created_at: DateTime<Utc>,
    view_count: i32,
    answer_count: i32,
    status: String,
}

#[derive(Deserialize, Debug, Default)]
struct AuthorRow {
    username: Option<String>,
    full_name: Option<String>,
    avatar_url: Option<String>,
    reputation_score: Option<i32>,
}

impl QuestionRow {
    fn with_author(self, author: AuthorRow) -> FeedRow {
        FeedRow {
            id: self.id,
            title: self.title,
            content: self.content,
            account_id: self.account_id,
            username: author.username,
            full_name: author.full_name,
            avatar_url: author.avatar_url,
            reputation_score: author.reputation_score,
            category_id: self.category_id,
            location_text: self.location_text,
            tags: self.tags,
            is_urgent: self.is_urgent,
            created_at: self.created_at,
            view_count: self.view_count,
            answer_count: self.answer_count,
            status: self.status,
        }
    }
}

#[derive(Serialize, Debug)]
struct NewAccountRow<'a> {
    email: &'a str,
    password: &'a str,
    username: Option<&'a str>,
    full_name: Option<&'a str>,
    avatar_url: Option<&'a str>,
}

#[derive(Deserialize, Debug)]
struct AccountRow {
    id: i32,
    email: String,
    password: String,
    username: Option<String>,
    full_name: Option<String>,
    avatar_url: Option<String>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: Some(AccountId(row.id)),
            email: row.email,
            password: row.password,
            username: row.username,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
        }
    }
}

#[derive(Serialize, Debug)]
struct WaitlistRow<'a> {
    email: &'a str,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str, max_retries: u32) -> Result<Self, Error> {
        Url::parse(base_url)
            .map_err(|e| Error::InvalidParameter(format!("rest url '{}': {}", base_url, e)))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let client = ClientBuilder::new(reqwest::Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(RestStore {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    async fn author(&self, id: AccountId) -> Result<AuthorRow, Error> {
        let url = self.endpoint(
            "accounts",
            &[
                (
                    "select",
                    "username,full_name,avatar_url,reputation_score".to_string(),
                ),
                ("id", format!("eq.{}", id.0)),
            ],
        )?;
        self.select::<AuthorRow>(url)
            .await?
            .into_iter()
            .next()
            .ok_or(Error::AccountNotFound)
    }

    fn endpoint(&self, table: &str, params: &[(&str, String)]) -> Result<Url, Error> {
        let url = format!("{}/{}", self.base_url, table);
        let url = if params.is_empty() {
            Url::parse(&url)
        } else {
            Url::parse_with_params(&url, params)
        };
        url.map_err(|e| Error::InvalidParameter(e.to_string()))
    }

    async fn select<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, Error> {
        let res = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(Error::MiddlewareReqwestAPIError)?;

        let res = check_status(res).await?;
        res.json::<Vec<T>>().await.map_err(Error::ReqwestAPIError)
    }

    async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<Vec<T>, Error> {
        let body = serde_json::to_string(body)
            .map_err(|e| Error::InvalidParameter(e.to_string()))?;
        let res = self
            .client
            .post(self.endpoint(table, &[])?)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .body(body)
            .send()
            .await
            .map_err(Error::MiddlewareReqwestAPIError)?;

        let res = check_status(res).await?;
        res.json::<Vec<T>>().await.map_err(Error::ReqwestAPIError)
    }
}

async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let err = transform_error(res).await;
    tracing::event!(tracing::Level::ERROR, "{}", err);
    // 409 는 `conflict_as` 에서 AlreadyExists 로 바뀐다.
    if status.is_client_error() {
        Err(Error::ClientError(err))
    } else {
        Err(Error::ServerError(err))
    }
}

async fn transform_error(res: reqwest::Response) -> BackendError {
    BackendError {
        status: res.status().as_u16(),
        message: res.text().await.unwrap_or_default(),
    }
}

fn no_row() -> Error {
    Error::ServerError(BackendError {
        status: 500,
        message: "insert returned no row".to_string(),
    })
}

fn conflict_as(what: &str) -> impl FnOnce(Error) -> Error + '_ {
    move |error| match error {
        Error::ClientError(BackendError { status: 409, .. }) => {
            Error::AlreadyExists(what.to_string())
        }
        other => other,
    }
}

#[async_trait]
impl Repository for RestStore {
    fn backend_tag(&self) -> &'static str {
        "rest"
    }

    async fn list_questions(&self) -> Result<Vec<Question>, Error> {
        let url = self.endpoint("question_feed", &[("select", "*".to_string())])?;
        let rows = self.select::<FeedRow>(url).await?;
        Ok(rows.into_iter().map(Question::from).collect())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Question, Error> {
        let url = self.endpoint(
            "question_feed",
            &[("select", "*".to_string()), ("id", format!("eq.{}", id))],
        )?;
        self.select::<FeedRow>(url)
            .await?
            .into_iter()
            .next()
            .map(Question::from)
            .ok_or(Error::QuestionNotFound)
    }

    /// 쓰기는 INSERT 한 번이다. 그 뒤의 작성자 조회는 실패해도 결과를 바꾸지 않는다.
    async fn add_question(&self, new_question: NewQuestion) -> Result<Question, Error> {
        let row = self
            .insert::<_, QuestionRow>("questions", &new_question)
            .await?
            .into_iter()
            .next()
            .ok_or_else(no_row)?;

        let author = match self.author(AccountId(row.account_id)).await {
            Ok(author) => author,
            Err(e) => {
                event!(
                    Level::WARN,
                    question_id = row.id,
                    "question saved without author profile: {}",
                    e
                );
                AuthorRow::default()
            }
        };
        Ok(Question::from(row.with_author(author)))
    }

    async fn add_account(&self, account: Account) -> Result<Account, Error> {
        let row = NewAccountRow {
            email: &account.email,
            password: &account.password,
            username: account.username.as_deref(),
            full_name: account.full_name.as_deref(),
            avatar_url: account.avatar_url.as_deref(),
        };
        self.insert::<_, AccountRow>("accounts", &row)
            .await
            .map_err(conflict_as("Account"))?
            .into_iter()
            .next()
            .map(Account::from)
            .ok_or_else(no_row)
    }

    async fn get_account(&self, email: &str) -> Result<Account, Error> {
        let url = self.endpoint(
            "accounts",
            &[("select", "*".to_string()), ("email", format!("eq.{}", email))],
        )?;
        self.select::<AccountRow>(url)
            .await?
            .into_iter()
            .next()
            .map(Account::from)
            .ok_or(Error::AccountNotFound)
    }

    async fn get_account_by_id(&self, id: AccountId) -> Result<Account, Error> {
        let url = self.endpoint(
            "accounts",
            &[("select", "*".to_string()), ("id", format!("eq.{}", id.0))],
        )?;
        self.select::<AccountRow>(url)
            .await?
            .into_iter()
            .next()
            .map(Account::from)
            .ok_or(Error::AccountNotFound)
    }

    async fn add_waitlist_entry(&self, email: &str) -> Result<(), Error> {
        self.insert::<_, serde_json::Value>("waitlist", &WaitlistRow { email })
            .await
            .map_err(conflict_as("Waitlist entry"))?;
        Ok(())
    }
}
