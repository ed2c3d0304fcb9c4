use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::RwLock;

use handle_errors::Error;

use crate::types::{
    account::{Account, AccountId},
    category::Category,
    question::{Author, NewQuestion, Question, QuestionId, QuestionStatus},
};

pub mod memory;
pub mod postgres;
pub mod rest;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use rest::RestStore;

/// 질문, 계정, 대기자 명단을 저장하는 백엔드.
#[async_trait]
pub trait Repository: std::fmt::Debug + Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn list_questions(&self) -> Result<Vec<Question>, Error>;

    async fn get_question(&self, id: QuestionId) -> Result<Question, Error>;

    /// 한 번의 쓰기로 끝난다. 성공하거나 아무것도 쓰지 않는다.
    async fn add_question(&self, new_question: NewQuestion) -> Result<Question, Error>;

    async fn add_account(&self, account: Account) -> Result<Account, Error>;

    async fn get_account(&self, email: &str) -> Result<Account, Error>;

    async fn get_account_by_id(&self, id: AccountId) -> Result<Account, Error>;

    async fn add_waitlist_entry(&self, email: &str) -> Result<(), Error>;
}

/// 경로 핸들러에 넘기는 저장소 핸들. 복제해도 같은 백엔드를 가리킨다.
#[derive(Debug, Clone)]
pub struct Store {
    repository: Arc<dyn Repository>,
    revoked_tokens: Arc<RwLock<HashSet<String>>>,
}

impl Store {
    pub fn new(repository: impl Repository + 'static) -> Self {
        Store {
            repository: Arc::new(repository),
            revoked_tokens: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    pub fn from_arc(repository: Arc<dyn Repository>) -> Self {
        Store {
            repository,
            revoked_tokens: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    pub async fn revoke_token(&self, token: &str) {
        self.revoked_tokens.write().await.insert(token.to_string());
    }

    pub async fn is_revoked(&self, token: &str) -> bool {
        self.revoked_tokens.read().await.contains(token)
    }
}

impl Deref for Store {
    type Target = dyn Repository;

    fn deref(&self) -> &Self::Target {
        self.repository.as_ref()
    }
}

/// question_feed 뷰의 한 행. Postgres와 REST 백엔드가 함께 쓴다.
#[derive(Deserialize, Debug, Clone)]
pub struct FeedRow {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub account_id: i32,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub reputation_score: Option<i32>,
    pub category_id: Option<String>,
    pub location_text: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_urgent: bool,
    pub created_at: DateTime<Utc>,
    pub view_count: i32,
    pub answer_count: i32,
    pub status: String,
}

fn non_negative(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

impl From<FeedRow> for Question {
    fn from(row: FeedRow) -> Self {
        let category = row.category_id.as_deref().and_then(|id| {
            let category = Category::from_id(id);
            if category.is_none() {
                tracing::warn!(question_id = row.id, category_id = id, "unknown category");
            }
            category
        });
        let status = row.status.parse::<QuestionStatus>().unwrap_or_else(|_| {
            tracing::warn!(question_id = row.id, status = %row.status, "unknown status");
            QuestionStatus::default()
        });

        Question {
            id: QuestionId(row.id),
            title: row.title,
            content: row.content,
            author: Author {
                id: AccountId(row.account_id),
                username: row.username,
                full_name: row.full_name,
                avatar_url: row.avatar_url,
                reputation_score: row.reputation_score.map(non_negative),
            },
            category,
            location_text: row.location_text,
            tags: row.tags,
            is_urgent: row.is_urgent,
            created_at: row.created_at,
            view_count: non_negative(row.view_count),
            answer_count: non_negative(row.answer_count),
            status,
        }
    }
}
