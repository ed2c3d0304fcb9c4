use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};

use handle_errors::Error;

use crate::store::{FeedRow, Repository};
use crate::types::{
    account::{Account, AccountId},
    question::{NewQuestion, Question, QuestionId},
};

const DUPLICATE_KEY: &str = "23505";

#[derive(Debug, Clone)]
pub struct PgStore {
    pub connection: PgPool,
}

impl PgStore {
    pub async fn new(db_url: &str) -> Result<Self, Error> {
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
            .map_err(|e| {
                tracing::event!(tracing::Level::ERROR, "DB 연결을 하지 못했습니다: {:?}", e);
                Error::DatabaseQueryError(e)
            })?;

        Ok(PgStore {
            connection: db_pool,
        })
    }

    pub async fn migrate(&self) -> Result<(), Error> {
        sqlx::migrate!()
            .run(&self.connection)
            .await
            .map_err(Error::MigrationError)
    }
}

fn feed_row(row: PgRow) -> FeedRow {
    FeedRow {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        account_id: row.get("account_id"),
        username: row.get("username"),
        full_name: row.get("full_name"),
        avatar_url: row.get("avatar_url"),
        reputation_score: row.get("reputation_score"),
        category_id: row.get("category_id"),
        location_text: row.get("location_text"),
        tags: row.get("tags"),
        is_urgent: row.get("is_urgent"),
        created_at: row.get("created_at"),
        view_count: row.get("view_count"),
        answer_count: row.get("answer_count"),
        status: row.get("status"),
    }
}

fn account_row(row: PgRow) -> Account {
    Account {
        id: Some(AccountId(row.get("id"))),
        email: row.get("email"),
        password: row.get("password"),
        username: row.get("username"),
        full_name: row.get("full_name"),
        avatar_url: row.get("avatar_url"),
    }
}

fn is_duplicate_key(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == DUPLICATE_KEY)
}

fn query_error(error: sqlx::Error) -> Error {
    tracing::event!(tracing::Level::ERROR, "{:?}", error);
    Error::DatabaseQueryError(error)
}

#[async_trait]
impl Repository for PgStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn list_questions(&self) -> Result<Vec<Question>, Error> {
        match sqlx::query("SELECT * FROM question_feed")
            .map(feed_row)
            .fetch_all(&self.connection)
            .await
        {
            Ok(rows) => Ok(rows.into_iter().map(Question::from).collect()),
            Err(error) => Err(query_error(error)),
        }
    }

    async fn get_question(&self, id: QuestionId) -> Result<Question, Error> {
        match sqlx::query("SELECT * FROM question_feed WHERE id = $1")
            .bind(id.0)
            .map(feed_row)
            .fetch_optional(&self.connection)
            .await
        {
            Ok(Some(row)) => Ok(Question::from(row)),
            Ok(None) => Err(Error::QuestionNotFound),
            Err(error) => Err(query_error(error)),
        }
    }

    async fn add_question(&self, new_question: NewQuestion) -> Result<Question, Error> {
        // INSERT 결과를 CTE로 받아 작성자 정보와 함께 한 번에 돌려받는다.
        match sqlx::query(
            "WITH inserted AS (
                INSERT INTO questions
                    (account_id, title, content, category_id, location_text, search_radius, tags, is_urgent)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
            )
            SELECT q.id, q.title, q.content, q.account_id,
                   a.username, a.full_name, a.avatar_url, a.reputation_score,
                   q.category_id, q.location_text, q.tags, q.is_urgent, q.created_at,
                   q.view_count, q.answer_count, q.status
            FROM inserted q
            JOIN accounts a ON a.id = q.account_id",
        )
        .bind(new_question.author_id.0)
        .bind(new_question.title)
        .bind(new_question.content)
        .bind(new_question.category_id)
        .bind(new_question.location_text)
        .bind(new_question.search_radius as i32)
        .bind(new_question.tags)
        .bind(new_question.is_urgent)
        .map(feed_row)
        .fetch_one(&self.connection)
        .await
        {
            Ok(row) => Ok(Question::from(row)),
            Err(error) => Err(query_error(error)),
        }
    }

    async fn add_account(&self, account: Account) -> Result<Account, Error> {
        match sqlx::query(
            "INSERT INTO accounts (email, password, username, full_name, avatar_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password, username, full_name, avatar_url",
        )
        .bind(account.email)
        .bind(account.password)
        .bind(account.username)
        .bind(account.full_name)
        .bind(account.avatar_url)
        .map(account_row)
        .fetch_one(&self.connection)
        .await
        {
            Ok(account) => Ok(account),
            Err(error) if is_duplicate_key(&error) => {
                tracing::event!(
                    tracing::Level::WARN,
                    db_message = error.as_database_error().map(|e| e.message()),
                    "duplicate account"
                );
                Err(Error::AlreadyExists("Account".to_string()))
            }
            Err(error) => Err(query_error(error)),
        }
    }

    async fn get_account(&self, email: &str) -> Result<Account, Error> {
        match sqlx::query("SELECT * FROM accounts WHERE email = $1")
            .bind(email)
            .map(account_row)
            .fetch_optional(&self.connection)
            .await
        {
            Ok(Some(account)) => Ok(account),
            Ok(None) => Err(Error::AccountNotFound),
            Err(error) => Err(query_error(error)),
        }
    }

    async fn get_account_by_id(&self, id: AccountId) -> Result<Account, Error> {
        match sqlx::query("SELECT * FROM accounts WHERE id = $1")
            .bind(id.0)
            .map(account_row)
            .fetch_optional(&self.connection)
            .await
        {
            Ok(Some(account)) => Ok(account),
            Ok(None) => Err(Error::AccountNotFound),
            Err(error) => Err(query_error(error)),
        }
    }

    async fn add_waitlist_entry(&self, email: &str) -> Result<(), Error> {
        match sqlx::query("INSERT INTO waitlist (email) VALUES ($1)")
            .bind(email)
            .execute(&self.connection)
            .await
        {
            Ok(_) => Ok(()),
            Err(error) if is_duplicate_key(&error) => {
                Err(Error::AlreadyExists("Waitlist entry".to_string()))
            }
            Err(error) => Err(query_error(error)),
        }
    }
}
