use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use tokio::sync::RwLock;

use handle_errors::{BackendError, Error};

use crate::store::Repository;
use crate::types::{
    account::{Account, AccountId},
    category::Category,
    question::{Author, NewQuestion, Question, QuestionId, QuestionStatus},
};

#[derive(Debug, Clone)]
struct StoredAccount {
    account: Account,
    reputation_score: u32,
}

impl StoredAccount {
    fn author(&self) -> Option<Author> {
        self.account.id.map(|id| Author {
            id,
            username: self.account.username.clone(),
            full_name: self.account.full_name.clone(),
            avatar_url: self.account.avatar_url.clone(),
            reputation_score: Some(self.reputation_score),
        })
    }
}

/// 메모리에만 두는 저장소. 개발용 시드 데이터와 테스트에 쓴다.
#[derive(Debug)]
pub struct MemoryStore {
    questions: RwLock<Vec<Question>>,
    accounts: RwLock<Vec<StoredAccount>>,
    waitlist: RwLock<Vec<String>>,
    next_question_id: AtomicI32,
    next_account_id: AtomicI32,
    failing: AtomicBool,
    insert_calls: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore {
            questions: RwLock::new(Vec::new()),
            accounts: RwLock::new(Vec::new()),
            waitlist: RwLock::new(Vec::new()),
            next_question_id: AtomicI32::new(1),
            next_account_id: AtomicI32::new(1),
            failing: AtomicBool::new(false),
            insert_calls: AtomicU64::new(0),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// 세 개의 예시 질문과 그 작성자로 채운 저장소.
    pub fn with_fixtures() -> Self {
        let (accounts, questions) = fixtures(Utc::now());
        let store = MemoryStore {
            next_question_id: AtomicI32::new(questions.len() as i32 + 1),
            next_account_id: AtomicI32::new(accounts.len() as i32 + 1),
            questions: RwLock::new(questions),
            accounts: RwLock::new(accounts),
            ..MemoryStore::default()
        };
        tracing::info!("seeded in-memory store with fixture questions");
        store
    }

    /// 이후의 모든 쓰기를 실패시킨다.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// 지금까지 시도된 질문 저장 횟수 (실패 포함).
    pub fn insert_calls(&self) -> u64 {
        self.insert_calls.load(Ordering::SeqCst)
    }

    fn check_failing(&self) -> Result<(), Error> {
        if self.failing.load(Ordering::SeqCst) {
            tracing::event!(tracing::Level::ERROR, "memory store is set to fail");
            return Err(Error::ServerError(BackendError {
                status: 503,
                message: "memory store unavailable".to_string(),
            }));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn list_questions(&self) -> Result<Vec<Question>, Error> {
        Ok(self.questions.read().await.clone())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Question, Error> {
        self.questions
            .read()
            .await
            .iter()
            .find(|q| q.id == id)
            .cloned()
            .ok_or(Error::QuestionNotFound)
    }

    async fn add_question(&self, new_question: NewQuestion) -> Result<Question, Error> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;

        let author = self
            .accounts
            .read()
            .await
            .iter()
            .find(|stored| stored.account.id == Some(new_question.author_id))
            .and_then(StoredAccount::author)
            .unwrap_or(Author {
                id: new_question.author_id,
                username: None,
                full_name: None,
                avatar_url: None,
                reputation_score: None,
            });

        let question = Question {
            id: QuestionId(self.next_question_id.fetch_add(1, Ordering::SeqCst)),
            title: new_question.title,
            content: new_question.content,
            author,
            category: new_question
                .category_id
                .as_deref()
                .and_then(Category::from_id),
            location_text: new_question.location_text,
            tags: new_question.tags,
            is_urgent: new_question.is_urgent,
            created_at: Utc::now(),
            view_count: 0,
            answer_count: 0,
            status: QuestionStatus::Open,
        };
        self.questions.write().await.push(question.clone());
        Ok(question)
    }

    async fn add_account(&self, account: Account) -> Result<Account, Error> {
        self.check_failing()?;
        let mut accounts = self.accounts.write().await;
        if accounts.iter().any(|stored| stored.account.email == account.email) {
            return Err(Error::AlreadyExists("Account".to_string()));
        }
        let account = Account {
            id: Some(AccountId(self.next_account_id.fetch_add(1, Ordering::SeqCst))),
            ..account
        };
        accounts.push(StoredAccount {
            account: account.clone(),
            reputation_score: 0,
        });
        Ok(account)
    }

    async fn get_account(&self, email: &str) -> Result<Account, Error> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|stored| stored.account.email == email)
            .map(|stored| stored.account.clone())
            .ok_or(Error::AccountNotFound)
    }

    async fn get_account_by_id(&self, id: AccountId) -> Result<Account, Error> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|stored| stored.account.id == Some(id))
            .map(|stored| stored.account.clone())
            .ok_or(Error::AccountNotFound)
    }

    async fn add_waitlist_entry(&self, email: &str) -> Result<(), Error> {
        self.check_failing()?;
        let mut waitlist = self.waitlist.write().await;
        if waitlist.iter().any(|entry| entry == email) {
            return Err(Error::AlreadyExists("Waitlist entry".to_string()));
        }
        waitlist.push(email.to_string());
        Ok(())
    }
}

fn fixture_account(id: i32, username: &str, full_name: &str, reputation_score: u32) -> StoredAccount {
    StoredAccount {
        account: Account {
            id: Some(AccountId(id)),
            email: format!("{}@travanah.test", username),
            // 해시가 아니므로 이 계정으로는 로그인할 수 없다.
            password: String::new(),
            username: Some(username.to_string()),
            full_name: Some(full_name.to_string()),
            avatar_url: Some("/api/placeholder/40/40".to_string()),
        },
        reputation_score,
    }
}

fn fixtures(now: DateTime<Utc>) -> (Vec<StoredAccount>, Vec<Question>) {
    let accounts = vec![
        fixture_account(1, "foodie_delhi", "Rahul Sharma", 245),
        fixture_account(2, "music_lover", "Priya Patel", 89),
        fixture_account(3, "bangalore_resident", "Ankit Kumar", 156),
    ];
    let author = |index: usize| {
        accounts[index]
            .author()
            .unwrap_or_else(|| unreachable!("fixture accounts always have ids"))
    };
    let tags = |tags: &[&str]| tags.iter().map(|t| t.to_string()).collect::<Vec<_>>();

    let questions = vec![
        Question {
            id: QuestionId(1),
            title: "Best momos place near Connaught Place?".to_string(),
            content: "Looking for authentic momos within 2km radius of CP. Prefer vegetarian options with good hygiene standards.".to_string(),
            author: author(0),
            category: Some(Category::FoodAndDining),
            location_text: Some("Connaught Place, Delhi".to_string()),
            tags: tags(&["momos", "vegetarian", "delhi", "street-food"]),
            is_urgent: false,
            created_at: now,
            view_count: 23,
            answer_count: 5,
            status: QuestionStatus::Open,
        },
        Question {
            id: QuestionId(2),
            title: "Guitar shop recommendations in Mumbai?".to_string(),
            content: "Want to buy my first acoustic guitar. Budget around ₹15k. Any reliable shops in Bandra or nearby areas?".to_string(),
            author: author(1),
            category: Some(Category::Shopping),
            location_text: Some("Bandra, Mumbai".to_string()),
            tags: tags(&["guitar", "music", "shopping", "mumbai"]),
            is_urgent: false,
            created_at: now - Duration::hours(1),
            view_count: 15,
            answer_count: 3,
            status: QuestionStatus::Open,
        },
        Question {
            id: QuestionId(3),
            title: "URGENT: Late night pharmacy near Koramangala?".to_string(),
            content: "Need medicines urgently. Any 24/7 pharmacy open in Koramangala area?".to_string(),
            author: author(2),
            category: Some(Category::HealthAndWellness),
            location_text: Some("Koramangala, Bangalore".to_string()),
            tags: tags(&["pharmacy", "urgent", "bangalore", "healthcare"]),
            is_urgent: true,
            created_at: now - Duration::minutes(30),
            view_count: 45,
            answer_count: 8,
            status: QuestionStatus::Answered,
        },
    ];

    (accounts, questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_question(author: i32) -> NewQuestion {
        NewQuestion {
            author_id: AccountId(author),
            title: "Best momos place?".to_string(),
            content: "Looking for good momos".to_string(),
            category_id: Some("1".to_string()),
            location_text: None,
            search_radius: 15_000,
            tags: vec!["food".to_string()],
            is_urgent: false,
        }
    }

    #[tokio::test]
    async fn fixtures_are_listed() {
        let store = MemoryStore::with_fixtures();
        let questions = store.list_questions().await.unwrap();
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[2].status, QuestionStatus::Answered);
        assert_eq!(questions[0].author.full_name.as_deref(), Some("Rahul Sharma"));
    }

    #[tokio::test]
    async fn added_question_gets_next_id_and_author_profile() {
        let store = MemoryStore::with_fixtures();
        let question = store.add_question(new_question(2)).await.unwrap();
        assert_eq!(question.id, QuestionId(4));
        assert_eq!(question.author.username.as_deref(), Some("music_lover"));
        assert_eq!(question.category, Some(Category::FoodAndDining));
        assert_eq!(store.get_question(QuestionId(4)).await.unwrap(), question);
        assert_eq!(store.insert_calls(), 1);
    }

    #[tokio::test]
    async fn failing_store_writes_nothing() {
        let store = MemoryStore::new();
        store.set_failing(true);
        let err = store.add_question(new_question(1)).await.unwrap_err();
        assert!(err.is_persistence_failure());
        assert_eq!(store.insert_calls(), 1);
        assert!(store.list_questions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_question_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get_question(QuestionId(9)).await,
            Err(Error::QuestionNotFound)
        ));
    }

    #[tokio::test]
    async fn duplicate_account_email_is_rejected() {
        let store = MemoryStore::new();
        let account = Account {
            id: None,
            email: "a@b.c".to_string(),
            password: "hash".to_string(),
            username: None,
            full_name: None,
            avatar_url: None,
        };
        let created = store.add_account(account.clone()).await.unwrap();
        assert_eq!(created.id, Some(AccountId(1)));
        assert!(matches!(
            store.add_account(account).await,
            Err(Error::AlreadyExists(_))
        ));
        assert_eq!(store.get_account_by_id(AccountId(1)).await.unwrap().email, "a@b.c");
    }

    #[tokio::test]
    async fn waitlist_keeps_one_entry_per_address() {
        let store = MemoryStore::new();
        store.add_waitlist_entry("me@example.com").await.unwrap();
        assert!(store.add_waitlist_entry("me@example.com").await.is_err());
        store.add_waitlist_entry("you@example.com").await.unwrap();
    }
}
