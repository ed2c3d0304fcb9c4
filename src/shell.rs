use handle_errors::Error;

use crate::feed::Feed;
use crate::form::QuestionForm;
use crate::store::Repository;
use crate::types::account::CurrentUser;
use crate::types::feed_query::{CategoryFilter, FeedQuery, SortKey};
use crate::types::notice::Notice;
use crate::types::question::{Question, QuestionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Feed,
    Ask,
    Question(QuestionId),
}

/// 애플리케이션 셸. 질문 컬렉션과 피드 쿼리의 유일한 소유자다.
///
/// 하위 화면은 스냅샷만 받고, 상태 변경은 모두 이 타입의 메서드를 거친다.
#[derive(Debug)]
pub struct App {
    questions: Vec<Question>,
    revision: u64,
    query: FeedQuery,
    feed: Feed,
    view: View,
    form: Option<QuestionForm>,
}

impl Default for App {
    fn default() -> Self {
        App::new(Vec::new())
    }
}

impl App {
    pub fn new(questions: Vec<Question>) -> Self {
        App {
            questions,
            revision: 0,
            query: FeedQuery::default(),
            feed: Feed::new(),
            view: View::Feed,
            form: None,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn query(&self) -> &FeedQuery {
        &self.query
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn form_mut(&mut self) -> Option<&mut QuestionForm> {
        self.form.as_mut()
    }

    fn replace_questions(&mut self, questions: Vec<Question>) {
        self.questions = questions;
        self.revision += 1;
        self.feed.invalidate();
    }

    /// 스냅샷을 통째로 바꾼다. 서버 쪽 변경을 병합하지 않는다.
    pub async fn refresh(&mut self, repository: &dyn Repository) -> Result<(), Error> {
        let questions = repository.list_questions().await?;
        tracing::debug!(count = questions.len(), "refreshed question snapshot");
        self.replace_questions(questions);
        Ok(())
    }

    pub fn set_category_filter(&mut self, category: CategoryFilter) {
        self.query.category = category;
    }

    pub fn set_location_filter(&mut self, location: &str) {
        self.query.location = location.to_string();
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.query.sort = sort;
    }

    pub fn feed(&mut self) -> &[Question] {
        self.feed.get(self.revision, &self.questions, &self.query)
    }

    /// 비어 있으면 "필터를 바꾸거나 첫 질문을 올려보세요" 화면을 보여준다.
    pub fn feed_is_empty(&mut self) -> bool {
        self.feed().is_empty()
    }

    /// 환영 배너에 쓸 이름.
    pub fn greeting(user: &CurrentUser) -> &str {
        user.greeting_name()
    }

    pub fn new_question(&mut self, user: Option<&CurrentUser>) -> Result<(), Notice> {
        if user.is_none() {
            return Err(Notice::sign_in_required());
        }
        self.form = Some(QuestionForm::new());
        self.view = View::Ask;
        Ok(())
    }

    /// 열린 폼을 제출한다. 성공하면 새 질문을 컬렉션 앞에 넣고 피드로 돌아간다.
    ///
    /// 열린 폼이 없으면 아무 일도 하지 않고 `None`.
    pub async fn submit_question(
        &mut self,
        user: Option<&CurrentUser>,
        repository: &dyn Repository,
    ) -> Option<Notice> {
        let form = self.form.as_mut()?;

        let result = form.submit(user, repository).await;
        let notice = QuestionForm::notice_for(&result);
        if let Ok(question) = result {
            let mut questions = Vec::with_capacity(self.questions.len() + 1);
            questions.push(question);
            questions.append(&mut self.questions);
            self.replace_questions(questions);
            self.form = None;
            self.view = View::Feed;
        }
        Some(notice)
    }

    pub fn open_question(&mut self, id: QuestionId) -> Result<&Question, Error> {
        let question = self
            .questions
            .iter()
            .find(|q| q.id == id)
            .ok_or(Error::QuestionNotFound)?;
        self.view = View::Question(id);
        Ok(question)
    }

    pub fn selected_question(&self) -> Option<&Question> {
        match self.view {
            View::Question(id) => self.questions.iter().find(|q| q.id == id),
            _ => None,
        }
    }

    pub fn back_to_feed(&mut self) {
        self.view = View::Feed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::account::AccountId;
    use crate::types::category::Category;

    fn user() -> CurrentUser {
        CurrentUser {
            id: AccountId(2),
            full_name: Some("Priya Patel".to_string()),
            avatar_url: None,
        }
    }

    async fn app(store: &MemoryStore) -> App {
        let mut app = App::default();
        app.refresh(store).await.unwrap();
        app
    }

    #[tokio::test]
    async fn signed_out_user_cannot_open_the_form() {
        let store = MemoryStore::with_fixtures();
        let mut app = app(&store).await;

        let notice = app.new_question(None).unwrap_err();

        assert_eq!(notice, Notice::sign_in_required());
        assert_eq!(app.view(), View::Feed);
        assert!(app.form_mut().is_none());
    }

    #[tokio::test]
    async fn posting_returns_to_feed_with_the_new_question() {
        let store = MemoryStore::with_fixtures();
        let mut app = app(&store).await;
        let user = user();

        app.new_question(Some(&user)).unwrap();
        assert_eq!(app.view(), View::Ask);
        if let Some(form) = app.form_mut() {
            form.draft.set_title("Best momos place?");
            form.draft.set_content("Looking for good momos");
        }

        let notice = app.submit_question(Some(&user), &store).await;

        assert_eq!(notice, Some(Notice::question_posted()));
        assert_eq!(app.view(), View::Feed);
        assert_eq!(app.questions().len(), 4);
        assert_eq!(app.feed()[0].title, "Best momos place?");
    }

    #[tokio::test]
    async fn failed_post_stays_on_the_form() {
        let store = MemoryStore::with_fixtures();
        let mut app = app(&store).await;
        let user = user();
        app.new_question(Some(&user)).unwrap();
        if let Some(form) = app.form_mut() {
            form.draft.set_title("Guitar?");
            form.draft.set_content("Any shops?");
        }
        store.set_failing(true);

        let notice = app.submit_question(Some(&user), &store).await;

        assert_eq!(notice.map(|n| n.title), Some("Error".to_string()));
        assert_eq!(app.view(), View::Ask);
        assert_eq!(app.form_mut().map(|f| f.draft.title().to_string()), Some("Guitar?".to_string()));
        assert_eq!(app.questions().len(), 3);
    }

    #[tokio::test]
    async fn submitting_without_an_open_form_does_nothing() {
        let store = MemoryStore::with_fixtures();
        let mut app = app(&store).await;
        let user = user();

        let notice = app.submit_question(Some(&user), &store).await;

        assert_eq!(notice, None);
        assert_eq!(app.view(), View::Feed);
        assert_eq!(store.insert_calls(), 0);
        assert_eq!(app.questions().len(), 3);
    }

    #[tokio::test]
    async fn filters_drive_the_feed() {
        let store = MemoryStore::with_fixtures();
        let mut app = app(&store).await;
        assert_eq!(app.feed().len(), 3);

        app.set_category_filter(CategoryFilter::Only(Category::Shopping));
        assert_eq!(app.feed().len(), 1);

        app.set_category_filter(CategoryFilter::All);
        app.set_location_filter("BANGALORE");
        assert_eq!(app.feed()[0].id, QuestionId(3));

        app.set_location_filter("Chennai");
        assert!(app.feed_is_empty());

        app.set_location_filter("");
        app.set_sort(SortKey::Urgent);
        assert!(app.feed()[0].is_urgent);
    }

    #[tokio::test]
    async fn opening_and_leaving_a_question() {
        let store = MemoryStore::with_fixtures();
        let mut app = app(&store).await;

        assert_eq!(app.open_question(QuestionId(2)).unwrap().id, QuestionId(2));
        assert_eq!(app.view(), View::Question(QuestionId(2)));
        assert!(app.selected_question().is_some());

        app.back_to_feed();
        assert_eq!(app.view(), View::Feed);
        assert!(app.selected_question().is_none());

        assert!(matches!(
            app.open_question(QuestionId(42)),
            Err(Error::QuestionNotFound)
        ));
        assert_eq!(app.view(), View::Feed);
    }

    #[test]
    fn greets_by_first_name() {
        assert_eq!(App::greeting(&user()), "Priya");
    }
}
