use tracing::{Level, event, instrument};

use handle_errors::Error;

use crate::draft::QuestionDraft;
use crate::store::Repository;
use crate::types::account::{AccountId, CurrentUser};
use crate::types::notice::Notice;
use crate::types::question::Question;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Editing,
    Submitting,
}

/// 질문 작성 폼.
///
/// `Editing` 에서 시작해 저장소 호출 동안만 `Submitting` 에 머문다.
/// 성공하면 초안을 비우고, 실패하면 입력한 그대로 남겨 다시 제출할 수 있게 한다.
#[derive(Debug)]
pub struct QuestionForm {
    pub draft: QuestionDraft,
    state: FormState,
}

impl Default for QuestionForm {
    fn default() -> Self {
        QuestionForm::new()
    }
}

impl QuestionForm {
    pub fn new() -> Self {
        QuestionForm::with_draft(QuestionDraft::new())
    }

    pub fn with_draft(draft: QuestionDraft) -> Self {
        QuestionForm {
            draft,
            state: FormState::Editing,
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    /// 제출 버튼을 누를 수 있는지.
    pub fn can_submit(&self) -> bool {
        self.state == FormState::Editing && self.draft.is_complete()
    }

    /// 통과하면 작성자 계정을 돌려준다.
    fn check_guards(&self, user: Option<&CurrentUser>) -> Result<AccountId, Error> {
        if self.state == FormState::Submitting {
            return Err(Error::SubmissionInProgress);
        }
        let Some(user) = user else {
            return Err(Error::AuthenticationRequired);
        };
        if !self.draft.is_complete() {
            return Err(Error::MissingInformation);
        }
        Ok(user.id)
    }

    /// 초안을 저장소에 한 번 넘긴다. 가드에 걸리면 저장소를 호출하지 않는다.
    #[instrument(skip(self, repository), fields(backend = repository.backend_tag()))]
    pub async fn submit(
        &mut self,
        user: Option<&CurrentUser>,
        repository: &dyn Repository,
    ) -> Result<Question, Error> {
        let author = self.check_guards(user)?;

        self.state = FormState::Submitting;
        let record = self.draft.to_new_question(author);
        let result = repository.add_question(record).await;
        self.state = FormState::Editing;

        match result {
            Ok(question) => {
                event!(Level::INFO, question_id = %question.id, "question posted");
                self.draft.clear();
                Ok(question)
            }
            Err(e) if e.is_persistence_failure() => {
                event!(Level::ERROR, "Error posting question: {}", e);
                Err(e)
            }
            Err(e) => {
                event!(Level::WARN, "question rejected: {}", e);
                Err(e)
            }
        }
    }

    /// `submit` 결과를 사용자 알림으로 바꾼다.
    pub fn notice_for(result: &Result<Question, Error>) -> Notice {
        match result {
            Ok(_) => Notice::question_posted(),
            Err(e) => Notice::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn signed_in() -> CurrentUser {
        CurrentUser {
            id: AccountId(1),
            full_name: Some("Rahul Sharma".to_string()),
            avatar_url: None,
        }
    }

    fn momos_form() -> QuestionForm {
        let mut form = QuestionForm::new();
        form.draft.set_title("Best momos place?");
        form.draft.set_content("Looking for good momos");
        form.draft.add_tag("food");
        form.draft.add_tag("delhi");
        form.draft.set_search_radius(15);
        form
    }

    #[tokio::test]
    async fn signed_out_submit_makes_no_call_and_keeps_draft() {
        let store = MemoryStore::with_fixtures();
        let mut form = momos_form();
        let before = form.draft.clone();

        let result = form.submit(None, &store).await;

        assert!(matches!(result, Err(Error::AuthenticationRequired)));
        assert_eq!(QuestionForm::notice_for(&result).title, "Authentication Required");
        assert_eq!(store.insert_calls(), 0);
        assert_eq!(form.draft, before);
        assert_eq!(form.state(), FormState::Editing);
    }

    #[tokio::test]
    async fn empty_title_makes_no_call() {
        let store = MemoryStore::with_fixtures();
        let mut form = momos_form();
        form.draft.set_title("");
        let user = signed_in();

        let result = form.submit(Some(&user), &store).await;

        assert!(matches!(result, Err(Error::MissingInformation)));
        assert_eq!(QuestionForm::notice_for(&result).title, "Missing Information");
        assert_eq!(store.insert_calls(), 0);
        assert_eq!(form.draft.content(), "Looking for good momos");
    }

    #[tokio::test]
    async fn successful_submit_resets_the_draft() {
        let store = MemoryStore::with_fixtures();
        let mut form = momos_form();
        form.draft.set_location("Connaught Place");
        form.draft.set_urgent(true);
        let user = signed_in();

        let result = form.submit(Some(&user), &store).await;
        let question = result.as_ref().unwrap();

        assert_eq!(question.title, "Best momos place?");
        assert_eq!(question.tags, vec!["food".to_string(), "delhi".to_string()]);
        assert_eq!(QuestionForm::notice_for(&result), Notice::question_posted());
        assert_eq!(store.insert_calls(), 1);

        assert_eq!(form.draft.title(), "");
        assert_eq!(form.draft.content(), "");
        assert_eq!(form.draft.category(), None);
        assert_eq!(form.draft.location(), "");
        assert!(form.draft.tags().is_empty());
        assert_eq!(form.draft.search_radius().km(), 10);
        assert!(!form.draft.is_urgent());
        assert_eq!(form.state(), FormState::Editing);
    }

    #[tokio::test]
    async fn failed_submit_keeps_everything_as_entered() {
        let store = MemoryStore::with_fixtures();
        store.set_failing(true);
        let mut form = momos_form();
        let before = form.draft.clone();
        let user = signed_in();

        let result = form.submit(Some(&user), &store).await;

        assert!(result.is_err());
        assert_eq!(QuestionForm::notice_for(&result).title, "Error");
        assert_eq!(store.insert_calls(), 1);
        assert_eq!(form.draft, before);
        assert_eq!(form.state(), FormState::Editing);

        // 저장소가 돌아오면 다시 입력하지 않고 제출할 수 있다.
        store.set_failing(false);
        assert!(form.submit(Some(&user), &store).await.is_ok());
        assert_eq!(store.insert_calls(), 2);
    }

    #[test]
    fn submit_is_enabled_only_for_complete_drafts() {
        let mut form = QuestionForm::new();
        assert!(!form.can_submit());
        form.draft.set_title("Title");
        assert!(!form.can_submit());
        form.draft.set_content("Body");
        assert!(form.can_submit());
    }

    #[test]
    fn submitting_form_refuses_a_second_submit() {
        let mut form = momos_form();
        form.state = FormState::Submitting;
        assert!(!form.can_submit());
        assert!(matches!(
            form.check_guards(Some(&signed_in())),
            Err(Error::SubmissionInProgress)
        ));
    }
}
