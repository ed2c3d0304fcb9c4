use std::cmp::Ordering;

use crate::types::feed_query::{FeedQuery, SortKey};
use crate::types::question::Question;

/// 질문 컬렉션에서 화면에 보여줄 피드를 만든다.
///
/// 카테고리 필터, 위치 필터를 차례로 적용한 뒤 정렬 기준에 따라 안정 정렬한다.
/// 입력은 바꾸지 않으며 같은 입력에는 항상 같은 결과를 돌려준다.
pub fn apply(questions: &[Question], query: &FeedQuery) -> Vec<Question> {
    let location = query.location.to_lowercase();
    let filter_location = !query.location.trim().is_empty();

    let mut feed: Vec<Question> = questions
        .iter()
        .filter(|q| query.category.matches(q.category))
        .filter(|q| {
            !filter_location
                || q.location_text
                    .as_ref()
                    .is_some_and(|label| label.to_lowercase().contains(&location))
        })
        .cloned()
        .collect();

    sort(&mut feed, query.sort);
    feed
}

/// `sort_by`는 안정 정렬이므로 동률은 입력 순서를 유지한다.
pub fn sort(questions: &mut [Question], key: SortKey) {
    questions.sort_by(|a, b| compare(a, b, key));
}

fn compare(a: &Question, b: &Question, key: SortKey) -> Ordering {
    match key {
        SortKey::Recent => b.created_at.cmp(&a.created_at),
        SortKey::Popular => b.view_count.cmp(&a.view_count),
        SortKey::Answered => b.answer_count.cmp(&a.answer_count),
        SortKey::Urgent => b
            .is_urgent
            .cmp(&a.is_urgent)
            .then_with(|| b.created_at.cmp(&a.created_at)),
    }
}

/// (컬렉션 리비전, 쿼리) 로 키를 잡은 피드 캐시.
#[derive(Debug, Default)]
pub struct Feed {
    key: Option<(u64, FeedQuery)>,
    items: Vec<Question>,
}

impl Feed {
    pub fn new() -> Self {
        Feed::default()
    }

    pub fn get(&mut self, revision: u64, questions: &[Question], query: &FeedQuery) -> &[Question] {
        let fresh = matches!(&self.key, Some((r, q)) if *r == revision && q == query);
        if !fresh {
            tracing::debug!(revision, ?query, "recomputing feed");
            self.items = apply(questions, query);
            self.key = Some((revision, query.clone()));
        }
        &self.items
    }

    pub fn invalidate(&mut self) {
        self.key = None;
    }
}
