use serde::{Deserialize, Serialize};

use crate::types::account::AccountId;
use crate::types::category::Category;
use crate::types::question::NewQuestion;
use crate::types::tags::TagList;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_CONTENT_LEN: usize = 1000;

/// 검색 반경(km). 1..=50 범위를 벗어난 값은 표현할 수 없다.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct SearchRadius(u8);

impl SearchRadius {
    pub const MIN_KM: u8 = 1;
    pub const MAX_KM: u8 = 50;
    pub const DEFAULT_KM: u8 = 10;

    /// 슬라이더처럼 범위 끝으로 잘라낸다.
    pub fn clamped(km: i64) -> Self {
        SearchRadius(km.clamp(Self::MIN_KM as i64, Self::MAX_KM as i64) as u8)
    }

    pub fn km(&self) -> u8 {
        self.0
    }

    pub fn meters(&self) -> u32 {
        u32::from(self.0) * 1000
    }
}

impl Default for SearchRadius {
    fn default() -> Self {
        SearchRadius(Self::DEFAULT_KM)
    }
}

impl<'de> Deserialize<'de> for SearchRadius {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(SearchRadius::clamped(i64::deserialize(deserializer)?))
    }
}

/// 입력 중인 글자 수와 최대 글자 수.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharCounter {
    pub len: usize,
    pub max: usize,
}

/// 작성 중인 질문. 폼이 열려 있는 동안에만 존재한다.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct QuestionDraft {
    title: String,
    content: String,
    category: Option<Category>,
    location: String,
    search_radius: SearchRadius,
    tags: TagList,
    is_urgent: bool,
}

fn truncate(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

impl QuestionDraft {
    pub fn new() -> Self {
        QuestionDraft::default()
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = truncate(title, MAX_TITLE_LEN);
    }

    pub fn set_content(&mut self, content: &str) {
        self.content = truncate(content, MAX_CONTENT_LEN);
    }

    pub fn set_category(&mut self, category: Option<Category>) {
        self.category = category;
    }

    pub fn set_location(&mut self, location: &str) {
        self.location = location.to_string();
    }

    pub fn set_search_radius(&mut self, km: i64) {
        self.search_radius = SearchRadius::clamped(km);
    }

    pub fn set_urgent(&mut self, is_urgent: bool) {
        self.is_urgent = is_urgent;
    }

    pub fn add_tag(&mut self, candidate: &str) -> bool {
        self.tags.add(candidate)
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn search_radius(&self) -> SearchRadius {
        self.search_radius
    }

    pub fn tags(&self) -> &TagList {
        &self.tags
    }

    pub fn is_urgent(&self) -> bool {
        self.is_urgent
    }

    pub fn title_counter(&self) -> CharCounter {
        CharCounter {
            len: self.title.chars().count(),
            max: MAX_TITLE_LEN,
        }
    }

    pub fn content_counter(&self) -> CharCounter {
        CharCounter {
            len: self.content.chars().count(),
            max: MAX_CONTENT_LEN,
        }
    }

    /// 제목과 본문이 공백만으로 이루어지지 않았는지.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.content.trim().is_empty()
    }

    pub fn clear(&mut self) {
        *self = QuestionDraft::default();
    }

    /// 저장소에 넘길 레코드. 반경은 여기에서만 미터로 바뀐다.
    pub fn to_new_question(&self, author_id: AccountId) -> NewQuestion {
        let location = self.location.trim();
        NewQuestion {
            author_id,
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            category_id: self.category.map(|c| c.id().to_string()),
            location_text: (!location.is_empty()).then(|| location.to_string()),
            search_radius: self.search_radius.meters(),
            tags: self.tags.as_slice().to_vec(),
            is_urgent: self.is_urgent,
        }
    }
}

/// POST /questions 요청 본문. 폼과 같은 규칙으로 초안에 채워 넣는다.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct DraftRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub category_id: Option<String>,
    pub location_text: Option<String>,
    pub search_radius_km: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_urgent: bool,
}

impl TryFrom<DraftRequest> for QuestionDraft {
    type Error = handle_errors::Error;

    fn try_from(request: DraftRequest) -> Result<Self, Self::Error> {
        let mut draft = QuestionDraft::new();
        draft.set_title(&request.title);
        draft.set_content(&request.content);
        // 빈 문자열은 "선택 안 함" 으로 취급한다.
        let category = match request.category_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(id) => Some(id.parse::<Category>()?),
        };
        draft.set_category(category);
        draft.set_location(request.location_text.as_deref().unwrap_or_default());
        if let Some(km) = request.search_radius_km {
            draft.set_search_radius(km);
        }
        for tag in &request.tags {
            draft.add_tag(tag);
        }
        draft.set_urgent(request.is_urgent);
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_draft_has_defaults() {
        let draft = QuestionDraft::new();
        assert_eq!(draft.title(), "");
        assert_eq!(draft.search_radius().km(), 10);
        assert!(draft.tags().is_empty());
        assert!(!draft.is_urgent());
        assert!(!draft.is_complete());
    }

    #[test]
    fn radius_is_clamped_to_slider_range() {
        let mut draft = QuestionDraft::new();
        draft.set_search_radius(0);
        assert_eq!(draft.search_radius().km(), 1);
        draft.set_search_radius(120);
        assert_eq!(draft.search_radius().km(), 50);
        draft.set_search_radius(15);
        assert_eq!(draft.search_radius().meters(), 15_000);
    }

    #[test]
    fn title_and_content_are_cut_at_their_limits() {
        let mut draft = QuestionDraft::new();
        draft.set_title(&"t".repeat(250));
        draft.set_content(&"ä".repeat(1200));
        assert_eq!(draft.title_counter(), CharCounter { len: 200, max: 200 });
        assert_eq!(draft.content_counter().len, 1000);
    }

    #[test]
    fn whitespace_only_title_is_incomplete() {
        let mut draft = QuestionDraft::new();
        draft.set_title("   ");
        draft.set_content("Looking for good momos");
        assert!(!draft.is_complete());
    }

    #[test]
    fn record_is_trimmed_and_in_meters() {
        let mut draft = QuestionDraft::new();
        draft.set_title("  Best momos place?  ");
        draft.set_content(" Looking for good momos ");
        draft.set_location("   ");
        draft.set_category(Some(Category::FoodAndDining));
        draft.set_search_radius(15);
        draft.add_tag("food");

        let record = draft.to_new_question(AccountId(4));
        assert_eq!(record.title, "Best momos place?");
        assert_eq!(record.content, "Looking for good momos");
        assert_eq!(record.location_text, None);
        assert_eq!(record.category_id.as_deref(), Some("1"));
        assert_eq!(record.search_radius, 15_000);
        assert_eq!(record.tags, vec!["food".to_string()]);
    }

    #[test]
    fn request_goes_through_editing_rules() {
        let request = DraftRequest {
            title: "Guitar shops?".to_string(),
            content: "Budget 15k".to_string(),
            category_id: Some("".to_string()),
            location_text: Some("Bandra".to_string()),
            search_radius_km: Some(99),
            tags: vec!["music".into(), "music".into(), " ".into()],
            is_urgent: false,
        };
        let draft = QuestionDraft::try_from(request).unwrap();
        assert_eq!(draft.category(), None);
        assert_eq!(draft.search_radius().km(), 50);
        assert_eq!(draft.tags().as_slice(), ["music"]);
    }

    #[test]
    fn request_with_unknown_category_is_rejected() {
        let request = DraftRequest {
            category_id: Some("11".to_string()),
            ..DraftRequest::default()
        };
        assert!(QuestionDraft::try_from(request).is_err());
    }
}
