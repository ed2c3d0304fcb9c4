use serde::{Deserialize, Serialize};

pub const MAX_TAGS: usize = 5;
pub const MAX_TAG_LEN: usize = 20;

/// 최대 다섯 개, 비어 있지 않고 서로 다른 태그. 입력 순서를 유지한다.
///
/// 추가할 수 없는 태그는 에러 없이 무시된다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagList(Vec<String>);

impl TagList {
    pub fn new() -> Self {
        TagList(Vec::new())
    }

    /// 실제로 추가됐는지.
    pub fn add(&mut self, candidate: &str) -> bool {
        let tag = normalize(candidate);
        if tag.is_empty() || self.0.contains(&tag) || self.is_full() {
            return false;
        }
        self.0.push(tag);
        true
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        match self.0.iter().position(|t| t == tag) {
            Some(index) => {
                self.0.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn is_full(&self) -> bool {
        self.0.len() >= MAX_TAGS
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

fn normalize(candidate: &str) -> String {
    let truncated: String = candidate.trim().chars().take(MAX_TAG_LEN).collect();
    truncated.trim_end().to_string()
}

impl<S: AsRef<str>> FromIterator<S> for TagList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags = TagList::new();
        for tag in iter {
            tags.add(tag.as_ref());
        }
        tags
    }
}

// 요청 본문의 태그도 같은 규칙을 거친다.
impl<'de> Deserialize<'de> for TagList {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        Ok(raw.iter().collect())
    }
}
