use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use handle_errors::Error;

use crate::types::account::AccountId;
use crate::types::category::Category;

#[derive(Serialize, Debug, Deserialize, Clone, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub title: String,
    pub content: String,
    pub author: Author,
    pub category: Option<Category>,
    pub location_text: Option<String>,
    pub tags: Vec<String>,
    pub is_urgent: bool,
    pub created_at: DateTime<Utc>,
    pub view_count: u32,
    pub answer_count: u32,
    #[serde(default)]
    pub status: QuestionStatus,
}

#[derive(Serialize, Debug, Clone, Copy, Eq, Hash, Deserialize, PartialEq)]
pub struct QuestionId(pub i32);

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Debug, Deserialize, Clone, PartialEq)]
pub struct Author {
    pub id: AccountId,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub reputation_score: Option<u32>,
}

#[derive(Serialize, Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    #[default]
    Open,
    Answered,
    Closed,
}

impl QuestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionStatus::Open => "open",
            QuestionStatus::Answered => "answered",
            QuestionStatus::Closed => "closed",
        }
    }
}

impl FromStr for QuestionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(QuestionStatus::Open),
            "answered" => Ok(QuestionStatus::Answered),
            "closed" => Ok(QuestionStatus::Closed),
            other => Err(Error::InvalidParameter(format!("unknown status '{}'", other))),
        }
    }
}

/// 제출 시 저장소에 넘기는 레코드.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct NewQuestion {
    #[serde(rename = "account_id")]
    pub author_id: AccountId,
    pub title: String,
    pub content: String,
    pub category_id: Option<String>,
    pub location_text: Option<String>,
    /// 미터 단위.
    pub search_radius: u32,
    pub tags: Vec<String>,
    pub is_urgent: bool,
}
