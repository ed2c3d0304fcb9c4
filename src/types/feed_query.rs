use handle_errors::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::types::category::Category;

/// 카테고리 필터: "all" 이거나 고정된 8개 카테고리 중 하나.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: Option<Category>) -> bool {
        match self {
            CategoryFilter::All => true,
            // 카테고리가 없는 질문은 특정 카테고리 필터에서 제외된다.
            CategoryFilter::Only(wanted) => category == Some(*wanted),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" => Ok(CategoryFilter::All),
            id => id.parse::<Category>().map(CategoryFilter::Only),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Recent,
    Popular,
    Answered,
    Urgent,
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "recent" => Ok(SortKey::Recent),
            "popular" => Ok(SortKey::Popular),
            "answered" => Ok(SortKey::Answered),
            "urgent" => Ok(SortKey::Urgent),
            other => Err(Error::InvalidParameter(format!("unknown sort key '{}'", other))),
        }
    }
}

/// 피드에 적용할 필터와 정렬 기준. 저장되지 않고 매번 다시 계산된다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FeedQuery {
    pub category: CategoryFilter,
    pub location: String,
    pub sort: SortKey,
}

impl FeedQuery {
    pub fn with_category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }
}

/// /questions?category=1&location=delhi&sort=urgent
pub fn extract_feed_query(params: &HashMap<String, String>) -> Result<FeedQuery, Error> {
    let category = match params.get("category") {
        Some(category) => category.parse::<CategoryFilter>()?,
        None => CategoryFilter::All,
    };
    let sort = match params.get("sort") {
        Some(sort) => sort.parse::<SortKey>()?,
        None => SortKey::Recent,
    };

    Ok(FeedQuery {
        category,
        location: params.get("location").cloned().unwrap_or_default(),
        sort,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_parameters_give_default_query() {
        let query = extract_feed_query(&HashMap::new()).unwrap();
        assert_eq!(query, FeedQuery::default());
        assert_eq!(query.sort, SortKey::Recent);
        assert_eq!(query.category, CategoryFilter::All);
    }

    #[test]
    fn parses_all_fields() {
        let mut params = HashMap::new();
        params.insert("category".to_string(), "6".to_string());
        params.insert("location".to_string(), "Koramangala".to_string());
        params.insert("sort".to_string(), "urgent".to_string());

        let query = extract_feed_query(&params).unwrap();
        assert_eq!(
            query.category,
            CategoryFilter::Only(Category::HealthAndWellness)
        );
        assert_eq!(query.location, "Koramangala");
        assert_eq!(query.sort, SortKey::Urgent);
    }

    #[test]
    fn unknown_sort_key_is_rejected() {
        let mut params = HashMap::new();
        params.insert("sort".to_string(), "oldest".to_string());
        assert!(matches!(
            extract_feed_query(&params),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!("12".parse::<CategoryFilter>().is_err());
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
    }

    #[test]
    fn only_filter_excludes_uncategorized() {
        let filter = CategoryFilter::Only(Category::Shopping);
        assert!(filter.matches(Some(Category::Shopping)));
        assert!(!filter.matches(Some(Category::General)));
        assert!(!filter.matches(None));
        assert!(CategoryFilter::All.matches(None));
    }
}
