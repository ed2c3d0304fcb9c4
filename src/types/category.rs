use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

use handle_errors::Error;

/// 고정된 질문 카테고리. 저장과 조회는 id ("1".."8") 로 한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    FoodAndDining,
    TravelAndTransportation,
    Shopping,
    Entertainment,
    Services,
    HealthAndWellness,
    Education,
    General,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::FoodAndDining,
        Category::TravelAndTransportation,
        Category::Shopping,
        Category::Entertainment,
        Category::Services,
        Category::HealthAndWellness,
        Category::Education,
        Category::General,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Category::FoodAndDining => "1",
            Category::TravelAndTransportation => "2",
            Category::Shopping => "3",
            Category::Entertainment => "4",
            Category::Services => "5",
            Category::HealthAndWellness => "6",
            Category::Education => "7",
            Category::General => "8",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::FoodAndDining => "Food & Dining",
            Category::TravelAndTransportation => "Travel & Transportation",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::Services => "Services",
            Category::HealthAndWellness => "Health & Wellness",
            Category::Education => "Education",
            Category::General => "General",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Category::FoodAndDining => "🍕",
            Category::TravelAndTransportation => "✈️",
            Category::Shopping => "🛍️",
            Category::Entertainment => "🎭",
            Category::Services => "🔧",
            Category::HealthAndWellness => "🏥",
            Category::Education => "📚",
            Category::General => "💬",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Category::FoodAndDining => "#F59E0B",
            Category::TravelAndTransportation => "#3B82F6",
            Category::Shopping => "#EC4899",
            Category::Entertainment => "#8B5CF6",
            Category::Services => "#10B981",
            Category::HealthAndWellness => "#EF4444",
            Category::Education => "#6366F1",
            Category::General => "#6B7280",
        }
    }

    pub fn from_id(id: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|category| category.id() == id)
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        Category::from_id(id.trim())
            .ok_or_else(|| Error::InvalidParameter(format!("unknown category '{}'", id)))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Category", 4)?;
        state.serialize_field("id", self.id())?;
        state.serialize_field("name", self.name())?;
        state.serialize_field("icon", self.icon())?;
        state.serialize_field("color", self.color())?;
        state.end()
    }
}

/// id 문자열(`"3"`)과 직렬화된 객체 모두 받는다.
impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Id(String),
            Full { id: String },
        }

        let id = match Repr::deserialize(deserializer)? {
            Repr::Id(id) | Repr::Full { id } => id,
        };
        Category::from_id(&id)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown category '{}'", id)))
    }
}
