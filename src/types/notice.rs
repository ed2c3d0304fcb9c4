use handle_errors::Error;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Default,
    Destructive,
}

/// 사용자에게 잠깐 보여줄 알림(toast)의 내용.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: Variant,
}

impl Notice {
    fn new(title: &str, description: &str, variant: Variant) -> Self {
        Notice {
            title: title.to_string(),
            description: description.to_string(),
            variant,
        }
    }

    pub fn question_posted() -> Self {
        Notice::new(
            "Question Posted! 🎉",
            "Your question has been shared with the community.",
            Variant::Default,
        )
    }

    pub fn sign_in_required() -> Self {
        Notice::new(
            "Sign In Required",
            "Please sign in to ask a question.",
            Variant::Destructive,
        )
    }

    pub fn joined_waitlist() -> Self {
        Notice::new(
            "Welcome to the waitlist!",
            "We'll notify you when Travanah launches. Thanks for your interest!",
            Variant::Default,
        )
    }

    pub fn already_on_waitlist() -> Self {
        Notice::new(
            "Already on the waitlist",
            "This e-mail address is already signed up.",
            Variant::Default,
        )
    }
}

impl From<&Error> for Notice {
    fn from(error: &Error) -> Self {
        match error {
            Error::AuthenticationRequired => Notice::new(
                "Authentication Required",
                "Please sign in to post a question.",
                Variant::Destructive,
            ),
            Error::MissingInformation => Notice::new(
                "Missing Information",
                "Please fill in the title and description.",
                Variant::Destructive,
            ),
            Error::SubmissionInProgress => Notice::new(
                "Posting...",
                "Your question is already being posted.",
                Variant::Default,
            ),
            // 저장소 에러의 세부 종류는 사용자에게 드러내지 않는다.
            _ => Notice::new(
                "Error",
                "Failed to post question. Please try again.",
                Variant::Destructive,
            ),
        }
    }
}
