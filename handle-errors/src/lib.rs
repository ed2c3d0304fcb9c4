use argon2::Error as ArgonError;
use warp::{
    Rejection, Reply,
    filters::{body::BodyDeserializeError, cors::CorsForbidden},
    http::StatusCode,
    reject::Reject,
};

use reqwest::Error as ReqwestError;
use reqwest_middleware::Error as MiddlewareReqwestError;

use tracing::{Level, event, instrument};

#[derive(Debug)]
pub enum Error {
    ParseError(std::num::ParseIntError),
    InvalidParameter(String),
    MissingParameters,
    WrongPassword,
    AccountNotFound,
    CannotDecryptToken,
    CannotIssueToken,
    AuthenticationRequired,
    MissingInformation,
    SubmissionInProgress,
    QuestionNotFound,
    InvalidEmail,
    AlreadyExists(String),
    ConfigError(config::ConfigError),
    ArgonLibraryError(ArgonError),
    DatabaseQueryError(sqlx::Error),
    MigrationError(sqlx::migrate::MigrateError),
    ReqwestAPIError(ReqwestError),
    MiddlewareReqwestAPIError(MiddlewareReqwestError),
    ClientError(BackendError),
    ServerError(BackendError),
}

/// 호스팅 백엔드가 2xx 가 아닌 응답을 줬을 때.
#[derive(Debug, Clone)]
pub struct BackendError {
    pub status: u16,
    pub message: String,
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Status: {}, Message: {}", self.status, self.message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::ParseError(err) => {
                write!(f, "Cannot parse parameter: {}", err)
            }
            Error::InvalidParameter(param) => {
                write!(f, "Invalid parameter: {}", param)
            }
            Error::MissingParameters => {
                write!(f, "Missing parameters")
            }
            Error::WrongPassword => {
                write!(f, "Wrong password")
            }
            Error::AccountNotFound => {
                write!(f, "Account not found")
            }
            Error::CannotDecryptToken => {
                write!(f, "Cannot decrypt token")
            }
            Error::CannotIssueToken => {
                write!(f, "Cannot issue token")
            }
            Error::AuthenticationRequired => {
                write!(f, "Please sign in to post a question.")
            }
            Error::MissingInformation => {
                write!(f, "Please fill in the title and description.")
            }
            Error::SubmissionInProgress => {
                write!(f, "A submission is already in progress")
            }
            Error::QuestionNotFound => {
                write!(f, "Question not found")
            }
            Error::InvalidEmail => {
                write!(f, "Please enter a valid e-mail address")
            }
            Error::AlreadyExists(what) => {
                write!(f, "{} already exists", what)
            }
            Error::ConfigError(err) => {
                write!(f, "Cannot load configuration: {}", err)
            }
            Error::ArgonLibraryError(_) => {
                write!(f, "Cannot verify password")
            }
            Error::DatabaseQueryError(_) => {
                write!(f, "Cannot update, invalid data.")
            }
            Error::MigrationError(err) => {
                write!(f, "Cannot run migration: {}", err)
            }
            Error::ReqwestAPIError(err) => {
                write!(f, "External API error: {}", err)
            }
            Error::MiddlewareReqwestAPIError(err) => {
                write!(f, "External API error: {}", err)
            }
            Error::ClientError(err) => {
                write!(f, "External Client error: {}", err)
            }
            Error::ServerError(err) => {
                write!(f, "External Server error: {}", err)
            }
        }
    }
}

impl std::error::Error for Error {}

impl Reject for Error {}
impl Reject for BackendError {}

impl Error {
    /// 저장소 자체의 실패인지. 가드에 걸린 거절은 여기에 들지 않는다.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            Error::DatabaseQueryError(_)
                | Error::ReqwestAPIError(_)
                | Error::MiddlewareReqwestAPIError(_)
                | Error::ClientError(_)
                | Error::ServerError(_)
        )
    }
}

const DUPLICATE_KEY: u32 = 23505;

fn reply(message: impl Into<String>, status: StatusCode) -> warp::reply::WithStatus<String> {
    warp::reply::with_status(message.into(), status)
}

#[instrument]
pub async fn return_error(r: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(crate::Error::DatabaseQueryError(e)) = r.find() {
        event!(Level::ERROR, "Database query error");
        match e {
            sqlx::Error::Database(err)
                if err.code().and_then(|code| code.parse::<u32>().ok()) == Some(DUPLICATE_KEY) =>
            {
                Ok(reply("Entry already exists", StatusCode::CONFLICT))
            }
            _ => Ok(reply("Cannot update data", StatusCode::UNPROCESSABLE_ENTITY)),
        }
    } else if let Some(crate::Error::ReqwestAPIError(e)) = r.find() {
        event!(Level::ERROR, "{}", e);
        Ok(reply(
            "Internal Server Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    } else if let Some(crate::Error::MiddlewareReqwestAPIError(e)) = r.find() {
        event!(Level::ERROR, "{}", e);
        Ok(reply(
            "Internal Server Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    } else if let Some(crate::Error::ClientError(e)) = r.find() {
        event!(Level::ERROR, "{}", e);
        Ok(reply(
            "Internal Server Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    } else if let Some(crate::Error::ServerError(e)) = r.find() {
        event!(Level::ERROR, "{}", e);
        Ok(reply(
            "Internal Server Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    } else if let Some(crate::Error::ArgonLibraryError(e)) = r.find() {
        event!(Level::ERROR, "{}", e);
        Ok(reply(
            "Internal Server Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    } else if let Some(crate::Error::CannotIssueToken) = r.find() {
        event!(Level::ERROR, "Failed to construct paseto token");
        Ok(reply(
            "Internal Server Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    } else if let Some(crate::Error::AuthenticationRequired) = r.find() {
        event!(Level::INFO, "Submission attempted while signed out");
        Ok(reply(
            crate::Error::AuthenticationRequired.to_string(),
            StatusCode::UNAUTHORIZED,
        ))
    } else if let Some(crate::Error::CannotDecryptToken) = r.find() {
        event!(Level::WARN, "Rejected invalid or revoked token");
        Ok(reply("Invalid token", StatusCode::UNAUTHORIZED))
    } else if let Some(crate::Error::WrongPassword | crate::Error::AccountNotFound) = r.find() {
        event!(Level::ERROR, "Entered wrong password");
        Ok(reply(
            "Wrong E-Mail/Password combination",
            StatusCode::UNAUTHORIZED,
        ))
    } else if let Some(crate::Error::QuestionNotFound) = r.find() {
        event!(Level::WARN, "Question not found");
        Ok(reply("Question not found", StatusCode::NOT_FOUND))
    } else if let Some(error @ crate::Error::AlreadyExists(_)) = r.find() {
        event!(Level::WARN, "{}", error);
        Ok(reply(error.to_string(), StatusCode::CONFLICT))
    } else if let Some(crate::Error::SubmissionInProgress) = r.find() {
        Ok(reply(
            crate::Error::SubmissionInProgress.to_string(),
            StatusCode::CONFLICT,
        ))
    } else if let Some(
        error @ (crate::Error::ParseError(_)
        | crate::Error::InvalidParameter(_)
        | crate::Error::MissingParameters),
    ) = r.find()
    {
        event!(Level::WARN, "{}", error);
        Ok(reply(error.to_string(), StatusCode::BAD_REQUEST))
    } else if let Some(error) = r.find::<CorsForbidden>() {
        event!(Level::ERROR, "CORS forbidden error: {}", error);
        Ok(reply(error.to_string(), StatusCode::FORBIDDEN))
    } else if let Some(error) = r.find::<BodyDeserializeError>() {
        event!(Level::ERROR, "Cannot deserialize request body: {}", error);
        Ok(reply(error.to_string(), StatusCode::UNPROCESSABLE_ENTITY))
    } else if let Some(error) = r.find::<warp::reject::MissingHeader>() {
        event!(Level::WARN, "{}", error);
        Ok(reply("Authorization required", StatusCode::UNAUTHORIZED))
    } else if let Some(error) = r.find::<Error>() {
        event!(Level::ERROR, "{}", error);
        Ok(reply(error.to_string(), StatusCode::UNPROCESSABLE_ENTITY))
    } else {
        event!(Level::WARN, "Requested route was not found");
        Ok(reply("Route not found", StatusCode::NOT_FOUND))
    }
}
