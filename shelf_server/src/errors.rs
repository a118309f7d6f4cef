use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use shelf_engine::{
    access::PolicyError,
    db_types::{InvalidCategoryError, InvalidIdError, InvalidStatusError},
    traits::{AuthApiError, GameApiError, TagApiError, UserApiError},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("The id is not valid")]
    InvalidId,
    #[error("Missing {} in request body", .0.join(" and "))]
    MissingFields(Vec<String>),
    #[error("{0}")]
    BadRequest(String),
    #[error("{message}")]
    ValidationError { message: String, location: String },
    #[error("The data was not found")]
    NotFound,
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Could not serialize access token. {0}")]
    CouldNotSerializeAccessToken(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidId => StatusCode::BAD_REQUEST,
            Self::MissingFields(_) => StatusCode::BAD_REQUEST,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CouldNotSerializeAccessToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            // Well-formed id, nothing there. The body carries nothing either.
            Self::NotFound => HttpResponse::NotFound().finish(),
            Self::ValidationError { message, location } => HttpResponse::UnprocessableEntity()
                .insert_header(ContentType::json())
                .json(serde_json::json!({
                    "reason": "ValidationError",
                    "message": message,
                    "location": location,
                })),
            // Failed or missing credentials are all reported identically, and the precise
            // token failure only ever reaches the log.
            Self::Unauthorized | Self::AuthenticationError(_) => HttpResponse::Unauthorized()
                .insert_header(ContentType::json())
                .json(serde_json::json!({ "message": "Unauthorized" })),
            Self::InvalidId | Self::MissingFields(_) | Self::BadRequest(_) => {
                HttpResponse::build(self.status_code())
                    .insert_header(ContentType::json())
                    .json(serde_json::json!({ "message": self.to_string() }))
            },
            // Anything unexpected: log the detail, leak nothing.
            _ => {
                error!("💻️ Internal error: {self}");
                HttpResponse::InternalServerError()
                    .insert_header(ContentType::json())
                    .json(serde_json::json!({ "message": "Internal Server Error" }))
            },
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Access token has expired.")]
    ExpiredToken,
    #[error("Access token signature is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
}

impl From<PolicyError> for ServerError {
    fn from(e: PolicyError) -> Self {
        match e {
            PolicyError::Unauthorized => Self::Unauthorized,
            PolicyError::SelfDeleteOnly => Self::BadRequest(e.to_string()),
        }
    }
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::InvalidCredentials => Self::Unauthorized,
            AuthApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            AuthApiError::HashingError(e) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<UserApiError> for ServerError {
    fn from(e: UserApiError) -> Self {
        match e {
            UserApiError::UsernameTaken => {
                Self::ValidationError { message: e.to_string(), location: "username".to_string() }
            },
            UserApiError::EmailTaken => Self::ValidationError { message: e.to_string(), location: "email".to_string() },
            UserApiError::UserNotFound => Self::NotFound,
            UserApiError::PolicyViolation(e) => e.into(),
            UserApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            UserApiError::HashingError(e) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<GameApiError> for ServerError {
    fn from(e: GameApiError) -> Self {
        match e {
            GameApiError::GameNotFound => Self::NotFound,
            GameApiError::PolicyViolation(e) => e.into(),
            GameApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<TagApiError> for ServerError {
    fn from(e: TagApiError) -> Self {
        match e {
            TagApiError::DuplicateTagName => Self::BadRequest(e.to_string()),
            TagApiError::TagNotFound => Self::NotFound,
            TagApiError::PolicyViolation(e) => e.into(),
            TagApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<InvalidIdError> for ServerError {
    fn from(_: InvalidIdError) -> Self {
        Self::InvalidId
    }
}

impl From<InvalidStatusError> for ServerError {
    fn from(e: InvalidStatusError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<InvalidCategoryError> for ServerError {
    fn from(e: InvalidCategoryError) -> Self {
        Self::BadRequest(e.to_string())
    }
}
