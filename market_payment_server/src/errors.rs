use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use market_payment_engine::{
    traits::{LedgerError, ProviderError},
    CheckoutError,
    OfferApiError,
    OrderFlowError,
    WebhookError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Missing or invalid caller identity. {0}")]
    MissingIdentity(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Payment provider error. {0}")]
    ProviderError(String),
    #[error("Invalid webhook. {0}")]
    InvalidWebhook(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidWebhook(_) => StatusCode::BAD_REQUEST,
            Self::MissingIdentity(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ProviderError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::OrderNotFound(_) |
            LedgerError::ProductNotFound(_) |
            LedgerError::OfferNotFound(_) |
            LedgerError::EventNotFound(_) => Self::NoRecordFound(e.to_string()),
            LedgerError::PendingOfferExists { .. } => Self::Conflict(e.to_string()),
            e => {
                error!("💻️ Backend error. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<ProviderError> for ServerError {
    fn from(e: ProviderError) -> Self {
        Self::ProviderError(e.to_string())
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::Validation(e) => Self::ValidationError(e.to_string()),
            CheckoutError::ProductNotFound(_) | CheckoutError::OfferNotFound(_) => Self::NoRecordFound(e.to_string()),
            CheckoutError::Provider(e) => e.into(),
            CheckoutError::Database(e) => e.into(),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::Forbidden(_) => Self::InsufficientPermissions(e.to_string()),
            OrderFlowError::NotPending { .. } => Self::ValidationError(e.to_string()),
            OrderFlowError::Database(e) => e.into(),
        }
    }
}

impl From<OfferApiError> for ServerError {
    fn from(e: OfferApiError) -> Self {
        match e {
            OfferApiError::Validation(_) | OfferApiError::InvalidTransition { .. } => {
                Self::ValidationError(e.to_string())
            },
            OfferApiError::OfferNotFound(_) | OfferApiError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            OfferApiError::Forbidden(_) => Self::InsufficientPermissions(e.to_string()),
            OfferApiError::PendingOfferExists(_) => Self::Conflict(e.to_string()),
            OfferApiError::Database(e) => e.into(),
        }
    }
}

impl From<WebhookError> for ServerError {
    fn from(e: WebhookError) -> Self {
        match e {
            WebhookError::MalformedEvent(_) => Self::InvalidWebhook(e.to_string()),
            WebhookError::Database(e) => Self::BackendError(e.to_string()),
        }
    }
}
