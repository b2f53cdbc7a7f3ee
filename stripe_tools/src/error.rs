use thiserror::Error;

#[derive(Debug, Error)]
pub enum StripeApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("The signature header is missing or malformed: {0}")]
    MalformedHeader(String),
    #[error("The signature timestamp is outside the tolerance window ({0}s)")]
    TimestampOutOfTolerance(i64),
    #[error("The signing secret cannot be used as an HMAC key: {0}")]
    InvalidSecret(String),
    #[error("No signature in the header matches the payload")]
    NoMatchingSignature,
}
