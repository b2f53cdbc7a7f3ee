mod api;
mod config;
mod error;
mod signature;

mod data_objects;

pub use api::StripeApi;
pub use config::StripeConfig;
pub use data_objects::{
    Charge,
    ChargeList,
    CheckoutSession,
    Expandable,
    NewCheckoutSession,
    PaymentIntent,
    SessionPaymentStatus,
    SessionStatus,
    StripeEvent,
    StripeEventData,
};
pub use error::{SignatureError, StripeApiError};
pub use signature::{sign_payload, verify_signature, SIGNATURE_HEADER};
