use market_payment_engine::traits::{
    CheckoutRequest,
    PaymentProvider,
    ProviderError,
    ProviderSession,
    SessionSnapshot,
};
use mockall::mock;

mock! {
    pub Provider {}
    impl PaymentProvider for Provider {
        async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<ProviderSession, ProviderError>;
        async fn fetch_session(&self, session_id: &str) -> Result<SessionSnapshot, ProviderError>;
    }
}

pub fn session(id: &str) -> ProviderSession {
    ProviderSession { session_id: id.to_string(), url: Some(format!("https://checkout.example.com/pay/{id}")) }
}
