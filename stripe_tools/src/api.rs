use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{config::StripeConfig, CheckoutSession, NewCheckoutSession, StripeApiError};

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let auth = format!("Bearer {}", config.secret_key.reveal());
        let mut val = HeaderValue::from_str(&auth).map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Sends a request to the Stripe REST API. Stripe takes request bodies as form-encoded key-value pairs, with
    /// nested objects flattened into `a[b][c]` keys.
    pub async fn rest_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        form: Option<&[(String, String)]>,
    ) -> Result<T, StripeApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(form) = form {
            req = req.form(form);
        }
        let response = req.send().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| StripeApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
            Err(StripeApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/v1{path}", self.config.api_base.trim_end_matches('/'))
    }

    pub async fn create_checkout_session(
        &self,
        session: &NewCheckoutSession,
    ) -> Result<CheckoutSession, StripeApiError> {
        let form = session.to_form_params();
        debug!("Creating checkout session for {} ({} {})", session.product_name, session.unit_amount, session.currency);
        let result =
            self.rest_query::<CheckoutSession>(Method::POST, "/checkout/sessions", &[], Some(form.as_slice())).await?;
        info!("Created checkout session {}", result.id);
        Ok(result)
    }

    /// Fetches a checkout session with its payment intent expanded, so that the charge id is available.
    pub async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession, StripeApiError> {
        let path = format!("/checkout/sessions/{session_id}");
        debug!("Fetching checkout session {session_id}");
        let result =
            self.rest_query::<CheckoutSession>(Method::GET, &path, &[("expand[]", "payment_intent")], None).await?;
        trace!("Checkout session {session_id} is {:?}/{}", result.status, result.payment_status);
        Ok(result)
    }
}
