use std::fmt::Debug;

use chrono::Utc;
use log::*;
use mkt_common::DEFAULT_CURRENCY_CODE_LOWER;

use crate::{
    db_types::{NewOrder, Offer, OfferStatus, Order, Product, ProductStatus},
    events::EventProducers,
    fees::calculate_fees,
    market_api::{
        checkout_objects::{CheckoutParams, CheckoutSession, PayableTarget},
        errors::{CheckoutError, ValidationError},
        order_flow_api::OrderFlowApi,
    },
    traits::{CheckoutRequest, OfferManagement, PaymentLedgerDatabase, PaymentProvider, ProductCatalog},
};

/// Starts checkouts: validates the purchase, creates the pending order and asks the provider for a checkout session.
pub struct CheckoutApi<B, P> {
    orders: OrderFlowApi<B>,
    provider: P,
    currency: String,
}

impl<B, P> Debug for CheckoutApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi ({})", self.currency)
    }
}

impl<B, P> CheckoutApi<B, P> {
    pub fn new(db: B, provider: P, producers: EventProducers) -> Self {
        let orders = OrderFlowApi::new(db, producers);
        Self { orders, provider, currency: DEFAULT_CURRENCY_CODE_LOWER.to_string() }
    }

    /// Sets the currency new orders are priced in.
    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<B, P> CheckoutApi<B, P>
where
    B: PaymentLedgerDatabase + OfferManagement,
    P: PaymentProvider,
{
    /// Creates a pending order for `target` and a provider checkout session to pay for it.
    ///
    /// The order price is the product's list price for direct purchases, and the agreed offer amount for negotiated
    /// ones. If the provider call fails, the order is marked `Failed` and the provider error is returned.
    pub async fn create_checkout(
        &self,
        target: PayableTarget,
        params: CheckoutParams,
    ) -> Result<CheckoutSession, CheckoutError> {
        if params.success_url.trim().is_empty() || params.cancel_url.trim().is_empty() {
            return Err(ValidationError::MissingRedirectUrls.into());
        }
        let (product, offer) = self.resolve_target(target, params.buyer_id).await?;
        if product.status != ProductStatus::Available {
            return Err(ValidationError::ProductNotAvailable(product.id).into());
        }
        if product.seller_id == params.buyer_id {
            return Err(ValidationError::OwnProduct.into());
        }
        let amount = offer.as_ref().map(|o| o.amount).unwrap_or(product.price);
        let fees = calculate_fees(amount);
        let new_order = NewOrder {
            product_id: product.id,
            buyer_id: params.buyer_id,
            seller_id: product.seller_id,
            offer_id: offer.as_ref().map(|o| o.id),
            price: amount,
            platform_fee: fees.platform_fee,
            seller_amount: fees.seller_amount,
            currency: self.currency.clone(),
            created_at: Utc::now(),
        };
        let order = self.orders.db().insert_order(new_order).await?;
        debug!("💳️ Order #{} created for product #{} at {amount}", order.id, product.id);
        let description = match &offer {
            Some(_) => Some(format!("Negotiated price: {amount} (Original: {})", product.price)),
            None => product.description.clone(),
        };
        let request = CheckoutRequest {
            order_id: order.id,
            product_id: product.id,
            buyer_id: order.buyer_id,
            seller_id: order.seller_id,
            offer_id: order.offer_id,
            product_name: product.title.clone(),
            description,
            amount,
            currency: order.currency.clone(),
            customer_email: params.buyer_email.clone(),
            success_url: params.success_url.clone(),
            cancel_url: params.cancel_url.clone(),
        };
        let session = match self.provider.create_checkout_session(&request).await {
            Ok(session) => session,
            Err(e) => {
                warn!("💳️ Could not create a checkout session for order #{}. {e}", order.id);
                self.compensate(&order, "checkout session could not be created").await;
                return Err(e.into());
            },
        };
        let order = match self.orders.db().attach_session_id(order.id, &session.session_id).await {
            Ok(order) => order,
            Err(e) => {
                error!("💳️ Session {} was created but could not be saved on order #{}. {e}", session.session_id, order.id);
                self.compensate(&order, "checkout session could not be saved").await;
                return Err(e.into());
            },
        };
        info!("💳️ Checkout session {} opened for order #{}", session.session_id, order.id);
        Ok(CheckoutSession { session_id: session.session_id, url: session.url, order_id: order.id })
    }

    async fn resolve_target(
        &self,
        target: PayableTarget,
        buyer_id: i64,
    ) -> Result<(Product, Option<Offer>), CheckoutError> {
        let db = self.orders.db();
        match target {
            PayableTarget::Direct { product_id } => {
                let product = db.fetch_product(product_id).await?.ok_or(CheckoutError::ProductNotFound(product_id))?;
                Ok((product, None))
            },
            PayableTarget::Negotiated { offer_id } => {
                let offer = db.fetch_offer(offer_id).await?.ok_or(CheckoutError::OfferNotFound(offer_id))?;
                if offer.buyer_id != buyer_id {
                    return Err(ValidationError::NotOfferBuyer(offer_id).into());
                }
                if offer.status != OfferStatus::Accepted {
                    return Err(ValidationError::OfferNotAccepted(offer_id).into());
                }
                let product = db
                    .fetch_product(offer.product_id)
                    .await?
                    .ok_or(CheckoutError::ProductNotFound(offer.product_id))?;
                Ok((product, Some(offer)))
            },
        }
    }

    /// Best effort. If this write fails too, the order stays pending without a session, which the poller never picks
    /// up.
    async fn compensate(&self, order: &Order, reason: &str) {
        if let Err(e) = self.orders.fail_order(order.id, reason).await {
            error!("💳️ Order #{} could not be marked as failed and is orphaned in the pending state. {e}", order.id);
        }
    }
}
