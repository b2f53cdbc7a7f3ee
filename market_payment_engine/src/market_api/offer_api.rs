use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewOffer, Offer, OfferStatus, ProductStatus},
    market_api::errors::{OfferApiError, ValidationError},
    traits::{OfferManagement, ProductCatalog},
};

/// Price negotiation between a buyer and a seller.
///
/// ```text
/// Pending --(seller)--> Accepted --(buyer)--> Cancelled
///    |                     |
///    +--(seller)--> Declined  +--(payment completes)--> Paid
/// ```
///
/// The move to `Paid` is not made here. It happens inside the ledger's payment completion, in the same transaction
/// that marks the order paid.
pub struct OfferApi<B> {
    db: B,
}

impl<B> Debug for OfferApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OfferApi")
    }
}

impl<B> OfferApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OfferApi<B>
where B: OfferManagement + ProductCatalog
{
    pub async fn create_offer(&self, offer: NewOffer) -> Result<Offer, OfferApiError> {
        if !offer.amount.is_positive() {
            return Err(ValidationError::NonPositiveAmount.into());
        }
        let product =
            self.db.fetch_product(offer.product_id).await?.ok_or(OfferApiError::ProductNotFound(offer.product_id))?;
        if product.status != ProductStatus::Available {
            return Err(ValidationError::ProductNotAvailable(product.id).into());
        }
        if product.seller_id == offer.buyer_id {
            return Err(ValidationError::OwnProduct.into());
        }
        let offer = self.db.insert_offer(offer, product.seller_id).await?;
        info!("🤝️ Offer #{} of {} made on product #{} (list price {})", offer.id, offer.amount, product.id, product.price);
        Ok(offer)
    }

    /// The seller accepts or declines a pending offer.
    pub async fn respond_to_offer(&self, offer_id: i64, seller_id: i64, accept: bool) -> Result<Offer, OfferApiError> {
        let offer = self.fetch_offer(offer_id, seller_id).await?;
        if offer.seller_id != seller_id {
            return Err(OfferApiError::Forbidden("Only the seller can accept or decline offers".to_string()));
        }
        let to = if accept { OfferStatus::Accepted } else { OfferStatus::Declined };
        let updated = self.transition(&offer, OfferStatus::Pending, to).await?;
        info!("🤝️ Offer #{offer_id} {}", if accept { "accepted" } else { "declined" });
        Ok(updated)
    }

    /// The buyer withdraws from an accepted offer before paying for it.
    pub async fn cancel_offer(&self, offer_id: i64, buyer_id: i64) -> Result<Offer, OfferApiError> {
        let offer = self.fetch_offer(offer_id, buyer_id).await?;
        if offer.buyer_id != buyer_id {
            return Err(OfferApiError::Forbidden("Only the buyer can cancel offers".to_string()));
        }
        let updated = self.transition(&offer, OfferStatus::Accepted, OfferStatus::Cancelled).await?;
        info!("🤝️ Offer #{offer_id} cancelled by the buyer");
        Ok(updated)
    }

    /// Dispatches a requested status change to the operation allowed to make it.
    pub async fn update_offer_status(
        &self,
        offer_id: i64,
        user_id: i64,
        status: OfferStatus,
    ) -> Result<Offer, OfferApiError> {
        match status {
            OfferStatus::Accepted => self.respond_to_offer(offer_id, user_id, true).await,
            OfferStatus::Declined => self.respond_to_offer(offer_id, user_id, false).await,
            OfferStatus::Cancelled => self.cancel_offer(offer_id, user_id).await,
            to => {
                let offer = self.fetch_offer(offer_id, user_id).await?;
                Err(OfferApiError::InvalidTransition { offer_id, from: offer.status, to })
            },
        }
    }

    /// Fetches an offer on behalf of a user. Only the buyer and the seller may see it.
    pub async fn fetch_offer(&self, offer_id: i64, user_id: i64) -> Result<Offer, OfferApiError> {
        let offer = self.db.fetch_offer(offer_id).await?.ok_or(OfferApiError::OfferNotFound(offer_id))?;
        if !offer.involves(user_id) {
            return Err(OfferApiError::Forbidden(format!("Offer {offer_id} belongs to someone else")));
        }
        Ok(offer)
    }

    pub async fn offers_for_conversation(&self, conversation_id: i64, user_id: i64) -> Result<Vec<Offer>, OfferApiError> {
        let offers = self.db.fetch_offers_for_conversation(conversation_id, user_id).await?;
        trace!("🤝️ {} offers in conversation {conversation_id} for user {user_id}", offers.len());
        Ok(offers)
    }

    async fn transition(&self, offer: &Offer, from: OfferStatus, to: OfferStatus) -> Result<Offer, OfferApiError> {
        let invalid = |current| OfferApiError::InvalidTransition { offer_id: offer.id, from: current, to };
        if offer.status != from {
            return Err(invalid(offer.status));
        }
        match self.db.transition_offer(offer.id, from, to).await? {
            Some(updated) => Ok(updated),
            None => {
                // Lost a race with another status change
                let current = self.db.fetch_offer(offer.id).await?.map(|o| o.status).unwrap_or(offer.status);
                Err(invalid(current))
            },
        }
    }
}
