use crate::{
    db_types::{NewOffer, Offer, OfferStatus},
    traits::LedgerError,
};

/// Storage for price negotiations.
///
/// Only one `Pending` offer per buyer and product may exist at a time. Backends must enforce this themselves and
/// report violations as [`LedgerError::PendingOfferExists`].
#[allow(async_fn_in_trait)]
pub trait OfferManagement: Clone {
    async fn insert_offer(&self, offer: NewOffer, seller_id: i64) -> Result<Offer, LedgerError>;

    async fn fetch_offer(&self, offer_id: i64) -> Result<Option<Offer>, LedgerError>;

    /// Moves the offer from `from` to `to`. When `to` is a seller response (`Accepted` or `Declined`), `responded_at`
    /// is stamped.
    ///
    /// Returns `None` if the offer was not in the `from` state.
    async fn transition_offer(
        &self,
        offer_id: i64,
        from: OfferStatus,
        to: OfferStatus,
    ) -> Result<Option<Offer>, LedgerError>;

    /// Offers in a conversation in which the user is the buyer or the seller, newest first.
    async fn fetch_offers_for_conversation(
        &self,
        conversation_id: i64,
        user_id: i64,
    ) -> Result<Vec<Offer>, LedgerError>;
}
