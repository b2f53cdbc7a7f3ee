use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOffer, Offer, OfferStatus},
    traits::LedgerError,
};

pub async fn insert_offer(offer: NewOffer, seller_id: i64, conn: &mut SqliteConnection) -> Result<Offer, LedgerError> {
    let NewOffer { conversation_id, product_id, buyer_id, amount } = offer;
    let offer: Offer = sqlx::query_as(
        r#"
            INSERT INTO offers (conversation_id, product_id, buyer_id, seller_id, amount, status, created_at)
            VALUES ($1, $2, $3, $4, $5, 'Pending', $6)
            RETURNING *;
        "#,
    )
    .bind(conversation_id)
    .bind(product_id)
    .bind(buyer_id)
    .bind(seller_id)
    .bind(amount)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => {
            LedgerError::PendingOfferExists { buyer_id, product_id }
        },
        _ => LedgerError::from(e),
    })?;
    debug!("🗃️ Offer #{} of {} on product #{product_id} by buyer {buyer_id}", offer.id, offer.amount);
    Ok(offer)
}

pub async fn fetch_offer(id: i64, conn: &mut SqliteConnection) -> Result<Option<Offer>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM offers WHERE id = $1").bind(id).fetch_optional(conn).await
}

/// Compare-and-set on the offer status. Seller responses stamp `responded_at`.
pub async fn transition_offer(
    id: i64,
    from: OfferStatus,
    to: OfferStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Offer>, sqlx::Error> {
    let stamp = matches!(to, OfferStatus::Accepted | OfferStatus::Declined).then(Utc::now);
    sqlx::query_as(
        r#"
            UPDATE offers SET status = $1, responded_at = COALESCE($2, responded_at)
            WHERE id = $3 AND status = $4
            RETURNING *;
        "#,
    )
    .bind(to.to_string())
    .bind(stamp)
    .bind(id)
    .bind(from.to_string())
    .fetch_optional(conn)
    .await
}

pub async fn fetch_offers_for_conversation(
    conversation_id: i64,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Offer>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT * FROM offers
            WHERE conversation_id = $1 AND (buyer_id = $2 OR seller_id = $2)
            ORDER BY created_at DESC, id DESC;
        "#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .fetch_all(conn)
    .await
}
