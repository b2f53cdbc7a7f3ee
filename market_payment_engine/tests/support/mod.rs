#![allow(dead_code)]
use market_payment_engine::{
    db_types::{NewOffer, NewProduct, Offer, Product},
    events::EventProducers,
    test_utils::{fake_provider::FakeProvider, prepare_env::fresh_database},
    traits::ProductCatalog,
    CheckoutApi,
    CheckoutParams,
    CheckoutSession,
    OfferApi,
    OrderFlowApi,
    PayableTarget,
    PaymentPoller,
    SqliteDatabase,
    WebhookApi,
};
use mkt_common::Money;

pub const SELLER: i64 = 10;
pub const BUYER: i64 = 20;
pub const OTHER_BUYER: i64 = 30;

/// Everything a test needs, wired to one fresh database and one fake provider.
pub struct Market {
    pub db: SqliteDatabase,
    pub provider: FakeProvider,
    pub checkout: CheckoutApi<SqliteDatabase, FakeProvider>,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub offers: OfferApi<SqliteDatabase>,
    pub webhooks: WebhookApi<SqliteDatabase>,
    pub poller: PaymentPoller<SqliteDatabase, FakeProvider>,
}

impl Market {
    pub async fn new() -> Self {
        Self::with_producers(EventProducers::default()).await
    }

    pub async fn with_producers(producers: EventProducers) -> Self {
        let db = fresh_database().await;
        let provider = FakeProvider::new();
        let checkout = CheckoutApi::new(db.clone(), provider.clone(), producers.clone());
        let orders = OrderFlowApi::new(db.clone(), producers);
        let offers = OfferApi::new(db.clone());
        let webhooks = WebhookApi::new(orders.clone());
        let poller = PaymentPoller::new(orders.clone(), provider.clone());
        Self { db, provider, checkout, orders, offers, webhooks, poller }
    }

    pub async fn list_product(&self, title: &str, price: Money) -> Product {
        let product = NewProduct::new(SELLER, title, price).with_description(format!("A well loved {title}"));
        self.db.insert_product(product).await.expect("Error inserting product")
    }

    pub fn params(buyer_id: i64) -> CheckoutParams {
        CheckoutParams::new(buyer_id, "https://market.example.com/ok", "https://market.example.com/cancel")
    }

    pub async fn buy_now(&self, product_id: i64, buyer_id: i64) -> CheckoutSession {
        self.checkout
            .create_checkout(PayableTarget::Direct { product_id }, Self::params(buyer_id))
            .await
            .expect("Error creating checkout")
    }

    pub async fn accepted_offer(&self, product_id: i64, amount: Money) -> Offer {
        let offer = NewOffer { conversation_id: 1, product_id, buyer_id: BUYER, amount };
        let offer = self.offers.create_offer(offer).await.expect("Error creating offer");
        self.offers.respond_to_offer(offer.id, SELLER, true).await.expect("Error accepting offer")
    }

    /// Counts payment rows straight from the table, bypassing the ledger API.
    pub async fn payment_count(&self, order_id: i64) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE order_id = $1")
            .bind(order_id)
            .fetch_one(self.db.pool())
            .await
            .expect("Error counting payments")
    }

    pub async fn tear_down(self) {
        market_payment_engine::test_utils::prepare_env::tear_down(self.db).await;
    }
}
