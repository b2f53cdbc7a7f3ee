use crate::{
    db_types::{NewProduct, Product},
    traits::LedgerError,
};

/// Product listings are owned by the catalogue service. The ledger only reads them and flips them to `SOLD`, but
/// backends also need a way to register products so that the ledger has something to sell.
#[allow(async_fn_in_trait)]
pub trait ProductCatalog {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, LedgerError>;

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, LedgerError>;
}
