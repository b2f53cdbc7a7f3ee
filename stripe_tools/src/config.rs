use log::*;
use mkt_common::{Secret, DEFAULT_CURRENCY_CODE_LOWER};

pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
/// Stripe's own libraries reject webhook timestamps older than five minutes.
pub const DEFAULT_SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone, Default)]
pub struct StripeConfig {
    pub secret_key: Secret<String>,
    pub webhook_secret: Secret<String>,
    pub api_base: String,
    pub currency: String,
    pub signature_tolerance_secs: i64,
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let secret_key = Secret::new(std::env::var("MKT_STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            warn!("🪛️ MKT_STRIPE_SECRET_KEY not set, using (probably useless) default");
            "sk_test_00000000000000".to_string()
        }));
        let webhook_secret = Secret::new(std::env::var("MKT_STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ MKT_STRIPE_WEBHOOK_SECRET not set, using (probably useless) default");
            "whsec_00000000000000".to_string()
        }));
        let api_base = std::env::var("MKT_STRIPE_API_BASE").unwrap_or_else(|_| {
            debug!("🪛️ MKT_STRIPE_API_BASE not set, using {DEFAULT_STRIPE_API_BASE}");
            DEFAULT_STRIPE_API_BASE.to_string()
        });
        let currency = std::env::var("MKT_CURRENCY").map(|s| s.to_ascii_lowercase()).unwrap_or_else(|_| {
            info!("🪛️ MKT_CURRENCY not set, using {DEFAULT_CURRENCY_CODE_LOWER}");
            DEFAULT_CURRENCY_CODE_LOWER.to_string()
        });
        let signature_tolerance_secs = std::env::var("MKT_WEBHOOK_TOLERANCE_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| {
                        error!("🪛️ Invalid MKT_WEBHOOK_TOLERANCE_SECS value, {s}. {e}. Using the default instead.")
                    })
                    .ok()
            })
            .unwrap_or(DEFAULT_SIGNATURE_TOLERANCE_SECS);
        Self { secret_key, webhook_secret, api_base, currency, signature_tolerance_secs }
    }
}
