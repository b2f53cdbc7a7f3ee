use std::{env, str::FromStr, time::Duration};

use log::*;
use market_payment_engine::{
    market_api::poll_objects::{
        max_age_from_hours,
        DEFAULT_POLL_AGE_HOURS,
        DEFAULT_POLL_DELAY,
        DEFAULT_POLL_MAX_ORDERS,
        MAX_POLL_AGE_HOURS,
    },
    PollOptions,
};
use mkt_common::parse_boolean_flag;
use stripe_tools::StripeConfig;

const DEFAULT_MKT_HOST: &str = "127.0.0.1";
const DEFAULT_MKT_PORT: u16 = 8470;
const DEFAULT_MKT_DATABASE_URL: &str = "sqlite://data/market_store.db";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Apply the embedded database migrations on startup
    pub run_migrations: bool,
    pub stripe: StripeConfig,
    pub poller: PollerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MKT_HOST.to_string(),
            port: DEFAULT_MKT_PORT,
            database_url: DEFAULT_MKT_DATABASE_URL.to_string(),
            run_migrations: true,
            stripe: StripeConfig::default(),
            poller: PollerConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let host = env::var("MKT_HOST").ok().unwrap_or_else(|| DEFAULT_MKT_HOST.into());
        let port = env_or_default("MKT_PORT", DEFAULT_MKT_PORT);
        let database_url = env::var("MKT_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ MKT_DATABASE_URL is not set. Using {DEFAULT_MKT_DATABASE_URL}.");
            DEFAULT_MKT_DATABASE_URL.to_string()
        });
        let run_migrations = parse_boolean_flag(env::var("MKT_RUN_MIGRATIONS").ok(), true);
        let stripe = StripeConfig::new_from_env_or_default();
        let poller = PollerConfig::from_env_or_default();
        Self { host, port, database_url, run_migrations, stripe, poller }
    }
}

//-------------------------------------------------  PollerConfig  -----------------------------------------------------
/// Settings for the payment poller, shared by the in-process worker and the `poll_payments` binary.
#[derive(Clone, Copy, Debug)]
pub struct PollerConfig {
    /// How often the in-process worker runs. `None` disables the worker.
    pub interval: Option<Duration>,
    pub max_orders: u32,
    pub max_age_hours: u32,
    pub delay: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: None,
            max_orders: DEFAULT_POLL_MAX_ORDERS,
            max_age_hours: DEFAULT_POLL_AGE_HOURS,
            delay: DEFAULT_POLL_DELAY,
        }
    }
}

impl PollerConfig {
    pub fn from_env_or_default() -> Self {
        let interval = match env_or_default::<u64>("MKT_POLL_INTERVAL_SECS", 0) {
            0 => {
                info!("🪛️ The in-process payment poller is disabled. Set MKT_POLL_INTERVAL_SECS to enable it.");
                None
            },
            secs => Some(Duration::from_secs(secs)),
        };
        let max_orders = env_or_default("MKT_POLL_MAX_ORDERS", DEFAULT_POLL_MAX_ORDERS);
        let mut max_age_hours = env_or_default("MKT_POLL_AGE_HOURS", DEFAULT_POLL_AGE_HOURS);
        if !(1..=MAX_POLL_AGE_HOURS).contains(&max_age_hours) {
            warn!("🪛️ MKT_POLL_AGE_HOURS must be between 1 and {MAX_POLL_AGE_HOURS}. Using {DEFAULT_POLL_AGE_HOURS}.");
            max_age_hours = DEFAULT_POLL_AGE_HOURS;
        }
        let delay_ms = env_or_default("MKT_POLL_DELAY_MS", DEFAULT_POLL_DELAY.as_millis() as u64);
        Self { interval, max_orders, max_age_hours, delay: Duration::from_millis(delay_ms) }
    }

    pub fn poll_options(&self) -> PollOptions {
        PollOptions {
            max_orders: self.max_orders,
            max_age: max_age_from_hours(self.max_age_hours),
            delay: self.delay,
            dry_run: false,
        }
    }
}

fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
    }
}
