//! Polls Stripe for the status of recent pending orders and applies any payments it finds.
//!
//! Intended to be run from cron on deployments where Stripe webhooks cannot reach the server:
//!
//! ```text
//! poll_payments --max-orders 100 --age-hours 24
//! poll_payments --dry-run
//! ```
use std::{process::ExitCode, time::Duration};

use clap::Parser;
use dotenvy::dotenv;
use log::*;
use market_payment_engine::{
    events::EventProducers,
    market_api::poll_objects::{max_age_from_hours, MAX_POLL_AGE_HOURS},
    OrderFlowApi,
    PaymentPoller,
    PollOptions,
    SqliteDatabase,
};
use market_payment_server::{config::ServerConfig, integrations::stripe::StripeProvider};
use stripe_tools::StripeApi;

#[derive(Parser, Debug)]
#[command(version, about = "Poll Stripe for payments on pending orders")]
pub struct Arguments {
    /// Maximum number of orders to check
    #[arg(long = "max-orders")]
    max_orders: Option<u32>,
    /// Only check orders created within this many hours
    #[arg(long = "age-hours", value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_POLL_AGE_HOURS)))]
    age_hours: Option<u32>,
    /// Show which orders would be checked, without calling Stripe or changing anything
    #[arg(long = "dry-run", default_value_t = false)]
    dry_run: bool,
    /// Pause between Stripe queries, in milliseconds
    #[arg(long = "delay-ms")]
    delay_ms: Option<u64>,
}

impl Arguments {
    fn poll_options(&self, config: &ServerConfig) -> PollOptions {
        let defaults = config.poller;
        PollOptions {
            max_orders: self.max_orders.unwrap_or(defaults.max_orders),
            max_age: max_age_from_hours(self.age_hours.unwrap_or(defaults.max_age_hours)),
            delay: self.delay_ms.map(Duration::from_millis).unwrap_or(defaults.delay),
            dry_run: self.dry_run,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();
    let args = Arguments::parse();
    let config = ServerConfig::from_env_or_default();
    let options = args.poll_options(&config);
    match run(config, options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("🕰️ {e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        },
    }
}

async fn run(config: ServerConfig, options: PollOptions) -> Result<(), String> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 5)
        .await
        .map_err(|e| format!("Could not connect to {}. {e}", config.database_url))?;
    let api = StripeApi::new(config.stripe.clone()).map_err(|e| e.to_string())?;
    let orders = OrderFlowApi::new(db, EventProducers::default());
    let poller = PaymentPoller::new(orders, StripeProvider::new(api));
    info!(
        "🕰️ Polling up to {} orders from the last {} hours{}",
        options.max_orders,
        options.max_age.num_hours(),
        if options.dry_run { " (dry run)" } else { "" }
    );
    let summary = poller.run(options).await.map_err(|e| e.to_string())?;
    for outcome in &summary.outcomes {
        match serde_json::to_string(outcome) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!("🕰️ Could not format the outcome for order {}. {e}", outcome.order_id),
        }
    }
    println!(
        "Completed: {} checked, {} updated, {} errors in {:.2}s",
        summary.checked,
        summary.updated,
        summary.errors,
        summary.elapsed.as_secs_f64()
    );
    Ok(())
}
