use anyhow::Result;
use market_core::{Config, MarketContext};
use market_listings::{http_sources, ListingAggregator};
use market_negotiation::{InboxFilter, NegotiationService};
use tokio;
use tracing;
use tracing_subscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting marketplace client");

    let config = Config::from_env();
    let ctx = MarketContext::new(config)?;

    tracing::info!("Market context initialized for {}", ctx.api.base_url());

    if ctx.session.is_signed_in() && ctx.session.current().and_then(|s| s.seller_id).is_none() {
        ctx.refresh_seller_id().await;
    }

    let feed = ListingAggregator::new(http_sources(&ctx));
    tokio::select! {
        _ = feed.hydrate_all() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, discarding pending listing fetches");
            feed.shutdown();
            return Ok(());
        }
    }

    for (entity_type, error) in feed.errors() {
        tracing::warn!("{} listings unavailable: {}", entity_type.label(), error);
    }

    let items = feed.items();
    tracing::info!("Feed ready: {} listings, has_more={}", items.len(), feed.has_more());
    for item in items.iter().take(10) {
        tracing::info!("  [{}] {} - {} ({})", item.entity_type, item.title, item.subtitle, item.price);
    }

    if let Some(buyer_id) = ctx.session.current().and_then(|s| s.buyer_id) {
        let negotiations = NegotiationService::new(&ctx);
        match negotiations.load_buyer_requests(buyer_id).await {
            Ok(requests) => {
                let active = negotiations.inbox(InboxFilter::Active).len();
                tracing::info!(
                    "Buyer {} has {} chat requests ({} active)",
                    buyer_id,
                    requests.len(),
                    active
                );
            }
            Err(e) => tracing::error!("Failed to load chat requests for buyer {}: {}", buyer_id, e),
        }
    }

    Ok(())
}
