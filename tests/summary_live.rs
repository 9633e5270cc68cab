use std::env;
use std::sync::Arc;

use serenity::all::Http;

use market_summary_bot::config::BotConfig;
use market_summary_bot::service::market::MarketService;
use market_summary_bot::service::summary::{post_market_summary, MarketEvent};

/// Posts a real closing summary to Discord. Gated so it never runs in CI.
#[tokio::test]
async fn posts_real_summary_to_discord() -> Result<(), Box<dyn std::error::Error>> {
    // Auto-load .env so RUN_REAL_DISCORD_TEST and the token set there are visible.
    let _ = dotenvy::dotenv();
    if env::var("RUN_REAL_DISCORD_TEST").ok().as_deref() != Some("1") {
        eprintln!("set RUN_REAL_DISCORD_TEST=1 to run this live Discord test");
        return Ok(());
    }

    let token = env::var("DISCORD_TOKEN")?;
    let http = Arc::new(Http::new(&token));

    let mut config = BotConfig::from_env();
    if let Ok(raw) = env::var("TARGET_CHANNEL_ID") {
        config.channel_id = raw.parse::<u64>()?;
    }

    let market = MarketService::new(None)?;

    // force=true so the test also works on weekends
    post_market_summary(&http, &market, &config, MarketEvent::Closing, true)
        .await
        .map_err(|e| -> Box<dyn std::error::Error> { e.into() })?;

    Ok(())
}
