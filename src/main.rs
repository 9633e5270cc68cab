use std::{env, sync::Arc};

use anyhow::Result;
use dotenv::dotenv;
use serenity::all::{
    ApplicationId, Command, CreateInteractionResponse, CreateInteractionResponseMessage,
    GatewayIntents, GuildId, Interaction,
};
use serenity::{async_trait, model::gateway::Ready, prelude::*, Client};
use tracing::info;

use market_summary_bot::config::BotConfig;
use market_summary_bot::service::command::summary as summary_cmd;
use market_summary_bot::service::market::MarketService;
use market_summary_bot::service::summary::poster::SummaryPoster;

struct Handler {
    market: Arc<MarketService>,
    config: BotConfig,
    poster: SummaryPoster,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        // Guild commands register instantly; fall back to a global command
        // (takes up to an hour to propagate) when no guild is configured.
        let guild_id = env::var("GUILD_ID")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(GuildId::new);

        match guild_id {
            Some(guild_id) => {
                let _ = guild_id
                    .create_command(&ctx.http, summary_cmd::register_command())
                    .await;
                info!(
                    "{} is connected. /summary registered for guild {}.",
                    ready.user.name, guild_id
                );
            }
            None => {
                let _ =
                    Command::create_global_command(&ctx.http, summary_cmd::register_command())
                        .await;
                info!(
                    "{} is connected. /summary registered globally.",
                    ready.user.name
                );
            }
        }

        // Start the scheduled opening/closing poster; a no-op when ready
        // re-fires after a reconnect
        self.poster
            .spawn(ctx.http.clone(), self.market.clone(), self.config.clone());
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            if command.data.name.as_str() != "summary" {
                let _ = command
                    .create_response(
                        &ctx.http,
                        CreateInteractionResponse::Message(
                            CreateInteractionResponseMessage::new()
                                .content("Command not implemented."),
                        ),
                    )
                    .await;
                return;
            }

            // Defer immediately to avoid the 3-second timeout
            let _ = command
                .create_response(
                    &ctx.http,
                    CreateInteractionResponse::Defer(Default::default()),
                )
                .await;

            let content =
                match summary_cmd::handle(&command, &ctx.http, &self.market, &self.config).await {
                    Ok(msg) => msg,
                    Err(err) => format!("❌ {}", err),
                };

            let _ = command
                .edit_response(
                    &ctx.http,
                    serenity::all::EditInteractionResponse::new().content(content),
                )
                .await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let token = env::var("DISCORD_TOKEN")?;

    let intents = GatewayIntents::GUILDS;

    let config = BotConfig::from_env();
    info!(
        "Tracking {} into channel {}",
        config.ticker, config.channel_id
    );

    info!("Initializing MarketService...");
    let market = Arc::new(MarketService::new(None)?);

    info!("Starting Discord client...");
    let mut builder = Client::builder(token, intents).event_handler(Handler {
        market,
        config,
        poster: SummaryPoster::new(),
    });

    if let Some(app_id_raw) = env::var("APPLICATION_ID")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
    {
        let app_id: ApplicationId = app_id_raw.into();
        builder = builder.application_id(app_id);
    }

    let mut client = builder.await?;

    if let Err(why) = client.start().await {
        eprintln!("Client error: {why}");
    }

    Ok(())
}
