use serenity::all::{
    CommandDataOptionValue, CommandInteraction, CommandOptionType, CreateCommand,
    CreateCommandOption, Http,
};

use crate::config::BotConfig;
use crate::service::market::MarketService;
use crate::service::summary::{post_market_summary, MarketEvent};

pub fn register_command() -> CreateCommand {
    CreateCommand::new("summary")
        .description("Post the market summary for the tracked ticker now")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                "event",
                "Which summary to post",
            )
            .required(true)
            .add_string_choice("open", "open")
            .add_string_choice("close", "close"),
        )
}

/// Manual trigger for the scheduled summaries. Bypasses the weekend skip
/// so it can be used to test the posting path any day.
pub async fn handle(
    command: &CommandInteraction,
    http: &Http,
    market: &MarketService,
    config: &BotConfig,
) -> Result<String, String> {
    let event = match get_str_opt(command, "event") {
        Some("open") => MarketEvent::Opening,
        Some("close") => MarketEvent::Closing,
        Some(other) => return Err(format!("unknown event '{other}'")),
        None => return Err("event is required".to_string()),
    };

    post_market_summary(http, market, config, event, true).await?;

    Ok(format!(
        "{} summary for {} posted.",
        event.label(),
        config.ticker
    ))
}

fn get_str_opt<'a>(command: &'a CommandInteraction, name: &str) -> Option<&'a str> {
    command
        .data
        .options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| match o.value {
            CommandDataOptionValue::String(ref s) => Some(s.as_str()),
            _ => None,
        })
}
