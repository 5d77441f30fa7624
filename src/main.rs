mod config;
mod context;
mod event;
mod handler;
mod helper;
mod logging;
mod osu;
mod pipeline;
mod plugin;
mod ranking;
mod report;

use serenity::{all::GatewayIntents, Client};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = crate::config::Config::load().await?;
    let token = cfg.general.discord_token.clone();
    let osu = crate::osu::Osu::new(&cfg)?;
    let handler = handler::Handler::new(cfg, osu);

    // Things we want discord to tell us about.
    let intents = GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    Client::builder(&token, intents)
        .event_handler(handler)
        .await?
        .start()
        .await
        .map_err(Into::into)
}
