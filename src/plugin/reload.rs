use crate::{event::*, helper::MessageHelper, log_internal, osu::Osu, plugin::*};
use anyhow::Result;

pub struct Reload;

#[serenity::async_trait]
impl Plugin for Reload {
    fn name(&self) -> &'static str {
        "reload"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{}{} - reload config (bot owner only)",
            prefix,
            self.name()
        ))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, _)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        if !msg.is_from_owner(ctx).await {
            msg.reply(ctx.cache_http, "Only bot owners may reload the configuration")
                .await?;
            return Ok(EventHandled::Yes);
        }

        let mut cfg = ctx.cfg.write().await;
        cfg.reload().await?;

        // API key, base url and cache settings may have changed
        let osu = Osu::new(&cfg)?;
        drop(cfg);
        *ctx.osu.write().await = osu;

        log_internal!("Configuration reloaded");
        msg.reply(ctx.cache_http, "Configuration reloaded successfully")
            .await?;
        Ok(EventHandled::Yes)
    }
}
