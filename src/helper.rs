//! Miscellaneous convenience methods

use crate::context::Context;
use anyhow::Result;
use serenity::all::EditMessage;

#[serenity::async_trait]
pub trait MessageHelper {
    async fn is_from_owner(&self, ctx: &Context) -> bool;
    async fn set_status(&mut self, ctx: &Context, status: &str) -> Result<()>;
}

#[serenity::async_trait]
impl MessageHelper for serenity::all::Message {
    async fn is_from_owner(&self, ctx: &Context) -> bool {
        let owners = &ctx.cfg.read().await.general.bot_owners;
        let author_global_name = &self.author.name;

        owners.contains(author_global_name)
    }

    /// Replace the content of a message the bot sent earlier, e.g. to show progress.
    async fn set_status(&mut self, ctx: &Context, status: &str) -> Result<()> {
        self.edit(ctx.cache_http, EditMessage::new().content(status))
            .await
            .map_err(Into::into)
    }
}
