use crate::{
    event::*,
    helper::MessageHelper,
    log_error, log_internal,
    logging::{Player, PrintColor},
    osu::rescore::RosuRescorer,
    pipeline::ProfilePipeline,
    plugin::*,
    report,
};
use anyhow::Result;
use serenity::all::{CreateAttachment, CreateMessage, Message};

/// Discord rejects message content longer than this many characters
const MESSAGE_LIMIT: usize = 2000;

/// Compares a player's live pp with pp recalculated locally
pub struct Profile;

#[serenity::async_trait]
impl Plugin for Profile {
    fn name(&self) -> &'static str {
        "profile"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{}{} <osu! username> - compare live and locally recalculated pp of a player's top plays",
            prefix,
            self.name()
        ))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, name)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };
        let name = name.to_owned();

        // Nothing to look up
        if name.is_empty() {
            return Ok(EventHandled::Yes);
        }

        log_internal!(
            "Building profile of {} for {}",
            Player(&name).color(),
            msg.author.color()
        );

        let mut status = msg.reply(ctx.cache_http, "Getting User Data...").await?;

        match build_report(ctx, &name, &mut status).await {
            Ok(text) => {
                let attachment = CreateAttachment::bytes(text.into_bytes(), report::file_name(&name));
                let reply = CreateMessage::new().reference_message(msg).add_file(attachment);
                msg.channel_id.send_message(ctx.cache_http, reply).await?;
                status.delete(ctx.cache_http).await?;
                log_internal!("Building profile of {}... done", Player(&name).color());
            }
            Err(err) => {
                log_error!("Building profile of {} failed: {:#}", Player(&name).color(), err);
                status.set_status(ctx, &failure_status(&err)).await?;
            }
        }

        Ok(EventHandled::Yes)
    }
}

async fn build_report(ctx: &Context<'_>, name: &str, status: &mut Message) -> Result<String> {
    let cfg = ctx.cfg.read().await;
    let limit = cfg.osu.top_plays_limit;
    let concurrency = cfg.pipeline.concurrency;
    drop(cfg);

    let osu = ctx.osu.read().await;
    let pipeline = ProfilePipeline {
        plays: &osu.api,
        beatmaps: &osu.beatmaps,
        rescorer: &RosuRescorer,
        limit,
        concurrency,
    };

    let user = pipeline.user(name).await?;

    status.set_status(ctx, "Getting user top scores...").await?;
    let plays = pipeline.top_plays(name).await?;

    status
        .set_status(ctx, &format!("Calculating {} plays...", plays.len()))
        .await?;
    let store = pipeline.rescore(&plays).await?;
    let report = pipeline.rank(&user, &store)?;

    Ok(report::render(&user.username, &report))
}

/// `Failed with <error chain>`, cut to fit into a single message
fn failure_status(err: &anyhow::Error) -> String {
    let status = format!("Failed with {:#}", err);
    if status.chars().count() <= MESSAGE_LIMIT {
        return status;
    }

    let mut truncated: String = status.chars().take(MESSAGE_LIMIT - 1).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn short_failure_is_kept() {
        let err = anyhow!("User `nobody` was not found");
        assert_eq!(failure_status(&err), "Failed with User `nobody` was not found");
    }

    #[test]
    fn long_failure_fits_into_a_message() {
        let err = anyhow!("{}", "ö".repeat(3000)).context("Could not rescore play on beatmap 75");

        let status = failure_status(&err);
        assert_eq!(status.chars().count(), MESSAGE_LIMIT);
        assert!(status.starts_with("Failed with Could not rescore play on beatmap 75: öö"));
        assert!(status.ends_with('…'));
    }
}
