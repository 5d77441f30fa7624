//! The Serenity crate we're using for the Discord API is designed around callbacks to handle
//! events.  However, this does not mesh well with our plugin framework here.  To resolve this,
//! the handler translates the callbacks into a distinct Event enum.

use crate::{context::Context, log_error};
use serenity::all::{Message, Ready};

/// A Discord event
pub enum Event {
    Ready(Ready),
    Message(Message),
}

impl Event {
    // When an event occurs, iterate over all the plugins to see if any can/should handle it.
    pub async fn handle(self, ctx: Context<'_>) {
        for plugin in crate::plugin::plugins() {
            match plugin.handle(&ctx, &self).await {
                Ok(EventHandled::Yes) => return,
                Ok(EventHandled::No) => continue,
                Err(err) => log_error!("Error in plugin {}: {:#}", plugin.name(), err),
            }
        }
    }

    /// Check if a message is the bot command `cmd`, e.g. `!profile peppy`.
    ///
    /// The command word is matched case-insensitively.  Returns the message and the trimmed
    /// remainder of its content.
    pub async fn is_bot_cmd<'a>(
        &'a self,
        ctx: &Context<'_>,
        cmd: &str,
    ) -> Option<(&'a Message, &'a str)> {
        let Event::Message(msg) = self else {
            return None;
        };

        let cfg = ctx.cfg.read().await;
        let args = parse_cmd(&msg.content, &cfg.general.command_prefix, cmd)?;

        Some((msg, args))
    }
}

fn parse_cmd<'a>(content: &'a str, prefix: &str, cmd: &str) -> Option<&'a str> {
    let content = content.trim_start();
    let (word, args) = content
        .split_once(char::is_whitespace)
        .unwrap_or((content, ""));

    word.strip_prefix(prefix)
        .filter(|name| name.eq_ignore_ascii_case(cmd))
        .map(|_| args.trim())
}

pub enum EventHandled {
    Yes,
    No,
}

#[cfg(test)]
mod tests {
    use super::parse_cmd;

    #[test]
    fn command_with_arguments() {
        assert_eq!(parse_cmd("!profile peppy", "!", "profile"), Some("peppy"));
        assert_eq!(
            parse_cmd("  !profile   Freddie Benson  ", "!", "profile"),
            Some("Freddie Benson")
        );
    }

    #[test]
    fn command_word_is_case_insensitive() {
        assert_eq!(parse_cmd("!PROFILE peppy", "!", "profile"), Some("peppy"));
    }

    #[test]
    fn command_without_arguments() {
        assert_eq!(parse_cmd("!profile", "!", "profile"), Some(""));
        assert_eq!(parse_cmd("!profile   ", "!", "profile"), Some(""));
    }

    #[test]
    fn other_messages() {
        assert_eq!(parse_cmd("!profiles peppy", "!", "profile"), None);
        assert_eq!(parse_cmd("profile peppy", "!", "profile"), None);
        assert_eq!(parse_cmd(";profile peppy", "!", "profile"), None);
        assert_eq!(parse_cmd("", "!", "profile"), None);
    }

    #[test]
    fn multi_character_prefix() {
        assert_eq!(parse_cmd("pp!profile peppy", "pp!", "profile"), Some("peppy"));
    }
}
