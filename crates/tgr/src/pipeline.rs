//! The repost pipeline: listen for new messages on the user account, filter
//! by regex, and push matches through the bot.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tracing::{error, info};

use tgr_core::{Error, Result};
use tgr_tdjson::{class_types, Client, Message, MessageText};

/// Outbound side of the pipeline. `tgr_botapi::Bot` is the production
/// implementation; tests substitute a fake.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// The bot's own user id, used to skip the bot's messages.
    async fn identity(&self) -> Result<i64>;

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;
}

#[async_trait]
impl Messenger for tgr_botapi::Bot {
    async fn identity(&self) -> Result<i64> {
        Ok(self.get_me().await?.id)
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        tgr_botapi::Bot::send_message(self, chat_id, text).await
    }
}

pub struct Pipeline {
    re: Regex,
    messenger: Arc<dyn Messenger>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("re", &self.re).finish()
    }
}

impl Pipeline {
    pub fn new(pattern: &str, messenger: Arc<dyn Messenger>) -> Result<Self> {
        let re = Regex::new(pattern)
            .map_err(|e| Error::Config(format!("invalid filter regex {pattern:?}: {e}")))?;
        Ok(Self { re, messenger })
    }

    /// Resolve both identities, then repost every matching incoming message
    /// to the account owner's chat until the update stream ends. Filter and
    /// repost failures are logged per message; they never stop the stream.
    pub async fn run(&self, client: &Client) -> Result<()> {
        let bot_id = self.messenger.identity().await?;
        let me = client.get_me().await?;
        let mut updates = client.listen_new_messages()?;

        info!("listening for new messages");
        while let Some(msg) = updates.recv().await {
            match self.filter(bot_id, &msg) {
                Ok(Some(text)) => {
                    if let Err(e) = self.messenger.send_message(me.id, &text).await {
                        error!("repost failed for message {}: {e}", msg.id);
                    } else {
                        info!("reposted message {} from chat {}", msg.id, msg.chat_id);
                    }
                }
                Ok(None) => {}
                Err(e) => error!("filter failed for message {}: {e}", msg.id),
            }
        }
        Ok(())
    }

    /// Returns the message text when the message should be reposted.
    fn filter(&self, bot_id: i64, msg: &Message) -> Result<Option<String>> {
        if msg.sender_user_id == bot_id {
            return Ok(None);
        }
        if msg.content_type() != class_types::MESSAGE_TEXT {
            return Ok(None);
        }
        let content: MessageText = msg.decode_content()?;
        let text = content.text.text;
        if self.re.is_match(&text) {
            Ok(Some(text))
        } else {
            Ok(None)
        }
    }
}
