use poise::serenity_prelude as serenity;
use tracing::{debug, info};

use crate::render;
use crate::state::AppState;

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    framework: poise::FrameworkContext<'_, AppState, anyhow::Error>,
    data: &AppState,
) -> Result<(), anyhow::Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        let bot_id = framework.bot_id;
        // `mentions` also lists the bot for plain replies to its messages
        if new_message.author.bot || !mentions_bot(&new_message.content, bot_id.get()) {
            return Ok(());
        }
        on_mention(ctx, new_message, bot_id, data).await?;
    }
    Ok(())
}

async fn on_mention(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    bot_id: serenity::UserId,
    data: &AppState,
) -> Result<(), anyhow::Error> {
    let text = strip_mentions(&msg.content, bot_id.get());
    if text.is_empty() {
        debug!(user = %msg.author.name, "empty mention");
        msg.reply(ctx, render::USAGE).await?;
        return Ok(());
    }

    info!(user = %msg.author.name, channel = %msg.channel_id, len = text.len(), "mention review");
    let mut working = msg.reply(ctx, render::WORKING).await?;

    let limits = data.limits().await;
    let report = data.engine.review(&text, limits).await;

    let mut chunks = render::chunk(&render::render_report(&report)).into_iter();
    if let Some(first) = chunks.next() {
        working
            .edit(ctx, serenity::EditMessage::new().content(first))
            .await?;
    }
    for chunk in chunks {
        msg.channel_id.say(ctx, chunk).await?;
    }
    Ok(())
}

/// True when `content` itself carries a `<@id>` or `<@!id>` token for `bot_id`.
pub fn mentions_bot(content: &str, bot_id: u64) -> bool {
    content.contains(&format!("<@{}>", bot_id)) || content.contains(&format!("<@!{}>", bot_id))
}

/// Remove `<@id>` and `<@!id>` tokens for `bot_id` and trim what is left.
pub fn strip_mentions(content: &str, bot_id: u64) -> String {
    content
        .replace(&format!("<@!{}>", bot_id), "")
        .replace(&format!("<@{}>", bot_id), "")
        .trim()
        .to_string()
}
