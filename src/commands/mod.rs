mod config;
mod help;
mod review;

use crate::render;
use crate::state::Context;

/// Copy review: link checks and copy edits for marketing text
#[poise::command(
    slash_command,
    subcommands("review::review", "config::config", "help::help")
)]
pub async fn copybot(_ctx: Context<'_>) -> Result<(), anyhow::Error> {
    Ok(())
}

/// Send a message in Discord-safe chunks.
/// Uses ctx.say() for all chunks; poise routes follow-ups through the
/// interaction webhook, which doesn't require Send Messages channel permission.
async fn send_chunked(ctx: &Context<'_>, text: &str) -> Result<(), anyhow::Error> {
    for chunk in render::chunk(text) {
        ctx.say(chunk).await?;
    }
    Ok(())
}
