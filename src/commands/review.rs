use tracing::info;

use super::send_chunked;
use crate::render;
use crate::state::Context;

/// Check every link against its claim and review the copy
#[poise::command(slash_command)]
pub async fn review(
    ctx: Context<'_>,
    #[description = "The marketing copy to review"] text: String,
) -> Result<(), anyhow::Error> {
    if text.trim().is_empty() {
        ctx.say(render::USAGE).await?;
        return Ok(());
    }

    // Link checks routinely outlast the 3s interaction window
    ctx.defer().await?;

    let limits = ctx.data().limits().await;
    info!(user = ctx.author().name, len = text.len(), "review requested");

    let report = ctx.data().engine.review(&text, limits).await;

    send_chunked(&ctx, &render::render_report(&report)).await
}
