use crate::render::USAGE;
use crate::state::Context;

/// How to use the bot
#[poise::command(slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    ctx.say(format!(
        "{}\n\n\
         **Commands:**\n\
         `/copybot review text:<copy>`: review a block of copy\n\
         `/copybot config`: show or change review limits (admin only)\n\
         `/copybot help`: this message",
        USAGE
    ))
    .await?;
    Ok(())
}
