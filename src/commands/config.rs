use crate::state::Context;

/// Show or change review limits (admin only)
#[poise::command(slash_command, guild_only)]
pub async fn config(
    ctx: Context<'_>,
    #[description = "concurrency | link_timeout_secs | batch_timeout_secs | copy_timeout_secs"]
    param: Option<String>,
    #[description = "New value"] value: Option<u64>,
) -> Result<(), anyhow::Error> {
    let user_id = ctx.author().id.get();
    if !ctx.data().is_admin(user_id) {
        ctx.say("This command is admin-only.").await?;
        return Ok(());
    }

    match (param.as_deref(), value) {
        // Show current config
        (None, _) => {
            let config = ctx.data().review_config.read().await;
            ctx.say(format!(
                "**Review Configuration:**\n\
                 `concurrency`: {}\n\
                 `link_timeout_secs`: {}\n\
                 `batch_timeout_secs`: {}\n\
                 `copy_timeout_secs`: {}",
                config.concurrency,
                config.link_timeout_secs,
                config.batch_timeout_secs,
                config.copy_timeout_secs
            ))
            .await?;
        }
        (Some(key), Some(val)) => {
            let outcome = ctx.data().review_config.write().await.set(key, val);
            match outcome {
                Ok(()) => {
                    tracing::info!(user_id, key, val, "review config changed");
                    ctx.say(format!("`{}` set to {}", key, val)).await?;
                }
                Err(msg) => {
                    ctx.say(msg).await?;
                }
            }
        }
        (Some(_), None) => {
            ctx.say("Provide both `param` and `value`. Example: `/copybot config concurrency 5`")
                .await?;
        }
    }

    Ok(())
}
