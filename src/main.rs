mod analysis;
mod commands;
mod events;
mod llm;
mod render;
mod review;
mod state;

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use poise::{Framework, FrameworkOptions};
use tokio::sync::RwLock;
use tracing::{error, info, Level};

use analysis::{DirectPageAnalyzer, LlmReviewModel, RemotePageAnalyzer};
use llm::LlmClient;
use review::verify::{LanguagePolicy, PageAnalyzer};
use review::ReviewEngine;
use state::{AppState, ReviewConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    // Load env
    let _ = dotenv::dotenv();
    let token = dotenv::var("DISCORD_TOKEN").context("DISCORD_TOKEN required")?;
    let guild_id: Option<serenity::GuildId> = dotenv::var("DISCORD_GUILD_ID")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(serenity::GuildId::new);

    // Init LLM client
    let llm_client = Arc::new(LlmClient::from_env()?);
    info!(model = llm_client.model(), "LLM client initialized");

    let analyzer: Arc<dyn PageAnalyzer> = match dotenv::var("PAGE_ANALYZER")
        .unwrap_or_else(|_| "direct".to_string())
        .as_str()
    {
        "remote" => {
            info!("Page analysis via remote browser service");
            Arc::new(RemotePageAnalyzer::from_env()?)
        }
        "direct" => {
            info!("Page analysis via direct fetch");
            Arc::new(DirectPageAnalyzer::new(llm_client.clone())?)
        }
        other => anyhow::bail!("Unknown PAGE_ANALYZER `{}` (expected direct or remote)", other),
    };

    let engine = Arc::new(ReviewEngine::new(
        analyzer,
        Arc::new(LanguagePolicy),
        Arc::new(LlmReviewModel::new(llm_client)),
    ));

    // Parse admin user IDs from env
    let admin_ids: HashSet<u64> = dotenv::var("ADMIN_USER_IDS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse::<u64>().ok())
        .collect();
    if !admin_ids.is_empty() {
        info!(count = admin_ids.len(), "Admin users configured");
    }

    let review_config = ReviewConfig::from_env();
    info!(?review_config, "Review limits loaded");

    let app_state = AppState {
        engine,
        admin_ids,
        review_config: Arc::new(RwLock::new(review_config)),
    };

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: vec![commands::copybot()],
            event_handler: |ctx, event, framework, data| {
                Box::pin(events::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Bot connected as: {} ({})", ready.user.name, ready.user.id);

                let commands = &framework.options().commands;
                info!("Registering {} top-level command(s):", commands.len());
                for cmd in commands {
                    info!("  /{} ({} subcommands)", cmd.name, cmd.subcommands.len());
                    for sub in &cmd.subcommands {
                        info!("    /{} {}", cmd.name, sub.name);
                    }
                }

                if let Some(gid) = guild_id {
                    info!("Registering to guild {} (instant)", gid);
                    poise::builtins::register_in_guild(
                        ctx,
                        &framework.options().commands,
                        gid,
                    )
                    .await?;
                } else {
                    info!("Registering globally (up to 1 hour delay)");
                    poise::builtins::register_globally(
                        ctx,
                        &framework.options().commands,
                    )
                    .await?;
                }

                Ok(app_state)
            })
        })
        .build();

    info!("Starting copy review bot...");

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    if let Err(e) = client.start().await {
        error!("Client error: {}", e);
    }

    Ok(())
}
