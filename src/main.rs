use std::collections::HashSet;

use poise::serenity_prelude as serenity;
use relaybot::api_client::ApiClient;
use relaybot::config::Config;
use relaybot::db::Database;
use relaybot::llm::ProviderRegistry;
use relaybot::{commands, events, logging, maintenance, Data, ModelSelection};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let db = Database::open(&config.database_url)?;
    let logs = logging::init(&config, db.clone())?;

    let tables = if config.database_reset_on_boot {
        warn!("DATABASE_RESET_ON_BOOT is set, dropping all tables");
        db.reset()?
    } else {
        db.setup()?
    };
    info!("Database ready at {} ({} tables)", config.database_url, tables.len());

    let retention = maintenance::start_retention_task(
        db.clone(),
        config.log_retention_days,
        maintenance::SWEEP_INTERVAL,
    );

    let discord_token = config.discord_token.clone();
    let mut owners = HashSet::new();
    if let Some(owner_id) = config.owner_id {
        owners.insert(serenity::UserId::new(owner_id));
    }

    let data = Data {
        api: ApiClient::new(&config.api_url),
        providers: ProviderRegistry::with_defaults(config.providers.clone()),
        selection: tokio::sync::RwLock::new(ModelSelection {
            llm: config.default_llm.clone(),
            model: config.default_model.clone(),
        }),
        db,
        logs: logs.clone(),
        config,
    };

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(data.config.command_prefix.clone()),
                case_insensitive_commands: true,
                ..Default::default()
            },
            owners,
            on_error: |error| Box::pin(commands::on_error(error)),
            post_command: |ctx| Box::pin(commands::post_command(ctx)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(events::handle(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                match data.config.guild_id {
                    Some(guild_id) => {
                        let guild_id = serenity::GuildId::new(guild_id);
                        poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id)
                            .await?;
                        info!("Synced commands with guild: {}", guild_id);
                    }
                    None => {
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?;
                        info!("Synced commands globally");
                    }
                }

                if let Some(channel_id) = data.config.home_channel_id {
                    let greeting = format!("{} is online", ready.user.name);
                    if let Err(e) = serenity::ChannelId::new(channel_id).say(&ctx.http, greeting).await {
                        warn!("Failed to greet home channel {}: {}", channel_id, e);
                    }
                }

                info!("Bot is ready as {}", ready.user.name);
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let mut client = serenity::ClientBuilder::new(&discord_token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
            shard_manager.shutdown_all().await;
        }
    });

    info!("Starting bot...");
    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    retention.abort();
    logs.shutdown().await;
    Ok(())
}
