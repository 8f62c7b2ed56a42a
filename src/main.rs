pub mod bot;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;

use std::process;
use std::sync::Arc;

use poise::serenity_prelude::{Client, GatewayIntents, Http};
use poise::CreateReply;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::bot::DiscordNotifier;
use crate::commands::giveaway::manager::GiveawayManager;
use crate::commands::{giveaway_command, help_command};
use crate::config::Config;
use crate::error::Error;
use crate::state::BotState;
use crate::storage::JsonFileStorage;

async fn on_error(error: poise::FrameworkError<'_, BotState, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start the bot: {}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            warn!(command = %ctx.command().qualified_name, user = %ctx.author().name, "{}", error);
            let reply = CreateReply::default().content(error.to_string()).ephemeral(true);
            if let Err(err) = ctx.send(reply).await {
                error!("Can't reply to the command: {}", err);
            }
        }
        error => {
            if let Err(err) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", err);
            }
        }
    }
}

fn build_manager(config: &Config) -> Arc<GiveawayManager> {
    let http = Arc::new(Http::new(&config.token));
    let mut manager = GiveawayManager::new(config.engine).with_notifier(Arc::new(DiscordNotifier::new(http)));

    if let Some(path) = config.state_path.as_ref() {
        info!("The giveaways are saved into {}", path.display());
        manager = manager.with_storage(Arc::new(JsonFileStorage::new(path)));
    }

    Arc::new(manager)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            process::exit(1);
        }
    };

    let manager = build_manager(&config);
    let setup_manager = manager.clone();
    let framework = poise::Framework::<BotState, Error>::builder()
        .options(poise::FrameworkOptions {
            commands: vec![help_command(), giveaway_command()],
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, state| {
                Box::pin(bot::event_handler(ctx, event, framework, state))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                if let Err(err) = setup_manager.restore().await {
                    error!("Can't restore the saved giveaways: {}", err);
                }
                Ok(BotState::new(setup_manager))
            })
        })
        .build();

    let intents = GatewayIntents::non_privileged() | GatewayIntents::GUILD_MESSAGE_REACTIONS;
    let mut client = match Client::builder(&config.token, intents).framework(framework).await {
        Ok(client) => client,
        Err(err) => {
            error!("Cannot create a Discord client: {}", err);
            process::exit(1);
        }
    };

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down the bot");
            shard_manager.shutdown_all().await;
        }
    });

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    manager.shutdown().await;
}
