use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use lavalink_rs::{client::LavalinkClient, model::client::NodeDistributionStrategy};
use tokio::task::JoinHandle;
use twilight_cache_inmemory::InMemoryCache;
use twilight_gateway::{
    CloseFrame, Event, EventTypeFlags, Intents, MessageSender, Shard, ShardId, StreamExt,
};
use twilight_http::{Client, client::ClientBuilder};
use twilight_model::{
    channel::message::AllowedMentions,
    id::{Id, marker::UserMarker},
};

use crate::{
    lavalink::{ClientData, OwnedClientData, handlers},
    resolve::{spotify::SpotifyClient, youtube::YouTubeSearch},
    session::Sessions,
};

use super::{
    core::{
        model::{BotState, CacheAware, Config, OwnedBotState},
        traced,
    },
    error::runner::{StartError, WaitForSignalError, WaitUntilShutdownError},
    gateway,
};

const INTENTS: Intents = Intents::GUILDS
    .union(Intents::GUILD_VOICE_STATES)
    .union(Intents::GUILD_MESSAGES)
    .union(Intents::GUILD_MESSAGE_REACTIONS)
    .union(Intents::MESSAGE_CONTENT);

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

fn build_http_client(token: &str) -> Arc<Client> {
    ClientBuilder::default()
        .default_allowed_mentions(AllowedMentions::default())
        .token(token.to_owned())
        .build()
        .into()
}

pub async fn start(config: Config) -> Result<(), StartError> {
    tracing::debug!("began starting the bot");

    let http = build_http_client(&config.token);
    let user_id = http.current_user().await?.model().await?.id;

    let cache = Arc::new(InMemoryCache::new());
    let sessions = Arc::new(Sessions::new());
    let data = Arc::new(ClientData::new(sessions.clone()));
    let lavalink = build_lavalink_client(&config, user_id, data).await;

    let providers = reqwest::Client::builder().build()?;
    let spotify = SpotifyClient::new(
        providers.clone(),
        config.spotify_client_id.clone(),
        config.spotify_client_secret.clone(),
    );
    spotify.warm_up().await;
    let youtube = YouTubeSearch::new(providers, config.youtube_api_key.as_str());

    let shard = Shard::new(ShardId::ONE, config.token.clone(), INTENTS);
    let sender = shard.sender();
    let bot = Arc::new(BotState::new(
        config,
        user_id,
        http,
        cache,
        sender.clone(),
        lavalink,
        sessions,
        spotify,
        youtube,
    ));

    let task = tokio::spawn(handle_gateway_events(shard, bot.clone()));
    Ok(wait_until_shutdown(sender, task, &bot).await?)
}

#[tracing::instrument(skip_all, name = "lavalink")]
async fn build_lavalink_client(
    config: &Config,
    user_id: Id<UserMarker>,
    data: OwnedClientData,
) -> LavalinkClient {
    let events = handlers();

    let nodes = Vec::from([lavalink_rs::node::NodeBuilder {
        hostname: config.lavalink_host.clone(),
        password: config.lavalink_password.clone(),
        user_id: user_id.into(),
        ..Default::default()
    }]);

    let strategy = NodeDistributionStrategy::new();
    LavalinkClient::new_with_data(events, nodes, strategy, data).await
}

#[tracing::instrument(skip_all, name = "gateway")]
async fn handle_gateway_events(mut shard: Shard, bot: OwnedBotState) {
    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        let event = match item {
            Ok(Event::GatewayClose(_)) if SHUTDOWN.load(Ordering::Relaxed) => break,
            Ok(event) => event,
            Err(source) => {
                tracing::warn!(?source, "error receiving event");

                continue;
            }
        };

        tracing::trace!(?event, shard = ?shard.id(), "received event");
        process_gateway_events(event, bot.clone());
    }
}

fn process_gateway_events(event: Event, bot: OwnedBotState) {
    bot.cache().update(&event);
    bot.standby().process(&event);
    gateway::forward_to_lavalink(&bot, &event);

    traced::tokio_spawn(gateway::process(bot, event));
}

#[tracing::instrument]
async fn wait_for_signal() -> Result<(), WaitForSignalError> {
    #[cfg(target_family = "unix")]
    {
        use tokio::signal::unix::{self, SignalKind};

        let mut sigint = unix::signal(SignalKind::interrupt())?;
        let mut sigterm = unix::signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => tracing::debug!("received SIGINT"),
            _ = sigterm.recv() => tracing::debug!("received SIGTERM"),
        }
    }

    #[cfg(not(target_family = "unix"))]
    {
        use tokio::signal;

        signal::ctrl_c().await?;
    }

    Ok(())
}

#[tracing::instrument(skip_all, name = "shutdown")]
async fn wait_until_shutdown(
    sender: MessageSender,
    task: JoinHandle<()>,
    bot: &BotState,
) -> Result<(), WaitUntilShutdownError> {
    wait_for_signal().await?;
    SHUTDOWN.store(true, Ordering::Relaxed);
    tracing::info!("gracefully shutting down...");

    tracing::debug!("stopping all guild sessions...");
    for session in bot.sessions().all().await {
        let _ = session.player().stop().await;
        if let Err(error) = session.voice().leave().await {
            tracing::warn!(%error, "leaving voice during shutdown failed");
        }
    }

    tracing::debug!("sending a close frame to the shard...");
    let _ = sender.close(CloseFrame::NORMAL);

    tracing::debug!("killing the shard gateway event handler...");
    let _ = task.await;

    tracing::info!("shut down gracefully");
    Ok(())
}
