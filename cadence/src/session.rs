use std::{collections::HashMap, sync::Arc};

use cadence_ext::pretty::truncate::PrettyTruncator;
use tokio::{
    sync::{RwLock, broadcast},
    task::AbortHandle,
};
use twilight_http::Client;
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, GuildMarker},
};

use crate::{
    core::{
        konst::misc::TRACK_REF_DISPLAY_LIMIT,
        model::{BotState, HttpAware, OwnedHttpAware},
    },
    error::player::OutputError,
    lavalink::{LavalinkSession, LavalinkSource, LavalinkTransport},
    player::{self, Event, Output, PlayerHandle},
    resolve::TrackResolver,
    voice::VoiceManager,
};

/// Everything the bot runs for one guild: a player and its voice link.
pub struct GuildSession {
    player: PlayerHandle,
    voice: VoiceManager<LavalinkTransport>,
    announcer: AbortHandle,
}

impl GuildSession {
    fn new(guild_id: Id<GuildMarker>, bot: &BotState) -> Self {
        let lavalink = bot.lavalink().clone();
        let voice = VoiceManager::new(LavalinkTransport::new(
            guild_id,
            bot.sender().clone(),
            lavalink.clone(),
        ));

        let resolver = TrackResolver::new(
            LavalinkSource::new(lavalink.clone(), guild_id),
            bot.spotify().clone(),
            bot.youtube().clone(),
        );
        let player = player::spawn(
            resolver,
            LavalinkSession::new(lavalink, guild_id),
            HttpOutput::new(bot.http_owned()),
            voice.subscribe(),
            bot.config().resolve_timeout,
        );

        let announcer = tokio::spawn(announce(player.clone(), bot.http_owned())).abort_handle();
        Self {
            player,
            voice,
            announcer,
        }
    }

    pub const fn player(&self) -> &PlayerHandle {
        &self.player
    }

    pub const fn voice(&self) -> &VoiceManager<LavalinkTransport> {
        &self.voice
    }
}

impl Drop for GuildSession {
    fn drop(&mut self) {
        self.announcer.abort();
    }
}

/// The guild sessions the bot currently runs.
#[derive(Default)]
pub struct Sessions(RwLock<HashMap<Id<GuildMarker>, Arc<GuildSession>>>);

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, guild_id: Id<GuildMarker>) -> Option<Arc<GuildSession>> {
        self.0.read().await.get(&guild_id).cloned()
    }

    pub async fn get_or_create(
        &self,
        guild_id: Id<GuildMarker>,
        bot: &BotState,
    ) -> Arc<GuildSession> {
        if let Some(session) = self.get(guild_id).await {
            return session;
        }
        self.0
            .write()
            .await
            .entry(guild_id)
            .or_insert_with(|| {
                tracing::debug!(?guild_id, "starting guild session");
                Arc::new(GuildSession::new(guild_id, bot))
            })
            .clone()
    }

    pub async fn remove(&self, guild_id: Id<GuildMarker>) -> Option<Arc<GuildSession>> {
        self.0.write().await.remove(&guild_id)
    }

    pub async fn all(&self) -> Vec<Arc<GuildSession>> {
        self.0.read().await.values().cloned().collect()
    }
}

/// Sends status and errors as plain messages to a text channel.
pub struct HttpOutput {
    http: Arc<Client>,
}

impl HttpOutput {
    pub const fn new(http: Arc<Client>) -> Self {
        Self { http }
    }
}

impl HttpAware for HttpOutput {
    fn http(&self) -> &Client {
        &self.http
    }
}

impl Output for HttpOutput {
    type Error = OutputError;

    async fn send(&self, channel: Id<ChannelMarker>, content: &str) -> Result<(), OutputError> {
        self.http().create_message(channel).content(content).await?;
        Ok(())
    }
}

/// Announces what the player starts playing, in the channel it was asked in.
#[tracing::instrument(skip_all, name = "announce")]
async fn announce(player: PlayerHandle, http: Arc<Client>) {
    let output = HttpOutput::new(http);
    let mut events = player.subscribe();
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "announcer lagged behind player events");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match event {
            Event::Playing(track) => {
                let Ok(snapshot) = player.snapshot().await else {
                    break;
                };
                let Some(channel) = snapshot.output else {
                    continue;
                };
                let content = format!(
                    "🎶 Now playing <{}>",
                    track.pretty_truncate(TRACK_REF_DISPLAY_LIMIT)
                );
                if let Err(error) = output.send(channel, &content).await {
                    tracing::warn!(%error, "announcing the playing track failed");
                }
            }
            Event::Queued(track) => tracing::debug!(%track, "queued"),
            Event::Connected => tracing::debug!("voice connected"),
            Event::ConnectionLost => tracing::info!("voice connection lost"),
            Event::Error { message, cause } => tracing::warn!(%cause, "{message}"),
        }
    }
}
