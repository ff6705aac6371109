use std::{collections::HashSet, str::FromStr, sync::Arc, time::Duration};

use lavalink_rs::client::LavalinkClient;
use twilight_cache_inmemory::InMemoryCache;
use twilight_gateway::MessageSender;
use twilight_http::Client;
use twilight_model::id::{
    Id,
    marker::{ApplicationMarker, GuildMarker, UserMarker},
};
use twilight_standby::Standby;

use crate::{
    error::core::ConfigError,
    resolve::{spotify::SpotifyClient, youtube::YouTubeSearch},
    session::Sessions,
};

use super::konst;

#[derive(Debug, Clone)]
pub struct MinigameConfig {
    pub application_id: Id<ApplicationMarker>,
    pub ignored_guilds: HashSet<Id<GuildMarker>>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub lavalink_host: String,
    pub lavalink_password: String,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub youtube_api_key: String,
    pub command_prefix: String,
    pub resolve_timeout: Duration,
    pub minigame: MinigameConfig,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Fails if a required key is missing or any value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let optional = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());

        let resolve_timeout = optional("RESOLVE_TIMEOUT_SECS")
            .map(|value| match value.trim().parse::<u64>() {
                Ok(secs) if secs != 0 => Ok(Duration::from_secs(secs)),
                _ => Err(ConfigError::Invalid {
                    key: "RESOLVE_TIMEOUT_SECS",
                    value,
                }),
            })
            .transpose()?
            .unwrap_or(konst::misc::DEFAULT_RESOLVE_TIMEOUT);

        let application_id = optional("MINIGAME_APPLICATION_ID")
            .map(|value| parse_id("MINIGAME_APPLICATION_ID", value))
            .transpose()?
            .unwrap_or_else(|| Id::new(konst::minigame::DEFAULT_APPLICATION_ID));

        let ignored_guilds = match optional("MINIGAME_IGNORED_GUILDS") {
            Some(value) => value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| parse_id("MINIGAME_IGNORED_GUILDS", s.to_owned()))
                .collect::<Result<_, _>>()?,
            None => konst::minigame::DEFAULT_IGNORED_GUILDS
                .iter()
                .map(|&id| Id::new(id))
                .collect(),
        };

        Ok(Self {
            token: required("BOT_TOKEN")?,
            lavalink_host: required("LAVALINK_HOST")?,
            lavalink_password: required("LAVALINK_PASSWORD")?,
            spotify_client_id: required("SPOTIFY_CLIENT_ID")?,
            spotify_client_secret: required("SPOTIFY_CLIENT_SECRET")?,
            youtube_api_key: required("YOUTUBE_API_KEY")?,
            command_prefix: optional("COMMAND_PREFIX")
                .unwrap_or_else(|| String::from(konst::misc::DEFAULT_COMMAND_PREFIX)),
            resolve_timeout,
            minigame: MinigameConfig {
                application_id,
                ignored_guilds,
            },
        })
    }
}

fn parse_id<T>(key: &'static str, value: String) -> Result<Id<T>, ConfigError> {
    u64::from_str(value.trim())
        .ok()
        .and_then(Id::new_checked)
        .ok_or(ConfigError::Invalid { key, value })
}

pub trait HttpAware {
    fn http(&self) -> &Client;
}

pub trait OwnedHttpAware {
    fn http_owned(&self) -> Arc<Client>;
}

pub trait CacheAware {
    fn cache(&self) -> &InMemoryCache;
}

pub struct BotState {
    config: Config,
    user_id: Id<UserMarker>,
    http: Arc<Client>,
    cache: Arc<InMemoryCache>,
    standby: Standby,
    sender: MessageSender,
    lavalink: LavalinkClient,
    sessions: Arc<Sessions>,
    spotify: SpotifyClient,
    youtube: YouTubeSearch,
}

pub type OwnedBotState = Arc<BotState>;

impl BotState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        user_id: Id<UserMarker>,
        http: Arc<Client>,
        cache: Arc<InMemoryCache>,
        sender: MessageSender,
        lavalink: LavalinkClient,
        sessions: Arc<Sessions>,
        spotify: SpotifyClient,
        youtube: YouTubeSearch,
    ) -> Self {
        Self {
            config,
            user_id,
            http,
            cache,
            standby: Standby::new(),
            sender,
            lavalink,
            sessions,
            spotify,
            youtube,
        }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn user_id(&self) -> Id<UserMarker> {
        self.user_id
    }

    pub const fn standby(&self) -> &Standby {
        &self.standby
    }

    pub const fn sender(&self) -> &MessageSender {
        &self.sender
    }

    pub const fn lavalink(&self) -> &LavalinkClient {
        &self.lavalink
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    pub const fn spotify(&self) -> &SpotifyClient {
        &self.spotify
    }

    pub const fn youtube(&self) -> &YouTubeSearch {
        &self.youtube
    }
}

impl HttpAware for BotState {
    fn http(&self) -> &Client {
        &self.http
    }
}

impl OwnedHttpAware for BotState {
    fn http_owned(&self) -> Arc<Client> {
        self.http.clone()
    }
}

impl CacheAware for BotState {
    fn cache(&self) -> &InMemoryCache {
        &self.cache
    }
}
