use std::sync::Arc;

use cadence_ext::pretty::{numbered::PrettyNumbered, truncate::PrettyTruncator};
use linkify::{LinkFinder, LinkKind};
use twilight_mention::Mention;
use twilight_model::{
    gateway::payload::incoming::MessageCreate,
    id::{
        Id,
        marker::{ChannelMarker, GuildMarker},
    },
};

use crate::{
    component::{minigame, roulette},
    core::{
        konst::{
            connection::READY_TIMEOUT,
            exit_code,
            misc::{QUEUE_LIST_LIMIT, TRACK_REF_DISPLAY_LIMIT},
            text,
        },
        model::{BotState, CacheAware, HttpAware, OwnedBotState},
    },
    error::{
        gateway::{ProcessError, ProcessResult},
        player::PlayerError,
    },
    player::{PlayOutcome, SkipOutcome},
    session::GuildSession,
    voice::ConnectionState,
};

use super::Process;

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Join,
    Leave,
    Play(Option<&'a str>),
    Queue(Option<&'a str>),
    Skip,
    Stop,
    Repeat,
    NowPlaying,
    List,
    Roulette {
        timer: Option<&'a str>,
        max_players: Option<&'a str>,
    },
}

impl<'a> Command<'a> {
    fn parse(content: &'a str, prefix: &str) -> Option<Self> {
        let rest = content.trim_start().strip_prefix(prefix)?;
        let mut words = rest.split_whitespace();
        let name = words.next()?.to_ascii_lowercase();

        let command = match name.as_str() {
            "join" => Self::Join,
            "leave" => Self::Leave,
            "play" => Self::Play(track_argument(rest, words.next())),
            "queue" => Self::Queue(track_argument(rest, words.next())),
            "skip" => Self::Skip,
            "stop" => Self::Stop,
            "repeat" => Self::Repeat,
            "np" => Self::NowPlaying,
            "list" => Self::List,
            "roulette" => Self::Roulette {
                timer: words.next(),
                max_players: words.next(),
            },
            _ => return None,
        };
        Some(command)
    }
}

fn first_url(text: &str) -> Option<&str> {
    LinkFinder::new()
        .kinds(&[LinkKind::Url])
        .links(text)
        .next()
        .map(|link| link.as_str())
}

/// The first link in `rest`, else the first argument as typed, so that bare
/// video ids reach the resolver.
fn track_argument<'a>(rest: &'a str, first_word: Option<&'a str>) -> Option<&'a str> {
    first_url(rest).or_else(|| first_word.map(|word| word.trim_matches(['<', '>'])))
}

fn parse_number<T: std::str::FromStr>(raw: Option<&str>) -> Result<Option<T>, String> {
    raw.map(|raw| {
        raw.parse()
            .map_err(|_| format!("{} `{raw}` is not a number.", exit_code::INVALID))
    })
    .transpose()
}

pub(super) struct Context {
    inner: Box<MessageCreate>,
    bot: OwnedBotState,
}

impl BotState {
    pub(super) const fn into_message_create_context(
        self: Arc<Self>,
        inner: Box<MessageCreate>,
    ) -> Context {
        Context { inner, bot: self }
    }
}

impl Context {
    fn channel_id(&self) -> Id<ChannelMarker> {
        self.inner.channel_id
    }

    async fn reply(&self, content: &str) -> ProcessResult {
        self.bot
            .http()
            .create_message(self.channel_id())
            .content(content)
            .await?;
        Ok(())
    }

    /// Joins the author's voice channel and waits for the link. Replies and
    /// returns `false` if that is not possible.
    async fn join_author(
        &self,
        guild_id: Id<GuildMarker>,
        session: &GuildSession,
    ) -> Result<bool, ProcessError> {
        let channel_id = self
            .bot
            .cache()
            .voice_state(self.inner.author.id, guild_id)
            .map(|state| state.channel_id());
        let Some(channel_id) = channel_id else {
            self.reply(&format!(
                "{} Join a voice channel first.",
                exit_code::INVALID
            ))
            .await?;
            return Ok(false);
        };

        let joined = match session.voice().join(channel_id).await {
            Ok(()) => session.voice().ready(READY_TIMEOUT).await,
            Err(error) => Err(error),
        };
        if let Err(error) = joined {
            self.reply(&format!("{} {error}", exit_code::KNOWN_ERROR))
                .await?;
            return Ok(false);
        }
        Ok(true)
    }

    async fn report_player_error(&self, error: PlayerError) -> ProcessResult {
        match error {
            PlayerError::TransportUnavailable(e) => {
                self.reply(&format!("{} {e}.", exit_code::INVALID)).await
            }
            PlayerError::Gone(e) => Err(e.into()),
        }
    }

    async fn session(&self, guild_id: Id<GuildMarker>) -> Option<Arc<GuildSession>> {
        self.bot.sessions().get(guild_id).await
    }

    async fn not_connected(&self) -> ProcessResult {
        self.reply(&format!(
            "{} Not connected to a voice channel.",
            exit_code::INVALID
        ))
        .await
    }

    async fn execute(&self, guild_id: Id<GuildMarker>, command: Command<'_>) -> ProcessResult {
        match command {
            Command::Join => self.join(guild_id).await,
            Command::Leave => self.leave(guild_id).await,
            Command::Play(None) | Command::Queue(None) => {
                self.reply(&format!(
                    "{} Give me a YouTube or Spotify track link.",
                    exit_code::INVALID
                ))
                .await
            }
            Command::Play(Some(url)) => self.play(guild_id, url).await,
            Command::Queue(Some(url)) => self.queue(guild_id, url).await,
            Command::Skip => self.skip(guild_id).await,
            Command::Stop => self.stop(guild_id).await,
            Command::Repeat => self.repeat(guild_id).await,
            Command::NowPlaying => self.now_playing(guild_id).await,
            Command::List => self.list(guild_id).await,
            Command::Roulette { timer, max_players } => self.roulette(timer, max_players).await,
        }
    }

    async fn join(&self, guild_id: Id<GuildMarker>) -> ProcessResult {
        let session = self.bot.sessions().get_or_create(guild_id, &self.bot).await;
        if !self.join_author(guild_id, &session).await? {
            return Ok(());
        }
        if let Some(channel_id) = session.voice().channel_id() {
            self.reply(&format!("🔊 Joined {}.", channel_id.mention()))
                .await?;
        }
        Ok(())
    }

    async fn leave(&self, guild_id: Id<GuildMarker>) -> ProcessResult {
        let Some(session) = self.bot.sessions().remove(guild_id).await else {
            return self.not_connected().await;
        };
        session.player().stop().await?;
        session.voice().leave().await?;
        self.reply("👋 Left the voice channel.").await
    }

    async fn play(&self, guild_id: Id<GuildMarker>, url: &str) -> ProcessResult {
        let session = self.bot.sessions().get_or_create(guild_id, &self.bot).await;
        if session.voice().state() == ConnectionState::Disconnected
            && !self.join_author(guild_id, &session).await?
        {
            return Ok(());
        }
        match session.player().play(url, self.channel_id()).await {
            Ok(outcome) => self.report_outcome(url, outcome).await,
            Err(error) => self.report_player_error(error).await,
        }
    }

    async fn queue(&self, guild_id: Id<GuildMarker>, url: &str) -> ProcessResult {
        let Some(session) = self.session(guild_id).await else {
            return self.not_connected().await;
        };
        match session.player().enqueue(url).await {
            Ok(outcome) => self.report_outcome(url, outcome).await,
            Err(error) => self.report_player_error(error).await,
        }
    }

    async fn skip(&self, guild_id: Id<GuildMarker>) -> ProcessResult {
        let Some(session) = self.session(guild_id).await else {
            return self.not_connected().await;
        };
        match session.player().skip().await {
            Ok(SkipOutcome::Skipped(track)) => {
                self.reply(&format!(
                    "⏭️ Skipping to <{}>.",
                    track.pretty_truncate(TRACK_REF_DISPLAY_LIMIT)
                ))
                .await
            }
            Ok(SkipOutcome::QueueEmpty) => {
                let output = session.player().snapshot().await?.output;
                if output == Some(self.channel_id()) {
                    return Ok(());
                }
                self.reply(&format!("{} {}", exit_code::NOTICE, text::QUEUE_EMPTY))
                    .await
            }
            Err(error) => self.report_player_error(error).await,
        }
    }

    async fn stop(&self, guild_id: Id<GuildMarker>) -> ProcessResult {
        let Some(session) = self.session(guild_id).await else {
            return self.not_connected().await;
        };
        session.player().stop().await?;
        self.reply("⏹️ Stopped and cleared the queue.").await
    }

    async fn repeat(&self, guild_id: Id<GuildMarker>) -> ProcessResult {
        let session = self.bot.sessions().get_or_create(guild_id, &self.bot).await;
        let content = if session.player().toggle_repeat().await? {
            "🔁 Repeat is now **on**."
        } else {
            "➡️ Repeat is now **off**."
        };
        self.reply(content).await
    }

    async fn now_playing(&self, guild_id: Id<GuildMarker>) -> ProcessResult {
        let current = match self.session(guild_id).await {
            Some(session) => session.player().snapshot().await?.current,
            None => None,
        };
        let content = current.map_or_else(
            || format!("{} {}", exit_code::NOTICE, text::NOTHING_PLAYING),
            |track| {
                format!(
                    "🎶 Now playing <{}>",
                    track.pretty_truncate(TRACK_REF_DISPLAY_LIMIT)
                )
            },
        );
        self.reply(&content).await
    }

    async fn list(&self, guild_id: Id<GuildMarker>) -> ProcessResult {
        let queue = match self.session(guild_id).await {
            Some(session) => session.player().snapshot().await?.queue,
            None => Vec::new(),
        };
        if queue.is_empty() {
            return self
                .reply(&format!("{} Nothing is queued.", exit_code::NOTICE))
                .await;
        }

        let listed = queue
            .iter()
            .map(|track| format!("<{}>", track.pretty_truncate(TRACK_REF_DISPLAY_LIMIT)))
            .collect::<Vec<_>>();
        self.reply(&format!(
            "📃 **Up next**\n{}",
            listed.pretty_numbered(QUEUE_LIST_LIMIT)
        ))
        .await
    }

    async fn roulette(&self, timer: Option<&str>, max_players: Option<&str>) -> ProcessResult {
        let options = parse_number(timer).and_then(|timer| {
            let max_players = parse_number(max_players)?;
            roulette::Options::new(timer, max_players)
                .map_err(|e| format!("{} {e}.", exit_code::INVALID))
        });
        match options {
            Ok(options) => Ok(roulette::run(&self.bot, self.channel_id(), options).await?),
            Err(content) => self.reply(&content).await,
        }
    }

    async fn report_outcome(&self, url: &str, outcome: PlayOutcome) -> ProcessResult {
        match outcome {
            PlayOutcome::Started => Ok(()),
            PlayOutcome::Queued { position } => {
                self.reply(&format!(
                    "➕ Queued <{}> at position `#{position}`.",
                    url.pretty_truncate(TRACK_REF_DISPLAY_LIMIT)
                ))
                .await
            }
        }
    }
}

impl Process for Context {
    async fn process(self) -> ProcessResult {
        let message = &self.inner;
        if minigame::detect(message, &self.bot.config().minigame).is_some() {
            return Ok(());
        }
        if message.author.bot {
            return Ok(());
        }
        let Some(guild_id) = message.guild_id else {
            return Ok(());
        };
        let Some(command) = Command::parse(&message.content, &self.bot.config().command_prefix)
        else {
            return Ok(());
        };

        tracing::debug!(?guild_id, ?command, author = ?message.author.id, "received command");
        self.execute(guild_id, command).await
    }
}
