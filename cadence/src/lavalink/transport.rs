use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use lavalink_rs::client::LavalinkClient;
use tokio::sync::watch;
use twilight_gateway::MessageSender;
use twilight_model::{
    gateway::payload::outgoing::UpdateVoiceState,
    id::{
        Id,
        marker::{ChannelMarker, GuildMarker},
    },
};

use crate::{
    core::{konst::connection::GET_LAVALINK_CONNECTION_INFO_TIMEOUT, traced},
    error::voice::TransportError,
    voice::{LinkStatus, VoiceLink, VoiceTransport},
};

/// A guild's voice link: signalled over the gateway, carried by lavalink.
#[derive(Clone)]
pub struct LavalinkTransport {
    guild_id: Id<GuildMarker>,
    sender: MessageSender,
    lavalink: LavalinkClient,
    status: Arc<watch::Sender<LinkStatus>>,
    connecting: Arc<AtomicBool>,
}

impl LavalinkTransport {
    pub fn new(guild_id: Id<GuildMarker>, sender: MessageSender, lavalink: LavalinkClient) -> Self {
        Self {
            guild_id,
            sender,
            lavalink,
            status: Arc::new(watch::channel(LinkStatus::Destroyed).0),
            connecting: Arc::new(AtomicBool::new(false)),
        }
    }

    fn status(&self) -> LinkStatus {
        *self.status.borrow()
    }

    /// Moves the link to `new`, unless it has been destroyed.
    fn mark(&self, new: LinkStatus) {
        self.status.send_if_modified(|status| {
            if *status == LinkStatus::Destroyed || *status == new {
                return false;
            }
            tracing::trace!(from = ?*status, to = ?new, "voice link status changed");
            *status = new;
            true
        });
    }

    fn spawn_connect(&self) {
        if self.connecting.swap(true, Ordering::AcqRel) {
            return;
        }
        traced::tokio_spawn(self.clone().connect());
    }

    #[tracing::instrument(err, skip_all, name = "voice_connect")]
    async fn connect(self) -> Result<(), TransportError> {
        let result = self.establish().await;
        self.connecting.store(false, Ordering::Release);
        if result.is_err() {
            self.mark(LinkStatus::Disconnected);
        }
        result
    }

    async fn establish(&self) -> Result<(), TransportError> {
        let now = tokio::time::Instant::now();
        let info = self
            .lavalink
            .get_connection_info(self.guild_id, GET_LAVALINK_CONNECTION_INFO_TIMEOUT)
            .await?;
        tracing::debug!("getting lavalink connection info took {:?}", now.elapsed());

        self.mark(LinkStatus::Connecting);
        self.lavalink
            .create_player_context(self.guild_id, info)
            .await?;
        self.mark(LinkStatus::Ready);
        Ok(())
    }

    /// Follows the bot's own voice state as reported by the gateway.
    pub fn on_voice_state(&self, channel_id: Option<Id<ChannelMarker>>) {
        match (channel_id, self.status()) {
            (None, _) => self.mark(LinkStatus::Disconnected),
            (Some(_), LinkStatus::Disconnected) => self.mark(LinkStatus::Signalling),
            (Some(_), _) => {}
        }
    }

    /// Follows voice server assignments; a new server means a new player.
    pub fn on_voice_server(&self, endpoint: Option<&str>) {
        if endpoint.is_none() {
            self.mark(LinkStatus::Disconnected);
            return;
        }
        if self.status() == LinkStatus::Destroyed {
            return;
        }
        self.spawn_connect();
    }

    /// Lavalink lost its voice websocket to Discord.
    pub fn on_link_dropped(&self) {
        self.mark(LinkStatus::Disconnected);
    }
}

impl VoiceTransport for LavalinkTransport {
    type Error = TransportError;

    async fn join(&self, channel_id: Id<ChannelMarker>) -> Result<VoiceLink, TransportError> {
        self.status.send_replace(LinkStatus::Signalling);
        let status = self.status.subscribe();

        let update = UpdateVoiceState::new(self.guild_id, Some(channel_id), true, false);
        if let Err(error) = self.sender.command(&update) {
            self.status.send_replace(LinkStatus::Destroyed);
            return Err(error.into());
        }

        self.spawn_connect();
        Ok(VoiceLink { channel_id, status })
    }

    async fn destroy(&self) -> Result<(), TransportError> {
        self.status.send_replace(LinkStatus::Destroyed);

        let deleted = self.lavalink.delete_player(self.guild_id).await;
        self.sender
            .command(&UpdateVoiceState::new(self.guild_id, None, false, false))?;
        Ok(deleted?)
    }
}
