mod session;
mod source;
mod track;
mod transport;

use std::sync::Arc;

use lavalink_rs::{
    client::LavalinkClient,
    hook,
    model::events::{Events, Ready, WebSocketClosed},
};
use twilight_model::id::{Id, marker::GuildMarker};

use crate::session::{GuildSession, Sessions};

pub use self::{session::LavalinkSession, source::LavalinkSource, transport::LavalinkTransport};

/// Data shared with every lavalink event hook.
pub struct ClientData {
    sessions: Arc<Sessions>,
}

pub type OwnedClientData = Arc<ClientData>;

impl ClientData {
    pub const fn new(sessions: Arc<Sessions>) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }
}

/// Finds the session of the guild a lavalink event is about.
async fn session_of(
    lavalink: &LavalinkClient,
    guild_id: lavalink_rs::model::GuildId,
) -> Option<Arc<GuildSession>> {
    let guild_id = Id::<GuildMarker>::new_checked(guild_id.0)?;
    let data = match lavalink.data::<ClientData>() {
        Ok(data) => data,
        Err(error) => {
            tracing::error!(?error, "lavalink client carries no data");
            return None;
        }
    };
    data.sessions().get(guild_id).await
}

#[hook]
async fn ready(_: LavalinkClient, session_id: String, event: &Ready) {
    tracing::info!(
        session_id,
        resumed = event.resumed,
        "lavalink node is ready"
    );
}

#[hook]
async fn websocket_closed(lavalink: LavalinkClient, _: String, event: &WebSocketClosed) {
    tracing::warn!(?event, "voice websocket closed");
    if let Some(session) = session_of(&lavalink, event.guild_id).await {
        session.voice().transport().on_link_dropped();
    }
}

pub fn handlers() -> Events {
    Events {
        ready: Some(ready),
        track_start: Some(track::start),
        track_end: Some(track::end),
        track_exception: Some(track::exception),
        track_stuck: Some(track::stuck),
        websocket_closed: Some(websocket_closed),
        ..Default::default()
    }
}
