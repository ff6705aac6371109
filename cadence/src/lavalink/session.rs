use lavalink_rs::{
    client::LavalinkClient,
    model::{GuildId, track::TrackData},
};
use serde_json::{Value, json};

use crate::{
    error::lavalink::{NoPlayerError, SessionError},
    player::{PlaybackSession, Ticket},
};

/// Plays resolved tracks on the lavalink player of one guild.
pub struct LavalinkSession {
    lavalink: LavalinkClient,
    guild_id: GuildId,
}

impl LavalinkSession {
    pub fn new(lavalink: LavalinkClient, guild_id: impl Into<GuildId>) -> Self {
        Self {
            lavalink,
            guild_id: guild_id.into(),
        }
    }
}

impl PlaybackSession for LavalinkSession {
    type Resource = TrackData;
    type Error = SessionError;

    async fn load(&self, ticket: Ticket, mut track: TrackData) -> Result<(), SessionError> {
        let player = self
            .lavalink
            .get_player_context(self.guild_id)
            .ok_or(NoPlayerError)?;

        track.user_data = Some(tag(ticket));
        player.play_now(&track).await?;
        Ok(())
    }

    async fn halt(&self) -> Result<(), SessionError> {
        let Some(player) = self.lavalink.get_player_context(self.guild_id) else {
            return Ok(());
        };
        player.stop_now().await?;
        Ok(())
    }
}

/// Stamps a track with the ticket it was loaded under, so that its
/// lifecycle events can be matched up again.
fn tag(ticket: Ticket) -> Value {
    json!({ "ticket": ticket.get() })
}

pub(super) fn ticket_of(track: &TrackData) -> Option<Ticket> {
    track.user_data.as_ref().and_then(untag)
}

fn untag(value: &Value) -> Option<Ticket> {
    value.get("ticket").and_then(Value::as_u64).map(Ticket::new)
}
