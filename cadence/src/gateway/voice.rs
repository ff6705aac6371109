use twilight_gateway::Event;
use twilight_model::gateway::payload::incoming::{VoiceServerUpdate, VoiceStateUpdate};

use crate::{core::model::BotState, error::gateway::ProcessResult};

use super::Process;

/// Hands voice signalling to the audio node. Runs inline with the gateway
/// loop so the node sees updates in the order Discord sent them.
pub fn forward_to_lavalink(bot: &BotState, event: &Event) {
    match event {
        Event::VoiceServerUpdate(e) => {
            bot.lavalink()
                .handle_voice_server_update(e.guild_id, e.token.clone(), e.endpoint.clone());
        }
        Event::VoiceStateUpdate(e) => {
            let Some(guild_id) = e.guild_id else {
                return;
            };
            bot.lavalink().handle_voice_state_update(
                guild_id,
                e.channel_id,
                e.user_id,
                e.session_id.clone(),
            );
        }
        _ => {}
    }
}

pub(super) struct StateContext<'a> {
    inner: &'a VoiceStateUpdate,
    bot: &'a BotState,
}

pub(super) struct ServerContext<'a> {
    inner: &'a VoiceServerUpdate,
    bot: &'a BotState,
}

impl BotState {
    pub(super) const fn as_voice_state_update_context<'a>(
        &'a self,
        inner: &'a VoiceStateUpdate,
    ) -> StateContext<'a> {
        StateContext { inner, bot: self }
    }

    pub(super) const fn as_voice_server_update_context<'a>(
        &'a self,
        inner: &'a VoiceServerUpdate,
    ) -> ServerContext<'a> {
        ServerContext { inner, bot: self }
    }
}

impl Process for StateContext<'_> {
    async fn process(self) -> ProcessResult {
        if self.inner.user_id != self.bot.user_id() {
            return Ok(());
        }
        let Some(guild_id) = self.inner.guild_id else {
            return Ok(());
        };
        let Some(session) = self.bot.sessions().get(guild_id).await else {
            return Ok(());
        };

        tracing::debug!(?guild_id, channel_id = ?self.inner.channel_id, "own voice state changed");
        session
            .voice()
            .transport()
            .on_voice_state(self.inner.channel_id);
        Ok(())
    }
}

impl Process for ServerContext<'_> {
    async fn process(self) -> ProcessResult {
        let guild_id = self.inner.guild_id;
        let Some(session) = self.bot.sessions().get(guild_id).await else {
            return Ok(());
        };

        tracing::debug!(?guild_id, endpoint = ?self.inner.endpoint, "voice server changed");
        session
            .voice()
            .transport()
            .on_voice_server(self.inner.endpoint.as_deref());
        Ok(())
    }
}
