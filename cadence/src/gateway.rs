mod message;
mod voice;

use twilight_gateway::Event;

use crate::{core::model::OwnedBotState, error::gateway::ProcessResult};

pub use self::voice::forward_to_lavalink;

trait Process {
    async fn process(self) -> ProcessResult;
}

pub async fn process(bot: OwnedBotState, event: Event) -> ProcessResult {
    match event {
        Event::Ready(ref e) => {
            tracing::info!(user = %e.user.name, guilds = e.guilds.len(), "gateway is ready");
            Ok(())
        }
        Event::MessageCreate(e) => bot.into_message_create_context(e).process().await,
        Event::VoiceStateUpdate(ref e) => bot.as_voice_state_update_context(e).process().await,
        Event::VoiceServerUpdate(ref e) => bot.as_voice_server_update_context(e).process().await,
        _ => Ok(()),
    }
}
