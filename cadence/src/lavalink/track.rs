use lavalink_rs::{
    client::LavalinkClient,
    hook,
    model::{
        events::{TrackEnd, TrackEndReason, TrackException, TrackStart, TrackStuck},
        track::TrackData,
    },
};

use crate::{error::lavalink::ProcessResult, player::SessionEvent};

use super::{session::ticket_of, session_of};

async fn forward(
    lavalink: &LavalinkClient,
    guild_id: lavalink_rs::model::GuildId,
    track: &TrackData,
    event: SessionEvent,
) -> ProcessResult {
    let Some(ticket) = ticket_of(track) else {
        tracing::warn!(?guild_id, "track carries no ticket");
        return Ok(());
    };
    let Some(session) = session_of(lavalink, guild_id).await else {
        tracing::trace!(?guild_id, "track event without session");
        return Ok(());
    };
    Ok(session.player().session_event(ticket, event)?)
}

#[tracing::instrument(err, skip_all, name = "track_start")]
async fn impl_start(lavalink: LavalinkClient, _: String, event: &TrackStart) -> ProcessResult {
    tracing::debug!(
        "guild {} started {}",
        event.guild_id.0,
        event.track.info.title
    );
    forward(&lavalink, event.guild_id, &event.track, SessionEvent::Playing).await
}

#[tracing::instrument(err, skip_all, name = "track_end")]
async fn impl_end(lavalink: LavalinkClient, _: String, event: &TrackEnd) -> ProcessResult {
    tracing::debug!(
        "guild {} ended   {} ({:?})",
        event.guild_id.0,
        event.track.info.title,
        event.reason
    );

    let session_event = match event.reason {
        TrackEndReason::Finished | TrackEndReason::Stopped | TrackEndReason::Cleanup => {
            SessionEvent::Idle
        }
        TrackEndReason::LoadFailed => SessionEvent::Failed(String::from("the track failed to load")),
        TrackEndReason::Replaced => return Ok(()),
    };
    forward(&lavalink, event.guild_id, &event.track, session_event).await
}

#[tracing::instrument(err, skip_all, name = "track_exception")]
async fn impl_exception(
    lavalink: LavalinkClient,
    _: String,
    event: &TrackException,
) -> ProcessResult {
    tracing::error!(?event, "track exception");
    let cause = format!("{:?}", event.exception);
    forward(
        &lavalink,
        event.guild_id,
        &event.track,
        SessionEvent::Failed(cause),
    )
    .await
}

#[hook]
pub(super) async fn start(lavalink: LavalinkClient, session_id: String, event: &TrackStart) {
    let _ = impl_start(lavalink, session_id, event).await;
}

#[hook]
pub(super) async fn end(lavalink: LavalinkClient, session_id: String, event: &TrackEnd) {
    let _ = impl_end(lavalink, session_id, event).await;
}

#[hook]
pub(super) async fn exception(
    lavalink: LavalinkClient,
    session_id: String,
    event: &TrackException,
) {
    let _ = impl_exception(lavalink, session_id, event).await;
}

#[hook]
pub(super) async fn stuck(_: LavalinkClient, _: String, event: &TrackStuck) {
    tracing::warn!(?event, "track stuck");
}
