use lavalink_rs::{
    client::LavalinkClient,
    model::{
        GuildId,
        track::{PlaylistData, Track as LoadedTracks, TrackData, TrackLoadData, TrackLoadType},
    },
};

use crate::{
    error::resolve::AcquisitionFailure,
    resolve::{DirectSource, UrlKind, youtube},
};

/// Acquires YouTube audio through the lavalink node of one guild.
#[derive(Clone)]
pub struct LavalinkSource {
    lavalink: LavalinkClient,
    guild_id: GuildId,
}

impl LavalinkSource {
    pub fn new(lavalink: LavalinkClient, guild_id: impl Into<GuildId>) -> Self {
        Self {
            lavalink,
            guild_id: guild_id.into(),
        }
    }
}

impl DirectSource for LavalinkSource {
    type Resource = TrackData;

    fn validate(&self, url: &str) -> UrlKind {
        youtube::validate(url)
    }

    #[tracing::instrument(err, skip(self), name = "acquire")]
    async fn open(&self, url: &str) -> Result<TrackData, AcquisitionFailure> {
        let loaded = self.lavalink.load_tracks(self.guild_id, url).await?;
        first_track(loaded)
    }
}

fn first_track(loaded: LoadedTracks) -> Result<TrackData, AcquisitionFailure> {
    match (loaded.load_type, loaded.data) {
        (TrackLoadType::Track, Some(TrackLoadData::Track(track))) => Ok(track),
        (TrackLoadType::Search, Some(TrackLoadData::Search(tracks)))
        | (TrackLoadType::Playlist, Some(TrackLoadData::Playlist(PlaylistData { tracks, .. }))) => {
            tracks.into_iter().next().ok_or(AcquisitionFailure::Empty)
        }
        (TrackLoadType::Error, Some(TrackLoadData::Error(error))) => {
            Err(AcquisitionFailure::LoadFailed(format!("{error:?}").into()))
        }
        (TrackLoadType::Error, _) => Err(AcquisitionFailure::LoadFailed(
            "the node could not load the track".into(),
        )),
        _ => Err(AcquisitionFailure::Empty),
    }
}
