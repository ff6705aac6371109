use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidTrackUrl {
    #[error("only YouTube video and Spotify track links are supported")]
    Unsupported,
    #[error("the Spotify link does not contain a track id")]
    MissingTrackId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Spotify,
    YouTube,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Spotify => "Spotify",
            Self::YouTube => "YouTube",
        })
    }
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("authenticating failed: {}", .0)]
    Authenticate(#[from] Arc<reqwest::Error>),
    #[error("track not found")]
    NotFound,
    #[error("track has no artist")]
    MissingArtist,
}

#[derive(Error, Debug)]
pub enum AcquisitionFailure {
    #[error(transparent)]
    Lavalink(#[from] lavalink_rs::error::LavalinkError),
    #[error("failed to load track: {}", .0)]
    LoadFailed(Box<str>),
    #[error("no track was loaded")]
    Empty,
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    InvalidTrackUrl(#[from] InvalidTrackUrl),
    #[error("no playable match found for \"{query}\"")]
    NoMatchFound { query: String },
    #[error("looking up the track on {provider} failed: {source}")]
    Lookup {
        provider: Provider,
        source: LookupError,
    },
    #[error(transparent)]
    Acquisition(#[from] AcquisitionFailure),
    #[error("resolving the track timed out")]
    TimedOut,
}
