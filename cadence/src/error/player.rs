use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("not connected to a voice channel")]
pub struct TransportUnavailable;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("player is no longer running")]
pub struct PlayerGone;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerError {
    #[error(transparent)]
    TransportUnavailable(#[from] TransportUnavailable),
    #[error(transparent)]
    Gone(#[from] PlayerGone),
}

#[derive(Error, Debug)]
#[error("sending to the output channel failed: {:?}", .0)]
pub enum OutputError {
    TwilightHttp(#[from] twilight_http::Error),
}
