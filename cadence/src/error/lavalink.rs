use thiserror::Error;

#[derive(Error, Debug)]
#[error("player does not yet exist")]
pub struct NoPlayerError;

#[derive(Error, Debug)]
#[error("controlling the lavalink player failed: {:?}", .0)]
pub enum SessionError {
    Lavalink(#[from] lavalink_rs::error::LavalinkError),
    NoPlayer(#[from] NoPlayerError),
}

#[derive(Error, Debug)]
#[error("processing lavalink event failed: {:?}", .0)]
pub enum ProcessError {
    Player(#[from] super::player::PlayerGone),
}

pub type ProcessResult = Result<(), ProcessError>;
