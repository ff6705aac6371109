use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("voice connection was lost and did not recover")]
pub struct ConnectionLost;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("joining the voice channel failed: {}", .0)]
    Join(Box<dyn std::error::Error + Send + Sync>),
    #[error("leaving the voice channel failed: {}", .0)]
    Leave(Box<dyn std::error::Error + Send + Sync>),
    #[error("timed out waiting for the voice connection to become ready")]
    ReadyTimeout,
    #[error(transparent)]
    ConnectionLost(#[from] ConnectionLost),
}

#[derive(Error, Debug)]
#[error("voice transport failed: {:?}", .0)]
pub enum TransportError {
    Lavalink(#[from] lavalink_rs::error::LavalinkError),
    GatewaySend(#[from] twilight_gateway::error::ChannelError),
}
