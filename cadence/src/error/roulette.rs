use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouletteError {
    #[error("the timer must be between 1 and {max} seconds, got {got}")]
    TimerOutOfRange { got: u64, max: u64 },
    #[error("the player limit must be between {min} and {max}, got {got}")]
    PlayersOutOfRange { got: usize, min: usize, max: usize },
    #[error("at least {min} players are needed, got {got}")]
    NotEnoughPlayers { got: usize, min: usize },
}

#[derive(Error, Debug)]
#[error("running the roulette failed: {:?}", .0)]
pub enum RunRouletteError {
    TwilightHttp(#[from] twilight_http::Error),
    DeserialiseBody(#[from] twilight_http::response::DeserializeBodyError),
    Image(#[from] cadence_ext::ImageError),
    Join(#[from] tokio::task::JoinError),
}
