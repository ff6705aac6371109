use thiserror::Error;

#[derive(Error, Debug)]
#[error("processing gateway event failed: {:?}", .0)]
pub enum ProcessError {
    TwilightHttp(#[from] twilight_http::Error),
    Player(#[from] super::player::PlayerError),
    PlayerGone(#[from] super::player::PlayerGone),
    Voice(#[from] super::voice::VoiceError),
    Roulette(#[from] super::roulette::RunRouletteError),
}

pub type ProcessResult = Result<(), ProcessError>;
