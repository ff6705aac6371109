pub mod core;
pub mod gateway;
pub mod lavalink;
pub mod player;
pub mod resolve;
pub mod roulette;
pub mod runner;
pub mod voice;

use thiserror::Error;

#[derive(Error, Debug)]
#[error("installing the default crypto provider failed")]
pub struct InstallDefaultCryptoProvider;

#[derive(Error, Debug)]
#[error("error running the bot starter: {}", .0)]
pub enum Run {
    ColorEyre(#[from] color_eyre::Report),
    Dotenvy(#[from] dotenvy::Error),
    Config(#[from] core::ConfigError),
    InstallDefaultCryptoProvider(#[from] InstallDefaultCryptoProvider),
    StartError(#[from] runner::StartError),
}
