pub mod client;
pub mod component;
pub mod core;
pub mod error;
pub mod gateway;
pub mod lavalink;
pub mod player;
pub mod resolve;
pub mod runner;
pub mod session;
pub mod voice;
