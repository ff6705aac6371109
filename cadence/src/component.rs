pub mod minigame;
pub mod roulette;
