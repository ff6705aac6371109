use std::fmt::Display;

use twilight_model::channel::Message;

use crate::core::model::MinigameConfig;

/// Games of the third-party minigame bot that the bot recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Game {
    Roulette,
    Xo,
    Mafia,
    Chairs,
    RockPaperScissors,
}

impl Game {
    fn from_title(title: &str) -> Option<Self> {
        match title.trim() {
            "Roulette" => Some(Self::Roulette),
            "XO" => Some(Self::Xo),
            "Mafia" => Some(Self::Mafia),
            "Chairs" => Some(Self::Chairs),
            "Rock Paper Scissors" => Some(Self::RockPaperScissors),
            _ => None,
        }
    }
}

impl Display for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Roulette => "Roulette",
            Self::Xo => "XO",
            Self::Mafia => "Mafia",
            Self::Chairs => "Chairs",
            Self::RockPaperScissors => "Rock Paper Scissors",
        })
    }
}

/// Recognises a game announcement posted through a webhook of the
/// minigame application.
pub fn detect(message: &Message, config: &MinigameConfig) -> Option<Game> {
    message.webhook_id?;
    if message.application_id != Some(config.application_id) {
        return None;
    }
    if message
        .guild_id
        .is_some_and(|guild_id| config.ignored_guilds.contains(&guild_id))
    {
        return None;
    }

    let game = Game::from_title(message.embeds.first()?.title.as_deref()?)?;
    tracing::info!(
        %game,
        guild_id = ?message.guild_id,
        channel_id = ?message.channel_id,
        "detected a minigame"
    );
    Some(game)
}
