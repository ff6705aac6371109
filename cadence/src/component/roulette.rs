mod lobby;

use cadence_ext::{colour::Rgb, image::wheel, pretty::numbered::PrettyNumbered};
use futures::StreamExt;
use rand::{SeedableRng, rngs::StdRng};
use twilight_http::request::channel::reaction::RequestReactionType;
use twilight_mention::Mention;
use twilight_model::{
    channel::message::{Embed, EmojiReactionType},
    gateway::payload::incoming::ReactionAdd,
    http::attachment::Attachment,
    id::{Id, marker::ChannelMarker},
};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFooterBuilder};

use crate::{
    core::{
        konst::{exit_code, roulette as konst},
        model::{BotState, HttpAware},
    },
    error::roulette::RunRouletteError,
};

pub use self::lobby::{JoinOutcome, Lobby, Options, Outcome, Player, Roulette, Spin};

fn lobby_embed(lobby: &Lobby) -> Embed {
    let players = lobby
        .players()
        .iter()
        .map(|p| p.user_id.mention().to_string())
        .collect::<Vec<_>>();
    let description = if players.is_empty() {
        String::from("*Nobody has joined yet.*")
    } else {
        players.pretty_numbered(konst::MAX_PLAYERS)
    };

    EmbedBuilder::new()
        .title("🎲 Roulette")
        .description(description)
        .color(konst::EMBED_COLOUR)
        .footer(EmbedFooterBuilder::new(format!(
            "React with {} to join · {}/{} players · closes in {}s",
            konst::JOIN_EMOJI,
            players.len(),
            lobby.options().max_players(),
            lobby.options().timer().as_secs(),
        )))
        .build()
}

fn outcome_embed(outcome: &Outcome) -> Embed {
    let eliminated = outcome
        .eliminations
        .iter()
        .map(|p| format!("~~{}~~", p.user_id.mention()))
        .collect::<Vec<_>>();

    EmbedBuilder::new()
        .title("🏆 Roulette")
        .description(format!(
            "**Winner:** {}\n\n**Eliminated, in order:**\n{}",
            outcome.winner.user_id.mention(),
            eliminated.pretty_numbered(konst::MAX_PLAYERS),
        ))
        .color(outcome.winner.colour.to_hex())
        .build()
}

fn is_join_reaction(reaction: &ReactionAdd) -> bool {
    matches!(&reaction.emoji, EmojiReactionType::Unicode { name } if name == konst::JOIN_EMOJI)
}

/// Runs one roulette in `channel_id`: gathers players through reactions
/// until the timer runs out or the lobby fills up, then plays it out.
#[tracing::instrument(err, skip(bot), name = "roulette")]
pub async fn run(
    bot: &BotState,
    channel_id: Id<ChannelMarker>,
    options: Options,
) -> Result<(), RunRouletteError> {
    let mut rng = StdRng::from_os_rng();
    let mut lobby = Lobby::new(options);

    let message = bot
        .http()
        .create_message(channel_id)
        .embeds(&[lobby_embed(&lobby)])
        .await?
        .model()
        .await?;
    bot.http()
        .create_reaction(
            channel_id,
            message.id,
            &RequestReactionType::Unicode {
                name: konst::JOIN_EMOJI,
            },
        )
        .await?;

    let mut reactions = bot
        .standby()
        .wait_for_reaction_stream(message.id, is_join_reaction);
    let deadline = tokio::time::Instant::now() + options.timer();
    let own_id = bot.user_id();

    while let Ok(Some(reaction)) = tokio::time::timeout_at(deadline, reactions.next()).await {
        if reaction.user_id == own_id {
            continue;
        }
        match lobby.join(reaction.user_id, &mut rng) {
            JoinOutcome::Joined(number) => {
                tracing::debug!(user_id = ?reaction.user_id, number, "joined roulette");
                bot.http()
                    .update_message(channel_id, message.id)
                    .embeds(Some(&[lobby_embed(&lobby)]))
                    .await?;
                if lobby.is_full() {
                    break;
                }
            }
            JoinOutcome::AlreadyJoined | JoinOutcome::Full | JoinOutcome::Closed => {}
        }
    }
    drop(reactions);

    let roulette = match lobby.close() {
        Ok(roulette) => roulette,
        Err(error) => {
            bot.http()
                .create_message(channel_id)
                .content(&format!("{} {error}", exit_code::WARNING))
                .await?;
            return Ok(());
        }
    };

    let sectors = roulette.players().iter().map(|p| p.colour).collect::<Vec<Rgb>>();
    let outcome = roulette.play_out(&mut rng);
    let winner = outcome.winner.number - 1;
    tracing::info!(winner = ?outcome.winner.user_id, "roulette played out");

    let gif = tokio::task::spawn_blocking(move || {
        wheel::render(&sectors, winner, wheel::Options::default())
    })
    .await??;

    bot.http()
        .create_message(channel_id)
        .content(&format!(
            "🎉 {} wins the roulette!",
            outcome.winner.user_id.mention()
        ))
        .embeds(&[outcome_embed(&outcome)])
        .attachments(&[Attachment::from_bytes(
            String::from(konst::ATTACHMENT_NAME),
            gif,
            1,
        )])
        .await?;
    Ok(())
}
