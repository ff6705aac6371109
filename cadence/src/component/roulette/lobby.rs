use std::time::Duration;

use cadence_ext::colour::Rgb;
use rand::Rng;
use twilight_model::id::{Id, marker::UserMarker};

use crate::{core::konst::roulette as konst, error::roulette::RouletteError};

/// How long a lobby stays open and how many players it takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    timer: Duration,
    max_players: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timer: konst::DEFAULT_TIMER,
            max_players: konst::DEFAULT_MAX_PLAYERS,
        }
    }
}

impl Options {
    /// Validates user-supplied options, falling back to the defaults for
    /// anything left out.
    ///
    /// # Errors
    ///
    /// Fails if the timer or the player limit is out of range.
    pub fn new(timer_secs: Option<u64>, max_players: Option<usize>) -> Result<Self, RouletteError> {
        let defaults = Self::default();

        let timer = match timer_secs {
            None => defaults.timer,
            Some(got @ 1..) if got <= konst::MAX_TIMER.as_secs() => Duration::from_secs(got),
            Some(got) => {
                return Err(RouletteError::TimerOutOfRange {
                    got,
                    max: konst::MAX_TIMER.as_secs(),
                });
            }
        };

        let max_players = match max_players {
            None => defaults.max_players,
            Some(got) if (konst::MIN_PLAYERS..=konst::MAX_PLAYERS).contains(&got) => got,
            Some(got) => {
                return Err(RouletteError::PlayersOutOfRange {
                    got,
                    min: konst::MIN_PLAYERS,
                    max: konst::MAX_PLAYERS,
                });
            }
        };

        Ok(Self { timer, max_players })
    }

    pub const fn timer(&self) -> Duration {
        self.timer
    }

    pub const fn max_players(&self) -> usize {
        self.max_players
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Player {
    pub user_id: Id<UserMarker>,
    /// 1-based, in join order.
    pub number: usize,
    pub colour: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined(usize),
    AlreadyJoined,
    Full,
    Closed,
}

/// Players gathering for one roulette.
#[derive(Debug)]
pub struct Lobby {
    options: Options,
    players: Vec<Player>,
    closed: bool,
}

impl Lobby {
    pub const fn new(options: Options) -> Self {
        Self {
            options,
            players: Vec::new(),
            closed: false,
        }
    }

    pub const fn options(&self) -> &Options {
        &self.options
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.options.max_players
    }

    pub fn join(&mut self, user_id: Id<UserMarker>, rng: &mut impl Rng) -> JoinOutcome {
        if self.closed {
            return JoinOutcome::Closed;
        }
        if self.players.iter().any(|p| p.user_id == user_id) {
            return JoinOutcome::AlreadyJoined;
        }
        if self.is_full() {
            return JoinOutcome::Full;
        }

        let number = self.players.len() + 1;
        self.players.push(Player {
            user_id,
            number,
            colour: Rgb::dark_from_seed(rng.random()),
        });
        JoinOutcome::Joined(number)
    }

    /// Stops accepting players and starts the roulette with everyone who
    /// joined.
    ///
    /// # Errors
    ///
    /// Fails if fewer than two players joined.
    pub fn close(&mut self) -> Result<Roulette, RouletteError> {
        self.closed = true;

        let got = self.players.len();
        if got < konst::MIN_PLAYERS {
            return Err(RouletteError::NotEnoughPlayers {
                got,
                min: konst::MIN_PLAYERS,
            });
        }
        Ok(Roulette {
            remaining: std::mem::take(&mut self.players),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spin {
    pub eliminated: Player,
    pub remaining: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub eliminations: Vec<Player>,
    pub winner: Player,
}

/// A running roulette; always holds at least one player.
#[derive(Debug)]
pub struct Roulette {
    remaining: Vec<Player>,
}

impl Roulette {
    pub fn players(&self) -> &[Player] {
        &self.remaining
    }

    /// Eliminates one uniformly chosen player, unless only the winner is left.
    pub fn spin(&mut self, rng: &mut impl Rng) -> Option<Spin> {
        if self.remaining.len() <= 1 {
            return None;
        }
        let eliminated = self.remaining.remove(rng.random_range(0..self.remaining.len()));
        Some(Spin {
            eliminated,
            remaining: self.remaining.len(),
        })
    }

    pub fn play_out(mut self, rng: &mut impl Rng) -> Outcome {
        let eliminations = std::iter::from_fn(|| self.spin(rng))
            .map(|spin| spin.eliminated)
            .collect();
        let winner = self.remaining[0];
        Outcome {
            eliminations,
            winner,
        }
    }
}
