mod actor;
mod controller;
mod state;

use std::future::Future;

use tokio::sync::{broadcast, mpsc, oneshot};
use twilight_model::id::{Id, marker::ChannelMarker};

use crate::error::player::{PlayerError, PlayerGone, TransportUnavailable};

pub use self::{
    actor::spawn,
    controller::{
        Controller, Effect, Phase, PlayOutcome, SessionEvent, SkipOutcome, Snapshot, Ticket,
    },
    state::{PlaybackState, TrackRef},
};

/// Announcements of a player, for anyone who subscribed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connected,
    Playing(TrackRef),
    Queued(TrackRef),
    Error { message: String, cause: String },
    ConnectionLost,
}

/// Owns the audio output. Each load ends in exactly one of the
/// [`SessionEvent`]s, delivered through [`PlayerHandle::session_event`] with
/// the ticket it was loaded with.
pub trait PlaybackSession: Send + Sync + 'static {
    type Resource: Send + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    fn load(
        &self,
        ticket: Ticket,
        resource: Self::Resource,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
    fn halt(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Where user-facing status and errors go.
pub trait Output: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn send(
        &self,
        channel: Id<ChannelMarker>,
        content: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

type Response<T> = oneshot::Sender<Result<T, TransportUnavailable>>;

enum Instruction {
    Play {
        track: TrackRef,
        output: Id<ChannelMarker>,
        respond: Response<PlayOutcome>,
    },
    Enqueue {
        track: TrackRef,
        respond: Response<PlayOutcome>,
    },
    Skip(Response<SkipOutcome>),
    Stop(oneshot::Sender<()>),
    SetRepeat(bool, oneshot::Sender<()>),
    ToggleRepeat(oneshot::Sender<bool>),
    Snapshot(oneshot::Sender<Snapshot>),
    SessionEvent(Ticket, SessionEvent),
}

/// A cheap, cloneable handle to a running player.
#[derive(Clone)]
pub struct PlayerHandle {
    sender: mpsc::UnboundedSender<Instruction>,
    events: broadcast::Sender<Event>,
}

impl PlayerHandle {
    fn send_instruction(&self, instruction: Instruction) -> Result<(), PlayerGone> {
        self.sender.send(instruction).map_err(|_| PlayerGone)
    }

    async fn call<T>(
        &self,
        f: impl FnOnce(oneshot::Sender<T>) -> Instruction,
    ) -> Result<T, PlayerGone> {
        let (sender, receiver) = oneshot::channel();
        self.send_instruction(f(sender))?;
        receiver.await.map_err(|_| PlayerGone)
    }

    pub async fn play(
        &self,
        track: impl Into<TrackRef> + Send,
        output: Id<ChannelMarker>,
    ) -> Result<PlayOutcome, PlayerError> {
        let track = track.into();
        Ok(self
            .call(|respond| Instruction::Play {
                track,
                output,
                respond,
            })
            .await??)
    }

    pub async fn enqueue(
        &self,
        track: impl Into<TrackRef> + Send,
    ) -> Result<PlayOutcome, PlayerError> {
        let track = track.into();
        Ok(self
            .call(|respond| Instruction::Enqueue { track, respond })
            .await??)
    }

    pub async fn skip(&self) -> Result<SkipOutcome, PlayerError> {
        Ok(self.call(Instruction::Skip).await??)
    }

    pub async fn stop(&self) -> Result<(), PlayerGone> {
        self.call(Instruction::Stop).await
    }

    pub async fn set_repeat(&self, repeat: bool) -> Result<(), PlayerGone> {
        self.call(|respond| Instruction::SetRepeat(repeat, respond))
            .await
    }

    pub async fn toggle_repeat(&self) -> Result<bool, PlayerGone> {
        self.call(Instruction::ToggleRepeat).await
    }

    pub async fn snapshot(&self) -> Result<Snapshot, PlayerGone> {
        self.call(Instruction::Snapshot).await
    }

    pub fn session_event(&self, ticket: Ticket, event: SessionEvent) -> Result<(), PlayerGone> {
        self.send_instruction(Instruction::SessionEvent(ticket, event))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }
}
