use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
};
use tracing::Instrument;

use crate::{
    core::konst::misc::EVENT_CHANNEL_CAPACITY,
    error::resolve::ResolveError,
    resolve::Resolve,
    voice::{ConnectionState, Subscription, VoiceEvent},
};

use super::{
    Event, Instruction, Output, PlaybackSession, PlayerHandle,
    controller::{Controller, Effect, SessionEvent, Ticket},
    state::TrackRef,
};

type Resolution<T> = (Ticket, Result<T, ResolveError>);

struct PlayerActor<R: Resolve, S, O> {
    controller: Controller<R::Resource>,
    resolver: Arc<R>,
    session: S,
    output: O,
    events: broadcast::Sender<Event>,
    inbox: mpsc::UnboundedReceiver<Instruction>,
    resolution_sender: mpsc::UnboundedSender<Resolution<R::Resource>>,
    resolutions: mpsc::UnboundedReceiver<Resolution<R::Resource>>,
    in_flight: Option<JoinHandle<()>>,
    voice_state: watch::Receiver<ConnectionState>,
    voice_events: broadcast::Receiver<VoiceEvent>,
    resolve_timeout: Duration,
}

/// Starts a player on its own task and returns the handle to drive it. The
/// player stops once every handle is dropped.
pub fn spawn<R, S, O>(
    resolver: R,
    session: S,
    output: O,
    voice: Subscription,
    resolve_timeout: Duration,
) -> PlayerHandle
where
    R: Resolve,
    S: PlaybackSession<Resource = R::Resource>,
    O: Output,
{
    let (sender, inbox) = mpsc::unbounded_channel();
    let (resolution_sender, resolutions) = mpsc::unbounded_channel();
    let events = broadcast::channel(EVENT_CHANNEL_CAPACITY).0;

    let actor = PlayerActor {
        controller: Controller::default(),
        resolver: Arc::new(resolver),
        session,
        output,
        events: events.clone(),
        inbox,
        resolution_sender,
        resolutions,
        in_flight: None,
        voice_state: voice.state,
        voice_events: voice.events,
        resolve_timeout,
    };
    tokio::spawn(actor.run().instrument(tracing::debug_span!("player")));

    PlayerHandle { sender, events }
}

impl<R, S, O> PlayerActor<R, S, O>
where
    R: Resolve,
    S: PlaybackSession<Resource = R::Resource>,
    O: Output,
{
    fn transport_available(&self) -> bool {
        *self.voice_state.borrow() != ConnectionState::Disconnected
    }

    async fn run(mut self) {
        let mut voice_open = true;
        loop {
            tokio::select! {
                instruction = self.inbox.recv() => {
                    let Some(instruction) = instruction else {
                        break;
                    };
                    self.handle(instruction).await;
                }
                Some((ticket, result)) = self.resolutions.recv() => {
                    self.controller.resolved(ticket, result);
                    self.drain().await;
                }
                event = self.voice_events.recv(), if voice_open => {
                    match event {
                        Ok(VoiceEvent::Connected) => self.controller.voice_ready(),
                        Ok(VoiceEvent::ConnectionLost) => self.controller.voice_lost(),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "player lagged behind voice events");
                        }
                        Err(broadcast::error::RecvError::Closed) => voice_open = false,
                    }
                    self.drain().await;
                }
            }
        }

        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        tracing::debug!("player stopped");
    }

    async fn handle(&mut self, instruction: Instruction) {
        let available = self.transport_available();
        match instruction {
            Instruction::Play {
                track,
                output,
                respond,
            } => {
                let result = self.controller.play(track, Some(output), available);
                self.drain().await;
                let _ = respond.send(result);
            }
            Instruction::Enqueue { track, respond } => {
                let result = self.controller.enqueue(track, available);
                self.drain().await;
                let _ = respond.send(result);
            }
            Instruction::Skip(respond) => {
                let result = self.controller.skip(available);
                self.drain().await;
                let _ = respond.send(result);
            }
            Instruction::Stop(respond) => {
                self.controller.stop();
                self.drain().await;
                let _ = respond.send(());
            }
            Instruction::SetRepeat(repeat, respond) => {
                self.controller.set_repeat(repeat);
                let _ = respond.send(());
            }
            Instruction::ToggleRepeat(respond) => {
                let _ = respond.send(self.controller.toggle_repeat());
            }
            Instruction::Snapshot(respond) => {
                let _ = respond.send(self.controller.snapshot());
            }
            Instruction::SessionEvent(ticket, event) => {
                self.controller.session_event(ticket, event);
                self.drain().await;
            }
        }
    }

    /// Carries out every effect the controller has queued, including those
    /// queued while doing so.
    async fn drain(&mut self) {
        while let Some(effect) = self.controller.next_effect() {
            match effect {
                Effect::Resolve { ticket, track } => self.resolve(ticket, track),
                Effect::Load { ticket, resource } => {
                    if let Err(error) = self.session.load(ticket, resource).await {
                        tracing::warn!(%error, "loading track failed");
                        self.controller
                            .session_event(ticket, SessionEvent::Failed(error.to_string()));
                    }
                }
                Effect::Halt => {
                    self.abort_in_flight();
                    if let Err(error) = self.session.halt().await {
                        tracing::warn!(%error, "halting playback failed");
                    }
                }
                Effect::Report { channel, content } => {
                    if let Err(error) = self.output.send(channel, &content).await {
                        tracing::warn!(%error, "reporting to the output channel failed");
                    }
                }
                Effect::Emit(event) => {
                    let _ = self.events.send(event);
                }
            }
        }
    }

    fn abort_in_flight(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }

    fn resolve(&mut self, ticket: Ticket, track: TrackRef) {
        self.abort_in_flight();

        let resolver = Arc::clone(&self.resolver);
        let sender = self.resolution_sender.clone();
        let timeout = self.resolve_timeout;
        let task = async move {
            let result = tokio::time::timeout(timeout, resolver.resolve(&track))
                .await
                .unwrap_or(Err(ResolveError::TimedOut));
            let _ = sender.send((ticket, result));
        };
        self.in_flight = Some(tokio::spawn(
            task.instrument(tracing::debug_span!("resolve", ticket = ticket.get())),
        ));
    }
}

#[cfg(test)]
mod test {
    use std::{future::pending, time::Duration};

    use thiserror::Error;
    use tokio::sync::{broadcast, mpsc, watch};
    use twilight_model::id::{Id, marker::ChannelMarker};

    use super::spawn;
    use crate::{
        error::{
            player::PlayerError,
            resolve::{InvalidTrackUrl, ResolveError},
        },
        player::{
            Event, Output, Phase, PlayOutcome, PlaybackSession, PlayerHandle, SessionEvent,
            SkipOutcome, Ticket,
        },
        resolve::Resolve,
        voice::{ConnectionState, Subscription, VoiceEvent},
    };

    const OUTPUT: Id<ChannelMarker> = Id::new(42);

    struct FakeResolver;

    impl Resolve for FakeResolver {
        type Resource = String;

        async fn resolve(&self, url: &str) -> Result<String, ResolveError> {
            match url {
                "slow" => pending().await,
                "bogus" => Err(InvalidTrackUrl::Unsupported.into()),
                _ => Ok(format!("resource:{url}")),
            }
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    enum Call {
        Load(Ticket, String),
        Halt,
    }

    #[derive(Error, Debug)]
    #[error("node unreachable")]
    struct Unreachable;

    struct FakeSession {
        calls: mpsc::UnboundedSender<Call>,
        broken: bool,
    }

    impl PlaybackSession for FakeSession {
        type Resource = String;
        type Error = Unreachable;

        async fn load(&self, ticket: Ticket, resource: String) -> Result<(), Unreachable> {
            let _ = self.calls.send(Call::Load(ticket, resource));
            if self.broken {
                return Err(Unreachable);
            }
            Ok(())
        }

        async fn halt(&self) -> Result<(), Unreachable> {
            let _ = self.calls.send(Call::Halt);
            Ok(())
        }
    }

    struct FakeOutput(mpsc::UnboundedSender<(Id<ChannelMarker>, String)>);

    impl Output for FakeOutput {
        type Error = Unreachable;

        async fn send(&self, channel: Id<ChannelMarker>, content: &str) -> Result<(), Unreachable> {
            let _ = self.0.send((channel, content.to_owned()));
            Ok(())
        }
    }

    struct Harness {
        player: PlayerHandle,
        events: broadcast::Receiver<Event>,
        calls: mpsc::UnboundedReceiver<Call>,
        reports: mpsc::UnboundedReceiver<(Id<ChannelMarker>, String)>,
        voice_state: watch::Sender<ConnectionState>,
        voice_events: broadcast::Sender<VoiceEvent>,
    }

    impl Harness {
        fn new(broken: bool, state: ConnectionState) -> Self {
            let (calls_sender, calls) = mpsc::unbounded_channel();
            let (reports_sender, reports) = mpsc::unbounded_channel();
            let (voice_state, state_receiver) = watch::channel(state);
            let (voice_events, events_receiver) = broadcast::channel(16);

            let player = spawn(
                FakeResolver,
                FakeSession {
                    calls: calls_sender,
                    broken,
                },
                FakeOutput(reports_sender),
                Subscription {
                    state: state_receiver,
                    events: events_receiver,
                },
                Duration::from_secs(30),
            );
            Self {
                events: player.subscribe(),
                player,
                calls,
                reports,
                voice_state,
                voice_events,
            }
        }

        async fn next_load(&mut self) -> Ticket {
            match self.calls.recv().await {
                Some(Call::Load(ticket, _)) => ticket,
                other => panic!("expected a load, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn plays_then_announces() {
        let mut h = Harness::new(false, ConnectionState::Ready);

        let outcome = h.player.play("trackA", OUTPUT).await;
        assert_eq!(outcome, Ok(PlayOutcome::Started));

        let ticket = h.next_load().await;
        h.player
            .session_event(ticket, SessionEvent::Playing)
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(h.events.recv().await.ok(), Some(Event::Playing("trackA".into())));

        let snapshot = h.player.snapshot().await.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(snapshot.phase, Phase::Playing);
        assert_eq!(snapshot.current.as_deref(), Some("trackA"));
        assert_eq!(snapshot.output, Some(OUTPUT));
    }

    #[tokio::test]
    async fn finished_track_advances_to_queue() {
        let mut h = Harness::new(false, ConnectionState::Ready);
        let _ = h.player.play("trackA", OUTPUT).await;
        let first = h.next_load().await;

        assert_eq!(
            h.player.enqueue("trackB").await,
            Ok(PlayOutcome::Queued { position: 1 })
        );
        h.player
            .session_event(first, SessionEvent::Idle)
            .unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(
            h.calls.recv().await,
            Some(Call::Load(Ticket::new(2), String::from("resource:trackB")))
        );
    }

    #[tokio::test]
    async fn requires_a_voice_link() {
        let h = Harness::new(false, ConnectionState::Disconnected);
        assert_eq!(
            h.player.play("trackA", OUTPUT).await,
            Err(PlayerError::TransportUnavailable(
                crate::error::player::TransportUnavailable
            ))
        );
    }

    #[tokio::test]
    async fn bad_url_is_reported() {
        let mut h = Harness::new(false, ConnectionState::Ready);
        let _ = h.player.play("bogus", OUTPUT).await;

        let (channel, content) = h.reports.recv().await.unwrap_or_else(|| panic!("no report"));
        assert_eq!(channel, OUTPUT);
        assert!(content.contains("Error playing the track"));
        assert!(matches!(h.events.recv().await, Ok(Event::Error { .. })));

        let snapshot = h.player.snapshot().await.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(snapshot.phase, Phase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_resolution_times_out() {
        let mut h = Harness::new(false, ConnectionState::Ready);
        let _ = h.player.play("slow", OUTPUT).await;

        let (_, content) = h.reports.recv().await.unwrap_or_else(|| panic!("no report"));
        assert!(content.contains("timed out"));
        let snapshot = h.player.snapshot().await.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(snapshot.phase, Phase::Idle);
    }

    #[tokio::test]
    async fn failed_load_returns_to_idle() {
        let mut h = Harness::new(true, ConnectionState::Ready);
        let _ = h.player.play("trackA", OUTPUT).await;
        let _ = h.next_load().await;

        let (_, content) = h.reports.recv().await.unwrap_or_else(|| panic!("no report"));
        assert!(content.contains("node unreachable"));
        let snapshot = h.player.snapshot().await.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(snapshot.current, None);
    }

    #[tokio::test]
    async fn repeat_can_be_set_and_toggled() {
        let h = Harness::new(false, ConnectionState::Ready);
        h.player.set_repeat(true).await.unwrap_or_else(|e| panic!("{e}"));
        assert!(h.player.snapshot().await.is_ok_and(|s| s.repeat));
        assert_eq!(h.player.toggle_repeat().await, Ok(false));
        assert!(h.player.snapshot().await.is_ok_and(|s| !s.repeat));
    }

    #[tokio::test]
    async fn stop_halts_the_session() {
        let mut h = Harness::new(false, ConnectionState::Ready);
        let _ = h.player.play("trackA", OUTPUT).await;
        let _ = h.next_load().await;

        h.player.stop().await.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(h.calls.recv().await, Some(Call::Halt));
        assert!(h.player.snapshot().await.is_ok_and(|s| s.stopped));
    }

    #[tokio::test]
    async fn failed_skip_leaves_nothing_playing() {
        let mut h = Harness::new(false, ConnectionState::Ready);
        let _ = h.player.play("trackA", OUTPUT).await;
        let ticket = h.next_load().await;
        h.player
            .session_event(ticket, SessionEvent::Playing)
            .unwrap_or_else(|e| panic!("{e}"));
        let _ = h.player.enqueue("bogus").await;

        assert_eq!(
            h.player.skip().await,
            Ok(SkipOutcome::Skipped("bogus".into()))
        );
        assert_eq!(h.calls.recv().await, Some(Call::Halt));

        loop {
            let (_, content) = h.reports.recv().await.unwrap_or_else(|| panic!("no report"));
            if content.contains("Error playing the track") {
                break;
            }
        }
        let snapshot = h.player.snapshot().await.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(snapshot.current, None);
        assert!(h.calls.try_recv().is_err());
    }

    #[tokio::test]
    async fn lost_connection_clears_the_session() {
        let mut h = Harness::new(false, ConnectionState::Ready);
        let _ = h.player.play("trackA", OUTPUT).await;
        let _ = h.next_load().await;
        let _ = h.player.enqueue("trackB").await;

        h.voice_state.send_replace(ConnectionState::Disconnected);
        let _ = h.voice_events.send(VoiceEvent::ConnectionLost);
        loop {
            match h.events.recv().await {
                Ok(Event::ConnectionLost) => break,
                Ok(_) => {}
                Err(e) => panic!("{e}"),
            }
        }

        let snapshot = h.player.snapshot().await.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(snapshot.phase, Phase::Idle);
        assert!(snapshot.queue.is_empty());
        assert!(h.calls.try_recv().is_err());
    }
}
