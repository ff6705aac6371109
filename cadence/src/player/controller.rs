use std::{collections::VecDeque, fmt::Display};

use twilight_model::id::{Id, marker::ChannelMarker};

use crate::{
    core::konst::{exit_code, text},
    error::{player::TransportUnavailable, resolve::ResolveError},
};

use super::{
    Event,
    state::{PlaybackState, TrackRef},
};

/// Identifies one resolve-then-load attempt. Results and lifecycle events
/// carrying anything but the current ticket are stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Playing,
}

#[derive(Debug)]
enum Stage {
    Idle,
    Loading { ticket: Ticket, track: TrackRef },
    Playing { ticket: Ticket, track: TrackRef },
}

/// Lifecycle signals of the playback session, one outcome per load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Playing,
    Idle,
    Failed(String),
}

/// Work the controller asks its owner to carry out.
#[derive(Debug, PartialEq, Eq)]
pub enum Effect<R> {
    Resolve { ticket: Ticket, track: TrackRef },
    Load { ticket: Ticket, resource: R },
    Halt,
    Report { channel: Id<ChannelMarker>, content: String },
    Emit(Event),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Started,
    Queued { position: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipOutcome {
    Skipped(TrackRef),
    QueueEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub phase: Phase,
    pub current: Option<TrackRef>,
    pub queue: Vec<TrackRef>,
    pub repeat: bool,
    pub stopped: bool,
    pub history_len: usize,
    pub output: Option<Id<ChannelMarker>>,
}

/// The queue and repeat state machine. Every operation is synchronous; the
/// work it implies is queued as [`Effect`]s for the caller to drain.
pub struct Controller<R> {
    state: PlaybackState,
    stage: Stage,
    issued: u64,
    effects: VecDeque<Effect<R>>,
}

impl<R> Default for Controller<R> {
    fn default() -> Self {
        Self {
            state: PlaybackState::default(),
            stage: Stage::Idle,
            issued: 0,
            effects: VecDeque::new(),
        }
    }
}

impl<R> Controller<R> {
    pub const fn phase(&self) -> Phase {
        match self.stage {
            Stage::Idle => Phase::Idle,
            Stage::Loading { .. } => Phase::Loading,
            Stage::Playing { .. } => Phase::Playing,
        }
    }

    pub const fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase(),
            current: self.state.current.clone(),
            queue: self.state.queue.iter().cloned().collect(),
            repeat: self.state.repeat,
            stopped: self.state.stopped,
            history_len: self.state.history.len(),
            output: self.state.output,
        }
    }

    pub fn next_effect(&mut self) -> Option<Effect<R>> {
        self.effects.pop_front()
    }

    const fn busy(&self) -> bool {
        !matches!(self.stage, Stage::Idle)
    }

    pub fn play(
        &mut self,
        track: TrackRef,
        output: Option<Id<ChannelMarker>>,
        transport_available: bool,
    ) -> Result<PlayOutcome, TransportUnavailable> {
        if self.busy() {
            return Ok(self.divert(track));
        }
        if !transport_available {
            return Err(TransportUnavailable);
        }

        if output.is_some() {
            self.state.output = output;
        }
        self.state.stopped = false;
        self.load(track);
        Ok(PlayOutcome::Started)
    }

    pub fn enqueue(
        &mut self,
        track: TrackRef,
        transport_available: bool,
    ) -> Result<PlayOutcome, TransportUnavailable> {
        if self.busy() {
            return Ok(self.divert(track));
        }
        self.play(track, None, transport_available)
    }

    pub fn skip(&mut self, transport_available: bool) -> Result<SkipOutcome, TransportUnavailable> {
        if self.state.queue.is_empty() {
            self.report(format!("{} {}", exit_code::NOTICE, text::QUEUE_EMPTY));
            return Ok(SkipOutcome::QueueEmpty);
        }
        if !transport_available {
            return Err(TransportUnavailable);
        }

        let Some(next) = self.state.queue.pop_front() else {
            return Ok(SkipOutcome::QueueEmpty);
        };
        tracing::debug!(%next, "skipping to next track");
        self.effects.push_back(Effect::Halt);
        self.load(next.clone());
        Ok(SkipOutcome::Skipped(next))
    }

    pub fn stop(&mut self) {
        self.state.clear();
        self.stage = Stage::Idle;
        self.effects.push_back(Effect::Halt);
    }

    pub const fn set_repeat(&mut self, repeat: bool) {
        self.state.repeat = repeat;
    }

    pub const fn toggle_repeat(&mut self) -> bool {
        self.state.repeat = !self.state.repeat;
        self.state.repeat
    }

    pub fn voice_ready(&mut self) {
        self.effects.push_back(Effect::Emit(Event::Connected));
    }

    /// The voice link is gone for good: forget everything, but there is no
    /// session left to halt.
    pub fn voice_lost(&mut self) {
        self.state.clear();
        self.stage = Stage::Idle;
        self.effects.push_back(Effect::Emit(Event::ConnectionLost));
    }

    pub fn resolved(&mut self, ticket: Ticket, result: Result<R, ResolveError>) {
        let track = match &self.stage {
            Stage::Loading { ticket: t, track } if *t == ticket => track.clone(),
            _ => {
                tracing::trace!(?ticket, "discarded stale resolution");
                return;
            }
        };

        match result {
            Ok(resource) => {
                self.state.current = Some(track.clone());
                self.state.last = Some(track.clone());
                self.state.remember(&track);
                self.stage = Stage::Playing { ticket, track };
                self.effects.push_back(Effect::Load { ticket, resource });
            }
            Err(error) => {
                tracing::warn!(%track, %error, "resolving track failed");
                self.stage = Stage::Idle;
                self.state.current = None;
                self.fail(&error);
            }
        }
    }

    pub fn session_event(&mut self, ticket: Ticket, event: SessionEvent) {
        let track = match &self.stage {
            Stage::Playing { ticket: t, track } if *t == ticket => track.clone(),
            _ => {
                tracing::trace!(?ticket, ?event, "discarded stale session event");
                return;
            }
        };

        match event {
            SessionEvent::Playing => self.effects.push_back(Effect::Emit(Event::Playing(track))),
            SessionEvent::Idle => {
                self.stage = Stage::Idle;
                self.state.current = None;
                self.advance();
            }
            SessionEvent::Failed(cause) => {
                tracing::warn!(%track, %cause, "playback failed");
                self.stage = Stage::Idle;
                self.state.current = None;
                self.fail(&cause);
            }
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.state.queue.pop_front() {
            self.load(next);
        } else if let Some(track) = self.state.replay_candidate() {
            tracing::debug!(%track, "replaying track");
            self.load(track);
        }
    }

    fn load(&mut self, track: TrackRef) {
        self.issued += 1;
        let ticket = Ticket(self.issued);
        self.state.current = None;
        self.stage = Stage::Loading {
            ticket,
            track: track.clone(),
        };
        self.effects.push_back(Effect::Resolve { ticket, track });
    }

    fn divert(&mut self, track: TrackRef) -> PlayOutcome {
        self.state.push(track.clone());
        self.effects.push_back(Effect::Emit(Event::Queued(track)));
        PlayOutcome::Queued {
            position: self.state.queue.len(),
        }
    }

    fn fail(&mut self, cause: &impl Display) {
        self.report(format!(
            "{} {}: {cause}",
            exit_code::KNOWN_ERROR,
            text::PLAY_ERROR
        ));
        self.effects.push_back(Effect::Emit(Event::Error {
            message: String::from(text::PLAY_ERROR),
            cause: cause.to_string(),
        }));
    }

    fn report(&mut self, content: String) {
        if let Some(channel) = self.state.output {
            self.effects.push_back(Effect::Report { channel, content });
        }
    }
}

#[cfg(test)]
mod test {
    use rstest::{fixture, rstest};
    use twilight_model::id::Id;

    use super::{Controller, Effect, Phase, PlayOutcome, SessionEvent, SkipOutcome, Ticket};
    use crate::{
        error::{
            player::TransportUnavailable,
            resolve::{InvalidTrackUrl, ResolveError},
        },
        player::{Event, state::TrackRef},
    };

    type Resource = String;

    fn drain(c: &mut Controller<Resource>) -> Vec<Effect<Resource>> {
        std::iter::from_fn(|| c.next_effect()).collect()
    }

    fn resolving(effects: &[Effect<Resource>]) -> Vec<(Ticket, &str)> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Resolve { ticket, track } => Some((*ticket, &**track)),
                _ => None,
            })
            .collect()
    }

    fn loads(effects: &[Effect<Resource>]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, Effect::Load { .. }))
            .count()
    }

    fn track(url: &str) -> TrackRef {
        url.into()
    }

    /// Resolves the pending attempt successfully and reports it as playing.
    /// Returns the ticket that is now playing.
    fn start(c: &mut Controller<Resource>) -> Ticket {
        let effects = drain(c);
        let [(ticket, url)] = resolving(&effects)[..] else {
            panic!("expected exactly one resolution, got {effects:?}");
        };
        c.resolved(ticket, Ok(format!("resource:{url}")));
        c.session_event(ticket, SessionEvent::Playing);
        let _ = drain(c);
        ticket
    }

    #[fixture]
    fn playing() -> (Controller<Resource>, Ticket) {
        let mut c = Controller::default();
        assert_eq!(
            c.play(track("trackA"), Some(Id::new(1)), true),
            Ok(PlayOutcome::Started)
        );
        let ticket = start(&mut c);
        (c, ticket)
    }

    #[test]
    fn enqueue_while_idle_plays_immediately() {
        let mut c = Controller::<Resource>::default();
        assert_eq!(c.enqueue(track("trackA"), true), Ok(PlayOutcome::Started));
        assert_eq!(c.phase(), Phase::Loading);

        let effects = drain(&mut c);
        let [(ticket, "trackA")] = resolving(&effects)[..] else {
            panic!("unexpected effects {effects:?}");
        };

        c.resolved(ticket, Ok(String::from("resource:trackA")));
        assert_eq!(c.phase(), Phase::Playing);
        assert_eq!(c.state().current().map(|t| &**t), Some("trackA"));
        assert_eq!(
            drain(&mut c),
            [Effect::Load {
                ticket,
                resource: String::from("resource:trackA")
            }]
        );

        c.session_event(ticket, SessionEvent::Playing);
        assert_eq!(
            drain(&mut c),
            [Effect::Emit(Event::Playing(track("trackA")))]
        );
    }

    #[rstest]
    fn play_while_playing_is_queued(playing: (Controller<Resource>, Ticket)) {
        let (mut c, _) = playing;
        assert_eq!(
            c.play(track("trackB"), None, true),
            Ok(PlayOutcome::Queued { position: 1 })
        );
        assert_eq!(c.phase(), Phase::Playing);
        assert_eq!(c.snapshot().queue, [track("trackB")]);
        assert_eq!(c.state().current().map(|t| &**t), Some("trackA"));
        assert_eq!(drain(&mut c), [Effect::Emit(Event::Queued(track("trackB")))]);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(7)]
    fn single_flight(#[case] extra: usize) {
        let mut c = Controller::<Resource>::default();
        let _ = c.play(track("first"), None, true);

        // while loading
        for i in 0..extra {
            let _ = c.play(format!("loading-{i}").into(), None, true);
        }
        let mut effects = drain(&mut c);
        let [(ticket, _)] = resolving(&effects)[..] else {
            panic!("expected a single resolution, got {effects:?}");
        };
        c.resolved(ticket, Ok(String::from("resource")));

        // while playing
        for i in 0..extra {
            let _ = c.enqueue(format!("playing-{i}").into(), true);
        }
        effects.extend(drain(&mut c));

        assert_eq!(resolving(&effects).len(), 1);
        assert_eq!(loads(&effects), 1);
        assert_eq!(c.snapshot().queue.len(), extra * 2);
    }

    #[rstest]
    fn queue_is_fifo(playing: (Controller<Resource>, Ticket)) {
        let (mut c, mut ticket) = playing;
        for url in ["a", "b", "c"] {
            let _ = c.play(track(url), None, true);
        }
        let _ = drain(&mut c);

        let mut order = Vec::new();
        for _ in 0..3 {
            c.session_event(ticket, SessionEvent::Idle);
            let effects = drain(&mut c);
            let [(next, url)] = resolving(&effects)[..] else {
                panic!("expected a single resolution, got {effects:?}");
            };
            order.push(url.to_owned());
            c.resolved(next, Ok(String::from("resource")));
            assert_eq!(loads(&drain(&mut c)), 1);
            ticket = next;
        }
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[rstest]
    fn repeat_replays_until_stopped(playing: (Controller<Resource>, Ticket)) {
        let (mut c, mut ticket) = playing;
        c.set_repeat(true);

        for _ in 0..5 {
            c.session_event(ticket, SessionEvent::Idle);
            let effects = drain(&mut c);
            let [(next, "trackA")] = resolving(&effects)[..] else {
                panic!("expected a replay of trackA, got {effects:?}");
            };
            c.resolved(next, Ok(String::from("resource")));
            assert_eq!(loads(&drain(&mut c)), 1);
            ticket = next;
        }

        c.stop();
        assert_eq!(drain(&mut c), [Effect::Halt]);
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.snapshot().repeat);

        // the halted track drains late; nothing may replay
        c.session_event(ticket, SessionEvent::Idle);
        assert_eq!(drain(&mut c), []);
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[rstest]
    fn explicit_play_clears_stop(playing: (Controller<Resource>, Ticket)) {
        let (mut c, _) = playing;
        c.set_repeat(true);
        c.stop();
        assert!(c.snapshot().stopped);
        let _ = drain(&mut c);

        let _ = c.play(track("trackB"), None, true);
        assert!(!c.snapshot().stopped);
        let ticket = start(&mut c);

        c.session_event(ticket, SessionEvent::Idle);
        let effects = drain(&mut c);
        assert!(matches!(resolving(&effects)[..], [(_, "trackB")]));
    }

    #[rstest]
    fn failed_resolution_stalls_the_queue(playing: (Controller<Resource>, Ticket)) {
        let (mut c, ticket) = playing;
        let _ = c.play(track("bad"), None, true);
        let _ = c.play(track("good"), None, true);
        let _ = drain(&mut c);

        c.session_event(ticket, SessionEvent::Idle);
        let effects = drain(&mut c);
        let [(next, "bad")] = resolving(&effects)[..] else {
            panic!("unexpected effects {effects:?}");
        };

        c.resolved(next, Err(InvalidTrackUrl::Unsupported.into()));
        let effects = drain(&mut c);
        assert!(resolving(&effects).is_empty());
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.snapshot().queue, [track("good")]);

        assert_eq!(c.skip(true), Ok(SkipOutcome::Skipped(track("good"))));
        assert!(matches!(resolving(&drain(&mut c))[..], [(_, "good")]));
    }

    #[rstest]
    fn failed_playback_does_not_advance(playing: (Controller<Resource>, Ticket)) {
        let (mut c, ticket) = playing;
        let _ = c.play(track("next"), None, true);
        let _ = drain(&mut c);

        c.session_event(ticket, SessionEvent::Failed(String::from("decoder error")));
        let effects = drain(&mut c);
        assert!(resolving(&effects).is_empty());
        assert!(effects.contains(&Effect::Emit(Event::Error {
            message: String::from("Error playing the track"),
            cause: String::from("decoder error"),
        })));
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.state().current(), None);
        assert_eq!(c.snapshot().queue, [track("next")]);
    }

    #[rstest]
    fn history_is_idempotent(playing: (Controller<Resource>, Ticket)) {
        let (mut c, _) = playing;
        let _ = c.play(track("trackA"), None, true);
        let _ = c.play(track("trackB"), None, true);
        let _ = c.play(track("trackB"), None, true);
        assert_eq!(c.snapshot().history_len, 2);
        assert_eq!(c.snapshot().queue.len(), 3);
    }

    #[rstest]
    fn skip_with_empty_queue_only_reports(playing: (Controller<Resource>, Ticket)) {
        let (mut c, _) = playing;
        let before = c.snapshot();

        assert_eq!(c.skip(true), Ok(SkipOutcome::QueueEmpty));
        let effects = drain(&mut c);
        let [Effect::Report { channel, content }] = &effects[..] else {
            panic!("expected a single report, got {effects:?}");
        };
        assert_eq!(*channel, Id::new(1));
        assert!(content.contains("queue is empty"));
        assert_eq!(c.snapshot(), before);
    }

    #[rstest]
    fn skip_without_transport_keeps_the_queue(playing: (Controller<Resource>, Ticket)) {
        let (mut c, _) = playing;
        let _ = c.play(track("next"), None, true);
        let _ = drain(&mut c);

        assert_eq!(c.skip(false), Err(TransportUnavailable));
        assert_eq!(c.snapshot().queue, [track("next")]);
        assert_eq!(drain(&mut c), []);
    }

    #[test]
    fn unsupported_url_reports_and_idles() {
        let mut c = Controller::<Resource>::default();
        let _ = c.play(track("ftp://example.com/song"), Some(Id::new(1)), true);
        let effects = drain(&mut c);
        let [(ticket, _)] = resolving(&effects)[..] else {
            panic!("unexpected effects {effects:?}");
        };

        c.resolved(
            ticket,
            Err(ResolveError::InvalidTrackUrl(InvalidTrackUrl::Unsupported)),
        );
        let effects = drain(&mut c);
        assert!(matches!(
            &effects[..],
            [Effect::Report { .. }, Effect::Emit(Event::Error { .. })]
        ));
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.state().current(), None);
    }

    #[test]
    fn play_without_transport_fails_fast() {
        let mut c = Controller::<Resource>::default();
        assert_eq!(
            c.play(track("trackA"), Some(Id::new(1)), false),
            Err(TransportUnavailable)
        );
        assert_eq!(drain(&mut c), []);
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.snapshot().output, None);
    }

    #[rstest]
    fn skip_preempts_and_discards_stale_work(playing: (Controller<Resource>, Ticket)) {
        let (mut c, old) = playing;
        let _ = c.play(track("b"), None, true);
        let _ = c.play(track("c"), None, true);
        let _ = drain(&mut c);

        let _ = c.skip(true);
        let [(to_b, "b")] = resolving(&drain(&mut c))[..] else {
            panic!("expected to load b");
        };
        let _ = c.skip(true);
        let [(to_c, "c")] = resolving(&drain(&mut c))[..] else {
            panic!("expected to load c");
        };

        c.session_event(old, SessionEvent::Idle);
        c.resolved(to_b, Ok(String::from("resource:b")));
        assert_eq!(drain(&mut c), []);
        assert_eq!(c.phase(), Phase::Loading);

        c.resolved(to_c, Ok(String::from("resource:c")));
        assert_eq!(loads(&drain(&mut c)), 1);
        assert_eq!(c.state().current().map(|t| &**t), Some("c"));
    }

    #[rstest]
    fn skip_halts_before_resolving(playing: (Controller<Resource>, Ticket)) {
        let (mut c, _) = playing;
        let _ = c.play(track("b"), None, true);
        let _ = drain(&mut c);

        assert_eq!(c.skip(true), Ok(SkipOutcome::Skipped(track("b"))));
        let effects = drain(&mut c);
        let [Effect::Halt, Effect::Resolve { ticket, track }] = &effects[..] else {
            panic!("expected a halt ahead of the resolution, got {effects:?}");
        };
        assert_eq!(&**track, "b");

        // nothing is left playing when the replacement cannot be resolved
        c.resolved(
            *ticket,
            Err(ResolveError::InvalidTrackUrl(InvalidTrackUrl::Unsupported)),
        );
        assert!(!drain(&mut c).contains(&Effect::Halt));
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.state().current().is_none());
    }

    #[rstest]
    fn repeat_follows_the_skipped_to_track(playing: (Controller<Resource>, Ticket)) {
        let (mut c, _) = playing;
        c.set_repeat(true);
        let _ = c.play(track("b"), None, true);
        let _ = drain(&mut c);

        let _ = c.skip(true);
        let ticket = start(&mut c);
        c.session_event(ticket, SessionEvent::Idle);
        assert!(matches!(resolving(&drain(&mut c))[..], [(_, "b")]));
    }

    #[rstest]
    fn lost_voice_clears_without_halting(playing: (Controller<Resource>, Ticket)) {
        let (mut c, ticket) = playing;
        c.set_repeat(true);
        let _ = c.play(track("b"), None, true);
        let _ = drain(&mut c);

        c.voice_lost();
        assert_eq!(drain(&mut c), [Effect::Emit(Event::ConnectionLost)]);
        let snapshot = c.snapshot();
        assert_eq!(snapshot.phase, Phase::Idle);
        assert!(snapshot.queue.is_empty());
        assert_eq!(snapshot.history_len, 0);
        assert!(snapshot.stopped);

        c.session_event(ticket, SessionEvent::Idle);
        assert_eq!(drain(&mut c), []);
    }

    #[test]
    fn toggle_repeat() {
        let mut c = Controller::<Resource>::default();
        assert!(c.toggle_repeat());
        assert!(!c.toggle_repeat());
    }
}
