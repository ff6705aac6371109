use std::{
    collections::{HashSet, VecDeque},
    sync::Arc,
};

use twilight_model::id::{Id, marker::ChannelMarker};

/// A track reference, exactly as the caller supplied it.
pub type TrackRef = Arc<str>;

#[derive(Debug, Default)]
pub struct PlaybackState {
    pub(super) current: Option<TrackRef>,
    /// The most recently started track; kept after it finishes for replay.
    pub(super) last: Option<TrackRef>,
    pub(super) queue: VecDeque<TrackRef>,
    pub(super) history: HashSet<TrackRef>,
    pub(super) repeat: bool,
    pub(super) stopped: bool,
    pub(super) output: Option<Id<ChannelMarker>>,
}

impl PlaybackState {
    pub const fn current(&self) -> Option<&TrackRef> {
        self.current.as_ref()
    }

    pub const fn queue(&self) -> &VecDeque<TrackRef> {
        &self.queue
    }

    pub const fn history(&self) -> &HashSet<TrackRef> {
        &self.history
    }

    pub const fn repeat(&self) -> bool {
        self.repeat
    }

    pub const fn stopped(&self) -> bool {
        self.stopped
    }

    pub const fn output(&self) -> Option<Id<ChannelMarker>> {
        self.output
    }

    pub(super) fn remember(&mut self, track: &TrackRef) {
        if !self.history.contains(track) {
            self.history.insert(track.clone());
        }
    }

    pub(super) fn push(&mut self, track: TrackRef) {
        self.remember(&track);
        self.queue.push_back(track);
    }

    pub(super) fn clear(&mut self) {
        self.current = None;
        self.queue.clear();
        self.history.clear();
        self.stopped = true;
    }

    /// The track to replay once playback goes idle with an empty queue.
    pub(super) fn replay_candidate(&self) -> Option<TrackRef> {
        (self.repeat && !self.history.is_empty() && !self.stopped)
            .then(|| self.last.clone())
            .flatten()
    }
}

#[cfg(test)]
mod test {
    use super::PlaybackState;

    #[test]
    fn history_is_idempotent() {
        let mut state = PlaybackState::default();
        state.push("a".into());
        state.push("a".into());
        state.remember(&"a".into());
        assert_eq!(state.queue().len(), 2);
        assert_eq!(state.history().len(), 1);
    }

    #[test]
    fn replay_needs_repeat_history_and_no_stop() {
        let mut state = PlaybackState {
            last: Some("a".into()),
            ..PlaybackState::default()
        };
        assert_eq!(state.replay_candidate(), None);

        state.repeat = true;
        assert_eq!(state.replay_candidate(), None);

        state.remember(&"a".into());
        assert_eq!(state.replay_candidate().as_deref(), Some("a"));

        state.clear();
        state.remember(&"a".into());
        assert_eq!(state.replay_candidate(), None);
    }
}
