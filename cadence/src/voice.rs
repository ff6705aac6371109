use std::{
    future::Future,
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::{
    sync::{broadcast, watch},
    task::AbortHandle,
};
use tracing::Instrument;
use twilight_model::id::{Id, marker::ChannelMarker};

use crate::{
    core::konst::{connection, misc::EVENT_CHANNEL_CAPACITY},
    error::voice::{ConnectionLost, VoiceError},
};

/// What the manager believes about the voice link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Ready,
    ReconnectPending,
}

/// What the transport reports about a single link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Signalling,
    Connecting,
    Ready,
    Disconnected,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceEvent {
    Connected,
    ConnectionLost,
}

pub struct VoiceLink {
    pub channel_id: Id<ChannelMarker>,
    pub status: watch::Receiver<LinkStatus>,
}

pub trait VoiceTransport: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn join(
        &self,
        channel_id: Id<ChannelMarker>,
    ) -> impl Future<Output = Result<VoiceLink, Self::Error>> + Send;
    fn destroy(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Receivers for everything a manager publishes.
pub struct Subscription {
    pub state: watch::Receiver<ConnectionState>,
    pub events: broadcast::Receiver<VoiceEvent>,
}

struct Shared<T> {
    transport: T,
    state: watch::Sender<ConnectionState>,
    channel_id: Mutex<Option<Id<ChannelMarker>>>,
    events: broadcast::Sender<VoiceEvent>,
}

impl<T: VoiceTransport> Shared<T> {
    fn set_state(&self, new: ConnectionState) {
        let changed = self.state.send_if_modified(|state| {
            let changed = *state != new;
            *state = new;
            changed
        });
        if changed {
            tracing::debug!(state = ?new, "voice connection state changed");
            if new == ConnectionState::Ready {
                let _ = self.events.send(VoiceEvent::Connected);
            }
        }
    }

    fn set_channel(&self, channel_id: Option<Id<ChannelMarker>>) {
        if let Ok(mut guard) = self.channel_id.lock() {
            *guard = channel_id;
        }
    }

    async fn lose(&self) {
        tracing::warn!("voice connection did not recover");
        if let Err(error) = self.transport.destroy().await {
            tracing::warn!(%error, "destroying the lost voice connection failed");
        }
        self.set_channel(None);
        self.set_state(ConnectionState::Disconnected);
        let _ = self.events.send(VoiceEvent::ConnectionLost);
    }
}

/// Establishes and supervises one voice link at a time.
pub struct VoiceManager<T> {
    shared: Arc<Shared<T>>,
    supervisor: Mutex<Option<AbortHandle>>,
}

impl<T: VoiceTransport> VoiceManager<T> {
    pub fn new(transport: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport,
                state: watch::channel(ConnectionState::Disconnected).0,
                channel_id: Mutex::new(None),
                events: broadcast::channel(EVENT_CHANNEL_CAPACITY).0,
            }),
            supervisor: Mutex::new(None),
        }
    }

    pub fn transport(&self) -> &T {
        &self.shared.transport
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    pub fn channel_id(&self) -> Option<Id<ChannelMarker>> {
        self.shared.channel_id.lock().ok().and_then(|guard| *guard)
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            state: self.shared.state.subscribe(),
            events: self.shared.events.subscribe(),
        }
    }

    fn replace_supervisor(&self, handle: Option<AbortHandle>) {
        let old = self
            .supervisor
            .lock()
            .ok()
            .and_then(|mut guard| std::mem::replace(&mut *guard, handle));
        if let Some(old) = old {
            old.abort();
        }
    }

    /// Joins `channel_id`, superseding any existing link.
    ///
    /// # Errors
    ///
    /// Fails if the transport could not start the connection.
    #[tracing::instrument(skip(self), err, name = "voice_join")]
    pub async fn join(&self, channel_id: Id<ChannelMarker>) -> Result<(), VoiceError> {
        self.replace_supervisor(None);
        self.shared.set_state(ConnectionState::Connecting);

        let link = match self.shared.transport.join(channel_id).await {
            Ok(link) => link,
            Err(error) => {
                self.shared.set_state(ConnectionState::Disconnected);
                return Err(VoiceError::Join(Box::new(error)));
            }
        };
        self.shared.set_channel(Some(link.channel_id));

        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(
            supervise(link.status, shared).instrument(tracing::debug_span!("voice_supervisor")),
        );
        self.replace_supervisor(Some(handle.abort_handle()));
        Ok(())
    }

    /// Waits until the link is ready.
    ///
    /// # Errors
    ///
    /// Fails if the link is lost first or `timeout` elapses.
    pub async fn ready(&self, timeout: Duration) -> Result<(), VoiceError> {
        let mut state = self.subscribe_state();
        let wait = state
            .wait_for(|s| matches!(s, ConnectionState::Ready | ConnectionState::Disconnected));
        match tokio::time::timeout(timeout, wait).await {
            Ok(Ok(state)) if *state == ConnectionState::Ready => Ok(()),
            Ok(_) => Err(ConnectionLost.into()),
            Err(_) => Err(VoiceError::ReadyTimeout),
        }
    }

    /// Stops supervising, tears the link down and forgets it.
    ///
    /// # Errors
    ///
    /// Fails if the transport could not destroy the link.
    #[tracing::instrument(skip(self), err, name = "voice_leave")]
    pub async fn leave(&self) -> Result<(), VoiceError> {
        self.replace_supervisor(None);
        let result = self.shared.transport.destroy().await;
        self.shared.set_channel(None);
        self.shared.set_state(ConnectionState::Disconnected);
        result.map_err(|e| VoiceError::Leave(Box::new(e)))
    }
}

impl<T> Drop for VoiceManager<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.supervisor.get_mut().ok().and_then(Option::take) {
            handle.abort();
        }
    }
}

async fn supervise<T: VoiceTransport>(
    mut status: watch::Receiver<LinkStatus>,
    shared: Arc<Shared<T>>,
) {
    loop {
        let current = *status.borrow_and_update();
        match current {
            LinkStatus::Signalling | LinkStatus::Connecting => {
                shared.set_state(ConnectionState::Connecting);
            }
            LinkStatus::Ready => shared.set_state(ConnectionState::Ready),
            LinkStatus::Disconnected => {
                shared.set_state(ConnectionState::ReconnectPending);
                if !recovers(&status).await {
                    shared.lose().await;
                    return;
                }
                tracing::debug!("voice connection is recovering");
                continue;
            }
            LinkStatus::Destroyed => {
                shared.set_channel(None);
                shared.set_state(ConnectionState::Disconnected);
                return;
            }
        }

        if status.changed().await.is_err() {
            shared.set_channel(None);
            shared.set_state(ConnectionState::Disconnected);
            return;
        }
    }
}

/// Races the link re-entering `Signalling` against it re-entering
/// `Connecting`, each with its own deadline. The first branch to settle wins,
/// so an elapsed deadline means the link is lost.
async fn recovers(status: &watch::Receiver<LinkStatus>) -> bool {
    let mut signalling = status.clone();
    let mut connecting = status.clone();

    tokio::select! {
        result = tokio::time::timeout(
            connection::RECOVER_SIGNALLING_TIMEOUT,
            signalling.wait_for(|s| *s == LinkStatus::Signalling),
        ) => matches!(result, Ok(Ok(_))),
        result = tokio::time::timeout(
            connection::RECOVER_CONNECTING_TIMEOUT,
            connecting.wait_for(|s| *s == LinkStatus::Connecting),
        ) => matches!(result, Ok(Ok(_))),
    }
}
