use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::media::MediaSource;
use crate::session::session_loop::{SessionLoop, SessionParts};
use crate::session::{PeerSummary, SessionCommand, SessionEvent};
use crate::signaling::{RelayConnector, SignalingChannel};
use crate::transport::{LocalTrack, TransportFactory};
use meshvoice_core::{ClientMessage, PeerId, ServerMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

struct ActiveSession {
    local_id: PeerId,
    room: String,
    commands: mpsc::UnboundedSender<SessionCommand>,
    task: JoinHandle<()>,
}

/// A participant's presence in one room: a full mesh of peer connections
/// coordinated through the relay.
///
/// Dropping a joined session leaves the room in the background.
pub struct RoomSession {
    config: SessionConfig,
    factory: Arc<dyn TransportFactory>,
    events: mpsc::UnboundedSender<SessionEvent>,
    active: Option<ActiveSession>,
}

impl RoomSession {
    pub fn new(
        config: SessionConfig,
        factory: Arc<dyn TransportFactory>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let session = Self {
            config,
            factory,
            events,
            active: None,
        };
        (session, events_rx)
    }

    /// Acquires local audio, connects to the relay and joins `room`.
    ///
    /// Connections to the members already present are opened right away.
    /// Fails without side effects if media or the relay is unavailable.
    pub async fn join(
        &mut self,
        connector: &dyn RelayConnector,
        mut media: Box<dyn MediaSource>,
        room: &str,
        display_name: Option<&str>,
    ) -> Result<PeerId, SessionError> {
        if self.is_joined() {
            return Err(SessionError::AlreadyJoined);
        }
        self.active = None;

        let local_track = media.acquire().await?;

        let (channel, local_id) =
            match Self::open(connector, self.config.handshake_timeout, room, display_name).await {
                Ok(opened) => opened,
                Err(e) => {
                    media.release().await;
                    return Err(e);
                }
            };

        let (commands, command_rx) = mpsc::unbounded_channel();
        let session_loop = SessionLoop::new(SessionParts {
            local_id: local_id.clone(),
            room: room.to_owned(),
            config: self.config.clone(),
            factory: self.factory.clone(),
            outbound: channel.outbound,
            relay_rx: channel.inbound,
            command_rx,
            media,
            local_track,
            events: self.events.clone(),
        });
        let task = tokio::spawn(session_loop.run());

        info!("Joined '{}' as {}", room, local_id);
        self.active = Some(ActiveSession {
            local_id: local_id.clone(),
            room: room.to_owned(),
            commands,
            task,
        });
        Ok(local_id)
    }

    async fn open(
        connector: &dyn RelayConnector,
        timeout: Duration,
        room: &str,
        display_name: Option<&str>,
    ) -> Result<(SignalingChannel, PeerId), SessionError> {
        let mut channel = connector.connect().await?;

        let greeting = tokio::time::timeout(timeout, channel.inbound.recv())
            .await
            .map_err(|_| SessionError::HandshakeTimeout(timeout))?;
        let local_id = match greeting {
            Some(ServerMessage::Welcome { id }) => id,
            Some(other) => {
                return Err(SessionError::Handshake(format!(
                    "expected welcome, got {:?}",
                    other
                )));
            }
            None => {
                return Err(SessionError::Relay(
                    "connection closed during handshake".into(),
                ));
            }
        };

        channel
            .outbound
            .send(ClientMessage::JoinRoom {
                room: room.to_owned(),
                username: display_name.map(str::to_owned),
            })
            .map_err(|_| SessionError::Relay("connection closed before join".into()))?;

        Ok((channel, local_id))
    }

    /// Closes every peer connection, disconnects from the relay and releases
    /// local media. Does nothing when not joined.
    pub async fn leave(&mut self) {
        let Some(active) = self.active.take() else {
            debug!("leave() without an active room");
            return;
        };

        let (done, done_rx) = oneshot::channel();
        if active.commands.send(SessionCommand::Leave(done)).is_ok() {
            let _ = done_rx.await;
        }
        let _ = active.task.await;
        info!("Left '{}'", active.room);
    }

    /// Points every peer connection at `track`. When this returns, no
    /// connection still sends the previous track.
    pub async fn set_local_track(&self, track: LocalTrack) -> Result<(), SessionError> {
        let active = self.active.as_ref().ok_or(SessionError::NotJoined)?;

        let (done, done_rx) = oneshot::channel();
        active
            .commands
            .send(SessionCommand::SetLocalTrack { track, done })
            .map_err(|_| SessionError::NotJoined)?;
        done_rx.await.map_err(|_| SessionError::NotJoined)
    }

    /// Live peer connections, ordered by id.
    pub async fn peers(&self) -> Vec<PeerSummary> {
        let Some(active) = &self.active else {
            return Vec::new();
        };

        let (reply, reply_rx) = oneshot::channel();
        if active.commands.send(SessionCommand::Peers(reply)).is_err() {
            return Vec::new();
        }
        reply_rx.await.unwrap_or_default()
    }

    pub fn local_id(&self) -> Option<&PeerId> {
        self.active.as_ref().map(|a| &a.local_id)
    }

    pub fn room(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.room.as_str())
    }

    /// False before `join`, after `leave`, and once the relay connection is lost.
    pub fn is_joined(&self) -> bool {
        self.active.as_ref().is_some_and(|a| !a.task.is_finished())
    }
}
