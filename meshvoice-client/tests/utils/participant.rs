use crate::utils::{InProcessConnector, MockMedia, MockTransportFactory, WAIT_TIMEOUT_MS, wait_until};
use anyhow::Result;
use meshvoice_client::{RoomSession, SessionConfig, SessionEvent};
use meshvoice_core::PeerId;
use meshvoice_server::Relay;
use std::sync::Arc;
use tokio::sync::mpsc;

pub const TEST_ROOM: &str = "Room A";

/// A session wired to mocks, plus everything a test wants to inspect.
pub struct Participant {
    pub id: PeerId,
    pub session: RoomSession,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub factory: MockTransportFactory,
    pub media: MockMedia,
    pub connector: InProcessConnector,
}

impl Participant {
    /// Joins [`TEST_ROOM`] and waits until the relay lists the new member.
    pub async fn join(relay: &Relay, name: &str) -> Result<Self> {
        Self::join_with(relay, name, SessionConfig::default()).await
    }

    pub async fn join_with(relay: &Relay, name: &str, config: SessionConfig) -> Result<Self> {
        Self::join_using(relay, name, config, MockTransportFactory::new(name)).await
    }

    pub async fn join_using(
        relay: &Relay,
        name: &str,
        config: SessionConfig,
        factory: MockTransportFactory,
    ) -> Result<Self> {
        let media = MockMedia::new();
        let (mut session, events) = RoomSession::new(config, Arc::new(factory.clone()));

        let connector = InProcessConnector::new(relay.clone());
        let id = session
            .join(&connector, media.boxed(), TEST_ROOM, Some(name))
            .await?;

        let relay = relay.clone();
        let joined = id.clone();
        wait_until(WAIT_TIMEOUT_MS, move || {
            relay.members(TEST_ROOM).iter().any(|p| p.id == joined)
        })
        .await?;

        Ok(Self {
            id,
            session,
            events,
            factory,
            media,
            connector,
        })
    }
}
