use anyhow::Result;
use meshvoice_client::{LinkState, PeerState, SessionEvent, TransportEvent};
use meshvoice_server::Relay;

use crate::integration::init_tracing;
use crate::utils::{Participant, WAIT_TIMEOUT_MS, wait_for_connected_peers, wait_for_event};

#[tokio::test]
async fn test_failed_connection_is_dropped_alone() -> Result<()> {
    init_tracing();

    let relay = Relay::default();
    let mut alice = Participant::join(&relay, "alice").await?;
    let bob = Participant::join(&relay, "bob").await?;
    let carol = Participant::join(&relay, "carol").await?;
    wait_for_connected_peers(&alice.session, 2, WAIT_TIMEOUT_MS).await?;

    let towards_bob = alice.factory.latest(&bob.id).unwrap();
    towards_bob.emit(TransportEvent::ConnectionState(LinkState::Failed));

    wait_for_event(&mut alice.events, WAIT_TIMEOUT_MS, |e| {
        matches!(e, SessionEvent::PeerStateChanged { id, state: PeerState::Failed } if *id == bob.id)
    })
    .await?;

    let peers = alice.session.peers().await;
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].id, carol.id);
    assert_eq!(peers[0].state, PeerState::Connected);
    assert_eq!(towards_bob.close_count(), 1);
    assert_eq!(alice.factory.latest(&carol.id).unwrap().close_count(), 0);

    // The relay still lists everyone; only the peer link is gone.
    assert_eq!(relay.members(crate::utils::TEST_ROOM).len(), 3);
    assert!(alice.session.is_joined());

    Ok(())
}
