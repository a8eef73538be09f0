use anyhow::Result;
use meshvoice_client::{PeerState, TrackAttachment};
use meshvoice_server::Relay;

use crate::integration::init_tracing;
use crate::utils::{Participant, WAIT_TIMEOUT_MS, test_track, wait_for_connected_peers};

#[tokio::test]
async fn test_new_track_reaches_every_peer() -> Result<()> {
    init_tracing();

    let relay = Relay::default();
    let alice = Participant::join(&relay, "alice").await?;
    let bob = Participant::join(&relay, "bob").await?;
    let carol = Participant::join(&relay, "carol").await?;
    wait_for_connected_peers(&alice.session, 2, WAIT_TIMEOUT_MS).await?;

    alice.session.set_local_track(test_track("headset")).await?;

    for other in [&bob.id, &carol.id] {
        assert_eq!(
            alice.factory.latest(other).unwrap().attachments(),
            vec![TrackAttachment::Added, TrackAttachment::Replaced]
        );
    }

    // A replacement needs no renegotiation.
    for peer in alice.session.peers().await {
        assert_eq!(peer.state, PeerState::Connected);
    }
    assert_eq!(alice.factory.latest(&bob.id).unwrap().offers_created(), 0);

    Ok(())
}

#[tokio::test]
async fn test_track_change_with_no_peers() -> Result<()> {
    init_tracing();

    let relay = Relay::default();
    let alice = Participant::join(&relay, "alice").await?;

    alice.session.set_local_track(test_track("headset")).await?;

    // The next connection starts from the current track.
    let bob = Participant::join(&relay, "bob").await?;
    wait_for_connected_peers(&alice.session, 1, WAIT_TIMEOUT_MS).await?;
    assert_eq!(
        alice.factory.latest(&bob.id).unwrap().attachments(),
        vec![TrackAttachment::Added]
    );

    Ok(())
}
