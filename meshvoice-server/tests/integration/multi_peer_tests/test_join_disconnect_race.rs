use std::collections::BTreeSet;
use std::sync::Barrier;

use meshvoice_core::PeerId;
use meshvoice_server::Relay;
use tokio::sync::mpsc;

use crate::integration::init_tracing;
use crate::utils::{TestClient, departed_ids, ids, new_peer_ids};

const ROUNDS: usize = 5000;
const ROOM: &str = "Room A";

/// A join racing the same connection's disconnect never leaves the
/// participant behind in the room.
#[test]
fn test_join_racing_disconnect_leaves_no_ghost() {
    init_tracing();

    let relay = Relay::default();
    let mut watcher = TestClient::connect(&relay);
    watcher.join(ROOM, "watcher");
    let only_watcher: BTreeSet<PeerId> = [watcher.id.clone()].into();

    for round in 0..ROUNDS {
        let (tx, _rx) = mpsc::unbounded_channel();
        let racer = relay.connect(tx);
        let barrier = Barrier::new(2);

        std::thread::scope(|s| {
            s.spawn(|| {
                barrier.wait();
                relay.join(&racer, ROOM, Some("racer"));
            });
            s.spawn(|| {
                barrier.wait();
                relay.disconnect(&racer);
            });
        });

        assert!(!relay.is_connected(&racer));
        assert_eq!(
            ids(&relay.members(ROOM)),
            only_watcher,
            "ghost left behind in round {}",
            round
        );
    }

    // Whoever the watcher saw arrive, it also saw leave.
    let frames = watcher.drain();
    let arrived: BTreeSet<PeerId> = new_peer_ids(&frames).into_iter().collect();
    let departed: BTreeSet<PeerId> = departed_ids(&frames).into_iter().collect();
    assert_eq!(arrived, departed);
    assert_eq!(relay.connection_count(), 1);
}
