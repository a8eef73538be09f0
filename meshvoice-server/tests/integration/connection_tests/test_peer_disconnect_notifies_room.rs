use meshvoice_core::{ClientMessage, ServerMessage};
use meshvoice_server::Relay;

use crate::integration::init_tracing;
use crate::utils::{SIGNAL_TIMEOUT_MS, TestClient, departed_ids};

#[tokio::test]
async fn test_peer_disconnect_notifies_room() {
    init_tracing();

    let relay = Relay::default();
    let mut alice = TestClient::connect(&relay);
    let mut bob = TestClient::connect(&relay);
    alice.join("Room A", "A");
    bob.join("Room A", "B");
    alice.drain();

    bob.disconnect();

    let msg = alice.recv(SIGNAL_TIMEOUT_MS).await.expect("peer-disconnect");
    assert_eq!(msg, ServerMessage::PeerDisconnect { id: bob.id.clone() });
    assert_eq!(relay.members("Room A").len(), 1);
    assert!(!relay.is_connected(&bob.id));

    // A second disconnect is a no-op.
    bob.disconnect();
    assert!(alice.drain().is_empty());
}

#[tokio::test]
async fn test_last_member_leaving_drops_room() {
    init_tracing();

    let relay = Relay::default();
    let mut alice = TestClient::connect(&relay);
    alice.join("Room A", "A");
    assert_eq!(relay.room_count(), 1);

    alice.disconnect();

    assert_eq!(relay.room_count(), 0);
    assert!(relay.members("Room A").is_empty());
}

#[tokio::test]
async fn test_disconnect_reaches_every_joined_room() {
    init_tracing();

    let relay = Relay::default();
    let mut roamer = TestClient::connect(&relay);
    let mut in_a = TestClient::connect(&relay);
    let mut in_b = TestClient::connect(&relay);
    in_a.join("Room A", "a");
    in_b.join("Room B", "b");
    roamer.join("Room A", "roamer");
    roamer.join("Room B", "roamer");
    in_a.drain();
    in_b.drain();

    roamer.disconnect();

    assert_eq!(departed_ids(&in_a.drain()), vec![roamer.id.clone()]);
    assert_eq!(departed_ids(&in_b.drain()), vec![roamer.id.clone()]);
}

#[tokio::test]
async fn test_explicit_leave_room() {
    init_tracing();

    let relay = Relay::default();
    let mut alice = TestClient::connect(&relay);
    let mut bob = TestClient::connect(&relay);
    alice.join("Room A", "A");
    bob.join("Room A", "B");
    alice.drain();

    bob.send(ClientMessage::LeaveRoom {
        room: "Room A".into(),
    });

    assert_eq!(departed_ids(&alice.drain()), vec![bob.id.clone()]);
    assert!(relay.is_connected(&bob.id), "leaving a room keeps the socket");

    // Disconnecting afterwards does not announce the departure twice.
    bob.disconnect();
    assert!(alice.drain().is_empty());
}
