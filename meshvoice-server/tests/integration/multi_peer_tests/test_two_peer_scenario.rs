use meshvoice_core::{ClientMessage, ServerMessage};
use meshvoice_server::Relay;
use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::{SIGNAL_TIMEOUT_MS, TestClient};

/// A joins, B joins, B offers, A answers, candidates flow both ways, B drops.
#[tokio::test]
async fn test_two_peer_scenario() {
    init_tracing();

    let relay = Relay::default();
    let mut a = TestClient::connect(&relay);
    let mut b = TestClient::connect(&relay);

    assert!(a.join("Room A", "A").is_empty());

    let seen_by_b = b.join("Room A", "B");
    assert_eq!(seen_by_b.len(), 1);
    assert_eq!(seen_by_b[0].id, a.id);
    assert_eq!(seen_by_b[0].username, "A");

    match a.recv(SIGNAL_TIMEOUT_MS).await.unwrap() {
        ServerMessage::NewPeer(info) => {
            assert_eq!(info.id, b.id);
            assert_eq!(info.username, "B");
        }
        other => panic!("expected new-peer, got {:?}", other),
    }

    let offer = json!({"type": "offer", "sdp": "offer-sdp"});
    b.send(ClientMessage::Signal {
        to: a.id.clone(),
        signal: offer.clone(),
    });
    assert_eq!(
        a.recv(SIGNAL_TIMEOUT_MS).await.unwrap(),
        ServerMessage::Signal {
            from: b.id.clone(),
            signal: offer
        }
    );

    let answer = json!({"type": "answer", "sdp": "answer-sdp"});
    a.send(ClientMessage::Signal {
        to: b.id.clone(),
        signal: answer.clone(),
    });
    assert_eq!(
        b.recv(SIGNAL_TIMEOUT_MS).await.unwrap(),
        ServerMessage::Signal {
            from: a.id.clone(),
            signal: answer
        }
    );

    let candidate = json!({"type": "candidate", "candidate": "candidate:1 1 udp 1 10.0.0.2 9 typ host", "sdpMid": "0", "sdpMLineIndex": 0});
    a.send(ClientMessage::Signal {
        to: b.id.clone(),
        signal: candidate.clone(),
    });
    b.send(ClientMessage::Signal {
        to: a.id.clone(),
        signal: candidate.clone(),
    });
    assert!(matches!(
        b.recv(SIGNAL_TIMEOUT_MS).await.unwrap(),
        ServerMessage::Signal { .. }
    ));
    assert!(matches!(
        a.recv(SIGNAL_TIMEOUT_MS).await.unwrap(),
        ServerMessage::Signal { .. }
    ));

    b.disconnect();
    assert_eq!(
        a.recv(SIGNAL_TIMEOUT_MS).await.unwrap(),
        ServerMessage::PeerDisconnect { id: b.id.clone() }
    );
    assert_eq!(relay.members("Room A").len(), 1);
}
