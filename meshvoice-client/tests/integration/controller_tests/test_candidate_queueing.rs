use meshvoice_client::{PeerState, Role};
use meshvoice_core::{PeerId, SignalPayload};

use crate::integration::init_tracing;
use crate::utils::{ControllerHarness, candidate};

#[tokio::test]
async fn test_early_candidates_applied_in_order() {
    init_tracing();

    let mut h = ControllerHarness::new(Role::Responder, PeerId::new(), PeerId::new());

    for n in 1..=3 {
        h.controller
            .handle_signal(Some(SignalPayload::Candidate(candidate(n))))
            .await;
    }
    assert_eq!(h.controller.queued_candidates(), 3);
    assert!(h.transport.applied_candidates().is_empty());
    assert_eq!(h.controller.state(), PeerState::Idle);

    h.controller
        .handle_signal(Some(SignalPayload::Offer { sdp: "offer".into() }))
        .await;

    assert_eq!(
        h.transport.applied_candidates(),
        vec![candidate(1), candidate(2), candidate(3)]
    );
    assert_eq!(h.controller.queued_candidates(), 0);
}

#[tokio::test]
async fn test_late_candidate_applied_immediately() {
    init_tracing();

    let mut h = ControllerHarness::new(Role::Responder, PeerId::new(), PeerId::new());
    h.controller
        .handle_signal(Some(SignalPayload::Candidate(candidate(1))))
        .await;
    h.controller
        .handle_signal(Some(SignalPayload::Offer { sdp: "offer".into() }))
        .await;
    h.controller
        .handle_signal(Some(SignalPayload::Candidate(candidate(2))))
        .await;

    assert_eq!(h.controller.queued_candidates(), 0);
    assert_eq!(
        h.transport.applied_candidates(),
        vec![candidate(1), candidate(2)]
    );
}

#[tokio::test]
async fn test_local_candidates_held_until_answer() {
    init_tracing();

    let mut h = ControllerHarness::new(Role::Initiator, PeerId::new(), PeerId::new());
    h.controller.start().await;
    h.pump().await;

    // Gathered right after the offer, but nothing is known about the remote yet.
    assert_eq!(h.sink.kinds(), vec!["offer"]);

    h.controller
        .handle_signal(Some(SignalPayload::Answer {
            sdp: "answer".into(),
        }))
        .await;

    assert_eq!(h.sink.kinds(), vec!["offer", "candidate"]);
    let sent = h.sink.candidates();
    assert!(sent[0].candidate.contains("offer"));
}

#[tokio::test]
async fn test_candidates_dropped_with_failed_record() {
    init_tracing();

    let mut h = ControllerHarness::new(Role::Responder, PeerId::new(), PeerId::new());
    h.controller
        .handle_signal(Some(SignalPayload::Candidate(candidate(1))))
        .await;
    h.transport.emit(meshvoice_client::TransportEvent::ConnectionState(
        meshvoice_client::LinkState::Failed,
    ));
    h.pump().await;

    assert_eq!(h.controller.state(), PeerState::Failed);
    assert_eq!(h.controller.queued_candidates(), 0);
}
