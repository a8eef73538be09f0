use meshvoice_client::{PeerState, Role, TrackAttachment};
use meshvoice_core::{PeerId, SignalPayload};

use crate::integration::init_tracing;
use crate::utils::{ControllerHarness, test_track};

async fn connected_initiator() -> ControllerHarness {
    let mut h = ControllerHarness::new(Role::Initiator, PeerId::new(), PeerId::new());
    h.controller.start().await;
    h.controller
        .handle_signal(Some(SignalPayload::Answer { sdp: "a1".into() }))
        .await;
    h.pump().await;
    assert_eq!(h.controller.state(), PeerState::Connected);
    h
}

#[tokio::test]
async fn test_added_track_renegotiates_replacement_does_not() {
    init_tracing();

    let mut h = connected_initiator().await;

    h.controller.set_track(test_track("first")).await;
    assert_eq!(h.transport.offers_created(), 2);
    assert_eq!(h.controller.state(), PeerState::Negotiating);

    h.controller
        .handle_signal(Some(SignalPayload::Answer { sdp: "a2".into() }))
        .await;
    // No new "connected" report arrives; the last one still holds.
    assert_eq!(h.controller.state(), PeerState::Connected);

    h.controller.set_track(test_track("second")).await;
    assert_eq!(h.transport.offers_created(), 2);
    assert_eq!(h.controller.state(), PeerState::Connected);
    assert_eq!(
        h.transport.attachments(),
        vec![TrackAttachment::Added, TrackAttachment::Replaced]
    );
}

#[tokio::test]
async fn test_track_added_during_offer_waits_for_answer() {
    init_tracing();

    let mut h = ControllerHarness::new(Role::Initiator, PeerId::new(), PeerId::new());
    h.controller.start().await;

    h.controller.set_track(test_track("mic")).await;
    assert_eq!(h.transport.offers_created(), 1);

    h.controller
        .handle_signal(Some(SignalPayload::Answer { sdp: "a1".into() }))
        .await;
    assert_eq!(h.transport.offers_created(), 2);
    assert!(h.controller.offer_outstanding());

    // Connectivity alone does not finish a pending renegotiation.
    h.pump().await;
    assert_eq!(h.controller.state(), PeerState::Negotiating);
}

#[tokio::test]
async fn test_track_before_any_offer_needs_no_negotiation() {
    init_tracing();

    let mut h = ControllerHarness::new(Role::Responder, PeerId::new(), PeerId::new());
    h.controller.set_track(test_track("mic")).await;

    assert_eq!(h.controller.state(), PeerState::Idle);
    assert_eq!(h.transport.offers_created(), 0);
    assert!(h.sink.sent().is_empty());
}
