use anyhow::Result;
use meshvoice_client::{
    PeerTransport, TrackAttachment, TransportError, TransportFactory, WebRtcTransport,
    WebRtcTransportFactory,
};
use meshvoice_core::{IceCandidate, PeerId, SdpKind};
use tokio::sync::mpsc;

use crate::integration::init_tracing;
use crate::utils::test_track;

// No ICE servers: these tests never leave the host.
async fn local_transport() -> Result<WebRtcTransport> {
    let (tx, _rx) = mpsc::unbounded_channel();
    Ok(WebRtcTransport::new(PeerId::new(), &[], tx).await?)
}

#[tokio::test]
async fn test_offer_carries_audio_section() -> Result<()> {
    init_tracing();

    let transport = local_transport().await?;
    let offer = transport.create_offer().await?;

    assert!(offer.contains("m=audio"));
    transport.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_first_track_added_then_replaced() -> Result<()> {
    init_tracing();

    let transport = local_transport().await?;

    assert_eq!(
        transport.attach_track(test_track("mic")).await?,
        TrackAttachment::Added
    );
    assert_eq!(
        transport.attach_track(test_track("headset")).await?,
        TrackAttachment::Replaced
    );

    // Still a single audio section.
    let offer = transport.create_offer().await?;
    assert_eq!(offer.matches("m=audio").count(), 1);
    transport.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_offer_answer_exchange() -> Result<()> {
    init_tracing();

    let caller = local_transport().await?;
    let callee = local_transport().await?;
    caller.attach_track(test_track("caller-mic")).await?;
    callee.attach_track(test_track("callee-mic")).await?;

    let offer = caller.create_offer().await?;
    callee
        .apply_remote_description(SdpKind::Offer, offer)
        .await?;
    let answer = callee.create_answer().await?;
    assert!(answer.contains("m=audio"));
    caller
        .apply_remote_description(SdpKind::Answer, answer)
        .await?;

    caller.close().await?;
    callee.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_answer_without_offer_is_rejected() -> Result<()> {
    init_tracing();

    let other = local_transport().await?;
    let sdp = other.create_offer().await?;

    let transport = local_transport().await?;
    let err = transport
        .apply_remote_description(SdpKind::Answer, sdp)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TransportError::ApplyDescription {
            kind: SdpKind::Answer,
            ..
        }
    ));

    other.close().await?;
    transport.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_candidate_needs_remote_description() -> Result<()> {
    init_tracing();

    let transport = local_transport().await?;
    let candidate = IceCandidate {
        candidate: "candidate:1 1 udp 2122260223 192.168.1.10 50000 typ host".into(),
        sdp_mid: Some("0".into()),
        sdp_m_line_index: Some(0),
    };

    let err = transport.add_remote_candidate(candidate).await.unwrap_err();
    assert!(matches!(err, TransportError::Candidate(_)));
    transport.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_rollback_without_offer_fails() -> Result<()> {
    init_tracing();

    let transport = local_transport().await?;
    let err = transport.rollback_local_offer().await.unwrap_err();

    assert!(matches!(err, TransportError::Rollback(_)));
    transport.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_factory_builds_transport() -> Result<()> {
    init_tracing();

    let (tx, _rx) = mpsc::unbounded_channel();
    let transport = WebRtcTransportFactory
        .create(&PeerId::new(), &[], tx)
        .await?;

    assert!(transport.create_offer().await?.contains("m=audio"));
    transport.close().await?;
    Ok(())
}
