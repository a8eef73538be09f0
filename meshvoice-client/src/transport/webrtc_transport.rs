use crate::error::TransportError;
use crate::transport::{
    LinkState, LocalTrack, PeerTransport, TrackAttachment, TransportEvent, TransportFactory,
};
use async_trait::async_trait;
use meshvoice_core::{IceCandidate, IceServerConfig, PeerId, SdpKind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::{API, APIBuilder};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::{RTCRtpTransceiver, RTCRtpTransceiverInit};
use webrtc::track::track_remote::TrackRemote;

/// [`PeerTransport`] backed by a webrtc-rs `RTCPeerConnection` carrying one
/// bidirectional audio stream.
///
/// webrtc-rs refuses a local rollback, so withdrawing an unanswered offer
/// replaces the peer connection with a fresh one. Events of a replaced
/// connection are no longer forwarded.
pub struct WebRtcTransport {
    pub peer_id: PeerId,
    api: API,
    rtc_config: RTCConfiguration,
    events: mpsc::UnboundedSender<TransportEvent>,
    epoch: Arc<AtomicU64>,
    peer_connection: RwLock<Arc<RTCPeerConnection>>,
    local_track: RwLock<Option<LocalTrack>>,
}

/// Forwards events of one peer connection while it is the current one.
#[derive(Clone)]
struct EventGate {
    tx: mpsc::UnboundedSender<TransportEvent>,
    epoch: Arc<AtomicU64>,
    own: u64,
}

impl EventGate {
    fn send(&self, event: TransportEvent) {
        if self.epoch.load(Ordering::Acquire) == self.own {
            let _ = self.tx.send(event);
        }
    }
}

impl WebRtcTransport {
    pub async fn new(
        peer_id: PeerId,
        ice_servers: &[IceServerConfig],
        event_tx: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Self, TransportError> {
        let setup = |e: webrtc::Error| TransportError::Setup(e.to_string());

        let mut m = MediaEngine::default();
        m.register_default_codecs().map_err(setup)?;
        let registry = register_default_interceptors(Registry::new(), &mut m).map_err(setup)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let epoch = Arc::new(AtomicU64::new(0));
        let gate = EventGate {
            tx: event_tx.clone(),
            epoch: Arc::clone(&epoch),
            own: 0,
        };
        let peer_connection = open_peer_connection(&api, rtc_config.clone(), &peer_id, gate)
            .await
            .map_err(setup)?;

        Ok(Self {
            peer_id,
            api,
            rtc_config,
            events: event_tx,
            epoch,
            peer_connection: RwLock::new(peer_connection),
            local_track: RwLock::new(None),
        })
    }

    async fn connection(&self) -> Arc<RTCPeerConnection> {
        Arc::clone(&*self.peer_connection.read().await)
    }

    fn remote_description(kind: SdpKind, sdp: String) -> Result<RTCSessionDescription, webrtc::Error> {
        match kind {
            SdpKind::Offer => RTCSessionDescription::offer(sdp),
            SdpKind::Answer => RTCSessionDescription::answer(sdp),
        }
    }
}

#[async_trait]
impl PeerTransport for WebRtcTransport {
    async fn create_offer(&self) -> Result<String, TransportError> {
        let failed = |e: webrtc::Error| TransportError::CreateDescription {
            kind: SdpKind::Offer,
            reason: e.to_string(),
        };
        let pc = self.connection().await;
        let offer = pc.create_offer(None).await.map_err(failed)?;
        pc.set_local_description(offer.clone()).await.map_err(failed)?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String, TransportError> {
        let failed = |e: webrtc::Error| TransportError::CreateDescription {
            kind: SdpKind::Answer,
            reason: e.to_string(),
        };
        let pc = self.connection().await;
        let answer = pc.create_answer(None).await.map_err(failed)?;
        pc.set_local_description(answer.clone()).await.map_err(failed)?;
        Ok(answer.sdp)
    }

    async fn apply_remote_description(
        &self,
        kind: SdpKind,
        sdp: String,
    ) -> Result<(), TransportError> {
        let failed = |e: webrtc::Error| TransportError::ApplyDescription {
            kind,
            reason: e.to_string(),
        };
        let desc = Self::remote_description(kind, sdp).map_err(failed)?;
        self.connection()
            .await
            .set_remote_description(desc)
            .await
            .map_err(failed)
    }

    async fn rollback_local_offer(&self) -> Result<(), TransportError> {
        let failed = |e: webrtc::Error| TransportError::Rollback(e.to_string());

        let mut current = self.peer_connection.write().await;
        if current.signaling_state() != RTCSignalingState::HaveLocalOffer {
            return Err(TransportError::Rollback("no pending local offer".into()));
        }
        // A renegotiation of a live connection cannot be withdrawn by replacing it.
        if current.current_remote_description().await.is_some() {
            return Err(TransportError::Rollback(
                "offer belongs to an established connection".into(),
            ));
        }

        let own = self.epoch.load(Ordering::Acquire) + 1;
        let gate = EventGate {
            tx: self.events.clone(),
            epoch: Arc::clone(&self.epoch),
            own,
        };
        let fresh = open_peer_connection(&self.api, self.rtc_config.clone(), &self.peer_id, gate)
            .await
            .map_err(failed)?;
        let track = self.local_track.read().await.clone();
        if let Some(track) = track {
            if let Err(e) = send_track(&fresh, track).await {
                let _ = fresh.close().await;
                return Err(failed(e));
            }
        }

        self.epoch.store(own, Ordering::Release);
        let withdrawn = std::mem::replace(&mut *current, fresh);
        drop(current);

        debug!("Replaced peer connection for {} to withdraw local offer", self.peer_id);
        if let Err(e) = withdrawn.close().await {
            warn!("Failed to close withdrawn connection for {}: {}", self.peer_id, e);
        }
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.connection()
            .await
            .add_ice_candidate(init)
            .await
            .map_err(|e| TransportError::Candidate(e.to_string()))
    }

    async fn attach_track(&self, track: LocalTrack) -> Result<TrackAttachment, TransportError> {
        let failed = |e: webrtc::Error| TransportError::Track(e.to_string());
        let pc = self.connection().await;

        let mut attachment = TrackAttachment::Added;
        for sender in pc.get_senders().await {
            if sender.track().await.is_some() {
                sender
                    .replace_track(Some(Arc::clone(&track)))
                    .await
                    .map_err(failed)?;
                attachment = TrackAttachment::Replaced;
                break;
            }
        }
        if attachment == TrackAttachment::Added {
            send_track(&pc, Arc::clone(&track)).await.map_err(failed)?;
        }

        *self.local_track.write().await = Some(track);
        Ok(attachment)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.connection()
            .await
            .close()
            .await
            .map_err(|e| TransportError::Close(e.to_string()))
    }
}

async fn open_peer_connection(
    api: &API,
    rtc_config: RTCConfiguration,
    peer_id: &PeerId,
    gate: EventGate,
) -> Result<Arc<RTCPeerConnection>, webrtc::Error> {
    let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

    // The audio m-line exists from the start so both sides agree on its
    // position. It turns sendrecv once a track is added.
    peer_connection
        .add_transceiver_from_kind(
            RTPCodecType::Audio,
            Some(RTCRtpTransceiverInit {
                direction: RTCRtpTransceiverDirection::Recvonly,
                send_encodings: vec![],
            }),
        )
        .await?;

    let state_gate = gate.clone();
    let uid_state = peer_id.clone();
    peer_connection.on_peer_connection_state_change(Box::new(
        move |s: RTCPeerConnectionState| {
            let gate = state_gate.clone();
            let uid = uid_state.clone();

            Box::pin(async move {
                info!("Peer connection state for {}: {}", uid, s);
                gate.send(TransportEvent::ConnectionState(LinkState::from(s)));
            })
        },
    ));

    // Trickle ICE. The end-of-candidates marker is not forwarded.
    let ice_gate = gate.clone();
    let uid_ice = peer_id.clone();
    peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
        let gate = ice_gate.clone();
        let uid = uid_ice.clone();

        Box::pin(async move {
            let Some(candidate) = c else {
                debug!("ICE gathering finished for {}", uid);
                return;
            };
            let init = match candidate.to_json() {
                Ok(init) => init,
                Err(e) => {
                    warn!("Unserializable local candidate for {}: {}", uid, e);
                    return;
                }
            };
            gate.send(TransportEvent::LocalCandidate(IceCandidate {
                candidate: init.candidate,
                sdp_mid: init.sdp_mid,
                sdp_m_line_index: init.sdp_mline_index,
            }));
        })
    }));

    let track_gate = gate;
    let uid_track = peer_id.clone();
    peer_connection.on_track(Box::new(
        move |track: Arc<TrackRemote>,
              _receiver: Arc<RTCRtpReceiver>,
              _transceiver: Arc<RTCRtpTransceiver>| {
            let gate = track_gate.clone();
            let uid = uid_track.clone();

            Box::pin(async move {
                info!("Remote {} track from {}", track.kind(), uid);
                gate.send(TransportEvent::RemoteTrack(track));
            })
        },
    ));

    Ok(peer_connection)
}

/// Fills the idle audio transceiver with `track`.
async fn send_track(
    peer_connection: &RTCPeerConnection,
    track: LocalTrack,
) -> Result<(), webrtc::Error> {
    let sender = peer_connection.add_track(track).await?;

    // RTCP has to be read for interceptors (NACK, reports) to work.
    tokio::spawn(async move {
        let mut rtcp_buf = vec![0u8; 1500];
        while sender.read(&mut rtcp_buf).await.is_ok() {}
    });
    Ok(())
}

/// Creates a [`WebRtcTransport`] per remote participant.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebRtcTransportFactory;

#[async_trait]
impl TransportFactory for WebRtcTransportFactory {
    async fn create(
        &self,
        peer_id: &PeerId,
        ice_servers: &[IceServerConfig],
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>, TransportError> {
        let transport = WebRtcTransport::new(peer_id.clone(), ice_servers, events).await?;
        Ok(Box::new(transport))
    }
}
