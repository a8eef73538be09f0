use crate::error::MediaError;
use crate::transport::LocalTrack;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use webrtc::api::media_engine::MIME_TYPE_OPUS;
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Local audio capture, acquired when joining and released when leaving.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&mut self) -> Result<LocalTrack, MediaError>;

    async fn release(&mut self);
}

/// Opus encoding of one 20 ms frame of silence.
const OPUS_SILENCE: [u8; 3] = [0xf8, 0xff, 0xfe];
const FRAME: Duration = Duration::from_millis(20);

/// Publishes a track that carries nothing but silence. Handy where no
/// microphone exists, such as headless clients.
#[derive(Default)]
pub struct SilentAudioSource {
    pump: Option<JoinHandle<()>>,
}

impl SilentAudioSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.pump.is_some()
    }
}

#[async_trait]
impl MediaSource for SilentAudioSource {
    async fn acquire(&mut self) -> Result<LocalTrack, MediaError> {
        if self.pump.is_some() {
            return Err(MediaError::Unavailable("already acquired".into()));
        }

        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            "audio".to_owned(),
            "meshvoice".to_owned(),
        ));

        let writer = track.clone();
        self.pump = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(FRAME);
            loop {
                ticker.tick().await;
                let sample = Sample {
                    data: Bytes::from_static(&OPUS_SILENCE),
                    duration: FRAME,
                    ..Default::default()
                };
                // Fails only while no transport is bound yet.
                if let Err(e) = writer.write_sample(&sample).await {
                    debug!("Silence frame not written: {}", e);
                }
            }
        }));

        info!("Silent audio source started");
        Ok(track)
    }

    async fn release(&mut self) {
        match self.pump.take() {
            Some(pump) => {
                pump.abort();
                info!("Silent audio source stopped");
            }
            None => warn!("Releasing an audio source that was never acquired"),
        }
    }
}
