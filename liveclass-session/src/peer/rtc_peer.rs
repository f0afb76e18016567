use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::media::{LocalTrack, RemoteTrackInfo, TrackKind};
use crate::peer::{
    ChatTransport, IceConnectivity, PeerConnectivity, PeerConnector, PeerEvent, PeerLink,
    RtcChatChannel, SignalingState, attach_channel_handlers,
};
use crate::session::SessionEvent;
use async_trait::async_trait;
use liveclass_core::{IceCandidate, SdpKind, SessionDescription};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, trace};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_init::RTCDataChannelInit;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Builds webrtc-rs peer connections.
#[derive(Debug, Clone, Default)]
pub struct RtcConnector;

#[async_trait]
impl PeerConnector for RtcConnector {
    async fn connect(
        &self,
        config: &SessionConfig,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Arc<dyn PeerLink>> {
        let peer = RtcPeer::new(config, events).await?;
        Ok(Arc::new(peer))
    }
}

pub struct RtcPeer {
    pc: Arc<RTCPeerConnection>,
    events: mpsc::Sender<SessionEvent>,
    video_sender: Mutex<Option<Arc<RTCRtpSender>>>,
}

impl RtcPeer {
    pub async fn new(config: &SessionConfig, events: mpsc::Sender<SessionEvent>) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ice_candidate_pool_size: config.ice_candidate_pool_size,
            ..Default::default()
        };

        let pc = Arc::new(api.new_peer_connection(rtc_config).await?);

        let ice_state_tx = events.clone();
        pc.on_ice_connection_state_change(Box::new(move |s: RTCIceConnectionState| {
            let tx = ice_state_tx.clone();
            Box::pin(async move {
                debug!("ICE connection state: {}", s);
                let state = ice_connectivity(s);
                let _ = tx
                    .send(SessionEvent::Peer(PeerEvent::IceConnectionState(state)))
                    .await;
            })
        }));

        let pc_state_tx = events.clone();
        pc.on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
            let tx = pc_state_tx.clone();
            Box::pin(async move {
                info!("Peer connection state: {}", s);
                let state = peer_connectivity(s);
                let _ = tx
                    .send(SessionEvent::Peer(PeerEvent::ConnectionState(state)))
                    .await;
            })
        }));

        let ice_tx = events.clone();
        pc.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_mline_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                };
                let _ = tx
                    .send(SessionEvent::Peer(PeerEvent::LocalCandidate(candidate)))
                    .await;
            })
        }));

        let track_tx = events.clone();
        pc.on_track(Box::new(move |track: Arc<TrackRemote>, _receiver, _transceiver| {
            let tx = track_tx.clone();
            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    _ => TrackKind::Video,
                };
                let info = RemoteTrackInfo {
                    id: track.id(),
                    kind,
                    stream_id: track.stream_id(),
                };
                info!("Remote {} track {} arrived", info.kind, info.id);
                let _ = tx.send(SessionEvent::Peer(PeerEvent::RemoteTrack(info))).await;

                // Drain in a separate task so the handler returns.
                tokio::spawn(async move {
                    while track.read_rtp().await.is_ok() {}
                    trace!("Remote track {} finished", track.id());
                });
            })
        }));

        let dc_tx = events.clone();
        pc.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            Box::pin(async move {
                debug!("Remote opened data channel '{}'", dc.label());
                let transport: Arc<dyn ChatTransport> = Arc::new(RtcChatChannel::new(dc.clone()));
                let _ = tx
                    .send(SessionEvent::Peer(PeerEvent::ChannelReceived(transport)))
                    .await;
                attach_channel_handlers(&dc, tx);
            })
        }));

        Ok(Self {
            pc,
            events,
            video_sender: Mutex::new(None),
        })
    }
}

#[async_trait]
impl PeerLink for RtcPeer {
    async fn add_track(&self, track: &LocalTrack) -> Result<()> {
        let sender = self
            .pc
            .add_track(track.rtc_track() as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .map_err(|e| Error::MediaTrack(format!("failed to add {} track: {e}", track.kind())))?;

        if track.kind() == TrackKind::Video {
            *self.video_sender.lock().await = Some(sender.clone());
        }

        // RTCP has to be read for the interceptors to run.
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while sender.read(&mut buf).await.is_ok() {}
        });
        Ok(())
    }

    async fn replace_video_track(&self, track: &LocalTrack) -> Result<()> {
        let sender = self
            .video_sender
            .lock()
            .await
            .clone()
            .ok_or_else(|| Error::MediaTrack("no outgoing video sender".to_owned()))?;
        sender
            .replace_track(Some(track.rtc_track() as Arc<dyn TrackLocal + Send + Sync>))
            .await
            .map_err(|e| Error::MediaTrack(format!("failed to replace video track: {e}")))
    }

    async fn create_chat_channel(&self, label: &str) -> Result<Arc<dyn ChatTransport>> {
        let init = RTCDataChannelInit {
            ordered: Some(true),
            ..Default::default()
        };
        let dc = self
            .pc
            .create_data_channel(label, Some(init))
            .await
            .map_err(|e| Error::DataChannel(e.to_string()))?;
        attach_channel_handlers(&dc, self.events.clone());
        Ok(Arc::new(RtcChatChannel::new(dc)))
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.pc.create_offer(None).await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.pc.create_answer(None).await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = to_rtc_description(desc)?;
        self.pc.set_local_description(desc).await?;
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = to_rtc_description(desc)?;
        self.pc.set_remote_description(desc).await?;
        Ok(())
    }

    fn signaling_state(&self) -> SignalingState {
        match self.pc.signaling_state() {
            RTCSignalingState::HaveLocalOffer => SignalingState::HaveLocalOffer,
            RTCSignalingState::HaveRemoteOffer => SignalingState::HaveRemoteOffer,
            RTCSignalingState::HaveLocalPranswer => SignalingState::HaveLocalPranswer,
            RTCSignalingState::HaveRemotePranswer => SignalingState::HaveRemotePranswer,
            RTCSignalingState::Closed => SignalingState::Closed,
            _ => SignalingState::Stable,
        }
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_mline_index,
            username_fragment: candidate.username_fragment,
        };
        self.pc
            .add_ice_candidate(init)
            .await
            .map_err(|e| Error::IceCandidate(e.to_string()))
    }

    async fn close(&self) -> Result<()> {
        self.pc.close().await?;
        Ok(())
    }
}

fn to_rtc_description(desc: SessionDescription) -> Result<RTCSessionDescription> {
    let parsed = match desc.kind {
        SdpKind::Offer => RTCSessionDescription::offer(desc.sdp),
        SdpKind::Answer => RTCSessionDescription::answer(desc.sdp),
    };
    parsed.map_err(|e| Error::Sdp(e.to_string()))
}

fn ice_connectivity(state: RTCIceConnectionState) -> IceConnectivity {
    match state {
        RTCIceConnectionState::Checking => IceConnectivity::Checking,
        RTCIceConnectionState::Connected => IceConnectivity::Connected,
        RTCIceConnectionState::Completed => IceConnectivity::Completed,
        RTCIceConnectionState::Disconnected => IceConnectivity::Disconnected,
        RTCIceConnectionState::Failed => IceConnectivity::Failed,
        RTCIceConnectionState::Closed => IceConnectivity::Closed,
        _ => IceConnectivity::New,
    }
}

fn peer_connectivity(state: RTCPeerConnectionState) -> PeerConnectivity {
    match state {
        RTCPeerConnectionState::Connecting => PeerConnectivity::Connecting,
        RTCPeerConnectionState::Connected => PeerConnectivity::Connected,
        RTCPeerConnectionState::Disconnected => PeerConnectivity::Disconnected,
        RTCPeerConnectionState::Failed => PeerConnectivity::Failed,
        RTCPeerConnectionState::Closed => PeerConnectivity::Closed,
        _ => PeerConnectivity::New,
    }
}
