use crate::error::{Error, Result};
use crate::peer::{ChatTransport, PeerEvent};
use crate::session::SessionEvent;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;

pub struct RtcChatChannel {
    dc: Arc<RTCDataChannel>,
}

impl RtcChatChannel {
    pub fn new(dc: Arc<RTCDataChannel>) -> Self {
        Self { dc }
    }
}

#[async_trait]
impl ChatTransport for RtcChatChannel {
    fn label(&self) -> String {
        self.dc.label().to_owned()
    }

    fn is_open(&self) -> bool {
        self.dc.ready_state() == RTCDataChannelState::Open
    }

    async fn send_text(&self, text: String) -> Result<()> {
        self.dc
            .send_text(text)
            .await
            .map(|_| ())
            .map_err(|e| Error::DataChannel(e.to_string()))
    }

    async fn close(&self) -> Result<()> {
        self.dc
            .close()
            .await
            .map_err(|e| Error::DataChannel(e.to_string()))
    }
}

/// Hooks open, close, error and message callbacks of `dc` into the session
/// loop. Used for both locally created and remotely opened channels.
pub fn attach_channel_handlers(dc: &Arc<RTCDataChannel>, events: mpsc::Sender<SessionEvent>) {
    let label = dc.label().to_owned();

    let open_tx = events.clone();
    let open_label = label.clone();
    dc.on_open(Box::new(move || {
        let tx = open_tx.clone();
        let label = open_label.clone();
        Box::pin(async move {
            info!("Data channel '{}' open", label);
            let _ = tx.send(SessionEvent::Peer(PeerEvent::ChannelOpened)).await;
        })
    }));

    let close_tx = events.clone();
    let close_label = label.clone();
    dc.on_close(Box::new(move || {
        let tx = close_tx.clone();
        let label = close_label.clone();
        Box::pin(async move {
            debug!("Data channel '{}' closed", label);
            let _ = tx.send(SessionEvent::Peer(PeerEvent::ChannelClosed)).await;
        })
    }));

    let err_tx = events.clone();
    dc.on_error(Box::new(move |err: webrtc::Error| {
        let tx = err_tx.clone();
        Box::pin(async move {
            warn!("Data channel error: {}", err);
            let _ = tx
                .send(SessionEvent::Peer(PeerEvent::ChannelError(err.to_string())))
                .await;
        })
    }));

    let msg_tx = events;
    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let tx = msg_tx.clone();
        Box::pin(async move {
            let _ = tx
                .send(SessionEvent::Peer(PeerEvent::ChannelMessage(msg.data)))
                .await;
        })
    }));
}
