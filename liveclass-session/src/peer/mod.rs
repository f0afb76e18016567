mod peer_event;
mod peer_link;
mod rtc_chat_channel;
mod rtc_peer;

pub use peer_event::*;
pub use peer_link::*;
pub use rtc_chat_channel::*;
pub use rtc_peer::*;
