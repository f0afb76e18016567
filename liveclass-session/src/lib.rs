//! Two-party live session over WebRTC, signaled through a polling relay.
//!
//! [`LiveSession::start`] spawns the session task and hands back a
//! [`SessionController`] for the UI side. Relay, peer connection and capture
//! are traits so each can be replaced independently.

mod config;
mod error;
pub mod media;
pub mod peer;
pub mod relay;
pub mod session;

pub use config::*;
pub use error::*;
pub use media::*;
pub use peer::*;
pub use relay::*;
pub use session::*;
