mod http_relay;
mod poller;
mod signaling_relay;

pub use http_relay::*;
pub use poller::*;
pub use signaling_relay::*;
