mod chat_channel;
mod controller;
mod live_session;
mod monitor;
mod negotiation;
mod session_command;
mod session_event;
mod session_state;
mod teardown;

pub use chat_channel::*;
pub use controller::*;
pub use live_session::*;
pub use monitor::*;
pub use negotiation::*;
pub use session_command::*;
pub use session_event::*;
pub use session_state::*;
pub use teardown::*;
