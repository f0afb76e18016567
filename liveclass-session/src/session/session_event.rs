use crate::peer::PeerEvent;
use crate::relay::Polled;

/// Everything that reaches the session loop from outside a command.
#[derive(Debug)]
pub enum SessionEvent {
    /// One relay poll tick, possibly empty.
    Polled(Polled),
    Peer(PeerEvent),
    /// A local screen track ended on its own (the capture source went away).
    ScreenTrackEnded(String),
}
