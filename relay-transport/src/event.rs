use relay_proto::Address;

/// Typed events the reliable-datagram transport delivers to the core
/// (spec.md §1 "out of scope" collaborator, §4.6 "typed events").
///
/// `receive_port` on [`Packet`] is the local port the data arrived on:
/// the listen port for control-protocol traffic, a server-relay port for
/// already-proxied game traffic, or `0` for events tied to an outbound
/// connection attempt rather than to a specific local socket.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Packet {
        from: Address,
        receive_port: u16,
        payload: Vec<u8>,
    },
    NewIncomingConnection {
        from: Address,
        receive_port: u16,
    },
    ConnectionRequestAccepted {
        peer: Address,
    },
    ConnectionAttemptFailed {
        peer: Address,
    },
    /// `receive_port` is `Some(p)` when the lost connection was on server-relay
    /// port `p` (spec.md §4.6 item 6: also removes `(peer, p)` from `portUsers`);
    /// `None` when it was on the listen port (a registered server or client).
    ConnectionLost {
        peer: Address,
        receive_port: Option<u16>,
    },
    DisconnectionNotification {
        peer: Address,
        receive_port: Option<u16>,
    },
    /// The transport's own "already connected" notice (spec.md §9 supplement #1):
    /// acknowledged, never treated as an error.
    AlreadyConnected {
        peer: Address,
    },
    /// A server rejected our connect password (spec.md §4.6).
    InvalidPassword {
        from: Address,
        payload: Vec<u8>,
    },
    NatTargetNotConnected {
        target: Address,
    },
    NatConnectionToTargetLost {
        target: Address,
    },
}

impl TransportEvent {
    /// The local port this event arrived on, when it has one. Used by the
    /// event loop to decide whether a disconnect/lost event also implies a
    /// `portUsers` cleanup for a specific server-relay port (spec.md §4.6 item 6).
    pub fn receive_port(&self) -> Option<u16> {
        match self {
            TransportEvent::Packet { receive_port, .. }
            | TransportEvent::NewIncomingConnection { receive_port, .. } => Some(*receive_port),
            TransportEvent::ConnectionLost { receive_port, .. }
            | TransportEvent::DisconnectionNotification { receive_port, .. } => *receive_port,
            _ => None,
        }
    }
}
