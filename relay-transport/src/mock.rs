use crate::event::TransportEvent;
use crate::transport::Transport;
use flux::net::NetworkResult;
use relay_proto::Address;
use std::collections::{HashSet, VecDeque};

/// In-memory double used by `relay-core`'s tests (spec.md §8). Tests push
/// events with [`MockTransport::push_event`] and assert against
/// [`MockTransport::sent`]/`connect_calls`/`close_calls`.
#[derive(Default)]
pub struct MockTransport {
    pending: VecDeque<TransportEvent>,
    pub sent: Vec<(Address, Vec<u8>)>,
    pub connect_calls: Vec<(Address, Option<Vec<u8>>, bool)>,
    pub close_calls: Vec<Address>,
    pub opened_ports: HashSet<u16>,
    pub closed_ports: Vec<u16>,
    pub incoming_password: Option<Vec<u8>>,
    connected: HashSet<Address>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an event to be returned by the next [`Transport::poll`] call.
    pub fn push_event(&mut self, event: TransportEvent) {
        match &event {
            TransportEvent::ConnectionRequestAccepted { peer }
            | TransportEvent::NewIncomingConnection { from: peer, .. } => {
                self.connected.insert(*peer);
            }
            TransportEvent::ConnectionLost { peer, .. }
            | TransportEvent::DisconnectionNotification { peer, .. }
            | TransportEvent::ConnectionAttemptFailed { peer } => {
                self.connected.remove(peer);
            }
            _ => {}
        }
        self.pending.push_back(event);
    }
}

impl Transport for MockTransport {
    fn open_port(&mut self, port: u16) -> NetworkResult<()> {
        self.opened_ports.insert(port);
        Ok(())
    }

    fn close_port(&mut self, port: u16) {
        self.opened_ports.remove(&port);
        self.closed_ports.push(port);
    }

    fn poll(&mut self) -> Vec<TransportEvent> {
        self.pending.drain(..).collect()
    }

    fn send(&mut self, to: Address, payload: Vec<u8>) -> NetworkResult<()> {
        self.sent.push((to, payload));
        Ok(())
    }

    fn connect(&mut self, to: Address, password: Option<&[u8]>, via_nat: bool) -> NetworkResult<()> {
        self.connect_calls.push((to, password.map(|p| p.to_vec()), via_nat));
        Ok(())
    }

    fn close(&mut self, peer: Address) {
        self.connected.remove(&peer);
        self.close_calls.push(peer);
    }

    fn is_connected(&self, peer: Address) -> bool {
        self.connected.contains(&peer)
    }

    fn set_incoming_password(&mut self, password: Option<&[u8]>) {
        self.incoming_password = password.map(|p| p.to_vec());
    }
}
