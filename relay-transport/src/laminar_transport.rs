use crate::event::TransportEvent;
use crate::transport::Transport;
use flux::net::{ErrorType, NetworkError, NetworkResult};
use laminar::{Packet, Socket, SocketEvent};
use relay_proto::Address;
use slog::Logger;
use std::collections::{HashMap, HashSet};
use std::convert::TryFrom;
use std::net::SocketAddr;
use std::time::Instant;

/// One bound UDP socket plus the bookkeeping `laminar` doesn't give us for
/// free: which peers we dialed out to (so a later `Connect` event can be told
/// apart from an unsolicited inbound one), and which peers currently count as
/// connected.
struct PortSocket {
    socket: Socket,
    pending_outbound: HashSet<SocketAddr>,
    connected: HashSet<SocketAddr>,
}

impl PortSocket {
    fn bind(addr: SocketAddr) -> NetworkResult<Self> {
        let socket = Socket::bind(addr).map_err(|_| NetworkError::Fatal(ErrorType::AddrParse))?;
        Ok(PortSocket {
            socket,
            pending_outbound: HashSet::new(),
            connected: HashSet::new(),
        })
    }
}

/// Production [`Transport`] backed by [`laminar`], a semi-reliable UDP
/// transport built for games — the closest real crate to the RakNet-style
/// reliable-datagram transport spec.md treats as an external collaborator.
///
/// `laminar` has no explicit `connect()`/accept handshake of its own; it
/// treats any address it has exchanged packets with as "connected" and fires
/// `SocketEvent::Connect` the first time that happens. This adapter
/// approximates spec.md's RakNet-flavoured event taxonomy on top of that:
/// a `Connect` for an address we dialed via [`Transport::connect`] becomes
/// `ConnectionRequestAccepted`; an unsolicited one becomes
/// `NewIncomingConnection`. A `Timeout` for a never-connected dial becomes
/// `ConnectionAttemptFailed`; for an established peer it becomes
/// `ConnectionLost`. See DESIGN.md's open-question ledger for the rationale.
pub struct LaminarTransport {
    listen_port: u16,
    primary: PortSocket,
    relay_ports: HashMap<u16, PortSocket>,
    log: Logger,
}

impl LaminarTransport {
    pub fn bind(listen_addr: SocketAddr, log: Logger) -> NetworkResult<Self> {
        let listen_port = listen_addr.port();
        Ok(LaminarTransport {
            listen_port,
            primary: PortSocket::bind(listen_addr)?,
            relay_ports: HashMap::new(),
            log,
        })
    }

    fn drain_port(
        receive_port: u16,
        port: &mut PortSocket,
        out: &mut Vec<TransportEvent>,
    ) {
        port.socket.manual_poll(Instant::now());
        while let Some(event) = port.socket.recv() {
            match event {
                SocketEvent::Packet(packet) => {
                    if let Ok(from) = Address::try_from(packet.addr()) {
                        out.push(TransportEvent::Packet {
                            from,
                            receive_port,
                            payload: packet.payload().to_vec(),
                        });
                    }
                }
                SocketEvent::Connect(addr) => {
                    let from = match Address::try_from(addr) {
                        Ok(a) => a,
                        Err(_) => continue,
                    };
                    port.connected.insert(addr);
                    if port.pending_outbound.remove(&addr) {
                        out.push(TransportEvent::ConnectionRequestAccepted { peer: from });
                    } else {
                        out.push(TransportEvent::NewIncomingConnection {
                            from,
                            receive_port,
                        });
                    }
                }
                SocketEvent::Timeout(addr) => {
                    let peer = match Address::try_from(addr) {
                        Ok(a) => a,
                        Err(_) => continue,
                    };
                    let was_connected = port.connected.remove(&addr);
                    let was_pending = port.pending_outbound.remove(&addr);
                    if was_connected {
                        out.push(TransportEvent::ConnectionLost {
                            peer,
                            receive_port: Some(receive_port),
                        });
                    } else if was_pending {
                        out.push(TransportEvent::ConnectionAttemptFailed { peer });
                    }
                }
                SocketEvent::Disconnect(addr) => {
                    if let Ok(peer) = Address::try_from(addr) {
                        port.connected.remove(&addr);
                        out.push(TransportEvent::DisconnectionNotification {
                            peer,
                            receive_port: Some(receive_port),
                        });
                    }
                }
            }
        }
    }
}

impl Transport for LaminarTransport {
    fn open_port(&mut self, port: u16) -> NetworkResult<()> {
        let addr: SocketAddr = format!("0.0.0.0:{}", port)
            .parse()
            .map_err(|_| NetworkError::Fatal(ErrorType::AddrParse))?;
        slog::debug!(self.log, "opening server-relay port"; "port" => port);
        self.relay_ports.insert(port, PortSocket::bind(addr)?);
        Ok(())
    }

    fn close_port(&mut self, port: u16) {
        slog::debug!(self.log, "closing server-relay port"; "port" => port);
        self.relay_ports.remove(&port);
    }

    fn poll(&mut self) -> Vec<TransportEvent> {
        let mut out = Vec::new();
        Self::drain_port(self.listen_port, &mut self.primary, &mut out);
        for (port, socket) in self.relay_ports.iter_mut() {
            Self::drain_port(*port, socket, &mut out);
        }
        out
    }

    fn send(&mut self, to: Address, payload: Vec<u8>) -> NetworkResult<()> {
        self.primary
            .socket
            .send(Packet::reliable_ordered(to.into(), payload, Some(0)))
            .map_err(|_| NetworkError::Fatal(ErrorType::Io(std::io::ErrorKind::Other)))
    }

    fn connect(&mut self, to: Address, _password: Option<&[u8]>, via_nat: bool) -> NetworkResult<()> {
        if via_nat {
            slog::info!(self.log, "NAT punch-through requested but not implemented, connecting directly"; "target" => %to);
        }
        self.primary.pending_outbound.insert(to.into());
        // laminar has no bare "connect" primitive: a zero-length reliable
        // packet is enough to make it start tracking the peer and fire
        // `Connect` once the handshake completes.
        self.primary
            .socket
            .send(Packet::reliable_unordered(to.into(), Vec::new()))
            .map_err(|_| NetworkError::Fatal(ErrorType::Io(std::io::ErrorKind::Other)))
    }

    fn close(&mut self, peer: Address) {
        let addr: SocketAddr = peer.into();
        self.primary.connected.remove(&addr);
        self.primary.pending_outbound.remove(&addr);
        for port in self.relay_ports.values_mut() {
            port.connected.remove(&addr);
        }
    }

    fn is_connected(&self, peer: Address) -> bool {
        let addr: SocketAddr = peer.into();
        self.primary.connected.contains(&addr)
            || self.relay_ports.values().any(|p| p.connected.contains(&addr))
    }

    fn set_incoming_password(&mut self, password: Option<&[u8]>) {
        if password.is_some() {
            slog::warn!(self.log, "incoming password configured but laminar has no password-gated handshake; ignoring");
        }
    }
}
