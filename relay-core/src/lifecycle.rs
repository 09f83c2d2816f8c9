use crate::relay::Relay;
use relay_proto::{message, Address};
use relay_transport::{Transport, TransportEvent};

impl<T: Transport> Relay<T> {
    /// Routes one transport event to its handler (spec.md §4.6, §2 control
    /// flow: "the event's receive port is inspected first").
    pub(crate) fn dispatch(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Packet {
                from,
                receive_port,
                payload,
            } => self.dispatch_packet(from, receive_port, &payload),
            TransportEvent::NewIncomingConnection { from, receive_port } => {
                if self.pool.is_used(receive_port) {
                    self.port_users.insert(from, receive_port);
                }
            }
            TransportEvent::ConnectionRequestAccepted { peer } => self.drain_pending(peer),
            TransportEvent::ConnectionAttemptFailed { peer } => self.cascading_cleanup(peer, None),
            TransportEvent::ConnectionLost { peer, receive_port } => {
                self.cascading_cleanup(peer, receive_port)
            }
            TransportEvent::DisconnectionNotification { peer, receive_port } => {
                self.cascading_cleanup(peer, receive_port)
            }
            TransportEvent::AlreadyConnected { peer } => {
                slog::debug!(self.log, "already connected, ignoring"; "peer" => %peer);
            }
            TransportEvent::InvalidPassword { from, payload } => {
                self.forward_invalid_password(from, payload);
            }
            TransportEvent::NatTargetNotConnected { target } => {
                self.cascading_cleanup(target, None);
            }
            TransportEvent::NatConnectionToTargetLost { target } => {
                self.cascading_cleanup(target, None);
            }
        }
    }

    fn dispatch_packet(&mut self, from: Address, receive_port: u16, payload: &[u8]) {
        if receive_port == self.listen_port {
            self.handle_listen_port_packet(from, payload);
        } else if self.pool.is_used(receive_port) {
            self.relay_server_port_packet(receive_port, from, payload);
        } else {
            // Sanity guard (spec.md §4.6): a port in neither `used` nor the
            // listen port mutates nothing.
            slog::warn!(self.log, "packet on unknown port dropped"; "port" => receive_port, "from" => %from);
        }
    }

    /// `ID_CONNECTION_REQUEST_ACCEPTED`: flush every queued message for `peer`.
    fn drain_pending(&mut self, peer: Address) {
        for bytes in self.queue.take_for_target(peer) {
            self.send(peer, bytes);
        }
    }

    fn forward_invalid_password(&mut self, server: Address, payload: Vec<u8>) {
        match self.relay_map.any_client_of(server) {
            Some(client) => self.send(client, payload),
            None => {
                slog::warn!(self.log, "invalid-password notice with no matching client"; "server" => %server);
            }
        }
    }

    /// The single cascading-cleanup routine (spec.md §9): closes the
    /// transitive closure of `addr` under is-server-of / is-client-of /
    /// is-port-user-of. Every disconnect-flavoured event (lost,
    /// disconnected, attempt-failed, NAT-lost/not-connected) calls this with
    /// the same code path; `receive_port` is `Some` only when the event was
    /// tied to a specific server-relay port.
    pub(crate) fn cascading_cleanup(&mut self, addr: Address, receive_port: Option<u16>) {
        // 1. If addr is a server: release its port and close every peer using it.
        if let Some(port) = self.server_map.port_of(addr) {
            self.server_map.remove_port(port);
            if !self.pool.release(port) {
                slog::warn!(self.log, "released a port the pool didn't have marked used"; "port" => port);
            }
            self.transport.close_port(port);
            for peer in self.port_users.drain_port(port) {
                self.transport.close(peer);
            }
        }

        // 2. Drop pending-queue entries targeting addr.
        self.queue.take_for_target(addr);

        // 3. Notify addr's server, if addr was a client of one.
        let addr_server = self.relay_map.server_of(addr);
        if let Some(server) = addr_server {
            let notice = message::encode_disconnection_notice(addr);
            self.send(server, notice);
        }

        // 4. If addr is used as a server: close and unmap every client of it.
        for client in self.relay_map.clients_of(addr) {
            self.transport.close(client);
            self.relay_map.remove_client(client);
        }

        // 5. If addr is a client: unmap it, and close its server if orphaned.
        if self.relay_map.contains_client(addr) {
            self.relay_map.remove_client(addr);
            if let Some(server) = addr_server {
                if !self.relay_map.has_other_client_of(server, addr) {
                    self.transport.close(server);
                }
            }
        }

        // 6. Remove the (addr, port) portUsers entry tied to this event.
        if let Some(port) = receive_port {
            self.port_users.remove(addr, port);
        }
    }
}
