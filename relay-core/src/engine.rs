use crate::relay::Relay;
use relay_proto::message::{self, ListenPortMessage};
use relay_proto::Address;
use relay_transport::Transport;

/// The three message-rewriting paths (spec.md §4.5).
impl<T: Transport> Relay<T> {
    pub(crate) fn handle_listen_port_packet(&mut self, from: Address, payload: &[u8]) {
        let decoded = match message::decode_listen_port(payload) {
            Ok(m) => m,
            Err(err) => {
                slog::warn!(self.log, "dropping malformed listen-port packet"; "from" => %from, "error" => %err);
                return;
            }
        };

        match decoded {
            ListenPortMessage::ServerInit { proxy_version } => {
                self.handle_server_init(from, proxy_version);
            }
            ListenPortMessage::ClientInit {
                target,
                password,
                use_nat,
                client_version,
                ..
            } => {
                self.client_init(from, target, password, use_nat, client_version);
            }
            ListenPortMessage::ClientMessage { body } => {
                self.client_relay(from, &body);
            }
            ListenPortMessage::ServerMessage { client, body } => {
                self.server_relay_from_listen_port(client, &body);
            }
        }
    }

    /// (a) Client-Init: `ID_PROXY_INIT_MESSAGE` on the listen port.
    fn client_init(
        &mut self,
        client: Address,
        target: Address,
        password: Option<Vec<u8>>,
        use_nat: bool,
        client_version: i32,
    ) {
        self.relay_map.insert(client, target);
        let request_init = message::encode_request_client_init(client, client_version);

        if self.transport.is_connected(target) {
            self.send(target, request_init);
        } else {
            if let Err(err) = self.transport.connect(target, password.as_deref(), use_nat) {
                slog::warn!(self.log, "connect attempt failed synchronously"; "target" => %target, "error" => %err);
            }
            self.queue.enqueue(request_init, target);
        }
    }

    /// (b) Client→Server Relay: `ID_PROXY_CLIENT_MESSAGE` on the listen port.
    ///
    /// The connected and buffered paths are *not* symmetric (spec.md §9):
    /// once the target is connected, the whole remainder of the packet after
    /// the leading id byte is forwarded as-is; only the buffered path (the
    /// target isn't connected yet, so the message sits in the queue) strips
    /// the full 11-byte client-message header down to its 7-byte queued form.
    fn client_relay(&mut self, client: Address, body: &[u8]) {
        let target = match self.relay_map.server_of(client) {
            Some(target) => target,
            None => {
                slog::warn!(self.log, "client relay with no relayMap entry"; "client" => %client);
                return;
            }
        };

        if self.transport.is_connected(target) {
            let rewritten = message::encode_proxy_message(client, body);
            self.send(target, rewritten);
        } else {
            let tail = message::strip_client_message_header(body);
            let rewritten = message::encode_proxy_message(client, tail);
            if let Err(err) = self.transport.connect(target, None, false) {
                slog::warn!(self.log, "connect attempt failed synchronously"; "target" => %target, "error" => %err);
            }
            self.queue.enqueue(rewritten, target);
        }
    }

    /// (c) Server→Client Relay, listen-port sub-form: `ID_PROXY_SERVER_MESSAGE`.
    fn server_relay_from_listen_port(&mut self, client: Address, body: &[u8]) {
        self.send(client, body.to_vec());
    }

    /// (c) Server→Client Relay, server-relay-port sub-form: any packet
    /// arriving on a port owned by a registered server.
    pub(crate) fn relay_server_port_packet(&mut self, receive_port: u16, sender: Address, payload: &[u8]) {
        let target = match self.server_map.get(receive_port) {
            Some(target) => target,
            None => {
                slog::warn!(self.log, "packet on unowned server-relay port"; "port" => receive_port);
                return;
            }
        };
        let rewritten = message::encode_proxy_message(sender, payload);
        self.send(target, rewritten);
    }

    /// Sends one payload, logging (rather than propagating) any transport error —
    /// handlers never return `Result` to the event loop (spec.md §7).
    pub(crate) fn send(&mut self, to: Address, payload: Vec<u8>) {
        if let Err(err) = self.transport.send(to, payload) {
            slog::warn!(self.log, "send failed"; "to" => %to, "error" => %err);
        }
    }

    fn handle_server_init(&mut self, server: Address, _proxy_version: i32) {
        match self.pool.acquire() {
            Some(port) => {
                self.server_map.insert(port, server);
                if let Err(err) = self.transport.open_port(port) {
                    slog::warn!(self.log, "failed to open server-relay port"; "port" => port, "error" => %err);
                }
                self.send(server, message::encode_server_init_response(port));
            }
            None => {
                slog::warn!(self.log, "server init rejected: port pool exhausted"; "server" => %server);
                self.send(server, message::encode_server_init_response(0));
            }
        }
    }
}
