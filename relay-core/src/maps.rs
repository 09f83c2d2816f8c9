use relay_proto::Address;
use std::collections::{HashMap, HashSet};

/// `port → serverAddr` (spec.md §3). The sole authority for resolving
/// incoming server-relay-port traffic to the server that owns the port.
#[derive(Default)]
pub struct ServerMap {
    by_port: HashMap<u16, Address>,
}

impl ServerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, port: u16, server: Address) {
        self.by_port.insert(port, server);
    }

    pub fn get(&self, port: u16) -> Option<Address> {
        self.by_port.get(&port).copied()
    }

    /// Removes the entry keyed by `port`, if any.
    pub fn remove_port(&mut self, port: u16) {
        self.by_port.remove(&port);
    }

    /// The port `server` is mapped from, if it's currently a registered server.
    pub fn port_of(&self, server: Address) -> Option<u16> {
        self.by_port
            .iter()
            .find(|(_, addr)| **addr == server)
            .map(|(port, _)| *port)
    }

    pub fn keys(&self) -> impl Iterator<Item = u16> + '_ {
        self.by_port.keys().copied()
    }
}

/// `clientAddr → serverAddr` (spec.md §3). Routes client→server relay
/// traffic and is the backbone of cascading cleanup.
#[derive(Default)]
pub struct RelayMap {
    client_to_server: HashMap<Address, Address>,
}

impl RelayMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, client: Address, server: Address) {
        self.client_to_server.insert(client, server);
    }

    pub fn server_of(&self, client: Address) -> Option<Address> {
        self.client_to_server.get(&client).copied()
    }

    pub fn remove_client(&mut self, client: Address) -> Option<Address> {
        self.client_to_server.remove(&client)
    }

    pub fn contains_client(&self, client: Address) -> bool {
        self.client_to_server.contains_key(&client)
    }

    /// Every client currently mapped to `server`.
    pub fn clients_of(&self, server: Address) -> Vec<Address> {
        self.client_to_server
            .iter()
            .filter(|(_, s)| **s == server)
            .map(|(c, _)| *c)
            .collect()
    }

    /// Any one client currently mapped to `server`, for lookups that only need
    /// an existence witness (spec.md §4.6 `ID_INVALID_PASSWORD` forwarding).
    pub fn any_client_of(&self, server: Address) -> Option<Address> {
        self.client_to_server
            .iter()
            .find(|(_, s)| **s == server)
            .map(|(c, _)| *c)
    }

    /// True if any client (other than `except`, when given) still maps to `server`.
    pub fn has_other_client_of(&self, server: Address, except: Address) -> bool {
        self.client_to_server
            .iter()
            .any(|(c, s)| *s == server && *c != except)
    }
}

/// Multiset of `(peerAddr, port)` pairs (spec.md §3): every peer currently
/// talking to a server-relay port. A peer may appear against several ports.
#[derive(Default)]
pub struct PortUsers {
    entries: HashSet<(Address, u16)>,
}

impl PortUsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, peer: Address, port: u16) {
        self.entries.insert((peer, port));
    }

    pub fn remove(&mut self, peer: Address, port: u16) {
        self.entries.remove(&(peer, port));
    }

    /// Every peer registered against `port`, removing them from the set.
    pub fn drain_port(&mut self, port: u16) -> Vec<Address> {
        let matches: Vec<Address> = self
            .entries
            .iter()
            .filter(|(_, p)| *p == port)
            .map(|(peer, _)| *peer)
            .collect();
        for peer in &matches {
            self.entries.remove(&(*peer, port));
        }
        matches
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Address, u16)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn addr(last: u8, port: u16) -> Address {
        Address::new(Ipv4Addr::new(10, 0, 0, last), port)
    }

    #[test]
    fn server_map_resolves_both_directions() {
        let mut map = ServerMap::new();
        map.insert(50110, addr(1, 7777));
        assert_eq!(map.get(50110), Some(addr(1, 7777)));
        assert_eq!(map.port_of(addr(1, 7777)), Some(50110));
        map.remove_port(50110);
        assert_eq!(map.get(50110), None);
    }

    #[test]
    fn relay_map_tracks_multiple_clients_per_server() {
        let mut map = RelayMap::new();
        let server = addr(9, 50110);
        map.insert(addr(1, 1000), server);
        map.insert(addr(2, 1000), server);
        assert!(map.has_other_client_of(server, addr(1, 1000)));
        map.remove_client(addr(1, 1000));
        assert!(!map.has_other_client_of(server, addr(2, 1000)));
        assert_eq!(map.clients_of(server), vec![addr(2, 1000)]);
    }

    #[test]
    fn port_users_drain_is_scoped_to_the_port() {
        let mut users = PortUsers::new();
        users.insert(addr(1, 1000), 50110);
        users.insert(addr(2, 1000), 50111);
        let drained = users.drain_port(50110);
        assert_eq!(drained, vec![addr(1, 1000)]);
        assert_eq!(users.iter().count(), 1);
    }
}
