use crate::event::TransportEvent;
use flux::net::NetworkResult;
use relay_proto::Address;
use std::time::Duration;

/// The boundary to the reliable-datagram transport (spec.md §1): connection
/// establishment, reliable ordered delivery, event-style packet reception,
/// and connection teardown. `relay-core` only ever talks to this trait.
pub trait Transport {
    /// Opens a dedicated listening port for a newly-assigned server-relay
    /// port (spec.md §4.1); called right after [`crate::Transport`]'s owner
    /// pops a port off the pool's free list.
    fn open_port(&mut self, port: u16) -> NetworkResult<()>;

    /// Stops listening on a released server-relay port.
    fn close_port(&mut self, port: u16);

    /// Drains every event currently available, in arrival order, without
    /// blocking. The event loop (spec.md §5) calls this once per drain cycle.
    fn poll(&mut self) -> Vec<TransportEvent>;

    /// Issues a reliable-ordered send to `to`. Queuing semantics when `to`
    /// isn't connected yet are the core's responsibility (spec.md §4.3), not
    /// the transport's: sending to an unconnected peer is a programming
    /// error here.
    fn send(&mut self, to: Address, payload: Vec<u8>) -> NetworkResult<()>;

    /// Initiates an outbound connection attempt. `password` carries the
    /// shared incoming password (spec.md §6 `-i`) when this relay was
    /// configured with one; `via_nat` is the client's `useNat` bit passed
    /// through (spec.md §9: NAT punch-through is accepted but not yet acted
    /// upon by any implementation in this workspace).
    fn connect(&mut self, to: Address, password: Option<&[u8]>, via_nat: bool) -> NetworkResult<()>;

    /// Tears down any connection to `peer`, idempotently.
    fn close(&mut self, peer: Address);

    /// True once a `ConnectionRequestAccepted`/`NewIncomingConnection` event
    /// for `peer` has fired and no disconnect/lost event has fired since.
    fn is_connected(&self, peer: Address) -> bool;

    /// The cooperative idle sleep between drain cycles (spec.md §5, ~30 ms).
    fn idle_sleep(&self) -> Duration {
        Duration::from_millis(30)
    }

    /// Requires this exact password of any peer that connects in (spec.md §6
    /// `-i`). Distinct from the per-client-init password passed to
    /// [`Transport::connect`], which authenticates the relay's own outbound
    /// connect to a server. Transports that can't enforce this may ignore it.
    fn set_incoming_password(&mut self, _password: Option<&[u8]>) {}
}
