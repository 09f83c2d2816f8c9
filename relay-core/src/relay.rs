use crate::maps::{PortUsers, RelayMap, ServerMap};
use crate::queue::PendingQueue;
use crate::pool::PortPool;
use relay_transport::Transport;
use slog::Logger;
use std::sync::atomic::{AtomicBool, Ordering};

/// The single aggregate owning every piece of mutable relay state (spec.md
/// §9: "process-wide mutable state ... reorganized into a single Relay
/// aggregate"). The event loop is a method on this type; nothing outside it
/// touches the port pool, the maps, or the queue.
pub struct Relay<T: Transport> {
    pub(crate) listen_port: u16,
    pub(crate) pool: PortPool,
    pub(crate) server_map: ServerMap,
    pub(crate) relay_map: RelayMap,
    pub(crate) port_users: PortUsers,
    pub(crate) queue: PendingQueue,
    pub(crate) transport: T,
    pub(crate) log: Logger,
}

impl<T: Transport> Relay<T> {
    /// `incoming_password` is handed straight to the transport (spec.md §6
    /// `-i`); the core itself never inspects it.
    pub fn new(
        mut transport: T,
        listen_port: u16,
        port_range: (u16, u16),
        incoming_password: Option<Vec<u8>>,
        log: Logger,
    ) -> Self {
        transport.set_incoming_password(incoming_password.as_deref());
        Relay {
            listen_port,
            pool: PortPool::new(port_range.0, port_range.1),
            server_map: ServerMap::new(),
            relay_map: RelayMap::new(),
            port_users: PortUsers::new(),
            queue: PendingQueue::new(),
            transport,
            log,
        }
    }

    /// Drains everything currently available from the transport and
    /// dispatches each event. Returns whether any event was processed, so
    /// the caller knows whether it's safe to sleep (spec.md §5: the loop
    /// must re-poll after processing events rather than sleeping while work
    /// remains).
    pub fn drain_once(&mut self) -> bool {
        let events = self.transport.poll();
        let had_events = !events.is_empty();
        for event in events {
            self.dispatch(event);
        }
        had_events
    }

    /// Runs the event loop until `stop` is set, draining back-to-back while
    /// events remain and sleeping cooperatively only once a drain comes back
    /// empty (spec.md §5). `stop` is checked once per idle sleep, so a signal
    /// handler flipping it wakes the process within one sleep interval.
    pub fn run_until_stopped(&mut self, stop: &AtomicBool) {
        while !stop.load(Ordering::Relaxed) {
            if !self.drain_once() {
                std::thread::sleep(self.transport.idle_sleep());
            }
        }
    }

    /// Direct access to the transport for startup-only actions outside the
    /// core's own business flows, e.g. connecting to the NAT facilitator
    /// (spec.md §1: "the core treats it as one more peer").
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn log_state(&self) {
        slog::debug!(
            self.log,
            "relay state";
            "used_ports" => self.pool.used().len(),
            "pending" => self.queue.targets().count(),
        );
    }
}
