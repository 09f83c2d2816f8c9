pub mod event;
pub mod laminar_transport;
pub mod mock;
pub mod transport;

pub use event::TransportEvent;
pub use laminar_transport::LaminarTransport;
pub use mock::MockTransport;
pub use transport::Transport;
