mod engine;
mod lifecycle;
pub mod maps;
pub mod pool;
pub mod queue;
mod relay;
#[cfg(test)]
mod tests;

pub use pool::PortPool;
pub use relay::Relay;
