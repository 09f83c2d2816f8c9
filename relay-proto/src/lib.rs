pub mod address;
pub mod message;

pub use address::Address;
