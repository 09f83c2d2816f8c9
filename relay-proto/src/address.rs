use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use flux::net::{ErrorType, NetworkError, NetworkResult};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// Fixed 6-byte wire form: 4-byte IPv4 octets followed by a 2-byte port.
pub const WIRE_SIZE: usize = 6;

/// An endpoint identifier: IPv4 address + port.
///
/// Only IPv4 is representable on the wire (spec §3), matching the 6-byte
/// `SystemAddress` encoding of the original transport. Anything else is
/// rejected at the boundary, not silently truncated.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Address(SocketAddrV4);

impl Address {
    #[inline]
    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        Address(SocketAddrV4::new(ip, port))
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.0.port()
    }

    #[inline]
    pub fn write<W: std::io::Write>(&self, w: &mut W) -> NetworkResult<()> {
        w.write_all(&self.0.ip().octets())?;
        w.write_u16::<BigEndian>(self.0.port())?;
        Ok(())
    }

    #[inline]
    pub fn read<R: std::io::Read>(r: &mut R) -> NetworkResult<Address> {
        let mut octets = [0u8; 4];
        r.read_exact(&mut octets)?;
        let port = r.read_u16::<BigEndian>()?;
        Ok(Address::new(Ipv4Addr::from(octets), port))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<SocketAddrV4> for Address {
    fn from(addr: SocketAddrV4) -> Self {
        Address(addr)
    }
}

impl From<Address> for SocketAddrV4 {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl From<Address> for SocketAddr {
    fn from(addr: Address) -> Self {
        SocketAddr::V4(addr.0)
    }
}

impl std::convert::TryFrom<SocketAddr> for Address {
    type Error = NetworkError;

    fn try_from(addr: SocketAddr) -> Result<Self, Self::Error> {
        match addr {
            SocketAddr::V4(v4) => Ok(Address(v4)),
            SocketAddr::V6(_) => Err(NetworkError::Fatal(ErrorType::AddrParse)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_through_the_wire_form() {
        let addr = Address::new(Ipv4Addr::new(10, 0, 0, 7), 50110);
        let mut buf = Vec::new();
        addr.write(&mut buf).unwrap();
        assert_eq!(buf.len(), WIRE_SIZE);

        let decoded = Address::read(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(decoded, addr);
    }
}
