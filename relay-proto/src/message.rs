//! Wire envelopes (spec.md §6). Every envelope is `id(1) || body`; bodies
//! are fixed-width big-endian integers and 6-byte addresses, byte-aligned
//! (see DESIGN.md for why this implementation is byte- rather than
//! bit-aligned).

use crate::address::Address;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use flux::net::{ErrorType, NetworkError, NetworkResult};
use std::io::Cursor;

pub const ID_PROXY_SERVER_INIT: u8 = 1;
pub const ID_PROXY_INIT_MESSAGE: u8 = 2;
pub const ID_PROXY_CLIENT_MESSAGE: u8 = 3;
pub const ID_PROXY_SERVER_MESSAGE: u8 = 4;
pub const ID_PROXY_MESSAGE: u8 = 5;
pub const ID_REQUEST_CLIENT_INIT: u8 = 6;
/// Forwarded to a client's server inside a `ID_PROXY_MESSAGE` envelope when
/// that client disconnects (spec.md §4.6, cascading cleanup step 3).
pub const ID_DISCONNECTION_NOTIFICATION: u8 = 7;

/// Protocol version this relay speaks (`PROXY_SERVER_PROTOCOL_VERSION` in the original).
pub const PROXY_PROTOCOL_VERSION: i32 = 2;

/// Header byte count client→server relay envelopes carry before the
/// application payload when arriving via `ID_PROXY_CLIENT_MESSAGE`:
/// `id(1) + app-id(1) + timestamp-ish(4) + reserved(5)` in the common case
/// the original relies on — 11 bytes total (spec.md §6 "Envelope
/// Rewriting Arithmetic").
pub const CLIENT_MESSAGE_STRIP_PREFIX: usize = 11;

/// Header byte count the rewritten `ID_PROXY_MESSAGE` envelope carries:
/// `id(1) + Address(6)` = 7 bytes.
pub const PROXY_MESSAGE_PREFIX: usize = 1 + crate::address::WIRE_SIZE;

/// A message dispatched on the listen port, decoded far enough to route it.
#[derive(Debug)]
pub enum ListenPortMessage {
    ServerInit {
        proxy_version: i32,
    },
    ClientInit {
        proxy_version: i32,
        target: Address,
        password: Option<Vec<u8>>,
        use_nat: bool,
        client_version: i32,
    },
    /// Raw client→server payload; `body` is everything after the 1-byte id
    /// (callers strip the common 11-byte header per the envelope arithmetic).
    ClientMessage {
        body: Vec<u8>,
    },
    ServerMessage {
        client: Address,
        /// Payload starting right after the embedded client address.
        body: Vec<u8>,
    },
}

/// Parses the listen-port message family (spec.md §4.5, §4.6).
pub fn decode_listen_port(payload: &[u8]) -> NetworkResult<ListenPortMessage> {
    if payload.is_empty() {
        return Err(NetworkError::Fatal(ErrorType::EmptyPayload));
    }
    let id = payload[0];
    let mut body = Cursor::new(&payload[1..]);

    match id {
        ID_PROXY_SERVER_INIT => {
            let proxy_version = body.read_i32::<BigEndian>()?;
            Ok(ListenPortMessage::ServerInit { proxy_version })
        }
        ID_PROXY_INIT_MESSAGE => {
            let proxy_version = body.read_i32::<BigEndian>()?;
            let target = Address::read(&mut body)?;
            let has_password = body.read_u8()? != 0;
            let password = if has_password {
                let len = body.read_i32::<BigEndian>()? as usize;
                let mut pw = vec![0u8; len];
                std::io::Read::read_exact(&mut body, &mut pw)?;
                Some(pw)
            } else {
                None
            };
            let use_nat = body.read_u8()? != 0;
            let client_version = body.read_i32::<BigEndian>()?;
            Ok(ListenPortMessage::ClientInit {
                proxy_version,
                target,
                password,
                use_nat,
                client_version,
            })
        }
        ID_PROXY_CLIENT_MESSAGE => Ok(ListenPortMessage::ClientMessage {
            body: payload[1..].to_vec(),
        }),
        ID_PROXY_SERVER_MESSAGE => {
            let client = Address::read(&mut body)?;
            let consumed = 1 + crate::address::WIRE_SIZE;
            Ok(ListenPortMessage::ServerMessage {
                client,
                body: payload[consumed..].to_vec(),
            })
        }
        other => Err(NetworkError::Fatal(ErrorType::UnknownMessageId(other))),
    }
}

/// Builds the `ID_PROXY_SERVER_INIT` response: `id || proxyProtoVer || assignedPort`
/// (`assignedPort == 0` means rejected, spec.md §4.6).
pub fn encode_server_init_response(assigned_port: u16) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + 4 + 2);
    buf.push(ID_PROXY_SERVER_INIT);
    buf.write_i32::<BigEndian>(PROXY_PROTOCOL_VERSION).unwrap();
    buf.write_u16::<BigEndian>(assigned_port).unwrap();
    buf
}

/// Builds `ID_PROXY_MESSAGE || originator || ID_REQUEST_CLIENT_INIT || proxyProtoVer || clientVer`
/// (spec.md §4.5(a)).
pub fn encode_request_client_init(originator: Address, client_version: i32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(PROXY_MESSAGE_PREFIX + 1 + 4 + 4);
    buf.push(ID_PROXY_MESSAGE);
    originator.write(&mut buf).unwrap();
    buf.push(ID_REQUEST_CLIENT_INIT);
    buf.write_i32::<BigEndian>(PROXY_PROTOCOL_VERSION).unwrap();
    buf.write_i32::<BigEndian>(client_version).unwrap();
    buf
}

/// Rewrites a client→server-relay envelope: `ID_PROXY_MESSAGE || originator || <tail>`.
///
/// `tail` is whatever the caller already carved out of the original packet:
/// the 11-byte header stripped down via [`strip_client_message_header`] on
/// the buffered/unconnected path, or the whole remainder of the packet after
/// the leading id byte on the connected path (§4.5(b); the two are not the
/// same length — see the caller in `relay-core`). This function only owns
/// prepending the 7-byte `ID_PROXY_MESSAGE || originator` header.
pub fn encode_proxy_message(originator: Address, tail: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(PROXY_MESSAGE_PREFIX + tail.len());
    buf.push(ID_PROXY_MESSAGE);
    originator.write(&mut buf).unwrap();
    buf.extend_from_slice(tail);
    buf
}

/// Builds `ID_PROXY_MESSAGE || peer || ID_DISCONNECTION_NOTIFICATION`, sent to
/// a client's server when that client's session ends (spec.md §4.6 step 3).
pub fn encode_disconnection_notice(peer: Address) -> Vec<u8> {
    let mut buf = Vec::with_capacity(PROXY_MESSAGE_PREFIX + 1);
    buf.push(ID_PROXY_MESSAGE);
    peer.write(&mut buf).unwrap();
    buf.push(ID_DISCONNECTION_NOTIFICATION);
    buf
}

/// Strips the common 11-byte header from a client→server message body
/// (`body` is the bytes after `ID_PROXY_CLIENT_MESSAGE`'s own id byte, i.e.
/// `packet.len() - 1` bytes). Returns the remaining application payload.
///
/// Mirrors the original's `memcpy(item.packet+7, packet->data+11, ...)`:
/// offset 11 is measured from the *start of the whole packet* (including the
/// `ID_PROXY_CLIENT_MESSAGE` id byte itself), so relative to `body` the
/// strip length is `CLIENT_MESSAGE_STRIP_PREFIX - 1`.
pub fn strip_client_message_header(body: &[u8]) -> &[u8] {
    let skip = CLIENT_MESSAGE_STRIP_PREFIX - 1;
    if body.len() <= skip {
        &[]
    } else {
        &body[skip..]
    }
}

/// Forwards a server→client message: everything in `payload` from the offset
/// right after `ID_PROXY_SERVER_MESSAGE || Address` — i.e. `body` as decoded
/// by [`decode_listen_port`]'s `ServerMessage` case, unwrapped already.
pub fn server_message_tail(payload: &[u8]) -> &[u8] {
    let prefix = 1 + crate::address::WIRE_SIZE;
    if payload.len() <= prefix {
        &[]
    } else {
        &payload[prefix..]
    }
}
