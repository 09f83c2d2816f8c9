use crate::relay::Relay;
use byteorder::{BigEndian, WriteBytesExt};
use relay_proto::message::*;
use relay_proto::Address;
use relay_transport::{MockTransport, Transport, TransportEvent};
use sloggers::null::NullLoggerBuilder;
use sloggers::Build;
use std::net::Ipv4Addr;

const LISTEN_PORT: u16 = 10746;

fn test_relay(range: (u16, u16)) -> Relay<MockTransport> {
    let log = NullLoggerBuilder::new().build().unwrap();
    Relay::new(MockTransport::new(), LISTEN_PORT, range, None, log)
}

fn addr(last: u8, port: u16) -> Address {
    Address::new(Ipv4Addr::new(10, 0, 0, last), port)
}

fn server_init_payload(version: i32) -> Vec<u8> {
    let mut buf = vec![ID_PROXY_SERVER_INIT];
    buf.write_i32::<BigEndian>(version).unwrap();
    buf
}

fn client_init_payload(target: Address, password: Option<&[u8]>, use_nat: bool, client_version: i32) -> Vec<u8> {
    let mut buf = vec![ID_PROXY_INIT_MESSAGE];
    buf.write_i32::<BigEndian>(PROXY_PROTOCOL_VERSION).unwrap();
    target.write(&mut buf).unwrap();
    match password {
        Some(pw) => {
            buf.push(1);
            buf.write_i32::<BigEndian>(pw.len() as i32).unwrap();
            buf.extend_from_slice(pw);
        }
        None => buf.push(0),
    }
    buf.push(if use_nat { 1 } else { 0 });
    buf.write_i32::<BigEndian>(client_version).unwrap();
    buf
}

fn client_message_payload(app_payload: &[u8]) -> Vec<u8> {
    // 11-byte prefix total, including the leading ID_PROXY_CLIENT_MESSAGE byte.
    let mut buf = vec![ID_PROXY_CLIENT_MESSAGE];
    buf.resize(CLIENT_MESSAGE_STRIP_PREFIX, 0);
    buf.extend_from_slice(app_payload);
    buf
}

// --- Invariant checks (spec.md §8 I1-I3) -----------------------------------

fn assert_pool_invariants<T: Transport>(relay: &Relay<T>) {
    let server_ports: std::collections::HashSet<u16> = relay.server_map.keys().collect();
    assert_eq!(&server_ports, relay.pool.used(), "I1: serverMap.keys == used");
    for (_, port) in relay.port_users.iter() {
        assert!(relay.pool.is_used(*port), "I3: portUsers entry port must be used");
    }
}

// --- Scenario 1: single client, unconnected server -------------------------

#[test]
fn scenario_1_single_client_unconnected_server() {
    let mut relay = test_relay((50110, 50111));

    let server = addr(1, 7000);
    relay.transport.push_event(TransportEvent::Packet {
        from: server,
        receive_port: LISTEN_PORT,
        payload: server_init_payload(PROXY_PROTOCOL_VERSION),
    });
    relay.drain_once();
    assert_eq!(relay.server_map.get(50110), Some(server));
    assert!(relay.transport.sent.contains(&(server, encode_server_init_response(50110))));

    let client = addr(2, 8000);
    let other_server = addr(3, 7001); // S' != S
    relay.transport.push_event(TransportEvent::Packet {
        from: client,
        receive_port: LISTEN_PORT,
        payload: client_init_payload(other_server, None, false, 42),
    });
    relay.drain_once();
    assert_eq!(relay.relay_map.server_of(client), Some(other_server));
    assert!(relay
        .transport
        .connect_calls
        .iter()
        .any(|(to, _, _)| *to == other_server));
    assert!(relay.queue.has_target(other_server));

    relay.transport.push_event(TransportEvent::ConnectionAttemptFailed { peer: other_server });
    relay.drain_once();

    assert!(!relay.queue.has_target(other_server), "queue drained");
    assert!(relay.relay_map.server_of(client).is_none(), "relayMap[C] removed");
    assert_pool_invariants(&relay);
}

// --- Scenario 2: port reuse ordering ---------------------------------------

#[test]
fn scenario_2_port_reuse_ordering() {
    let mut relay = test_relay((50110, 50112));
    assert_eq!(relay.pool.acquire(), Some(50110));
    assert_eq!(relay.pool.acquire(), Some(50111));
    assert!(relay.pool.release(50110));
    assert_eq!(relay.pool.acquire(), Some(50112));
    assert_eq!(relay.pool.free_order(), vec![50110]);
}

// --- Scenario 3: cascading server death ------------------------------------

#[test]
fn scenario_3_cascading_server_death() {
    let mut relay = test_relay((50110, 50111));

    let server = addr(1, 7000);
    relay.transport.push_event(TransportEvent::Packet {
        from: server,
        receive_port: LISTEN_PORT,
        payload: server_init_payload(PROXY_PROTOCOL_VERSION),
    });
    relay.drain_once();
    let port = relay.server_map.port_of(server).unwrap();

    let c1 = addr(2, 8000);
    let c2 = addr(3, 8001);
    for client in [c1, c2] {
        relay.transport.push_event(TransportEvent::Packet {
            from: client,
            receive_port: LISTEN_PORT,
            payload: client_init_payload(server, None, false, 1),
        });
    }
    relay.drain_once();

    // Both clients' sessions become established once the server accepts the connect.
    relay.transport.push_event(TransportEvent::ConnectionRequestAccepted { peer: server });
    relay.drain_once();
    assert!(!relay.queue.has_target(server));

    relay.transport.push_event(TransportEvent::NewIncomingConnection {
        from: c1,
        receive_port: port,
    });
    relay.transport.push_event(TransportEvent::NewIncomingConnection {
        from: c2,
        receive_port: port,
    });
    relay.drain_once();

    relay.transport.push_event(TransportEvent::DisconnectionNotification {
        peer: server,
        receive_port: None,
    });
    relay.drain_once();

    assert!(relay.server_map.get(port).is_none(), "server port released");
    assert!(relay.pool.free_order().contains(&port));
    assert!(relay.relay_map.server_of(c1).is_none());
    assert!(relay.relay_map.server_of(c2).is_none());
    assert!(relay.transport.close_calls.contains(&c1));
    assert!(relay.transport.close_calls.contains(&c2));
    assert!(!relay.queue.has_target(server), "no stranded pending entries");
    assert_pool_invariants(&relay);
}

// --- Scenario 4: envelope arithmetic ----------------------------------------

#[test]
fn scenario_4_envelope_arithmetic() {
    let originator = addr(9, 1234);
    let tail = strip_client_message_header(&client_message_payload(&[])[1..]);
    let out = encode_proxy_message(originator, tail);
    assert_eq!(out.len(), 7);
}

// --- Scenario 6: invalid-password passthrough -------------------------------

#[test]
fn scenario_6_invalid_password_passthrough() {
    let mut relay = test_relay((50110, 50111));
    let server = addr(1, 7000);
    let client = addr(2, 8000);
    relay.relay_map.insert(client, server);

    let payload = vec![9, 9, 9];
    relay
        .transport
        .push_event(TransportEvent::InvalidPassword {
            from: server,
            payload: payload.clone(),
        });
    relay.drain_once();

    assert!(relay.transport.sent.contains(&(client, payload)));
}

#[test]
fn scenario_6_invalid_password_with_no_matching_client_is_dropped() {
    let mut relay = test_relay((50110, 50111));
    let server = addr(1, 7000);
    relay.transport.push_event(TransportEvent::InvalidPassword {
        from: server,
        payload: vec![1],
    });
    relay.drain_once();
    assert!(relay.transport.sent.is_empty());
}

// --- Boundary behaviors (spec.md §8 B1-B3) ----------------------------------

#[test]
fn b1_server_init_with_empty_pool_rejects_without_mutating_server_map() {
    let mut relay = test_relay((50110, 50110));
    assert_eq!(relay.pool.acquire(), Some(50110));

    let server = addr(1, 7000);
    relay.transport.push_event(TransportEvent::Packet {
        from: server,
        receive_port: LISTEN_PORT,
        payload: server_init_payload(PROXY_PROTOCOL_VERSION),
    });
    relay.drain_once();

    assert!(relay.transport.sent.contains(&(server, encode_server_init_response(0))));
    assert!(relay.server_map.get(50110).is_none());
}

#[test]
fn b2_packet_on_unknown_port_is_dropped_without_mutation() {
    let mut relay = test_relay((50110, 50111));
    relay.transport.push_event(TransportEvent::Packet {
        from: addr(1, 1000),
        receive_port: 12345,
        payload: vec![1, 2, 3],
    });
    relay.drain_once();
    assert!(relay.transport.sent.is_empty());
    assert!(relay.transport.close_calls.is_empty());
}

#[test]
fn b3_release_does_not_reuse_most_recently_freed_port() {
    let mut pool = crate::pool::PortPool::new(50110, 50112);
    pool.acquire();
    pool.acquire();
    pool.release(50110);
    assert_ne!(pool.acquire(), Some(50110));
}

// --- Server-relay-port application traffic (§4.5c) --------------------------

#[test]
fn server_relay_port_traffic_is_rewritten_and_forwarded() {
    let mut relay = test_relay((50110, 50111));
    let server = addr(1, 7000);
    relay.transport.push_event(TransportEvent::Packet {
        from: server,
        receive_port: LISTEN_PORT,
        payload: server_init_payload(PROXY_PROTOCOL_VERSION),
    });
    relay.drain_once();
    let port = relay.server_map.port_of(server).unwrap();

    let client = addr(2, 8000);
    relay.transport.push_event(TransportEvent::Packet {
        from: client,
        receive_port: port,
        payload: vec![0xAA, 0xBB],
    });
    relay.drain_once();

    let expected = encode_proxy_message(client, &[0xAA, 0xBB]);
    assert!(relay.transport.sent.contains(&(server, expected)));
}
