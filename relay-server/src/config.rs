use clap::ArgMatches;
use flux::logging::Sink;
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};

/// Startup configuration errors (spec.md §7: "fatal at startup, exit 1").
/// Kept separate from `flux::net::NetworkError`, which covers runtime
/// protocol/transport errors instead.
#[derive(Debug)]
pub enum ConfigError {
    InvalidPort(String),
    InvalidPortRange(String),
    InvalidDebugLevel(String),
    InvalidMaxConnections(String),
    UnresolvableFacilitator(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort(v) => write!(f, "invalid listen port: {}", v),
            ConfigError::InvalidPortRange(v) => write!(f, "invalid server-port range: {}", v),
            ConfigError::InvalidDebugLevel(v) => write!(f, "invalid debug level: {}", v),
            ConfigError::InvalidMaxConnections(v) => write!(f, "invalid max connections: {}", v),
            ConfigError::UnresolvableFacilitator(v) => write!(f, "could not resolve facilitator address: {}", v),
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    pub listen_port: u16,
    pub daemonize: bool,
    pub log_sink: Sink,
    pub debug_level: u8,
    pub max_connections: u32,
    pub port_range: (u16, u16),
    pub facilitator: SocketAddr,
    pub incoming_password: Option<Vec<u8>>,
}

impl Config {
    pub fn from_matches(matches: &ArgMatches) -> Result<Config, ConfigError> {
        let listen_port: u16 = matches
            .value_of("port")
            .unwrap()
            .parse()
            .ok()
            .filter(|v| *v != 0)
            .ok_or_else(|| ConfigError::InvalidPort(matches.value_of("port").unwrap().to_string()))?;

        let debug_level: u8 = matches
            .value_of("debug-level")
            .unwrap()
            .parse()
            .ok()
            .filter(|v| *v <= 9)
            .ok_or_else(|| ConfigError::InvalidDebugLevel(matches.value_of("debug-level").unwrap().to_string()))?;

        let max_connections: u32 = matches
            .value_of("max-connections")
            .unwrap()
            .parse()
            .map_err(|_| ConfigError::InvalidMaxConnections(matches.value_of("max-connections").unwrap().to_string()))?;

        let port_range = parse_port_range(matches.value_of("port-range").unwrap())?;

        let facilitator_spec = matches.value_of("facilitator").unwrap();
        let facilitator = facilitator_spec
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ConfigError::UnresolvableFacilitator(facilitator_spec.to_string()))?;

        let log_sink = if matches.is_present("file-log") {
            Sink::File("proxyserver.log".to_string())
        } else {
            Sink::Terminal
        };

        Ok(Config {
            listen_port,
            daemonize: matches.is_present("daemonize"),
            log_sink,
            debug_level,
            max_connections,
            port_range,
            facilitator,
            incoming_password: matches.value_of("incoming-password").map(|p| p.as_bytes().to_vec()),
        })
    }
}

fn parse_port_range(spec: &str) -> Result<(u16, u16), ConfigError> {
    let mut parts = spec.splitn(2, ':');
    let start = parts.next().and_then(|v| v.parse::<u16>().ok());
    let end = parts.next().and_then(|v| v.parse::<u16>().ok());
    match (start, end) {
        (Some(start), Some(end)) if start <= end => Ok((start, end)),
        _ => Err(ConfigError::InvalidPortRange(spec.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_a_backwards_port_range() {
        assert!(parse_port_range("50120:50110").is_err());
    }

    #[test]
    fn accepts_a_single_port_range() {
        assert_eq!(parse_port_range("50110:50110").unwrap(), (50110, 50110));
    }

    #[test]
    fn rejects_port_zero() {
        let matches = crate::cli::build_app().get_matches_from(vec!["relayserver", "-p", "0"]);
        assert!(matches!(Config::from_matches(&matches), Err(ConfigError::InvalidPort(_))));
    }
}
