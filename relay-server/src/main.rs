mod cli;
mod config;
mod pidfile;

use config::Config;
use daemonize::Daemonize;
use flux::logging::{self, LogConfig};
use pidfile::PidFile;
use relay_core::Relay;
use relay_proto::Address;
use relay_transport::{LaminarTransport, Transport};
use std::convert::TryFrom;
use std::net::SocketAddr;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const PID_FILE: &str = "relayserver.pid";

fn main() {
    let matches = cli::parse();
    let config = Config::from_matches(&matches).unwrap_or_else(|err| {
        eprintln!("relayserver: {}", err);
        process::exit(1);
    });

    let log = logging::init(&LogConfig {
        sink: config.log_sink.clone(),
        debug_level: config.debug_level,
    });

    slog::info!(
        log,
        "starting relay";
        "listen_port" => config.listen_port,
        "port_range" => format!("{}:{}", config.port_range.0, config.port_range.1),
        "max_connections" => config.max_connections,
    );

    if config.daemonize {
        if let Err(err) = Daemonize::new().start() {
            eprintln!("relayserver: failed to daemonize: {}", err);
            process::exit(1);
        }
    }

    let _pid_file = PidFile::write(PID_FILE).unwrap_or_else(|err| {
        slog::warn!(log, "failed to write pid file"; "error" => %err);
        process::exit(1);
    });

    let listen_addr: SocketAddr = ([0, 0, 0, 0], config.listen_port).into();
    let transport = LaminarTransport::bind(listen_addr, log.new(slog::o!("component" => "transport")))
        .unwrap_or_else(|err| {
            slog::crit!(log, "failed to bind listen port"; "error" => %err);
            process::exit(1);
        });

    let mut relay = Relay::new(
        transport,
        config.listen_port,
        config.port_range,
        config.incoming_password.clone(),
        log.new(slog::o!("component" => "relay")),
    );

    match Address::try_from(config.facilitator) {
        Ok(facilitator) => {
            if let Err(err) = relay.transport_mut().connect(facilitator, None, false) {
                slog::warn!(log, "facilitator connect failed"; "error" => %err);
            }
        }
        Err(_) => {
            slog::warn!(log, "facilitator address is not IPv4, skipping"; "addr" => %config.facilitator);
        }
    }

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = stop.clone();
    ctrlc::set_handler(move || stop_handler.store(true, Ordering::Relaxed))
        .expect("failed to install signal handler");

    relay.run_until_stopped(&stop);
    slog::info!(log, "shutting down");
}
