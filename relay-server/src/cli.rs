use clap::{App, Arg, ArgMatches};

pub fn build_app() -> App<'static, 'static> {
    App::new("relayserver")
        .version("1.0")
        .author("Bush Hammer Industries")
        .about("NAT-traversing relay between game clients and game servers")
        .help_short("?")
        .arg(
            Arg::with_name("port")
                .short("p")
                .takes_value(true)
                .default_value("10746")
                .help("Listen port (1-65535)"),
        )
        .arg(
            Arg::with_name("daemonize")
                .short("d")
                .help("Run as a daemon"),
        )
        .arg(
            Arg::with_name("file-log")
                .short("l")
                .help("Log to proxyserver.log instead of the terminal"),
        )
        .arg(
            Arg::with_name("debug-level")
                .short("e")
                .takes_value(true)
                .default_value("0")
                .help("Debug level, 0 (errors only) through 9 (full)"),
        )
        .arg(
            Arg::with_name("max-connections")
                .short("c")
                .takes_value(true)
                .default_value("1000")
                .help("Maximum simultaneous connections"),
        )
        .arg(
            Arg::with_name("port-range")
                .short("r")
                .takes_value(true)
                .default_value("50110:50120")
                .help("Server-relay port range, start:end"),
        )
        .arg(
            Arg::with_name("facilitator")
                .short("f")
                .takes_value(true)
                .default_value("facilitator.unity3d.com:50005")
                .help("NAT facilitator address"),
        )
        .arg(
            Arg::with_name("incoming-password")
                .short("i")
                .takes_value(true)
                .help("Shared password required of connecting peers"),
        )
}

pub fn parse<'a>() -> ArgMatches<'a> {
    build_app().get_matches()
}
