use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use getopts::Options;
use tokio::time::Duration;

pub struct Args {
    pub address: SocketAddr,
    pub session_ttl: Duration,
    pub max_sessions: usize,
    pub term: Option<PathBuf>,
    pub time_zone: String,
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "a",
        "address",
        "Socket address (IP and port) to listen on [Default: 127.0.0.1:8080]",
        "SOCKET_ADDRESS",
    );
    opts.optopt(
        "t",
        "session-ttl",
        "Time-to-live of a session's events [Default: 3600]",
        "SECONDS",
    );
    opts.optopt(
        "s",
        "max-sessions",
        "Number of sessions kept in memory [Default: 1024]",
        "COUNT",
    );
    opts.optopt(
        "c",
        "term",
        "JSON file describing the academic term [Default: built-in Fall 2025]",
        "FILE",
    );
    opts.optopt(
        "z",
        "time-zone",
        "IANA time zone attached to exported events [Default: the host's zone]",
        "ZONE",
    );
    opts
}

pub fn parse(args: Vec<String>) -> Args {
    let opts = opts();

    let matches = match opts.parse(args) {
        Ok(matches) => matches,
        Err(fail) => {
            eprintln!("{fail}");
            process::exit(1);
        }
    };

    if matches.opt_present("help") {
        println!("{}", opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME"))));
        process::exit(0);
    }

    let address = match matches.opt_get_default("address", SocketAddr::from(([127, 0, 0, 1], 8080)))
    {
        Ok(address) => address,
        Err(err) => {
            eprintln!("Provided value for option 'address' is invalid: {err}");
            process::exit(1);
        }
    };

    let session_ttl = match matches.opt_get_default("session-ttl", 3600) {
        Ok(secs) => Duration::from_secs(secs),
        Err(err) => {
            eprintln!("Provided value for option 'session-ttl' is invalid: {err}");
            process::exit(1);
        }
    };

    let max_sessions = match matches.opt_get_default("max-sessions", 1024usize) {
        Ok(0) => {
            eprintln!("Provided value for option 'max-sessions' must be positive");
            process::exit(1);
        }
        Ok(count) => count,
        Err(err) => {
            eprintln!("Provided value for option 'max-sessions' is invalid: {err}");
            process::exit(1);
        }
    };

    let term = matches.opt_str("term").map(PathBuf::from);

    let time_zone = matches.opt_str("time-zone").unwrap_or_else(|| {
        host_time_zone(env::var("TZ").ok(), iana_time_zone::get_timezone().ok())
    });

    Args {
        address,
        session_ttl,
        max_sessions,
        term,
        time_zone,
    }
}

/// `$TZ` when it names a zone, else the zone the system is configured with.
/// POSIX rules and file paths in `$TZ` are not zone names.
fn host_time_zone(tz_var: Option<String>, system: Option<String>) -> String {
    tz_var
        .filter(|zone| !zone.is_empty() && !zone.starts_with([':', '/']))
        .or(system)
        .unwrap_or_else(|| "UTC".into())
}
