//! The linepool-client executable supports the following command line arguments:
//!
//! `linepool-client load <FILEPATH> [--addr IP-PORT]`
//!
//!     Load a text file, located on the server's host, into the server's pool.
//!
//! `linepool-client sample <N> [--addr IP-PORT]`
//!
//!     Sample N random lines. Sampled lines are removed from the pool for good.
//!
//! `linepool-client stats | clear | reset | health [--addr IP-PORT]`
//!
//!     Show the pool counters, drop every line, drop every line and zero the counters, or
//!     check the server is up.
//!
//! --addr accepts an IP address, either v4 or v6, and a port number, with the format IP:PORT.
//! If --addr is not specified then connect on 127.0.0.1:4000.
//! Every reply is printed to stdout as JSON. An error is printed to stderr along with a non-zero
//! exit code on server error, or if IP-PORT does not parse as an address.
//!
//! `linepool-client -V`
//!
//!     Print the version.

use std::net::SocketAddr;
use std::process::exit;

use clap::{crate_version, value_t, App, AppSettings, Arg, ArgMatches, SubCommand};
use linepool::{PoolClient, PoolError, Reply, Request, Result};
use serde_json::Value;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const DEFAULT_ADDRESS: &str = "127.0.0.1:4000";

/// ['Opt'] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    /// the server's ip:port
    addr: SocketAddr,
    req: Request,
}

impl Opt {
    /// validates the `addr` parameter is a valid IP address and PORT
    /// returns `Ok<Opt>` if everything is valid
    /// # Errors
    /// returns [`PoolError::Parsing`] if one of the parameters is invalid
    ///
    fn build(addr: &str, req: Request) -> Result<Opt> {
        let addr: SocketAddr = addr.parse().map_err(|_| {
            PoolError::Parsing(format!("could not parse {} into an IP address and port", &addr))
        })?;

        Ok(Opt { addr, req })
    }
}

fn main() {
    // configure a subscriber that will log messages to STDERR
    subscriber_config();

    let matches = App::new("linepool-client")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("client for the linepool server")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommands(vec![
            SubCommand::with_name("load")
                .about("Load a text file into the server cache")
                .arg(Arg::with_name("FILEPATH").required(true).index(1)),
            SubCommand::with_name("sample")
                .about("Sample N random lines (and invalidate them)")
                .setting(AppSettings::AllowNegativeNumbers)
                .arg(Arg::with_name("N").required(true).index(1)),
            SubCommand::with_name("stats").about("Show current cache size"),
            SubCommand::with_name("clear").about("Clear the cache"),
            SubCommand::with_name("reset").about("Clear the cache and reset its counters"),
            SubCommand::with_name("health").about("Check that the server is up"),
        ])
        .arg(Arg::with_name("addr")
            .long("addr")
            .value_name("IP_ADDR:PORT")
            .help("sets the IP_ADDR:PORT of the server to connect to")
            .global(true)
            .default_value(DEFAULT_ADDRESS))
        .get_matches();

    let result = parse_options(&matches).and_then(run);
    if let Err(e) = result {
        eprintln!("{}", e);
        exit(1);
    }
}

/// sends the request held by `opt` to the server and prints the reply
fn run(opt: Opt) -> Result<()> {
    if let Request::Sample { n } = opt.req {
        if n < 0 {
            return Err(PoolError::InvalidArgument("n must be >= 0".to_string()));
        }
    }

    let mut client = PoolClient::connect(opt.addr)?;
    let reply = match opt.req {
        Request::Load { filepath } => client.load(filepath)?,
        Request::Sample { n } => client.sample(n)?,
        Request::Stats => Reply::Stats(client.stats()?),
        Request::Clear => client.clear()?,
        Request::Reset => client.reset()?,
        Request::Health => client.health()?,
    };
    println!("{}", serde_json::to_string_pretty(&payload(reply)?)?);
    Ok(())
}

/// strips the variant name off a serialized [`Reply`], leaving just its fields
fn payload(reply: Reply) -> Result<Value> {
    match serde_json::to_value(reply)? {
        Value::Object(map) if map.len() == 1 => {
            Ok(map.into_iter().next().map(|(_, v)| v).unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}

/// parses the matches from the command line into an [`Opt`] struct
fn parse_options(matches: &ArgMatches) -> Result<Opt> {
    let (name, args) = matches.subcommand();
    let addr = args
        .and_then(|args| args.value_of("addr"))
        .or_else(|| matches.value_of("addr"))
        .unwrap_or(DEFAULT_ADDRESS);

    let req = match (name, args) {
        ("load", Some(args)) => {
            let filepath = args.value_of("FILEPATH").map(String::from).unwrap_or_default();
            Request::Load { filepath }
        }
        ("sample", Some(args)) => {
            let n = value_t!(args, "N", i64)
                .map_err(|_| PoolError::Parsing("N must be an integer".to_string()))?;
            Request::Sample { n }
        }
        ("stats", _) => Request::Stats,
        ("clear", _) => Request::Clear,
        ("reset", _) => Request::Reset,
        ("health", _) => Request::Health,
        (other, _) => return Err(PoolError::Parsing(format!("unknown command: {}", other))),
    };
    Opt::build(addr, req)
}

/// configures a tracing subscriber that will log to STDERR
fn subscriber_config() {
    let subscriber = FmtSubscriber::builder()
        // only warnings and errors, stdout is reserved for the replies
        .with_max_level(Level::WARN)
        // log to stderr instead of stdout
        .with_writer(std::io::stderr)
        // completes the builder.
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting tracing default subscriber failed");
}
