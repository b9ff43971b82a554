//! this binary starts the line pool server
//! to see the list of options, type: `linepool-server --help`
//!
//! Limits are read from the `MAX_FILE_SIZE_MB`, `MAX_CACHE_LINES`, `MAX_SAMPLE_SIZE` and
//! `LOAD_CHUNK_SIZE` environment variables, and can be overridden on the command line.

use std::net::SocketAddr;
use std::process::exit;
use std::thread;

use clap::{arg_enum, crate_version, value_t, App, Arg, ArgMatches};
use linepool::thread_pool::{NaiveThreadPool, RayonThreadPool, SharedQueueThreadPool, ThreadPool};
use linepool::{Limits, LinePool, PoolError, PoolServer, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

arg_enum! {
    #[allow(non_camel_case_types)]
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    enum Pool {
        naive,
        shared,
        rayon
    }
}

const DEFAULT_ADDRESS: &str = "127.0.0.1:4000";
const DEFAULT_POOL: Pool = Pool::shared;

/// ['Opt'] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    addr: SocketAddr,
    pool: Pool,
    threads: u32,
    limits: Limits,
}

impl Opt {
    /// validates the command line options, falling back to the environment and then to the
    /// defaults for anything not given
    /// # Errors
    /// returns [`PoolError::Parsing`] if one of the parameters is invalid
    ///
    fn build(matches: &ArgMatches) -> Result<Opt> {
        let addr = matches.value_of("addr").unwrap_or(DEFAULT_ADDRESS);
        let addr: SocketAddr = addr.parse().map_err(|_| {
            PoolError::Parsing(format!("could not parse {} into an IP address and port", &addr))
        })?;

        let pool = value_t!(matches, "pool", Pool).unwrap_or(DEFAULT_POOL);
        let threads = if matches.is_present("threads") {
            parse_arg(matches, "threads")?
        } else {
            default_threads()
        };
        if threads == 0 {
            return Err(PoolError::Parsing("threads must be greater than 0".to_string()));
        }

        let mut limits = Limits::from_env()?;
        if matches.is_present("max-file-size-mb") {
            limits.max_file_size_mb = parse_arg(matches, "max-file-size-mb")?;
        }
        if matches.is_present("max-lines") {
            limits.max_lines = parse_arg(matches, "max-lines")?;
        }
        if matches.is_present("max-sample-size") {
            limits.max_sample_size = parse_arg(matches, "max-sample-size")?;
        }

        Ok(Opt {
            addr,
            pool,
            threads,
            limits: limits.validate()?,
        })
    }
}

fn main() {
    // set up a tracing subscriber to log to STDERR
    subscriber_config();

    let matches = App::new("linepool-server")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("an in-memory store serving random, non-repeating lines")
        .arg(Arg::with_name("addr")
            .long("addr")
            .value_name("IP_ADDR:PORT")
            .help("sets the IP_ADDR:PORT that the server listens on")
            .default_value(DEFAULT_ADDRESS))
        .arg(Arg::with_name("pool")
            .long("pool")
            .value_name("POOL")
            .help("sets the thread pool serving connections")
            .possible_values(&Pool::variants())
            .default_value("shared"))
        .arg(Arg::with_name("threads")
            .long("threads")
            .value_name("N")
            .help("sets the number of threads serving connections (default: available cores)"))
        .arg(Arg::with_name("max-file-size-mb")
            .long("max-file-size-mb")
            .value_name("MB")
            .help("rejects files bigger than this [env: MAX_FILE_SIZE_MB]"))
        .arg(Arg::with_name("max-lines")
            .long("max-lines")
            .value_name("LINES")
            .help("maximum number of lines held in memory [env: MAX_CACHE_LINES]"))
        .arg(Arg::with_name("max-sample-size")
            .long("max-sample-size")
            .value_name("N")
            .help("rejects sample requests for more lines than this [env: MAX_SAMPLE_SIZE]"))
        .get_matches();

    let opt = match Opt::build(&matches) {
        Ok(opt) => opt,
        Err(err) => {
            eprintln!("{}", err);
            exit(1);
        }
    };

    // start the server
    if let Err(e) = run(opt) {
        eprintln!("{}", e);
        exit(1);
    }
}

fn run(opt: Opt) -> Result<()> {
    info!("linepool-server {}", env!("CARGO_PKG_VERSION"));
    info!("Thread pool: {} with {} threads", opt.pool, opt.threads);
    info!("Limits: {:?}", opt.limits);
    info!("Listening on {}", opt.addr);

    let engine = LinePool::with_capacity_limit(opt.limits.max_lines);
    let pool = opt.pool;
    match pool {
        Pool::naive => run_with_pool(engine, NaiveThreadPool::new(opt.threads)?, opt),
        Pool::shared => run_with_pool(engine, SharedQueueThreadPool::new(opt.threads)?, opt),
        Pool::rayon => run_with_pool(engine, RayonThreadPool::new(opt.threads)?, opt),
    }
}

fn run_with_pool<P: ThreadPool>(engine: LinePool, pool: P, opt: Opt) -> Result<()> {
    let server = PoolServer::new(engine, pool, opt.limits);
    server.run(opt.addr)
}

/// parses the value of the option `name` into a number
fn parse_arg<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> Result<T> {
    let value = matches.value_of(name).unwrap_or_default();
    value
        .parse()
        .map_err(|_| PoolError::Parsing(format!("could not parse --{} {:?} into a number", name, value)))
}

fn default_threads() -> u32 {
    thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(4)
}

/// configures a tracing subscriber that will log to STDERR
fn subscriber_config() {
    let subscriber = FmtSubscriber::builder()
        // all spans/events with a level of INFO or more severe will be written
        .with_max_level(Level::INFO)
        // log to stderr instead of stdout
        .with_writer(std::io::stderr)
        // completes the builder.
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting tracing default subscriber failed");
}
