//! Check a redis server's uptime, memory, clients and replicas

use std::fmt;
use std::time::Duration;

use log::debug;
use redis::InfoDict;
use serde::Deserialize;
use structopt::StructOpt;

use service_checks::{init_logging, CheckError, PerfData, Report, Status};

const MINUTE: u64 = 60;
const HOUR: u64 = MINUTE * 60;
const DAY: u64 = HOUR * 24;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Check a redis server.
///
/// Runs INFO against the server and checks four things: uptime, memory used,
/// connected clients and connected slaves. The overall status is the worst
/// of the four.
#[derive(Deserialize, StructOpt, Debug)]
#[structopt(
    name = "check-redis (part of service-checks)",
    setting = structopt::clap::AppSettings::ColoredHelp,
    after_help = "Threshold directions:

    Uptime, memory and slaves are floors: the check alerts when the value is
    *less* than the threshold. Clients is a ceiling: the check alerts when
    there are *more* clients than the threshold. All comparisons are strict."
)]
struct Args {
    #[structopt(
        short = "H",
        long = "host",
        help = "The redis host to connect to",
        default_value = "localhost"
    )]
    host: String,
    #[structopt(short = "p", long = "port", default_value = "6379")]
    port: u16,
    #[structopt(short = "P", long = "password", help = "Password to AUTH with")]
    password: Option<String>,
    #[structopt(
        short = "t",
        long = "timeout",
        help = "Seconds to wait for the server. 0 means the default.",
        default_value = "10"
    )]
    timeout: u64,

    #[structopt(long = "up-warn", help = "Warn if uptime seconds is under", default_value = "900")]
    up_warn: u64,
    #[structopt(long = "up-crit", help = "Critical if uptime seconds is under", default_value = "60")]
    up_crit: u64,
    #[structopt(long = "mem-warn", help = "Warn if used MB is under", default_value = "10")]
    mem_warn: f64,
    #[structopt(long = "mem-crit", help = "Critical if used MB is under", default_value = "20")]
    mem_crit: f64,
    #[structopt(long = "clients-warn", help = "Warn if clients are over", default_value = "1")]
    clients_warn: u64,
    #[structopt(long = "clients-crit", help = "Critical if clients are over", default_value = "2")]
    clients_crit: u64,
    #[structopt(long = "slaves-warn", help = "Warn if slaves are under", default_value = "0")]
    slaves_warn: u64,
    #[structopt(long = "slaves-crit", help = "Critical if slaves are under", default_value = "0")]
    slaves_crit: u64,
}

impl Args {
    /// The connect, read and write timeout; redis rejects a zero duration
    fn timeout(&self) -> Duration {
        match self.timeout {
            0 => DEFAULT_TIMEOUT,
            secs => Duration::from_secs(secs),
        }
    }
}

/// The fields of INFO that we care about
#[derive(Debug, PartialEq)]
struct RedisInfo {
    uptime_in_seconds: u64,
    used_memory: u64,
    connected_clients: u64,
    connected_slaves: u64,
}

impl RedisInfo {
    /// Used memory in MiB, rounded to two decimal places
    fn used_memory_mb(&self) -> f64 {
        let mb = self.used_memory as f64 / 1024.0 / 1024.0;
        (mb * 100.0).round() / 100.0
    }

    /// Pull the fields we need out of an INFO reply
    fn from_info(info: &InfoDict) -> Result<RedisInfo, CheckError> {
        let field = |name: &str| -> Result<u64, CheckError> {
            match info.get::<u64>(name) {
                Some(value) => Ok(value),
                None => Err(CheckError::Malformed(match info.get::<String>(name) {
                    Some(raw) => format!("Malformed INFO response: {} is '{}'", name, raw),
                    None => format!("Malformed INFO response: no {}", name),
                })),
            }
        };

        Ok(RedisInfo {
            uptime_in_seconds: field("uptime_in_seconds")?,
            used_memory: field("used_memory")?,
            connected_clients: field("connected_clients")?,
            connected_slaves: field("connected_slaves")?,
        })
    }
}

/// Where a server lives, for error messages
struct Address<'a> {
    host: &'a str,
    port: u16,
}

impl<'a> fmt::Display for Address<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

fn fetch_info(args: &Args) -> Result<RedisInfo, CheckError> {
    let address = Address {
        host: &args.host,
        port: args.port,
    };
    let timeout = args.timeout();
    let cant_connect = |e: redis::RedisError| {
        debug!("connecting to {} failed: {}", address, e);
        CheckError::Transport(format!("Can't connect to {}", address))
    };

    let info = redis::ConnectionInfo {
        addr: redis::ConnectionAddr::Tcp(args.host.clone(), args.port),
        redis: redis::RedisConnectionInfo {
            db: 0,
            username: None,
            password: args.password.clone(),
        },
    };
    debug!("connecting to {}", address);
    let client = redis::Client::open(info).map_err(&cant_connect)?;
    let mut con = client
        .get_connection_with_timeout(timeout)
        .map_err(&cant_connect)?;
    con.set_read_timeout(Some(timeout)).map_err(&cant_connect)?;
    con.set_write_timeout(Some(timeout)).map_err(&cant_connect)?;

    let info: InfoDict = redis::cmd("INFO")
        .query(&mut con)
        .map_err(|e| CheckError::Transport(format!("INFO failed on {}: {}", address, e)))?;
    debug!("INFO returned {} fields", info.len());
    RedisInfo::from_info(&info)
}

fn check_uptime(args: &Args, info: &RedisInfo, report: &mut Report) {
    let s = info.uptime_in_seconds;
    let (d, h, m) = (s / DAY, (s % DAY) / HOUR, (s % HOUR) / MINUTE);

    if s < args.up_crit {
        report.push_clause(format!("Uptime is {} seconds", s));
        report.escalate(Status::Critical);
    } else if s < args.up_warn {
        report.push_clause(format!("Uptime is {} minutes", m));
        report.escalate(Status::Warning);
    } else {
        let days = if d == 1 { "day" } else { "days" };
        report.push_clause(format!("Uptime is {} {}, {}:{} h", d, days, h, m));
    }
}

fn check_memory(args: &Args, info: &RedisInfo, report: &mut Report) {
    let mem = info.used_memory_mb();
    if mem < args.mem_crit {
        report.escalate(Status::Critical);
    } else if mem < args.mem_warn {
        report.escalate(Status::Warning);
    }
    report.push_clause(format!("Used Memory: {:.2} MB", mem));
}

fn check_clients(args: &Args, info: &RedisInfo, report: &mut Report) {
    let clients = info.connected_clients;
    if clients > args.clients_crit {
        report.escalate(Status::Critical);
    } else if clients > args.clients_warn {
        report.escalate(Status::Warning);
    }
    report.push_clause(format!("Connected Clients: {}", clients));
}

fn check_slaves(args: &Args, info: &RedisInfo, report: &mut Report) {
    let slaves = info.connected_slaves;
    if slaves < args.slaves_crit {
        report.escalate(Status::Critical);
    } else if slaves < args.slaves_warn {
        report.escalate(Status::Warning);
    }
    report.push_clause(format!("Connected Slaves: {}", slaves));
}

fn do_check(args: &Args, info: &RedisInfo) -> Report {
    let mut report = Report::empty();
    check_uptime(args, info, &mut report);
    check_memory(args, info, &mut report);
    check_clients(args, info, &mut report);
    check_slaves(args, info, &mut report);

    report.push_perf(
        PerfData::new("uptime", info.uptime_in_seconds)
            .with_unit("s")
            .with_thresholds(args.up_warn, args.up_crit),
    );
    report.push_perf(
        PerfData::new("connectedClients", info.connected_clients)
            .with_thresholds(args.clients_warn, args.clients_crit),
    );
    report.push_perf(
        PerfData::new("connectedSlaves", info.connected_slaves)
            .with_thresholds(args.slaves_warn, args.slaves_crit),
    );
    report.push_perf(
        PerfData::new("usedMemory", format!("{:.2}", info.used_memory_mb()))
            .with_unit("MB")
            .with_thresholds(args.mem_warn, args.mem_crit),
    );
    report
}

fn run(args: &Args) -> Report {
    match fetch_info(args) {
        Ok(info) => do_check(args, &info),
        Err(e) => e.into_report(),
    }
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    init_logging();
    let args = Args::from_args();
    run(&args).exit();
}
