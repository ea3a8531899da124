//! Check how long the system has been up

use std::io;

use log::debug;
use serde::Deserialize;
use structopt::StructOpt;

use service_checks::procfs::{ProcFsError, Uptime};
use service_checks::{init_logging, PerfData, Report, Status};

/// Check that the system has been up for at least some number of minutes.
///
/// Useful for catching unexpected reboots: an uptime lower than --crit
/// minutes is critical, lower than --warn minutes is a warning.
#[derive(Deserialize, StructOpt, Debug)]
#[structopt(
    name = "check-uptime (part of service-checks)",
    setting = structopt::clap::AppSettings::ColoredHelp
)]
struct Args {
    #[structopt(
        short = "w",
        long = "warn",
        help = "Time in minutes that triggers a warning state"
    )]
    warn: u64,
    #[structopt(
        short = "c",
        long = "crit",
        help = "Time in minutes that triggers a critical state"
    )]
    crit: u64,
    #[structopt(
        long = "stdin",
        help = "Read the uptime from stdin instead of /proc/uptime, in the \
                same format"
    )]
    stdin: bool,
}

fn do_check(args: &Args, uptime: Uptime) -> Report {
    let warn = args.warn.saturating_mul(60);
    let crit = args.crit.saturating_mul(60);

    let status = if uptime.seconds < crit as f64 {
        Status::Critical
    } else if uptime.seconds < warn as f64 {
        Status::Warning
    } else {
        Status::Ok
    };

    Report::new(status, format!("Uptime is {}", uptime)).with_perf(
        PerfData::new("uptime", uptime.whole_seconds())
            .with_unit("s")
            .with_thresholds(warn, crit),
    )
}

fn read_uptime(from_stdin: bool) -> Result<Uptime, ProcFsError> {
    if from_stdin {
        let stdin = io::stdin();
        let handle = stdin.lock();
        Uptime::from_reader(handle)
    } else {
        Uptime::load()
    }
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    init_logging();
    let args = Args::from_args();

    let uptime = match read_uptime(args.stdin) {
        Ok(uptime) => uptime,
        Err(e) => Report::new(Status::Unknown, format!("Unable to read uptime: {}", e)).exit(),
    };
    debug!("uptime is {} seconds", uptime.seconds);

    do_check(&args, uptime).exit();
}
