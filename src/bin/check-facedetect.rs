//! Check the status endpoint of a face detection service

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use structopt::StructOpt;

use service_checks::{init_logging, CheckError, PerfData, Report, Status};

const DEFAULT_TIMEOUT: u64 = 10;

/// Query the /status endpoint of a face detection service.
///
/// The endpoint must return a JSON object with a string `status` field. Every
/// other field is reported as integer performance data.
#[derive(Deserialize, StructOpt, Debug)]
#[structopt(
    name = "check-facedetect (part of service-checks)",
    setting = structopt::clap::AppSettings::ColoredHelp
)]
struct Args {
    #[structopt(short = "H", long = "hostname", help = "The host to query")]
    hostname: String,
    #[structopt(
        short = "p",
        long = "port",
        help = "Use the following port",
        default_value = "4000"
    )]
    port: u16,
    #[structopt(short = "S", long = "use-ssl", help = "Use HTTPS instead of HTTP")]
    use_ssl: bool,
    #[structopt(
        short = "e",
        long = "expected",
        help = "Go critical unless the status contains this string"
    )]
    expected: Option<String>,
    #[structopt(
        short = "t",
        long = "timeout",
        help = "Seconds to wait for a response. 0 means the default.",
        default_value = "10"
    )]
    timeout: u64,
}

impl Args {
    fn url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}:{}/status", scheme, self.hostname, self.port)
    }

    fn timeout(&self) -> Duration {
        if self.timeout > 0 {
            Duration::from_secs(self.timeout)
        } else {
            Duration::from_secs(DEFAULT_TIMEOUT)
        }
    }
}

/// GET the status url and parse its body as a json object
fn fetch_status(url: &str, timeout: Duration) -> Result<Map<String, Value>, CheckError> {
    debug!("querying {}", url);
    let client = Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CheckError::Transport(e.to_string()))?;
    let body = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(|e| CheckError::Transport(e.to_string()))?;
    debug!("received {:?}", body);
    parse_body(&body)
}

fn parse_body(body: &str) -> Result<Map<String, Value>, CheckError> {
    match serde_json::from_str(body) {
        Ok(Value::Object(map)) => {
            if map.is_empty() {
                Err(no_data())
            } else {
                Ok(map)
            }
        }
        _ => Err(no_data()),
    }
}

fn no_data() -> CheckError {
    CheckError::Malformed("No data received".to_owned())
}

/// Interpret a json value the way `int()` would
fn as_integer(value: &Value) -> Option<i64> {
    match *value {
        Value::Number(ref n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::Bool(b) => Some(b as i64),
        Value::String(ref s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

fn do_check(expected: Option<&str>, mut payload: Map<String, Value>) -> Result<Report, CheckError> {
    let status = match payload.remove("status") {
        Some(Value::String(status)) => status,
        _ => return Err(CheckError::Malformed("No status field in response".to_owned())),
    };

    let ret = match expected {
        Some(expected) if !status.contains(expected) => Status::Critical,
        _ => Status::Ok,
    };

    let mut report = Report::new(ret, status);
    for (key, value) in &payload {
        let value = as_integer(value)
            .ok_or_else(|| CheckError::Malformed(format!("Invalid value for '{}'", key)))?;
        report.push_perf(PerfData::new(key.as_str(), value));
    }
    Ok(report)
}

fn run(args: &Args) -> Report {
    if args.hostname.is_empty() {
        return Report::new(Status::Unknown, "Hostname is missing");
    }
    fetch_status(&args.url(), args.timeout())
        .and_then(|payload| do_check(args.expected.as_ref().map(String::as_str), payload))
        .unwrap_or_else(CheckError::into_report)
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    init_logging();
    let args = Args::from_args();
    run(&args).exit();
}
