//! Check the processes managed by supervisord over XML-RPC

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use itertools::Itertools;
use log::{debug, warn};
use reqwest::blocking::Client;
use serde::Deserialize;
use structopt::StructOpt;
use xmlrpc::{Request, Value};

use service_checks::{init_logging, CheckError, PerfData, Report, Status};

const DEFAULT_TIMEOUT: u64 = 10;

/// Check the state of every process supervisord manages.
///
/// Any process that is starting or stopping is a warning, any process in the
/// UNKNOWN state is unknown, and any process that exited, is backing off or
/// is fatal is critical.
#[derive(Deserialize, StructOpt, Debug)]
#[structopt(
    name = "check-supervisord (part of service-checks)",
    setting = structopt::clap::AppSettings::ColoredHelp
)]
struct Args {
    #[structopt(short = "H", long = "hostname", help = "The supervisord host")]
    hostname: String,
    #[structopt(
        short = "p",
        long = "port",
        help = "Use the following port for XML-RPC connection",
        default_value = "9080"
    )]
    port: u16,
    #[structopt(short = "u", long = "user", help = "Username for XML-RPC connection")]
    user: Option<String>,
    #[structopt(short = "P", long = "password", help = "Password for XML-RPC connection")]
    password: Option<String>,
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
        format!("http://{}:{}/RPC2", self.hostname, self.port)
    }

    fn timeout(&self) -> Duration {
        if self.timeout > 0 {
            Duration::from_secs(self.timeout)
        } else {
            Duration::from_secs(DEFAULT_TIMEOUT)
        }
    }

    /// Credentials are only sent if we have both halves
    fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.user, &self.password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }
}

/// The states a supervisord process can be in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ProcessState {
    Stopped,
    Starting,
    Running,
    Backoff,
    Stopping,
    Exited,
    Fatal,
    Unknown,
}

use self::ProcessState::*;

/// Every state, in the order they are reported
const STATES: [ProcessState; 8] = [
    Stopped, Starting, Running, Backoff, Stopping, Exited, Fatal, Unknown,
];

impl ProcessState {
    fn name(self) -> &'static str {
        match self {
            Stopped => "STOPPED",
            Starting => "STARTING",
            Running => "RUNNING",
            Backoff => "BACKOFF",
            Stopping => "STOPPING",
            Exited => "EXITED",
            Fatal => "FATAL",
            Unknown => "UNKNOWN",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ProcessState {
    type Err = String;

    fn from_str(s: &str) -> Result<ProcessState, String> {
        STATES
            .iter()
            .cloned()
            .find(|state| state.name() == s)
            .ok_or_else(|| format!("unrecognized process state '{}'", s))
    }
}

/// Process names, bucketed by state
#[derive(Debug, Default, PartialEq)]
struct ProcessTable {
    buckets: [Vec<String>; 8],
}

impl ProcessTable {
    fn insert(&mut self, state: ProcessState, name: String) {
        self.buckets[state.index()].push(name);
    }

    fn names(&self, state: ProcessState) -> &[String] {
        &self.buckets[state.index()]
    }

    fn any_in(&self, states: &[ProcessState]) -> bool {
        states.iter().any(|&state| !self.names(state).is_empty())
    }

    /// Build the table from the reply to `supervisor.getAllProcessInfo`
    fn from_process_info(procs: &Value) -> Result<ProcessTable, CheckError> {
        let malformed = |why: &str| CheckError::Malformed(format!("getAllProcessInfo: {}", why));
        let procs = procs
            .as_array()
            .ok_or_else(|| malformed("expected a list of processes"))?;

        let mut table = ProcessTable::default();
        for info in procs {
            let info = info
                .as_struct()
                .ok_or_else(|| malformed("expected process info to be a struct"))?;
            let field = |key: &str| {
                info.get(key)
                    .and_then(Value::as_str)
                    .ok_or_else(|| malformed(&format!("process info has no {}", key)))
            };
            let name = field("name")?;
            let statename = field("statename")?;
            let state = statename.parse().unwrap_or_else(|e| {
                warn!("{} for process {}, counting it as UNKNOWN", e, name);
                Unknown
            });
            table.insert(state, name.to_owned());
        }
        Ok(table)
    }

    /// Later rules override earlier ones
    fn status(&self) -> Status {
        let mut ret = Status::Ok;
        if self.any_in(&[Stopping, Starting]) {
            ret = Status::Warning;
        }
        if self.any_in(&[Unknown]) {
            ret = Status::Unknown;
        }
        if self.any_in(&[Exited, Backoff, Fatal]) {
            ret = Status::Critical;
        }
        ret
    }

    fn report(&self) -> Report {
        let message = STATES
            .iter()
            .filter(|&&state| !self.names(state).is_empty())
            .map(|&state| format!("{}: {}", state, self.names(state).join(", ")))
            .join(" ");

        let mut report = Report::new(self.status(), message);
        for &state in &STATES {
            report.push_perf(PerfData::new(state.name(), self.names(state).len()));
        }
        report
    }
}

fn fetch_process_info(args: &Args) -> Result<Value, CheckError> {
    let client = Client::builder()
        .timeout(args.timeout())
        .build()
        .map_err(|e| CheckError::Transport(format!("{}: {}", args.hostname, e)))?;
    let mut builder = client.post(&args.url());
    if let Some((user, password)) = args.credentials() {
        builder = builder.basic_auth(user, Some(password));
    }

    debug!("calling supervisor.getAllProcessInfo on {}", args.url());
    Request::new("supervisor.getAllProcessInfo")
        .call(builder)
        .map_err(|e| match e.fault() {
            Some(fault) => CheckError::Fault(format!("getAllProcessInfo: {}", fault.fault_string)),
            None => CheckError::Transport(format!("{}: {}", args.hostname, e)),
        })
}

fn run(args: &Args) -> Report {
    if args.hostname.is_empty() {
        return Report::new(Status::Unknown, "Hostname is missing!");
    }
    fetch_process_info(args)
        .and_then(|procs| ProcessTable::from_process_info(&procs))
        .map(|table| table.report())
        .unwrap_or_else(CheckError::into_report)
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    init_logging();
    let args = Args::from_args();
    run(&args).exit();
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use structopt::StructOpt;
    use xmlrpc::Value;

    use service_checks::Status;

    use super::{run, Args, ProcessState, ProcessTable};

    fn build_args(argv: Vec<&str>) -> Args {
        Args::from_iter(argv.into_iter())
    }

    fn process(name: &str, statename: &str) -> Value {
        let mut info = BTreeMap::new();
        info.insert("name".to_owned(), Value::String(name.to_owned()));
        info.insert("statename".to_owned(), Value::String(statename.to_owned()));
        info.insert("pid".to_owned(), Value::Int(42));
        Value::Struct(info)
    }

    const FAULT_REPLY: &str = "<?xml version='1.0'?>
<methodResponse><fault><value><struct>
<member><name>faultCode</name><value><int>1</int></value></member>
<member><name>faultString</name><value><string>UNKNOWN_METHOD</string></value></member>
</struct></value></fault></methodResponse>";

    const PROCESS_REPLY: &str = "<?xml version='1.0'?>
<methodResponse><params><param><value><array><data>
<value><struct>
<member><name>name</name><value><string>web</string></value></member>
<member><name>statename</name><value><string>RUNNING</string></value></member>
<member><name>pid</name><value><int>4242</int></value></member>
</struct></value>
<value><struct>
<member><name>name</name><value><string>cron</string></value></member>
<member><name>statename</name><value><string>FATAL</string></value></member>
</struct></value>
</data></array></value></param></params></methodResponse>";

    /// Answer exactly one XML-RPC call with a canned body on a random port
    fn serve_once(body: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0; 4096];
            while !String::from_utf8_lossy(&request).contains("</methodCall>") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/xml\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
        });
        port
    }

    fn table(procs: &[(&str, &str)]) -> ProcessTable {
        let procs = procs.iter().map(|&(n, s)| process(n, s)).collect();
        ProcessTable::from_process_info(&Value::Array(procs)).unwrap()
    }

    #[test]
    fn flags() {
        let args = build_args(vec!["check-supervisord", "-H", "app01"]);
        assert_eq!(args.url(), "http://app01:9080/RPC2");
        assert_eq!(args.credentials(), None);

        let args = build_args(vec!["check-supervisord", "-H", "app01", "-u", "nagios"]);
        assert_eq!(args.credentials(), None);

        let args = build_args(vec![
            "check-supervisord",
            "--hostname=app01",
            "--port=9001",
            "--user=nagios",
            "--password=hunter2",
            "--timeout=0",
        ]);
        assert_eq!(args.url(), "http://app01:9001/RPC2");
        assert_eq!(args.credentials(), Some(("nagios", "hunter2")));
        assert_eq!(args.timeout().as_secs(), 10);
    }

    #[test]
    fn state_names_round_trip() {
        for name in &[
            "STOPPED", "STARTING", "RUNNING", "BACKOFF", "STOPPING", "EXITED", "FATAL", "UNKNOWN",
        ] {
            let state: ProcessState = name.parse().unwrap();
            assert_eq!(&state.to_string(), name);
        }
        assert!("running".parse::<ProcessState>().is_err());
    }

    #[test]
    fn fatal_process_is_critical() {
        let report = table(&[("a", "RUNNING"), ("b", "FATAL")]).report();
        assert_eq!(report.status, Status::Critical);
        assert!(report.message.contains("FATAL: b"));
        assert_eq!(report.message, "RUNNING: a FATAL: b");
    }

    #[test]
    fn all_running_is_ok() {
        let report = table(&[("web", "RUNNING"), ("worker", "RUNNING"), ("cron", "STOPPED")]).report();
        assert_eq!(report.status, Status::Ok);
        assert_eq!(
            report.to_string(),
            "OK: STOPPED: cron RUNNING: web, worker|STOPPED=1,STARTING=0,RUNNING=2,\
             BACKOFF=0,STOPPING=0,EXITED=0,FATAL=0,UNKNOWN=0"
        );
    }

    #[test]
    fn precedence() {
        assert_eq!(table(&[("a", "STARTING")]).status(), Status::Warning);
        assert_eq!(table(&[("a", "STOPPING")]).status(), Status::Warning);
        assert_eq!(
            table(&[("a", "STARTING"), ("b", "UNKNOWN")]).status(),
            Status::Unknown
        );
        assert_eq!(
            table(&[("a", "UNKNOWN"), ("b", "BACKOFF")]).status(),
            Status::Critical
        );
        assert_eq!(
            table(&[("a", "STOPPING"), ("b", "EXITED")]).status(),
            Status::Critical
        );
        assert_eq!(table(&[]).status(), Status::Ok);
    }

    #[test]
    fn unrecognized_states_are_unknown() {
        let t = table(&[("a", "SLEEPY")]);
        assert_eq!(t.names(ProcessState::Unknown), ["a".to_owned()]);
        assert_eq!(t.status(), Status::Unknown);
    }

    #[test]
    fn malformed_replies_are_critical() {
        let err = ProcessTable::from_process_info(&Value::Int(3)).unwrap_err();
        assert_eq!(err.status(), Status::Critical);

        let mut info = BTreeMap::new();
        info.insert("name".to_owned(), Value::String("a".to_owned()));
        let err = ProcessTable::from_process_info(&Value::Array(vec![Value::Struct(info)])).unwrap_err();
        assert_eq!(err.to_string(), "getAllProcessInfo: process info has no statename");
    }

    #[test]
    fn queries_a_live_server() {
        let port = serve_once(PROCESS_REPLY).to_string();
        let args = build_args(vec!["check-supervisord", "-H", "127.0.0.1", "-p", &port]);
        let report = run(&args);
        assert_eq!(report.status, Status::Critical);
        assert_eq!(report.message, "RUNNING: web FATAL: cron");
        assert_eq!(report.perf_data.len(), 8);
    }

    #[test]
    fn rpc_fault_is_unknown() {
        let port = serve_once(FAULT_REPLY).to_string();
        let args = build_args(vec!["check-supervisord", "-H", "127.0.0.1", "-p", &port]);
        let report = run(&args);
        assert_eq!(report.status, Status::Unknown);
        assert_eq!(report.to_string(), "UNKNOWN: getAllProcessInfo: UNKNOWN_METHOD");
    }

    #[test]
    fn connection_refused_is_critical() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let port = port.to_string();
        let args = build_args(vec!["check-supervisord", "-H", "127.0.0.1", "-p", &port, "-t", "2"]);
        let report = run(&args);
        assert_eq!(report.status, Status::Critical);
        assert!(report.message.starts_with("127.0.0.1: "));
        assert!(report.perf_data.is_empty());
    }

    #[test]
    fn empty_hostname_is_unknown() {
        let args = build_args(vec!["check-supervisord", "-H", ""]);
        assert_eq!(run(&args).to_string(), "UNKNOWN: Hostname is missing!");
    }
}
